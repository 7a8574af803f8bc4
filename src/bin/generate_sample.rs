use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Days, NaiveDate};
use parquet::arrow::ArrowWriter;
use serde::Serialize;

const CATEGORIES: [(&str, f64); 5] = [
    ("Electronics", 240.0),
    ("Home", 85.0),
    ("Clothing", 45.0),
    ("Sports", 60.0),
    ("Books", 18.0),
];
const REGIONS: [&str; 4] = ["North", "South", "East", "West"];
const DAYS: u64 = 90;
const ORDERS: i64 = 1200;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }
}

/// One CSV line item; `None` cells are written empty.
#[derive(Debug, Serialize)]
struct SaleRow {
    #[serde(rename = "Order_ID")]
    order_id: i64,
    #[serde(rename = "Date")]
    date: Option<NaiveDate>,
    #[serde(rename = "Category")]
    category: &'static str,
    #[serde(rename = "Region")]
    region: &'static str,
    #[serde(rename = "Quantity")]
    quantity: i64,
    #[serde(rename = "Price")]
    price: Option<f64>,
}

fn generate(rng: &mut SimpleRng) -> Vec<SaleRow> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    let mut rows = Vec::new();

    for order_id in 1001..1001 + ORDERS {
        let date = start + Days::new(rng.below(DAYS));
        let region = REGIONS[rng.below(REGIONS.len() as u64) as usize];
        let lines = 1 + rng.below(3);

        for _ in 0..lines {
            let (category, base) = CATEGORIES[rng.below(CATEGORIES.len() as u64) as usize];
            let price = (base * (0.6 + 0.8 * rng.next_f64()) * 100.0).round() / 100.0;
            let quantity = 1 + rng.below(5) as i64;

            // About 2% of rows lose a date or a price, as real exports do.
            let damage = rng.below(100);
            rows.push(SaleRow {
                order_id,
                date: (damage != 0).then_some(date),
                category,
                region,
                quantity,
                price: (damage != 1).then_some(price),
            });
        }
    }
    rows
}

fn write_csv(rows: &[SaleRow], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(rows: &[SaleRow], path: &str) -> Result<()> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();

    let schema = Arc::new(Schema::new(vec![
        Field::new("Order_ID", DataType::Int64, false),
        Field::new("Date", DataType::Date32, true),
        Field::new("Category", DataType::Utf8, false),
        Field::new("Region", DataType::Utf8, false),
        Field::new("Quantity", DataType::Int64, false),
        Field::new("Price", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.order_id))),
            Arc::new(Date32Array::from_iter(
                rows.iter()
                    .map(|r| r.date.map(|d| (d - epoch).num_days() as i32)),
            )),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.category))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.region))),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.quantity))),
            Arc::new(Float64Array::from_iter(rows.iter().map(|r| r.price))),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let rows = generate(&mut rng);

    write_csv(&rows, "sales_data.csv")?;
    write_parquet(&rows, "sales_data.parquet")?;

    println!(
        "Wrote {} line items for {ORDERS} orders to sales_data.csv and sales_data.parquet",
        rows.len()
    );
    Ok(())
}
