use std::io::Read;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Date32Type, Float64Type, Int64Type, UInt64Type};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::{LoadError, ParseError};
use super::model::{Dataset, LoadReport, Record};

/// Source columns every input must carry, in [`Record`] field order.
pub const REQUIRED_COLUMNS: [&str; 6] = ["Order_ID", "Date", "Category", "Region", "Quantity", "Price"];

/// Cell spellings treated as missing, following the usual dataframe defaults.
const NULL_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Formats tried, in order, before any user supplied ones.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Extra `chrono` format strings for the `Date` column, tried after the
    /// built-in ISO-8601 forms.
    pub date_formats: Vec<String>,
    /// Field separator for CSV input.
    pub csv_delimiter: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            date_formats: Vec::new(),
            csv_delimiter: b',',
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a sales table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.tsv` – header row with the required column names
/// * `.json`         – `[{ "Order_ID": ..., "Date": ..., ... }, ...]`
/// * `.parquet`      – flat table with the required columns
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<Dataset, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_csv_path(path, options)?,
        "tsv" => {
            let options = LoadOptions {
                csv_delimiter: b'\t',
                ..options.clone()
            };
            load_csv_path(path, &options)?
        }
        "json" => load_json(path, options)?,
        "parquet" | "pq" => load_parquet(path, options)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    let report = dataset.report();
    if report.rows_dropped() > 0 {
        log::warn!(
            "{}: dropped {} of {} rows {:?}",
            path.display(),
            report.rows_dropped(),
            report.rows_read,
            report.drops
        );
    }
    log::info!(
        "Loaded {} sales rows from {} ({} categories, {} regions)",
        dataset.len(),
        path.display(),
        dataset.categories().len(),
        dataset.regions().len()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Raw cells and row coercion
// ---------------------------------------------------------------------------

/// One source cell before coercion. Text sources only ever produce
/// `Text`/`Null`; typed sources (JSON, Parquet) keep their native type.
#[derive(Debug, Clone, PartialEq)]
enum RawValue {
    Text(String),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Date(NaiveDate),
    Null,
}

impl RawValue {
    fn from_text(s: &str) -> Self {
        let trimmed = s.trim();
        if NULL_TOKENS.contains(&trimmed) {
            RawValue::Null
        } else {
            RawValue::Text(trimmed.to_string())
        }
    }

    fn from_json(val: &JsonValue) -> Self {
        match val {
            JsonValue::String(s) => RawValue::from_text(s),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    RawValue::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    RawValue::Unsigned(u)
                } else if let Some(f) = n.as_f64() {
                    RawValue::Float(f)
                } else {
                    RawValue::Text(n.to_string())
                }
            }
            JsonValue::Null => RawValue::Null,
            other => RawValue::Text(other.to_string()),
        }
    }

    /// Render a label-like cell (id, category, region) as text.
    fn into_label(self) -> Option<String> {
        match self {
            RawValue::Text(s) => Some(s),
            RawValue::Integer(i) => Some(i.to_string()),
            RawValue::Unsigned(u) => Some(u.to_string()),
            RawValue::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(format!("{f:.0}")),
            RawValue::Float(f) if f.is_nan() => None,
            RawValue::Float(f) => Some(f.to_string()),
            RawValue::Date(d) => Some(d.to_string()),
            RawValue::Null => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            RawValue::Text(s) => s.clone(),
            RawValue::Integer(i) => i.to_string(),
            RawValue::Unsigned(u) => u.to_string(),
            RawValue::Float(f) => f.to_string(),
            RawValue::Date(d) => d.to_string(),
            RawValue::Null => String::new(),
        }
    }
}

/// Parse an ISO-8601 style date, keeping only the calendar part.
pub fn parse_date(s: &str, extra_formats: &[String]) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y/%m/%d") {
        return Some(d);
    }
    extra_formats.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(s, fmt)
            .ok()
            .or_else(|| NaiveDateTime::parse_from_str(s, fmt).ok().map(|dt| dt.date()))
    })
}

fn parse_quantity(raw: &RawValue) -> Result<u64, ParseError> {
    let invalid = || ParseError::InvalidQuantity(raw.describe());
    let as_whole = |f: f64| {
        if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
            Ok(f as u64)
        } else {
            Err(invalid())
        }
    };
    match raw {
        RawValue::Integer(i) => u64::try_from(*i).map_err(|_| invalid()),
        RawValue::Unsigned(u) => Ok(*u),
        RawValue::Float(f) => as_whole(*f),
        RawValue::Text(s) => match s.parse::<u64>() {
            Ok(q) => Ok(q),
            Err(_) => s.parse::<f64>().map_err(|_| invalid()).and_then(as_whole),
        },
        RawValue::Date(_) | RawValue::Null => Err(invalid()),
    }
}

fn parse_price(raw: &RawValue) -> Result<f64, ParseError> {
    let price = match raw {
        RawValue::Integer(i) => *i as f64,
        RawValue::Unsigned(u) => *u as f64,
        RawValue::Float(f) => *f,
        RawValue::Text(s) => s
            .parse::<f64>()
            .map_err(|_| ParseError::InvalidPrice(s.clone()))?,
        RawValue::Date(_) | RawValue::Null => f64::NAN,
    };
    if price.is_finite() && price >= 0.0 {
        Ok(price)
    } else {
        Err(ParseError::InvalidPrice(raw.describe()))
    }
}

/// Turn the six raw cells (in [`REQUIRED_COLUMNS`] order) into a record.
fn coerce_row(raw: [RawValue; 6], options: &LoadOptions) -> Result<Record, ParseError> {
    for (value, column) in raw.iter().zip(REQUIRED_COLUMNS) {
        if matches!(value, RawValue::Null) || matches!(value, RawValue::Float(f) if f.is_nan()) {
            return Err(ParseError::MissingValue { column });
        }
    }

    let [order_id, date, category, region, quantity, price] = raw;

    let date = match &date {
        RawValue::Date(d) => *d,
        RawValue::Text(s) => {
            parse_date(s, &options.date_formats).ok_or_else(|| ParseError::InvalidDate(s.clone()))?
        }
        other => return Err(ParseError::InvalidDate(other.describe())),
    };
    let quantity = parse_quantity(&quantity)?;
    let price = parse_price(&price)?;

    let label = |value: RawValue, column: &'static str| {
        value.into_label().ok_or(ParseError::MissingValue { column })
    };
    Ok(Record::new(
        label(order_id, "Order_ID")?,
        date,
        label(category, "Category")?,
        label(region, "Region")?,
        quantity,
        price,
    ))
}

/// Accumulates coerced records and the drop accounting for one load.
#[derive(Default)]
struct DatasetBuilder {
    records: Vec<Record>,
    report: LoadReport,
}

impl DatasetBuilder {
    fn push(&mut self, row_no: usize, raw: [RawValue; 6], options: &LoadOptions) {
        match coerce_row(raw, options) {
            Ok(record) => {
                self.report.rows_read += 1;
                self.records.push(record);
            }
            Err(err) => self.reject(row_no, err),
        }
    }

    fn reject(&mut self, row_no: usize, err: ParseError) {
        log::debug!("row {row_no}: dropped, {err}");
        self.report.rows_read += 1;
        self.report.record_drop(err.reason());
    }

    fn finish(self) -> Dataset {
        Dataset::from_records(self.records, self.report)
    }
}

/// Map each required column to its position in `headers`.
fn locate_columns<'h>(headers: impl IntoIterator<Item = &'h str>) -> Result<[usize; 6], LoadError> {
    let headers: Vec<&str> = headers.into_iter().map(str::trim).collect();
    let mut positions = [0usize; 6];
    let mut missing = Vec::new();
    for (slot, name) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
        match headers.iter().position(|h| *h == name) {
            Some(idx) => *slot = idx,
            None => missing.push(name.to_string()),
        }
    }
    if missing.is_empty() {
        Ok(positions)
    } else {
        Err(LoadError::MissingColumns(missing))
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv_path(path: &Path, options: &LoadOptions) -> Result<Dataset, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| LoadError::io(path, e))?;
    load_csv_reader(file, options)
}

/// Read CSV from any byte stream. The first row must be the header.
///
/// Rows with the wrong number of fields or invalid UTF-8 are dropped like
/// any other unparseable row; only I/O failures abort the load.
pub fn load_csv_reader<R: Read>(reader: R, options: &LoadOptions) -> Result<Dataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.csv_delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let columns = locate_columns(headers.iter())?;

    let mut builder = DatasetBuilder::default();
    for (row_no, result) in reader.records().enumerate() {
        match result {
            Ok(record) => {
                let raw = columns.map(|idx| record.get(idx).map_or(RawValue::Null, RawValue::from_text));
                builder.push(row_no, raw, options);
            }
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => builder.reject(row_no, ParseError::Malformed(e.to_string())),
        }
    }

    Ok(builder.finish())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Order_ID": 1001, "Date": "2024-01-05", "Category": "Books",
///     "Region": "North", "Quantity": 2, "Price": 12.5 },
///   ...
/// ]
/// ```
///
/// A column counts as present when at least one record carries the key;
/// records that lack it are dropped as incomplete.
fn load_json(path: &Path, options: &LoadOptions) -> Result<Dataset, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    load_json_str(&text, options)
}

fn load_json_str(text: &str, options: &LoadOptions) -> Result<Dataset, LoadError> {
    let root: JsonValue = serde_json::from_str(text)?;
    let rows = root
        .as_array()
        .ok_or_else(|| LoadError::InvalidJson("expected a top-level array of records".into()))?;

    // An empty array has no columns at all, like a CSV without a header.
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !rows.iter().any(|r| r.get(**col).is_some()))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns(missing));
    }

    let mut builder = DatasetBuilder::default();
    for (row_no, row) in rows.iter().enumerate() {
        let Some(obj) = row.as_object() else {
            builder.reject(row_no, ParseError::Malformed("record is not a JSON object".into()));
            continue;
        };
        let raw = REQUIRED_COLUMNS.map(|col| obj.get(col).map_or(RawValue::Null, RawValue::from_json));
        builder.push(row_no, raw, options);
    }

    Ok(builder.finish())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with the required columns.
///
/// String, integer, floating point, decimal, date and timestamp columns are
/// all accepted; anything else is read through its string rendering.
fn load_parquet(path: &Path, options: &LoadOptions) -> Result<Dataset, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| LoadError::io(path, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let columns = locate_columns(builder.schema().fields().iter().map(|f| f.name().as_str()))?;
    let reader = builder.build()?;

    let mut dataset = DatasetBuilder::default();
    let mut row_no = 0usize;

    for batch_result in reader {
        let batch = batch_result?;
        let mut cells: Vec<std::vec::IntoIter<RawValue>> = Vec::with_capacity(columns.len());
        for &idx in &columns {
            cells.push(raw_column(batch.column(idx))?.into_iter());
        }

        for _ in 0..batch.num_rows() {
            let raw: [RawValue; 6] =
                std::array::from_fn(|i| cells[i].next().unwrap_or(RawValue::Null));
            dataset.push(row_no, raw, options);
            row_no += 1;
        }
    }

    Ok(dataset.finish())
}

// -- Arrow helpers --

/// Convert a whole Arrow column into raw cells.
fn raw_column(col: &ArrayRef) -> Result<Vec<RawValue>, LoadError> {
    let n = col.len();
    let cells = match col.data_type() {
        DataType::Utf8 => {
            let arr = col.as_string::<i32>();
            (0..n)
                .map(|i| if arr.is_null(i) { RawValue::Null } else { RawValue::from_text(arr.value(i)) })
                .collect()
        }
        DataType::LargeUtf8 => {
            let arr = col.as_string::<i64>();
            (0..n)
                .map(|i| if arr.is_null(i) { RawValue::Null } else { RawValue::from_text(arr.value(i)) })
                .collect()
        }
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32 => {
            let cast = arrow::compute::cast(col.as_ref(), &DataType::Int64)?;
            let arr = cast.as_primitive::<Int64Type>();
            (0..n)
                .map(|i| if arr.is_null(i) { RawValue::Null } else { RawValue::Integer(arr.value(i)) })
                .collect()
        }
        // Kept apart from the signed arm: values above i64::MAX would cast to null.
        DataType::UInt64 => {
            let arr = col.as_primitive::<UInt64Type>();
            (0..n)
                .map(|i| if arr.is_null(i) { RawValue::Null } else { RawValue::Unsigned(arr.value(i)) })
                .collect()
        }
        DataType::Float16 | DataType::Float32 | DataType::Float64 => {
            let cast = arrow::compute::cast(col.as_ref(), &DataType::Float64)?;
            let arr = cast.as_primitive::<Float64Type>();
            (0..n)
                .map(|i| if arr.is_null(i) { RawValue::Null } else { RawValue::Float(arr.value(i)) })
                .collect()
        }
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
            let cast = arrow::compute::cast(col.as_ref(), &DataType::Date32)?;
            let arr = cast.as_primitive::<Date32Type>();
            (0..n)
                .map(|i| {
                    if arr.is_null(i) {
                        RawValue::Null
                    } else {
                        arr.value_as_date(i).map_or(RawValue::Null, RawValue::Date)
                    }
                })
                .collect()
        }
        _ => {
            let cast = arrow::compute::cast(col.as_ref(), &DataType::Utf8)?;
            let arr = cast.as_string::<i32>();
            (0..n)
                .map(|i| if arr.is_null(i) { RawValue::Null } else { RawValue::from_text(arr.value(i)) })
                .collect()
        }
    };
    Ok(cells)
}
