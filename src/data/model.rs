use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use super::error::DropReason;

// ---------------------------------------------------------------------------
// Record – one sales line item
// ---------------------------------------------------------------------------

/// A single sales transaction (one row of the source table).
///
/// `total_sales` is derived from `quantity * price` when the record is built
/// and the fields are read-only afterwards, so the two can never disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    order_id: String,
    date: NaiveDate,
    category: String,
    region: String,
    quantity: u64,
    price: f64,
    total_sales: f64,
}

impl Record {
    pub fn new(
        order_id: impl Into<String>,
        date: NaiveDate,
        category: impl Into<String>,
        region: impl Into<String>,
        quantity: u64,
        price: f64,
    ) -> Self {
        debug_assert!(price.is_finite() && price >= 0.0, "price must be finite and non-negative");
        Record {
            order_id: order_id.into(),
            date,
            category: category.into(),
            region: region.into(),
            quantity,
            price,
            total_sales: quantity as f64 * price,
        }
    }

    /// Order identifier; several line items may share one.
    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    /// Unit price.
    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn total_sales(&self) -> f64 {
        self.total_sales
    }
}

// ---------------------------------------------------------------------------
// DateRange – inclusive calendar interval
// ---------------------------------------------------------------------------

/// Inclusive `[start, end]` date interval. `start > end` is allowed and
/// simply contains nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// True when the interval is inverted and therefore matches no date.
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} – {}", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// LoadReport – what happened while reading the source
// ---------------------------------------------------------------------------

/// Row accounting for one load: how many source rows were seen, and why the
/// rejected ones were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub rows_read: usize,
    pub drops: BTreeMap<DropReason, usize>,
}

impl LoadReport {
    pub fn rows_dropped(&self) -> usize {
        self.drops.values().sum()
    }

    pub fn rows_loaded(&self) -> usize {
        self.rows_read - self.rows_dropped()
    }

    pub(crate) fn record_drop(&mut self, reason: DropReason) {
        *self.drops.entry(reason).or_default() += 1;
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed table with pre-computed label sets and date span.
///
/// A `Dataset` exposes no mutating methods; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
    categories: BTreeSet<String>,
    regions: BTreeSet<String>,
    date_span: Option<DateRange>,
    report: LoadReport,
}

impl Dataset {
    /// Build the label indices from the loaded records.
    pub fn from_records(records: Vec<Record>, report: LoadReport) -> Self {
        let mut categories = BTreeSet::new();
        let mut regions = BTreeSet::new();
        let mut date_span: Option<DateRange> = None;

        for rec in &records {
            if !categories.contains(rec.category()) {
                categories.insert(rec.category().to_string());
            }
            if !regions.contains(rec.region()) {
                regions.insert(rec.region().to_string());
            }
            date_span = Some(match date_span {
                None => DateRange::new(rec.date(), rec.date()),
                Some(span) => DateRange::new(span.start.min(rec.date()), span.end.max(rec.date())),
            });
        }

        Dataset {
            records,
            categories,
            regions,
            date_span,
            report,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Sorted distinct category labels.
    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    /// Sorted distinct region labels.
    pub fn regions(&self) -> &BTreeSet<String> {
        &self.regions
    }

    /// `[min(date), max(date)]`, or `None` for an empty dataset.
    pub fn date_span(&self) -> Option<DateRange> {
        self.date_span
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<Record> for Dataset {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let records: Vec<Record> = iter.into_iter().collect();
        let report = LoadReport {
            rows_read: records.len(),
            drops: BTreeMap::new(),
        };
        Dataset::from_records(records, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn total_sales_is_quantity_times_price() {
        let rec = Record::new("7", day(1), "Toys", "North", 3, 2.5);
        assert_eq!(rec.total_sales(), 7.5);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "price must be finite and non-negative")]
    fn negative_price_is_rejected() {
        Record::new("7", day(1), "Toys", "North", 1, -2.5);
    }

    #[test]
    fn dataset_indexes_labels_and_span() {
        let ds: Dataset = vec![
            Record::new("1", day(5), "B", "East", 1, 1.0),
            Record::new("2", day(2), "A", "West", 1, 1.0),
            Record::new("3", day(9), "B", "West", 1, 1.0),
        ]
        .into_iter()
        .collect();

        assert_eq!(ds.len(), 3);
        assert_eq!(
            ds.categories().iter().collect::<Vec<_>>(),
            vec!["A", "B"]
        );
        assert_eq!(ds.regions().len(), 2);
        assert_eq!(ds.date_span(), Some(DateRange::new(day(2), day(9))));
        assert_eq!(ds.report().rows_loaded(), 3);
    }

    #[test]
    fn empty_dataset_has_no_span() {
        let ds = Dataset::default();
        assert!(ds.is_empty());
        assert_eq!(ds.date_span(), None);
    }

    #[test]
    fn date_range_is_inclusive_and_may_be_inverted() {
        let range = DateRange::new(day(2), day(4));
        assert!(range.contains(day(2)));
        assert!(range.contains(day(4)));
        assert!(!range.contains(day(5)));

        let inverted = DateRange::new(day(4), day(2));
        assert!(inverted.is_empty());
        assert!(!inverted.contains(day(3)));
    }

    #[test]
    fn report_counts_drops_per_reason() {
        let mut report = LoadReport {
            rows_read: 10,
            ..Default::default()
        };
        report.record_drop(DropReason::InvalidDate);
        report.record_drop(DropReason::InvalidDate);
        report.record_drop(DropReason::MissingValue);
        assert_eq!(report.rows_dropped(), 3);
        assert_eq!(report.rows_loaded(), 7);
        assert_eq!(report.drops[&DropReason::InvalidDate], 2);
    }
}
