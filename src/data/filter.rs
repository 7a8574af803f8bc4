use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::model::{DateRange, Dataset, Record};

// ---------------------------------------------------------------------------
// Filter predicate: selected labels per dimension plus a date window
// ---------------------------------------------------------------------------

/// Selection state for the three filter dimensions.
///
/// An empty label set selects nothing; it is never shorthand for "all".
/// Use [`FilterSpec::everything`] to start from the unrestricted selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub categories: BTreeSet<String>,
    pub regions: BTreeSet<String>,
    pub date_range: DateRange,
}

impl FilterSpec {
    pub fn new<C, R, S>(categories: C, regions: R, date_range: DateRange) -> Self
    where
        C: IntoIterator<Item = S>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterSpec {
            categories: categories.into_iter().map(Into::into).collect(),
            regions: regions.into_iter().map(Into::into).collect(),
            date_range,
        }
    }

    /// Every label of the dataset selected and its full date span.
    ///
    /// An empty dataset has no span; the range then falls back to the
    /// single-day range at `NaiveDate::default()`, which matches nothing
    /// anyway since there are no records.
    pub fn everything(dataset: &Dataset) -> Self {
        let date_range = dataset.date_span().unwrap_or_else(|| {
            let epoch = NaiveDate::default();
            DateRange::new(epoch, epoch)
        });
        FilterSpec {
            categories: dataset.categories().clone(),
            regions: dataset.regions().clone(),
            date_range,
        }
    }

    /// A record passes when all three predicates hold.
    pub fn matches(&self, record: &Record) -> bool {
        self.categories.contains(record.category())
            && self.regions.contains(record.region())
            && self.date_range.contains(record.date())
    }
}

// ---------------------------------------------------------------------------
// FilteredView – borrowed subset of a dataset
// ---------------------------------------------------------------------------

/// The records of a [`Dataset`] that passed a filter, in dataset order.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView<'a> {
    records: Vec<&'a Record>,
}

impl<'a> FilteredView<'a> {
    /// The unfiltered view over every record.
    pub fn all(dataset: &'a Dataset) -> Self {
        FilteredView {
            records: dataset.records().iter().collect(),
        }
    }

    /// Filter this view again. Applying the spec that produced the view
    /// returns an identical view.
    pub fn refine(&self, spec: &FilterSpec) -> FilteredView<'a> {
        FilteredView {
            records: self
                .records
                .iter()
                .copied()
                .filter(|rec| spec.matches(rec))
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.records.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> FromIterator<&'a Record> for FilteredView<'a> {
    fn from_iter<I: IntoIterator<Item = &'a Record>>(iter: I) -> Self {
        FilteredView {
            records: iter.into_iter().collect(),
        }
    }
}

/// Return the records of `dataset` that satisfy every predicate of `spec`.
///
/// Never fails: an inverted date range or an empty label set just yields an
/// empty view.
pub fn filter<'a>(dataset: &'a Dataset, spec: &FilterSpec) -> FilteredView<'a> {
    dataset
        .records()
        .iter()
        .filter(|rec| spec.matches(rec))
        .collect()
}
