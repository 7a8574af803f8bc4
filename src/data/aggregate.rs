use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use super::filter::FilteredView;
use super::model::Record;

// ---------------------------------------------------------------------------
// KPI scalars
// ---------------------------------------------------------------------------

/// The three headline numbers of a view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KpiSummary {
    /// Sum of `total_sales`.
    pub total_sales: f64,
    /// Number of distinct order ids.
    pub order_count: usize,
    /// Mean `total_sales` per line item; `None` for an empty view, where
    /// the mean is undefined.
    pub avg_order_value: Option<f64>,
}

/// Compute the KPI scalars. An empty view yields zeros and no average.
pub fn compute_kpis(view: &FilteredView<'_>) -> KpiSummary {
    let mut total = 0.0;
    let mut orders: HashSet<&str> = HashSet::new();
    for rec in view.iter() {
        total += rec.total_sales();
        orders.insert(rec.order_id());
    }

    let avg_order_value = if view.is_empty() {
        None
    } else {
        Some(total / view.len() as f64)
    };

    KpiSummary {
        total_sales: total,
        order_count: orders.len(),
        avg_order_value,
    }
}

// ---------------------------------------------------------------------------
// Grouped sums
// ---------------------------------------------------------------------------

/// An ordered `(key, summed total_sales)` sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GroupedSummary<K> {
    entries: Vec<(K, f64)>,
}

impl<K> GroupedSummary<K> {
    pub fn entries(&self) -> &[(K, f64)] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, f64)> + '_ {
        self.entries.iter().map(|(k, v)| (k, *v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|(_, v)| *v)
    }

    /// Sum over all groups; equals the view total.
    pub fn total(&self) -> f64 {
        self.values().sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K> IntoIterator for GroupedSummary<K> {
    type Item = (K, f64);
    type IntoIter = std::vec::IntoIter<(K, f64)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Sum per label, ranked by descending value with ascending-label tiebreak.
fn ranked_by_label<'a>(
    view: &FilteredView<'a>,
    label: impl Fn(&'a Record) -> &'a str,
) -> GroupedSummary<String> {
    let mut sums: HashMap<&str, f64> = HashMap::new();
    for rec in view.iter() {
        *sums.entry(label(rec)).or_default() += rec.total_sales();
    }

    let mut entries: Vec<(String, f64)> = sums
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    entries.sort_by(|(ka, va), (kb, vb)| vb.total_cmp(va).then_with(|| ka.cmp(kb)));

    GroupedSummary { entries }
}

/// Revenue per category, highest first.
pub fn group_by_category(view: &FilteredView<'_>) -> GroupedSummary<String> {
    ranked_by_label(view, |rec| rec.category())
}

/// Revenue per region, highest first.
pub fn group_by_region(view: &FilteredView<'_>) -> GroupedSummary<String> {
    ranked_by_label(view, |rec| rec.region())
}

/// Revenue per calendar day, in chronological order.
pub fn group_by_date(view: &FilteredView<'_>) -> GroupedSummary<NaiveDate> {
    let mut sums: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for rec in view.iter() {
        *sums.entry(rec.date()).or_default() += rec.total_sales();
    }
    GroupedSummary {
        entries: sums.into_iter().collect(),
    }
}

// ---------------------------------------------------------------------------
// Everything the dashboard draws, in one value
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub rows: usize,
    pub kpis: KpiSummary,
    pub by_category: GroupedSummary<String>,
    pub by_date: GroupedSummary<NaiveDate>,
    pub by_region: GroupedSummary<String>,
}

impl Default for DashboardSummary {
    fn default() -> Self {
        DashboardSummary {
            rows: 0,
            kpis: KpiSummary {
                total_sales: 0.0,
                order_count: 0,
                avg_order_value: None,
            },
            by_category: GroupedSummary { entries: Vec::new() },
            by_date: GroupedSummary { entries: Vec::new() },
            by_region: GroupedSummary { entries: Vec::new() },
        }
    }
}

pub fn summarize(view: &FilteredView<'_>) -> DashboardSummary {
    DashboardSummary {
        rows: view.len(),
        kpis: compute_kpis(view),
        by_category: group_by_category(view),
        by_date: group_by_date(view),
        by_region: group_by_region(view),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{filter, FilterSpec};
    use crate::data::model::{DateRange, Dataset, Record};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn sample() -> Dataset {
        vec![
            Record::new("1", date(1, 1), "A", "X", 2, 10.0),
            Record::new("2", date(1, 1), "B", "Y", 1, 5.0),
            Record::new("3", date(1, 2), "A", "X", 1, 20.0),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn kpis_for_reference_scenario() {
        let ds = sample();
        let spec = FilterSpec::new(["A"], ["X"], DateRange::new(date(1, 1), date(1, 2)));
        let view = filter(&ds, &spec);

        let kpis = compute_kpis(&view);
        assert_eq!(kpis.total_sales, 40.0);
        assert_eq!(kpis.order_count, 2);
        assert_eq!(kpis.avg_order_value, Some(20.0));

        let daily = group_by_date(&view);
        assert_eq!(daily.entries(), &[(date(1, 1), 20.0), (date(1, 2), 20.0)]);
    }

    #[test]
    fn empty_view_is_degenerate_not_an_error() {
        let ds = sample();
        let spec = FilterSpec::new(["A"], ["X"], DateRange::new(date(2, 1), date(1, 1)));
        let view = filter(&ds, &spec);

        let summary = summarize(&view);
        assert_eq!(summary, DashboardSummary::default());
        assert_eq!(summary.kpis.avg_order_value, None);
    }

    #[test]
    fn order_count_is_distinct_ids() {
        let ds: Dataset = vec![
            Record::new("9", date(1, 1), "A", "X", 1, 1.0),
            Record::new("9", date(1, 1), "B", "X", 1, 2.0),
            Record::new("10", date(1, 3), "A", "Y", 1, 3.0),
        ]
        .into_iter()
        .collect();
        let kpis = compute_kpis(&FilteredView::all(&ds));
        assert_eq!(kpis.order_count, 2);
        assert_eq!(kpis.avg_order_value, Some(2.0));
    }

    #[test]
    fn ranking_breaks_ties_by_label() {
        let ds: Dataset = vec![
            Record::new("1", date(1, 1), "Garden", "X", 1, 5.0),
            Record::new("2", date(1, 1), "Books", "X", 1, 5.0),
            Record::new("3", date(1, 1), "Toys", "X", 1, 9.0),
            Record::new("4", date(1, 1), "Books", "X", 0, 100.0),
        ]
        .into_iter()
        .collect();
        let ranked = group_by_category(&FilteredView::all(&ds));
        assert_eq!(
            ranked.entries(),
            &[
                ("Toys".to_string(), 9.0),
                ("Books".to_string(), 5.0),
                ("Garden".to_string(), 5.0),
            ]
        );
    }

    #[test]
    fn region_groups_rank_descending() {
        let ds = sample();
        let regions = group_by_region(&FilteredView::all(&ds));
        assert_eq!(
            regions.entries(),
            &[("X".to_string(), 40.0), ("Y".to_string(), 5.0)]
        );
    }

    #[test]
    fn summary_serializes_groups_as_pairs() {
        let ds = sample();
        let json = serde_json::to_value(summarize(&FilteredView::all(&ds))).unwrap();
        assert_eq!(json["rows"], 3);
        assert_eq!(json["by_date"][0][0], "2024-01-01");
        assert_eq!(json["by_date"][0][1], 25.0);
        assert_eq!(json["kpis"]["order_count"], 3);
    }

    // -- properties --

    fn arb_dataset() -> impl Strategy<Value = Dataset> {
        prop::collection::vec(
            (
                0u32..15,
                1u32..28,
                prop::sample::select(vec!["A", "B", "C", "D"]),
                prop::sample::select(vec!["N", "S", "E"]),
                0u64..20,
                0u32..10_000,
            ),
            0..60,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .map(|(order, day, cat, region, qty, cents)| {
                    Record::new(
                        order.to_string(),
                        date(1, day),
                        cat,
                        region,
                        qty,
                        cents as f64 / 100.0,
                    )
                })
                .collect()
        })
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-6 * a.abs().max(b.abs()).max(1.0)
    }

    proptest! {
        #[test]
        fn groupings_conserve_total(ds in arb_dataset()) {
            let view = FilteredView::all(&ds);
            let total = compute_kpis(&view).total_sales;
            prop_assert!(close(group_by_category(&view).total(), total));
            prop_assert!(close(group_by_region(&view).total(), total));
            prop_assert!(close(group_by_date(&view).total(), total));
        }

        #[test]
        fn groupings_are_ordered(ds in arb_dataset()) {
            let view = FilteredView::all(&ds);

            let dates: Vec<NaiveDate> = group_by_date(&view).keys().copied().collect();
            prop_assert!(dates.windows(2).all(|w| w[0] < w[1]));

            for ranked in [group_by_category(&view), group_by_region(&view)] {
                let values: Vec<f64> = ranked.values().collect();
                prop_assert!(values.windows(2).all(|w| w[0] >= w[1]));
            }
        }

        #[test]
        fn aggregation_ignores_row_order(ds in arb_dataset()) {
            let forward = FilteredView::all(&ds);
            let reversed: FilteredView<'_> = ds.records().iter().rev().collect();
            let fwd_dates: Vec<NaiveDate> = group_by_date(&forward).keys().copied().collect();
            let rev_dates: Vec<NaiveDate> = group_by_date(&reversed).keys().copied().collect();
            prop_assert_eq!(fwd_dates, rev_dates);
            prop_assert_eq!(compute_kpis(&forward).order_count, compute_kpis(&reversed).order_count);
            prop_assert!(close(compute_kpis(&forward).total_sales, compute_kpis(&reversed).total_sales));
        }
    }
}
