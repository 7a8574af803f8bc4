use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::config::DashboardConfig;
use crate::data::{
    filter, summarize, DashboardSummary, Dataset, DatasetCache, DateRange, FilterSpec, LoadError,
};

/// Which label filter a UI action refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Category,
    Region,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full dashboard state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Parsed datasets keyed by source identity.
    cache: DatasetCache,

    /// File the current dataset came from.
    pub source: Option<PathBuf>,

    /// Loaded dataset (None until a file loads).
    pub dataset: Option<Arc<Dataset>>,

    /// Current filter selections; `None` while no dataset is loaded.
    pub filter: Option<FilterSpec>,

    /// KPIs and groupings for the current filter (recomputed on change).
    pub summary: DashboardSummary,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let cache = DatasetCache::new(config.load_options());
        Self {
            config,
            cache,
            source: None,
            dataset: None,
            filter: None,
            summary: DashboardSummary::default(),
            status_message: None,
        }
    }

    /// Load `path` (through the cache) and make it the current dataset.
    pub fn open(&mut self, path: &Path) -> Result<(), LoadError> {
        let result = self.cache.get_or_load(path);
        self.apply_load(path, result)
    }

    /// Re-parse the current source, bypassing the cache.
    pub fn reload(&mut self) -> Result<(), LoadError> {
        let Some(path) = self.source.clone() else {
            return Ok(());
        };
        let result = self.cache.reload(&path);
        self.apply_load(&path, result)
    }

    fn apply_load(
        &mut self,
        path: &Path,
        result: Result<Arc<Dataset>, LoadError>,
    ) -> Result<(), LoadError> {
        match result {
            Ok(dataset) => {
                self.set_dataset(path.to_path_buf(), dataset);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
                Err(e)
            }
        }
    }

    /// Ingest a newly loaded dataset and select everything in it.
    pub fn set_dataset(&mut self, source: PathBuf, dataset: Arc<Dataset>) {
        self.filter = Some(FilterSpec::everything(&dataset));
        self.dataset = Some(dataset);
        self.source = Some(source);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute the summary after a filter change.
    pub fn refilter(&mut self) {
        self.summary = match (&self.dataset, &self.filter) {
            (Some(ds), Some(spec)) => summarize(&filter(ds, spec)),
            _ => DashboardSummary::default(),
        };
    }

    fn selection_mut(&mut self, dim: Dimension) -> Option<&mut std::collections::BTreeSet<String>> {
        let spec = self.filter.as_mut()?;
        Some(match dim {
            Dimension::Category => &mut spec.categories,
            Dimension::Region => &mut spec.regions,
        })
    }

    /// All labels of a dimension present in the dataset.
    pub fn labels(&self, dim: Dimension) -> Vec<String> {
        match (&self.dataset, dim) {
            (Some(ds), Dimension::Category) => ds.categories().iter().cloned().collect(),
            (Some(ds), Dimension::Region) => ds.regions().iter().cloned().collect(),
            (None, _) => Vec::new(),
        }
    }

    pub fn is_selected(&self, dim: Dimension, label: &str) -> bool {
        self.filter.as_ref().is_some_and(|spec| match dim {
            Dimension::Category => spec.categories.contains(label),
            Dimension::Region => spec.regions.contains(label),
        })
    }

    /// Toggle a single label in a dimension's filter.
    pub fn toggle(&mut self, dim: Dimension, label: &str) {
        if let Some(selected) = self.selection_mut(dim) {
            if !selected.remove(label) {
                selected.insert(label.to_string());
            }
            self.refilter();
        }
    }

    /// Select all labels of a dimension.
    pub fn select_all(&mut self, dim: Dimension) {
        let all = self.labels(dim);
        if let Some(selected) = self.selection_mut(dim) {
            *selected = all.into_iter().collect();
            self.refilter();
        }
    }

    /// Deselect all labels of a dimension.
    pub fn select_none(&mut self, dim: Dimension) {
        if let Some(selected) = self.selection_mut(dim) {
            selected.clear();
            self.refilter();
        }
    }

    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        if let Some(spec) = self.filter.as_mut() {
            spec.date_range = DateRange::new(start, end);
            self.refilter();
        }
    }

    /// Back to every label and the full date span.
    pub fn reset_filters(&mut self) {
        if let Some(ds) = &self.dataset {
            self.filter = Some(FilterSpec::everything(ds));
            self.refilter();
        }
    }

    /// The current summary as pretty JSON, for export.
    pub fn summary_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_sample(dir: &Path) -> PathBuf {
        let path = dir.join("sales.csv");
        std::fs::write(
            &path,
            "Order_ID,Date,Category,Region,Quantity,Price\n\
             1,2024-01-01,A,X,2,10\n\
             2,2024-01-01,B,Y,1,5\n\
             3,2024-01-02,A,X,1,20\n",
        )
        .unwrap();
        path
    }

    fn ymd(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn opening_selects_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path());

        let mut state = AppState::default();
        state.open(&path).unwrap();

        assert_eq!(state.summary.rows, 3);
        assert_eq!(state.summary.kpis.total_sales, 45.0);
        assert_eq!(state.labels(Dimension::Category), vec!["A", "B"]);
        assert!(state.is_selected(Dimension::Region, "Y"));
    }

    #[test]
    fn filter_changes_recompute_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path());
        let mut state = AppState::default();
        state.open(&path).unwrap();

        state.toggle(Dimension::Category, "B");
        assert_eq!(state.summary.kpis.total_sales, 40.0);
        assert_eq!(state.summary.kpis.order_count, 2);

        state.set_date_range(ymd(1, 2), ymd(1, 2));
        assert_eq!(state.summary.rows, 1);

        state.set_date_range(ymd(2, 1), ymd(1, 1));
        assert_eq!(state.summary, DashboardSummary::default());

        state.reset_filters();
        assert_eq!(state.summary.rows, 3);
    }

    #[test]
    fn selecting_none_shows_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path());
        let mut state = AppState::default();
        state.open(&path).unwrap();

        state.select_none(Dimension::Region);
        assert_eq!(state.summary.rows, 0);
        assert_eq!(state.summary.kpis.avg_order_value, None);

        state.select_all(Dimension::Region);
        assert_eq!(state.summary.rows, 3);
    }

    #[test]
    fn failed_open_reports_status_and_keeps_previous_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path());
        let mut state = AppState::default();
        state.open(&path).unwrap();

        assert!(state.open(&dir.path().join("missing.csv")).is_err());
        assert!(state.status_message.as_deref().unwrap_or("").starts_with("Error:"));
        assert_eq!(state.summary.rows, 3);
    }

    #[test]
    fn reload_picks_up_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path());
        let mut state = AppState::default();
        state.open(&path).unwrap();

        let mut text = std::fs::read_to_string(&path).unwrap();
        text.push_str("4,2024-01-03,C,Z,1,1\n");
        std::fs::write(&path, text).unwrap();

        state.reload().unwrap();
        assert_eq!(state.summary.rows, 4);
        assert_eq!(state.labels(Dimension::Region), vec!["X", "Y", "Z"]);
    }

    #[test]
    fn summary_exports_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path());
        let mut state = AppState::default();
        state.open(&path).unwrap();

        let json: serde_json::Value = serde_json::from_str(&state.summary_json().unwrap()).unwrap();
        assert_eq!(json["kpis"]["order_count"], 3);
        assert_eq!(json["by_category"][0][0], "A");
    }
}
