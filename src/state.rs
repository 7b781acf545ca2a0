use std::path::PathBuf;
use std::sync::Arc;

use crate::analytics::{ChurnScorer, Snapshot};
use crate::config::{clamp_top_n, AnalysisConfig, DashboardConfig};
use crate::data::cache::DatasetCache;
use crate::data::filter::{self, init_filter_state, FilterState};
use crate::data::model::{CustomerTable, Dimension};
use crate::error::LoadResult;

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// The full session state, independent of rendering.
pub struct Dashboard {
    cache: DatasetCache,
    scorer: Box<dyn ChurnScorer>,
    analysis: AnalysisConfig,

    /// Loaded table (None until a load succeeds).
    pub table: Option<Arc<CustomerTable>>,

    /// Per-dimension filter selections.
    pub filters: FilterState,

    /// Rows in the at-risk list.
    pub top_n: usize,

    /// Derived views for the current selection.
    pub snapshot: Option<Snapshot>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Dashboard {
    pub fn new(config: &DashboardConfig) -> Self {
        Self::with_scorer(config, Box::new(config.heuristic.clone()))
    }

    /// Build a dashboard around a custom scoring strategy.
    pub fn with_scorer(config: &DashboardConfig, scorer: Box<dyn ChurnScorer>) -> Self {
        Self {
            cache: DatasetCache::new(&config.data_path),
            scorer,
            analysis: config.analysis.clone(),
            table: None,
            filters: FilterState::new(),
            top_n: clamp_top_n(config.top_n),
            snapshot: None,
            status_message: None,
        }
    }

    pub fn data_path(&self) -> PathBuf {
        self.cache.path().to_path_buf()
    }

    /// Point the dashboard at a different file and load it.
    pub fn open(&mut self, path: PathBuf) -> LoadResult<()> {
        self.cache = DatasetCache::new(path);
        self.table = None;
        self.reload()
    }

    /// Fetch the table through the cache and recompute.
    ///
    /// Filters are reset to "everything selected" whenever the cache hands
    /// back a different table.  A load failure clears all derived state.
    pub fn reload(&mut self) -> LoadResult<()> {
        match self.cache.load() {
            Ok(table) => {
                let changed = self
                    .table
                    .as_ref()
                    .map_or(true, |current| !Arc::ptr_eq(current, &table));
                if changed {
                    self.filters = init_filter_state(&table);
                    self.table = Some(table);
                }
                self.status_message = None;
                self.recompute();
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", self.cache.path().display());
                self.status_message = Some(format!("Error: {e}"));
                self.table = None;
                self.snapshot = None;
                Err(e)
            }
        }
    }

    /// Rebuild the snapshot from the current table and selections.
    pub fn recompute(&mut self) {
        self.snapshot = self.table.as_ref().map(|table| {
            Snapshot::compute(
                table,
                &self.filters,
                self.top_n,
                self.scorer.as_ref(),
                &self.analysis,
            )
        });
    }

    /// Toggle a single value in a dimension's filter.
    pub fn toggle_filter_value(&mut self, dim: Dimension, value: &str) {
        filter::toggle_value(&mut self.filters, dim, value);
        self.recompute();
    }

    /// Select all observed values of a dimension.
    pub fn select_all(&mut self, dim: Dimension) {
        if let Some(table) = &self.table {
            filter::select_all(&mut self.filters, table, dim);
            self.recompute();
        }
    }

    /// Deselect all values of a dimension.
    pub fn select_none(&mut self, dim: Dimension) {
        filter::select_none(&mut self.filters, dim);
        self.recompute();
    }

    pub fn set_top_n(&mut self, n: usize) {
        let n = clamp_top_n(n);
        if n != self.top_n {
            self.top_n = n;
            self.recompute();
        }
    }

    pub fn is_selected(&self, dim: Dimension, value: &str) -> bool {
        self.filters
            .get(&dim)
            .is_some_and(|selected| selected.contains(value))
    }
}
