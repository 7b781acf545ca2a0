//! Customer churn dashboard core.
//!
//! Loads a customer table, filters it by contract type, gender and
//! senior-citizen status, and derives KPIs, a ranked at-risk list and chart
//! data from the filtered view.  The egui front end lives in the binary.

pub mod analytics;
pub mod config;
pub mod data;
pub mod error;
pub mod state;

pub use analytics::{ChurnScorer, HeuristicScorer, RiskBand, Snapshot};
pub use config::DashboardConfig;
pub use data::cache::DatasetCache;
pub use data::loader::load_file;
pub use data::model::{AddOn, CustomerRecord, CustomerTable, Dimension, WorkingSet};
pub use error::LoadError;
pub use state::Dashboard;
