//! Derived numbers over a filtered view.
//!
//! Each submodule is a set of pure functions of a [`WorkingSet`]; [`snapshot`]
//! chains them into the single recomputation pass run on every filter change.
//!
//! [`WorkingSet`]: crate::data::model::WorkingSet

pub mod metrics;
pub mod risk;
pub mod snapshot;
pub mod views;

pub use risk::{ChurnScorer, HeuristicScorer, RiskBand};
pub use snapshot::Snapshot;
