use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::model::{CustomerRecord, CustomerTable, WorkingSet};

// ---------------------------------------------------------------------------
// Scoring strategy
// ---------------------------------------------------------------------------

/// Maps one customer to a churn probability in `[0, 1]`.
pub trait ChurnScorer {
    fn score(&self, record: &CustomerRecord) -> f64;
}

/// Fixed linear heuristic used when the source carries no usable scores.
///
/// ```text
/// score = month_to_month * [contract is Month-to-Month]
///       + new_customer   * [tenure < new_customer_months]
///       - per_addon      * (# add-ons equal to "Yes")
/// ```
/// clamped to `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicScorer {
    pub month_to_month: f64,
    pub new_customer: f64,
    pub new_customer_months: u32,
    pub per_addon: f64,
}

impl Default for HeuristicScorer {
    fn default() -> Self {
        Self {
            month_to_month: 0.4,
            new_customer: 0.3,
            new_customer_months: 12,
            per_addon: 0.05,
        }
    }
}

impl ChurnScorer for HeuristicScorer {
    fn score(&self, record: &CustomerRecord) -> f64 {
        let mut score = 0.0;
        if record.contract_type == "Month-to-Month" {
            score += self.month_to_month;
        }
        if record.tenure_months < self.new_customer_months {
            score += self.new_customer;
        }
        score -= self.per_addon * record.addons_taken() as f64;
        score.clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Scoring the working view
// ---------------------------------------------------------------------------

/// Attach a probability to every row of `set`, returning a new view.
///
/// Stored probabilities are reused only when the whole `table` has a complete
/// `ChurnProbability` column; otherwise every row is rescored by `scorer`,
/// including rows that did carry a value.
pub fn score_working_set<'a>(
    table: &CustomerTable,
    set: &WorkingSet<'a>,
    scorer: &dyn ChurnScorer,
) -> WorkingSet<'a> {
    let probabilities: Vec<f64> = if table.needs_rescoring() {
        log::debug!(
            "Regenerating churn probabilities for {} customers",
            set.len()
        );
        set.rows.iter().map(|rec| bounded(scorer.score(rec))).collect()
    } else {
        set.rows
            .iter()
            .map(|rec| bounded(rec.churn_probability.unwrap_or_else(|| scorer.score(rec))))
            .collect()
    };

    WorkingSet {
        rows: set.rows.clone(),
        probabilities: Some(probabilities),
    }
}

/// Keep any scorer's output inside [0, 1]; NaN counts as no risk.
fn bounded(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Risk banding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    pub const HIGH_THRESHOLD: f64 = 0.7;
    pub const MEDIUM_THRESHOLD: f64 = 0.4;

    pub fn classify(probability: f64) -> Self {
        if probability >= Self::HIGH_THRESHOLD {
            RiskBand::High
        } else if probability >= Self::MEDIUM_THRESHOLD {
            RiskBand::Medium
        } else {
            RiskBand::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskBand::Low => "low",
            RiskBand::Medium => "medium",
            RiskBand::High => "high",
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Top at-risk customers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtRiskCustomer {
    pub customer_id: String,
    pub contract_type: String,
    pub tenure_months: u32,
    pub churn_probability: f64,
    pub band: RiskBand,
}

/// The `n` highest-probability rows of a scored view, highest first.
///
/// Ties keep table order.  Returns fewer than `n` rows when the view is
/// smaller, and nothing when the view is unscored.
pub fn top_at_risk(set: &WorkingSet<'_>, n: usize) -> Vec<AtRiskCustomer> {
    let Some(probabilities) = &set.probabilities else {
        return Vec::new();
    };

    let mut order: Vec<usize> = (0..set.len()).collect();
    // slice::sort_by is stable
    order.sort_by(|&a, &b| probabilities[b].total_cmp(&probabilities[a]));

    order
        .into_iter()
        .take(n)
        .map(|i| {
            let rec = set.rows[i];
            let p = probabilities[i];
            AtRiskCustomer {
                customer_id: rec.customer_id.clone(),
                contract_type: rec.contract_type.clone(),
                tenure_months: rec.tenure_months,
                churn_probability: p,
                band: RiskBand::classify(p),
            }
        })
        .collect()
}
