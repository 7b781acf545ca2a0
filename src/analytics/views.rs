use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::model::{AddOn, WorkingSet};

// ---------------------------------------------------------------------------
// Churn distribution
// ---------------------------------------------------------------------------

/// Count per `Churn` value, largest first (ties by value).
pub fn churn_distribution(set: &WorkingSet<'_>) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for rec in &set.rows {
        *counts.entry(rec.churn.as_str()).or_default() += 1;
    }

    let mut out: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1));
    out
}

// ---------------------------------------------------------------------------
// Tenure histogram
// ---------------------------------------------------------------------------

/// Equal-width tenure bins shared by every churn category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TenureHistogram {
    /// `bins + 1` ascending edges.
    pub edges: Vec<f64>,
    /// Per-bin counts over the whole view.
    pub totals: Vec<usize>,
    /// Per-bin counts for each `Churn` value.
    pub by_churn: BTreeMap<String, Vec<usize>>,
}

impl TenureHistogram {
    pub fn bin_count(&self) -> usize {
        self.totals.len()
    }

    pub fn bin_width(&self) -> f64 {
        match self.edges.as_slice() {
            [first, .., last] => (last - first) / self.bin_count() as f64,
            _ => 0.0,
        }
    }
}

/// Bin tenure over the view's observed range.
///
/// An all-equal range is widened to `value ± 0.5` and an empty view uses
/// `[0, 1]`, so edges are always strictly increasing.  The last bin is
/// closed on the right.
pub fn tenure_histogram(set: &WorkingSet<'_>, bins: usize) -> TenureHistogram {
    let bins = bins.max(1);
    let tenures = set.rows.iter().map(|r| r.tenure_months as f64);

    let (mut lo, mut hi) = tenures
        .fold(None, |acc: Option<(f64, f64)>, t| match acc {
            None => Some((t, t)),
            Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
        })
        .unwrap_or((0.0, 1.0));
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins)
        .map(|i| if i == bins { hi } else { lo + width * i as f64 })
        .collect();

    let bin_of = |t: f64| (((t - lo) / width) as usize).min(bins - 1);

    let mut totals = vec![0; bins];
    let mut by_churn: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for rec in &set.rows {
        let b = bin_of(rec.tenure_months as f64);
        totals[b] += 1;
        by_churn
            .entry(rec.churn.clone())
            .or_insert_with(|| vec![0; bins])[b] += 1;
    }

    TenureHistogram {
        edges,
        totals,
        by_churn,
    }
}

// ---------------------------------------------------------------------------
// Average monthly charge by contract
// ---------------------------------------------------------------------------

/// Mean `MonthlyCharges` per contract type, ordered by contract name.
pub fn avg_charge_by_contract(set: &WorkingSet<'_>) -> Vec<(String, f64)> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for rec in &set.rows {
        let entry = sums.entry(rec.contract_type.as_str()).or_default();
        entry.0 += rec.monthly_charges;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(contract, (sum, n))| (contract.to_string(), sum / n as f64))
        .collect()
}

// ---------------------------------------------------------------------------
// Add-on adoption
// ---------------------------------------------------------------------------

/// Fraction of customers with each add-on set to `"Yes"`.  Empty for an
/// empty view.
pub fn addon_adoption(set: &WorkingSet<'_>) -> Vec<(AddOn, f64)> {
    if set.is_empty() {
        return Vec::new();
    }
    let n = set.len() as f64;
    AddOn::ALL
        .iter()
        .map(|&addon| {
            let taken = set.rows.iter().filter(|r| addon.is_taken(r)).count();
            (addon, taken as f64 / n)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Scatter projection
// ---------------------------------------------------------------------------

/// One point of the charges-vs-tenure scatter, with hover attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub monthly_charges: f64,
    pub tenure_months: u32,
    pub churn: String,
    /// Marker size; absent when not sizing by probability.
    pub size: Option<f64>,
    pub contract_type: String,
    pub payment_method: String,
    pub tech_support: String,
    pub streaming_tv: String,
}

/// Project every row of `set`.  Sizes come from the view's probabilities
/// when `sized` is set and the view is scored.
pub fn scatter_points(set: &WorkingSet<'_>, sized: bool) -> Vec<ScatterPoint> {
    set.iter()
        .map(|(rec, probability)| ScatterPoint {
            monthly_charges: rec.monthly_charges,
            tenure_months: rec.tenure_months,
            churn: rec.churn.clone(),
            size: probability.filter(|_| sized),
            contract_type: rec.contract_type.clone(),
            payment_method: rec.payment_method.clone(),
            tech_support: rec.tech_support.clone(),
            streaming_tv: rec.streaming_tv.clone(),
        })
        .collect()
}
