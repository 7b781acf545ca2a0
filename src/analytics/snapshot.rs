use serde::Serialize;

use super::metrics::{compute_kpis, Kpis};
use super::risk::{score_working_set, top_at_risk, AtRiskCustomer, ChurnScorer};
use super::views::{
    addon_adoption, avg_charge_by_contract, churn_distribution, scatter_points, tenure_histogram,
    ScatterPoint, TenureHistogram,
};
use crate::config::AnalysisConfig;
use crate::data::filter::{apply_filters, FilterState};
use crate::data::model::{AddOn, CustomerTable};

/// Everything the presentation layer draws for one filter selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub kpis: Kpis,
    pub top_at_risk: Vec<AtRiskCustomer>,
    pub churn_distribution: Vec<(String, usize)>,
    pub tenure_histogram: TenureHistogram,
    pub avg_charge_by_contract: Vec<(String, f64)>,
    pub addon_adoption: Vec<(AddOn, f64)>,
    pub scatter: Vec<ScatterPoint>,
}

impl Snapshot {
    /// One full pass: filter → score → metrics, ranking and views.
    ///
    /// `table` is only read; scores are held in the intermediate view.
    pub fn compute(
        table: &CustomerTable,
        filters: &FilterState,
        top_n: usize,
        scorer: &dyn ChurnScorer,
        config: &AnalysisConfig,
    ) -> Self {
        let filtered = apply_filters(table, filters);
        let scored = score_working_set(table, &filtered, scorer);

        Snapshot {
            kpis: compute_kpis(&scored, config.long_term_months),
            top_at_risk: top_at_risk(&scored, top_n),
            churn_distribution: churn_distribution(&scored),
            tenure_histogram: tenure_histogram(&scored, config.histogram_bins),
            avg_charge_by_contract: avg_charge_by_contract(&scored),
            addon_adoption: addon_adoption(&scored),
            scatter: scatter_points(&scored, table.has_probability_column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::risk::HeuristicScorer;
    use crate::data::filter::{init_filter_state, select_none};
    use crate::data::model::fixtures::customer;
    use crate::data::model::Dimension;

    fn table() -> CustomerTable {
        let records = (0..15)
            .map(|i| {
                let mut rec = customer(&format!("C{i:02}"));
                rec.contract_type = if i % 2 == 0 { "Month-to-Month" } else { "Two year" }.into();
                rec.tenure_months = (i * 5) as u32;
                rec.churn = if i < 4 { "Yes" } else { "No" }.into();
                rec
            })
            .collect();
        CustomerTable::from_records(records, false)
    }

    #[test]
    fn test_default_selection_covers_whole_table() {
        let table = table();
        let snap = Snapshot::compute(
            &table,
            &init_filter_state(&table),
            10,
            &HeuristicScorer::default(),
            &AnalysisConfig::default(),
        );

        assert_eq!(snap.kpis.total_customers, 15);
        assert_eq!(snap.top_at_risk.len(), 10);
        // month-to-month with tenure < 12: C00 and C02 score 0.7
        assert_eq!(snap.top_at_risk[0].customer_id, "C00");
        assert_eq!(snap.top_at_risk[1].customer_id, "C02");
        assert_eq!(snap.scatter.len(), 15);
        assert!(snap.scatter.iter().all(|p| p.size.is_none()));
        assert_eq!(snap.tenure_histogram.totals.iter().sum::<usize>(), 15);
    }

    #[test]
    fn test_empty_selection_degrades_gracefully() {
        let table = table();
        let mut filters = init_filter_state(&table);
        select_none(&mut filters, Dimension::Gender);

        let snap = Snapshot::compute(
            &table,
            &filters,
            10,
            &HeuristicScorer::default(),
            &AnalysisConfig::default(),
        );
        assert_eq!(snap.kpis.total_customers, 0);
        assert_eq!(snap.kpis.churn_rate, 0.0);
        assert_eq!(snap.kpis.avg_monthly_charge, None);
        assert!(snap.top_at_risk.is_empty());
        assert!(snap.churn_distribution.is_empty());
        assert_eq!(snap.tenure_histogram.totals, vec![0; 30]);
        assert!(snap.avg_charge_by_contract.is_empty());
        assert!(snap.addon_adoption.is_empty());
        assert!(snap.scatter.is_empty());
    }
}
