use serde::Serialize;

use crate::data::model::WorkingSet;

/// Headline numbers shown above the charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_customers: usize,
    /// Percentage in `[0, 100]`, one decimal; `0.0` for an empty view.
    pub churn_rate: f64,
    /// `None` for an empty view.
    pub avg_monthly_charge: Option<f64>,
    pub long_term_customers: usize,
}

/// Compute the KPIs over `set`.  Customers with tenure strictly above
/// `long_term_months` count as long-term.
pub fn compute_kpis(set: &WorkingSet<'_>, long_term_months: u32) -> Kpis {
    let total = set.len();
    if total == 0 {
        return Kpis {
            total_customers: 0,
            churn_rate: 0.0,
            avg_monthly_charge: None,
            long_term_customers: 0,
        };
    }

    let churned = set.rows.iter().filter(|r| r.has_churned()).count();
    let charges: f64 = set.rows.iter().map(|r| r.monthly_charges).sum();
    let long_term = set
        .rows
        .iter()
        .filter(|r| r.tenure_months > long_term_months)
        .count();

    Kpis {
        total_customers: total,
        churn_rate: round_one_decimal(churned as f64 / total as f64 * 100.0),
        avg_monthly_charge: Some(charges / total as f64),
        long_term_customers: long_term,
    }
}

fn round_one_decimal(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::customer;
    use crate::data::model::CustomerTable;

    fn table(churn: &[&str]) -> CustomerTable {
        CustomerTable::from_records(
            churn
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    let mut rec = customer(&i.to_string());
                    rec.churn = c.to_string();
                    rec.monthly_charges = 10.0 * (i + 1) as f64;
                    rec.tenure_months = 20 * i as u32;
                    rec
                })
                .collect(),
            false,
        )
    }

    fn all(table: &CustomerTable) -> WorkingSet<'_> {
        WorkingSet::unscored(table.records.iter().collect())
    }

    #[test]
    fn test_kpis_over_mixed_view() {
        let t = table(&["Yes", "No", "No", "Yes", "No", "No"]);
        let kpis = compute_kpis(&all(&t), 60);

        assert_eq!(kpis.total_customers, 6);
        assert_eq!(kpis.churn_rate, 33.3);
        assert_eq!(kpis.avg_monthly_charge, Some(35.0));
        // tenures 0,20,40,60,80,100 → 60 itself is not long-term
        assert_eq!(kpis.long_term_customers, 2);
    }

    #[test]
    fn test_churn_rate_extremes() {
        let none = table(&["No", "No"]);
        assert_eq!(compute_kpis(&all(&none), 60).churn_rate, 0.0);

        let every = table(&["Yes", "Yes", "Yes"]);
        assert_eq!(compute_kpis(&all(&every), 60).churn_rate, 100.0);
    }

    #[test]
    fn test_empty_view_has_neutral_values() {
        let kpis = compute_kpis(&WorkingSet::unscored(Vec::new()), 60);
        assert_eq!(
            kpis,
            Kpis {
                total_customers: 0,
                churn_rate: 0.0,
                avg_monthly_charge: None,
                long_term_customers: 0,
            }
        );
    }
}
