use std::collections::{BTreeMap, BTreeSet};

use super::model::{CustomerTable, Dimension, WorkingSet};

// ---------------------------------------------------------------------------
// Filter predicate: which values are selected per dimension
// ---------------------------------------------------------------------------

/// Per-dimension selection state: maps dimension → set of selected values.
/// A dimension with an empty set (or missing from the map) selects nothing.
pub type FilterState = BTreeMap<Dimension, BTreeSet<String>>;

/// Initialise a [`FilterState`] with all observed values selected.
pub fn init_filter_state(table: &CustomerTable) -> FilterState {
    Dimension::ALL
        .iter()
        .map(|&dim| (dim, table.values_of(dim).clone()))
        .collect()
}

/// Whether `value` is selected for `dim`.
fn passes(filters: &FilterState, dim: Dimension, value: &str) -> bool {
    filters
        .get(&dim)
        .is_some_and(|selected| selected.contains(value))
}

/// Return indices of customers that pass all dimension filters, in table order.
pub fn filtered_indices(table: &CustomerTable, filters: &FilterState) -> Vec<usize> {
    table
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            Dimension::ALL
                .iter()
                .all(|&dim| passes(filters, dim, dim.value_of(rec)))
        })
        .map(|(i, _)| i)
        .collect()
}

/// Build the unscored working view for the current selection.
pub fn apply_filters<'a>(table: &'a CustomerTable, filters: &FilterState) -> WorkingSet<'a> {
    let rows = filtered_indices(table, filters)
        .into_iter()
        .map(|i| &table.records[i])
        .collect();
    WorkingSet::unscored(rows)
}

/// Toggle a single value in a dimension's selection.
pub fn toggle_value(filters: &mut FilterState, dim: Dimension, value: &str) {
    let selected = filters.entry(dim).or_default();
    if !selected.remove(value) {
        selected.insert(value.to_string());
    }
}

/// Select every observed value of a dimension.
pub fn select_all(filters: &mut FilterState, table: &CustomerTable, dim: Dimension) {
    filters.insert(dim, table.values_of(dim).clone());
}

/// Deselect every value of a dimension.
pub fn select_none(filters: &mut FilterState, dim: Dimension) {
    filters.insert(dim, BTreeSet::new());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::customer;
    use crate::data::model::CustomerRecord;

    fn row(id: &str, contract: &str, gender: &str, senior: &str) -> CustomerRecord {
        let mut rec = customer(id);
        rec.contract_type = contract.into();
        rec.gender = gender.into();
        rec.senior_citizen = senior.into();
        rec
    }

    fn table() -> CustomerTable {
        CustomerTable::from_records(
            vec![
                row("1", "Month-to-Month", "Female", "0"),
                row("2", "One year", "Male", "1"),
                row("3", "Two year", "Female", "1"),
                row("4", "Month-to-Month", "Male", "0"),
                row("5", "Month-to-Month", "Female", "1"),
            ],
            false,
        )
    }

    fn ids(set: &WorkingSet<'_>) -> Vec<String> {
        set.rows.iter().map(|r| r.customer_id.clone()).collect()
    }

    #[test]
    fn test_default_state_selects_everything() {
        let table = table();
        let filters = init_filter_state(&table);
        assert_eq!(filtered_indices(&table, &filters), [0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_conjunction_across_dimensions() {
        let table = table();
        let mut filters = init_filter_state(&table);
        filters.insert(Dimension::ContractType, ["Month-to-Month".to_string()].into());
        filters.insert(Dimension::Gender, ["Female".to_string()].into());

        let set = apply_filters(&table, &filters);
        assert_eq!(ids(&set), ["1", "5"]);

        // every surviving row lies in the selection product
        for rec in &set.rows {
            for dim in Dimension::ALL {
                assert!(filters[&dim].contains(dim.value_of(rec)));
            }
        }
    }

    #[test]
    fn test_empty_selection_yields_nothing() {
        let table = table();
        let mut filters = init_filter_state(&table);
        select_none(&mut filters, Dimension::SeniorCitizen);
        assert!(apply_filters(&table, &filters).is_empty());

        filters.remove(&Dimension::SeniorCitizen);
        assert!(apply_filters(&table, &filters).is_empty());
    }

    #[test]
    fn test_filtering_is_idempotent() {
        let table = table();
        let mut filters = init_filter_state(&table);
        toggle_value(&mut filters, Dimension::ContractType, "Two year");

        let once = apply_filters(&table, &filters);
        let subset = CustomerTable::from_records(once.rows.iter().map(|r| (*r).clone()).collect(), false);
        let twice = apply_filters(&subset, &filters);
        assert_eq!(ids(&once), ids(&twice));
        assert!(once.len() <= table.len());
    }

    #[test]
    fn test_toggle_and_select_all() {
        let table = table();
        let mut filters = init_filter_state(&table);

        toggle_value(&mut filters, Dimension::Gender, "Male");
        assert!(!filters[&Dimension::Gender].contains("Male"));
        toggle_value(&mut filters, Dimension::Gender, "Male");
        assert!(filters[&Dimension::Gender].contains("Male"));

        select_none(&mut filters, Dimension::Gender);
        select_all(&mut filters, &table, Dimension::Gender);
        assert_eq!(apply_filters(&table, &filters).len(), 5);
    }
}
