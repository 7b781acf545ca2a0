use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CustomerRecord – one row of the source table
// ---------------------------------------------------------------------------

/// A single customer (one row of the source spreadsheet).
///
/// Categorical columns are kept as text exactly as they appear in the file;
/// `SeniorCitizen` in particular may be `0`/`1` or `Yes`/`No` depending on the
/// export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    #[serde(rename = "CustomerID")]
    pub customer_id: String,
    #[serde(rename = "ContractType")]
    pub contract_type: String,
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "SeniorCitizen")]
    pub senior_citizen: String,
    #[serde(rename = "TenureMonths")]
    pub tenure_months: u32,
    #[serde(rename = "MonthlyCharges")]
    pub monthly_charges: f64,
    #[serde(rename = "Churn")]
    pub churn: String,
    #[serde(rename = "PaymentMethod")]
    pub payment_method: String,
    #[serde(rename = "TechSupport")]
    pub tech_support: String,
    #[serde(rename = "OnlineBackup")]
    pub online_backup: String,
    #[serde(rename = "StreamingTV")]
    pub streaming_tv: String,
    #[serde(rename = "DeviceProtection")]
    pub device_protection: String,
    /// `None` when the cell was empty, unparsable or outside `[0, 1]`.
    #[serde(rename = "ChurnProbability")]
    pub churn_probability: Option<f64>,
}

impl CustomerRecord {
    pub fn has_churned(&self) -> bool {
        self.churn == "Yes"
    }

    /// Number of add-on services this customer subscribes to.
    pub fn addons_taken(&self) -> usize {
        AddOn::ALL.iter().filter(|a| a.is_taken(self)).count()
    }
}

// ---------------------------------------------------------------------------
// Dimension – the filterable categorical columns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dimension {
    ContractType,
    Gender,
    SeniorCitizen,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [
        Dimension::ContractType,
        Dimension::Gender,
        Dimension::SeniorCitizen,
    ];

    /// Column header in the source file.
    pub fn column(self) -> &'static str {
        match self {
            Dimension::ContractType => "ContractType",
            Dimension::Gender => "Gender",
            Dimension::SeniorCitizen => "SeniorCitizen",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dimension::ContractType => "Contract Type",
            Dimension::Gender => "Gender",
            Dimension::SeniorCitizen => "Senior Citizen",
        }
    }

    pub fn value_of(self, record: &CustomerRecord) -> &str {
        match self {
            Dimension::ContractType => &record.contract_type,
            Dimension::Gender => &record.gender,
            Dimension::SeniorCitizen => &record.senior_citizen,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// AddOn – optional supplementary services
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AddOn {
    TechSupport,
    OnlineBackup,
    StreamingTV,
    DeviceProtection,
}

impl AddOn {
    pub const ALL: [AddOn; 4] = [
        AddOn::TechSupport,
        AddOn::OnlineBackup,
        AddOn::StreamingTV,
        AddOn::DeviceProtection,
    ];

    pub fn column(self) -> &'static str {
        match self {
            AddOn::TechSupport => "TechSupport",
            AddOn::OnlineBackup => "OnlineBackup",
            AddOn::StreamingTV => "StreamingTV",
            AddOn::DeviceProtection => "DeviceProtection",
        }
    }

    pub fn value_of(self, record: &CustomerRecord) -> &str {
        match self {
            AddOn::TechSupport => &record.tech_support,
            AddOn::OnlineBackup => &record.online_backup,
            AddOn::StreamingTV => &record.streaming_tv,
            AddOn::DeviceProtection => &record.device_protection,
        }
    }

    pub fn is_taken(self, record: &CustomerRecord) -> bool {
        self.value_of(record) == "Yes"
    }
}

impl fmt::Display for AddOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

// ---------------------------------------------------------------------------
// CustomerTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed table with pre-computed dimension indices.
///
/// Never mutated after construction; shared between views through `Arc`.
#[derive(Debug, Clone)]
pub struct CustomerTable {
    /// All customers in file order.
    pub records: Vec<CustomerRecord>,
    /// For each filterable dimension the sorted set of observed values.
    pub dimension_values: BTreeMap<Dimension, BTreeSet<String>>,
    /// Whether the source carried a `ChurnProbability` column at all.
    pub has_probability_column: bool,
}

impl CustomerTable {
    /// Build dimension indices from the loaded records.
    pub fn from_records(records: Vec<CustomerRecord>, has_probability_column: bool) -> Self {
        let mut dimension_values: BTreeMap<Dimension, BTreeSet<String>> = Dimension::ALL
            .iter()
            .map(|&d| (d, BTreeSet::new()))
            .collect();

        for rec in &records {
            for dim in Dimension::ALL {
                dimension_values
                    .entry(dim)
                    .or_default()
                    .insert(dim.value_of(rec).to_string());
            }
        }

        CustomerTable {
            records,
            dimension_values,
            has_probability_column,
        }
    }

    /// Number of customers.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Observed values for a dimension (empty set for an empty table).
    pub fn values_of(&self, dimension: Dimension) -> &BTreeSet<String> {
        static EMPTY: BTreeSet<String> = BTreeSet::new();
        self.dimension_values.get(&dimension).unwrap_or(&EMPTY)
    }

    /// True when stored probabilities cannot be used as-is: the column is
    /// absent, or any single row anywhere in the table lacks a value.
    pub fn needs_rescoring(&self) -> bool {
        !self.has_probability_column || self.records.iter().any(|r| r.churn_probability.is_none())
    }
}

// ---------------------------------------------------------------------------
// WorkingSet – the filtered (and optionally scored) view
// ---------------------------------------------------------------------------

/// Rows selected from a [`CustomerTable`] by reference, plus an optional
/// probability per row.
///
/// Scores live beside the rows rather than inside them so that deriving a
/// scored view never touches the shared table.
#[derive(Debug, Clone)]
pub struct WorkingSet<'a> {
    pub rows: Vec<&'a CustomerRecord>,
    /// Parallel to `rows` when present.
    pub probabilities: Option<Vec<f64>>,
}

impl<'a> WorkingSet<'a> {
    pub fn unscored(rows: Vec<&'a CustomerRecord>) -> Self {
        WorkingSet {
            rows,
            probabilities: None,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn probability(&self, index: usize) -> Option<f64> {
        self.probabilities.as_ref().and_then(|p| p.get(index).copied())
    }

    /// Iterate rows with their probability (if scored).
    pub fn iter(&self) -> impl Iterator<Item = (&'a CustomerRecord, Option<f64>)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .map(move |(i, rec)| (*rec, self.probability(i)))
    }
}
