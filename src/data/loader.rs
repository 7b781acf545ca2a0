use std::collections::BTreeMap;
use std::path::Path;

use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{CustomerRecord, CustomerTable};
use crate::error::{LoadError, LoadResult};

/// Columns every source must carry, in canonical order.
pub const REQUIRED_COLUMNS: [&str; 12] = [
    "CustomerID",
    "ContractType",
    "Gender",
    "SeniorCitizen",
    "TenureMonths",
    "MonthlyCharges",
    "Churn",
    "PaymentMethod",
    "TechSupport",
    "OnlineBackup",
    "StreamingTV",
    "DeviceProtection",
];

/// Optional column; absent or incomplete means scores get regenerated.
pub const PROBABILITY_COLUMN: &str = "ChurnProbability";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a customer table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the column names above (recommended)
/// * `.parquet` – one column per field; string (plain, view or dictionary),
///   integer, float or bool types
pub fn load_file(path: &Path) -> LoadResult<CustomerTable> {
    if !path.exists() {
        return Err(LoadError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_csv(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => {
            return Err(LoadError::UnsupportedFormat {
                extension: other.to_string(),
            })
        }
    };

    log::info!(
        "Loaded {} customers from {} (probability column: {})",
        table.len(),
        path.display(),
        if table.has_probability_column { "present" } else { "absent" }
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Shared schema handling
// ---------------------------------------------------------------------------

/// Fail with every missing required column named at once.
fn check_columns<'a>(present: impl IntoIterator<Item = &'a str>) -> LoadResult<()> {
    let present: Vec<&str> = present.into_iter().collect();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !present.contains(c))
        .map(|c| c.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(LoadError::MissingColumns { columns: missing })
    }
}

/// Assemble one record from a cell accessor.  `cell` returns `None` for
/// null / absent cells.
fn record_from_cells(
    row: usize,
    cell: impl Fn(&str) -> Option<String>,
) -> LoadResult<CustomerRecord> {
    let text = |column: &str| cell(column).unwrap_or_default();

    let tenure_raw = text("TenureMonths");
    let tenure_months = parse_tenure(&tenure_raw).ok_or_else(|| LoadError::InvalidValue {
        row,
        column: "TenureMonths".to_string(),
        value: tenure_raw.clone(),
    })?;

    let charges_raw = text("MonthlyCharges");
    let monthly_charges = charges_raw
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| LoadError::InvalidValue {
            row,
            column: "MonthlyCharges".to_string(),
            value: charges_raw.clone(),
        })?;

    Ok(CustomerRecord {
        customer_id: text("CustomerID"),
        contract_type: text("ContractType"),
        gender: text("Gender"),
        senior_citizen: text("SeniorCitizen"),
        tenure_months,
        monthly_charges,
        churn: text("Churn"),
        payment_method: text("PaymentMethod"),
        tech_support: text("TechSupport"),
        online_backup: text("OnlineBackup"),
        streaming_tv: text("StreamingTV"),
        device_protection: text("DeviceProtection"),
        churn_probability: cell(PROBABILITY_COLUMN).as_deref().and_then(parse_probability),
    })
}

/// Tenure is integral but spreadsheets often export it as `12.0`.
fn parse_tenure(s: &str) -> Option<u32> {
    let s = s.trim();
    if let Ok(v) = s.parse::<u32>() {
        return Some(v);
    }
    let f = s.parse::<f64>().ok()?;
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64).then_some(f as u32)
}

/// Missing, non-numeric, NaN and out-of-range values all count as missing.
fn parse_probability(s: &str) -> Option<f64> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|p| (0.0..=1.0).contains(p))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> LoadResult<CustomerTable> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: BTreeMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_string(), i))
        .collect();

    check_columns(headers.keys().map(String::as_str))?;
    let has_probability_column = headers.contains_key(PROBABILITY_COLUMN);

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        let rec = record_from_cells(row_no, |column| {
            let idx = *headers.get(column)?;
            let value = record.get(idx)?.trim();
            (!value.is_empty()).then(|| value.to_string())
        })?;
        records.push(rec);
    }

    Ok(CustomerTable::from_records(records, has_probability_column))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file whose columns carry the same names as the CSV layout.
///
/// Works with files written by **Pandas** (`df.to_parquet()`) as well as the
/// bundled `generate_sample` binary.
fn load_parquet(path: &Path) -> LoadResult<CustomerTable> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let schema = builder.schema().clone();
    check_columns(schema.fields().iter().map(|f| f.name().as_str()))?;
    let has_probability_column = schema.index_of(PROBABILITY_COLUMN).is_ok();

    for field in schema.fields() {
        let name = field.name().as_str();
        let used = REQUIRED_COLUMNS.contains(&name) || name == PROBABILITY_COLUMN;
        if used && !is_readable(field.data_type()) {
            return Err(LoadError::UnsupportedColumnType {
                column: name.to_string(),
                data_type: field.data_type().to_string(),
            });
        }
    }

    let reader = builder.build()?;
    let mut records = Vec::new();
    let mut row_offset = 0;

    for batch_result in reader {
        let batch = batch_result?;
        let mut columns: BTreeMap<&str, ArrayRef> = BTreeMap::new();
        for (field, column) in schema.fields().iter().zip(batch.columns()) {
            columns.insert(field.name().as_str(), normalize_column(column)?);
        }

        for row in 0..batch.num_rows() {
            let rec = record_from_cells(row_offset + row, |column| {
                columns.get(column).and_then(|arr| cell_text(arr, row))
            })?;
            records.push(rec);
        }
        row_offset += batch.num_rows();
    }

    Ok(CustomerTable::from_records(records, has_probability_column))
}

// -- Arrow helpers --

/// Cast target for types read through another representation.  Pandas
/// writes `category` columns as dictionaries and small ints as Int8/Int16.
fn cast_target(data_type: &DataType) -> Option<DataType> {
    match data_type {
        DataType::Utf8View => Some(DataType::Utf8),
        DataType::Dictionary(_, value)
            if matches!(
                value.as_ref(),
                DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
            ) =>
        {
            Some(DataType::Utf8)
        }
        DataType::Int8
        | DataType::Int16
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => Some(DataType::Int64),
        _ => None,
    }
}

fn is_readable(data_type: &DataType) -> bool {
    cast_target(data_type).is_some()
        || matches!(
            data_type,
            DataType::Utf8
                | DataType::LargeUtf8
                | DataType::Int32
                | DataType::Int64
                | DataType::Float32
                | DataType::Float64
                | DataType::Boolean
        )
}

fn normalize_column(col: &ArrayRef) -> LoadResult<ArrayRef> {
    match cast_target(col.data_type()) {
        Some(target) => Ok(cast(col, &target)?),
        None => Ok(col.clone()),
    }
}

/// Render a single Arrow cell as text; `None` for nulls and unsupported types.
///
/// Booleans use pandas' CSV spelling (`True` / `False`) so both formats
/// yield the same filter values.
fn cell_text(col: &ArrayRef, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col.as_any().downcast_ref::<StringArray>()?;
            Some(arr.value(row).to_string())
        }
        DataType::LargeUtf8 => Some(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>()?;
            Some(arr.value(row).to_string())
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>()?;
            Some(arr.value(row).to_string())
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<Float32Array>()?;
            Some(arr.value(row).to_string())
        }
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>()?;
            Some(arr.value(row).to_string())
        }
        DataType::Boolean => {
            let arr = col.as_any().downcast_ref::<BooleanArray>()?;
            let text = if arr.value(row) { "True" } else { "False" };
            Some(text.to_string())
        }
        other => {
            log::debug!("Ignoring Parquet column of type {other:?}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{BinaryArray, DictionaryArray};
    use arrow::datatypes::Int32Type;
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    const HEADER: &str = "CustomerID,ContractType,Gender,SeniorCitizen,TenureMonths,MonthlyCharges,Churn,PaymentMethod,TechSupport,OnlineBackup,StreamingTV,DeviceProtection";

    fn csv_file(lines: &[&str]) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    #[test]
    fn test_load_csv_without_probability_column() {
        let file = csv_file(&[
            HEADER,
            "C1,Month-to-Month,Female,0,3,70.5,Yes,Electronic check,No,Yes,No,No",
            "C2,Two year,Male,1,64,20.0,No,Credit card,Yes,Yes,Yes,Yes",
        ]);
        let table = load_file(file.path()).unwrap();

        assert_eq!(table.len(), 2);
        assert!(!table.has_probability_column);
        assert_eq!(table.records[0].customer_id, "C1");
        assert_eq!(table.records[0].tenure_months, 3);
        assert_eq!(table.records[1].monthly_charges, 20.0);
        assert!(table.needs_rescoring());
    }

    #[test]
    fn test_probability_cells_missing_or_invalid() {
        let header = format!("{HEADER},ChurnProbability");
        let file = csv_file(&[
            &header,
            "C1,One year,Female,0,12.0,50,No,Mailed check,No,No,No,No,0.25",
            "C2,One year,Female,0,12,50,No,Mailed check,No,No,No,No,",
            "C3,One year,Female,0,12,50,No,Mailed check,No,No,No,No,1.7",
            "C4,One year,Female,0,12,50,No,Mailed check,No,No,No,No,NaN",
        ]);
        let table = load_file(file.path()).unwrap();

        assert!(table.has_probability_column);
        let probs: Vec<Option<f64>> = table.records.iter().map(|r| r.churn_probability).collect();
        assert_eq!(probs, [Some(0.25), None, None, None]);
        assert_eq!(table.records[0].tenure_months, 12);
    }

    #[test]
    fn test_missing_columns_are_all_reported() {
        let file = csv_file(&[
            "CustomerID,ContractType,Gender,SeniorCitizen,TenureMonths,MonthlyCharges,Churn,PaymentMethod,TechSupport,OnlineBackup",
            "C1,One year,Female,0,12,50,No,Mailed check,No,No",
        ]);
        match load_file(file.path()) {
            Err(LoadError::MissingColumns { columns }) => {
                assert_eq!(columns, ["StreamingTV", "DeviceProtection"]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_numeric_cell() {
        let file = csv_file(&[
            HEADER,
            "C1,One year,Female,0,twelve,50,No,Mailed check,No,No,No,No",
        ]);
        let err = load_file(file.path()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::InvalidValue { row: 0, ref column, .. } if column == "TenureMonths"
        ));
    }

    #[test]
    fn test_missing_file_and_unknown_extension() {
        let err = load_file(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));

        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let err = load_file(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat { ref extension } if extension == "xlsx"));
    }

    #[test]
    fn test_header_only_file_is_an_empty_table() {
        let file = csv_file(&[HEADER]);
        let table = load_file(file.path()).unwrap();
        assert!(table.is_empty());
        assert!(table.values_of(crate::data::model::Dimension::Gender).is_empty());
    }

    /// Two-row Parquet file with caller-supplied Gender and SeniorCitizen columns.
    fn parquet_file(gender: ArrayRef, senior: ArrayRef) -> NamedTempFile {
        let text = |a: &str, b: &str| -> ArrayRef { Arc::new(StringArray::from(vec![a, b])) };
        let columns: Vec<(&str, ArrayRef)> = vec![
            ("CustomerID", text("C1", "C2")),
            ("ContractType", text("Month-to-Month", "Two year")),
            ("Gender", gender),
            ("SeniorCitizen", senior),
            ("TenureMonths", Arc::new(Int64Array::from(vec![3, 64])) as ArrayRef),
            ("MonthlyCharges", Arc::new(Float64Array::from(vec![70.5, 20.0])) as ArrayRef),
            ("Churn", text("Yes", "No")),
            ("PaymentMethod", text("Electronic check", "Credit card")),
            ("TechSupport", text("No", "Yes")),
            ("OnlineBackup", text("Yes", "Yes")),
            ("StreamingTV", text("No", "Yes")),
            ("DeviceProtection", text("No", "Yes")),
        ];
        let batch = RecordBatch::try_from_iter(columns).unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let out = std::fs::File::create(file.path()).unwrap();
        let mut writer = ArrowWriter::try_new(out, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        file
    }

    #[test]
    fn test_parquet_category_and_bool_columns_match_csv() {
        let gender: DictionaryArray<Int32Type> = vec!["Female", "Male"].into_iter().collect();
        let parquet = parquet_file(
            Arc::new(gender),
            Arc::new(BooleanArray::from(vec![true, false])),
        );
        let csv = csv_file(&[
            HEADER,
            "C1,Month-to-Month,Female,True,3,70.5,Yes,Electronic check,No,Yes,No,No",
            "C2,Two year,Male,False,64,20.0,No,Credit card,Yes,Yes,Yes,Yes",
        ]);

        let from_parquet = load_file(parquet.path()).unwrap();
        let from_csv = load_file(csv.path()).unwrap();

        let genders: Vec<&str> = from_parquet.records.iter().map(|r| r.gender.as_str()).collect();
        assert_eq!(genders, ["Female", "Male"]);
        assert_eq!(from_parquet.records, from_csv.records);
        assert_eq!(from_parquet.dimension_values, from_csv.dimension_values);
    }

    #[test]
    fn test_parquet_unreadable_column_type_is_an_error() {
        let gender = BinaryArray::from_vec(vec![b"Female".as_ref(), b"Male".as_ref()]);
        let file = parquet_file(
            Arc::new(gender),
            Arc::new(Int64Array::from(vec![0, 1])),
        );

        match load_file(file.path()) {
            Err(LoadError::UnsupportedColumnType { column, .. }) => assert_eq!(column, "Gender"),
            other => panic!("expected UnsupportedColumnType, got {other:?}"),
        }
    }
}
