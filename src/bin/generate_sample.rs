use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use churn_dashboard::{ChurnScorer, CustomerRecord, HeuristicScorer};
use clap::Parser;
use parquet::arrow::ArrowWriter;

/// Write a deterministic synthetic customer table for trying the dashboard
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Output file; .csv or .parquet
    #[arg(default_value = "ChurnSpreadsheet.csv")]
    output: PathBuf,

    /// Number of customers
    #[arg(short, long, default_value = "1000")]
    rows: usize,

    /// PRNG seed
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Include a ChurnProbability column
    #[arg(long)]
    with_probability: bool,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

const CONTRACTS: [&str; 3] = ["Month-to-Month", "One year", "Two year"];
const GENDERS: [&str; 2] = ["Female", "Male"];
const PAYMENTS: [&str; 4] = [
    "Electronic check",
    "Mailed check",
    "Bank transfer (automatic)",
    "Credit card (automatic)",
];

fn yes_no(rng: &mut SimpleRng, p_yes: f64) -> String {
    let answer = if rng.chance(p_yes) { "Yes" } else { "No" };
    answer.to_string()
}

fn generate_customer(rng: &mut SimpleRng, id: usize, scorer: &HeuristicScorer) -> CustomerRecord {
    let contract = rng.pick(&CONTRACTS);
    let max_tenure = match contract {
        "Month-to-Month" => 36.0,
        "One year" => 60.0,
        _ => 72.0,
    };
    let tenure_months = (rng.next_f64() * max_tenure).round() as u32;
    let monthly_charges = ((18.0 + rng.next_f64() * 100.0) * 100.0).round() / 100.0;

    let mut rec = CustomerRecord {
        customer_id: format!("CUST-{id:05}"),
        contract_type: contract.to_string(),
        gender: rng.pick(&GENDERS).to_string(),
        senior_citizen: if rng.chance(0.16) { "1" } else { "0" }.to_string(),
        tenure_months,
        monthly_charges,
        churn: String::new(),
        payment_method: rng.pick(&PAYMENTS).to_string(),
        tech_support: yes_no(rng, 0.3),
        online_backup: yes_no(rng, 0.35),
        streaming_tv: yes_no(rng, 0.4),
        device_protection: yes_no(rng, 0.35),
        churn_probability: None,
    };

    // Churn outcome loosely follows the heuristic so the charts show a signal.
    let risk = scorer.score(&rec);
    rec.churn = yes_no(rng, 0.05 + risk * 0.8);
    rec.churn_probability = Some((risk * 0.9 + rng.next_f64() * 0.1).min(1.0));
    rec
}

fn write_csv(path: &Path, customers: &[CustomerRecord], with_probability: bool) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    if with_probability {
        for c in customers {
            writer.serialize(c).context("writing CSV row")?;
        }
    } else {
        writer.write_record(churn_dashboard::data::loader::REQUIRED_COLUMNS)?;
        for c in customers {
            let tenure = c.tenure_months.to_string();
            let charges = c.monthly_charges.to_string();
            writer.write_record([
                c.customer_id.as_str(),
                c.contract_type.as_str(),
                c.gender.as_str(),
                c.senior_citizen.as_str(),
                tenure.as_str(),
                charges.as_str(),
                c.churn.as_str(),
                c.payment_method.as_str(),
                c.tech_support.as_str(),
                c.online_backup.as_str(),
                c.streaming_tv.as_str(),
                c.device_protection.as_str(),
            ])?;
        }
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

fn write_parquet(path: &Path, customers: &[CustomerRecord], with_probability: bool) -> Result<()> {
    let text = |f: fn(&CustomerRecord) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(customers.iter().map(f).collect::<Vec<_>>()))
    };

    let mut fields = vec![
        Field::new("CustomerID", DataType::Utf8, false),
        Field::new("ContractType", DataType::Utf8, false),
        Field::new("Gender", DataType::Utf8, false),
        Field::new("SeniorCitizen", DataType::Utf8, false),
        Field::new("TenureMonths", DataType::Int64, false),
        Field::new("MonthlyCharges", DataType::Float64, false),
        Field::new("Churn", DataType::Utf8, false),
        Field::new("PaymentMethod", DataType::Utf8, false),
        Field::new("TechSupport", DataType::Utf8, false),
        Field::new("OnlineBackup", DataType::Utf8, false),
        Field::new("StreamingTV", DataType::Utf8, false),
        Field::new("DeviceProtection", DataType::Utf8, false),
    ];
    let mut columns: Vec<ArrayRef> = vec![
        text(|c| c.customer_id.as_str()),
        text(|c| c.contract_type.as_str()),
        text(|c| c.gender.as_str()),
        text(|c| c.senior_citizen.as_str()),
        Arc::new(Int64Array::from(
            customers.iter().map(|c| c.tenure_months as i64).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            customers.iter().map(|c| c.monthly_charges).collect::<Vec<_>>(),
        )),
        text(|c| c.churn.as_str()),
        text(|c| c.payment_method.as_str()),
        text(|c| c.tech_support.as_str()),
        text(|c| c.online_backup.as_str()),
        text(|c| c.streaming_tv.as_str()),
        text(|c| c.device_protection.as_str()),
    ];
    if with_probability {
        fields.push(Field::new("ChurnProbability", DataType::Float64, true));
        columns.push(Arc::new(Float64Array::from(
            customers.iter().map(|c| c.churn_probability).collect::<Vec<_>>(),
        )));
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating Parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing Parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut rng = SimpleRng::new(args.seed);
    let scorer = HeuristicScorer::default();
    let customers: Vec<CustomerRecord> = (0..args.rows)
        .map(|i| generate_customer(&mut rng, i + 1, &scorer))
        .collect();

    let ext = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "csv" => write_csv(&args.output, &customers, args.with_probability)?,
        "parquet" | "pq" => write_parquet(&args.output, &customers, args.with_probability)?,
        other => bail!("Unsupported output extension: .{other}"),
    }

    log::info!("Wrote {} customers to {}", customers.len(), args.output.display());
    println!("Wrote {} customers to {}", customers.len(), args.output.display());
    Ok(())
}
