mod app;
mod color;
mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result};
use app::ChurnDashboardApp;
use churn_dashboard::{Dashboard, DashboardConfig};
use clap::Parser;
use eframe::egui;

/// Interactive customer churn dashboard
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Customer table (.csv or .parquet); overrides the config file
    data: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of top at-risk customers to list (5-20)
    #[arg(short = 'n', long)]
    top_n: Option<usize>,

    /// Print the default-filter snapshot as JSON instead of opening a window
    #[arg(long)]
    summary: bool,
}

impl Args {
    fn into_config(self) -> Result<DashboardConfig> {
        let mut config = match &self.config {
            Some(path) => DashboardConfig::from_file(path)?,
            None => DashboardConfig::default(),
        };
        if let Some(data) = self.data {
            config.data_path = data;
        }
        if let Some(n) = self.top_n {
            config.top_n = n;
        }
        Ok(config.normalized())
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let summary = args.summary;
    let config = args.into_config()?;

    let mut dashboard = Dashboard::new(&config);

    if summary {
        dashboard
            .reload()
            .with_context(|| format!("loading {}", config.data_path.display()))?;
        let snapshot = dashboard.snapshot.as_ref().context("no snapshot computed")?;
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }

    if let Err(e) = dashboard.reload() {
        log::debug!("Starting without data, status line shows: {e}");
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Customer Churn Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(ChurnDashboardApp::new(dashboard)))),
    )
    .map_err(|e| anyhow::anyhow!("running UI: {e}"))
}
