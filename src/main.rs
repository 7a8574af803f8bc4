mod app;
mod color;
mod ui;

use std::path::PathBuf;

use anyhow::Context;
use app::SalesDashApp;
use clap::Parser;
use eframe::egui;
use sales_dash::config::DashboardConfig;
use sales_dash::state::AppState;

/// Sales analytics dashboard.
#[derive(Debug, Parser)]
#[command(name = "sales-dash", version, about)]
struct Cli {
    /// Sales table to open (csv, tsv, json or parquet); overrides the config.
    data: Option<PathBuf>,

    /// Configuration file (TOML).
    #[arg(short, long, env = "SALES_DASH_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config =
        DashboardConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(path) = cli.data {
        config.data_path = path;
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window.width, config.window.height])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    let mut state = AppState::new(config);
    let data_path = state.config.data_path.clone();
    // A failed load is shown in the status line; File → Open… still works.
    let _ = state.open(&data_path);

    eframe::run_native(
        "Sales Analytics Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(SalesDashApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("running the dashboard window: {e}"))
}
