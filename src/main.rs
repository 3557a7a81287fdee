//! Energy Dashboard - Electricity demand and supply-mix charts
//!
//! A Rust application that loads energy-statistics CSV files and displays them as
//! interactive time-series charts.

mod charts;
mod config;
mod data;
mod gui;
mod view;

use anyhow::Context;
use config::DashboardConfig;
use eframe::egui;
use gui::DashboardApp;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let config = DashboardConfig::load().context("Failed to load dashboard configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();
    info!(data_dir = %config.data_dir.display(), "starting energy dashboard");

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1000.0, 700.0])
            .with_title("Energy Dashboard"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Energy Dashboard",
        options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run dashboard window: {e}"))
}
