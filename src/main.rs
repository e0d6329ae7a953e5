mod app;
mod cli;
mod color;
mod config;
mod data;
mod error;
mod pipeline;
mod report;
mod state;
mod ui;

use anyhow::{Result, anyhow};
use app::DashboardApp;
use clap::Parser;
use cli::Args;
use config::DashboardConfig;
use data::model::CellValue;
use eframe::egui;
use pipeline::Selection;
use state::AppState;

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = DashboardConfig::resolve(&args)?;
    let source = config.file_source();

    // Every dataset must load before anything is shown.
    let data = pipeline::prepare(&source, &config.estate_alignment).map_err(|e| {
        log::error!("{e}");
        anyhow!(e)
    })?;

    let selection = Selection {
        state: args.state.as_deref().map(CellValue::from),
        year: args.year.map(CellValue::from),
        company: args.company.as_deref().map(CellValue::from),
    };

    if args.report {
        let selection = selection.or_first(&data.selector_options()?);
        let view = data.view(&selection)?;
        print!("{}", report::render(&data, &view)?);
        return Ok(());
    }

    let state = AppState::new(Box::new(source), config, data, selection);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Palm Oil Plantation Profitability Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
    .map_err(|e| anyhow!("dashboard window failed: {e}"))
}
