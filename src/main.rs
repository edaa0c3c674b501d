use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tracing::info;
use workbook_migrator::app::MigratorApp;
use workbook_migrator::{headless, logging, Config};

fn main() -> Result<()> {
    logging::init();

    let config = Config::load()?;

    // A path argument uploads that file without opening a window.
    if let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) {
        let saved = headless::run(config, &path)?;
        info!("Download ready: {}", saved.display());
        return Ok(());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([560.0, 460.0])
            .with_min_inner_size([400.0, 360.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Workbook Migrator",
        options,
        Box::new(move |cc| Box::new(MigratorApp::new(cc, config))),
    )
    .map_err(|e| anyhow!("failed to start the UI: {}", e))
}
