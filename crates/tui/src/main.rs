mod app;

use anyhow::Result;
use std::fs::{self, OpenOptions};

use tracing_subscriber::{prelude::*, EnvFilter};

use armytui_core::{
    catalog::CatalogLoader,
    config::{self, AppConfig},
    prefs::PrefsStore,
    save::PlanManager,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;

    let catalog = CatalogLoader::new(config.data_dir.clone());
    let prefs_store = PrefsStore::new(PrefsStore::default_path());
    let plan_manager = PlanManager::new(config.saves_dir.clone());

    let startup_input = std::env::args().nth(1);

    let mut app = app::PlannerApp::new(config, catalog, prefs_store, plan_manager);
    if let Some(input) = startup_input {
        app.import_input(&input);
    }
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("armytui.log");

    let env_filter = EnvFilter::from_default_env();

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
