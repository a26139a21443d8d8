mod bootstrap;

use anyhow::Result;
use lunchtrain_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use lunchtrain_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Config and logging come up before anything else touches the runtime.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let mut app = bootstrap::bootstrap_with_config(config)?;

    app.refresher.start();
    app.scheduler.start();

    tracing::info!(
        event_name = "system.server.started",
        channel = %app.config.slack.channel_id,
        weekdays = ?app.config.schedule.weekdays.names(),
        "lunchtrain started"
    );

    wait_for_shutdown().await?;

    tracing::info!(event_name = "system.server.stopping", "lunchtrain stopping");
    app.scheduler.stop().await;
    app.refresher.stop().await;

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
