// Main entry point - Dependency injection and poll loop startup
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trend_chain::application::poll_controller::PollController;
use trend_chain::infrastructure::config::load_app_config;
use trend_chain::infrastructure::file_store::FileGenerationStore;
use trend_chain::infrastructure::google_trends::GoogleTrendsClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trend_chain=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let mut app_config = load_app_config()?;
    if app_config.trends.keyword.trim().is_empty() {
        app_config.trends.keyword = prompt_keyword().await?;
    }

    // Create adapters (infrastructure layer)
    let source = Arc::new(GoogleTrendsClient::new(
        app_config.trends.base_url.clone(),
        app_config.trends.language.clone(),
        app_config.trends.timezone_offset,
        app_config.trends.topic_type.clone(),
    )?);
    let store = Arc::new(FileGenerationStore::new(app_config.store.directory.clone()));

    // Create controller (application layer)
    let query = app_config.trends.query();
    let base_name = &app_config.store.base_name;
    let interval = app_config.poll.interval();
    let controller = if app_config.store.resume {
        PollController::resume(source, store, query, base_name, interval).await?
    } else {
        PollController::new(source, store, query, base_name, interval)
    };

    tracing::info!(
        keyword = %app_config.trends.keyword,
        geo = %app_config.trends.geo,
        directory = %app_config.store.directory.display(),
        base_name = %base_name,
        interval_secs = interval.as_secs(),
        "Starting trend calibration chain"
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    };

    if let Err(e) = controller.run(shutdown).await {
        tracing::error!(error = %e, "Calibration chain stopped");
        return Err(e.into());
    }

    Ok(())
}

async fn prompt_keyword() -> anyhow::Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(b"Type the keyword you are interested in : ")
        .await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;

    let keyword = line.trim().to_string();
    if keyword.is_empty() {
        anyhow::bail!("no keyword configured or entered");
    }
    Ok(keyword)
}
