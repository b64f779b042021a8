//! Run command - build the pipeline and supervise it

use anyhow::{Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use vigil_config::Config;
use vigil_pipeline::PipelineBuilder;

use super::registry;

pub async fn run(config: Config) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        stages = config.pipeline.len(),
        "vigil starting"
    );

    let registry = registry();
    let cancel = CancellationToken::new();

    // Nothing runs unless every stage resolves, binds and initializes
    let pipeline = PipelineBuilder::new(&registry)
        .with_default_capacity(config.global.channel_capacity)
        .with_cancel_token(cancel.clone())
        .build(&config.pipeline)
        .await
        .context("failed to build pipeline")?;

    info!(
        stages = ?pipeline.stage_names(),
        channels = pipeline.channel_count(),
        "pipeline running"
    );

    let signals = tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received, stopping sources");
        cancel.cancel();
    });

    let result = pipeline.wait().await;
    signals.abort();

    if let Err(e) = result {
        error!(error = %e, "pipeline failed");
        return Err(e).context("pipeline failed");
    }

    info!("vigil shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
