use anyhow::Context as _;
use clap::Parser as _;
use stelae_manifest_edge::config::Cli;
use stelae_manifest_edge::{EdgeContext, logging, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Cli::parse().into_config().context("load configuration")?;
    logging::init(&cfg.log_level, cfg.log_format).context("init logging")?;

    let ctx = EdgeContext::from_config(&cfg).context("build edge context")?;
    tracing::info!(
        bind = %cfg.bind,
        origin = cfg.origin_url.as_deref().unwrap_or_default(),
        store = ctx.store.kind(),
        manifest_key = %cfg.manifest_key,
        "starting manifest edge"
    );

    let listener = tokio::net::TcpListener::bind(cfg.bind)
        .await
        .with_context(|| format!("bind {}", cfg.bind))?;
    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;

    tracing::info!("manifest edge stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
