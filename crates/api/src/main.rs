use anyhow::Context;

use scrapyard_api::app::{build_app, build_services};
use scrapyard_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    scrapyard_observability::tracing::init(config.log_format);

    let services = build_services(config.database.as_ref())
        .await
        .context("failed to initialise storage")?;
    tracing::info!(backend = services.backend(), "storage ready");

    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
