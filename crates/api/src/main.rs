use anyhow::Context;

use gobot_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    gobot_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let (app, services) = gobot_api::app::build_app(&config)
        .await
        .context("failed to build services")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await
        .context("server error")?;

    services.shutdown().await;
    Ok(())
}
