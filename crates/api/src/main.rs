use anyhow::Context;

use petclinic_infra::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    petclinic_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let services = petclinic_api::app::services::build_services(&config).await?;
    let app = petclinic_api::app::build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await.context("server terminated")?;
    Ok(())
}
