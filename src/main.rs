use chatkit_server::{api, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chatkit_server=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        model = %config.default_model,
        "Starting chatkit server"
    );

    api::serve(config).await
}
