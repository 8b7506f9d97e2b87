use mock_server::MockConfig;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "8095".to_string());
    let defaults = MockConfig::default();
    let config = MockConfig {
        application: std::env::var("CROWD_APPLICATION").unwrap_or(defaults.application),
        password: std::env::var("CROWD_PASSWORD").unwrap_or(defaults.password),
    };

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, application = %config.application, "mock crowd listening");
    mock_server::run_with(listener, config).await
}
