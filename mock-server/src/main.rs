use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;

    let state = match std::env::var("API_TOKEN") {
        Ok(token) => mock_server::MockState::new().with_token(token),
        Err(_) => mock_server::MockState::new(),
    };
    info!("listening on {addr}");
    mock_server::serve(listener, state).await
}
