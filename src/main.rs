use slack_gateway::app;
use slack_gateway::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Initialize configuration
    let config = Config::load(".env")?;

    // Build the application
    let app = app::compose(&config).await;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    // Log startup information
    config.log_startup_info();

    axum::serve(listener, app).await?;

    Ok(())
}
