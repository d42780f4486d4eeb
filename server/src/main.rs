use anyhow::Result;
use site::{Analytics, SiteConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::var("SITE_CONFIG").unwrap_or_else(|_| "site.toml".to_string());
    let config = SiteConfig::from_file(&config_path)?;

    let analytics = Analytics::from_env();
    if analytics.is_none() {
        tracing::info!("GA_TRACKING_ID not set, pageview tagging disabled");
    }

    let app = site::app(&config, analytics);

    tracing::info!(
        title = %config.site.title,
        author = %config.site.author,
        addr = %config.server.addr,
        "serving site"
    );
    let listener = tokio::net::TcpListener::bind(&config.server.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
