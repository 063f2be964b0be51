mod application;
mod domain;
mod infrastructure;
mod presentation;
#[cfg(test)]
mod test_support;

use tracing::{error, info};

use crate::infrastructure::{AppConfig, AppContainer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env();
    info!(
        "Starting {} {} on {}:{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.server.host,
        config.server.port
    );

    let container = AppContainer::new(config)?;
    let server = container.http_server();

    if let Err(e) = server.run().await {
        error!("Server error: {}", e);
        return Err(e);
    }

    match container.collection.count().await {
        Ok(entries) => info!(
            "Dropping collection '{}' with {} entries",
            container.collection.name(),
            entries
        ),
        Err(e) => error!("Failed to count collection entries: {}", e),
    }

    Ok(())
}
