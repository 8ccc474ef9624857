use std::sync::Arc;

use feature_switch::config::Config;
use feature_switch::evaluation::Switchboard;
use feature_switch::providers::{FeatureSwitchProvider, InMemoryProvider, PostgresProvider};
use feature_switch::routes;
use feature_switch::state::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let provider: Arc<dyn FeatureSwitchProvider> = match &config.database_url {
        Some(url) => {
            let provider = PostgresProvider::connect(url).await?;
            provider.migrate().await?;
            tracing::info!("storing switches in postgres");
            Arc::new(provider)
        }
        None => {
            tracing::info!("DATABASE_URL not set, storing switches in memory");
            Arc::new(InMemoryProvider::new())
        }
    };

    let switchboard = Switchboard::new(provider);
    switchboard.initialise(&config.switches).await?;

    let state = AppState {
        switchboard,
        cookies: config.cookie_settings(),
    };

    let app = routes::routes().with_state(state);

    let listener = tokio::net::TcpListener::bind(config.addr()).await?;

    tracing::info!(
        addr = %config.addr(),
        switches = config.switches.len(),
        "feature switch service listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
