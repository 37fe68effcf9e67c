use actix_web::{App, HttpServer, web};
use merkle_distributor::config::Config;
use merkle_distributor::{AppState, configure};
use tracing_subscriber::filter::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();

    tracing::info!(
        "Loading allocations from {} (transfer failure policy: {:?})",
        config.allocations_path.display(),
        config.transfer_failure_policy
    );

    let state = AppState::from_config(&config).map_err(|e| {
        tracing::error!("Failed to start distribution: {}", e);
        std::io::Error::other(e)
    })?;
    let state = web::Data::new(state);

    tracing::info!("Starting merkle-distributor on port {}", config.port);

    HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind(("0.0.0.0", config.port))?
        .run()
        .await
}
