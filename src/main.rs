//! Status Proxy Binary

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use status_proxy::server::{AppState, configure_routes};
use status_proxy::{Config, IncidentFetcher, MetricSource, PrometheusClient, ServiceRegistry};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    initialize_tracing();

    info!("Starting status proxy v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env();

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    info!(
        "Proxy configuration - Port: {}, Prometheus: {}, Services file: {}",
        config.port, config.prometheus_url, config.services_config_path
    );

    // Load the service registry once; it is read-only for the process lifetime
    let registry = match ServiceRegistry::from_yaml_file(&config.services_config_path) {
        Ok(registry) => registry,
        Err(e) => {
            error!(
                "Failed to load service configuration from {}: {}",
                config.services_config_path, e
            );
            std::process::exit(1);
        }
    };

    if registry.is_empty() {
        warn!("No services were loaded from the configuration file, every service request will answer 404");
    }
    for definition in registry.iter() {
        info!(
            "Registered service {} ({}) - metric: {}, labels: {}",
            definition.service_id,
            definition.display_name,
            definition.metric_name,
            definition.job_label
        );
    }

    let metrics: Arc<dyn MetricSource> =
        match PrometheusClient::new(config.prometheus_url.clone(), config.http_timeout) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                error!("Failed to build the Prometheus client: {}", e);
                std::process::exit(1);
            }
        };

    let incidents = match IncidentFetcher::new(
        config.github_repo.clone(),
        config.github_token.clone(),
        config.incident_label.clone(),
        config.incident_limit,
        config.http_timeout,
    ) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            error!("Failed to build the incident fetcher: {}", e);
            std::process::exit(1);
        }
    };

    let state = web::Data::new(AppState {
        registry,
        metrics,
        incidents,
    });
    let allowed_origin = config.allowed_origin.clone();

    info!("Status proxy listening on http://0.0.0.0:{}", config.port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&allowed_origin)
            .allowed_methods(vec!["GET"])
            .max_age(3600);

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure_routes)
    })
    .bind(("0.0.0.0", config.port))?
    .run()
    .await
}

/// Initialize structured logging
fn initialize_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .json();

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))
        .unwrap();

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
