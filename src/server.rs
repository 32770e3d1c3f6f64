//! HTTP endpoint layer composing the registry, evaluator and adapters

use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::health;
use crate::history::{self, Window};
use crate::incidents::IncidentFetcher;
use crate::models::{
    ErrorResponse, HealthResponse, HistoryPoint, HistoryResponse, IncidentsResponse,
    ServiceStatus, StatusResponse,
};
use crate::prometheus::MetricSource;
use crate::registry::ServiceRegistry;

/// Shared read-only state handed to every handler.
pub struct AppState {
    pub registry: ServiceRegistry,
    pub metrics: Arc<dyn MetricSource>,
    pub incidents: IncidentFetcher,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub range: Option<String>,
}

/// `GET /api/status/{serviceId}` - instantaneous health of one service.
pub async fn get_status(
    data: web::Data<AppState>,
    service_id: web::Path<String>,
) -> impl Responder {
    let service_id = service_id.into_inner();
    let Some(definition) = data.registry.get(&service_id) else {
        return HttpResponse::NotFound().json(ErrorResponse::service_not_found());
    };

    info!(
        "Request for current status of service {} ({})",
        service_id, definition.display_name
    );

    let results = data
        .metrics
        .instant_query(&definition.instant_expression())
        .await;

    let response = match results.first() {
        Some(result) => {
            let healthy = health::evaluate(&result.sample.value, &definition.health_condition);
            StatusResponse {
                service_id,
                status: if healthy {
                    ServiceStatus::Operational
                } else {
                    ServiceStatus::Outage
                },
                current_value: Some(result.sample.value.clone()),
                health_condition: Some(definition.health_condition.clone()),
                message: None,
                last_checked: Utc::now(),
            }
        }
        None => {
            warn!("No current status data for {} from the metric source", service_id);
            StatusResponse {
                service_id,
                status: ServiceStatus::Unknown,
                current_value: None,
                health_condition: None,
                message: Some("No data from the metric source or malformed result.".to_string()),
                last_checked: Utc::now(),
            }
        }
    };

    HttpResponse::Ok().json(response)
}

/// `GET /api/history/{serviceId}?range={7d|15d|30d}` - gap-filled daily history.
pub async fn get_history(
    data: web::Data<AppState>,
    service_id: web::Path<String>,
    params: web::Query<HistoryParams>,
) -> impl Responder {
    let service_id = service_id.into_inner();
    let Some(definition) = data.registry.get(&service_id) else {
        return HttpResponse::NotFound().json(ErrorResponse::service_not_found());
    };

    let window = Window::from_range_param(params.range.as_deref().unwrap_or("30d"));
    info!(
        "Request for history of service {} ({}), window {} days",
        service_id,
        definition.display_name,
        window.days()
    );

    let now = Utc::now();
    let results = data
        .metrics
        .range_query(&definition.range_expression(), window.start(now), now, "1d")
        .await;

    let samples = results
        .into_iter()
        .next()
        .map(|result| result.samples)
        .unwrap_or_default();
    if samples.is_empty() {
        warn!("No historical data for {} from the metric source", service_id);
    }

    let (points, summary) = history::normalize(samples, window, now);

    HttpResponse::Ok().json(HistoryResponse {
        service_id,
        historical_data: points.into_iter().map(HistoryPoint::from).collect(),
        overall_uptime: summary.to_string(),
    })
}

/// `GET /api/incidents` - incident list from the issue tracker.
pub async fn get_incidents(data: web::Data<AppState>) -> impl Responder {
    info!("Request for incident list");
    let incidents = data.incidents.fetch_incidents().await;

    HttpResponse::Ok().json(IncidentsResponse { incidents })
}

/// `GET /health` - liveness probe.
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "OK".to_string(),
    })
}

/// Mount all routes on an actix `App`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check)).service(
        web::scope("/api")
            .route("/status/{serviceId}", web::get().to(get_status))
            .route("/history/{serviceId}", web::get().to(get_history))
            .route("/incidents", web::get().to(get_incidents)),
    );
}
