//! JSON wire types served to the status dashboard

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::history::{
    DailyPoint, DayHealth, DayStatus, classify_day, downtime_minutes, scale_ratio,
};
use crate::incidents::Incident;

/// Current health verdict for a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Operational,
    Outage,
    Unknown,
}

/// Instantaneous status of a single service.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub service_id: String,
    pub status: ServiceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_checked: DateTime<Utc>,
}

/// Gap-filled history of a service plus its derived uptime.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub service_id: String,
    pub historical_data: Vec<HistoryPoint>,
    /// Formatted percentage, `"N/A"` when no day carries data
    pub overall_uptime: String,
}

/// One calendar day on the wire.
///
/// Keeps the `{timestamp, uptimeRatio, hasData}` shape the dashboard expects;
/// `status` and `downtimeMinutes` are derived server-side so the scale rule
/// lives in one place.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub timestamp: i64,
    pub uptime_ratio: f64,
    pub has_data: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DayStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downtime_minutes: Option<i64>,
}

impl From<DailyPoint> for HistoryPoint {
    fn from(point: DailyPoint) -> Self {
        match point.health {
            DayHealth::Real(value) => Self {
                timestamp: point.timestamp,
                uptime_ratio: value,
                has_data: true,
                status: Some(classify_day(value)),
                downtime_minutes: Some(downtime_minutes(scale_ratio(value))),
            },
            DayHealth::Missing => Self {
                timestamp: point.timestamp,
                uptime_ratio: 0.0,
                has_data: false,
                status: None,
                downtime_minutes: None,
            },
        }
    }
}

/// Incident list for the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct IncidentsResponse {
    pub incidents: Vec<Incident>,
}

/// Error body for client-facing failures.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn service_not_found() -> Self {
        Self {
            error: "Service not found or not configured in proxy".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}
