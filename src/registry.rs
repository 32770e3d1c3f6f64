//! Read-only service registry loaded from the YAML configuration file

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::errors::Result;
use crate::health::HealthCondition;

/// Monitoring definition for a single service, loaded once at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDefinition {
    /// Unique identifier used in request paths
    pub service_id: String,

    /// Name shown on the dashboard
    pub display_name: String,

    /// Metric queried for this service
    pub metric_name: String,

    /// Label selector narrowing the metric, e.g. `job="solana"`
    pub job_label: String,

    /// Condition a sample must satisfy to count as healthy, e.g. `"> 0"`
    pub health_condition: String,
}

impl ServiceDefinition {
    /// PromQL selector for the instantaneous value.
    pub fn instant_expression(&self) -> String {
        format!("{}{{{}}}", self.metric_name, self.job_label)
    }

    /// PromQL expression for the daily-averaged historical series.
    pub fn range_expression(&self) -> String {
        format!("avg_over_time({}{{{}}}[1d])", self.metric_name, self.job_label)
    }

    fn has_required_fields(&self) -> bool {
        !self.service_id.is_empty()
            && !self.display_name.is_empty()
            && !self.metric_name.is_empty()
            && !self.job_label.is_empty()
            && !self.health_condition.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct ServicesFile {
    services: Vec<serde_yaml::Value>,
}

/// Immutable service-id to definition table, shared read-only by all handlers.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: HashMap<String, ServiceDefinition>,
}

impl ServiceRegistry {
    /// Load the registry from a YAML file shaped as a top-level `services` list.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    /// Build the registry from YAML contents.
    ///
    /// Entries that do not deserialize or miss required fields are skipped
    /// with a warning so one bad entry never takes the rest of the fleet
    /// offline. A file without a `services` list is an error.
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let file: ServicesFile = serde_yaml::from_str(contents)?;

        let mut services = HashMap::new();
        for entry in file.services {
            match serde_yaml::from_value::<ServiceDefinition>(entry) {
                Ok(definition) if definition.has_required_fields() => {
                    if HealthCondition::parse(&definition.health_condition).is_none() {
                        warn!(
                            "Service '{}' has health condition '{}' that will never evaluate as healthy",
                            definition.service_id, definition.health_condition
                        );
                    }
                    let service_id = definition.service_id.clone();
                    if services.insert(service_id.clone(), definition).is_some() {
                        warn!(
                            "Duplicate service id '{}' in config, keeping the last entry",
                            service_id
                        );
                    }
                }
                Ok(definition) => {
                    warn!(
                        "Skipping service entry '{}' with empty required fields",
                        definition.service_id
                    );
                }
                Err(e) => {
                    warn!("Skipping invalid service entry in YAML config: {}", e);
                }
            }
        }

        Ok(Self { services })
    }

    /// Look up a service by its identifier.
    pub fn get(&self, service_id: &str) -> Option<&ServiceDefinition> {
        self.services.get(service_id)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Iterate over all definitions, for startup logging.
    pub fn iter(&self) -> impl Iterator<Item = &ServiceDefinition> {
        self.services.values()
    }
}
