//! Process configuration for the status proxy

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP API binds on
    pub port: u16,

    /// Base URL of the Prometheus instance queried for health metrics
    pub prometheus_url: String,

    /// Path to the YAML service definitions file
    pub services_config_path: String,

    /// Origin allowed to call the API from a browser
    pub allowed_origin: String,

    /// `owner/repo` whose labelled issues become incidents
    pub github_repo: Option<String>,

    /// Token for authenticated GitHub API calls
    pub github_token: Option<String>,

    /// Label that marks an issue as an incident
    pub incident_label: String,

    /// Maximum number of incidents returned
    pub incident_limit: u32,

    /// Timeout for outbound HTTP calls
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            prometheus_url: "http://127.0.0.1:9090".to_string(),
            services_config_path: "proxy-services-config.yaml".to_string(),
            allowed_origin: "http://localhost:8080".to_string(),
            github_repo: None,
            github_token: None,
            incident_label: "incident".to_string(),
            incident_limit: 20,
            http_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(port) = env::var("PROXY_PORT") {
            if let Ok(port) = port.parse() {
                config.port = port;
            }
        }

        if let Ok(prometheus_url) = env::var("PROMETHEUS_URL") {
            config.prometheus_url = prometheus_url;
        }

        if let Ok(path) = env::var("SERVICES_CONFIG_PATH") {
            config.services_config_path = path;
        }

        if let Ok(allowed_origin) = env::var("ALLOWED_ORIGIN") {
            config.allowed_origin = allowed_origin;
        }

        if let Ok(github_repo) = env::var("GITHUB_REPO") {
            if !github_repo.is_empty() {
                config.github_repo = Some(github_repo);
            }
        }

        if let Ok(github_token) = env::var("GITHUB_TOKEN") {
            if !github_token.is_empty() {
                config.github_token = Some(github_token);
            }
        }

        if let Ok(incident_label) = env::var("INCIDENT_LABEL") {
            config.incident_label = incident_label;
        }

        if let Ok(incident_limit) = env::var("INCIDENT_LIMIT") {
            if let Ok(limit) = incident_limit.parse() {
                config.incident_limit = limit;
            }
        }

        if let Ok(timeout) = env::var("HTTP_TIMEOUT_SECONDS") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                config.http_timeout = Duration::from_secs(seconds);
            }
        }

        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.prometheus_url.is_empty() {
            return Err("prometheus_url cannot be empty".to_string());
        }

        if self.services_config_path.is_empty() {
            return Err("services_config_path cannot be empty".to_string());
        }

        if self.allowed_origin.is_empty() {
            return Err("allowed_origin cannot be empty".to_string());
        }

        if self.incident_limit == 0 {
            return Err("incident_limit must be greater than 0".to_string());
        }

        if let Some(repo) = &self.github_repo {
            let mut parts = repo.split('/');
            let owner = parts.next().unwrap_or_default();
            let name = parts.next().unwrap_or_default();
            if owner.is_empty() || name.is_empty() || parts.next().is_some() {
                return Err(format!(
                    "github_repo must be of the form owner/repo, got '{}'",
                    repo
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();

        assert_eq!(config.port, 3000);
        assert_eq!(config.prometheus_url, "http://127.0.0.1:9090");
        assert_eq!(config.incident_limit, 20);
        assert!(config.github_repo.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_prometheus_url_is_invalid() {
        let config = Config {
            prometheus_url: String::new(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_incident_limit_is_invalid() {
        let config = Config {
            incident_limit: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_github_repo_shape_is_checked() {
        let good = Config {
            github_repo: Some("acme/status".to_string()),
            ..Config::default()
        };
        assert!(good.validate().is_ok());

        for bad in ["acme", "acme/", "/status", "acme/status/extra"] {
            let config = Config {
                github_repo: Some(bad.to_string()),
                ..Config::default()
            };
            assert!(config.validate().is_err(), "expected '{}' to be rejected", bad);
        }
    }
}
