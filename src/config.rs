use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub platform: PlatformConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub workflows: WorkflowsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlatformConfig {
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Deserialize, Clone)]
pub struct AuthConfig {
    pub email: String,
    pub password: String,
    #[serde(default = "default_services")]
    pub services: Vec<String>,
}

// Manual Debug impl to avoid leaking the password
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("services", &self.services)
            .finish()
    }
}

/// Polling and routing parameters for one workflow family.
///
/// `status_path` carries a `{workflow_id}` placeholder; both the
/// per-feature (`/api/annuity/issue_workflow/{workflow_id}`) and the
/// unified (`/api/workflows/{workflow_id}`) server conventions work.
#[derive(Debug, Deserialize, Clone)]
pub struct FamilyConfig {
    pub start_path: String,
    pub status_path: String,
    #[serde(default = "default_issue_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_issue_delay_secs")]
    pub delay_secs: u64,
    #[serde(default)]
    pub deadline_secs: Option<u64>,
    #[serde(default = "default_max_consecutive_transient")]
    pub max_consecutive_transient: u32,
}

impl FamilyConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowsConfig {
    #[serde(default = "default_annuity_issue")]
    pub annuity_issue: FamilyConfig,
    #[serde(default = "default_annuity_settle")]
    pub annuity_settle: FamilyConfig,
    #[serde(default = "default_composed_issue")]
    pub composed_issue: FamilyConfig,
    #[serde(default = "default_composed_swap")]
    pub composed_swap: FamilyConfig,
    #[serde(default = "default_onramp")]
    pub onramp: FamilyConfig,
}

impl Default for WorkflowsConfig {
    fn default() -> Self {
        Self {
            annuity_issue: default_annuity_issue(),
            annuity_settle: default_annuity_settle(),
            composed_issue: default_composed_issue(),
            composed_swap: default_composed_swap(),
            onramp: default_onramp(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_services() -> Vec<String> {
    vec!["payments".to_string()]
}

// Issuance-style workflows span minutes: fewer, slower polls.
fn default_issue_attempts() -> u32 {
    60
}

fn default_issue_delay_secs() -> u64 {
    5
}

// Settlement-style workflows resolve in seconds: more, faster polls.
fn default_settle_attempts() -> u32 {
    120
}

fn default_settle_delay_secs() -> u64 {
    1
}

fn default_max_consecutive_transient() -> u32 {
    10
}

fn issue_family(start_path: &str, status_path: &str) -> FamilyConfig {
    FamilyConfig {
        start_path: start_path.to_string(),
        status_path: status_path.to_string(),
        max_attempts: default_issue_attempts(),
        delay_secs: default_issue_delay_secs(),
        deadline_secs: None,
        max_consecutive_transient: default_max_consecutive_transient(),
    }
}

fn settle_family(start_path: &str, status_path: &str) -> FamilyConfig {
    FamilyConfig {
        max_attempts: default_settle_attempts(),
        delay_secs: default_settle_delay_secs(),
        ..issue_family(start_path, status_path)
    }
}

fn default_annuity_issue() -> FamilyConfig {
    issue_family(
        "/api/annuity/issue_workflow",
        "/api/annuity/issue_workflow/{workflow_id}",
    )
}

fn default_annuity_settle() -> FamilyConfig {
    settle_family(
        "/api/annuity/settle_workflow",
        "/api/annuity/settle_workflow/{workflow_id}",
    )
}

fn default_composed_issue() -> FamilyConfig {
    issue_family(
        "/api/composed/issue_workflow",
        "/api/workflows/{workflow_id}",
    )
}

fn default_composed_swap() -> FamilyConfig {
    settle_family(
        "/api/composed/swap_workflow",
        "/api/workflows/{workflow_id}",
    )
}

fn default_onramp() -> FamilyConfig {
    issue_family("/api/onramp/workflow", "/api/workflows/{workflow_id}")
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Load from file if specified
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            // Try default paths
            builder = builder.add_source(
                config::File::with_name("payflow")
                    .required(false),
            );
        }

        // Environment variable overrides with PAYFLOW_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("PAYFLOW")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.platform.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn minimal_toml() -> &'static str {
        r#"
[platform]
base_url = "https://payments.example.test"

[auth]
email = "ops@example.test"
password = "hunter2"
"#
    }

    #[test]
    fn test_load_from_file_with_defaults() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        file.write_all(minimal_toml().as_bytes()).unwrap();

        let config = AppConfig::load(file.path().to_str()).unwrap();

        assert_eq!(config.platform.base_url, "https://payments.example.test");
        assert_eq!(config.platform.request_timeout_secs, 30);
        assert_eq!(config.auth.services, vec!["payments".to_string()]);

        // Issuance families poll slowly, settlement families poll fast.
        assert_eq!(config.workflows.annuity_issue.max_attempts, 60);
        assert_eq!(config.workflows.annuity_issue.delay_secs, 5);
        assert_eq!(config.workflows.annuity_settle.max_attempts, 120);
        assert_eq!(config.workflows.annuity_settle.delay_secs, 1);
    }

    #[test]
    fn test_family_override() {
        let toml = format!(
            "{}\n[workflows.composed_swap]\nstart_path = \"/api/v2/swaps\"\nstatus_path = \"/api/v2/workflows/{{workflow_id}}\"\nmax_attempts = 10\ndelay_secs = 2\n",
            minimal_toml()
        );
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        file.write_all(toml.as_bytes()).unwrap();

        let config = AppConfig::load(file.path().to_str()).unwrap();
        let swap = &config.workflows.composed_swap;

        assert_eq!(swap.start_path, "/api/v2/swaps");
        assert_eq!(swap.max_attempts, 10);
        assert_eq!(swap.delay(), Duration::from_secs(2));
        // Untouched families keep their defaults
        assert_eq!(config.workflows.onramp.start_path, "/api/onramp/workflow");
    }

    #[test]
    fn test_debug_redacts_password() {
        let auth = AuthConfig {
            email: "ops@example.test".to_string(),
            password: "hunter2".to_string(),
            services: default_services(),
        };
        let debug = format!("{auth:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }
}
