use shared::models::ReleasePolicy;
use std::path::PathBuf;

/// Floor core configuration
///
/// # Environment variables
///
/// Every field can be overridden from the environment:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/floor | working directory (database, logs) |
/// | DATABASE_PATH | {WORK_DIR}/floor.redb | store file |
/// | ENVIRONMENT | development | runtime environment |
/// | LOG_LEVEL | info | tracing filter when RUST_LOG is unset |
/// | LOG_JSON | false | JSON log lines |
/// | LOG_DIR | unset | daily rolling log files when set |
/// | TABLE_RELEASE_POLICY | available | `available` or `cleaning` |
/// | ORDER_SLA_MINUTES | 45 | dine-in order age before alerting |
/// | TAKEAWAY_SLA_MINUTES | 45 | takeaway order age before alerting |
/// | EXPIRY_WARNING_DAYS | 7 | expiry warning window |
/// | ALERT_POLL_INTERVAL_SECS | 60 | alert worker tick |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/floor TABLE_RELEASE_POLICY=cleaning cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub database_path: Option<String>,
    /// development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    pub policy: FloorPolicy,
    pub alert_poll_interval_secs: u64,
}

/// Business rules the operator may tune
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloorPolicy {
    /// Status a table takes when its order closes
    pub release_policy: ReleasePolicy,
    pub order_sla_minutes: i64,
    pub takeaway_sla_minutes: i64,
    pub expiry_warning_days: i64,
}

impl Default for FloorPolicy {
    fn default() -> Self {
        Self {
            release_policy: ReleasePolicy::Available,
            order_sla_minutes: 45,
            takeaway_sla_minutes: 45,
            expiry_warning_days: 7,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables fall back to defaults.
    pub fn from_env() -> Self {
        let defaults = FloorPolicy::default();
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/floor".into()),
            database_path: std::env::var("DATABASE_PATH").ok(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_parse("LOG_JSON").unwrap_or(false),
            log_dir: std::env::var("LOG_DIR").ok(),
            policy: FloorPolicy {
                release_policy: env_parse("TABLE_RELEASE_POLICY")
                    .unwrap_or(defaults.release_policy),
                order_sla_minutes: env_parse("ORDER_SLA_MINUTES")
                    .unwrap_or(defaults.order_sla_minutes),
                takeaway_sla_minutes: env_parse("TAKEAWAY_SLA_MINUTES")
                    .unwrap_or(defaults.takeaway_sla_minutes),
                expiry_warning_days: env_parse("EXPIRY_WARNING_DAYS")
                    .unwrap_or(defaults.expiry_warning_days),
            },
            alert_poll_interval_secs: env_parse("ALERT_POLL_INTERVAL_SECS").unwrap_or(60),
        }
    }

    /// Override part of the configuration
    ///
    /// Mostly used by tests
    pub fn with_overrides(work_dir: impl Into<String>, release_policy: ReleasePolicy) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.database_path = None;
        config.policy.release_policy = release_policy;
        config
    }

    /// Store file, `{work_dir}/floor.redb` unless DATABASE_PATH is set
    pub fn database_path(&self) -> PathBuf {
        match &self.database_path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(&self.work_dir).join("floor.redb"),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
