//! Poller configuration: JSON file plus environment overrides.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use tracing::debug;

use super::scheduler::SchedulerOptions;
use crate::core::PollerError;

/// Which exam the probe books.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExamType {
    /// Theory exam (code 0).
    #[default]
    Theoretical,
    /// Driving exam on a service-center vehicle (code 1).
    Practical,
}

impl ExamType {
    /// Numeric code used by older configs.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Theoretical => 0,
            Self::Practical => 1,
        }
    }

    /// Name sent to the probe.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Theoretical => "theoretical",
            Self::Practical => "practical",
        }
    }
}

impl fmt::Display for ExamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExamType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "theoretical" => Ok(Self::Theoretical),
            "1" | "practical" => Ok(Self::Practical),
            other => Err(format!("unknown exam type `{other}`")),
        }
    }
}

impl<'de> Deserialize<'de> for ExamType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Code(u8),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Code(code) => code.to_string().parse(),
            Repr::Name(name) => name.parse(),
        }
        .map_err(serde::de::Error::custom)
    }
}

/// Split a `;`-separated list, trimming entries and dropping empty ones.
#[must_use]
pub fn split_list(input: &str) -> Vec<String> {
    input
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn list_or_delimited<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        List(Vec<String>),
        Delimited(String),
    }

    Ok(match Repr::deserialize(deserializer)? {
        Repr::List(items) => items
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Repr::Delimited(s) => split_list(&s),
    })
}

/// Root poller configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Exam dates to watch (day of month as shown in the calendar).
    #[serde(deserialize_with = "list_or_delimited")]
    pub exam_dates: Vec<String>,
    /// Service-center address fragments to watch.
    #[serde(deserialize_with = "list_or_delimited")]
    pub addresses: Vec<String>,
    /// Exam kind.
    pub exam_type: ExamType,
    /// Log level when `RUST_LOG` is not set.
    pub log_level: String,
    /// Ceiling on concurrent workers.
    pub max_workers: usize,
    /// Timeout for a single probe request, in seconds.
    pub default_timeout_secs: u64,
    /// Pause between distribution passes, in seconds.
    pub interval_between_checks_secs: u64,
    /// How long a found slot suppresses re-probing, in seconds.
    pub ttl_for_found_task_secs: u64,
    /// How long to wait for interactive re-authentication, in seconds.
    pub auth_timeout_secs: u64,
    /// How often the credential file is re-read while waiting, in seconds.
    pub auth_poll_interval_secs: u64,
    /// ntfy topic for alerts.
    pub ntfy_topic: String,
    /// ntfy server base URL.
    pub ntfy_server: String,
    /// Page checked by the probe.
    pub probe_url: String,
    /// Name of the session cookie carrying the credential.
    pub session_cookie: String,
    /// Text shown only when the session is not authenticated.
    pub auth_marker: String,
    /// Text shown only when time slots are offered.
    pub slots_marker: String,
    /// File holding the persisted credential.
    pub credential_file: PathBuf,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            exam_dates: Vec::new(),
            addresses: Vec::new(),
            exam_type: ExamType::default(),
            log_level: "info".into(),
            max_workers: num_cpus::get(),
            default_timeout_secs: 10,
            interval_between_checks_secs: 60,
            ttl_for_found_task_secs: 3600,
            auth_timeout_secs: 600,
            auth_poll_interval_secs: 5,
            ntfy_topic: String::new(),
            ntfy_server: "https://ntfy.sh".into(),
            probe_url: "https://eqn.hsc.gov.ua/cabinet/queue".into(),
            session_cookie: "__Secure-next-auth.session-token".into(),
            auth_marker: "Увійти за допомогою".into(),
            slots_marker: "Доступний час".into(),
            credential_file: PathBuf::from("secret.txt"),
        }
    }
}

impl PollerConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.exam_dates.is_empty() {
            return Err("exam_dates must not be empty".into());
        }
        if self.addresses.is_empty() {
            return Err("addresses must not be empty".into());
        }
        if self.max_workers == 0 {
            return Err("max_workers must be greater than 0".into());
        }
        if self.default_timeout_secs == 0 {
            return Err("default_timeout_secs must be greater than 0".into());
        }
        if self.interval_between_checks_secs == 0 {
            return Err("interval_between_checks_secs must be greater than 0".into());
        }
        if self.auth_timeout_secs == 0 {
            return Err("auth_timeout_secs must be greater than 0".into());
        }
        if self.auth_poll_interval_secs == 0 {
            return Err("auth_poll_interval_secs must be greater than 0".into());
        }
        if self.ntfy_topic.trim().is_empty() {
            return Err("ntfy_topic must not be empty".into());
        }
        if self.session_cookie.trim().is_empty() {
            return Err("session_cookie must not be empty".into());
        }
        if self.auth_marker.trim().is_empty() {
            return Err("auth_marker must not be empty".into());
        }
        if self.slots_marker.trim().is_empty() {
            return Err("slots_marker must not be empty".into());
        }
        validate_http_url("probe_url", &self.probe_url)?;
        validate_http_url("ntfy_server", &self.ntfy_server)?;
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from `path` (defaults are used when the file does not exist),
    /// apply environment overrides, and validate.
    ///
    /// # Errors
    ///
    /// Returns [`PollerError::Config`] for unreadable or invalid input.
    pub fn load(path: &Path) -> Result<Self, PollerError> {
        let mut cfg = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| PollerError::Config(format!("can't read {}: {e}", path.display())))?;
            serde_json::from_str(&raw)
                .map_err(|e| PollerError::Config(format!("can't parse {}: {e}", path.display())))?
        } else {
            debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        cfg.apply_overrides(|name| std::env::var(name).ok())
            .map_err(PollerError::Config)?;
        cfg.validate().map_err(PollerError::Config)?;
        Ok(cfg)
    }

    /// Override fields from variables found by `lookup` (e.g. the process
    /// environment). Variable names are the upper-cased field names.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), String>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn number<T: FromStr>(name: &str, value: &str) -> Result<T, String> {
            value
                .trim()
                .parse()
                .map_err(|_| format!("{name} must be a non-negative integer, got `{value}`"))
        }

        if let Some(v) = lookup("EXAM_DATES") {
            self.exam_dates = split_list(&v);
        }
        if let Some(v) = lookup("ADDRESSES") {
            self.addresses = split_list(&v);
        }
        if let Some(v) = lookup("EXAM_TYPE") {
            self.exam_type = v.parse()?;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = lookup("MAX_WORKERS") {
            self.max_workers = number("MAX_WORKERS", &v)?;
        }
        if let Some(v) = lookup("DEFAULT_TIMEOUT_SECS") {
            self.default_timeout_secs = number("DEFAULT_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("INTERVAL_BETWEEN_CHECKS_SECS") {
            self.interval_between_checks_secs = number("INTERVAL_BETWEEN_CHECKS_SECS", &v)?;
        }
        if let Some(v) = lookup("TTL_FOR_FOUND_TASK_SECS") {
            self.ttl_for_found_task_secs = number("TTL_FOR_FOUND_TASK_SECS", &v)?;
        }
        if let Some(v) = lookup("AUTH_TIMEOUT_SECS") {
            self.auth_timeout_secs = number("AUTH_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("AUTH_POLL_INTERVAL_SECS") {
            self.auth_poll_interval_secs = number("AUTH_POLL_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = lookup("NTFY_TOPIC") {
            self.ntfy_topic = v;
        }
        if let Some(v) = lookup("NTFY_SERVER") {
            self.ntfy_server = v;
        }
        if let Some(v) = lookup("PROBE_URL") {
            self.probe_url = v;
        }
        if let Some(v) = lookup("SESSION_COOKIE") {
            self.session_cookie = v;
        }
        if let Some(v) = lookup("AUTH_MARKER") {
            self.auth_marker = v;
        }
        if let Some(v) = lookup("SLOTS_MARKER") {
            self.slots_marker = v;
        }
        if let Some(v) = lookup("CREDENTIAL_FILE") {
            self.credential_file = PathBuf::from(v);
        }
        Ok(())
    }

    /// Per-request probe timeout.
    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    /// Distribution interval.
    #[must_use]
    pub const fn interval_between_checks(&self) -> Duration {
        Duration::from_secs(self.interval_between_checks_secs)
    }

    /// Freshness window for found slots.
    #[must_use]
    pub const fn ttl_for_found_task(&self) -> Duration {
        Duration::from_secs(self.ttl_for_found_task_secs)
    }

    /// Interactive re-authentication deadline.
    #[must_use]
    pub const fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs)
    }

    /// Credential file re-read interval while waiting for re-authentication.
    #[must_use]
    pub const fn auth_poll_interval(&self) -> Duration {
        Duration::from_secs(self.auth_poll_interval_secs)
    }

    /// Scheduler options derived from this configuration.
    #[must_use]
    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions::new()
            .with_max_workers(self.max_workers)
            .with_interval(self.interval_between_checks())
            .with_topic(&self.ntfy_topic)
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<(), String> {
    let url = reqwest::Url::parse(value).map_err(|e| format!("{field} is not a valid URL: {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("{field} must use http or https, got `{other}`")),
    }
}
