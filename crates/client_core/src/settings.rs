use std::{collections::HashMap, fmt, fs, path::Path, str::FromStr, time::Duration};

use shared::domain::ResultLimit;
use thiserror::Error;
use tracing::warn;
use url::Url;

pub const SETTINGS_FILE: &str = "directory.toml";

/// How responses that arrive out of order are reconciled with the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseOrdering {
    /// Only the response to the most recently issued query is applied; older
    /// ones are discarded when they land.
    #[default]
    LatestRequest,
    /// Every response is applied as it lands, so the last one to arrive wins
    /// even if it answers an older query.
    LastResponse,
}

/// Whether settled failures are reported to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureReporting {
    #[default]
    Silent,
    Surface,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("unknown response ordering '{0}'; expected latest_request or last_response")]
    UnknownOrdering(String),
    #[error("unknown failure reporting mode '{0}'; expected silent or surface")]
    UnknownFailureReporting(String),
    #[error("invalid server url '{url}': {reason}")]
    InvalidServerUrl { url: String, reason: String },
}

impl FromStr for ResponseOrdering {
    type Err = SettingsError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "latest_request" | "latest-request" | "fenced" => Ok(Self::LatestRequest),
            "last_response" | "last-response" | "unfenced" => Ok(Self::LastResponse),
            _ => Err(SettingsError::UnknownOrdering(raw.to_string())),
        }
    }
}

impl fmt::Display for ResponseOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LatestRequest => "latest_request",
            Self::LastResponse => "last_response",
        })
    }
}

impl FromStr for FailureReporting {
    type Err = SettingsError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "silent" => Ok(Self::Silent),
            "surface" => Ok(Self::Surface),
            _ => Err(SettingsError::UnknownFailureReporting(raw.to_string())),
        }
    }
}

impl fmt::Display for FailureReporting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Silent => "silent",
            Self::Surface => "surface",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub server_url: String,
    pub default_limit: ResultLimit,
    pub response_ordering: ResponseOrdering,
    pub failure_reporting: FailureReporting,
    pub request_timeout: Option<Duration>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".into(),
            default_limit: ResultLimit::default(),
            response_ordering: ResponseOrdering::default(),
            failure_reporting: FailureReporting::default(),
            request_timeout: None,
        }
    }
}

/// Environment variables consulted after the settings file, in order; later
/// entries override earlier ones.
const ENV_OVERRIDES: [(&str, &str); 6] = [
    ("DIRECTORY_SERVER_URL", "server_url"),
    ("APP__SERVER_URL", "server_url"),
    ("APP__DEFAULT_LIMIT", "default_limit"),
    ("APP__RESPONSE_ORDERING", "response_ordering"),
    ("APP__FAILURE_REPORTING", "failure_reporting"),
    ("APP__REQUEST_TIMEOUT_SECS", "request_timeout_secs"),
];

pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(SETTINGS_FILE), |name| std::env::var(name).ok())
}

pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            Ok(file_cfg) => {
                for (key, value) in file_cfg {
                    let Some(text) = toml_text(&value) else {
                        warn!(
                            key = key.as_str(),
                            path = %path.display(),
                            "settings: ignoring non-scalar value"
                        );
                        continue;
                    };
                    settings.apply(&key, &text);
                }
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "settings: unreadable settings file");
            }
        }
    }

    for (var, key) in ENV_OVERRIDES {
        if let Some(value) = env(var) {
            settings.apply(key, &value);
        }
    }

    settings
}

impl ClientSettings {
    /// Applies one `key = value` pair. Unknown keys and unparsable values
    /// leave the current setting untouched.
    pub fn apply(&mut self, key: &str, value: &str) {
        let value = value.trim();
        match key {
            "server_url" => self.server_url = value.to_string(),
            "default_limit" => match value.parse::<u32>().ok().map(ResultLimit::try_from) {
                Some(Ok(limit)) => self.default_limit = limit,
                _ => warn!(value, "settings: ignoring invalid default_limit"),
            },
            "response_ordering" => match value.parse() {
                Ok(ordering) => self.response_ordering = ordering,
                Err(err) => warn!(error = %err, "settings: ignoring response_ordering"),
            },
            "failure_reporting" => match value.parse() {
                Ok(mode) => self.failure_reporting = mode,
                Err(err) => warn!(error = %err, "settings: ignoring failure_reporting"),
            },
            "request_timeout_secs" => match value.parse::<u64>() {
                Ok(0) => self.request_timeout = None,
                Ok(secs) => self.request_timeout = Some(Duration::from_secs(secs)),
                Err(_) => warn!(value, "settings: ignoring invalid request_timeout_secs"),
            },
            _ => warn!(key, "settings: ignoring unknown key"),
        }
    }

    pub fn parsed_server_url(&self) -> Result<Url, SettingsError> {
        parse_server_url(&self.server_url)
    }
}

pub fn parse_server_url(raw: &str) -> Result<Url, SettingsError> {
    let invalid = |reason: String| SettingsError::InvalidServerUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("url cannot be used as a base".into()));
    }
    Ok(url)
}

fn toml_text(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(text) => Some(text.clone()),
        toml::Value::Integer(number) => Some(number.to_string()),
        toml::Value::Boolean(flag) => Some(flag.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
