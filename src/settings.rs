//! Runtime settings.
//!
//! Built-in defaults are overridden by a `.env` file, then by the process
//! environment and finally by command line flags.

use clap::ValueEnum;
use dotenvy::dotenv;
use reqwest::Url;
use std::env;
use std::time::Duration;
use thiserror::Error;

const API_URL: &str = "DEVPANEL_API_URL";
const TIMEOUT_SECS: &str = "DEVPANEL_TIMEOUT_SECS";

const DEFAULT_API_URL: &str = "http://192.168.4.1/";
const DEFAULT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{source_name} is not a valid http(s) URL: {value}")]
    InvalidUrl { source_name: String, value: String },

    #[error("{source_name} must be a positive number of seconds, got {value}")]
    InvalidTimeout { source_name: String, value: String },
}

/// What the monitor console does with a reply that carries neither an error
/// nor any response text.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "lower")]
pub enum EmptyReplies {
    /// Leave the history untouched and say nothing
    #[default]
    Drop,

    /// Append the exchange to the history anyway
    Record,
}

/// Which fetch wins when two fetches of the same resource overlap.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "kebab-case")]
pub enum Consistency {
    /// Whatever completes last overwrites the state, even if it was issued first
    #[default]
    LastCompleted,

    /// Completions older than the newest committed fetch are discarded
    LastIssued,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Base URL without trailing slash, resources join as `{api_url}/data`
    pub api_url: String,
    pub timeout: Duration,
    pub empty_replies: EmptyReplies,
    pub consistency: Consistency,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            empty_replies: EmptyReplies::default(),
            consistency: Consistency::default(),
        }
    }
}

impl Settings {
    /// Defaults overridden by `.env` and the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        dotenv().ok();
        Self::from_vars(env::var(API_URL).ok(), env::var(TIMEOUT_SECS).ok())
    }

    fn from_vars(url: Option<String>, timeout: Option<String>) -> Result<Self, SettingsError> {
        let mut settings = Self::default();
        if let Some(url) = url {
            settings.api_url = normalise_url(API_URL, &url)?;
        }
        if let Some(timeout) = timeout {
            settings.timeout = parse_timeout(TIMEOUT_SECS, &timeout)?;
        }
        Ok(settings)
    }

    pub fn with_api_url(mut self, url: &str) -> Result<Self, SettingsError> {
        self.api_url = normalise_url("--api-url", url)?;
        Ok(self)
    }

    pub fn with_timeout(mut self, secs: u64) -> Result<Self, SettingsError> {
        self.timeout = parse_timeout("--timeout", &secs.to_string())?;
        Ok(self)
    }
}

fn normalise_url(source_name: &str, value: &str) -> Result<String, SettingsError> {
    let invalid = || SettingsError::InvalidUrl {
        source_name: source_name.to_string(),
        value: value.to_string(),
    };
    let url = Url::parse(value.trim()).map_err(|_| invalid())?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid());
    }
    Ok(value.trim().trim_end_matches('/').to_string())
}

fn parse_timeout(source_name: &str, value: &str) -> Result<Duration, SettingsError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(SettingsError::InvalidTimeout {
            source_name: source_name.to_string(),
            value: value.to_string(),
        }),
    }
}
