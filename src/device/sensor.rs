use super::ValidationError;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;

const SENSOR_NAME: &str = r"^[A-Za-z0-9_]+$";

pub const MAX_NAME_LEN: usize = 20;
pub const MAX_READINGS: usize = 10;

/// One SDI-12 sensor as stored under its name in `sdi12_sensors`.
/// The name is the identity; there is no other id.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Sdi12Sensor {
    #[serde(deserialize_with = "lenient_string")]
    pub address: String,
    pub bootup_time: u32,     // seconds
    pub record_interval: u32, // minutes
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_record_at: Option<i64>,
    #[serde(default)]
    pub readings: Vec<Reading>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct Reading {
    #[serde(rename = "reading")]
    pub name: String,
    pub index: u32,
    pub unit: String,
    pub multiplier: f64,
    pub offset: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl Sdi12Sensor {
    /// Truncates the readings to `count` or pads them with empty ones.
    pub fn resize_readings(&mut self, count: usize) -> Result<(), ValidationError> {
        if count == 0 || count > MAX_READINGS {
            return Err(ValidationError::ReadingCount(count));
        }
        self.readings.resize_with(count, Reading::default);
        Ok(())
    }
}

/// Reply of `GET /config/sdi12/test/{name}`
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum SensorTest {
    Failed { error: String },
    Values { response: BTreeMap<String, f64> },
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(SENSOR_NAME).expect("Failed pattern"))
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if !name_pattern().is_match(name) {
        return Err(ValidationError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Rules for a name picked by the operator (create or rename)
pub fn validate_new_name(name: &str) -> Result<(), ValidationError> {
    validate_name(name)?;
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong(name.to_string()));
    }
    Ok(())
}

// Freshly created sensors come back with a numeric address
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::new()),
        other => Ok(other.to_string()),
    }
}
