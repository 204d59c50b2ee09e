use super::epoch;
use super::sensor::Sdi12Sensor;
use super::ValidationError;
use chrono::TimeZone;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Marks text fields that have not been fetched yet
pub const LOADING_NOTICE: &str = "loading...";

/// Device settings as served by `GET /config`. Always replaced as a whole.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct DeviceConfig {
    pub device_name: String,
    pub device_id: String,
    pub wifi_ssid: String,
    pub wifi_password: String,
    pub send_interval: u32, // minutes
    pub maintenance_mode: bool,
    pub first_send_at: i64, // device epoch ms
    #[serde(default)]
    pub sdi12_sensors: BTreeMap<String, Sdi12Sensor>,
}

impl DeviceConfig {
    pub fn placeholder() -> Self {
        Self {
            device_name: LOADING_NOTICE.into(),
            device_id: LOADING_NOTICE.into(),
            wifi_ssid: "".into(),
            wifi_password: "".into(),
            send_interval: 0,
            maintenance_mode: false,
            first_send_at: 0,
            sdi12_sensors: BTreeMap::new(),
        }
    }

    /// False until a real config replaced the placeholder
    pub fn is_loaded(&self) -> bool {
        self.device_name != LOADING_NOTICE
    }

    pub fn sensor(&self, name: &str) -> Option<&Sdi12Sensor> {
        self.sdi12_sensors.get(name)
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::placeholder()
    }
}

/// Body of `POST /config`: only the fields that are set go on the wire.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct ConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wifi_ssid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wifi_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_send_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance_mode: Option<bool>,
}

impl ConfigPatch {
    pub fn maintenance(enabled: bool) -> Self {
        Self {
            maintenance_mode: Some(enabled),
            ..Default::default()
        }
    }
}

/// The device settings edit form. Its defaults are captured once from a
/// loaded config and then edited independently of later reloads.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigForm {
    pub device_name: String,
    pub device_id: String,
    pub wifi_ssid: String,
    pub wifi_password: String,
    pub first_send_at_date: String,
    pub first_send_at_time: String,
    pub send_interval: u32,
}

impl ConfigForm {
    pub fn defaults<Tz: TimeZone>(config: &DeviceConfig, tz: &Tz) -> Self
    where
        Tz::Offset: Display,
    {
        let (date, time) = epoch::to_date_time(config.first_send_at, tz);
        Self {
            device_name: config.device_name.clone(),
            device_id: config.device_id.clone(),
            wifi_ssid: config.wifi_ssid.clone(),
            wifi_password: config.wifi_password.clone(),
            first_send_at_date: date,
            first_send_at_time: time,
            send_interval: config.send_interval,
        }
    }

    /// Builds the request body. The date and time strings only become
    /// `first_send_at` when both are filled in.
    pub fn submit<Tz: TimeZone>(&self, tz: &Tz) -> Result<ConfigPatch, ValidationError> {
        let date = self.first_send_at_date.trim();
        let time = self.first_send_at_time.trim();
        let first_send_at = if !date.is_empty() && !time.is_empty() {
            Some(epoch::from_date_time(date, time, tz)?)
        } else {
            None
        };
        Ok(ConfigPatch {
            device_name: Some(self.device_name.clone()),
            device_id: Some(self.device_id.clone()),
            wifi_ssid: Some(self.wifi_ssid.clone()),
            wifi_password: Some(self.wifi_password.clone()),
            send_interval: Some(self.send_interval),
            first_send_at,
            maintenance_mode: None,
        })
    }
}
