use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Live figures reported by `GET /data`. Always replaced as a whole.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct DeviceTelemetry {
    pub battery_level: f64,
    /// `None` while the modem reports no usable signal
    #[serde(default, deserialize_with = "lenient_percentage")]
    pub coverage_level: Option<f64>,
    pub messages_sent: u64,
    pub failed_transmissions: u64,
    pub free_sd_space: f64, // MB
    pub last_transmitted: i64, // device epoch ms
    pub last_updated: i64,     // device epoch ms
}

impl DeviceTelemetry {
    /// What is shown until the first fetch lands
    pub fn placeholder() -> Self {
        Self {
            battery_level: 100.0,
            coverage_level: Some(100.0),
            messages_sent: 0,
            failed_transmissions: 0,
            free_sd_space: 0.0,
            last_transmitted: 0,
            last_updated: 0,
        }
    }

    pub fn battery_alert(&self) -> AlertLevel {
        AlertLevel::from_percentage(self.battery_level)
    }

    pub fn coverage_alert(&self) -> Option<AlertLevel> {
        self.coverage_level.map(AlertLevel::from_percentage)
    }
}

impl Default for DeviceTelemetry {
    fn default() -> Self {
        Self::placeholder()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AlertLevel {
    Info,
    Warning,
    Danger,
}

impl AlertLevel {
    pub fn from_percentage(level: f64) -> Self {
        if level > 50.0 {
            AlertLevel::Info
        } else if level > 15.0 {
            AlertLevel::Warning
        } else {
            AlertLevel::Danger
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AlertLevel::Info => "info",
            AlertLevel::Warning => "warning",
            AlertLevel::Danger => "danger",
        }
    }
}

// Without signal the modem sends a sentence instead of a number
fn lenient_percentage<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_alert_thresholds() {
        assert_eq!(AlertLevel::from_percentage(100.0), AlertLevel::Info);
        assert_eq!(AlertLevel::from_percentage(50.5), AlertLevel::Info);
        assert_eq!(AlertLevel::from_percentage(50.0), AlertLevel::Warning);
        assert_eq!(AlertLevel::from_percentage(15.1), AlertLevel::Warning);
        assert_eq!(AlertLevel::from_percentage(15.0), AlertLevel::Danger);
        assert_eq!(AlertLevel::from_percentage(0.0), AlertLevel::Danger);
    }

    #[test]
    fn test_battery_warning_coverage_danger() {
        let telemetry: DeviceTelemetry = serde_json::from_value(json!({
            "battery_level": 42,
            "coverage_level": 10,
            "messages_sent": 120,
            "failed_transmissions": 3,
            "free_sd_space": 2048,
            "last_transmitted": 0,
            "last_updated": 0
        }))
        .unwrap();
        assert_eq!(telemetry.battery_alert().label(), "warning");
        assert_eq!(telemetry.coverage_alert(), Some(AlertLevel::Danger));
    }

    #[test]
    fn test_placeholder_is_healthy() {
        let telemetry = DeviceTelemetry::placeholder();
        assert_eq!(telemetry.battery_alert(), AlertLevel::Info);
        assert_eq!(telemetry.coverage_alert(), Some(AlertLevel::Info));
    }

    #[test]
    fn test_undetectable_coverage_keeps_the_rest() {
        let telemetry: DeviceTelemetry = serde_json::from_value(json!({
            "battery_level": 12,
            "coverage_level": "Not known or not detectable",
            "messages_sent": 4,
            "failed_transmissions": 2,
            "free_sd_space": 100,
            "last_transmitted": 0,
            "last_updated": 0
        }))
        .unwrap();
        assert_eq!(telemetry.battery_level, 12.0);
        assert_eq!(telemetry.battery_alert(), AlertLevel::Danger);
        assert_eq!(telemetry.coverage_level, None);
        assert_eq!(telemetry.coverage_alert(), None);
    }
}
