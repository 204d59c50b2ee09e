pub mod config;
pub mod epoch;
pub mod sensor;
pub mod telemetry;

use thiserror::Error;

pub use config::{ConfigForm, ConfigPatch, DeviceConfig, LOADING_NOTICE};
pub use sensor::{Reading, SensorTest, Sdi12Sensor};
pub use telemetry::{AlertLevel, DeviceTelemetry};

/// Input rejected before anything is sent to the device
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid sensor name '{0}' (letters, numbers and underscores only)")]
    InvalidName(String),

    #[error("sensor name '{0}' is too long (at most {} characters)", sensor::MAX_NAME_LEN)]
    NameTooLong(String),

    #[error("number of readings must be between 1 and {}, got {0}", sensor::MAX_READINGS)]
    ReadingCount(usize),

    #[error("cannot parse date '{date}' and time '{time}'")]
    DateTime { date: String, time: String },
}
