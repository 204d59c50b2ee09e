//! Telemetry and config state for the one device of this session.
//!
//! Both resources start as placeholders and are only ever replaced whole.
//! State sits behind short-lived locks so several fetches can be in flight
//! on the same thread; no lock is held across an `.await`.

use crate::api::transport::Backend;
use crate::api::{Client, DecodeError, Outcome, Request};
use crate::device::sensor::{validate_name, validate_new_name};
use crate::device::{
    ConfigForm, ConfigPatch, DeviceConfig, DeviceTelemetry, SensorTest, Sdi12Sensor,
    ValidationError,
};
use crate::settings::Consistency;
use chrono::TimeZone;
use serde_json::json;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

pub const RETRIEVING_CONFIG: &str = "Retrieving latest config...";

/// One resource plus the fetch bookkeeping used to spot stale completions
#[derive(Debug)]
struct Slot<T> {
    value: T,
    issued: u64,    // last ticket handed out
    committed: u64, // ticket of the fetch currently held in `value`
}

impl<T> Slot<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            issued: 0,
            committed: 0,
        }
    }

    fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Returns false when the completion was discarded as stale
    fn commit(&mut self, ticket: u64, value: T, consistency: Consistency) -> bool {
        if consistency == Consistency::LastIssued && ticket < self.committed {
            return false;
        }
        self.value = value;
        self.committed = ticket;
        true
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Loader<B> {
    client: Arc<Client<B>>,
    consistency: Consistency,
    telemetry: Mutex<Slot<DeviceTelemetry>>,
    config: Mutex<Slot<DeviceConfig>>,
    loaded: AtomicBool,
}

impl<B: Backend> Loader<B> {
    pub fn new(client: Arc<Client<B>>, consistency: Consistency) -> Self {
        Self {
            client,
            consistency,
            telemetry: Mutex::new(Slot::new(DeviceTelemetry::placeholder())),
            config: Mutex::new(Slot::new(DeviceConfig::placeholder())),
            loaded: AtomicBool::new(false),
        }
    }

    pub fn telemetry(&self) -> DeviceTelemetry {
        lock(&self.telemetry).value.clone()
    }

    pub fn config(&self) -> DeviceConfig {
        lock(&self.config).value.clone()
    }

    /// True once the startup join resolved, whatever its results
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    /// Startup fetch: telemetry and config go out together and the session
    /// counts as loaded once both have answered.
    pub async fn load(&self) -> bool {
        let (telemetry, config) = futures::join!(self.fetch_telemetry(), self.fetch_config());
        self.loaded.store(true, Ordering::SeqCst);
        info!(
            "Session loaded (telemetry: {}, config: {})",
            if telemetry { "ok" } else { "failed" },
            if config { "ok" } else { "failed" }
        );
        telemetry && config
    }

    pub async fn fetch_telemetry(&self) -> bool {
        let ticket = lock(&self.telemetry).issue();
        debug!("Fetching telemetry #{ticket}");
        let outcome = self.client.send(Request::get("data").quiet()).await;
        match outcome.decode::<DeviceTelemetry>() {
            Ok(telemetry) => {
                if lock(&self.telemetry).commit(ticket, telemetry, self.consistency) {
                    info!("Telemetry #{ticket} committed");
                } else {
                    warn!("Telemetry #{ticket} is stale, discarded");
                }
                true
            }
            Err(e) => {
                warn!("Telemetry #{ticket} not applied: {e}");
                self.unreadable("telemetry", &e);
                false
            }
        }
    }

    pub async fn fetch_config(&self) -> bool {
        let ticket = lock(&self.config).issue();
        debug!("Fetching config #{ticket}");
        let request = Request::get("config").init_message(RETRIEVING_CONFIG).quiet();
        let outcome = self.client.send(request).await;
        match outcome.decode::<DeviceConfig>() {
            Ok(config) => {
                let name = config.device_name.clone();
                if lock(&self.config).commit(ticket, config, self.consistency) {
                    info!("Config #{ticket} committed for {name}");
                } else {
                    warn!("Config #{ticket} is stale, discarded");
                }
                true
            }
            Err(e) => {
                warn!("Config #{ticket} not applied: {e}");
                self.unreadable("device settings", &e);
                false
            }
        }
    }

    // The client already reported failed requests; a 2xx reply that does not
    // fit the wire type has not been reported yet.
    fn unreadable(&self, what: &str, e: &DecodeError) {
        if let DecodeError::Payload(cause) = e {
            self.client
                .notifier()
                .error(&format!("error: could not read {what} ({cause})"));
        }
    }

    /// Re-reads the config after a write so the client converges on the device
    pub async fn reload_config(&self) -> bool {
        self.fetch_config().await
    }

    async fn mutate(&self, request: Request) -> Outcome {
        let outcome = self.client.send(request).await;
        if outcome.is_ok() {
            self.reload_config().await;
        }
        outcome
    }

    pub async fn update_config(&self, patch: &ConfigPatch) -> Outcome {
        let request = Request::post("config")
            .json(json!(patch))
            .init_message("Updating device data...")
            .success_message("Settings updated!");
        self.mutate(request).await
    }

    pub async fn set_maintenance(&self, enabled: bool) -> Outcome {
        let verb = if enabled { "Enabling" } else { "Disabling" };
        let request = Request::post("config")
            .json(json!(ConfigPatch::maintenance(enabled)))
            .init_message(format!("{verb} maintenance mode..."))
            .success_message("Maintenance mode set!");
        self.mutate(request).await
    }

    /// The device creates a sensor with its own defaults when an unknown name
    /// is updated.
    pub async fn create_sensor(&self, name: &str) -> Result<Outcome, ValidationError> {
        validate_new_name(name)?;
        let request = Request::post(format!("config/sdi12/update/{name}"))
            .json(json!({}))
            .init_message("Creating sensor...")
            .success_message("Sensor created successfully!");
        Ok(self.mutate(request).await)
    }

    pub async fn update_sensor(
        &self,
        name: &str,
        sensor: &Sdi12Sensor,
    ) -> Result<Outcome, ValidationError> {
        validate_name(name)?;
        let request = Request::post(format!("config/sdi12/update/{name}"))
            .json(json!(sensor))
            .init_message("Updating sensor settings...")
            .success_message("Settings updated!");
        Ok(self.mutate(request).await)
    }

    pub async fn rename_sensor(
        &self,
        name: &str,
        new_name: &str,
    ) -> Result<Outcome, ValidationError> {
        validate_name(name)?;
        validate_new_name(new_name)?;
        let request = Request::post(format!("config/sdi12/rename/{name}"))
            .json(json!({ "name": new_name }))
            .init_message("Renaming sensor...")
            .success_message("Sensor updated!");
        Ok(self.mutate(request).await)
    }

    pub async fn delete_sensor(&self, name: &str) -> Result<Outcome, ValidationError> {
        validate_name(name)?;
        let request = Request::post(format!("config/sdi12/delete/{name}"))
            .init_message("Deleting sensor...")
            .success_message("Sensor deleted!");
        Ok(self.mutate(request).await)
    }

    /// Reads the sensor once. Nothing is written, so no reload follows.
    pub async fn test_sensor(&self, name: &str) -> Result<Option<SensorTest>, ValidationError> {
        validate_name(name)?;
        let outcome = self
            .client
            .send(Request::get(format!("config/sdi12/test/{name}")).quiet())
            .await;
        let payload = outcome.payload().cloned();
        Ok(payload.and_then(|p| match serde_json::from_value(p) {
            Ok(test) => Some(test),
            Err(e) => {
                warn!("Unexpected sensor test reply for {name}: {e}");
                None
            }
        }))
    }

    /// One-time defaults for the settings form. `None` until the config is
    /// loaded: defaults captured from the placeholder would stick.
    pub fn config_form<Tz: TimeZone>(&self, tz: &Tz) -> Option<ConfigForm>
    where
        Tz::Offset: Display,
    {
        let config = self.config();
        config
            .is_loaded()
            .then(|| ConfigForm::defaults(&config, tz))
    }
}
