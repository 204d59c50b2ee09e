//! Plain text rendering of the dashboard pages.

use chrono::prelude::*;
use devpanel::device::epoch;
use devpanel::device::{DeviceConfig, DeviceTelemetry};
use devpanel::notify::Notification;
use devpanel::session::{CommandResult, Tab, ViewState};

const LOADING: &str = "Loading...";

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

pub fn telemetry(t: &DeviceTelemetry) -> String {
    let coverage = match (t.coverage_level, t.coverage_alert()) {
        (Some(level), Some(alert)) => format!("{level:>6.1} % [{}]", alert.label()),
        _ => "unknown".to_string(),
    };
    format!(
        "Battery level      {:>6.1} % [{}]\n\
         Coverage level     {coverage}\n\
         Messages sent      {:>8}\n\
         Failed sends       {:>8}\n\
         Free SD space      {:>6.1} MB\n\
         Last transmission  {}\n\
         Last updated       {}\n",
        t.battery_level,
        t.battery_alert().label(),
        t.messages_sent,
        t.failed_transmissions,
        t.free_sd_space,
        epoch::display(t.last_transmitted, &Local),
        epoch::display(t.last_updated, &Local),
    )
}

pub fn config(c: &DeviceConfig) -> String {
    format!(
        "Device name        {}\n\
         Device id          {}\n\
         WiFi SSID          {}\n\
         WiFi password      {}\n\
         Send interval      {} min\n\
         First send at      {}\n\
         Maintenance mode   {}\n",
        c.device_name,
        c.device_id,
        c.wifi_ssid,
        "*".repeat(c.wifi_password.chars().count()),
        c.send_interval,
        epoch::display(c.first_send_at, &Local),
        on_off(c.maintenance_mode),
    )
}

pub fn sensors(c: &DeviceConfig) -> String {
    let mut lines = Vec::new();
    if !c.maintenance_mode {
        lines.push("(maintenance mode is off, sensor tests will be refused)".to_string());
    }
    if c.sdi12_sensors.is_empty() {
        lines.push("No SDI-12 sensors configured".to_string());
    }
    for (name, sensor) in c.sdi12_sensors.iter() {
        lines.push(format!(
            "{name} @{} {} every {} min, bootup {} s",
            sensor.address,
            if sensor.enabled { "enabled" } else { "disabled" },
            sensor.record_interval,
            sensor.bootup_time
        ));
        lines.extend(sensor.readings.iter().map(|reading| {
            format!(
                "  [{}] {} ({}) x{} {:+}",
                reading.index, reading.name, reading.unit, reading.multiplier, reading.offset
            )
        }));
    }
    lines.iter().map(|line| format!("{line}\n")).collect()
}

pub fn history(history: &[CommandResult]) -> String {
    history.iter().map(|entry| format!("> {entry}\n")).collect()
}

pub fn tab_bar(view: &ViewState) -> String {
    view.visible_tabs()
        .iter()
        .enumerate()
        .map(|(i, tab)| {
            if i == view.active_index() {
                format!("[{i}:{}]", tab.label())
            } else {
                format!(" {i}:{} ", tab.label())
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn notifications(notes: &[Notification]) -> String {
    notes
        .iter()
        .map(|note| format!("<{}> {}\n", note.kind.label(), note.message))
        .collect()
}

/// Nothing but a loading notice until the startup join resolved
pub fn page(
    view: &ViewState,
    loaded: bool,
    telemetry: &DeviceTelemetry,
    config: &DeviceConfig,
    monitor: &[CommandResult],
) -> String {
    if !loaded {
        return format!("{LOADING}\n");
    }
    let mut out = format!("{}\n", tab_bar(view));
    for pane in view.panes().iter().filter(|p| p.shown) {
        out.push_str(&format!("--- {} ---\n", pane.tab.label()));
        let body = match pane.tab {
            Tab::Visualise => self::telemetry(telemetry),
            Tab::Device if !ViewState::mountable(Tab::Device, config) => format!("{LOADING}\n"),
            Tab::Device => self::config(config),
            Tab::Sensors => sensors(config),
            Tab::History => "History is not available on this device yet\n".to_string(),
            Tab::Monitor => history(monitor),
        };
        out.push_str(&body);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_is_masked() {
        let mut c = DeviceConfig::placeholder();
        c.wifi_password = "hunter2".into();
        let text = config(&c);
        assert!(text.contains("*******"));
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn test_alert_labels_shown() {
        let mut t = DeviceTelemetry::placeholder();
        t.battery_level = 42.0;
        t.coverage_level = Some(10.0);
        let text = telemetry(&t);
        assert!(text.contains("[warning]"));
        assert!(text.contains("[danger]"));
    }

    #[test]
    fn test_unknown_coverage() {
        let mut t = DeviceTelemetry::placeholder();
        t.coverage_level = None;
        assert!(telemetry(&t).contains("Coverage level     unknown\n"));
    }

    #[test]
    fn test_page_waits_for_load() {
        let view = ViewState::new(80);
        let t = DeviceTelemetry::placeholder();
        let c = DeviceConfig::placeholder();
        assert_eq!(page(&view, false, &t, &c, &[]), "Loading...\n");
        assert!(page(&view, true, &t, &c, &[]).contains("--- VISUALISE ---"));
    }

    #[test]
    fn test_wide_page_shows_monitor_panel() {
        let mut view = ViewState::new(1024);
        view.click(1);
        let entries = vec![CommandResult::Reply {
            command: "?!".into(),
            response: "0".into(),
        }];
        let text = page(&view, true, &DeviceTelemetry::placeholder(), &DeviceConfig::placeholder(), &entries);
        assert!(text.contains("--- DEVICE ---\nLoading..."));
        assert!(text.contains("--- MONITOR ---\n> ?!: 0"));
        assert!(!text.contains(" 4:MONITOR"));
    }
}
