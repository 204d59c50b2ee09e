//! Which page is in front.
//!
//! Narrow layouts show Monitor as a fifth tab; wide layouts drop that tab and
//! keep Monitor open as a side panel. Every page stays mounted either way,
//! only visibility changes.

use crate::device::DeviceConfig;
use tracing::{debug, info};

/// Widths at or above this get the side panel layout
pub const WIDE_LAYOUT_MIN_WIDTH: u16 = 768;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Tab {
    Visualise,
    Device,
    Sensors,
    History,
    Monitor,
}

const WIDE_TABS: [Tab; 4] = [Tab::Visualise, Tab::Device, Tab::Sensors, Tab::History];
const NARROW_TABS: [Tab; 5] = [
    Tab::Visualise,
    Tab::Device,
    Tab::Sensors,
    Tab::History,
    Tab::Monitor,
];

impl Tab {
    pub fn label(&self) -> &'static str {
        match self {
            Tab::Visualise => "VISUALISE",
            Tab::Device => "DEVICE",
            Tab::Sensors => "SENSORS",
            Tab::History => "HISTORY",
            Tab::Monitor => "MONITOR",
        }
    }
}

/// A mounted page and whether it is currently shown
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Pane {
    pub tab: Tab,
    pub shown: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewState {
    active: usize,
    wide: bool,
}

impl ViewState {
    pub fn new(width: u16) -> Self {
        Self {
            active: 0,
            wide: width >= WIDE_LAYOUT_MIN_WIDTH,
        }
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn visible_tabs(&self) -> &'static [Tab] {
        if self.wide {
            &WIDE_TABS
        } else {
            &NARROW_TABS
        }
    }

    pub fn active_tab(&self) -> Tab {
        self.visible_tabs()[self.active]
    }

    /// Monitor is shown beside the tabs instead of as one of them
    pub fn monitor_panel(&self) -> bool {
        self.wide
    }

    /// Returns false, leaving the selection alone, when `index` is not a
    /// visible tab.
    pub fn click(&mut self, index: usize) -> bool {
        if index >= self.visible_tabs().len() {
            debug!("Ignoring click on tab {index}, not visible");
            return false;
        }
        self.active = index;
        info!("Tab {} selected", self.active_tab().label());
        true
    }

    /// Layout change. Becoming wide while Monitor is the active tab falls
    /// back to the first tab since Monitor is no longer a tab.
    pub fn resize(&mut self, width: u16) {
        let wide = width >= WIDE_LAYOUT_MIN_WIDTH;
        if wide == self.wide {
            return;
        }
        self.wide = wide;
        if self.active >= self.visible_tabs().len() {
            info!("Monitor moved to the side panel, back to {}", Tab::Visualise.label());
            self.active = 0;
        }
        debug!("Layout is now {}", if wide { "wide" } else { "narrow" });
    }

    /// All tab pages with their visibility. Monitor is listed even in the
    /// wide layout, where it lives in the side panel and is always shown.
    pub fn panes(&self) -> Vec<Pane> {
        let mut panes: Vec<Pane> = self
            .visible_tabs()
            .iter()
            .enumerate()
            .map(|(i, tab)| Pane {
                tab: *tab,
                shown: i == self.active,
            })
            .collect();
        if self.wide {
            panes.push(Pane {
                tab: Tab::Monitor,
                shown: true,
            });
        }
        panes
    }

    /// Pages that capture one-time defaults must wait for real data
    pub fn mountable(tab: Tab, config: &DeviceConfig) -> bool {
        match tab {
            Tab::Device => config.is_loaded(),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_sets() {
        let narrow = ViewState::new(767);
        assert_eq!(narrow.visible_tabs(), &NARROW_TABS);
        assert!(!narrow.monitor_panel());

        let wide = ViewState::new(768);
        assert_eq!(
            wide.visible_tabs(),
            &[Tab::Visualise, Tab::Device, Tab::Sensors, Tab::History]
        );
        assert!(wide.monitor_panel());
    }

    #[test]
    fn test_widening_on_monitor_resets() {
        let mut view = ViewState::new(400);
        assert!(view.click(4));
        assert_eq!(view.active_tab(), Tab::Monitor);
        view.resize(1024);
        assert_eq!(view.active_index(), 0);
        assert_eq!(view.active_tab(), Tab::Visualise);
    }

    #[test]
    fn test_other_transitions_keep_selection() {
        for width in [320u16, 767, 768, 1920] {
            for index in 0..4 {
                let mut view = ViewState::new(400);
                view.click(index);
                view.resize(width);
                assert_eq!(view.active_index(), index, "width {width} tab {index}");
            }
        }
        // narrowing keeps Monitor selected
        let mut view = ViewState::new(400);
        view.click(4);
        view.resize(500);
        assert_eq!(view.active_index(), 4);

        // widening then narrowing does not restore Monitor
        let mut view = ViewState::new(1200);
        view.click(2);
        view.resize(300);
        view.resize(1300);
        assert_eq!(view.active_index(), 2);
    }

    #[test]
    fn test_click_outside_visible_set_is_ignored() {
        let mut view = ViewState::new(1024);
        view.click(3);
        assert!(!view.click(4));
        assert_eq!(view.active_index(), 3);
    }

    #[test]
    fn test_all_panes_stay_mounted() {
        let mut view = ViewState::new(500);
        view.click(2);
        let panes = view.panes();
        assert_eq!(panes.len(), 5);
        assert_eq!(panes.iter().filter(|p| p.shown).count(), 1);
        assert_eq!(panes[2], Pane { tab: Tab::Sensors, shown: true });

        view.resize(900);
        let panes = view.panes();
        assert_eq!(panes.len(), 5);
        assert_eq!(panes[4], Pane { tab: Tab::Monitor, shown: true });
        assert_eq!(panes.iter().filter(|p| p.shown).count(), 2);
    }

    #[test]
    fn test_device_page_waits_for_config() {
        let mut config = DeviceConfig::placeholder();
        assert!(!ViewState::mountable(Tab::Device, &config));
        assert!(ViewState::mountable(Tab::Sensors, &config));
        config.device_name = "creek".into();
        assert!(ViewState::mountable(Tab::Device, &config));
    }
}
