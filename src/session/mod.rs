//! One operator session against one device.

pub mod console;
pub mod loader;
pub mod view;

pub use console::{CommandResult, Console, ExchangeState, Submission};
pub use loader::Loader;
pub use view::{Pane, Tab, ViewState};

use crate::api::transport::Backend;
use crate::api::Client;
use crate::notify::Notifier;
use crate::settings::Settings;
use std::sync::Arc;
use tracing::info;

/// Shares a single API client between the loader and the console
pub struct Session<B> {
    loader: Loader<B>,
    console: Console<B>,
    view: ViewState,
}

impl<B: Backend> Session<B> {
    pub fn new(settings: &Settings, backend: B, notifier: Arc<dyn Notifier>, width: u16) -> Self {
        let client = Arc::new(Client::new(&settings.api_url, backend, notifier));
        info!("Session on {} ({} columns)", settings.api_url, width);
        Self {
            loader: Loader::new(client.clone(), settings.consistency),
            console: Console::new(client, settings.empty_replies),
            view: ViewState::new(width),
        }
    }

    /// Initial fetch of telemetry and config
    pub async fn start(&self) -> bool {
        self.loader.load().await
    }

    pub fn loader(&self) -> &Loader<B> {
        &self.loader
    }

    pub fn console(&self) -> &Console<B> {
        &self.console
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }
}
