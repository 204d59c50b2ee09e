pub mod api;
pub mod device;
pub mod notify;
pub mod session;
pub mod settings;

use chrono::prelude::*;

pub type Timestamp = DateTime<Utc>;

pub use api::transport::{Backend, HttpBackend, Reply};
pub use api::{Client, Outcome, Request};
pub use notify::{Kind, Notifier, Queue, Silent};
pub use session::Session;
pub use settings::{Consistency, EmptyReplies, Settings};
