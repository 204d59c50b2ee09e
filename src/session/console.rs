//! Raw SDI-12 command console.
//!
//! At most one command is outstanding: `submit` refuses while a previous
//! exchange is still `Sending`. Input enablement is read off that state.
//! The history only grows.

use crate::api::transport::Backend;
use crate::api::{Client, Outcome, Request};
use crate::settings::EmptyReplies;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    Sending,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandResult {
    Reply { command: String, response: String },
    Error { error: String },
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandResult::Reply { command, response } => write!(f, "{command}: {response}"),
            CommandResult::Error { error } => write!(f, "Error: {error}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    /// A command is already outstanding; nothing was sent
    Busy,
    Recorded(CommandResult),
    /// Empty reply without error, deliberately not recorded
    Dropped,
    /// No reply at all; the client already reported it
    Failed(String),
}

#[derive(Debug)]
struct Exchange {
    state: ExchangeState,
    history: Vec<CommandResult>,
}

fn lock(exchange: &Mutex<Exchange>) -> MutexGuard<'_, Exchange> {
    exchange.lock().unwrap_or_else(PoisonError::into_inner)
}

// Puts the console back to Idle however the exchange ends, including the
// submit future being dropped mid-flight.
struct InFlight<'a>(&'a Mutex<Exchange>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(self.0).state = ExchangeState::Idle;
    }
}

pub struct Console<B> {
    client: Arc<Client<B>>,
    empty_replies: EmptyReplies,
    exchange: Mutex<Exchange>,
}

impl<B: Backend> Console<B> {
    pub fn new(client: Arc<Client<B>>, empty_replies: EmptyReplies) -> Self {
        Self {
            client,
            empty_replies,
            exchange: Mutex::new(Exchange {
                state: ExchangeState::Idle,
                history: Vec::new(),
            }),
        }
    }

    pub fn state(&self) -> ExchangeState {
        lock(&self.exchange).state
    }

    pub fn input_enabled(&self) -> bool {
        self.state() == ExchangeState::Idle
    }

    /// Oldest first
    pub fn history(&self) -> Vec<CommandResult> {
        lock(&self.exchange).history.clone()
    }

    pub async fn submit(&self, command: impl Into<String>) -> Submission {
        let command = command.into();
        {
            let mut exchange = lock(&self.exchange);
            if exchange.state == ExchangeState::Sending {
                debug!("Console busy, '{command}' not sent");
                return Submission::Busy;
            }
            exchange.state = ExchangeState::Sending;
        }
        let in_flight = InFlight(&self.exchange);

        let request = Request::get("monitor").query("command", &command).quiet();
        let outcome = self.client.send(request).await;

        let result = match outcome {
            Outcome::Ok(payload) => accept(&command, &payload, self.empty_replies),
            Outcome::ServerError { message, .. } => Some(CommandResult::Error { error: message }),
            Outcome::TransportError(message) => {
                drop(in_flight);
                return Submission::Failed(message);
            }
        };
        let submission = match result {
            Some(result) => {
                info!("Console: {result}");
                lock(&self.exchange).history.push(result.clone());
                Submission::Recorded(result)
            }
            None => {
                debug!("Console: empty reply to '{command}' dropped");
                Submission::Dropped
            }
        };
        drop(in_flight);
        submission
    }
}

/// Decides what a monitor reply adds to the history
fn accept(command: &str, payload: &Value, empty_replies: EmptyReplies) -> Option<CommandResult> {
    match payload.get("error") {
        Some(Value::String(error)) => {
            return Some(CommandResult::Error {
                error: error.clone(),
            })
        }
        Some(error) if !error.is_null() => {
            return Some(CommandResult::Error {
                error: error.to_string(),
            })
        }
        _ => (),
    }
    let response = match payload.get("response") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    if response.is_empty() && empty_replies == EmptyReplies::Drop {
        return None;
    }
    let command = payload
        .get("command")
        .and_then(Value::as_str)
        .unwrap_or(command)
        .to_string();
    Some(CommandResult::Reply { command, response })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::fake::{Device, Step};
    use crate::notify::Queue;
    use reqwest::{Method, StatusCode};
    use serde_json::json;

    fn console(device: Device, empty_replies: EmptyReplies) -> (Console<Device>, Arc<Queue>) {
        let queue = Arc::new(Queue::new());
        let client = Arc::new(Client::new("http://device.test", device, queue.clone()));
        (Console::new(client, empty_replies), queue)
    }

    #[test]
    fn test_accept_rules() {
        assert_eq!(
            accept("0I!", &json!({"command": "0I!", "response": "013METER  TER12 112"}), EmptyReplies::Drop),
            Some(CommandResult::Reply {
                command: "0I!".into(),
                response: "013METER  TER12 112".into()
            })
        );
        assert_eq!(
            accept("0I!", &json!({"error": "maintenance mode not enabled"}), EmptyReplies::Drop),
            Some(CommandResult::Error {
                error: "maintenance mode not enabled".into()
            })
        );
        assert_eq!(accept("M!", &json!({"command": "M!", "response": ""}), EmptyReplies::Drop), None);
        assert_eq!(accept("M!", &Value::Null, EmptyReplies::Drop), None);
        assert_eq!(
            accept("M!", &json!({"command": "M!", "response": ""}), EmptyReplies::Record),
            Some(CommandResult::Reply {
                command: "M!".into(),
                response: "".into()
            })
        );
        // falls back to what was typed when the device does not echo it
        assert_eq!(
            accept("?!", &json!({"response": "0"}), EmptyReplies::Drop),
            Some(CommandResult::Reply {
                command: "?!".into(),
                response: "0".into()
            })
        );
    }

    #[tokio::test]
    async fn test_exchange_appends_in_order() {
        let device = Device::new();
        device.json(Method::GET, "/monitor", StatusCode::OK, r#"{"command": "?!", "response": "0"}"#);
        device.json(Method::GET, "/monitor", StatusCode::OK, r#"{"error": "maintenance mode not enabled"}"#);
        let (console, queue) = console(device, EmptyReplies::Drop);

        assert!(matches!(console.submit("?!").await, Submission::Recorded(_)));
        assert!(matches!(console.submit("0I!").await, Submission::Recorded(_)));
        let history: Vec<String> = console.history().iter().map(ToString::to_string).collect();
        assert_eq!(history, vec!["?!: 0", "Error: maintenance mode not enabled"]);
        assert!(console.input_enabled());
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_empty_reply_dropped_silently() {
        let device = Device::new();
        device.json(Method::GET, "/monitor", StatusCode::OK, r#"{"command": "M!", "response": ""}"#);
        let (console, queue) = console(device, EmptyReplies::Drop);

        assert_eq!(console.submit("M!").await, Submission::Dropped);
        assert!(console.history().is_empty());
        assert!(queue.is_empty());
        assert_eq!(console.state(), ExchangeState::Idle);
    }

    #[tokio::test]
    async fn test_submit_while_sending_is_a_no_op() {
        let device = Device::new();
        let gate = device.gated(Method::GET, "/monitor", r#"{"command": "0M!", "response": "00012"}"#);
        let (console, _queue) = console(device, EmptyReplies::Drop);

        let first = console.submit("0M!");
        tokio::pin!(first);
        assert!(futures::poll!(first.as_mut()).is_pending());
        assert_eq!(console.state(), ExchangeState::Sending);
        assert!(!console.input_enabled());

        assert_eq!(console.submit("0D0!").await, Submission::Busy);
        assert_eq!(console.history().len(), 0);
        assert_eq!(console.client.backend().calls().len(), 1);
        assert_eq!(console.state(), ExchangeState::Sending);

        gate.send(()).unwrap();
        assert!(matches!(first.await, Submission::Recorded(_)));
        assert_eq!(console.history().len(), 1);
        assert!(console.input_enabled());
    }

    #[tokio::test]
    async fn test_transport_failure_reenables_input() {
        let device = Device::new();
        device.script(Method::GET, "/monitor", Step::Fail("timed out".into()));
        let (console, queue) = console(device, EmptyReplies::Drop);

        assert_eq!(console.submit("0R0!").await, Submission::Failed("timed out".into()));
        assert!(console.input_enabled());
        assert!(console.history().is_empty());
        assert_eq!(queue.drain()[0].message, "error: timed out");
    }

    #[tokio::test]
    async fn test_server_error_goes_to_history() {
        let device = Device::new();
        device.json(Method::GET, "/monitor", StatusCode::BAD_REQUEST, r#"{"error": "bad command"}"#);
        let (console, _queue) = console(device, EmptyReplies::Drop);

        assert_eq!(
            console.submit("xx").await,
            Submission::Recorded(CommandResult::Error {
                error: "bad command".into()
            })
        );
    }

    #[tokio::test]
    async fn test_dropped_submit_future_releases_console() {
        let device = Device::new();
        let _gate = device.gated(Method::GET, "/monitor", "{}");
        let (console, _queue) = console(device, EmptyReplies::Drop);
        {
            let pending = console.submit("0M!");
            tokio::pin!(pending);
            assert!(futures::poll!(pending.as_mut()).is_pending());
            assert_eq!(console.state(), ExchangeState::Sending);
        }
        assert_eq!(console.state(), ExchangeState::Idle);
    }
}
