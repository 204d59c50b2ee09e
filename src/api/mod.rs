//! Same-origin JSON requests against the device REST API.
//!
//! Every request ends in an [`Outcome`]; nothing is raised past this module.
//! Notifications are emitted here so callers only decide what to do next.

pub mod transport;

use crate::notify::Notifier;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use transport::{Backend, Reply};

pub const GENERIC_SUCCESS: &str = "Request succeeded!";

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// 2xx with its parsed JSON body (`null` when the body was empty)
    Ok(Value),

    /// Non-2xx. `message` comes from the body's `error` field when there is one
    ServerError {
        status: StatusCode,
        message: String,
        payload: Value,
    },

    /// No usable reply: the request never made it or the reply was unreadable
    TransportError(String),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("request failed: {0}")]
    Failed(String),

    #[error("unexpected payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    /// The JSON the device sent back, error payloads included
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Outcome::Ok(payload) => Some(payload),
            Outcome::ServerError { payload, .. } => Some(payload),
            Outcome::TransportError(_) => None,
        }
    }

    pub fn decode<T: DeserializeOwned>(self) -> Result<T, DecodeError> {
        match self {
            Outcome::Ok(payload) => Ok(serde_json::from_value(payload)?),
            Outcome::ServerError { message, .. } => Err(DecodeError::Failed(message)),
            Outcome::TransportError(message) => Err(DecodeError::Failed(message)),
        }
    }

    fn classify(reply: Reply) -> Self {
        if reply.status.is_success() {
            if reply.body.trim().is_empty() {
                return Outcome::Ok(Value::Null);
            }
            return match serde_json::from_str(&reply.body) {
                Ok(payload) => Outcome::Ok(payload),
                Err(e) => Outcome::TransportError(format!("unreadable reply: {e}")),
            };
        }
        let payload: Value = serde_json::from_str(&reply.body).unwrap_or(Value::Null);
        let message = match payload.get("error") {
            Some(Value::String(s)) => s.clone(),
            Some(other) if !other.is_null() => other.to_string(),
            _ => reply
                .status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        };
        Outcome::ServerError {
            status: reply.status,
            message,
            payload,
        }
    }
}

/// What to send and what to tell the operator about it
#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    init_message: Option<String>,
    success_message: Option<String>,
    quiet: bool,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            init_message: None,
            success_message: None,
            quiet: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Shown as an info notification before the request goes out
    pub fn init_message(mut self, message: impl Into<String>) -> Self {
        self.init_message = Some(message.into());
        self
    }

    pub fn success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }

    /// No success notification. Errors are still reported.
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }
}

pub struct Client<B> {
    base: String,
    backend: B,
    notifier: Arc<dyn Notifier>,
}

impl<B: Backend> Client<B> {
    /// `base` is the API root without trailing slash
    pub fn new(base: &str, backend: B, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            backend,
            notifier,
        }
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn url_for(&self, request: &Request) -> Result<Url, String> {
        let raw = format!("{}/{}", self.base, request.path.trim_start_matches('/'));
        let mut url = Url::parse(&raw).map_err(|e| format!("{raw}: {e}"))?;
        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in request.query.iter() {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    pub async fn send(&self, request: Request) -> Outcome {
        if let Some(message) = &request.init_message {
            self.notifier.info(message);
        }
        let outcome = match self.url_for(&request) {
            Ok(url) => {
                debug!("{} {}", request.method, url);
                let body = request.body.as_ref().map(Value::to_string);
                match self.backend.execute(request.method.clone(), url, body).await {
                    Ok(reply) => Outcome::classify(reply),
                    Err(message) => Outcome::TransportError(message),
                }
            }
            Err(message) => Outcome::TransportError(message),
        };
        match &outcome {
            Outcome::Ok(_) => {
                debug!("{} /{} succeeded", request.method, request.path);
                if !request.quiet {
                    let message = request.success_message.as_deref().unwrap_or(GENERIC_SUCCESS);
                    self.notifier.success(message);
                }
            }
            Outcome::ServerError {
                status, message, ..
            } => {
                warn!("{} /{} -> {}: {}", request.method, request.path, status, message);
                self.notifier.error(&format!("error: {message}"));
            }
            Outcome::TransportError(message) => {
                warn!("{} /{} failed: {}", request.method, request.path, message);
                self.notifier.error(&format!("error: {message}"));
            }
        }
        outcome
    }
}
