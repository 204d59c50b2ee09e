pub mod http;

pub use http::HttpBackend;

use reqwest::{Method, StatusCode, Url};
use std::future::Future;

/// Raw result of one HTTP exchange
#[derive(Clone, Debug, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

impl Reply {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Carries a single request to the device.
///
/// `Err` means no reply was received at all (connection refused, timeout...).
/// Any status code, 2xx or not, is an `Ok(Reply)`.
pub trait Backend: Send + Sync {
    fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<String>,
    ) -> impl Future<Output = Result<Reply, String>> + Send;
}
