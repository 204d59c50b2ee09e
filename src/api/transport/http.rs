use super::{Backend, Reply};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Url};
use std::time::Duration;
use tracing::debug;

/// Talks to the device web server.
///
/// The cookie store keeps whatever session the device hands out, the way a
/// browser would for same-origin requests.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()?;
        Ok(Self { client })
    }
}

impl Backend for HttpBackend {
    async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<String>,
    ) -> Result<Reply, String> {
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }
        let response = request.send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        let body = response.text().await.map_err(|e| e.to_string())?;
        debug!("HTTP {} ({} bytes)", status, body.len());
        Ok(Reply { status, body })
    }
}
