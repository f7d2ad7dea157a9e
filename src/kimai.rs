use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
#[cfg(test)]
use mockall::automock;
use reqwest::{
    header::{ACCEPT, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::KimaiConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Failure modes of a single Kimai API round trip.
///
/// Every call resolves to the parsed response body or exactly one of these;
/// nothing is retried and no error escapes untagged.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error(
        "Kimai API error ({code}): {detail}. Please check your request parameters and try again."
    )]
    Status { code: u16, detail: String },

    /// The request never completed: connection refused, DNS failure or timeout.
    #[error(
        "Network error connecting to Kimai: {detail}. Please verify the Kimai instance URL ({base_url}) is correct and accessible."
    )]
    Network { detail: String, base_url: String },

    /// A success status carried a body that is not valid JSON.
    #[error("Failed to decode Kimai response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The one operation handlers need from the Kimai API.
///
/// Kept as a trait so handler tests can substitute a mock instead of a
/// live HTTP endpoint.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KimaiApi: Send + Sync {
    /// Performs one HTTP request against the configured instance.
    ///
    /// # Arguments
    ///
    /// * `method` - HTTP method (GET, POST, PATCH, DELETE)
    /// * `path` - resource path relative to the `/api/` prefix, e.g. `timesheets`
    /// * `params` - query parameters; boolean values must already be `"1"`/`"0"`
    /// * `body` - JSON body for POST/PATCH
    async fn request(
        &self,
        method: Method,
        path: &str,
        params: Vec<(String, String)>,
        body: Option<Value>,
    ) -> Result<Value, ApiError>;
}

/// HTTP client for the Kimai API.
///
/// # Examples
///
/// ```ignore
/// let client = KimaiClient::new(&config);
/// let timesheets = client.request(Method::GET, "timesheets", vec![], None).await?;
/// ```
pub struct KimaiClient {
    client: Client,
    base_url: String,
    api_token: String,
}

impl KimaiClient {
    /// Returns a new `KimaiClient` for the given instance configuration.
    pub fn new(config: &KimaiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_token: config.api_token.clone(),
        })
    }

    fn network_error(&self, err: reqwest::Error) -> ApiError {
        ApiError::Network {
            detail: err.to_string(),
            base_url: self.base_url.clone(),
        }
    }
}

#[async_trait]
impl KimaiApi for KimaiClient {
    async fn request(
        &self,
        method: Method,
        path: &str,
        params: Vec<(String, String)>,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let url = format!("{}/api/{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method, &url)
            .bearer_auth(&self.api_token)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");
        if !params.is_empty() {
            request = request.query(&params);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|err| self.network_error(err))?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            // Kimai error bodies usually carry a "message" field; fall back
            // to the raw body when they do not.
            let detail = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|data| {
                    data.get("message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or(text);
            return Err(ApiError::Status {
                code: status.as_u16(),
                detail,
            });
        }

        // DELETE and some PATCH calls answer 204 with no body.
        if status == StatusCode::NO_CONTENT {
            return Ok(json!({"success": true}));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|err| self.network_error(err))?;
        if bytes.is_empty() {
            return Ok(json!({"success": true}));
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}
