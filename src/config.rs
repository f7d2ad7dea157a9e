use std::env;

use anyhow::{Context, Result};

/// Connection settings for a Kimai instance.
///
/// Built once at process start and passed by reference to the client;
/// nothing in the crate reads the environment after this point.
#[derive(Clone, Debug)]
pub struct KimaiConfig {
    pub base_url: String,
    pub api_token: String,
}

const DEFAULT_BASE_URL: &str = "http://localhost:8001";

impl KimaiConfig {
    /// Reads the configuration from `KIMAI_BASE_URL` and `KIMAI_API_TOKEN`.
    ///
    /// `KIMAI_API_TOKEN` must be set; the base URL falls back to a local
    /// default when absent. A trailing slash on the base URL is stripped.
    pub fn from_env() -> Result<Self> {
        let api_token = env::var("KIMAI_API_TOKEN").context("KIMAI_API_TOKEN must be set")?;
        let base_url = env::var("KIMAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }

    pub fn new(base_url: &str, api_token: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
        }
    }
}
