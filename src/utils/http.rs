// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

use crate::error::{AppError, Result};
use crate::models::BackendConfig;

const USER_AGENT: &str = concat!("ebd-ingest/", env!("CARGO_PKG_VERSION"));

/// Create an asynchronous client authenticated with the service key.
pub fn create_backend_client(config: &BackendConfig) -> Result<reqwest::Client> {
    let key = config.service_key.trim();
    let mut headers = HeaderMap::new();
    headers.insert("apikey", header_value(key)?);
    headers.insert(AUTHORIZATION, header_value(&format!("Bearer {key}"))?);

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(config.timeout_secs))
        .default_headers(headers)
        .build()?;
    Ok(client)
}

fn header_value(value: &str) -> Result<HeaderValue> {
    let mut header = HeaderValue::from_str(value)
        .map_err(|e| AppError::config(format!("Invalid credential header: {e}")))?;
    header.set_sensitive(true);
    Ok(header)
}
