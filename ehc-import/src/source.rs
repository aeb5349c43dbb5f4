//! Load CSV content from a local path or an HTTP(S) URL

use std::time::Duration;

use ehc_common::retry::{fetch_text_with_retry, RetryPolicy};
use ehc_common::Result;
use tracing::info;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Read `source` as text; URLs are fetched with transient-error retry
pub async fn load_source(source: &str) -> Result<String> {
    if is_url(source) {
        info!("Fetching {}", source);
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        fetch_text_with_retry(&client, source, RetryPolicy::default()).await
    } else {
        info!("Reading {}", source);
        Ok(tokio::fs::read_to_string(source).await?)
    }
}
