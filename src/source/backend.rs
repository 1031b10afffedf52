//! HTTP client for the market-agent backend.

use std::time::Duration;

use reqwest::{Client, Response};
use serde_json::Value;

use crate::error::FetchError;

/// Base URL plus a shared connection pool.  Cheap to clone.
#[derive(Debug, Clone)]
pub struct Backend {
    client: Client,
    base_url: String,
}

impl Backend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET `path` and return the body of a successful response.
    pub async fn get_text(&self, path: &str) -> Result<String, FetchError> {
        let resp = self.client.get(self.url(path)).send().await?;
        Ok(check_status(resp).await?.text().await?)
    }

    /// `POST /start_agent` for one headline.
    pub async fn start_agent(&self, headline: &str) -> Result<Value, FetchError> {
        let resp = self
            .client
            .post(self.url("/start_agent"))
            .json(&serde_json::json!({ "market_header": headline }))
            .send()
            .await?;
        decode_json(resp).await
    }

    /// `GET /start?youtube_url=...`: start transcript processing for a stream.
    pub async fn start_processing(&self, youtube_url: &str) -> Result<Value, FetchError> {
        let resp = self
            .client
            .get(self.url("/start"))
            .query(&[("youtube_url", youtube_url)])
            .send()
            .await?;
        decode_json(resp).await
    }
}

async fn check_status(resp: Response) -> Result<Response, FetchError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    // The backend explains refusals ("Agent is already running") in the body.
    let body = resp.text().await.unwrap_or_default();
    Err(FetchError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn decode_json(resp: Response) -> Result<Value, FetchError> {
    let body = check_status(resp).await?.text().await?;
    Ok(serde_json::from_str(&body)?)
}
