use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::{CloneError, ScrapeOptions, ScrapeResult};

/// Connection settings for the scraping backend.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Serialize)]
struct ScrapeRequestBody<'a> {
    url: &'a str,
    #[serde(flatten)]
    options: &'a ScrapeOptions,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

/// HTTP client for the remote scrape endpoint. Exactly one attempt per call,
/// no retries.
#[derive(Debug, Clone)]
pub struct ScrapeClient {
    settings: BackendSettings,
    http: reqwest::Client,
}

impl ScrapeClient {
    pub fn new(settings: BackendSettings) -> Result<Self, CloneError> {
        let http = build_http_client(&settings)?;
        Ok(Self { settings, http })
    }

    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    /// Scrapes `url` through the backend. The URL must parse as an absolute
    /// URL with a scheme; anything else fails before any request is issued.
    pub async fn scrape(
        &self,
        url: &str,
        options: &ScrapeOptions,
    ) -> Result<ScrapeResult, CloneError> {
        Url::parse(url).map_err(|err| CloneError::Validation(err.to_string()))?;

        let endpoint = format!("{}/scrape", self.settings.base_url);
        let response = self
            .http
            .post(&endpoint)
            .json(&ScrapeRequestBody { url, options })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CloneError::Remote {
                status: status.as_u16(),
                detail: error_detail(response).await,
            });
        }

        let result: ScrapeResult = response.json().await.map_err(map_reqwest_error)?;
        if result.status != "success" {
            return Err(CloneError::ScrapeFailed {
                status: result.status,
            });
        }
        Ok(result)
    }
}

pub(crate) fn build_http_client(settings: &BackendSettings) -> Result<reqwest::Client, CloneError> {
    reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .build()
        .map_err(|err| CloneError::Network(err.to_string()))
}

/// Extract the remote `detail` message from a non-2xx body, falling back to
/// the HTTP status text.
pub(crate) async fn error_detail(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ErrorBody>().await {
        Ok(body) => body.detail,
        Err(_) => status.to_string(),
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> CloneError {
    if err.is_timeout() {
        return CloneError::Timeout(err.to_string());
    }
    CloneError::Network(err.to_string())
}
