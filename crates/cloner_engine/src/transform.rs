use serde::{Deserialize, Serialize};

use crate::scrape::{build_http_client, error_detail, map_reqwest_error, BackendSettings};
use crate::types::{AssetEntry, CloneError, ScrapeResult, StyleEntry};

/// Strategy turning a scrape result into clone markup. Selected once when the
/// orchestrator is constructed, never branched per call.
#[async_trait::async_trait]
pub trait Transformer: Send + Sync {
    async fn transform(&self, scrape: &ScrapeResult) -> Result<String, CloneError>;
}

/// Default strategy: hand the scraped markup straight to the sanitizer.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughTransformer;

#[async_trait::async_trait]
impl Transformer for PassthroughTransformer {
    async fn transform(&self, scrape: &ScrapeResult) -> Result<String, CloneError> {
        Ok(scrape.html.clone())
    }
}

#[derive(Serialize)]
struct CloneRequestBody<'a> {
    context: CloneContext<'a>,
}

#[derive(Serialize)]
struct CloneContext<'a> {
    url: &'a str,
    title: &'a str,
    html: &'a str,
    styles: &'a [StyleEntry],
    assets: &'a [AssetEntry],
    meta_data: &'a serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dom_structure: Option<&'a serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    screenshot: Option<&'a str>,
}

#[derive(Deserialize)]
struct CloneResponseBody {
    cloned_html: String,
}

/// Delegates markup generation to the remote AI endpoint.
#[derive(Debug, Clone)]
pub struct RemoteAiTransformer {
    settings: BackendSettings,
    http: reqwest::Client,
}

impl RemoteAiTransformer {
    pub fn new(settings: BackendSettings) -> Result<Self, CloneError> {
        let http = build_http_client(&settings)?;
        Ok(Self { settings, http })
    }
}

#[async_trait::async_trait]
impl Transformer for RemoteAiTransformer {
    async fn transform(&self, scrape: &ScrapeResult) -> Result<String, CloneError> {
        let endpoint = format!("{}/clone", self.settings.base_url);
        let response = self
            .http
            .post(&endpoint)
            .json(&CloneRequestBody {
                context: CloneContext {
                    url: &scrape.url,
                    title: &scrape.title,
                    html: &scrape.html,
                    styles: &scrape.styles,
                    assets: &scrape.assets,
                    meta_data: &scrape.metadata,
                    dom_structure: scrape.dom_structure.as_ref(),
                    screenshot: scrape.screenshot.as_deref(),
                },
            })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CloneError::Transform {
                status: status.as_u16(),
                detail: error_detail(response).await,
            });
        }

        let body: CloneResponseBody = response.json().await.map_err(map_reqwest_error)?;
        Ok(body.cloned_html)
    }
}
