use serde::{Deserialize, Serialize};

pub type RunId = u64;

/// Pipeline stages that emit progress, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Scraping,
    Transforming,
    Sanitizing,
    Complete,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Scraping => "Scraping website...",
            Stage::Transforming => "Processing with AI...",
            Stage::Sanitizing => "Generating HTML...",
            Stage::Complete => "Complete!",
        }
    }

    pub fn percent(self) -> u8 {
        match self {
            Stage::Scraping => 33,
            Stage::Transforming => 66,
            Stage::Sanitizing => 90,
            Stage::Complete => 100,
        }
    }
}

/// One progress emission. Percent values are non-decreasing within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub stage: Stage,
    pub percent: u8,
}

impl ProgressEvent {
    pub(crate) fn at(stage: Stage) -> Self {
        Self {
            stage,
            percent: stage.percent(),
        }
    }
}

/// Orchestrator state machine. `Complete` and `Failed` are terminal; `Failed`
/// is reachable from any non-terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Scraping,
    Transforming,
    Sanitizing,
    Complete,
    Failed,
}

impl RunPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunPhase::Complete | RunPhase::Failed)
    }

    /// The progress stage announced on entering this phase, if any.
    pub fn stage(self) -> Option<Stage> {
        match self {
            RunPhase::Scraping => Some(Stage::Scraping),
            RunPhase::Transforming => Some(Stage::Transforming),
            RunPhase::Sanitizing => Some(Stage::Sanitizing),
            RunPhase::Complete => Some(Stage::Complete),
            RunPhase::Idle | RunPhase::Failed => None,
        }
    }
}

/// Events delivered by the background engine to its caller.
#[derive(Debug)]
pub enum EngineEvent {
    Progress {
        run_id: RunId,
        event: ProgressEvent,
    },
    RunCompleted {
        run_id: RunId,
        result: Result<CloneResult, CloneError>,
    },
    HealthChecked {
        healthy: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CloneError {
    #[error("invalid url: {0}")]
    Validation(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("Scraping failed: {detail} (status {status})")]
    Remote { status: u16, detail: String },
    #[error("Scraping failed: {status}")]
    ScrapeFailed { status: String },
    #[error("AI processing failed: {detail} (status {status})")]
    Transform { status: u16, detail: String },
    #[error("a clone run is already in progress")]
    Busy,
}

/// Options sent with every scrape request. Field names follow the wire
/// contract except `timeout`, which carries a unit suffix on this side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeOptions {
    pub include_screenshot: bool,
    pub include_dom: bool,
    pub include_assets: bool,
    pub include_styles: bool,
    #[serde(rename = "timeout")]
    pub timeout_secs: u64,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            include_screenshot: true,
            include_dom: true,
            include_assets: true,
            include_styles: true,
            timeout_secs: 30,
            viewport_width: 1920,
            viewport_height: 1080,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleKind {
    External,
    Inline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleEntry {
    #[serde(rename = "type")]
    pub kind: StyleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(rename = "rules", default)]
    pub rule_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    Image,
    BackgroundImage,
    Font,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetEntry {
    #[serde(rename = "type")]
    pub kind: AssetKind,
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
}

/// Payload returned by the remote scraping service. Never mutated after
/// deserialization; the pipeline only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub url: String,
    pub title: String,
    pub html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    #[serde(default)]
    pub styles: Vec<StyleEntry>,
    #[serde(default)]
    pub assets: Vec<AssetEntry>,
    #[serde(rename = "meta_data", default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dom_structure: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_context: Option<serde_json::Value>,
    pub status: String,
    #[serde(rename = "processing_time")]
    pub processing_time_ms: f64,
}

/// Final pipeline output handed to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct CloneResult {
    pub html: String,
    pub original_url: String,
    /// RFC 3339 creation timestamp.
    pub timestamp: String,
    pub screenshot: Option<String>,
    pub processing_time_ms: Option<f64>,
}
