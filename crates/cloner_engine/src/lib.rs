//! Cloner engine: clone pipeline orchestration and backend IO.
mod engine;
mod scrape;
mod transform;
mod sanitize;
mod orchestrator;
mod health;
mod present;
mod types;

pub use engine::CloneHandle;
pub use health::HealthChecker;
pub use orchestrator::{ChannelProgressSink, CloneOrchestrator, ProgressSink};
pub use present::{
    ensure_output_dir, ClipboardSink, HtmlDownload, Osc52Clipboard, PresentError,
    DEFAULT_DOWNLOAD_FILENAME,
};
pub use sanitize::sanitize;
pub use scrape::{BackendSettings, ScrapeClient};
pub use transform::{PassthroughTransformer, RemoteAiTransformer, Transformer};
pub use types::{
    AssetEntry, AssetKind, CloneError, CloneResult, EngineEvent, ProgressEvent, RunId, RunPhase,
    ScrapeOptions, ScrapeResult, Stage, StyleEntry, StyleKind,
};
