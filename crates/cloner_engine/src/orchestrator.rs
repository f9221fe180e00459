use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;

use cloner_logging::{clone_debug, clone_info, clone_warn};

use crate::sanitize::sanitize;
use crate::scrape::ScrapeClient;
use crate::transform::Transformer;
use crate::types::{
    CloneError, CloneResult, EngineEvent, ProgressEvent, RunId, RunPhase, ScrapeOptions,
};

/// Observer for per-run progress events.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Forwards progress into an engine event channel.
pub struct ChannelProgressSink {
    run_id: RunId,
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(run_id: RunId, tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { run_id, tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: ProgressEvent) {
        let _ = self.tx.send(EngineEvent::Progress {
            run_id: self.run_id,
            event,
        });
    }
}

/// Drives Scrape -> Transform -> Sanitize -> Complete for one URL at a time.
///
/// The transformer strategy is fixed at construction. The only state shared
/// between runs is the in-flight flag.
pub struct CloneOrchestrator {
    scraper: ScrapeClient,
    transformer: Box<dyn Transformer>,
    options: ScrapeOptions,
    in_flight: AtomicBool,
}

impl CloneOrchestrator {
    pub fn new(scraper: ScrapeClient, transformer: Box<dyn Transformer>) -> Self {
        Self::with_options(scraper, transformer, ScrapeOptions::default())
    }

    pub fn with_options(
        scraper: ScrapeClient,
        transformer: Box<dyn Transformer>,
        options: ScrapeOptions,
    ) -> Self {
        Self {
            scraper,
            transformer,
            options,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Runs the full pipeline for `url`, emitting progress on `sink`.
    ///
    /// At most one run per instance may be active; a concurrent call fails
    /// with [`CloneError::Busy`] without touching the active run. Dropping
    /// the returned future aborts the outstanding request and releases the
    /// in-flight flag.
    pub async fn run(
        &self,
        url: &str,
        sink: &dyn ProgressSink,
    ) -> Result<CloneResult, CloneError> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            clone_warn!("Rejected clone of {url}: another run is in flight");
            return Err(CloneError::Busy);
        }
        let _guard = InFlightGuard(&self.in_flight);
        self.run_pipeline(url, sink).await
    }

    async fn run_pipeline(
        &self,
        url: &str,
        sink: &dyn ProgressSink,
    ) -> Result<CloneResult, CloneError> {
        let phase = enter(RunPhase::Idle, RunPhase::Scraping, sink);
        let scraped = match self.scraper.scrape(url, &self.options).await {
            Ok(scraped) => scraped,
            Err(err) => return Err(fail(phase, err)),
        };

        let phase = enter(phase, RunPhase::Transforming, sink);
        let transformed = match self.transformer.transform(&scraped).await {
            Ok(html) => html,
            Err(err) => return Err(fail(phase, err)),
        };

        let phase = enter(phase, RunPhase::Sanitizing, sink);
        let html = sanitize(&transformed);

        enter(phase, RunPhase::Complete, sink);
        clone_info!(
            "Cloned {} ({} bytes, backend took {:.0} ms)",
            scraped.url,
            html.len(),
            scraped.processing_time_ms
        );

        Ok(CloneResult {
            html,
            original_url: url.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            screenshot: scraped.screenshot,
            processing_time_ms: Some(scraped.processing_time_ms),
        })
    }
}

fn enter(from: RunPhase, to: RunPhase, sink: &dyn ProgressSink) -> RunPhase {
    clone_debug!("clone phase {from:?} -> {to:?}");
    if let Some(stage) = to.stage() {
        sink.emit(ProgressEvent::at(stage));
    }
    to
}

// A failed stage stops all emission; the error itself propagates unchanged.
fn fail(phase: RunPhase, err: CloneError) -> CloneError {
    clone_debug!("clone phase {phase:?} -> {:?}", RunPhase::Failed);
    clone_warn!("Clone failed during {phase:?}: {err}");
    err
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
