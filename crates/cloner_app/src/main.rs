//! Command-line shell for the website cloner.
mod logging;

use std::path::PathBuf;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use clap::Parser;
use cloner_engine::{
    BackendSettings, ClipboardSink, CloneHandle, CloneOrchestrator, CloneResult, EngineEvent,
    HealthChecker, HtmlDownload, Osc52Clipboard, PassthroughTransformer, RemoteAiTransformer,
    ScrapeClient, ScrapeOptions, Transformer, DEFAULT_DOWNLOAD_FILENAME,
};
use cloner_logging::{clone_info, clone_warn};

#[derive(Debug, Parser)]
#[command(
    name = "cloner",
    version,
    about = "Clone a website into a single downloadable HTML file"
)]
struct Cli {
    /// URL of the page to clone.
    #[arg(value_name = "URL")]
    url: String,

    /// Backend host serving the scrape and clone endpoints.
    #[arg(long, value_name = "URL", default_value = "http://localhost:8000")]
    backend_url: String,

    /// Directory the cloned HTML is written into.
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Output filename.
    #[arg(long, value_name = "FILE", default_value = DEFAULT_DOWNLOAD_FILENAME)]
    filename: String,

    /// Rebuild the markup with the remote AI endpoint instead of passing the
    /// scraped HTML through unchanged.
    #[arg(long, default_value_t = false)]
    ai: bool,

    /// Seconds the backend may spend rendering the page.
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Skip the full-page screenshot.
    #[arg(long, default_value_t = false)]
    no_screenshot: bool,

    /// Also copy the cloned HTML to the clipboard (OSC 52).
    #[arg(long, default_value_t = false)]
    copy: bool,

    /// Write logs to ./cloner.log in addition to the terminal.
    #[arg(long, default_value_t = false)]
    log_file: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::initialize(if cli.log_file {
        logging::LogDestination::Both
    } else {
        logging::LogDestination::Terminal
    });

    let settings = BackendSettings {
        base_url: cli.backend_url.trim_end_matches('/').to_string(),
        ..BackendSettings::default()
    };

    let scraper = ScrapeClient::new(settings.clone())?;
    let transformer: Box<dyn Transformer> = if cli.ai {
        Box::new(RemoteAiTransformer::new(settings.clone())?)
    } else {
        Box::new(PassthroughTransformer)
    };
    let options = ScrapeOptions {
        include_screenshot: !cli.no_screenshot,
        timeout_secs: cli.timeout_secs,
        ..ScrapeOptions::default()
    };
    let orchestrator = CloneOrchestrator::with_options(scraper, transformer, options);
    let checker = HealthChecker::new(settings);

    let handle = CloneHandle::new(orchestrator, checker);
    handle.probe_health();
    handle.enqueue(1, cli.url.as_str());

    let clone = pump_events(&handle)??;

    let download = HtmlDownload::new(cli.output_dir);
    let path = download.save(&clone.html, &cli.filename)?;
    clone_info!("Saved clone of {} to {}", clone.original_url, path.display());

    if cli.copy {
        let mut clipboard = Osc52Clipboard::stdout();
        clipboard.set_text(&clone.html)?;
        clone_info!("Copied {} bytes to the clipboard", clone.html.len());
    }

    Ok(())
}

/// Drain engine events until the run completes, printing progress along the
/// way.
fn pump_events(
    handle: &CloneHandle,
) -> anyhow::Result<Result<CloneResult, cloner_engine::CloneError>> {
    loop {
        match handle.recv_timeout(Duration::from_millis(250)) {
            Ok(EngineEvent::Progress { event, .. }) => {
                clone_info!("[{:>3}%] {}", event.percent, event.stage.label());
            }
            Ok(EngineEvent::HealthChecked { healthy: true }) => {}
            Ok(EngineEvent::HealthChecked { healthy: false }) => {
                clone_warn!("Backend health probe failed; attempting the clone anyway");
            }
            Ok(EngineEvent::RunCompleted { result, .. }) => return Ok(result),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                anyhow::bail!("engine thread terminated unexpectedly")
            }
        }
    }
}
