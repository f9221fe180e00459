use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use crate::health::HealthChecker;
use crate::orchestrator::{ChannelProgressSink, CloneOrchestrator};
use crate::types::{EngineEvent, RunId};

enum EngineCommand {
    Clone { run_id: RunId, url: String },
    ProbeHealth,
}

/// Runs the orchestrator on a dedicated thread so an interactive caller can
/// keep polling for events while a clone is in flight.
pub struct CloneHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl CloneHandle {
    pub fn new(orchestrator: CloneOrchestrator, checker: HealthChecker) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let orchestrator = Arc::new(orchestrator);
        let checker = Arc::new(checker);

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            while let Ok(command) = cmd_rx.recv() {
                let orchestrator = orchestrator.clone();
                let checker = checker.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(&orchestrator, &checker, command, event_tx).await;
                });
            }
        });

        Self { cmd_tx, event_rx }
    }

    /// Queue a clone run. Exactly one `RunCompleted` event is delivered per
    /// enqueued run.
    pub fn enqueue(&self, run_id: RunId, url: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Clone {
            run_id,
            url: url.into(),
        });
    }

    /// Queue a backend liveness probe; answered with `HealthChecked`.
    pub fn probe_health(&self) {
        let _ = self.cmd_tx.send(EngineCommand::ProbeHealth);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<EngineEvent, mpsc::RecvTimeoutError> {
        self.event_rx.recv_timeout(timeout)
    }
}

async fn handle_command(
    orchestrator: &CloneOrchestrator,
    checker: &HealthChecker,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Clone { run_id, url } => {
            let sink = ChannelProgressSink::new(run_id, event_tx.clone());
            let result = orchestrator.run(&url, &sink).await;
            let _ = event_tx.send(EngineEvent::RunCompleted { run_id, result });
        }
        EngineCommand::ProbeHealth => {
            let healthy = checker.check_health().await;
            let _ = event_tx.send(EngineEvent::HealthChecked { healthy });
        }
    }
}
