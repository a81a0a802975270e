use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use codes_logging::{codes_error, codes_info};

use crate::transport::{FetchSettings, ReqwestTransport, Transport};
use crate::{EngineEvent, RequestId};

enum EngineCommand {
    Fetch { request_id: RequestId, url: String },
    DeleteAll { url: String },
}

/// Runs transport calls on a background tokio runtime.
///
/// Commands are not deduplicated; each one runs to completion or timeout,
/// and events arrive in completion order.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: FetchSettings) -> Self {
        Self::with_transport(Arc::new(ReqwestTransport::new(settings)))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    codes_error!("failed to start engine runtime: {}", err);
                    return;
                }
            };
            while let Ok(command) = cmd_rx.recv() {
                let transport = transport.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(transport.as_ref(), command, event_tx).await;
                });
            }
            // Let in-flight calls finish before the runtime drops.
            runtime.shutdown_timeout(Duration::from_secs(1));
        });

        Self { cmd_tx, event_rx }
    }

    pub fn fetch(&self, request_id: RequestId, url: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Fetch {
            request_id,
            url: url.into(),
        });
    }

    pub fn delete_all(&self, url: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::DeleteAll { url: url.into() });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

async fn handle_command(
    transport: &dyn Transport,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Fetch { request_id, url } => {
            codes_info!("fetch {} started", request_id);
            let result = transport.fetch_json(&url).await;
            let _ = event_tx.send(EngineEvent::FetchCompleted { request_id, result });
        }
        EngineCommand::DeleteAll { url } => {
            codes_info!("bulk delete started");
            let result = transport.post_delete(&url).await;
            let _ = event_tx.send(EngineEvent::DeleteCompleted { result });
        }
    }
}
