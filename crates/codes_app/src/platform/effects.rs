use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use chrono::Utc;
use codes_core::{normalize, AppError, Effect, Msg, TransportFailure, COPY_FEEDBACK_MS};
use codes_engine::{EngineEvent, EngineHandle, FailureKind, FetchSettings, TransportError};
use codes_logging::{codes_info, codes_warn};

use super::persistence::save_settings;

/// Request id for connection checks, which bypass the state machine.
const CHECK_REQUEST_ID: u64 = 0;

/// Executes core effects against the engine, the filesystem and timers.
pub struct EffectRunner {
    engine: EngineHandle,
    msg_tx: mpsc::Sender<Msg>,
    state_dir: PathBuf,
    auto_refresh: bool,
    timer_generation: Arc<AtomicU64>,
}

impl EffectRunner {
    /// `auto_refresh` is false for one-shot commands, which ignore the timer.
    pub fn new(msg_tx: mpsc::Sender<Msg>, state_dir: PathBuf, auto_refresh: bool) -> Self {
        Self::with_engine(
            EngineHandle::new(FetchSettings::default()),
            msg_tx,
            state_dir,
            auto_refresh,
        )
    }

    pub fn with_engine(
        engine: EngineHandle,
        msg_tx: mpsc::Sender<Msg>,
        state_dir: PathBuf,
        auto_refresh: bool,
    ) -> Self {
        Self {
            engine,
            msg_tx,
            state_dir,
            auto_refresh,
            timer_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchCodes { request_id, url } => {
                    codes_info!("FetchCodes request_id={} url={}", request_id, url);
                    self.engine.fetch(request_id, url);
                }
                Effect::DeleteAll { url } => {
                    codes_info!("DeleteAll url={}", url);
                    self.engine.delete_all(url);
                }
                Effect::PersistSettings(settings) => {
                    save_settings(&self.state_dir, &settings);
                }
                Effect::ScheduleAutoRefresh { interval_secs } => {
                    if self.auto_refresh {
                        self.schedule_auto_refresh(interval_secs);
                    }
                }
                Effect::CopyToClipboard { id, code } => {
                    self.emit_code(&code);
                    self.schedule_copy_feedback(id);
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine event.
    pub fn next_engine_msg(&self, timeout: Duration) -> Option<Msg> {
        self.engine.recv_timeout(timeout).map(map_event)
    }

    /// Runs one call against `url` and waits for it, outside the state machine.
    /// Checking a delete URL performs a real bulk delete.
    pub fn check_connection(
        &self,
        url: &str,
        delete: bool,
        timeout: Duration,
    ) -> anyhow::Result<String> {
        if delete {
            self.engine.delete_all(url);
        } else {
            self.engine.fetch(CHECK_REQUEST_ID, url);
        }
        let event = self
            .engine
            .recv_timeout(timeout)
            .ok_or_else(|| anyhow!("no answer within {}s", timeout.as_secs()))?;

        match event {
            EngineEvent::FetchCompleted { result, .. } => {
                let payload = result.map_err(|err| AppError::from(map_failure(err)))?;
                let records = normalize(&payload).map_err(AppError::from)?;
                codes_info!("connection check on {} passed", url);
                Ok(format!("endpoint OK, {} code(s)", records.len()))
            }
            EngineEvent::DeleteCompleted { result } => {
                result.map_err(|err| AppError::DeleteFailed(map_failure(err)))?;
                codes_info!("delete check on {} passed", url);
                Ok("delete endpoint OK".to_string())
            }
        }
    }

    /// Replaces any running timer. Older timers see a stale generation and exit.
    fn schedule_auto_refresh(&self, interval_secs: u32) {
        let generation = self.timer_generation.fetch_add(1, Ordering::SeqCst) + 1;
        if interval_secs == 0 {
            codes_info!("auto-refresh disabled");
            return;
        }
        codes_info!("auto-refresh every {}s", interval_secs);

        let current = self.timer_generation.clone();
        let msg_tx = self.msg_tx.clone();
        let interval = Duration::from_secs(u64::from(interval_secs));
        thread::spawn(move || loop {
            thread::sleep(interval);
            if current.load(Ordering::SeqCst) != generation {
                break;
            }
            if msg_tx.send(Msg::AutoRefreshFired).is_err() {
                break;
            }
        });
    }

    fn schedule_copy_feedback(&self, id: String) {
        let msg_tx = self.msg_tx.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(COPY_FEEDBACK_MS));
            let _ = msg_tx.send(Msg::CopyFeedbackExpired { id });
        });
    }

    /// The terminal's clipboard is stdout: `codes copy | pbcopy`.
    fn emit_code(&self, code: &str) {
        let mut stdout = std::io::stdout().lock();
        if let Err(err) = writeln!(stdout, "{code}").and_then(|_| stdout.flush()) {
            codes_warn!("Failed to write code to stdout: {}", err);
        }
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::FetchCompleted { request_id, result } => Msg::FetchCompleted {
            request_id,
            received_at_ms: Utc::now().timestamp_millis(),
            result: result.map_err(map_failure),
        },
        EngineEvent::DeleteCompleted { result } => Msg::DeleteCompleted {
            result: result.map_err(map_failure),
        },
    }
}

fn map_failure(error: TransportError) -> TransportFailure {
    match error.kind {
        FailureKind::EmptyUrl => TransportFailure::EmptyUrl,
        FailureKind::InvalidUrl => TransportFailure::InvalidUrl(error.message),
        FailureKind::HttpStatus(status) => TransportFailure::HttpStatus { status },
        FailureKind::Timeout => TransportFailure::Timeout,
        FailureKind::TooLarge { .. } => TransportFailure::TooLarge,
        FailureKind::InvalidBody => TransportFailure::InvalidBody(error.message),
        FailureKind::Network => TransportFailure::Network(error.message),
        FailureKind::Unknown => TransportFailure::Unknown(error.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn error(kind: FailureKind, message: &str) -> TransportError {
        TransportError {
            kind,
            message: message.to_string(),
        }
    }

    fn check_all(base: String) -> Vec<Result<String, String>> {
        let dir = tempfile::tempdir().unwrap();
        let (msg_tx, _msg_rx) = mpsc::channel();
        let runner = EffectRunner::new(msg_tx, dir.path().to_path_buf(), false);
        let timeout = Duration::from_secs(10);
        [
            ("/codes", false),
            ("/broken", false),
            ("/unknown-shape", false),
            ("/delete", true),
        ]
        .into_iter()
        .map(|(route, delete)| {
            runner
                .check_connection(&format!("{base}{route}"), delete, timeout)
                .map_err(|err| err.to_string())
        })
        .collect()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn connection_check_reports_codes_or_the_banner_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/codes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "emails": [{
                    "id": "e1",
                    "to": "me@example.com",
                    "hasVerificationCode": true,
                    "verificationCode": "482913"
                }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/unknown-shape"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "foo": "bar" })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/delete"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let base = server.uri();
        let outcomes = tokio::task::spawn_blocking(move || check_all(base))
            .await
            .unwrap();

        assert_eq!(
            outcomes,
            vec![
                Ok("endpoint OK, 1 code(s)".to_string()),
                Err("server returned HTTP 503".to_string()),
                Err("unrecognized response format".to_string()),
                Ok("delete endpoint OK".to_string()),
            ]
        );
    }

    #[test]
    fn failure_kinds_map_onto_core_failures() {
        assert_eq!(
            map_failure(error(FailureKind::HttpStatus(502), "bad gateway")),
            TransportFailure::HttpStatus { status: 502 }
        );
        assert_eq!(
            map_failure(error(FailureKind::Timeout, "slow")),
            TransportFailure::Timeout
        );
        assert_eq!(
            map_failure(error(FailureKind::Network, "refused")),
            TransportFailure::Network("refused".to_string())
        );
        assert_eq!(
            map_failure(error(
                FailureKind::TooLarge {
                    max_bytes: 10,
                    actual: Some(11)
                },
                "big"
            )),
            TransportFailure::TooLarge
        );
        assert_eq!(
            map_failure(error(FailureKind::EmptyUrl, "")),
            TransportFailure::EmptyUrl
        );
    }

    #[test]
    fn fetch_event_carries_payload_and_timestamp() {
        let before = Utc::now().timestamp_millis();
        let msg = map_event(EngineEvent::FetchCompleted {
            request_id: 4,
            result: Ok(json!([])),
        });

        match msg {
            Msg::FetchCompleted {
                request_id,
                received_at_ms,
                result,
            } => {
                assert_eq!(request_id, 4);
                assert!(received_at_ms >= before);
                assert_eq!(result, Ok(json!([])));
            }
            other => panic!("unexpected msg {other:?}"),
        }
    }

    #[test]
    fn delete_failure_maps_through() {
        let msg = map_event(EngineEvent::DeleteCompleted {
            result: Err(error(FailureKind::HttpStatus(500), "")),
        });
        assert_eq!(
            msg,
            Msg::DeleteCompleted {
                result: Err(TransportFailure::HttpStatus { status: 500 })
            }
        );
    }
}
