use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use codes_core::{update, AppState, Msg, Settings};
use codes_logging::codes_debug;

use super::effects::EffectRunner;
use super::persistence::load_settings;
use super::render::render;

const POLL_INTERVAL: Duration = Duration::from_millis(75);
/// Longer than the engine's request timeout, so a stuck engine still ends the wait.
const ONE_SHOT_DEADLINE: Duration = Duration::from_secs(45);

/// Owns the state machine and feeds it messages from the engine and timers.
pub struct App {
    state: AppState,
    runner: EffectRunner,
    msg_rx: mpsc::Receiver<Msg>,
}

impl App {
    pub fn new(state_dir: PathBuf, auto_refresh: bool) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel();
        let settings = load_settings(&state_dir);
        let runner = EffectRunner::new(msg_tx, state_dir, auto_refresh);
        let mut app = Self {
            state: AppState::new(),
            runner,
            msg_rx,
        };
        app.dispatch(Msg::Tick {
            now_ms: Utc::now().timestamp_millis(),
        });
        app.dispatch(Msg::SettingsLoaded(settings));
        app
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        self.state.settings()
    }

    pub fn dispatch(&mut self, msg: Msg) {
        codes_debug!("dispatch {:?}", msg);
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.enqueue(effects);
    }

    /// Handles whatever arrives within one poll interval.
    pub fn pump(&mut self) {
        if let Some(msg) = self.runner.next_engine_msg(POLL_INTERVAL) {
            self.dispatch(msg);
        }
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.dispatch(msg);
        }
    }

    /// Returns the rendered view when something changed since the last call.
    pub fn take_render(&mut self) -> Option<String> {
        if self.state.consume_dirty() {
            Some(render(&self.state.view()))
        } else {
            None
        }
    }

    /// One fetch, waited on to completion.
    pub fn refresh_once(&mut self) -> Result<()> {
        self.dispatch(Msg::RefreshClicked);
        self.wait_while(AppState::is_loading)?;
        self.banner_as_error()
    }

    /// One bulk delete, waited on to completion.
    pub fn clear_once(&mut self) -> Result<()> {
        if self.settings().delete_url.is_empty() {
            bail!("no delete URL configured; run `codes config set --delete-endpoint <URL>`");
        }
        self.dispatch(Msg::ClearAllClicked);
        self.wait_while(AppState::is_deleting)?;
        self.banner_as_error()
    }

    /// Checks `url` (or the saved one) and saves it when the check passes.
    pub fn test_connection(&mut self, url: Option<String>, delete: bool) -> Result<String> {
        let saved = if delete {
            &self.settings().delete_url
        } else {
            &self.settings().endpoint_url
        };
        let candidate = url
            .map(|url| url.trim().to_string())
            .unwrap_or_else(|| saved.clone());
        if candidate.is_empty() {
            bail!("give a URL to test or save one with `codes config set` first");
        }

        let report = self
            .runner
            .check_connection(&candidate, delete, ONE_SHOT_DEADLINE)?;
        self.dispatch(if delete {
            Msg::DeleteEndpointChanged(candidate)
        } else {
            Msg::EndpointChanged(candidate)
        });
        Ok(report)
    }

    /// Hides codes locally; unknown ids are ignored.
    pub fn dismiss(&mut self, ids: Vec<String>) {
        for id in ids {
            self.dispatch(Msg::DismissCode { id });
        }
    }

    /// Copies `id`, or the newest code when `id` is `None`.
    pub fn copy(&mut self, id: Option<String>) -> Result<()> {
        let id = match id {
            Some(id) => id,
            None => self
                .state
                .codes()
                .first()
                .map(|record| record.id.clone())
                .ok_or_else(|| anyhow!("no verification codes to copy"))?,
        };
        if !self.state.codes().iter().any(|record| record.id == id) {
            bail!("no code with id {id}");
        }
        self.dispatch(Msg::CopyClicked { id });
        Ok(())
    }

    /// Refreshes on start and on the timer, redrawing whenever the view changes.
    pub fn watch(&mut self) -> Result<()> {
        self.dispatch(Msg::RefreshClicked);
        let mut last_tick = Instant::now();
        loop {
            self.pump();
            if last_tick.elapsed() >= Duration::from_secs(1) {
                last_tick = Instant::now();
                self.dispatch(Msg::Tick {
                    now_ms: Utc::now().timestamp_millis(),
                });
            }
            if let Some(text) = self.take_render() {
                // Clear the screen and home the cursor before each redraw.
                print!("\x1b[2J\x1b[H{text}");
            }
            thread::yield_now();
        }
    }

    fn wait_while(&mut self, busy: fn(&AppState) -> bool) -> Result<()> {
        let deadline = Instant::now() + ONE_SHOT_DEADLINE;
        while busy(&self.state) {
            if Instant::now() >= deadline {
                bail!("gave up waiting for the server");
            }
            self.pump();
        }
        Ok(())
    }

    fn banner_as_error(&self) -> Result<()> {
        match self.state.banner() {
            Some(err) => Err(anyhow!(err.clone())),
            None => Ok(()),
        }
    }
}
