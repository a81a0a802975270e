use serde_json::Value;

use crate::error::{AppError, TransportFailure};
use crate::normalize::normalize_at;
use crate::record::VerificationRecord;
use crate::time::{format_absolute, format_relative, from_millis, interpret_time, sort_by_recency};
use crate::view_model::{AppViewModel, CodeRowView, EmptyState};
use codes_logging::{codes_info, codes_warn};

pub type RequestId = u64;

/// How long the "copied" marker stays on a row.
pub const COPY_FEEDBACK_MS: u64 = 2_000;

/// User preferences that survive restarts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settings {
    pub endpoint_url: String,
    pub delete_url: String,
    /// `None` follows the system preference.
    pub dark_mode: Option<bool>,
    /// 0 disables auto-refresh.
    pub auto_refresh_secs: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    settings: Settings,
    codes: Vec<VerificationRecord>,
    banner: Option<AppError>,
    in_flight: usize,
    deleting: bool,
    next_request_id: RequestId,
    last_refresh_ms: Option<i64>,
    copied_id: Option<String>,
    now_ms: i64,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn codes(&self) -> &[VerificationRecord] {
        &self.codes
    }

    pub fn banner(&self) -> Option<&AppError> {
        self.banner.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn is_deleting(&self) -> bool {
        self.deleting
    }

    pub fn view(&self) -> AppViewModel {
        let now = from_millis(self.now_ms);
        let rows = self
            .codes
            .iter()
            .map(|record| {
                let received = interpret_time(&record.time, self.now_ms);
                CodeRowView {
                    id: record.id.clone(),
                    code: record.code.clone(),
                    contact: record.contact.clone(),
                    source: record.source.clone(),
                    relative_time: format_relative(received, now),
                    absolute_time: format_absolute(received),
                    copied: self.copied_id.as_deref() == Some(record.id.as_str()),
                }
            })
            .collect();

        let empty_state = if !self.codes.is_empty() || self.banner.is_some() {
            EmptyState::None
        } else if self.settings.endpoint_url.is_empty() {
            EmptyState::NotConfigured
        } else if self.is_loading() {
            EmptyState::None
        } else {
            EmptyState::NoCodes
        };

        AppViewModel {
            rows,
            is_loading: self.is_loading(),
            is_deleting: self.deleting,
            banner: self.banner.as_ref().map(ToString::to_string),
            empty_state,
            last_refresh_label: self.last_refresh_ms.map(|ms| format_absolute(from_millis(ms))),
            dark_mode: self.settings.dark_mode,
            auto_refresh_secs: self.settings.auto_refresh_secs,
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Advances the clock; dirty only when a row's age label changes.
    pub(crate) fn set_now(&mut self, now_ms: i64) {
        let before = self.age_labels();
        self.now_ms = now_ms;
        if self.age_labels() != before {
            self.mark_dirty();
        }
    }

    fn age_labels(&self) -> Vec<String> {
        let now = from_millis(self.now_ms);
        self.codes
            .iter()
            .map(|record| format_relative(interpret_time(&record.time, self.now_ms), now))
            .collect()
    }

    pub(crate) fn replace_settings(&mut self, settings: Settings) {
        if self.banner == Some(AppError::EmptyUrl) && !settings.endpoint_url.is_empty() {
            self.banner = None;
        }
        self.settings = settings;
        self.mark_dirty();
    }

    /// Starts a fetch and returns its id and URL, or records `EmptyUrl`.
    pub(crate) fn begin_fetch(&mut self) -> Option<(RequestId, String)> {
        if self.settings.endpoint_url.trim().is_empty() {
            self.banner = Some(AppError::EmptyUrl);
            self.mark_dirty();
            return None;
        }
        self.next_request_id += 1;
        self.in_flight += 1;
        self.banner = None;
        self.mark_dirty();
        Some((self.next_request_id, self.settings.endpoint_url.clone()))
    }

    /// Applies whichever fetch finishes; the latest completion wins.
    pub(crate) fn apply_fetch_result(
        &mut self,
        request_id: RequestId,
        received_at_ms: i64,
        result: Result<Value, TransportFailure>,
    ) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.now_ms = received_at_ms;
        let outcome = result
            .map_err(AppError::from)
            .and_then(|payload| normalize_at(&payload, received_at_ms).map_err(AppError::from));
        match outcome {
            Ok(mut codes) => {
                sort_by_recency(&mut codes, received_at_ms);
                codes_info!("fetch {} returned {} codes", request_id, codes.len());
                self.codes = codes;
                self.banner = None;
                self.last_refresh_ms = Some(received_at_ms);
            }
            Err(err) => {
                codes_warn!("fetch {} failed: {}", request_id, err);
                self.banner = Some(err);
            }
        }
        self.mark_dirty();
    }

    pub(crate) fn code_by_id(&self, id: &str) -> Option<&VerificationRecord> {
        self.codes.iter().find(|record| record.id == id)
    }

    pub(crate) fn set_copied(&mut self, id: String) {
        self.copied_id = Some(id);
        self.mark_dirty();
    }

    pub(crate) fn expire_copied(&mut self, id: &str) {
        if self.copied_id.as_deref() == Some(id) {
            self.copied_id = None;
            self.mark_dirty();
        }
    }

    pub(crate) fn dismiss(&mut self, id: &str) {
        let before = self.codes.len();
        self.codes.retain(|record| record.id != id);
        if self.codes.len() != before {
            self.mark_dirty();
        }
    }

    pub(crate) fn begin_delete(&mut self) {
        self.deleting = true;
        self.mark_dirty();
    }

    pub(crate) fn clear_codes(&mut self) {
        self.codes.clear();
        self.copied_id = None;
        self.mark_dirty();
    }

    pub(crate) fn apply_delete_result(&mut self, result: Result<(), TransportFailure>) {
        self.deleting = false;
        match result {
            Ok(()) => {
                codes_info!("bulk delete succeeded");
                self.banner = None;
                self.clear_codes();
            }
            Err(failure) => {
                codes_warn!("bulk delete failed: {}", failure);
                self.banner = Some(AppError::DeleteFailed(failure));
                self.mark_dirty();
            }
        }
    }
}
