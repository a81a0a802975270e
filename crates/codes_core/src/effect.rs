#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchCodes {
        request_id: crate::RequestId,
        url: String,
    },
    DeleteAll {
        url: String,
    },
    PersistSettings(crate::Settings),
    /// Replace the periodic refresh timer; 0 stops it.
    ScheduleAutoRefresh {
        interval_secs: u32,
    },
    /// The shell sends `Msg::CopyFeedbackExpired` after `COPY_FEEDBACK_MS`.
    CopyToClipboard {
        id: String,
        code: String,
    },
}
