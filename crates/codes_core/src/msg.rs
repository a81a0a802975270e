use serde_json::Value;

use crate::{RequestId, Settings, TransportFailure};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Settings restored from storage at startup.
    SettingsLoaded(Settings),
    /// User edited the endpoint URL.
    EndpointChanged(String),
    /// User edited the bulk-delete URL.
    DeleteEndpointChanged(String),
    /// `None` follows the system preference.
    DarkModeChanged(Option<bool>),
    /// Auto-refresh interval in seconds, 0 disables.
    AutoRefreshChanged(u32),
    /// User asked for a refresh.
    RefreshClicked,
    /// Periodic timer fired.
    AutoRefreshFired,
    /// Transport finished a fetch.
    FetchCompleted {
        request_id: RequestId,
        received_at_ms: i64,
        result: Result<Value, TransportFailure>,
    },
    CopyClicked { id: String },
    CopyFeedbackExpired { id: String },
    /// Hide one code locally.
    DismissCode { id: String },
    /// User confirmed "clear all".
    ClearAllClicked,
    /// Transport finished the bulk-delete call.
    DeleteCompleted { result: Result<(), TransportFailure> },
    /// Clock tick from the shell.
    Tick { now_ms: i64 },
    /// Fallback for placeholder wiring.
    NoOp,
}
