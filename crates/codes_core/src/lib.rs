//! Codes core: response normalization and the pure presentation state machine.
mod effect;
mod error;
mod msg;
mod normalize;
mod record;
mod state;
mod time;
mod update;
mod view_model;

pub use effect::Effect;
pub use error::{AppError, TransportFailure};
pub use msg::Msg;
pub use normalize::{normalize, normalize_at, NormalizeError};
pub use record::{RecordTime, VerificationRecord};
pub use state::{AppState, RequestId, Settings, COPY_FEEDBACK_MS};
pub use time::{
    format_absolute, format_full, format_relative, from_millis, interpret_time, sort_by_recency,
    MILLIS_THRESHOLD,
};
pub use update::update;
pub use view_model::{AppViewModel, CodeRowView, EmptyState};
