//! Codes engine: HTTP transport, background execution, and file persistence.
mod engine;
mod persist;
mod transport;
mod types;

pub use engine::EngineHandle;
pub use persist::{ensure_state_dir, AtomicFileWriter, PersistError};
pub use transport::{FetchSettings, ReqwestTransport, Transport};
pub use types::{EngineEvent, FailureKind, RequestId, TransportError};
