//! Codes mailbox: the email-receiving side that feeds the code list.
//!
//! Incoming messages are scanned for a verification code, kept in a bounded
//! in-memory FIFO, and served over a small JSON HTTP API.
mod email;
mod extract;
mod mailbox;
mod server;

pub use email::{IncomingEmail, RawEmail};
pub use extract::extract_verification_code;
pub use mailbox::{Mailbox, DEFAULT_CAPACITY};
pub use server::{router, serve, SharedMailbox};
