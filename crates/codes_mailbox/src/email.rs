use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extract::extract_verification_code;

/// A received message as stored and served by the mailbox.
///
/// Serialized with camelCase keys; this is the `emails[]` item shape the
/// client-side normalizer understands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEmail {
    pub id: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub content: String,
    /// Epoch milliseconds.
    pub received_at: i64,
    pub has_verification_code: bool,
    pub verification_code: Option<String>,
}

/// Body of an ingest request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingEmail {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub subject: String,
    pub content: String,
}

impl RawEmail {
    pub fn receive(incoming: IncomingEmail, received_at: i64) -> Self {
        let verification_code = extract_verification_code(&incoming.content);
        Self {
            id: Uuid::new_v4().to_string(),
            from: incoming.from,
            to: incoming.to,
            subject: incoming.subject,
            content: incoming.content,
            received_at,
            has_verification_code: verification_code.is_some(),
            verification_code,
        }
    }
}
