use serde::{Deserialize, Serialize};

/// Canonical verification-code record produced by the normalizer.
///
/// `code` and `contact` are never empty for a record that came out of
/// [`crate::normalize`]. `id` is unique within one fetch result only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub id: String,
    pub code: String,
    /// Phone number or email address the code was sent to.
    pub contact: String,
    pub time: RecordTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Receive time exactly as the server reported it.
///
/// Numbers are epoch seconds or epoch milliseconds; see
/// [`crate::interpret_time`] for how the two are told apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordTime {
    Text(String),
    Number(serde_json::Number),
}

impl RecordTime {
    pub fn number(value: i64) -> Self {
        RecordTime::Number(value.into())
    }
}

impl From<&str> for RecordTime {
    fn from(value: &str) -> Self {
        RecordTime::Text(value.to_string())
    }
}

impl From<i64> for RecordTime {
    fn from(value: i64) -> Self {
        RecordTime::number(value)
    }
}
