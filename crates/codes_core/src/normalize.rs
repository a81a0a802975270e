//! Conversion of loosely shaped endpoint payloads into [`VerificationRecord`]s.
//!
//! Five shapes are recognized, tried in this order:
//!
//! 1. `{ "success": bool, "emails": [...] }`
//! 2. `{ "success": bool, "data": [...] }` (fails early when `success` is false)
//! 3. `{ "data": [...] }`
//! 4. `{ "emails": [...] }`
//! 5. `[...]`
//!
//! Email lists drop items without a code. Generic lists are all-or-nothing.
use chrono::Utc;
use codes_logging::{codes_debug, codes_warn};
use serde_json::{Map, Value};

use crate::record::{RecordTime, VerificationRecord};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("server reported failure: {}", .detail.as_deref().unwrap_or("no detail given"))]
    ServerReportedFailure { detail: Option<String> },
    #[error("unrecognized response format")]
    UnrecognizedShape,
    #[error("record {index} is missing a code or phone")]
    MissingRequiredFields { index: usize },
}

/// Payload shape after detection. Each variant borrows the list it found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PayloadShape<'a> {
    WrappedEmails(&'a [Value]),
    WrappedGeneric {
        success: bool,
        message: Option<&'a str>,
        data: &'a [Value],
    },
    BareGeneric(&'a [Value]),
    BareEmails(&'a [Value]),
    BareArray(&'a [Value]),
}

/// Normalize `payload` using the wall clock for synthesized ids and times.
pub fn normalize(payload: &Value) -> Result<Vec<VerificationRecord>, NormalizeError> {
    normalize_at(payload, Utc::now().timestamp_millis())
}

/// Normalize `payload`; `now_ms` stands in for "now" wherever the payload
/// leaves an id or time out.
pub fn normalize_at(
    payload: &Value,
    now_ms: i64,
) -> Result<Vec<VerificationRecord>, NormalizeError> {
    let shape = detect_shape(payload).ok_or(NormalizeError::UnrecognizedShape)?;
    match shape {
        PayloadShape::WrappedEmails(emails) | PayloadShape::BareEmails(emails) => {
            Ok(convert_emails(emails, now_ms))
        }
        PayloadShape::WrappedGeneric {
            success: false,
            message,
            ..
        } => Err(NormalizeError::ServerReportedFailure {
            detail: message.map(str::to_owned),
        }),
        PayloadShape::WrappedGeneric { data, .. }
        | PayloadShape::BareGeneric(data)
        | PayloadShape::BareArray(data) => normalize_generic(data, now_ms),
    }
}

pub(crate) fn detect_shape(payload: &Value) -> Option<PayloadShape<'_>> {
    match payload {
        Value::Object(obj) => match_wrapped_emails(obj)
            .or_else(|| match_wrapped_generic(obj))
            .or_else(|| match_bare_generic(obj))
            .or_else(|| match_bare_emails(obj)),
        Value::Array(items) => Some(PayloadShape::BareArray(items.as_slice())),
        _ => None,
    }
}

fn match_wrapped_emails(obj: &Map<String, Value>) -> Option<PayloadShape<'_>> {
    obj.get("success")?.as_bool()?;
    array_field(obj, "emails").map(PayloadShape::WrappedEmails)
}

fn match_wrapped_generic(obj: &Map<String, Value>) -> Option<PayloadShape<'_>> {
    let success = obj.get("success")?.as_bool()?;
    let data = array_field(obj, "data")?;
    Some(PayloadShape::WrappedGeneric {
        success,
        message: str_field(obj, "message"),
        data,
    })
}

fn match_bare_generic(obj: &Map<String, Value>) -> Option<PayloadShape<'_>> {
    array_field(obj, "data").map(PayloadShape::BareGeneric)
}

fn match_bare_emails(obj: &Map<String, Value>) -> Option<PayloadShape<'_>> {
    array_field(obj, "emails").map(PayloadShape::BareEmails)
}

fn convert_emails(emails: &[Value], now_ms: i64) -> Vec<VerificationRecord> {
    let records: Vec<_> = emails
        .iter()
        .enumerate()
        .filter_map(|(index, item)| email_to_record(item, index, now_ms))
        .collect();
    codes_debug!(
        "kept {} of {} emails carrying a verification code",
        records.len(),
        emails.len()
    );
    records
}

fn email_to_record(item: &Value, index: usize, now_ms: i64) -> Option<VerificationRecord> {
    let obj = item.as_object()?;
    if obj.get("hasVerificationCode") != Some(&Value::Bool(true)) {
        return None;
    }
    let code = non_empty_str_field(obj, "verificationCode")?;
    let contact = non_empty_str_field(obj, "to")?;

    Some(VerificationRecord {
        id: id_or_synthesized(obj, index, now_ms),
        code: code.to_owned(),
        contact: contact.to_owned(),
        time: time_field(obj, "receivedAt").unwrap_or_else(|| RecordTime::number(now_ms)),
        source: str_field(obj, "from").map(str::to_owned),
    })
}

fn normalize_generic(
    items: &[Value],
    now_ms: i64,
) -> Result<Vec<VerificationRecord>, NormalizeError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| generic_to_record(item, index, now_ms))
        .collect()
}

fn generic_to_record(
    item: &Value,
    index: usize,
    now_ms: i64,
) -> Result<VerificationRecord, NormalizeError> {
    let Some(obj) = item.as_object() else {
        codes_warn!("record {} is not an object, rejecting batch", index);
        return Err(NormalizeError::MissingRequiredFields { index });
    };

    let code = str_field(obj, "code").unwrap_or_default();
    let contact = str_field(obj, "phone").unwrap_or_default();
    if code.is_empty() || contact.is_empty() {
        codes_warn!("record {} lacks code or phone, rejecting batch", index);
        return Err(NormalizeError::MissingRequiredFields { index });
    }

    Ok(VerificationRecord {
        id: id_or_synthesized(obj, index, now_ms),
        code: code.to_owned(),
        contact: contact.to_owned(),
        time: time_field(obj, "time").unwrap_or_else(|| RecordTime::number(now_ms)),
        source: str_field(obj, "source").map(str::to_owned),
    })
}

fn id_or_synthesized(obj: &Map<String, Value>, index: usize, now_ms: i64) -> String {
    match str_field(obj, "id") {
        Some(id) => id.to_owned(),
        None => format!("code-{now_ms}-{index}"),
    }
}

fn array_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a [Value]> {
    obj.get(key)?.as_array().map(Vec::as_slice)
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)?.as_str()
}

fn non_empty_str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    str_field(obj, key).filter(|value| !value.is_empty())
}

// Anything other than a string or number counts as absent.
fn time_field(obj: &Map<String, Value>, key: &str) -> Option<RecordTime> {
    match obj.get(key)? {
        Value::String(text) => Some(RecordTime::Text(text.clone())),
        Value::Number(number) => Some(RecordTime::Number(number.clone())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{detect_shape, PayloadShape};

    #[test]
    fn success_flag_with_both_lists_prefers_emails() {
        let payload = json!({ "success": true, "emails": [], "data": [1] });
        assert!(matches!(
            detect_shape(&payload),
            Some(PayloadShape::WrappedEmails(_))
        ));
    }

    #[test]
    fn non_boolean_success_falls_through_to_bare_shapes() {
        let payload = json!({ "success": "yes", "data": [] });
        assert!(matches!(
            detect_shape(&payload),
            Some(PayloadShape::BareGeneric(_))
        ));

        let payload = json!({ "success": 1, "emails": [] });
        assert!(matches!(
            detect_shape(&payload),
            Some(PayloadShape::BareEmails(_))
        ));
    }

    #[test]
    fn wrapped_generic_carries_message() {
        let payload = json!({ "success": false, "data": [], "message": "quota" });
        assert_eq!(
            detect_shape(&payload),
            Some(PayloadShape::WrappedGeneric {
                success: false,
                message: Some("quota"),
                data: &[],
            })
        );
    }

    #[test]
    fn scalars_and_non_array_fields_have_no_shape() {
        assert_eq!(detect_shape(&json!("text")), None);
        assert_eq!(detect_shape(&json!(null)), None);
        assert_eq!(detect_shape(&json!({ "data": {} })), None);
        assert_eq!(detect_shape(&json!({ "emails": "x" })), None);
    }
}
