//! Normalization of raw notification payloads into [`InboundEvent`] records.
//!
//! This is the anti-corruption layer: every nested field access short-circuits
//! to "absent" instead of failing, and nothing downstream navigates raw JSON.

use serde_json::Value;

/// The comment the new reply was written under.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParentComment {
    pub id: Option<u64>,
    pub author_id: Option<u64>,
    pub text: Option<String>,
}

/// Normalized view of a "new reply" notification, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InboundEvent {
    /// Unique per notification; events without one are never processed.
    pub event_id: Option<u64>,
    pub author_id: Option<u64>,
    pub text: Option<String>,
    pub parent: Option<ParentComment>,
    pub thread_owner_id: Option<u64>,
    /// Identifier used when posting a reply into the thread.
    pub thread_id: Option<u64>,
}

impl InboundEvent {
    pub fn parent_id(&self) -> Option<u64> {
        self.parent.as_ref().and_then(|parent| parent.id)
    }

    pub fn parent_author_id(&self) -> Option<u64> {
        self.parent.as_ref().and_then(|parent| parent.author_id)
    }

    pub fn parent_text(&self) -> Option<&str> {
        self.parent.as_ref().and_then(|parent| parent.text.as_deref())
    }
}

// Platform payloads carry identifiers as JSON numbers in some envelopes and
// as decimal strings in others; both parse, anything else is absent.
fn canonical_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(raw) => raw.trim().parse::<u64>().ok(),
        _ => None,
    }
}

fn id_at(value: &Value, path: &[&str]) -> Option<u64> {
    nested(value, path).and_then(canonical_id)
}

fn text_at(value: &Value, path: &[&str]) -> Option<String> {
    nested(value, path)
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|text| !text.is_empty())
}

fn nested<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    Some(current)
}

/// Extracts a uniform [`InboundEvent`] from a raw notification envelope.
pub fn normalize_notification(payload: &Value) -> InboundEvent {
    let Some(data) = payload.get("data") else {
        return InboundEvent::default();
    };

    let parent = data.get("reply_to").map(|reply| ParentComment {
        id: id_at(reply, &["id"]),
        author_id: id_at(reply, &["creator", "id"]),
        text: text_at(reply, &["text"]),
    });

    InboundEvent {
        event_id: id_at(data, &["id"]),
        author_id: id_at(data, &["creator", "id"]),
        text: text_at(data, &["text"]),
        parent,
        thread_owner_id: id_at(data, &["content", "owner", "id"]),
        thread_id: id_at(data, &["content", "id"]),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_payload_normalizes_to_all_absent() {
        let event = normalize_notification(&json!({}));
        assert_eq!(event, InboundEvent::default());
        assert!(event.event_id.is_none());
        assert!(event.parent.is_none());
    }

    #[test]
    fn full_envelope_populates_every_field() {
        let payload = json!({
            "type": "new_comment",
            "data": {
                "id": 9001,
                "text": "please score this",
                "creator": { "id": 17 },
                "reply_to": {
                    "id": 8000,
                    "text": "parent text",
                    "creator": { "id": 42 }
                },
                "content": { "id": 555, "owner": { "id": 7 } }
            }
        });

        let event = normalize_notification(&payload);
        assert_eq!(event.event_id, Some(9001));
        assert_eq!(event.author_id, Some(17));
        assert_eq!(event.text.as_deref(), Some("please score this"));
        assert_eq!(event.parent_id(), Some(8000));
        assert_eq!(event.parent_author_id(), Some(42));
        assert_eq!(event.parent_text(), Some("parent text"));
        assert_eq!(event.thread_owner_id, Some(7));
        assert_eq!(event.thread_id, Some(555));
    }

    #[test]
    fn missing_nested_objects_degrade_to_absent() {
        let payload = json!({
            "data": {
                "id": "123",
                "reply_to": { "text": "" },
                "content": {}
            }
        });

        let event = normalize_notification(&payload);
        assert_eq!(event.event_id, Some(123));
        assert!(event.author_id.is_none());
        // Empty text is treated as absent, same as a missing field.
        assert!(event.parent_text().is_none());
        assert!(event.parent_id().is_none());
        assert!(event.thread_id.is_none());
        assert!(event.thread_owner_id.is_none());
    }

    #[test]
    fn identifiers_parse_from_numbers_and_numeric_strings_only() {
        assert_eq!(canonical_id(&json!(400974)), Some(400974));
        assert_eq!(canonical_id(&json!("400974")), Some(400974));
        assert_eq!(canonical_id(&json!(" 7 ")), Some(7));
        assert_eq!(canonical_id(&json!(-5)), None);
        assert_eq!(canonical_id(&json!(1.5)), None);
        assert_eq!(canonical_id(&json!("abc")), None);
        assert_eq!(canonical_id(&json!({"id": 1})), None);
    }
}
