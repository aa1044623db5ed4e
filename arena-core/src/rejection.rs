//! Mapping of HTTP 400 field errors to notices.
//!
//! The server answers invalid input with an object keyed by field name,
//! each holding a message or a list of messages:
//! `{"phone_number": ["user with this phone number already exists."]}`.

use crate::messages::MessageKey;
use serde_json::Value;

/// One rejected field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRejection {
    /// Field name as sent by the server
    pub field: String,
    /// The server's messages for this field
    pub messages: Vec<String>,
    /// The notice to show for it
    pub key: MessageKey,
}

/// One notice key per distinct problem among `rejections`.
///
/// Unknown fields and unexpected shapes fall back to
/// [`MessageKey::GenericError`]; the result is never empty.
pub fn rejection_keys(rejections: &[FieldRejection]) -> Vec<MessageKey> {
    let mut keys = Vec::new();
    for rejection in rejections {
        if !keys.contains(&rejection.key) {
            keys.push(rejection.key);
        }
    }
    if keys.is_empty() {
        keys.push(MessageKey::GenericError);
    }
    keys
}

/// Break a 400 response body into its rejected fields.
pub fn field_rejections(body: &Value) -> Vec<FieldRejection> {
    let Some(fields) = body.as_object() else {
        tracing::debug!(%body, "Rejection body isn't keyed by field");
        return Vec::new();
    };

    fields
        .iter()
        .map(|(field, value)| {
            let messages = messages_of(value);
            let key = key_for(field, &messages);
            FieldRejection {
                field: field.clone(),
                messages,
                key,
            }
        })
        .collect()
}

fn messages_of(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(messages_of).collect(),
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}

fn key_for(field: &str, messages: &[String]) -> MessageKey {
    let duplicate = messages.iter().any(|m| is_duplicate_message(m));
    match field {
        "phone_number" | "phone" | "identifier" if duplicate => MessageKey::DuplicatePhone,
        "phone_number" | "phone" | "identifier" => MessageKey::InvalidPhone,
        "username" if duplicate => MessageKey::DuplicateUsername,
        "email" if duplicate => MessageKey::DuplicateEmail,
        "password" => MessageKey::WeakPassword,
        "code" | "otp" => MessageKey::OtpRejected,
        _ => MessageKey::GenericError,
    }
}

fn is_duplicate_message(message: &str) -> bool {
    let message = message.to_lowercase();
    ["already exists", "already registered", "unique", "قبلا", "قبلاً", "تکراری"]
        .iter()
        .any(|needle| message.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(body: Value) -> Vec<MessageKey> {
        rejection_keys(&field_rejections(&body))
    }

    #[test]
    fn test_duplicate_phone() {
        assert_eq!(
            keys(json!({ "phone_number": ["already exists"] })),
            vec![MessageKey::DuplicatePhone]
        );
        assert_eq!(
            keys(json!({ "phone_number": "این شماره قبلاً ثبت شده است" })),
            vec![MessageKey::DuplicatePhone]
        );
    }

    #[test]
    fn test_invalid_phone() {
        assert_eq!(
            keys(json!({ "phone_number": ["Enter a valid phone number."] })),
            vec![MessageKey::InvalidPhone]
        );
    }

    #[test]
    fn test_multiple_fields() {
        let body = json!({
            "password": ["This password is too common."],
            "username": ["A user with that username already exists."],
        });
        let found = keys(body.clone());
        assert_eq!(found.len(), 2);
        assert!(found.contains(&MessageKey::WeakPassword));
        assert!(found.contains(&MessageKey::DuplicateUsername));

        let rejections = field_rejections(&body);
        let password = rejections.iter().find(|r| r.field == "password");
        assert_eq!(
            password.map(|r| r.messages.clone()),
            Some(vec!["This password is too common.".to_string()])
        );
    }

    #[test]
    fn test_unmapped_fields_fall_back() {
        assert_eq!(
            keys(json!({ "favourite_colour": ["nope"], "detail": "bad" })),
            vec![MessageKey::GenericError]
        );
        assert_eq!(keys(json!({})), vec![MessageKey::GenericError]);
        assert_eq!(keys(json!("oops")), vec![MessageKey::GenericError]);
    }

    #[test]
    fn test_field_rejection_messages() {
        let rejections = field_rejections(&json!({ "email": [["nested"], 5] }));
        assert_eq!(rejections.len(), 1);
        assert_eq!(rejections[0].messages, vec!["nested", "5"]);
        assert_eq!(rejections[0].key, MessageKey::GenericError);
    }
}
