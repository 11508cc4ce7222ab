//! The JSON envelope wrapped around forced-JSON results.
//!
//! ```text
//! {
//!   "status": "success",
//!   "code": 200,
//!   "data": …,
//!   "count": …
//! }
//! ```
//!
//! `message` is only present on the error envelope.

use serde::Serialize;
use serde_json::Value;

use crate::error::SerializationError;
use crate::invoker::ActionResult;

/// Sent when even the error envelope cannot be encoded.
pub const FALLBACK: &str = r#"{"status":"error","code":500,"message":"JSON generation failed."}"#;

#[derive(Debug, Serialize)]
pub struct Envelope {
    status: &'static str,
    code: u16,
    data: Value,
    count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl Envelope {
    /// Wraps an action result: text as a string, a view as its data map,
    /// anything else as its JSON value.
    pub fn success(result: &ActionResult) -> Result<Self, SerializationError> {
        let (data, count) = match result {
            ActionResult::PlainText(text) => (Value::String(text.clone()), 1),
            ActionResult::StructuredView(view) => {
                (Value::Object(view.data().clone()), view.data().len())
            }
            ActionResult::Unclassified(payload) => {
                let data = payload.to_json()?;
                let count = count_of(&data);
                (data, count)
            }
        };
        Ok(Self { status: "success", code: 200, data, count, message: None })
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            code: 500,
            data: Value::Null,
            count: 0,
            message: Some(message.into()),
        }
    }

    pub fn code(&self) -> u16 { self.code }
    pub fn count(&self) -> usize { self.count }
    pub fn data(&self) -> &Value { &self.data }

    /// Indented JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SerializationError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}

/// Array → its length, null → 0, anything else → 1.
pub fn count_of(data: &Value) -> usize {
    match data {
        Value::Array(items) => items.len(),
        Value::Null => 0,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{ModelView, Payload};
    use serde_json::json;

    #[test]
    fn counts_follow_the_data_shape() {
        let list = ActionResult::Unclassified(Payload::new(vec!["a", "b", "c"]));
        assert_eq!(Envelope::success(&list).unwrap().count(), 3);

        let null = ActionResult::Unclassified(Payload::new(Value::Null));
        assert_eq!(Envelope::success(&null).unwrap().count(), 0);

        let one = ActionResult::Unclassified(Payload::new(json!({ "id": 7 })));
        assert_eq!(Envelope::success(&one).unwrap().count(), 1);

        let text = ActionResult::PlainText("hi".into());
        assert_eq!(Envelope::success(&text).unwrap().count(), 1);

        let view = ActionResult::StructuredView(ModelView::new("v").with("a", 1).with("b", 2));
        let envelope = Envelope::success(&view).unwrap();
        assert_eq!(envelope.count(), 2);
        assert_eq!(envelope.data(), &json!({ "a": 1, "b": 2 }));
    }

    #[test]
    fn message_only_on_error() {
        let ok = Envelope::success(&ActionResult::PlainText("x".into())).unwrap();
        let ok: Value = serde_json::from_slice(&ok.to_bytes().unwrap()).unwrap();
        assert!(ok.get("message").is_none());
        assert_eq!(ok["status"], "success");
        assert_eq!(ok["code"], 200);

        let err: Value = serde_json::from_slice(&Envelope::error("bad").to_bytes().unwrap()).unwrap();
        assert_eq!(err, json!({
            "status": "error",
            "code": 500,
            "data": null,
            "count": 0,
            "message": "bad",
        }));
    }

    #[test]
    fn output_is_indented() {
        let bytes = Envelope::success(&ActionResult::PlainText("x".into())).unwrap().to_bytes().unwrap();
        assert!(String::from_utf8(bytes).unwrap().contains("\n  \"status\": \"success\""));
    }

    #[test]
    fn fallback_is_valid_json() {
        let v: Value = serde_json::from_str(FALLBACK).unwrap();
        assert_eq!(v["code"], 500);
    }
}
