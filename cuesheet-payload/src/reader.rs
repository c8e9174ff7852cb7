//! Field-level readers over a raw JSON payload.
//!
//! Each accessor checks presence and type of one field and reports failures
//! as a [`PayloadValidationError`] carrying the full field path.

use cuesheet_core::{BehaviorType, PayloadValidationError};
use serde_json::{Map, Number, Value};

/// A closed set of string values accepted by a payload field.
pub trait SchemaEnum: Sized {
    /// Accepted wire values, in declaration order.
    const VARIANTS: &'static [&'static str];

    /// Parse one accepted wire value.
    fn from_variant(s: &str) -> Option<Self>;
}

/// JSON type name used in "expected X, received Y" messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Reader over one JSON object at a known path.
pub(crate) struct ObjectReader<'a> {
    behavior: &'a BehaviorType,
    object: &'a Map<String, Value>,
    prefix: String,
}

impl<'a> ObjectReader<'a> {
    /// Read the payload root, which must be an object.
    pub(crate) fn root(
        behavior: &'a BehaviorType,
        payload: &'a Value,
    ) -> Result<Self, PayloadValidationError> {
        match payload {
            Value::Object(object) => Ok(Self {
                behavior,
                object,
                prefix: String::new(),
            }),
            other => Err(PayloadValidationError {
                behavior_type: behavior.clone(),
                path: "payload".to_string(),
                reason: format!("Expected object, received {}", type_name(other)),
            }),
        }
    }

    pub(crate) fn path(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.prefix, key)
        }
    }

    pub(crate) fn error(&self, path: String, reason: impl Into<String>) -> PayloadValidationError {
        PayloadValidationError {
            behavior_type: self.behavior.clone(),
            path,
            reason: reason.into(),
        }
    }

    fn expected(&self, key: &str, expected: &str, got: &Value) -> PayloadValidationError {
        self.error(
            self.path(key),
            format!("Expected {}, received {}", expected, type_name(got)),
        )
    }

    fn required(&self, key: &str) -> Result<&'a Value, PayloadValidationError> {
        self.object
            .get(key)
            .ok_or_else(|| self.error(self.path(key), "Required"))
    }

    pub(crate) fn required_str(&self, key: &str) -> Result<String, PayloadValidationError> {
        match self.required(key)? {
            Value::String(s) => Ok(s.clone()),
            other => Err(self.expected(key, "string", other)),
        }
    }

    pub(crate) fn optional_str(&self, key: &str) -> Result<Option<String>, PayloadValidationError> {
        match self.object.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(self.expected(key, "string", other)),
        }
    }

    /// The number is kept as written, so integers stay integers.
    pub(crate) fn optional_number(
        &self,
        key: &str,
    ) -> Result<Option<Number>, PayloadValidationError> {
        match self.object.get(key) {
            None => Ok(None),
            Some(Value::Number(n)) => Ok(Some(n.clone())),
            Some(other) => Err(self.expected(key, "number", other)),
        }
    }

    pub(crate) fn bool_or(&self, key: &str, default: bool) -> Result<bool, PayloadValidationError> {
        match self.object.get(key) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(self.expected(key, "boolean", other)),
        }
    }

    /// Optional list of strings; each element is checked as `key[i]`.
    pub(crate) fn optional_str_list(
        &self,
        key: &str,
    ) -> Result<Option<Vec<String>>, PayloadValidationError> {
        let items = match self.object.get(key) {
            None => return Ok(None),
            Some(Value::Array(items)) => items,
            Some(other) => return Err(self.expected(key, "array", other)),
        };

        items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(self.error(
                    format!("{}[{}]", self.path(key), i),
                    format!("Expected string, received {}", type_name(other)),
                )),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    pub(crate) fn required_enum<T: SchemaEnum>(&self, key: &str) -> Result<T, PayloadValidationError> {
        let raw = self.required_str(key)?;
        T::from_variant(&raw).ok_or_else(|| {
            let expected = T::VARIANTS
                .iter()
                .map(|v| format!("'{v}'"))
                .collect::<Vec<_>>()
                .join(" | ");
            self.error(
                self.path(key),
                format!("Invalid enum value. Expected {expected}, received '{raw}'"),
            )
        })
    }

    /// Optional nested object, read with its own path prefix.
    pub(crate) fn optional_object(
        &self,
        key: &str,
    ) -> Result<Option<ObjectReader<'a>>, PayloadValidationError> {
        match self.object.get(key) {
            None => Ok(None),
            Some(Value::Object(object)) => Ok(Some(ObjectReader {
                behavior: self.behavior,
                object,
                prefix: self.path(key),
            })),
            Some(other) => Err(self.expected(key, "object", other)),
        }
    }

    pub(crate) fn into_map(self) -> Map<String, Value> {
        self.object.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_root_must_be_object() {
        let behavior = BehaviorType::Research;
        let payload = json!(["query"]);
        let err = ObjectReader::root(&behavior, &payload).err().expect("array root");
        assert_eq!(err.path, "payload");
        assert_eq!(err.reason, "Expected object, received array");
    }

    #[test]
    fn test_required_missing_reports_path() {
        let behavior = BehaviorType::Planning;
        let payload = json!({});
        let reader = ObjectReader::root(&behavior, &payload).expect("object");
        let err = reader.required_str("goal").unwrap_err();
        assert_eq!(err.path, "goal");
        assert_eq!(err.reason, "Required");
    }

    #[test]
    fn test_list_element_path_is_indexed() {
        let behavior = BehaviorType::Research;
        let payload = json!({ "sources": ["web", 7] });
        let reader = ObjectReader::root(&behavior, &payload).expect("object");
        let err = reader.optional_str_list("sources").unwrap_err();
        assert_eq!(err.path, "sources[1]");
        assert_eq!(err.reason, "Expected string, received number");
    }

    #[test]
    fn test_nested_path_is_dotted() {
        let behavior = BehaviorType::Analysis;
        let payload = json!({ "timeRange": { "start": true } });
        let reader = ObjectReader::root(&behavior, &payload).expect("object");
        let nested = reader
            .optional_object("timeRange")
            .expect("object")
            .expect("present");
        let err = nested.required_str("start").unwrap_err();
        assert_eq!(err.path, "timeRange.start");
    }

    #[test]
    fn test_null_is_not_absent() {
        let behavior = BehaviorType::Followup;
        let payload = json!({ "contactId": null });
        let reader = ObjectReader::root(&behavior, &payload).expect("object");
        let err = reader.optional_str("contactId").unwrap_err();
        assert_eq!(err.reason, "Expected string, received null");
    }
}
