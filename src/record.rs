//! Defines a _record_, the structured payload carried in a message
//! body, and its conversion into a DynamoDB item.

use anyhow::{anyhow, Context, Result};
use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A message payload: field names mapped to arbitrary JSON values.
/// Its shape is not validated; the table decides which keys it needs.
pub type Record = Map<String, Value>;

/// Parse a message body into a record. The body must be a JSON
/// object.
pub fn parse(body: &str) -> Result<Record> {
    match serde_json::from_str(body).context("Failed to parse message body as JSON")? {
        Value::Object(record) => Ok(record),
        other => Err(anyhow!(
            "Message body must be a JSON object, got {}",
            kind(&other)
        )),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Convert a single JSON value into a DynamoDB attribute.
pub fn to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(to_attribute).collect()),
        Value::Object(fields) => AttributeValue::M(to_item(fields)),
    }
}

/// Convert a record into a DynamoDB item.
pub fn to_item(record: &Record) -> HashMap<String, AttributeValue> {
    record
        .iter()
        .map(|(name, value)| (name.clone(), to_attribute(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_object_bodies() {
        let record = parse("{\"id\": \"abc\", \"val\": 1}").unwrap();
        assert_eq!(Value::Object(record), json!({"id": "abc", "val": 1}));
    }

    #[test]
    fn rejects_malformed_bodies() {
        assert!(parse("{\"id\": ").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn rejects_non_object_bodies() {
        let err = parse("[1, 2]").unwrap_err();
        assert!(err.to_string().contains("an array"), "{}", err);
    }

    #[test]
    fn converts_nested_values() {
        let record = parse(
            r#"{"id": "abc", "val": 1.5, "ok": true, "none": null,
                "tags": ["a", 2], "inner": {"x": "y"}}"#,
        )
        .unwrap();
        let item = to_item(&record);
        assert_eq!(item["id"], AttributeValue::S(String::from("abc")));
        assert_eq!(item["val"], AttributeValue::N(String::from("1.5")));
        assert_eq!(item["ok"], AttributeValue::Bool(true));
        assert_eq!(item["none"], AttributeValue::Null(true));
        assert_eq!(
            item["tags"],
            AttributeValue::L(vec![
                AttributeValue::S(String::from("a")),
                AttributeValue::N(String::from("2")),
            ])
        );
        assert_eq!(
            item["inner"],
            AttributeValue::M(HashMap::from([(
                String::from("x"),
                AttributeValue::S(String::from("y"))
            )]))
        );
    }
}
