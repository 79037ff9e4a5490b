//! Tolerant decode rules for fields Hydra does not type consistently.
//!
//! Each rule first reads whatever JSON value is on the wire and then
//! normalizes it. Encoding always goes through the plain, strict `Serialize`
//! impls.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Normalizes a `finished` flag: booleans pass through, numbers are true when
/// nonzero, anything else is false.
pub fn normalize_finished(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}

/// `deserialize_with` adapter for boolean-or-integer flags.
pub fn finished<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(normalize_finished(&value))
}

/// `deserialize_with` adapter that reads `null` as the type's default.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Flag {
        #[serde(default, deserialize_with = "finished")]
        finished: bool,
    }

    fn decode(raw: &str) -> bool {
        serde_json::from_str::<Flag>(raw).unwrap().finished
    }

    #[test]
    fn test_truthy_wire_values() {
        assert!(decode(r#"{"finished": true}"#));
        assert!(decode(r#"{"finished": 1}"#));
        assert!(decode(r#"{"finished": 1.0}"#));
        assert!(decode(r#"{"finished": -3}"#));
    }

    #[test]
    fn test_falsy_wire_values_never_fail() {
        assert!(!decode(r#"{"finished": false}"#));
        assert!(!decode(r#"{"finished": 0}"#));
        assert!(!decode(r#"{"finished": 0.0}"#));
        assert!(!decode(r#"{}"#));
        assert!(!decode(r#"{"finished": null}"#));
        assert!(!decode(r#"{"finished": "true"}"#));
        assert!(!decode(r#"{"finished": [1]}"#));
        assert!(!decode(r#"{"finished": {"done": true}}"#));
    }

    #[test]
    fn test_normalize_direct() {
        assert!(normalize_finished(&json!(2)));
        assert!(!normalize_finished(&Value::Null));
    }

    #[test]
    fn test_null_as_default() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(default, deserialize_with = "null_as_default")]
            text: String,
            #[serde(default, deserialize_with = "null_as_default")]
            time: i64,
        }

        let holder: Holder = serde_json::from_str(r#"{"text": null, "time": null}"#).unwrap();
        assert_eq!(holder.text, "");
        assert_eq!(holder.time, 0);

        let holder: Holder = serde_json::from_str(r#"{"text": "hi", "time": 7}"#).unwrap();
        assert_eq!(holder.text, "hi");
        assert_eq!(holder.time, 7);
    }
}
