//! Verification requests and output records

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error text for entries that are not usable addresses
pub const INVALID_EMAIL_FORMAT: &str = "Invalid email format";

/// Error text for calls that succeed without returning data
pub const NO_VERIFICATION_DATA: &str = "No verification data found";

/// Stand-in `input` for entries that are missing or empty
pub const INVALID_INPUT_PLACEHOLDER: &str = "invalid";

/// Provider-defined verification data for one address
pub type VerificationPayload = Map<String, Value>;

/// A single entry of the input address list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationRequest {
    /// A non-empty string, sent to the remote service as-is
    Address(String),
    /// Anything else; recorded inline and never sent
    Malformed { input: Value },
}

impl VerificationRequest {
    /// Classify one raw entry of the `emails` array.
    ///
    /// Non-string or empty entries become [`VerificationRequest::Malformed`].
    /// Their recorded `input` is the original value when it is truthy and
    /// [`INVALID_INPUT_PLACEHOLDER`] otherwise (null, `""`, `false`, `0`).
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(address) if !address.is_empty() => Self::Address(address),
            other => {
                let input = if is_falsy(&other) {
                    Value::String(INVALID_INPUT_PLACEHOLDER.to_string())
                } else {
                    other
                };
                Self::Malformed { input }
            }
        }
    }

    /// The address, if this entry will be verified
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        match self {
            Self::Address(address) => Some(address),
            Self::Malformed { .. } => None,
        }
    }
}

impl From<&str> for VerificationRequest {
    fn from(value: &str) -> Self {
        Self::from_value(Value::String(value.to_string()))
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Result of processing one request: payload or error, never both
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Verified(VerificationPayload),
    Failed(String),
}

/// One output record per processed or rejected input
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationRecord {
    pub input: Value,
    pub outcome: Outcome,
}

impl VerificationRecord {
    /// Record for a successful verification
    ///
    /// A provider key named `error` is dropped so the record cannot read as
    /// a failure.
    #[must_use]
    pub fn verified(email: impl Into<String>, mut payload: VerificationPayload) -> Self {
        payload.remove("error");
        Self {
            input: Value::String(email.into()),
            outcome: Outcome::Verified(payload),
        }
    }

    /// Record for a failed verification of an address
    #[must_use]
    pub fn failed(email: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            input: Value::String(email.into()),
            outcome: Outcome::Failed(message.into()),
        }
    }

    /// Record for a call that returned no data
    #[must_use]
    pub fn no_data(email: impl Into<String>) -> Self {
        Self::failed(email, NO_VERIFICATION_DATA)
    }

    /// Record for an entry that was never sent
    #[must_use]
    pub fn invalid_format(input: Value) -> Self {
        Self {
            input,
            outcome: Outcome::Failed(INVALID_EMAIL_FORMAT.to_string()),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Verified(_))
    }

    /// The error text, if this record is a failure
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Failed(message) => Some(message),
            Outcome::Verified(_) => None,
        }
    }

    /// The input rendered for display
    #[must_use]
    pub fn input_display(&self) -> String {
        match &self.input {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Provider status (`email.status`) of a verified record
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Verified(payload) => payload
                .get("email")
                .and_then(|email| email.get("status"))
                .and_then(Value::as_str),
            Outcome::Failed(_) => None,
        }
    }

    /// Flatten into the emitted JSON object.
    ///
    /// Payload fields come first and `input` is written last, so a payload
    /// key named `input` is overridden by the original address. Verified
    /// records never carry `error`.
    #[must_use]
    pub fn to_json_object(&self) -> Map<String, Value> {
        match &self.outcome {
            Outcome::Verified(payload) => {
                let mut object = payload.clone();
                object.remove("error");
                object.insert("input".to_string(), self.input.clone());
                object
            }
            Outcome::Failed(message) => {
                let mut object = Map::with_capacity(2);
                object.insert("input".to_string(), self.input.clone());
                object.insert("error".to_string(), Value::String(message.clone()));
                object
            }
        }
    }
}

impl Serialize for VerificationRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json_object().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for VerificationRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut object = Map::<String, Value>::deserialize(deserializer)?;
        let input = object
            .remove("input")
            .ok_or_else(|| de::Error::missing_field("input"))?;
        let outcome = match object.remove("error") {
            Some(Value::String(message)) => {
                if !object.is_empty() {
                    return Err(de::Error::custom(
                        "record carries both an error and payload fields",
                    ));
                }
                Outcome::Failed(message)
            }
            Some(other) => {
                return Err(de::Error::invalid_type(
                    de::Unexpected::Other(&other.to_string()),
                    &"a string error message",
                ))
            }
            None => Outcome::Verified(object),
        };
        Ok(Self { input, outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn empty_and_null_entries_use_placeholder() {
        for raw in [json!(""), json!(null), json!(false), json!(0)] {
            let request = VerificationRequest::from_value(raw);
            assert_eq!(
                request,
                VerificationRequest::Malformed {
                    input: json!("invalid")
                }
            );
        }
    }

    #[test]
    fn truthy_non_strings_keep_their_value() {
        let request = VerificationRequest::from_value(json!(42));
        assert_eq!(request, VerificationRequest::Malformed { input: json!(42) });
        assert!(request.address().is_none());
    }

    #[test]
    fn strings_are_addresses() {
        let request = VerificationRequest::from_value(json!("a@x.com"));
        assert_eq!(request.address(), Some("a@x.com"));
    }

    #[test]
    fn invalid_format_record_shape() {
        let record = VerificationRecord::invalid_format(json!("invalid"));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({"input": "invalid", "error": "Invalid email format"})
        );
    }

    #[test]
    fn verified_record_overrides_payload_input() {
        let payload = json!({"email": {"status": "valid"}, "input": "other"});
        let Value::Object(payload) = payload else {
            unreachable!()
        };
        let record = VerificationRecord::verified("a@x.com", payload);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["input"], json!("a@x.com"));
        assert_eq!(value["email"]["status"], json!("valid"));
        assert!(value.get("error").is_none());
        assert_eq!(record.status(), Some("valid"));
    }

    #[test]
    fn provider_error_key_does_not_leak_into_verified_record() {
        let Value::Object(payload) = json!({"email": {"status": "valid"}, "error": null}) else {
            unreachable!()
        };
        let record = VerificationRecord::verified("a@x.com", payload);
        assert!(record.is_success());

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({"email": {"status": "valid"}, "input": "a@x.com"}));

        let parsed: VerificationRecord = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, record);

        let direct = VerificationRecord {
            input: json!("b@x.com"),
            outcome: Outcome::Verified(
                [("error".to_string(), json!("stale"))].into_iter().collect(),
            ),
        };
        assert!(!direct.to_json_object().contains_key("error"));
    }

    #[test]
    fn records_parse_back_from_emitted_shape() {
        let failed: VerificationRecord =
            serde_json::from_value(json!({"input": "c@x.com", "error": "timeout"})).unwrap();
        assert_eq!(failed, VerificationRecord::failed("c@x.com", "timeout"));

        let verified: VerificationRecord =
            serde_json::from_value(json!({"input": "a@x.com", "email": {"status": "valid"}}))
                .unwrap();
        assert!(verified.is_success());

        let both = serde_json::from_value::<VerificationRecord>(
            json!({"input": "a@x.com", "error": "x", "email": {}}),
        );
        assert!(both.is_err());
    }

    proptest! {
        #[test]
        fn emitted_record_has_exactly_one_of_payload_or_error(
            email in "[a-z]{1,8}@[a-z]{1,8}\\.com",
            keys in proptest::collection::vec("[a-z]{1,6}", 0..5),
            message in proptest::option::of("[a-z ]{0,12}"),
        ) {
            let record = match message {
                Some(message) => VerificationRecord::failed(&email, message),
                None => {
                    let payload = keys
                        .into_iter()
                        .filter(|k| k != "input")
                        .map(|k| (k, Value::Bool(true)))
                        .collect();
                    VerificationRecord::verified(&email, payload)
                }
            };
            let object = record.to_json_object();
            let has_error = object.contains_key("error");
            let has_payload = object.keys().any(|k| k != "input" && k != "error");
            prop_assert!(!(has_error && has_payload));
            prop_assert_eq!(object.get("input"), Some(&Value::String(email)));
        }
    }
}
