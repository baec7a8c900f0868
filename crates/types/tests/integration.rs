//! Integration tests for types

#[cfg(test)]
mod tests {
    use mailgate_types::*;
    use serde_json::{json, Value};

    fn payload(value: Value) -> VerificationPayload {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_record_merges_payload_with_input() {
        let record = VerificationRecord::verified(
            "a@x.com",
            payload(json!({"email": {"status": "valid", "score": 97}, "input": "spoofed"})),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["input"], "a@x.com");
        assert_eq!(json["email"]["status"], "valid");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_same_payload_maps_to_same_record() {
        let data = payload(json!({"email": {"status": "accept_all"}}));
        let first = VerificationRecord::verified("b@x.com", data.clone());
        let second = VerificationRecord::verified("b@x.com", data);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_request_classification() {
        assert_eq!(
            VerificationRequest::from_value(json!("a@x.com")).address(),
            Some("a@x.com")
        );
        for falsy in [json!(null), json!(""), json!(false), json!(0)] {
            let request = VerificationRequest::from_value(falsy);
            assert_eq!(
                request,
                VerificationRequest::Malformed {
                    input: json!(INVALID_INPUT_PLACEHOLDER)
                }
            );
        }
        assert_eq!(
            VerificationRequest::from_value(json!({"email": "a@x.com"})),
            VerificationRequest::Malformed {
                input: json!({"email": "a@x.com"})
            }
        );
    }

    #[test]
    fn test_failed_record_round_trips() {
        let text = r#"{"input":"c@x.com","error":"timeout"}"#;
        let record: VerificationRecord = serde_json::from_str(text).unwrap();
        assert_eq!(record.error(), Some("timeout"));
        assert_eq!(serde_json::to_value(&record).unwrap(), serde_json::from_str::<Value>(text).unwrap());
    }

    #[test]
    fn test_record_format_serialization() {
        assert_eq!(serde_json::to_string(&RecordFormat::Jsonl).unwrap(), r#""jsonl""#);
        assert_eq!(RecordFormat::default().to_string(), "json");
    }
}
