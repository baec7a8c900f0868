//! Integration tests for error types

#[cfg(test)]
mod tests {
    use mailgate_errors::*;

    #[test]
    fn test_error_conversion() {
        let net_err = NetworkError::Timeout {
            url: "https://api.tomba.io/v1/email-verifier/a@x.com".into(),
        };
        let err: Error = net_err.into();
        assert!(matches!(err, Error::Network(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = ConfigError::MissingField {
            field: "emails".into(),
        };
        assert_eq!(err.to_string(), "missing required field: emails");
    }

    #[test]
    fn test_record_message_prefers_provider_text() {
        let err: Error = NetworkError::Api {
            status: 403,
            message: "Your plan does not include this endpoint".into(),
        }
        .into();
        assert_eq!(err.record_message(), "Your plan does not include this endpoint");

        let blank: Error = NetworkError::Api {
            status: 500,
            message: "  ".into(),
        }
        .into();
        assert_eq!(blank.record_message(), UNKNOWN_ERROR);
    }

    #[test]
    fn test_error_clone() {
        let err = Error::internal("timeout");
        let cloned = err.clone();
        assert_eq!(err.record_message(), cloned.record_message());
        assert_eq!(cloned.record_message(), "timeout");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let err: Error = io_err.into();
        assert!(matches!(
            err,
            Error::Io {
                kind: std::io::ErrorKind::PermissionDenied,
                ..
            }
        ));
    }
}
