//! Mapping of fax API failures to protocol errors.
//!
//! Credential and lookup failures are the caller's problem and become
//! invalid-params errors. Everything else is an internal error carrying the
//! upstream status and detail.

use faxgate_client::Error as ClientError;
use faxgate_mcp::model::ErrorData;

/// Message for upstream 401 responses.
pub const AUTH_FAILED: &str = "Invalid API key or authentication failed";

/// Map a lookup failure. `not_found` is used for upstream 404s.
pub fn lookup_error(err: &ClientError, not_found: impl FnOnce() -> String) -> ErrorData {
    match err.status() {
        Some(404) => ErrorData::invalid_params(not_found(), None),
        _ => upstream_error(err),
    }
}

/// Map a submission failure.
pub fn send_error(err: &ClientError) -> ErrorData {
    match err.status() {
        Some(413) => ErrorData::invalid_params("File too large - exceeds maximum size limit", None),
        Some(415) => ErrorData::invalid_params(
            "Unsupported file type - only PDF and TXT are allowed",
            None,
        ),
        _ => upstream_error(err),
    }
}

/// Map any other failure.
pub fn upstream_error(err: &ClientError) -> ErrorData {
    match err.status() {
        Some(401) => ErrorData::invalid_params(AUTH_FAILED, None),
        Some(status) => {
            ErrorData::internal_error(format!("Fax API error ({status}): {}", err.detail()), None)
        }
        None => ErrorData::internal_error(format!("Fax API error: {}", err.detail()), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxgate_mcp::model::ErrorCode;

    fn status(code: u16, message: &str) -> ClientError {
        ClientError::Status {
            status: code,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_not_found_is_invalid_params() {
        let err = lookup_error(&status(404, "Not Found"), || "Fax job not found: j1".into());
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(err.message, "Fax job not found: j1");
    }

    #[test]
    fn test_unauthorized_is_invalid_params() {
        let err = lookup_error(&status(401, "bad key"), || unreachable!());
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(err.message, AUTH_FAILED);

        let err = send_error(&status(401, "bad key"));
        assert_eq!(err.message, AUTH_FAILED);
    }

    #[test]
    fn test_send_size_and_type() {
        assert_eq!(send_error(&status(413, "x")).code, ErrorCode::INVALID_PARAMS);
        assert_eq!(send_error(&status(415, "x")).code, ErrorCode::INVALID_PARAMS);
    }

    #[test]
    fn test_other_status_is_internal() {
        let err = upstream_error(&status(503, "maintenance"));
        assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);
        assert_eq!(err.message, "Fax API error (503): maintenance");
    }

    #[test]
    fn test_transport_failure_is_internal() {
        let err = upstream_error(&ClientError::InvalidResponse("empty body".into()));
        assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);
        assert!(err.message.contains("empty body"));
    }
}
