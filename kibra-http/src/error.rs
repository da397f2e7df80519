//! Error types for the REST client.

use http::StatusCode;

/// Errors that can occur while talking to the KibraConnect API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// URL parse error.
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        /// Human-readable context.
        context: &'static str,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },
    /// HTTP transport or middleware error.
    #[error("HTTP error: {context}: {source}")]
    Http {
        /// Human-readable context.
        context: &'static str,
        /// The underlying error.
        #[source]
        source: reqwest_middleware::Error,
    },
    /// JSON deserialization error.
    #[error("Failed to deserialize JSON: {context}: {source}")]
    JsonDeserialization {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// Unexpected HTTP status code.
    #[error("Unexpected HTTP status {status}: {context}: {body}")]
    HttpStatus {
        /// Human-readable context.
        context: &'static str,
        /// The HTTP status code.
        status: StatusCode,
        /// The response body.
        body: String,
    },
    /// Failed to read response body.
    #[error("Failed to read response body as text: {context}: {source}")]
    ResponseBodyRead {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// The request was rejected before being sent.
    #[error("Invalid input: {context}: {reason}")]
    InvalidInput {
        /// Human-readable context.
        context: &'static str,
        /// What was wrong.
        reason: &'static str,
    },
}

impl ApiError {
    /// Returns the HTTP status for [`ApiError::HttpStatus`] errors.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if the backend rejected the bearer token.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Returns `true` if the backend answered 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// Returns the server-provided `error` or `detail` text of an error
    /// response body, if it has one.
    #[must_use]
    pub fn server_message(&self) -> Option<String> {
        let Self::HttpStatus { body, .. } = self else {
            return None;
        };
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        ["error", "detail"]
            .iter()
            .find_map(|key| value.get(key)?.as_str())
            .filter(|msg| !msg.is_empty())
            .map(ToOwned::to_owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(status: StatusCode, body: &str) -> ApiError {
        ApiError::HttpStatus {
            context: "GET /test",
            status,
            body: body.to_owned(),
        }
    }

    #[test]
    fn test_server_message_prefers_error_field() {
        let err = status_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":"card declined","detail":"other"}"#,
        );
        assert_eq!(err.server_message().as_deref(), Some("card declined"));
    }

    #[test]
    fn test_server_message_detail_fallback() {
        let err = status_error(StatusCode::UNAUTHORIZED, r#"{"detail":"Invalid token."}"#);
        assert_eq!(err.server_message().as_deref(), Some("Invalid token."));
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_server_message_non_json() {
        let err = status_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert_eq!(err.server_message(), None);
        assert!(!err.is_not_found());
    }
}
