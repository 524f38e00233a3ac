//! Error types for the happi client.
//!
//! # Design
//! Responses whose status appears in [`ERROR_TABLE`] become [`Error::Api`],
//! carrying an [`ErrorKind`] that callers match on. Every other status is a
//! success as far as the client is concerned. Network failures are kept
//! apart in [`Error::Transport`] so they never masquerade as API errors.

use std::fmt;

use serde_json::Value;

/// The fixed taxonomy of API failures, one per mapped HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    NotAcceptable,
    RequestTimeout,
    UnprocessableEntity,
    TooManyRequests,
    InternalServerError,
    BadGateway,
    ServiceUnavailable,
    GatewayTimeout,
}

/// Status code to error kind. Statuses not listed here are never raised.
pub const ERROR_TABLE: [(u16, ErrorKind); 12] = [
    (400, ErrorKind::BadRequest),
    (401, ErrorKind::Unauthorized),
    (403, ErrorKind::Forbidden),
    (404, ErrorKind::NotFound),
    (406, ErrorKind::NotAcceptable),
    (408, ErrorKind::RequestTimeout),
    (422, ErrorKind::UnprocessableEntity),
    (429, ErrorKind::TooManyRequests),
    (500, ErrorKind::InternalServerError),
    (502, ErrorKind::BadGateway),
    (503, ErrorKind::ServiceUnavailable),
    (504, ErrorKind::GatewayTimeout),
];

impl ErrorKind {
    /// Look up the kind raised for `status`, if any.
    pub fn from_status(status: u16) -> Option<Self> {
        ERROR_TABLE
            .iter()
            .find(|(code, _)| *code == status)
            .map(|(_, kind)| *kind)
    }

    /// The HTTP status this kind is raised for.
    pub fn status(self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::NotAcceptable => 406,
            ErrorKind::RequestTimeout => 408,
            ErrorKind::UnprocessableEntity => 422,
            ErrorKind::TooManyRequests => 429,
            ErrorKind::InternalServerError => 500,
            ErrorKind::BadGateway => 502,
            ErrorKind::ServiceUnavailable => 503,
            ErrorKind::GatewayTimeout => 504,
        }
    }

    fn name(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad request",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not found",
            ErrorKind::NotAcceptable => "not acceptable",
            ErrorKind::RequestTimeout => "request timeout",
            ErrorKind::UnprocessableEntity => "unprocessable entity",
            ErrorKind::TooManyRequests => "too many requests",
            ErrorKind::InternalServerError => "internal server error",
            ErrorKind::BadGateway => "bad gateway",
            ErrorKind::ServiceUnavailable => "service unavailable",
            ErrorKind::GatewayTimeout => "gateway timeout",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.status())
    }
}

/// A mapped failure returned by the API.
///
/// `message` is the response body's `errors` field when the server sent a
/// truthy one, otherwise the whole decoded body.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: Value,
}

/// Network-level failures from a [`Transport`](crate::Transport).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// Errors returned by [`Client`](crate::Client).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The server answered with a status from [`ERROR_TABLE`].
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Construction options or environment overrides were invalid.
    #[error("invalid client configuration: {0}")]
    Config(String),

    /// Request parameters could not be encoded for the chosen method.
    #[error("cannot encode request parameters: {0}")]
    Encode(String),

    /// A JSON response body failed to parse.
    #[error("invalid JSON response body: {0}")]
    Decode(#[source] serde_json::Error),
}

impl Error {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Api(api) => Some(api.kind),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.kind().map(ErrorKind::status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn table_round_trips_through_status() {
        for (code, kind) in ERROR_TABLE {
            assert_eq!(ErrorKind::from_status(code), Some(kind));
            assert_eq!(kind.status(), code);
        }
    }

    #[test]
    fn unmapped_statuses_have_no_kind() {
        for code in [200, 201, 204, 301, 405, 418, 501, 505, 999] {
            assert_eq!(ErrorKind::from_status(code), None, "{code}");
        }
    }

    #[test]
    fn api_error_display_includes_kind_and_message() {
        let err = Error::from(ApiError {
            kind: ErrorKind::UnprocessableEntity,
            message: json!(["bad field"]),
        });
        assert_eq!(
            err.to_string(),
            r#"unprocessable entity (422): ["bad field"]"#
        );
        assert_eq!(err.status(), Some(422));
    }

    #[test]
    fn transport_errors_have_no_kind() {
        let err = Error::from(TransportError::Timeout);
        assert_eq!(err.kind(), None);
        assert_eq!(err.to_string(), "transport error: request timed out");
    }
}
