use std::sync::Arc;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    crypto::{CryptoError, DecryptionError},
    jwt::ClaimError,
    response::{RequestInfo, ResponseInfo},
};

/// Result type for client construction and configuration.
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration errors raised while building a [`RequestManager`](crate::RequestManager).
///
/// Failures of individual requests are reported as [`RequestError`].
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// App names are made of lowercase letters, digits and dashes.
    #[error("invalid app name {0:?}, use lowercase letters, digits and dashes")]
    InvalidAppName(String),
    /// The base URL does not parse.
    #[error("invalid base_url configuration")]
    InvalidBaseUrl(#[source] url::ParseError),
    /// The private key is too short to derive the request secret, or starts with non-ASCII
    /// characters.
    #[error("private key must start with at least 16 ASCII characters")]
    InvalidPrivateKey,
    /// The HTTP client could not be built, usually a TLS backend issue.
    #[error("failed to build HTTP client")]
    HttpClient(#[source] Arc<reqwest::Error>),
    // std::io::Error is not clonable, so we're wrapping it in an Arc.
    /// I/O failure while setting up the client.
    #[error(transparent)]
    Io(Arc<std::io::Error>),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(Arc::new(value))
    }
}

/// Shareable boxed error, used where the underlying error type varies.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// What was being encoded when [`Cause::EncodingFailed`] occurred.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum EncodingContext {
    /// Query parameters.
    #[display(fmt = "query string")]
    QueryString,
    /// JSON request body.
    #[display(fmt = "body")]
    Body,
    /// Payload embedded in the signed claim.
    #[display(fmt = "secure data")]
    SecureData,
    /// Multipart form data, usually because a file could not be read.
    #[display(fmt = "multipart form data")]
    Multipart,
}

/// Transport-level failure.
#[derive(Error, Debug, Clone)]
pub enum NetworkError {
    /// [`Cancellable::cancel`](crate::Cancellable::cancel) was called.
    #[error("request was cancelled")]
    Cancelled,
    /// Failure reported by the HTTP client: connection, TLS, timeout.
    #[error(transparent)]
    Transport(Arc<reqwest::Error>),
    /// I/O failure while reading the response.
    #[error(transparent)]
    Io(Arc<std::io::Error>),
}

/// Closed set of reasons a request can fail.
#[derive(Error, Debug, Clone)]
pub enum Cause {
    /// The request never got a complete response.
    #[error("network error")]
    Network(#[source] NetworkError),
    /// The endpoint path does not form a valid URL with the base URL.
    #[error("invalid URL")]
    InvalidURL,
    /// A request part could not be encoded.
    #[error("failed to encode {context}")]
    EncodingFailed {
        /// What was being encoded.
        context: EncodingContext,
        /// Underlying encoder error.
        #[source]
        source: SharedError,
    },
    /// The response body does not decode to the expected type.
    #[error("failed to decode response")]
    DecodingFailed(#[source] SharedError),
    /// The response status is not 2xx.
    #[error("unacceptable status code {0}")]
    BadStatusCode(u16),
    /// The request needs a user token and the provider has none.
    #[error("user authentication token is missing")]
    MissingAuthenticationToken,
    /// The `X-AP-Authorization` value could not be produced.
    #[error("failed to create JWT")]
    SignedClaimCreationFailed(#[source] ClaimError),
    /// The request body could not be encrypted.
    #[error("failed to encrypt request body")]
    EncryptionFailed(#[source] CryptoError),
    /// The response was expected to be encrypted and could not be decrypted.
    #[error("failed to decrypt response body")]
    DecryptionFailed(#[source] DecryptionError),
    /// Catch-all for failures that fit nowhere else.
    #[error("unknown error")]
    Unknown,
}

impl Cause {
    pub(crate) fn encoding(
        context: EncodingContext,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Cause {
        Cause::EncodingFailed {
            context,
            source: Arc::new(source),
        }
    }
}

/// Error payload the backend puts in failed responses:
/// `{"error": {"code": 42, "key": "bad_key", "message": "Bad key"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendErrorInfo {
    /// Backend error code.
    pub code: i64,
    /// Stable machine-readable key.
    pub key: String,
    /// Human-readable message.
    pub message: String,
}

impl BackendErrorInfo {
    /// Parse a response body. Returns `None` when the body does not have the expected shape.
    pub fn from_body(body: &[u8]) -> Option<BackendErrorInfo> {
        #[derive(Deserialize)]
        struct Root {
            error: BackendErrorInfo,
        }

        serde_json::from_slice::<Root>(body).ok().map(|root| root.error)
    }
}

/// A failed request.
///
/// Carries whatever context was available when the request failed. Errors recorded while the
/// request was being built have neither `request` nor `response`.
#[derive(Error, Debug, Clone)]
#[error("request failed: {cause}")]
pub struct RequestError {
    /// Request as sent, when it was sent.
    pub request: Option<RequestInfo>,
    /// Response head, when one was received.
    pub response: Option<ResponseInfo>,
    /// Raw response body, as received.
    pub data: Option<Vec<u8>>,
    /// Why the request failed.
    #[source]
    pub cause: Cause,
    /// Parsed from `data` whatever the cause.
    pub backend_info: Option<BackendErrorInfo>,
}

impl RequestError {
    /// Build an error, parsing [`BackendErrorInfo`] out of `data`.
    pub fn new(
        request: Option<RequestInfo>,
        response: Option<ResponseInfo>,
        data: Option<Vec<u8>>,
        cause: Cause,
    ) -> RequestError {
        let backend_info = data.as_deref().and_then(BackendErrorInfo::from_body);
        RequestError {
            request,
            response,
            data,
            cause,
            backend_info,
        }
    }

    pub(crate) fn from_cause(cause: Cause) -> RequestError {
        RequestError::new(None, None, None, cause)
    }

    /// HTTP status of the response, if any.
    pub fn status_code(&self) -> Option<u16> {
        self.response.as_ref().map(|response| response.status.as_u16())
    }

    /// Whether the request was cancelled.
    pub fn is_cancelled_error(&self) -> bool {
        matches!(self.cause, Cause::Network(NetworkError::Cancelled))
    }

    /// Whether the request hit its timeout.
    pub fn is_timed_out_error(&self) -> bool {
        match &self.cause {
            Cause::Network(NetworkError::Transport(err)) => err.is_timeout(),
            Cause::Network(NetworkError::Io(err)) => err.kind() == std::io::ErrorKind::TimedOut,
            _ => false,
        }
    }

    /// Whether the backend could not be reached.
    pub fn is_no_connection_error(&self) -> bool {
        match &self.cause {
            Cause::Network(NetworkError::Transport(err)) => err.is_connect(),
            Cause::Network(NetworkError::Io(err)) => matches!(
                err.kind(),
                std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::NotConnected
            ),
            _ => false,
        }
    }

    /// Whether the failure is worth retrying once connectivity is back.
    pub fn is_no_connection_or_timed_out_error(&self) -> bool {
        self.is_no_connection_error() || self.is_timed_out_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_backend_error() {
        let error = RequestError::new(
            None,
            None,
            Some(br#"{"error":{"code":42,"key":"bad_key","message":"Bad key"}}"#.to_vec()),
            Cause::BadStatusCode(400),
        );
        assert_eq!(
            error.backend_info,
            Some(BackendErrorInfo {
                code: 42,
                key: "bad_key".to_owned(),
                message: "Bad key".to_owned(),
            })
        );
    }

    #[test]
    fn backend_error_is_attached_whatever_the_cause() {
        let error = RequestError::new(
            None,
            None,
            Some(br#"{"error":{"code":1,"key":"k","message":"m"}}"#.to_vec()),
            Cause::DecryptionFailed(DecryptionError::InvalidData),
        );
        assert_eq!(error.backend_info.map(|info| info.code), Some(1));
    }

    #[test]
    fn malformed_backend_error_is_ignored() {
        for body in [
            &b""[..],
            &b"not json"[..],
            &br#"{"code":42,"key":"bad_key","message":"Bad key"}"#[..],
            &br#"{"error":{"code":"42","key":"bad_key","message":"Bad key"}}"#[..],
            &br#"{"error":{"code":42,"key":"bad_key"}}"#[..],
        ] {
            assert_eq!(BackendErrorInfo::from_body(body), None);
        }
    }

    #[test]
    fn cancellation_helpers() {
        let cancelled = RequestError::from_cause(Cause::Network(NetworkError::Cancelled));
        assert!(cancelled.is_cancelled_error());
        assert!(!cancelled.is_no_connection_or_timed_out_error());

        let refused = RequestError::from_cause(Cause::Network(NetworkError::Io(Arc::new(
            std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
        ))));
        assert!(refused.is_no_connection_error());
        assert!(!refused.is_cancelled_error());
    }

    #[test]
    fn encoding_context_display() {
        let cause = Cause::encoding(
            EncodingContext::SecureData,
            std::io::Error::from(std::io::ErrorKind::InvalidData),
        );
        assert_eq!(cause.to_string(), "failed to encode secure data");
    }
}
