//! Mapping of underlying library errors onto [`Cause`].
//!
//! Classification is a pure function of the error value and holds no state.
use std::sync::Arc;

use crate::error::{Cause, NetworkError};

impl Cause {
    /// Classify any underlying error. Shapes that are not recognized become [`Cause::Unknown`].
    pub fn classify(error: Box<dyn std::error::Error + Send + Sync + 'static>) -> Cause {
        let error = match error.downcast::<reqwest::Error>() {
            Ok(error) => return Cause::from(*error),
            Err(error) => error,
        };
        let error = match error.downcast::<std::io::Error>() {
            Ok(error) => return Cause::Network(NetworkError::Io(Arc::new(*error))),
            Err(error) => error,
        };
        let error = match error.downcast::<serde_json::Error>() {
            Ok(error) => return Cause::DecodingFailed(Arc::new(*error)),
            Err(error) => error,
        };
        if error.is::<url::ParseError>() {
            log::warn!(target: "appspanel", "invalid URL: {}", error);
            return Cause::InvalidURL;
        }

        log::warn!(target: "appspanel", "unknown error: {:?}", error);
        Cause::Unknown
    }

    /// Cause for a response outside the `200..=299` range.
    pub fn from_status(status: reqwest::StatusCode) -> Cause {
        Cause::BadStatusCode(status.as_u16())
    }
}

impl From<reqwest::Error> for Cause {
    fn from(error: reqwest::Error) -> Self {
        if error.is_builder() {
            log::warn!(target: "appspanel", "invalid request: {}", error);
            return Cause::InvalidURL;
        }
        if let Some(status) = error.status() {
            return Cause::from_status(status);
        }
        if error.is_decode() {
            return Cause::DecodingFailed(Arc::new(error.without_url()));
        }
        if error.is_timeout()
            || error.is_connect()
            || error.is_request()
            || error.is_body()
            || error.is_redirect()
        {
            log::debug!(target: "appspanel", "network error: {:?}", error);
            return Cause::Network(NetworkError::Transport(Arc::new(error)));
        }

        log::warn!(target: "appspanel", "unknown error: {:?}", error);
        Cause::Unknown
    }
}
