use std::sync::Arc;

use reqwest::{header::HeaderMap, Method, StatusCode};
use url::Url;

/// Snapshot of a request as it was sent.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    /// HTTP method.
    pub method: Method,
    /// URL including the query string.
    pub url: Url,
    /// Header fields as sent, secured ones included.
    pub headers: HeaderMap,
}

impl RequestInfo {
    pub(crate) fn from_request(request: &reqwest::Request) -> RequestInfo {
        RequestInfo {
            method: request.method().clone(),
            url: request.url().clone(),
            headers: request.headers().clone(),
        }
    }
}

/// Status line and headers of a received response.
#[derive(Debug, Clone)]
pub struct ResponseInfo {
    /// HTTP status.
    pub status: StatusCode,
    /// Response header fields.
    pub headers: HeaderMap,
    /// Final URL, after redirects.
    pub url: Url,
}

impl ResponseInfo {
    pub(crate) fn from_response(response: &reqwest::Response) -> ResponseInfo {
        ResponseInfo {
            status: response.status(),
            headers: response.headers().clone(),
            url: response.url().clone(),
        }
    }

    /// Header value as text, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// Successful response. `data` is already decrypted when the request asked for it.
#[derive(Debug, Clone)]
pub struct DataResponse {
    /// Response body.
    pub data: Vec<u8>,
    /// Same as `response.status`.
    pub status_code: u16,
    /// Request as sent.
    pub request: RequestInfo,
    /// Response head.
    pub response: ResponseInfo,
}

/// Successful response whose body was decoded into `T`.
#[derive(Debug, Clone)]
pub struct ObjectResponse<T> {
    /// Decoded body.
    pub object: T,
    /// Body the object was decoded from.
    pub data: Vec<u8>,
    /// Same as `response.status`.
    pub status_code: u16,
    /// Request as sent.
    pub request: RequestInfo,
    /// Response head.
    pub response: ResponseInfo,
}

impl<T> ObjectResponse<T> {
    pub(crate) fn new(object: T, response: DataResponse) -> ObjectResponse<T> {
        ObjectResponse {
            object,
            data: response.data,
            status_code: response.status_code,
            request: response.request,
            response: response.response,
        }
    }
}

/// Download progress of a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Bytes received so far.
    pub completed: u64,
    /// Expected body size, when the server announced it.
    pub total: Option<u64>,
}

impl Progress {
    /// Completed fraction in `0.0..=1.0`, when the total size is known.
    pub fn fraction(&self) -> Option<f64> {
        match self.total {
            Some(0) => Some(1.0),
            Some(total) => Some((self.completed as f64 / total as f64).min(1.0)),
            None => None,
        }
    }
}

/// Callback receiving [`Progress`] updates while a body downloads.
pub type DownloadProgressHandler = Arc<dyn Fn(Progress) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::Progress;

    #[test]
    fn progress_fraction() {
        let progress = |completed, total| Progress { completed, total };
        assert_eq!(progress(50, Some(200)).fraction(), Some(0.25));
        assert_eq!(progress(0, Some(0)).fraction(), Some(1.0));
        assert_eq!(progress(10, None).fraction(), None);
    }
}
