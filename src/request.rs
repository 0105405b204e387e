use std::{sync::Arc, time::Duration};

use chrono::Utc;
use reqwest::header::{Entry, HeaderMap, HeaderName, HeaderValue};
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::{
    cancellable::{Cancellable, CancellableToken, RequestHandle},
    crypto::{encrypt_then_encode, random_iv_string},
    header,
    jwt::JsonWebToken,
    response::{DownloadProgressHandler, Progress, RequestInfo},
    transport,
    upload::FormData,
    Cause, DataResponse, EncodingContext, Headers, HttpMethod, NetworkError, ObjectResponse,
    Parameters, RequestError, RequestManager, Security, SecurityOptions,
};

/// A request being configured.
///
/// Configuration methods consume and return the request so they can be chained. The first
/// failure recorded while configuring (e.g. a body that does not serialize) becomes the
/// request's terminal error: later configuration calls are ignored, and sending the request
/// delivers that error without any network call.
///
/// Created by [`RequestManager::request`] and [`RequestManager::request_endpoint`].
pub struct DataRequest {
    manager: RequestManager,
    state: RequestState,
    cancellation: Arc<CancellableToken>,
}

enum RequestState {
    Configuring(Box<RequestParts>),
    Failed(Cause),
}

struct RequestParts {
    method: HttpMethod,
    url: Url,
    body: Option<Vec<u8>>,
    content_type: ContentType,
    headers: Headers,
    security: Security,
    timeout: Option<Duration>,
    download_progress: Option<DownloadProgressHandler>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ContentType {
    Json,
    MultipartFormData { boundary: String },
}

impl ContentType {
    fn header_value(&self) -> String {
        match self {
            ContentType::Json => "application/json".to_owned(),
            ContentType::MultipartFormData { boundary } => {
                format!("multipart/form-data; boundary={boundary}")
            }
        }
    }
}

/// A finalized request, ready to be executed.
pub struct PreparedRequest {
    request: reqwest::Request,
    options: SecurityOptions,
    download_progress: Option<DownloadProgressHandler>,
}

impl PreparedRequest {
    /// The request as it goes on the wire.
    pub fn request(&self) -> &reqwest::Request {
        &self.request
    }

    /// How the request was secured.
    pub fn security_options(&self) -> SecurityOptions {
        self.options
    }
}

impl std::fmt::Debug for PreparedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedRequest")
            .field("request", &self.request)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for DataRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("DataRequest");
        match &self.state {
            RequestState::Configuring(parts) => debug
                .field("method", &parts.method)
                .field("url", &parts.url.as_str())
                .field("security", &parts.security.options),
            RequestState::Failed(cause) => debug.field("error", cause),
        };
        debug
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish()
    }
}

impl DataRequest {
    pub(crate) fn new(manager: RequestManager, method: HttpMethod, url: Url) -> DataRequest {
        let security = Security::new(manager.default_security_options());
        DataRequest {
            manager,
            state: RequestState::Configuring(Box::new(RequestParts {
                method,
                url,
                body: None,
                content_type: ContentType::Json,
                headers: Headers::new(),
                security,
                timeout: None,
                download_progress: None,
            })),
            cancellation: CancellableToken::new(),
        }
    }

    pub(crate) fn failed(manager: RequestManager, cause: Cause) -> DataRequest {
        log::warn!(target: "appspanel", "failed to create request: {cause}");
        DataRequest {
            manager,
            state: RequestState::Failed(cause),
            cancellation: CancellableToken::new(),
        }
    }

    /// Terminal error recorded while configuring, if any.
    pub fn error(&self) -> Option<&Cause> {
        match &self.state {
            RequestState::Configuring(_) => None,
            RequestState::Failed(cause) => Some(cause),
        }
    }

    /// Current security configuration. `None` once the request has failed.
    pub fn security(&self) -> Option<&Security> {
        match &self.state {
            RequestState::Configuring(parts) => Some(&parts.security),
            RequestState::Failed(_) => None,
        }
    }

    /// Handle that cancels this request, wherever it ends up running.
    pub fn handle(&self) -> RequestHandle {
        RequestHandle::new(self.cancellation.clone())
    }

    /// Apply `configure` unless the request already failed. An error becomes terminal.
    fn configure(mut self, configure: impl FnOnce(&mut RequestParts) -> Result<(), Cause>) -> Self {
        if let RequestState::Configuring(parts) = &mut self.state {
            if let Err(cause) = configure(&mut **parts) {
                log::warn!(target: "appspanel", "failed to configure request: {cause}");
                self.state = RequestState::Failed(cause);
            }
        }
        self
    }

    // MARK: Configure the request

    /// Serialize `body` as JSON and use it as the request body.
    pub fn set_body<T: Serialize + ?Sized>(self, body: &T) -> Self {
        self.configure(|parts| {
            let body = serde_json::to_vec(body)
                .map_err(|err| Cause::encoding(EncodingContext::Body, err))?;
            parts.body = Some(body);
            parts.content_type = ContentType::Json;
            Ok(())
        })
    }

    /// Use `body` as the JSON body.
    pub fn set_json_body(self, body: Parameters) -> Self {
        self.set_body(&body)
    }

    /// Use `form_data` as a `multipart/form-data` body.
    pub fn set_form_data(self, form_data: FormData) -> Self {
        self.configure(|parts| {
            parts.content_type = ContentType::MultipartFormData {
                boundary: form_data.boundary().to_owned(),
            };
            parts.body = Some(form_data.into_data());
            Ok(())
        })
    }

    /// Build a `multipart/form-data` body with `build`. A failure is recorded as
    /// [`EncodingContext::Multipart`].
    pub fn set_multipart<E>(self, build: impl FnOnce(&mut FormData) -> Result<(), E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let mut form_data = FormData::new();
        match build(&mut form_data) {
            Ok(()) => self.set_form_data(form_data),
            Err(err) => self.configure(|_| Err(Cause::encoding(EncodingContext::Multipart, err))),
        }
    }

    /// Replace the request's own headers. They take precedence over custom and default headers.
    pub fn set_headers(self, headers: Headers) -> Self {
        self.configure(|parts| {
            parts.headers = headers;
            Ok(())
        })
    }

    /// Override the security options.
    pub fn secure(self, options: SecurityOptions) -> Self {
        self.configure(|parts| {
            parts.security.options = options;
            Ok(())
        })
    }

    /// Serialize `data` as JSON and embed it in the signed claim.
    pub fn secure_data<T: Serialize + ?Sized>(self, data: &T) -> Self {
        self.configure(|parts| {
            let data = serde_json::to_vec(data)
                .map_err(|err| Cause::encoding(EncodingContext::SecureData, err))?;
            parts.security.secure_data = Some(data);
            Ok(())
        })
    }

    /// Embed `data` as-is in the signed claim.
    pub fn set_secure_data(self, data: Vec<u8>) -> Self {
        self.configure(|parts| {
            parts.security.secure_data = Some(data);
            Ok(())
        })
    }

    /// Embed the user's authentication token in the signed claim.
    pub fn use_user_token(self) -> Self {
        self.configure(|parts| {
            parts.security.uses_user_token = true;
            Ok(())
        })
    }

    /// Timeout of this request only.
    pub fn set_timeout(self, timeout: Duration) -> Self {
        self.configure(|parts| {
            parts.timeout = Some(timeout);
            Ok(())
        })
    }

    /// Call `handler` as the response body arrives.
    pub fn download_progress(self, handler: impl Fn(Progress) + Send + Sync + 'static) -> Self {
        self.configure(|parts| {
            parts.download_progress = Some(Arc::new(handler));
            Ok(())
        })
    }

    // MARK: Build the request

    /// Finalize the request: merge headers, resolve the timeout, attach the body and apply
    /// security.
    pub fn build(self) -> Result<PreparedRequest, RequestError> {
        finalize(&self.manager, self.state).map_err(RequestError::from_cause)
    }

    // MARK: Make calls

    /// Send the request and wait for the response.
    ///
    /// Cancelling through a [`handle`](Self::handle) resolves this with a cancellation error.
    /// The cancellation suppression of [`RequestManager::inhibits_cancellation_errors`] only
    /// applies to completion handlers.
    pub async fn send(self) -> Result<DataResponse, RequestError> {
        let DataRequest {
            manager,
            state,
            cancellation,
        } = self;

        if cancellation.is_cancelled() {
            return Err(RequestError::from_cause(Cause::Network(NetworkError::Cancelled)));
        }

        let prepared = finalize(&manager, state).map_err(RequestError::from_cause)?;
        let request_info = RequestInfo::from_request(&prepared.request);

        tokio::select! {
            biased;
            _ = cancellation.cancelled() => {
                log::debug!(target: "appspanel", url = request_info.url.as_str(); "request cancelled");
                Err(RequestError::new(
                    Some(request_info),
                    None,
                    None,
                    Cause::Network(NetworkError::Cancelled),
                ))
            }
            result = transport::execute(
                manager.client(),
                prepared.request,
                prepared.options,
                manager.secret(),
                prepared.download_progress.as_ref(),
            ) => result,
        }
    }

    /// Send the request and decode the JSON response body into `T`.
    pub async fn response_object<T: DeserializeOwned>(
        self,
    ) -> Result<ObjectResponse<T>, RequestError> {
        decode_object(self.send().await?)
    }

    /// Send the request on the manager's runtime and hand the result to `completion`.
    ///
    /// When the request is cancelled and the manager inhibits cancellation errors, `completion`
    /// is never called.
    pub fn response_data_with<F>(self, completion: F) -> RequestHandle
    where
        F: FnOnce(Result<DataResponse, RequestError>) + Send + 'static,
    {
        let handle = self.handle();
        let manager = self.manager.clone();
        manager.clone().spawn(async move {
            let result = self.send().await;
            manager.deliver(result, completion);
        });
        handle
    }

    /// Like [`response_data_with`](Self::response_data_with), decoding the body into `T`.
    pub fn response_object_with<T, F>(self, completion: F) -> RequestHandle
    where
        T: DeserializeOwned + Send + 'static,
        F: FnOnce(Result<ObjectResponse<T>, RequestError>) + Send + 'static,
    {
        let handle = self.handle();
        let manager = self.manager.clone();
        manager.clone().spawn(async move {
            let result = self.response_object::<T>().await;
            manager.deliver(result, completion);
        });
        handle
    }
}

impl Cancellable for DataRequest {
    fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    fn cancel(&self) {
        self.cancellation.cancel()
    }
}

fn decode_object<T: DeserializeOwned>(
    response: DataResponse,
) -> Result<ObjectResponse<T>, RequestError> {
    match serde_json::from_slice(&response.data) {
        Ok(object) => Ok(ObjectResponse::new(object, response)),
        Err(err) => {
            log::warn!(target: "appspanel", url = response.request.url.as_str(); "failed to decode response: {err}");
            Err(RequestError::new(
                Some(response.request),
                Some(response.response),
                Some(response.data),
                Cause::DecodingFailed(Arc::new(err)),
            ))
        }
    }
}

fn finalize(manager: &RequestManager, state: RequestState) -> Result<PreparedRequest, Cause> {
    let parts = match state {
        RequestState::Configuring(parts) => *parts,
        RequestState::Failed(cause) => return Err(cause),
    };
    let RequestParts {
        method,
        url,
        body,
        content_type,
        headers: request_headers,
        security,
        timeout,
        download_progress,
    } = parts;
    let settings = manager.settings();

    // Request headers win over custom headers, which win over defaults.
    let mut headers = HeaderMap::new();
    merge_headers(&mut headers, request_headers.iter());
    merge_headers(&mut headers, settings.custom_headers.iter());
    merge_headers(&mut headers, default_headers(manager));

    let iv = random_iv_string();
    let secret = manager.secret();

    let mut builder = manager.client().request(method.into(), url);

    if let Some(timeout) = timeout.or(settings.default_timeout) {
        builder = builder.timeout(timeout);
    }

    if let Some(body) = body {
        if method == HttpMethod::Get {
            log::warn!(target: "appspanel", "ignoring the body because the request's method is GET");
        } else {
            if let Entry::Vacant(entry) = headers.entry(header::CONTENT_TYPE) {
                entry.insert(header_value(&content_type.header_value())?);
            }

            // Only JSON bodies are encrypted, multipart bodies go out as built.
            let encrypts = content_type == ContentType::Json
                && security.options.contains(SecurityOptions::ENCRYPT_REQUEST);
            let body = if encrypts {
                encrypt_then_encode(&body, secret, &iv)
                    .map_err(Cause::EncryptionFailed)?
                    .into_bytes()
            } else {
                body
            };
            builder = builder.body(body);
        }
    }

    if !security.options.is_none() {
        headers.insert(header::SECRET, header_value(&iv)?);
    }

    if security.options.contains(SecurityOptions::JSON_WEB_TOKEN) {
        let user_token = if security.uses_user_token {
            match manager.token_provider().token() {
                Some(token) => Some(token),
                None => return Err(Cause::MissingAuthenticationToken),
            }
        } else {
            None
        };

        let authorization = JsonWebToken::new(manager.app_name(), secret, &iv)
            .produce(user_token, security.secure_data, security.options)
            .map_err(Cause::SignedClaimCreationFailed)?;
        headers.insert(header::AUTHORIZATION, header_value(&authorization)?);
    }

    log::trace!(target: "appspanel", "request headers: {:?}", headers.keys().collect::<Vec<_>>());

    let request = builder.headers(headers).build()?;
    Ok(PreparedRequest {
        request,
        options: security.options,
        download_progress,
    })
}

fn default_headers(manager: &RequestManager) -> Vec<(&'static str, String)> {
    let device = manager.device_info();
    let mut headers = vec![
        (header::APP_KEY, manager.app_key().to_owned()),
        (header::REAL_TIME, Utc::now().timestamp().to_string()),
        (header::OS, device.os),
        (header::DEVICE_UID, device.device_uid),
        (header::SESSION_ID, device.session_id),
    ];
    if let Some(app_version) = device.app_version {
        headers.push((header::APP_VERSION, app_version));
    }
    if let Some(build_version) = device.build_version {
        headers.push((header::BUILD_VERSION, build_version));
    }
    headers.push((header::SDK_VERSION, env!("CARGO_PKG_VERSION").to_owned()));
    headers.push((header::ACCEPT_CHARSET, "utf-8".to_owned()));
    headers.push((header::ACCEPT_LANGUAGE, device.language));
    headers
}

/// Insert each field unless the map already has a value for its name.
fn merge_headers<K, V>(headers: &mut HeaderMap, fields: impl IntoIterator<Item = (K, V)>)
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    for (name, value) in fields {
        let (name, value) = (name.as_ref(), value.as_ref());
        let (Ok(header_name), Ok(header_value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) else {
            log::warn!(target: "appspanel", header = name; "skipping invalid header");
            continue;
        };
        if let Entry::Vacant(entry) = headers.entry(header_name) {
            entry.insert(header_value);
        }
    }
}

fn header_value(value: &str) -> Result<HeaderValue, Cause> {
    HeaderValue::from_str(value).map_err(|err| {
        log::warn!(target: "appspanel", "invalid header value: {err}");
        Cause::Unknown
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::ClientConfig;

    fn manager() -> RequestManager {
        ClientConfig::new("my-app", "app-key", "0123456789ABCDEF-private")
            .base_url("https://example.com")
            .to_client()
            .unwrap()
    }

    fn header_of<'a>(prepared: &'a PreparedRequest, name: &str) -> Option<&'a str> {
        prepared
            .request()
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    }

    #[test]
    fn get_body_is_ignored() {
        let prepared = manager()
            .request("sdk/texts", HttpMethod::Get, None)
            .set_body(&serde_json::json!({"a": 1}))
            .secure(SecurityOptions::NONE)
            .build()
            .unwrap();
        assert!(prepared.request().body().is_none());
        assert_eq!(header_of(&prepared, "Content-Type"), None);
    }

    #[test]
    fn post_body_sets_content_type() {
        let prepared = manager()
            .request("sdk/feedback", HttpMethod::Post, None)
            .set_body(&serde_json::json!({"a": 1}))
            .secure(SecurityOptions::NONE)
            .build()
            .unwrap();
        assert_eq!(
            prepared.request().body().and_then(|body| body.as_bytes()),
            Some(&br#"{"a":1}"#[..])
        );
        assert_eq!(header_of(&prepared, "Content-Type"), Some("application/json"));
    }

    #[test]
    fn request_headers_win_over_custom_and_default_headers() {
        let manager = manager();
        manager.set_custom_headers(HashMap::from([
            ("X-AP-Key".to_owned(), "custom".to_owned()),
            ("Accept-Language".to_owned(), "fr".to_owned()),
        ]));
        let prepared = manager
            .request("sdk/dialog", HttpMethod::Get, None)
            .set_headers(HashMap::from([("x-ap-key".to_owned(), "request".to_owned())]))
            .build()
            .unwrap();
        assert_eq!(header_of(&prepared, "X-AP-Key"), Some("request"));
        assert_eq!(header_of(&prepared, "Accept-Language"), Some("fr"));
        assert_eq!(header_of(&prepared, "Accept-Charset"), Some("utf-8"));
        assert_eq!(
            header_of(&prepared, "X-AP-SDKVersion"),
            Some(env!("CARGO_PKG_VERSION"))
        );
    }

    #[test]
    fn secret_header_follows_security_options() {
        let prepared = manager()
            .request("sdk/version", HttpMethod::Get, None)
            .secure(SecurityOptions::NONE)
            .build()
            .unwrap();
        assert_eq!(header_of(&prepared, "X-AP-Secret"), None);
        assert_eq!(header_of(&prepared, "X-AP-Authorization"), None);

        let prepared = manager()
            .request("sdk/version", HttpMethod::Get, None)
            .secure(SecurityOptions::ENCRYPT_RESPONSE)
            .build()
            .unwrap();
        let iv = header_of(&prepared, "X-AP-Secret").unwrap();
        assert_eq!(iv.len(), 16);
        assert!(iv.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(header_of(&prepared, "X-AP-Authorization"), None);
    }

    #[test]
    fn json_web_token_adds_authorization() {
        let prepared = manager()
            .request("sdk/version", HttpMethod::Get, None)
            .build()
            .unwrap();
        assert_eq!(prepared.security_options(), SecurityOptions::JSON_WEB_TOKEN);
        assert!(header_of(&prepared, "X-AP-Authorization").is_some());
    }

    #[test]
    fn missing_user_token_is_terminal() {
        let error = manager()
            .request("sdk/rating", HttpMethod::Post, None)
            .use_user_token()
            .build()
            .unwrap_err();
        assert!(matches!(error.cause, Cause::MissingAuthenticationToken));
        assert!(error.request.is_none());
    }

    #[test]
    fn user_token_from_provider_is_used() {
        let manager = manager();
        manager.token_provider().save_token("user-token").unwrap();
        let prepared = manager
            .request("sdk/rating", HttpMethod::Post, None)
            .use_user_token()
            .build()
            .unwrap();
        assert!(header_of(&prepared, "X-AP-Authorization").is_some());
    }

    #[test]
    fn first_error_wins() {
        // Maps with non-string keys cannot be serialized as JSON.
        let body = HashMap::from([((1u8, 2u8), 3u8)]);
        let request = manager()
            .request("sdk/feedback", HttpMethod::Post, None)
            .set_body(&body)
            .secure_data(&body)
            .use_user_token();
        assert!(matches!(
            request.error(),
            Some(Cause::EncodingFailed {
                context: EncodingContext::Body,
                ..
            })
        ));
        assert!(matches!(
            request.build().unwrap_err().cause,
            Cause::EncodingFailed {
                context: EncodingContext::Body,
                ..
            }
        ));
    }

    #[test]
    fn encrypted_body_is_base64_text() {
        let prepared = manager()
            .request("sdk/statistics", HttpMethod::Post, None)
            .set_body(&serde_json::json!({"pushes": []}))
            .secure(SecurityOptions::ENCRYPT_REQUEST)
            .build()
            .unwrap();
        let iv = header_of(&prepared, "X-AP-Secret").unwrap().to_owned();
        let body = prepared.request().body().and_then(|body| body.as_bytes()).unwrap();

        let secret = crate::crypto::Secret::derive("0123456789ABCDEF-private").unwrap();
        let plaintext = crate::crypto::decode_then_decrypt(body, &secret, &iv).unwrap();
        assert_eq!(plaintext, br#"{"pushes":[]}"#);
    }

    #[test]
    fn request_timeout_overrides_default_timeout() {
        let manager = manager();
        manager.set_default_timeout(Some(Duration::from_secs(10)));

        let prepared = manager
            .request("sdk/version", HttpMethod::Get, None)
            .build()
            .unwrap();
        assert_eq!(prepared.request().timeout(), Some(&Duration::from_secs(10)));

        let prepared = manager
            .request("sdk/version", HttpMethod::Get, None)
            .set_timeout(Duration::from_secs(3))
            .build()
            .unwrap();
        assert_eq!(prepared.request().timeout(), Some(&Duration::from_secs(3)));
    }

    #[test]
    fn multipart_failure_is_recorded() {
        let request = manager()
            .request("files/upload", HttpMethod::Post, None)
            .set_multipart(|form| form.append_file_at("file", "/nonexistent/appspanel-upload"));
        assert!(matches!(
            request.error(),
            Some(Cause::EncodingFailed {
                context: EncodingContext::Multipart,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn cancelled_before_send_performs_no_call() {
        let request = manager().request("sdk/version", HttpMethod::Get, None);
        request.cancel();
        request.cancel();
        let error = request.send().await.unwrap_err();
        assert!(error.is_cancelled_error());
        assert!(error.request.is_none());
    }
}
