use std::{
    future::Future,
    sync::{Arc, RwLock},
    time::Duration,
};

use url::Url;

use crate::{
    auth_token::AuthenticationTokenProvider,
    crypto::Secret,
    query,
    request::DataRequest,
    Cause, ClientConfig, DeviceInfo, EncodingContext, Endpoint, Error, Headers, HttpMethod,
    Parameters, RequestError, Result, SecurityOptions,
};

/// Entry point for backend calls.
///
/// Holds the app credentials, the derived [`Secret`] and the settings shared by all requests.
/// Cloning is cheap and clones share their settings.
///
/// ```no_run
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// use appspanel::{ClientConfig, HttpMethod, SecurityOptions};
///
/// let manager = ClientConfig::new("my-app", "app-key", "0123456789ABCDEF-private").to_client()?;
/// let response = manager
///     .request("sdk/version", HttpMethod::Get, None)
///     .secure(SecurityOptions::ALL)
///     .send()
///     .await?;
/// println!("{}", String::from_utf8_lossy(&response.data));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RequestManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    client: reqwest::Client,
    base_url: Url,
    app_name: String,
    app_key: String,
    secret: Secret,
    device: RwLock<DeviceInfo>,
    settings: RwLock<Settings>,
    token_provider: Arc<dyn AuthenticationTokenProvider + Send + Sync>,
    runtime: RequestRuntime,
}

/// Settings that may change after creation, e.g. once remote configuration arrives.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(crate) default_timeout: Option<Duration>,
    pub(crate) default_security_options: SecurityOptions,
    pub(crate) custom_headers: Headers,
    pub(crate) inhibits_cancellation_errors: bool,
}

impl RequestManager {
    pub(crate) fn new(config: ClientConfig) -> Result<RequestManager> {
        let base_url = config
            .base_url
            .unwrap_or_else(|| ClientConfig::default_base_url(&config.app_name));
        let base_url = Url::parse(&base_url).map_err(Error::InvalidBaseUrl)?;
        let secret = Secret::derive(&config.private_key)?;

        // Client holds a connection pool internally, so it's shared by all requests.
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| Error::HttpClient(Arc::new(err)))?;

        let runtime = RequestRuntime::new(config.runtime)?;

        log::debug!(target: "appspanel", base_url = base_url.as_str(); "request manager created");

        Ok(RequestManager {
            inner: Arc::new(ManagerInner {
                client,
                base_url,
                app_name: config.app_name,
                app_key: config.app_key,
                secret,
                device: RwLock::new(config.device),
                settings: RwLock::new(Settings {
                    default_timeout: config.default_timeout,
                    default_security_options: config.default_security_options,
                    custom_headers: config.custom_headers,
                    inhibits_cancellation_errors: config.inhibits_cancellation_errors,
                }),
                token_provider: config.token_provider,
                runtime,
            }),
        })
    }

    // MARK: Make a request

    /// Start building a request to `path`, relative to the base URL.
    ///
    /// Invalid query parameters are recorded on the returned request, which then fails when sent.
    pub fn request(
        &self,
        path: &str,
        method: HttpMethod,
        parameters: Option<&Parameters>,
    ) -> DataRequest {
        let mut url = match self.url(path) {
            Ok(url) => url,
            Err(cause) => return DataRequest::failed(self.clone(), cause),
        };

        if let Some(parameters) = parameters {
            match query::encode(parameters) {
                Ok(pairs) if !pairs.is_empty() => {
                    url.query_pairs_mut().extend_pairs(pairs);
                }
                Ok(_) => {}
                Err(err) => {
                    return DataRequest::failed(
                        self.clone(),
                        Cause::encoding(EncodingContext::QueryString, err),
                    )
                }
            }
        }

        DataRequest::new(self.clone(), method, url)
    }

    /// Start building the request described by `endpoint`.
    pub fn request_endpoint<E: Endpoint + ?Sized>(&self, endpoint: &E) -> DataRequest {
        let mut request = self.request(
            endpoint.path(),
            endpoint.http_method(),
            endpoint.parameters().as_ref(),
        );
        if let Some(body) = endpoint.body() {
            request = request.set_json_body(body);
        }
        if let Some(headers) = endpoint.headers() {
            request = request.set_headers(headers);
        }
        request = request.secure(endpoint.security_options());
        if let Some(secure_data) = endpoint.secure_data() {
            request = request.set_secure_data(secure_data);
        }
        request
    }

    /// `path` appended to the base URL path, segment by segment.
    fn url(&self, path: &str) -> std::result::Result<Url, Cause> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Cause::InvalidURL)?
            .pop_if_empty()
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    // MARK: Settings

    /// URL every endpoint path is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// App name sent in the signed claim.
    pub fn app_name(&self) -> &str {
        &self.inner.app_name
    }

    /// Sent as `X-AP-Key`.
    pub fn app_key(&self) -> &str {
        &self.inner.app_key
    }

    /// Where user tokens are read from.
    pub fn token_provider(&self) -> &(dyn AuthenticationTokenProvider + Send + Sync) {
        self.inner.token_provider.as_ref()
    }

    pub(crate) fn secret(&self) -> &Secret {
        &self.inner.secret
    }

    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.inner.client
    }

    pub(crate) fn settings(&self) -> Settings {
        match self.inner.settings.read() {
            Ok(settings) => settings.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn update_settings(&self, update: impl FnOnce(&mut Settings)) {
        match self.inner.settings.write() {
            Ok(mut settings) => update(&mut settings),
            Err(poisoned) => update(&mut poisoned.into_inner()),
        }
    }

    /// Snapshot of the device identity.
    pub fn device_info(&self) -> DeviceInfo {
        match self.inner.device.read() {
            Ok(device) => device.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the session identifier sent in `X-AP-SessionID`.
    pub fn set_session_id(&self, session_id: impl Into<String>) {
        let session_id = session_id.into();
        match self.inner.device.write() {
            Ok(mut device) => device.session_id = session_id,
            Err(poisoned) => poisoned.into_inner().session_id = session_id,
        }
    }

    /// Timeout of requests that do not set one.
    pub fn default_timeout(&self) -> Option<Duration> {
        self.settings().default_timeout
    }

    /// Change the default timeout. `None` falls back to the platform timeout.
    pub fn set_default_timeout(&self, timeout: Option<Duration>) {
        self.update_settings(|settings| settings.default_timeout = timeout);
    }

    /// Security of requests built from a path rather than an [`Endpoint`](crate::Endpoint).
    pub fn default_security_options(&self) -> SecurityOptions {
        self.settings().default_security_options
    }

    /// Change the default security options.
    pub fn set_default_security_options(&self, options: SecurityOptions) {
        self.update_settings(|settings| settings.default_security_options = options);
    }

    /// Headers added to every request.
    pub fn custom_headers(&self) -> Headers {
        self.settings().custom_headers
    }

    /// Replace the custom headers.
    pub fn set_custom_headers(&self, headers: Headers) {
        self.update_settings(|settings| settings.custom_headers = headers);
    }

    /// Whether completion handlers skip cancelled requests.
    pub fn inhibits_cancellation_errors(&self) -> bool {
        self.settings().inhibits_cancellation_errors
    }

    /// Set whether completion handlers skip cancelled requests.
    pub fn set_inhibits_cancellation_errors(&self, inhibits: bool) {
        self.update_settings(|settings| settings.inhibits_cancellation_errors = inhibits);
    }

    // MARK: Completion delivery

    pub(crate) fn spawn(&self, future: impl Future<Output = ()> + Send + 'static) {
        self.inner.runtime.spawn(future);
    }

    /// Hand `result` to `completion`, unless it is a cancellation and those are inhibited.
    pub(crate) fn deliver<T>(
        &self,
        result: std::result::Result<T, RequestError>,
        completion: impl FnOnce(std::result::Result<T, RequestError>),
    ) {
        if let Err(err) = &result {
            if err.is_cancelled_error() && self.inhibits_cancellation_errors() {
                log::debug!(target: "appspanel", "request cancelled, skipping completion");
                return;
            }
        }
        completion(result);
    }
}

/// Runtime completion handlers run on.
enum RequestRuntime {
    Shared(tokio::runtime::Handle),
    // Option so Drop can take it out.
    Owned(Option<tokio::runtime::Runtime>),
}

impl RequestRuntime {
    fn new(handle: Option<tokio::runtime::Handle>) -> Result<RequestRuntime> {
        if let Some(handle) = handle.or_else(|| tokio::runtime::Handle::try_current().ok()) {
            return Ok(RequestRuntime::Shared(handle));
        }

        log::debug!(target: "appspanel", "no tokio runtime found, starting one");
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("appspanel-requests")
            .enable_all()
            .build()?;
        Ok(RequestRuntime::Owned(Some(runtime)))
    }

    fn spawn(&self, future: impl Future<Output = ()> + Send + 'static) {
        match self {
            RequestRuntime::Shared(handle) => {
                handle.spawn(future);
            }
            RequestRuntime::Owned(Some(runtime)) => {
                runtime.spawn(future);
            }
            RequestRuntime::Owned(None) => {
                log::warn!(target: "appspanel", "runtime is shut down, dropping request");
            }
        }
    }
}

impl Drop for RequestRuntime {
    fn drop(&mut self) {
        // Dropping a runtime blocks, which panics inside async code. Shutting down in the
        // background works from any context.
        if let RequestRuntime::Owned(runtime) = self {
            if let Some(runtime) = runtime.take() {
                runtime.shutdown_background();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn test_manager(base_url: &str) -> RequestManager {
        ClientConfig::new("my-app", "app-key", "0123456789ABCDEF-private")
            .base_url(base_url)
            .to_client()
            .unwrap()
    }

    #[test]
    fn appends_path_to_base_path() {
        let manager = test_manager("https://example.com/api/v2/");
        assert_eq!(
            manager.url("sdk/configuration").unwrap().as_str(),
            "https://example.com/api/v2/sdk/configuration"
        );

        let manager = test_manager("https://example.com/api");
        assert_eq!(
            manager.url("/sdk/texts").unwrap().as_str(),
            "https://example.com/api/sdk/texts"
        );
    }

    #[test]
    fn settings_are_shared_between_clones() {
        let manager = test_manager("https://example.com");
        let clone = manager.clone();

        clone.set_default_timeout(Some(Duration::from_secs(5)));
        clone.set_default_security_options(SecurityOptions::ALL);
        clone.set_session_id("session-2");

        assert_eq!(manager.default_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(manager.default_security_options(), SecurityOptions::ALL);
        assert_eq!(manager.device_info().session_id, "session-2");
    }

    #[test]
    fn null_query_parameter_fails_the_request() {
        let manager = test_manager("https://example.com");
        let parameters = match json!({"locale": null}) {
            serde_json::Value::Object(object) => object,
            _ => unreachable!(),
        };
        let request = manager.request("sdk/texts", HttpMethod::Get, Some(&parameters));
        assert!(matches!(
            request.error(),
            Some(Cause::EncodingFailed {
                context: EncodingContext::QueryString,
                ..
            })
        ));
    }

    #[test]
    fn new_requests_use_default_security_options() {
        let manager = test_manager("https://example.com");
        manager.set_default_security_options(SecurityOptions::ENCRYPT_ALL);
        let request = manager.request("sdk/dialog", HttpMethod::Get, None);
        assert_eq!(
            request.security().map(|security| security.options),
            Some(SecurityOptions::ENCRYPT_ALL)
        );
    }
}
