use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

use regex::Regex;

use crate::{
    auth_token::{AuthenticationTokenProvider, MemoryTokenStore},
    Error, Headers, RequestManager, Result, SecurityOptions,
};

/// Identity of the device and app, sent with every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Sent as `X-AP-OS`.
    pub os: String,
    /// Sent as `X-AP-DeviceUID`.
    pub device_uid: String,
    /// Sent as `X-AP-SessionID`.
    pub session_id: String,
    /// Sent as `X-AP-AppVersion` when set.
    pub app_version: Option<String>,
    /// Sent as `X-AP-BuildVersion` when set.
    pub build_version: Option<String>,
    /// Sent as `Accept-Language`.
    pub language: String,
}

impl Default for DeviceInfo {
    fn default() -> DeviceInfo {
        DeviceInfo {
            os: std::env::consts::OS.to_owned(),
            device_uid: uuid::Uuid::new_v4().to_string(),
            session_id: uuid::Uuid::new_v4().to_string(),
            app_version: None,
            build_version: None,
            language: "en".to_owned(),
        }
    }
}

/// Configuration for [`RequestManager`].
pub struct ClientConfig {
    pub(crate) app_name: String,
    pub(crate) app_key: String,
    pub(crate) private_key: String,
    pub(crate) base_url: Option<String>,
    pub(crate) device: DeviceInfo,
    pub(crate) timeout: Duration,
    pub(crate) default_timeout: Option<Duration>,
    pub(crate) default_security_options: SecurityOptions,
    pub(crate) inhibits_cancellation_errors: bool,
    pub(crate) custom_headers: Headers,
    pub(crate) token_provider: Arc<dyn AuthenticationTokenProvider + Send + Sync>,
    pub(crate) runtime: Option<tokio::runtime::Handle>,
}

impl ClientConfig {
    /// Timeout applied when neither the request nor the manager sets one.
    pub const PLATFORM_TIMEOUT: Duration = Duration::from_secs(60);

    /// Create a configuration with the app credentials issued by the backend.
    ///
    /// ```
    /// # use appspanel::ClientConfig;
    /// let config = ClientConfig::new("my-app", "app-key", "0123456789ABCDEF-private");
    /// ```
    pub fn new(
        app_name: impl Into<String>,
        app_key: impl Into<String>,
        private_key: impl Into<String>,
    ) -> ClientConfig {
        ClientConfig {
            app_name: app_name.into(),
            app_key: app_key.into(),
            private_key: private_key.into(),
            base_url: None,
            device: DeviceInfo::default(),
            timeout: ClientConfig::PLATFORM_TIMEOUT,
            default_timeout: None,
            default_security_options: SecurityOptions::JSON_WEB_TOKEN,
            inhibits_cancellation_errors: true,
            custom_headers: Headers::new(),
            token_provider: Arc::new(MemoryTokenStore::new()),
            runtime: None,
        }
    }

    /// Default base URL for an app: `https://{app_name}.ap-api.com`.
    pub fn default_base_url(app_name: &str) -> String {
        format!("https://{app_name}.ap-api.com")
    }

    /// Override base URL for API calls.
    pub fn base_url(mut self, base_url: impl Into<String>) -> ClientConfig {
        self.base_url = Some(base_url.into());
        self
    }

    /// Identity sent in the default headers. Defaults to [`DeviceInfo::default`].
    pub fn device_info(mut self, device: DeviceInfo) -> ClientConfig {
        self.device = device;
        self
    }

    /// Timeout used when neither the request nor [`default_timeout`](Self::default_timeout)
    /// sets one. Defaults to [`ClientConfig::PLATFORM_TIMEOUT`].
    pub fn platform_timeout(mut self, timeout: Duration) -> ClientConfig {
        self.timeout = timeout;
        self
    }

    /// Timeout for requests that don't set their own.
    pub fn default_timeout(mut self, timeout: Duration) -> ClientConfig {
        self.default_timeout = Some(timeout);
        self
    }

    /// Security of new requests. Defaults to [`SecurityOptions::JSON_WEB_TOKEN`].
    pub fn default_security_options(mut self, options: SecurityOptions) -> ClientConfig {
        self.default_security_options = options;
        self
    }

    /// Whether cancelled requests skip their completion handler. Defaults to `true`.
    pub fn inhibits_cancellation_errors(mut self, inhibits: bool) -> ClientConfig {
        self.inhibits_cancellation_errors = inhibits;
        self
    }

    /// Headers added to every request, unless the request sets them itself.
    pub fn custom_headers(mut self, headers: Headers) -> ClientConfig {
        self.custom_headers = headers;
        self
    }

    /// Where the user's authentication token is read from. Defaults to a [`MemoryTokenStore`].
    pub fn token_provider(
        mut self,
        provider: impl AuthenticationTokenProvider + Send + Sync + 'static,
    ) -> ClientConfig {
        self.token_provider = Arc::new(provider);
        self
    }

    /// Runtime completion-style requests are spawned on.
    ///
    /// Without one, the runtime current at [`to_client`](Self::to_client) time is used, and
    /// outside any runtime the manager starts its own.
    pub fn runtime(mut self, handle: tokio::runtime::Handle) -> ClientConfig {
        self.runtime = Some(handle);
        self
    }

    /// Create a new [`RequestManager`] using this configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidAppName`] unless the app name is made of `[a-z0-9-]`.
    /// - [`Error::InvalidBaseUrl`] if the base URL does not parse.
    /// - [`Error::InvalidPrivateKey`] if the private key is shorter than 16 characters or its first
    ///   16 characters are not ASCII.
    pub fn to_client(self) -> Result<RequestManager> {
        if !is_valid_app_name(&self.app_name) {
            return Err(Error::InvalidAppName(self.app_name));
        }
        RequestManager::new(self)
    }
}

static APP_NAME_PATTERN: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();

fn app_name_pattern() -> &'static std::result::Result<Regex, regex::Error> {
    APP_NAME_PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9\-]+$"))
}

fn is_valid_app_name(app_name: &str) -> bool {
    app_name_pattern()
        .as_ref()
        .is_ok_and(|pattern| pattern.is_match(app_name))
}
