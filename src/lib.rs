//! Secured HTTP request layer for the AppsPanel backend.
//!
//! # Overview
//!
//! The crate revolves around a [`RequestManager`], created from a [`ClientConfig`]. The manager
//! turns a path or an [`Endpoint`] into a [`DataRequest`], which is configured with a fluent API
//! and then sent.
//!
//! Each request is secured according to its [`SecurityOptions`]:
//!
//! - [`SecurityOptions::JSON_WEB_TOKEN`] attaches a signed claim, itself encrypted, in the
//!   `X-AP-Authorization` header.
//! - [`SecurityOptions::ENCRYPT_REQUEST`] encrypts the body with AES-256-CBC and sends it as
//!   base64 text.
//! - [`SecurityOptions::ENCRYPT_RESPONSE`] decrypts the response body with the IV the server
//!   sends back in `X-AP-Secret`.
//!
//! Every request gets a fresh IV. The key is derived once from the app's private key (see
//! [`crypto::Secret`]).
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use appspanel::{ClientConfig, SecurityOptions, WebService};
//!
//! let manager = ClientConfig::new("my-app", "app-key", "0123456789ABCDEF-private").to_client()?;
//! let texts = manager
//!     .request_endpoint(&WebService::Texts { locale: "fr".to_owned() })
//!     .secure(SecurityOptions::ALL)
//!     .response_object::<serde_json::Value>()
//!     .await?;
//! println!("{}", texts.object);
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Building a manager fails with [`Error`]. Requests fail with [`RequestError`], which carries a
//! [`Cause`] and whatever request and response context was available. Failures recorded while a
//! request is configured (e.g. a missing authentication token) surface the same way when the
//! request is sent, without any network call.
//!
//! There are no automatic retries.
//!
//! # Logging
//!
//! The package uses the [`log`](https://docs.rs/log/latest/log/) crate for logging
//! messages, with the `appspanel` target. Consider integrating a `log`-compatible logger
//! implementation for better visibility into requests.

#![warn(rustdoc::missing_crate_level_docs)]
#![warn(missing_docs)]

mod auth_token;
mod cancellable;
mod classifier;
mod config;
pub mod crypto;
mod endpoint;
mod error;
pub mod header;
pub mod jwt;
mod manager;
mod query;
mod request;
mod response;
mod security;
mod transport;
pub mod upload;
mod web_service;

pub use auth_token::{AuthenticationTokenProvider, MemoryTokenStore, TokenError};
pub use cancellable::{Cancellable, RequestHandle};
pub use config::{ClientConfig, DeviceInfo};
pub use endpoint::{Endpoint, Headers, HttpMethod, Parameters};
pub use error::{
    BackendErrorInfo, Cause, EncodingContext, Error, NetworkError, RequestError, Result,
    SharedError,
};
pub use manager::RequestManager;
pub use query::QueryEncodingError;
pub use request::{DataRequest, PreparedRequest};
pub use response::{
    DataResponse, DownloadProgressHandler, ObjectResponse, Progress, RequestInfo, ResponseInfo,
};
pub use security::{Security, SecurityOptions};
pub use web_service::WebService;
