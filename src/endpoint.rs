use std::collections::HashMap;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::SecurityOptions;

/// JSON object used for query parameters and request bodies.
pub type Parameters = serde_json::Map<String, serde_json::Value>;

/// Request header fields.
pub type Headers = HashMap<String, String>;

/// HTTP methods the backend accepts.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    /// `GET`. Requests with this method never carry a body.
    #[display(fmt = "GET")]
    #[serde(rename = "GET")]
    Get,
    /// `POST`
    #[display(fmt = "POST")]
    #[serde(rename = "POST")]
    Post,
    /// `PATCH`
    #[display(fmt = "PATCH")]
    #[serde(rename = "PATCH")]
    Patch,
    /// `PUT`
    #[display(fmt = "PUT")]
    #[serde(rename = "PUT")]
    Put,
    /// `DELETE`
    #[display(fmt = "DELETE")]
    #[serde(rename = "DELETE")]
    Delete,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Description of a backend call.
///
/// Only [`path`](Endpoint::path) and [`http_method`](Endpoint::http_method) are required; the
/// other members default to "nothing" and [`SecurityOptions::NONE`].
///
/// ```
/// # use appspanel::{Endpoint, HttpMethod, SecurityOptions};
/// struct Profile;
///
/// impl Endpoint for Profile {
///     fn path(&self) -> &str {
///         "users/me"
///     }
///     fn http_method(&self) -> HttpMethod {
///         HttpMethod::Get
///     }
///     fn security_options(&self) -> SecurityOptions {
///         SecurityOptions::ALL
///     }
/// }
/// ```
pub trait Endpoint {
    /// Path relative to the manager's base URL.
    fn path(&self) -> &str;

    /// Method of the call.
    fn http_method(&self) -> HttpMethod;

    /// Query string parameters.
    fn parameters(&self) -> Option<Parameters> {
        None
    }

    /// JSON body. Ignored for `GET`.
    fn body(&self) -> Option<Parameters> {
        None
    }

    /// Extra header fields. They win over custom and default headers.
    fn headers(&self) -> Option<Headers> {
        None
    }

    /// Opaque payload embedded in the signed claim.
    fn secure_data(&self) -> Option<Vec<u8>> {
        None
    }

    /// How the call is secured.
    fn security_options(&self) -> SecurityOptions {
        SecurityOptions::NONE
    }
}
