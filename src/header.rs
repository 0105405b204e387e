//! Header names exchanged with the backend.

/// Public app key.
pub const APP_KEY: &str = "X-AP-Key";
/// Current time, unix seconds.
pub const REAL_TIME: &str = "X-AP-RealTime";
/// Device operating system.
pub const OS: &str = "X-AP-OS";
/// Stable identifier of the device.
pub const DEVICE_UID: &str = "X-AP-DeviceUID";
/// Identifier of the current app session.
pub const SESSION_ID: &str = "X-AP-SessionID";
/// App marketing version, sent only when known.
pub const APP_VERSION: &str = "X-AP-AppVersion";
/// App build number, sent only when known.
pub const BUILD_VERSION: &str = "X-AP-BuildVersion";
/// Version of this crate.
pub const SDK_VERSION: &str = "X-AP-SDKVersion";
/// Always `utf-8`.
pub const ACCEPT_CHARSET: &str = "Accept-Charset";
/// Device language.
pub const ACCEPT_LANGUAGE: &str = "Accept-Language";
/// Set for requests with a body.
pub const CONTENT_TYPE: &str = "Content-Type";
/// Initialization vector of the request, and of the response when it is encrypted.
pub const SECRET: &str = "X-AP-Secret";
/// Encrypted signed claim.
pub const AUTHORIZATION: &str = "X-AP-Authorization";
