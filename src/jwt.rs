//! Signed claim sent in the `X-AP-Authorization` header.
//!
//! The claim set is signed as an HS256 JWT with the [`Secret`], then the compact JWT itself is
//! encrypted with the same secret and the request IV. The header value is the base64 ciphertext.
use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as, BoolFromInt};

use crate::{
    crypto::{encrypt_then_encode, CryptoError, Secret},
    SecurityOptions,
};

/// Why the signed claim could not be produced.
#[derive(thiserror::Error, Debug, Clone)]
pub enum ClaimError {
    /// HS256 signing failed.
    #[error("failed to sign JWT")]
    Signing(#[source] Arc<jsonwebtoken::errors::Error>),
    /// The signed JWT could not be encrypted.
    #[error("failed to encrypt JWT")]
    EncryptionFailed(#[source] CryptoError),
}

/// Encryption flags as the backend expects them: integers `0`/`1`, not JSON booleans.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityClaim {
    /// The request body is encrypted.
    #[serde(rename = "secure_parameter")]
    #[serde_as(as = "BoolFromInt")]
    pub encrypt_request: bool,
    /// The backend must encrypt the response body.
    #[serde(rename = "secure_answer")]
    #[serde_as(as = "BoolFromInt")]
    pub encrypt_response: bool,
}

impl From<SecurityOptions> for SecurityClaim {
    fn from(options: SecurityOptions) -> Self {
        SecurityClaim {
            encrypt_request: options.contains(SecurityOptions::ENCRYPT_REQUEST),
            encrypt_response: options.contains(SecurityOptions::ENCRYPT_RESPONSE),
        }
    }
}

/// Claim set of the JWT.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Expiration, unix seconds.
    #[serde(rename = "exp")]
    pub expiration: i64,
    /// Encryption flags.
    pub sec: SecurityClaim,
    /// App name the manager was configured with.
    #[serde(rename = "appname")]
    pub app_name: String,
    /// The user's authentication token, for requests that need one.
    #[serde(rename = "utoken", default, skip_serializing_if = "Option::is_none")]
    pub user_token: Option<String>,
    /// Secure data, base64 in the claim.
    #[serde_as(as = "Option<Base64>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
}

impl Claims {
    /// How long a claim stays valid after it is issued.
    pub const VALIDITY_SECONDS: i64 = 300;

    /// Claims issued at `issued_at` for `options`.
    pub fn new(
        app_name: impl Into<String>,
        issued_at: DateTime<Utc>,
        options: SecurityOptions,
        user_token: Option<String>,
        data: Option<Vec<u8>>,
    ) -> Claims {
        Claims {
            expiration: issued_at.timestamp() + Claims::VALIDITY_SECONDS,
            sec: options.into(),
            app_name: app_name.into(),
            user_token,
            data,
        }
    }
}

/// Producer of `X-AP-Authorization` header values for one request.
pub struct JsonWebToken<'a> {
    app_name: &'a str,
    secret: &'a Secret,
    iv: &'a str,
}

impl<'a> JsonWebToken<'a> {
    /// Token producer for one request, encrypted with `secret` and `iv`.
    pub fn new(app_name: &'a str, secret: &'a Secret, iv: &'a str) -> JsonWebToken<'a> {
        JsonWebToken {
            app_name,
            secret,
            iv,
        }
    }

    /// Produce the header value, valid for [`Claims::VALIDITY_SECONDS`] from now.
    pub fn produce(
        &self,
        user_token: Option<String>,
        secure_data: Option<Vec<u8>>,
        options: SecurityOptions,
    ) -> Result<String, ClaimError> {
        self.produce_at(Utc::now(), user_token, secure_data, options)
    }

    /// Like [`produce`](Self::produce), with an explicit issue time.
    pub fn produce_at(
        &self,
        issued_at: DateTime<Utc>,
        user_token: Option<String>,
        secure_data: Option<Vec<u8>>,
        options: SecurityOptions,
    ) -> Result<String, ClaimError> {
        let claims = Claims::new(self.app_name, issued_at, options, user_token, secure_data);
        log::trace!(target: "appspanel", expiration = claims.expiration; "signing claims");

        let signed = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|err| ClaimError::Signing(Arc::new(err)))?;

        encrypt_then_encode(signed.as_bytes(), self.secret, self.iv)
            .map_err(ClaimError::EncryptionFailed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use jsonwebtoken::{DecodingKey, Validation};

    use super::*;
    use crate::crypto::decode_then_decrypt;

    const IV: &str = "ABCDEFGHIJ012345";

    fn secret() -> Secret {
        Secret::derive("0123456789ABCDEF_extra_chars").unwrap()
    }

    fn open(header: &str, secret: &Secret) -> Claims {
        let jwt = decode_then_decrypt(header, secret, IV).unwrap();
        let jwt = String::from_utf8(jwt).unwrap();
        jsonwebtoken::decode::<Claims>(
            &jwt,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap()
        .claims
    }

    #[test]
    fn expiration_is_five_minutes_after_issue() {
        let issued_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let claims = Claims::new("my-app", issued_at, SecurityOptions::NONE, None, None);
        assert_eq!(claims.expiration, issued_at.timestamp() + 300);
    }

    #[test]
    fn serializes_backend_field_names() {
        let issued_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let claims = Claims::new(
            "my-app",
            issued_at,
            SecurityOptions::JSON_WEB_TOKEN | SecurityOptions::ENCRYPT_RESPONSE,
            Some("user-token".to_owned()),
            Some(b"hi".to_vec()),
        );
        assert_eq!(
            serde_json::to_value(&claims).unwrap(),
            serde_json::json!({
                "exp": 1_700_000_300,
                "sec": {"secure_parameter": 0, "secure_answer": 1},
                "appname": "my-app",
                "utoken": "user-token",
                "data": "aGk=",
            })
        );
    }

    #[test]
    fn optional_claims_are_omitted() {
        let claims = Claims::new("my-app", Utc::now(), SecurityOptions::ALL, None, None);
        let value = serde_json::to_value(&claims).unwrap();
        assert!(value.get("utoken").is_none());
        assert!(value.get("data").is_none());
        assert_eq!(value["sec"]["secure_parameter"], 1);
    }

    #[test]
    fn produced_header_is_encrypted_signed_jwt() {
        let secret = secret();
        let issued_at = Utc::now();
        let header = JsonWebToken::new("my-app", &secret, IV)
            .produce_at(
                issued_at,
                Some("token".to_owned()),
                None,
                SecurityOptions::JSON_WEB_TOKEN,
            )
            .unwrap();

        assert!(!header.contains('.'), "JWT must not travel in clear");

        let claims = open(&header, &secret);
        assert_eq!(claims.app_name, "my-app");
        assert_eq!(claims.user_token.as_deref(), Some("token"));
        assert_eq!(claims.expiration, issued_at.timestamp() + Claims::VALIDITY_SECONDS);
        assert_eq!(claims.sec, SecurityClaim::from(SecurityOptions::NONE));
    }

    #[test]
    fn bad_iv_is_an_encryption_failure() {
        let secret = secret();
        let err = JsonWebToken::new("my-app", &secret, "bad-iv")
            .produce(None, None, SecurityOptions::JSON_WEB_TOKEN)
            .unwrap_err();
        assert!(matches!(
            err,
            ClaimError::EncryptionFailed(CryptoError::InvalidIVLength { .. })
        ));
    }
}
