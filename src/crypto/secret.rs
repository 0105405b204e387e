use crate::{Error, Result};

use super::{Aes256, CryptoError};

/// Symmetric secret shared with the backend.
///
/// The secret is the first 16 characters of the app's private key written twice, which gives the
/// 32 bytes of an AES-256 key. The same value signs the JWT, encrypts the JWT, encrypts request
/// bodies and decrypts responses.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Number of private key characters the secret is built from.
    pub const PREFIX_LENGTH: usize = 16;

    /// Derive the secret from `private_key`.
    ///
    /// The prefix must be ASCII so that the doubled prefix is exactly one AES-256 key long.
    ///
    /// ```
    /// # use appspanel::crypto::Secret;
    /// let secret = Secret::derive("0123456789ABCDEF_extra_chars").unwrap();
    /// assert_eq!(secret.expose(), "0123456789ABCDEF0123456789ABCDEF");
    /// ```
    pub fn derive(private_key: &str) -> Result<Secret> {
        let prefix: String = private_key.chars().take(Secret::PREFIX_LENGTH).collect();
        if prefix.chars().count() < Secret::PREFIX_LENGTH
            || prefix.len() * 2 != Aes256::KEY_LENGTH
        {
            return Err(Error::InvalidPrivateKey);
        }
        Ok(Secret(prefix.repeat(2)))
    }

    /// Secret as text. Handle with care.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Key bytes, always [`Aes256::KEY_LENGTH`] long.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// AES-256 cipher keyed with this secret.
    pub fn cipher(&self, iv: &str) -> std::result::Result<Aes256, CryptoError> {
        Aes256::new(self.as_bytes(), iv.as_bytes())
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_first_sixteen_characters() {
        let secret = Secret::derive("0123456789ABCDEF_extra_chars").unwrap();
        assert_eq!(secret.expose(), "0123456789ABCDEF0123456789ABCDEF");
        assert_eq!(secret.as_bytes().len(), Aes256::KEY_LENGTH);
    }

    #[test]
    fn exactly_sixteen_characters_is_enough() {
        let secret = Secret::derive("abcdefghijklmnop").unwrap();
        assert_eq!(secret.expose(), "abcdefghijklmnopabcdefghijklmnop");
    }

    #[test]
    fn short_private_key_is_rejected() {
        assert!(matches!(
            Secret::derive("too-short"),
            Err(Error::InvalidPrivateKey)
        ));
    }

    #[test]
    fn multibyte_prefix_is_rejected() {
        assert!(matches!(
            Secret::derive(&"\u{e9}".repeat(16)),
            Err(Error::InvalidPrivateKey)
        ));
        assert!(matches!(
            Secret::derive("0123456789ABCDE\u{e9}-rest"),
            Err(Error::InvalidPrivateKey)
        ));
    }

    #[test]
    fn debug_does_not_leak() {
        let secret = Secret::derive("0123456789ABCDEF").unwrap();
        assert_eq!(format!("{secret:?}"), "Secret(..)");
    }
}
