//! Base64 envelope around [`Aes256`](super::Aes256).
//!
//! Encryption always happens before encoding, so what goes on the wire is plain base64 text.
//! Decoding always happens before decryption.
use base64::{engine::general_purpose::STANDARD, Engine as _};

use super::{CryptoError, Secret};

/// Why a response body could not be decrypted.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecryptionError {
    /// The response carries no `X-AP-Secret` header, so the IV is unknown.
    #[error("response has no X-AP-Secret header")]
    MissingSecretHeader,
    /// The body is not valid base64.
    #[error("encrypted data is not valid base64")]
    InvalidData,
    /// The ciphertext does not decrypt with the secret and IV.
    #[error("decryption failed")]
    DecryptionFailed(#[source] CryptoError),
}

/// Encrypt `plaintext` with `secret` and `iv`, then base64-encode the ciphertext.
pub fn encrypt_then_encode(
    plaintext: &[u8],
    secret: &Secret,
    iv: &str,
) -> Result<String, CryptoError> {
    let ciphertext = secret.cipher(iv)?.encrypt(plaintext)?;
    Ok(STANDARD.encode(ciphertext))
}

/// Base64-decode `encoded`, then decrypt it with `secret` and `iv`.
pub fn decode_then_decrypt(
    encoded: impl AsRef<[u8]>,
    secret: &Secret,
    iv: &str,
) -> Result<Vec<u8>, DecryptionError> {
    let ciphertext = STANDARD
        .decode(encoded)
        .map_err(|_| DecryptionError::InvalidData)?;
    secret
        .cipher(iv)
        .and_then(|aes| aes.decrypt(&ciphertext))
        .map_err(DecryptionError::DecryptionFailed)
}
