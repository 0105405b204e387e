//! Symmetric cryptography used by the request pipeline.
//!
//! [`envelope`] wraps the [`Aes256`] block cipher with base64 so ciphertext can travel as text.
//! Keys come from [`Secret`].
mod aes256;
pub mod envelope;
mod secret;

pub use aes256::{create_key, random_iv, random_iv_string, random_salt, Aes256, CryptoError};
pub use envelope::{decode_then_decrypt, encrypt_then_encode, DecryptionError};
pub use secret::Secret;
