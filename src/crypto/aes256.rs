use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::{distributions::Alphanumeric, thread_rng, Rng, RngCore};
use sha1::Sha1;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Errors reported by [`Aes256`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The key is not [`Aes256::KEY_LENGTH`] bytes long.
    #[error("invalid AES-256 key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength {
        /// Required length.
        expected: usize,
        /// Length received.
        actual: usize,
    },
    /// The initialization vector is not [`Aes256::IV_LENGTH`] bytes long.
    #[error("invalid initialization vector length: expected {expected} bytes, got {actual}")]
    InvalidIVLength {
        /// Required length.
        expected: usize,
        /// Length received.
        actual: usize,
    },
    /// The block cipher rejected the input (bad padding, truncated block).
    #[error("AES-256/CBC operation failed")]
    CryptoFailed,
}

/// AES-256 in CBC mode with PKCS#7 padding, bound to one key and one initialization vector.
///
/// Key and IV lengths are checked on construction.
///
/// ```
/// # use appspanel::crypto::Aes256;
/// let aes = Aes256::new(b"0123456789ABCDEF0123456789ABCDEF", b"abcdefghijklmnop").unwrap();
/// let encrypted = aes.encrypt(b"hello").unwrap();
/// assert_eq!(aes.decrypt(&encrypted).unwrap(), b"hello");
/// ```
#[derive(Clone)]
pub struct Aes256 {
    key: [u8; Aes256::KEY_LENGTH],
    iv: [u8; Aes256::IV_LENGTH],
}

impl Aes256 {
    /// AES-256 key size in bytes.
    pub const KEY_LENGTH: usize = 32;
    /// AES block size in bytes, which is also the IV size.
    pub const IV_LENGTH: usize = 16;

    /// PBKDF2 rounds used by [`create_key`].
    pub const KEY_DERIVATION_ROUNDS: u32 = 10_000;

    /// Bind `key` and `iv`.
    ///
    /// # Errors
    ///
    /// [`CryptoError::InvalidKeyLength`] or [`CryptoError::InvalidIVLength`] when a length is off.
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Aes256, CryptoError> {
        let key: [u8; Aes256::KEY_LENGTH] =
            key.try_into().map_err(|_| CryptoError::InvalidKeyLength {
                expected: Aes256::KEY_LENGTH,
                actual: key.len(),
            })?;
        let iv: [u8; Aes256::IV_LENGTH] =
            iv.try_into().map_err(|_| CryptoError::InvalidIVLength {
                expected: Aes256::IV_LENGTH,
                actual: iv.len(),
            })?;
        Ok(Aes256 { key, iv })
    }

    /// Encrypt `plaintext`, padding it to a whole number of blocks.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let cipher = Aes256CbcEnc::new_from_slices(&self.key, &self.iv)
            .map_err(|_| CryptoError::CryptoFailed)?;
        Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
    }

    /// Decrypt `ciphertext` and strip its padding.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Aes256CbcDec::new_from_slices(&self.key, &self.iv)
            .map_err(|_| CryptoError::CryptoFailed)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CryptoError::CryptoFailed)
    }
}

impl std::fmt::Debug for Aes256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("Aes256").finish_non_exhaustive()
    }
}

/// Derive a 32-byte key from `password` and `salt` with PBKDF2-HMAC-SHA1.
///
/// The request pipeline does not use this; it derives its key from the private key instead (see
/// [`Secret`](crate::crypto::Secret)).
pub fn create_key(password: &[u8], salt: &[u8]) -> [u8; Aes256::KEY_LENGTH] {
    let mut key = [0u8; Aes256::KEY_LENGTH];
    pbkdf2::pbkdf2_hmac::<Sha1>(password, salt, Aes256::KEY_DERIVATION_ROUNDS, &mut key);
    key
}

/// Random bytes suitable for an AES initialization vector.
pub fn random_iv() -> [u8; Aes256::IV_LENGTH] {
    let mut iv = [0u8; Aes256::IV_LENGTH];
    thread_rng().fill_bytes(&mut iv);
    iv
}

/// Random 8-byte salt for [`create_key`].
pub fn random_salt() -> [u8; 8] {
    let mut salt = [0u8; 8];
    thread_rng().fill_bytes(&mut salt);
    salt
}

/// Random alphanumeric initialization vector, as sent in the `X-AP-Secret` header.
pub fn random_iv_string() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(Aes256::IV_LENGTH)
        .map(char::from)
        .collect()
}
