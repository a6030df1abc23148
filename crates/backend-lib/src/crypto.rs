// ============================
// crates/backend-lib/src/crypto.rs
// ============================
//! Room-key generation and message body encryption.
//!
//! Message bodies are stored as `<iv-hex>:<ciphertext-hex>` with a fresh
//! 128-bit IV per encryption, AES-256-CBC and PKCS#7 padding. Room keys
//! are 256 bits of OS entropy rendered as lowercase hex (64 characters),
//! both in the database and on the wire.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Room key length in bytes (256-bit AES key).
const KEY_BYTES: usize = 32;
/// IV length in bytes (one AES block).
const IV_BYTES: usize = 16;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CryptoError {
    /// The body or key is not in the expected `hex` / `iv:ct` shape.
    #[error("malformed encrypted body")]
    Malformed,

    /// The body is well-formed but does not decrypt under the key.
    #[error("body does not decrypt under the supplied key")]
    Undecryptable,
}

impl From<CryptoError> for crate::error::AppError {
    fn from(e: CryptoError) -> Self {
        crate::error::AppError::Decrypt(e.to_string())
    }
}

/// Generate a fresh 256-bit room key, lowercase hex encoded.
pub fn generate_key() -> String {
    let mut buffer = [0u8; KEY_BYTES];
    OsRng.fill_bytes(&mut buffer);
    hex::encode(buffer)
}

fn decode_key(key_hex: &str) -> Result<[u8; KEY_BYTES], CryptoError> {
    let bytes = hex::decode(key_hex).map_err(|_| CryptoError::Malformed)?;
    bytes.try_into().map_err(|_| CryptoError::Malformed)
}

/// Encrypt a UTF-8 plaintext under a hex-encoded room key.
///
/// Every call draws a fresh random IV, so encrypting the same plaintext
/// twice yields distinct bodies.
pub fn encrypt(plaintext: &str, key_hex: &str) -> Result<String, CryptoError> {
    let key = decode_key(key_hex)?;
    let mut iv = [0u8; IV_BYTES];
    OsRng.fill_bytes(&mut iv);

    let ciphertext = Aes256CbcEnc::new_from_slices(&key, &iv)
        .map_err(|_| CryptoError::Malformed)?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    Ok(format!("{}:{}", hex::encode(iv), hex::encode(ciphertext)))
}

/// Decrypt a `<iv-hex>:<ct-hex>` body under a hex-encoded room key.
pub fn decrypt(body: &str, key_hex: &str) -> Result<String, CryptoError> {
    let key = decode_key(key_hex)?;

    let (iv_hex, ct_hex) = body.split_once(':').ok_or(CryptoError::Malformed)?;
    if ct_hex.contains(':') {
        return Err(CryptoError::Malformed);
    }

    let iv = hex::decode(iv_hex).map_err(|_| CryptoError::Malformed)?;
    let ciphertext = hex::decode(ct_hex).map_err(|_| CryptoError::Malformed)?;
    if iv.len() != IV_BYTES {
        return Err(CryptoError::Malformed);
    }

    let plaintext = Aes256CbcDec::new_from_slices(&key, &iv)
        .map_err(|_| CryptoError::Malformed)?
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| CryptoError::Undecryptable)?;

    String::from_utf8(plaintext).map_err(|_| CryptoError::Undecryptable)
}
