//! # Field Encryption
//!
//! Sensitive actor attributes (phone number, government id) are encrypted
//! before they reach storage. [`FieldCipher`] is the seam; [`AesGcmCipher`]
//! is the production implementation.

pub mod aes;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

pub use aes::AesGcmCipher;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SecurityError {
    #[error("Invalid encryption key: {reason}")]
    InvalidKey { reason: String },

    #[error("Encryption failed: {message}")]
    Encryption { message: String },

    /// Tampered, truncated or foreign ciphertext
    #[error("Decryption failed: {message}")]
    Decryption { message: String },

    #[error("Encoding error: {message}")]
    Encoding { message: String },
}

impl SecurityError {
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            reason: reason.into(),
        }
    }

    pub fn encryption(message: impl Into<String>) -> Self {
        Self::Encryption {
            message: message.into(),
        }
    }

    pub fn decryption(message: impl Into<String>) -> Self {
        Self::Decryption {
            message: message.into(),
        }
    }

    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }
}

pub type SecurityResult<T> = Result<T, SecurityError>;

/// Symmetric encryption of individual fields, failing closed on tamper
pub trait FieldCipher: Send + Sync {
    fn encrypt(&self, plaintext: &[u8]) -> SecurityResult<Vec<u8>>;

    fn decrypt(&self, ciphertext: &[u8]) -> SecurityResult<Vec<u8>>;

    /// Encrypt a text field into base64 for a text column
    fn encrypt_text(&self, plaintext: &str) -> SecurityResult<String> {
        Ok(STANDARD.encode(self.encrypt(plaintext.as_bytes())?))
    }

    fn decrypt_text(&self, encoded: &str) -> SecurityResult<String> {
        let ciphertext = STANDARD
            .decode(encoded)
            .map_err(|e| SecurityError::encoding(e.to_string()))?;
        let plaintext = self.decrypt(&ciphertext)?;
        String::from_utf8(plaintext).map_err(|e| SecurityError::encoding(e.to_string()))
    }
}
