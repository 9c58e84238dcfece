//! AES-GCM field cipher.
//!
//! Output layout is `nonce (12 bytes) || ciphertext+tag`. A fresh random
//! nonce is drawn for every call.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes128Gcm, Aes256Gcm, Nonce,
};

use super::{FieldCipher, SecurityError, SecurityResult};

const NONCE_LEN: usize = 12;

enum Inner {
    Aes128(Box<Aes128Gcm>),
    Aes256(Box<Aes256Gcm>),
}

pub struct AesGcmCipher {
    inner: Inner,
}

impl std::fmt::Debug for AesGcmCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesGcmCipher")
            .field("key_bits", &self.key_bits())
            .finish()
    }
}

impl AesGcmCipher {
    /// 16-byte keys select AES-128, 32-byte keys AES-256
    pub fn new(key: &[u8]) -> SecurityResult<Self> {
        let inner = match key.len() {
            16 => Inner::Aes128(Box::new(
                Aes128Gcm::new_from_slice(key).map_err(|e| SecurityError::invalid_key(e.to_string()))?,
            )),
            32 => Inner::Aes256(Box::new(
                Aes256Gcm::new_from_slice(key).map_err(|e| SecurityError::invalid_key(e.to_string()))?,
            )),
            other => {
                return Err(SecurityError::invalid_key(format!(
                    "key must be 16 or 32 bytes, got {other}"
                )))
            }
        };
        Ok(Self { inner })
    }

    /// Build from a hex-encoded key (32 or 64 hex characters)
    pub fn from_hex(key_hex: &str) -> SecurityResult<Self> {
        let key = hex::decode(key_hex.trim())
            .map_err(|e| SecurityError::invalid_key(format!("key is not valid hex: {e}")))?;
        Self::new(&key)
    }

    pub fn key_bits(&self) -> usize {
        match self.inner {
            Inner::Aes128(_) => 128,
            Inner::Aes256(_) => 256,
        }
    }
}

impl FieldCipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &[u8]) -> SecurityResult<Vec<u8>> {
        let (nonce, sealed) = match &self.inner {
            Inner::Aes128(cipher) => {
                let nonce = Aes128Gcm::generate_nonce(&mut OsRng);
                (nonce, cipher.encrypt(&nonce, plaintext))
            }
            Inner::Aes256(cipher) => {
                let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
                (nonce, cipher.encrypt(&nonce, plaintext))
            }
        };
        let sealed = sealed.map_err(|e| SecurityError::encryption(e.to_string()))?;

        let mut output = Vec::with_capacity(NONCE_LEN + sealed.len());
        output.extend_from_slice(&nonce);
        output.extend_from_slice(&sealed);
        Ok(output)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> SecurityResult<Vec<u8>> {
        if ciphertext.len() <= NONCE_LEN {
            return Err(SecurityError::decryption("ciphertext too short"));
        }
        let (nonce_bytes, sealed) = ciphertext.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let opened = match &self.inner {
            Inner::Aes128(cipher) => cipher.decrypt(nonce, sealed),
            Inner::Aes256(cipher) => cipher.decrypt(nonce, sealed),
        };
        opened.map_err(|_| SecurityError::decryption("authentication tag mismatch"))
    }
}
