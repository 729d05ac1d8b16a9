// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Tokengate

//! PII vault: authenticated encryption for personal-data records.
//!
//! Records are encrypted with AES-256-GCM under a server-held master key.
//! The storage encoding is `base64(nonce(12) || tag(16) || ciphertext)`,
//! so tampering anywhere in the blob is detected on decrypt.
//!
//! The content hash is SHA-256 over the base64 blob string, rendered as a
//! 0x-prefixed hex string. It commits to the ciphertext (not just the
//! plaintext) and is the value referenced by the on-chain mint.

use aes_gcm::{
    aead::{Aead, OsRng},
    AeadCore, Aes256Gcm, Key, KeyInit, Nonce,
};
use base64ct::{Base64, Encoding};
use sha2::{Digest, Sha256};

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes.
const TAG_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("blob is not valid base64 or is too short")]
    InvalidBlob,

    #[error("authentication failed: wrong key or tampered ciphertext")]
    AuthTagInvalid,

    #[error("record serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Authenticated symmetric vault for personal-data records.
#[derive(Clone)]
pub struct PiiVault {
    key: Key<Aes256Gcm>,
}

impl PiiVault {
    /// Build a vault from the raw 32-byte master key.
    ///
    /// Key length is validated at config load; this constructor cannot fail.
    pub fn new(master_key: [u8; 32]) -> Self {
        Self {
            key: Key::<Aes256Gcm>::from(master_key),
        }
    }

    /// Encrypt a JSON record into a base64 blob.
    ///
    /// A fresh random 96-bit nonce is drawn per call.
    pub fn encrypt(&self, record: &serde_json::Value) -> Result<String, VaultError> {
        let cipher = Aes256Gcm::new(&self.key);
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let plaintext = serde_json::to_vec(record)?;
        let sealed = cipher
            .encrypt(&nonce, plaintext.as_slice())
            .map_err(|_| VaultError::AuthTagInvalid)?;

        // aes-gcm appends the tag to the ciphertext; the wire format puts
        // it up front: nonce || tag || ciphertext.
        let split = sealed.len() - TAG_LEN;
        let mut blob = Vec::with_capacity(NONCE_LEN + sealed.len());
        blob.extend_from_slice(nonce.as_slice());
        blob.extend_from_slice(&sealed[split..]);
        blob.extend_from_slice(&sealed[..split]);

        Ok(Base64::encode_string(&blob))
    }

    /// Decrypt a base64 blob back into the JSON record.
    ///
    /// Fails with [`VaultError::AuthTagInvalid`] on a wrong key or any
    /// modification of the blob; never returns a silently-wrong plaintext.
    pub fn decrypt(&self, blob: &str) -> Result<serde_json::Value, VaultError> {
        let raw = Base64::decode_vec(blob).map_err(|_| VaultError::InvalidBlob)?;
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(VaultError::InvalidBlob);
        }

        let (nonce, rest) = raw.split_at(NONCE_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);

        // Reassemble ciphertext || tag for the aead API.
        let mut sealed = Vec::with_capacity(rest.len());
        sealed.extend_from_slice(ciphertext);
        sealed.extend_from_slice(tag);

        let cipher = Aes256Gcm::new(&self.key);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), sealed.as_slice())
            .map_err(|_| VaultError::AuthTagInvalid)?;

        Ok(serde_json::from_slice(&plaintext)?)
    }
}

/// SHA-256 content hash of a blob, as `0x`-prefixed hex.
pub fn content_hash(blob: &str) -> String {
    let digest = Sha256::digest(blob.as_bytes());
    format!("0x{}", alloy::hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vault() -> PiiVault {
        PiiVault::new([3u8; 32])
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let v = vault();
        let record = json!({ "name": "Alice", "passport": "X1234567", "age": 30 });

        let blob = v.encrypt(&record).unwrap();
        let recovered = v.decrypt(&blob).unwrap();
        assert_eq!(recovered, record);
    }

    #[test]
    fn nonce_is_fresh_per_call() {
        let v = vault();
        let record = json!({ "k": "v" });
        let a = v.encrypt(&record).unwrap();
        let b = v.encrypt(&record).unwrap();
        assert_ne!(a, b);
        // Both still decrypt to the same record
        assert_eq!(v.decrypt(&a).unwrap(), v.decrypt(&b).unwrap());
    }

    #[test]
    fn wrong_key_fails_auth() {
        let record = json!({ "secret": true });
        let blob = vault().encrypt(&record).unwrap();

        let other = PiiVault::new([4u8; 32]);
        assert!(matches!(
            other.decrypt(&blob),
            Err(VaultError::AuthTagInvalid)
        ));
    }

    #[test]
    fn flipped_byte_fails_auth() {
        let v = vault();
        let blob = v.encrypt(&json!({ "a": 1 })).unwrap();
        let mut raw = Base64::decode_vec(&blob).unwrap();

        // Flip one ciphertext byte (past nonce and tag)
        let idx = NONCE_LEN + TAG_LEN;
        raw[idx] ^= 0x01;
        let tampered = Base64::encode_string(&raw);

        assert!(matches!(
            v.decrypt(&tampered),
            Err(VaultError::AuthTagInvalid)
        ));
    }

    #[test]
    fn truncated_blob_is_invalid() {
        let v = vault();
        assert!(matches!(v.decrypt("AAAA"), Err(VaultError::InvalidBlob)));
        assert!(matches!(
            v.decrypt("not!!base64"),
            Err(VaultError::InvalidBlob)
        ));
    }

    #[test]
    fn content_hash_is_deterministic_hex() {
        let h1 = content_hash("blob");
        let h2 = content_hash("blob");
        assert_eq!(h1, h2);
        assert!(h1.starts_with("0x"));
        assert_eq!(h1.len(), 2 + 64);

        assert_ne!(content_hash("blob"), content_hash("blob2"));
    }
}
