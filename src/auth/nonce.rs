// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Tokengate

//! Challenge nonce issuance and consumption.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;

use crate::config::NONCE_TTL_SECS;
use crate::models::{AuthNonce, User};
use crate::storage::{ShopDatabase, StoreResult};

/// Issues single-use challenge nonces and consumes them on verification.
#[derive(Clone)]
pub struct NonceAuthority {
    db: Arc<ShopDatabase>,
}

impl NonceAuthority {
    pub fn new(db: Arc<ShopDatabase>) -> Self {
        Self { db }
    }

    /// Issue a fresh nonce for an address.
    ///
    /// The user record is created lazily on first request. The nonce is 16
    /// bytes of OS randomness, hex encoded, valid for ten minutes.
    pub fn issue(&self, address: &str) -> StoreResult<(User, AuthNonce)> {
        let user = self.db.upsert_user(address)?;

        let bytes: [u8; 16] = rand::rng().random();
        let now = Utc::now();
        let record = AuthNonce {
            nonce: alloy::hex::encode(bytes),
            user_id: user.id.clone(),
            expires_at: now + Duration::seconds(NONCE_TTL_SECS),
            used_at: None,
            created_at: now,
        };
        self.db.insert_nonce(&record)?;
        Ok((user, record))
    }

    /// Consume a nonce for a user. Returns `true` on the single successful
    /// consumption; `false` for unknown, used, or expired nonces.
    pub fn consume(&self, user_id: &str, nonce: &str) -> StoreResult<bool> {
        self.db.consume_nonce(user_id, nonce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authority() -> (NonceAuthority, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = ShopDatabase::open(&dir.path().join("test.redb")).unwrap();
        (NonceAuthority::new(Arc::new(db)), dir)
    }

    #[test]
    fn issue_creates_user_and_hex_nonce() {
        let (authority, _dir) = authority();
        let (user, record) = authority
            .issue("0x1111111111111111111111111111111111111111")
            .unwrap();

        assert_eq!(user.address, "0x1111111111111111111111111111111111111111");
        assert_eq!(record.user_id, user.id);
        assert_eq!(record.nonce.len(), 32, "16 bytes hex encoded");
        assert!(record.nonce.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(record.expires_at > Utc::now());
    }

    #[test]
    fn issued_nonce_consumes_once() {
        let (authority, _dir) = authority();
        let (user, record) = authority
            .issue("0x1111111111111111111111111111111111111111")
            .unwrap();

        assert!(authority.consume(&user.id, &record.nonce).unwrap());
        assert!(!authority.consume(&user.id, &record.nonce).unwrap());
    }

    #[test]
    fn successive_nonces_are_distinct() {
        let (authority, _dir) = authority();
        let (_, a) = authority
            .issue("0x1111111111111111111111111111111111111111")
            .unwrap();
        let (_, b) = authority
            .issue("0x1111111111111111111111111111111111111111")
            .unwrap();
        assert_ne!(a.nonce, b.nonce);
    }
}
