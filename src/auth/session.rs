// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Tokengate

//! Session tokens.
//!
//! A successful sign-in creates a server-side session row and returns an
//! HS256 token binding user, address, and session id. Token validation is
//! stateless (signature and expiry); revocation is enforced by checking the
//! referenced session row on every request.

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::AuthError;
use crate::config::SESSION_TTL_SECS;
use crate::models::{Session, User};
use crate::storage::ShopDatabase;

/// Claims carried in a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: String,
    /// Canonical (lower-case) wallet address
    pub addr: String,
    /// Session id, checked against the session row for revocation
    pub sid: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiry (Unix seconds), two hours after issuance
    pub exp: i64,
}

/// The request identity resolved from a valid, unrevoked token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub address: String,
    pub session_id: String,
}

/// Issues and validates session tokens against the session store.
#[derive(Clone)]
pub struct SessionManager {
    db: Arc<ShopDatabase>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SessionManager {
    pub fn new(db: Arc<ShopDatabase>, jwt_secret: &str) -> Self {
        Self {
            db,
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
        }
    }

    /// Create a session row and sign a token for it.
    pub fn open_session(&self, user: &User) -> Result<(Session, String), AuthError> {
        let session = self.db.create_session(&user.id)?;

        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user.id.clone(),
            addr: user.address.clone(),
            sid: session.id.clone(),
            iat: now,
            exp: now + SESSION_TTL_SECS,
        };
        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AuthError::Unauthorized)?;
        Ok((session, token))
    }

    /// Validate a bearer token and resolve the request identity.
    ///
    /// Rejects bad signatures, expired tokens, and tokens whose session row
    /// is missing or revoked, all as the same `UNAUTHORIZED`.
    pub fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|_| AuthError::Unauthorized)?;
        let claims = data.claims;

        let session = self
            .db
            .get_session(&claims.sid)?
            .ok_or(AuthError::Unauthorized)?;
        if session.revoked_at.is_some() || session.user_id != claims.sub {
            return Err(AuthError::Unauthorized);
        }

        Ok(AuthenticatedUser {
            user_id: claims.sub,
            address: claims.addr,
            session_id: claims.sid,
        })
    }

    /// Revoke the session behind a token (logout).
    pub fn close_session(&self, session_id: &str) -> Result<(), AuthError> {
        self.db.revoke_session(session_id)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> (SessionManager, Arc<ShopDatabase>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(ShopDatabase::open(&dir.path().join("test.redb")).unwrap());
        let manager = SessionManager::new(Arc::clone(&db), "a-test-secret-of-sufficient-length");
        (manager, db, dir)
    }

    fn sample_user(db: &ShopDatabase) -> User {
        db.upsert_user("0x1111111111111111111111111111111111111111")
            .unwrap()
    }

    #[test]
    fn open_then_authenticate() {
        let (manager, db, _dir) = manager();
        let user = sample_user(&db);

        let (session, token) = manager.open_session(&user).unwrap();
        let identity = manager.authenticate(&token).unwrap();

        assert_eq!(identity.user_id, user.id);
        assert_eq!(identity.address, user.address);
        assert_eq!(identity.session_id, session.id);
    }

    #[test]
    fn revoked_session_rejects_its_token() {
        let (manager, db, _dir) = manager();
        let user = sample_user(&db);

        let (session, token) = manager.open_session(&user).unwrap();
        manager.close_session(&session.id).unwrap();

        assert!(matches!(
            manager.authenticate(&token),
            Err(AuthError::Unauthorized)
        ));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let (manager, db, _dir) = manager();
        let user = sample_user(&db);

        let other = SessionManager::new(
            Arc::new(ShopDatabase::open(&_dir.path().join("other.redb")).unwrap()),
            "a-different-secret-of-sufficient-len",
        );
        let (_, forged) = other.open_session(&user).unwrap();

        assert!(matches!(
            manager.authenticate(&forged),
            Err(AuthError::Unauthorized)
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let (manager, _db, _dir) = manager();
        assert!(matches!(
            manager.authenticate("not.a.token"),
            Err(AuthError::Unauthorized)
        ));
    }

    #[test]
    fn two_sessions_revoke_independently() {
        let (manager, db, _dir) = manager();
        let user = sample_user(&db);

        let (first, first_token) = manager.open_session(&user).unwrap();
        let (_, second_token) = manager.open_session(&user).unwrap();

        manager.close_session(&first.id).unwrap();

        assert!(manager.authenticate(&first_token).is_err());
        assert!(manager.authenticate(&second_token).is_ok());
    }
}
