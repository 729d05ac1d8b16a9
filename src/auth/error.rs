// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Tokengate

//! Authentication errors.
//!
//! Each variant maps to a stable client-facing code. Sign-in failures are
//! `400` with a code naming the first check that failed; token failures are
//! a uniform `401 UNAUTHORIZED` that does not leak why.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::storage::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("message is not a well-formed sign-in message")]
    InvalidSiweMessage,

    #[error("message address differs from the claimed address")]
    AddressMismatch,

    #[error("message chain id differs from the configured chain")]
    ChainMismatch,

    #[error("message domain differs from the configured domain")]
    DomainMismatch,

    #[error("message URI differs from the configured URI")]
    UriMismatch,

    #[error("nonce is unknown, already used, or expired")]
    NonceInvalidOrExpired,

    #[error("signature does not recover to the claimed address")]
    SignatureInvalid,

    #[error("missing, malformed, expired, or revoked credentials")]
    Unauthorized,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Stable client-facing error code.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidSiweMessage => "INVALID_SIWE_MESSAGE",
            AuthError::AddressMismatch => "ADDRESS_MISMATCH",
            AuthError::ChainMismatch => "CHAIN_MISMATCH",
            AuthError::DomainMismatch => "DOMAIN_MISMATCH",
            AuthError::UriMismatch => "URI_MISMATCH",
            AuthError::NonceInvalidOrExpired => "NONCE_INVALID_OR_EXPIRED",
            AuthError::SignatureInvalid => "SIGNATURE_INVALID",
            AuthError::Unauthorized => "UNAUTHORIZED",
            AuthError::Store(_) => "STORAGE_ERROR",
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if let AuthError::Store(ref inner) = err {
            tracing::error!(error = %inner, "storage failure during authentication");
        }
        ApiError::new(err.status(), err.code())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn siwe_failures_are_bad_request() {
        for err in [
            AuthError::InvalidSiweMessage,
            AuthError::AddressMismatch,
            AuthError::ChainMismatch,
            AuthError::DomainMismatch,
            AuthError::UriMismatch,
            AuthError::NonceInvalidOrExpired,
            AuthError::SignatureInvalid,
        ] {
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn token_failures_are_uniform_unauthorized() {
        let err = AuthError::Unauthorized;
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.code(), "UNAUTHORIZED");
    }
}
