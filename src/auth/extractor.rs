// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Tokengate

//! Axum extractor for authenticated requests.
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;

/// Requires a valid, unrevoked bearer session token.
///
/// Any failure (missing header, malformed token, bad signature, expiry,
/// revoked session) rejects with the same `401 UNAUTHORIZED`.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::Unauthorized)?
            .to_str()
            .map_err(|_| AuthError::Unauthorized)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::Unauthorized)?;

        let user = state.sessions.authenticate(token)?;
        Ok(Auth(user))
    }
}
