// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Tokengate

//! Wallet sign-in endpoints.

use std::str::FromStr;

use alloy::primitives::Address;
use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    auth::{verify_signature, Auth, AuthError, SiweMessage},
    error::ApiError,
    models::{NonceQuery, NonceResponse, OkResponse, UserView, VerifyRequest, VerifyResponse},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/auth/nonce",
    params(NonceQuery),
    tag = "Auth",
    responses(
        (status = 200, body = NonceResponse),
        (status = 400, description = "Malformed wallet address")
    )
)]
pub async fn get_nonce(
    State(state): State<AppState>,
    Query(params): Query<NonceQuery>,
) -> Result<Json<NonceResponse>, ApiError> {
    Address::from_str(&params.address)
        .map_err(|_| ApiError::bad_request("INVALID_ADDRESS"))?;

    let (_, record) = state.nonces.issue(&params.address)?;
    Ok(Json(NonceResponse {
        nonce: record.nonce,
        expires_at: record.expires_at,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/verify",
    request_body = VerifyRequest,
    tag = "Auth",
    responses(
        (status = 200, body = VerifyResponse),
        (status = 400, description = "Sign-in check failed; body carries the failing check's code"),
        (status = 404, description = "No user for this address (no challenge was issued)")
    )
)]
pub async fn verify(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    // Fixed check order: parse, address, chain, domain, URI, nonce, signature.
    let message = SiweMessage::parse(&request.message)?;
    state.siwe.check(&message, &request.address)?;

    let user = state
        .db
        .get_user_by_address(&request.address)
        .map_err(AuthError::from)?
        .ok_or_else(|| ApiError::not_found("USER_NOT_FOUND"))?;

    if !state.nonces.consume(&user.id, &message.nonce)? {
        return Err(AuthError::NonceInvalidOrExpired.into());
    }

    // The nonce is burned before signature checking; a failed signature
    // costs the caller a fresh challenge.
    verify_signature(&request.message, &request.signature, &request.address)?;

    let (_, token) = state.sessions.open_session(&user)?;
    tracing::info!(user_id = %user.id, address = %user.address, "wallet signed in");

    Ok(Json(VerifyResponse {
        token,
        user: UserView {
            id: user.id,
            address: user.address,
        },
    }))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, body = OkResponse),
        (status = 401, description = "Missing or invalid credentials")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<OkResponse>, AuthError> {
    state.sessions.close_session(&user.session_id)?;
    tracing::info!(user_id = %user.user_id, "session revoked");
    Ok(Json(OkResponse { ok: true }))
}
