// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Tokengate

//! Vendor browsing sessions.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    auth::Auth,
    error::ApiError,
    models::{
        CreatePurchaseSessionRequest, OkResponse, PurchaseSession, PurchaseSessionResponse,
        PurchaseSessionStatus,
    },
    state::AppState,
};

use super::vendor_disabled_code;

#[utoipa::path(
    post,
    path = "/shop/session",
    request_body = CreatePurchaseSessionRequest,
    tag = "Shop",
    security(("bearer" = [])),
    responses(
        (status = 200, body = PurchaseSessionResponse),
        (status = 503, description = "Vendor is disabled")
    )
)]
pub async fn create_session(
    State(state): State<AppState>,
    Auth(user): Auth,
    Json(request): Json<CreatePurchaseSessionRequest>,
) -> Result<Json<PurchaseSessionResponse>, ApiError> {
    if !state.config.vendor_enabled(request.vendor) {
        return Err(ApiError::unavailable(vendor_disabled_code(request.vendor)));
    }

    let session = PurchaseSession {
        id: Uuid::new_v4().to_string(),
        user_id: user.user_id,
        vendor: request.vendor,
        product_url: request.product_url.clone(),
        status: PurchaseSessionStatus::Created,
        created_at: Utc::now(),
    };
    state.db.create_purchase_session(&session)?;

    Ok(Json(PurchaseSessionResponse {
        bridge_url: format!("/shop/bridge/{}", session.id),
        session_id: session.id,
    }))
}

#[utoipa::path(
    post,
    path = "/shop/return/{id}",
    params(("id" = String, Path, description = "Purchase session identifier")),
    tag = "Shop",
    security(("bearer" = [])),
    responses(
        (status = 200, body = OkResponse),
        (status = 404, description = "No such session for this user")
    )
)]
pub async fn mark_return(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(session_id): Path<String>,
) -> Result<Json<OkResponse>, ApiError> {
    if !state.db.mark_purchase_returned(&session_id, &user.user_id)? {
        return Err(ApiError::not_found("SESSION_NOT_FOUND"));
    }
    Ok(Json(OkResponse { ok: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedUser;
    use crate::models::Vendor;
    use crate::state::testing::test_state;

    fn identity(state: &AppState, address: &str) -> AuthenticatedUser {
        let user = state.db.upsert_user(address).unwrap();
        AuthenticatedUser {
            user_id: user.id,
            address: user.address,
            session_id: "test-session".into(),
        }
    }

    #[tokio::test]
    async fn session_create_and_return_flow() {
        let (state, _dir) = test_state();
        let user = identity(&state, "0x1111111111111111111111111111111111111111");

        let Json(created) = create_session(
            State(state.clone()),
            Auth(user.clone()),
            Json(CreatePurchaseSessionRequest {
                vendor: Vendor::Ali,
                product_url: "https://example.com/p/1".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(
            created.bridge_url,
            format!("/shop/bridge/{}", created.session_id)
        );

        let Json(ack) = mark_return(
            State(state.clone()),
            Auth(user.clone()),
            Path(created.session_id.clone()),
        )
        .await
        .unwrap();
        assert!(ack.ok);

        let stored = state
            .db
            .get_purchase_session_owned(&created.session_id, &user.user_id)
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, PurchaseSessionStatus::Returned);
    }

    #[tokio::test]
    async fn disabled_vendor_is_unavailable() {
        let (state, _dir) = test_state();
        let user = identity(&state, "0x1111111111111111111111111111111111111111");

        let err = create_session(
            State(state),
            Auth(user),
            Json(CreatePurchaseSessionRequest {
                vendor: Vendor::Temu,
                product_url: "https://example.com/p/1".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, "TEMU_UPDATING");
    }

    #[tokio::test]
    async fn return_is_owner_scoped() {
        let (state, _dir) = test_state();
        let owner = identity(&state, "0x1111111111111111111111111111111111111111");
        let stranger = identity(&state, "0x3333333333333333333333333333333333333333");

        let Json(created) = create_session(
            State(state.clone()),
            Auth(owner),
            Json(CreatePurchaseSessionRequest {
                vendor: Vendor::Ali,
                product_url: "https://example.com/p/1".into(),
            }),
        )
        .await
        .unwrap();

        let err = mark_return(State(state), Auth(stranger), Path(created.session_id))
            .await
            .unwrap_err();
        assert_eq!(err.code, "SESSION_NOT_FOUND");
    }
}
