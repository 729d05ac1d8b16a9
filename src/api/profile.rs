// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Tokengate

//! Encrypted personal-data records and registry minting.

use axum::{extract::State, Json};
use chrono::Utc;

use crate::{
    auth::Auth,
    blockchain::MintOutcome,
    error::ApiError,
    models::{
        MintReport, PersonalInfo, PersonalInfoStatus, ProfileStatusResponse,
        UpsertProfileRequest, UpsertProfileResponse,
    },
    state::AppState,
    vault,
};

#[utoipa::path(
    post,
    path = "/profile",
    request_body = UpsertProfileRequest,
    tag = "Profile",
    security(("bearer" = [])),
    responses(
        (status = 200, body = UpsertProfileResponse),
        (status = 500, description = "Mint transaction failed; the record stays PENDING")
    )
)]
pub async fn upsert_profile(
    State(state): State<AppState>,
    Auth(user): Auth,
    Json(request): Json<UpsertProfileRequest>,
) -> Result<Json<UpsertProfileResponse>, ApiError> {
    let blob = state
        .vault
        .encrypt(&request.data)
        .map_err(|e| {
            tracing::error!(error = %e, "profile encryption failed");
            ApiError::internal("VAULT_ERROR")
        })?;
    let data_hash = vault::content_hash(&blob);

    let record = PersonalInfo {
        user_id: user.user_id.clone(),
        encrypted_json: blob,
        data_hash: data_hash.clone(),
        status: PersonalInfoStatus::Pending,
        mint_tx_hash: None,
        updated_at: Utc::now(),
    };
    // Persist before minting so a mint failure never loses the submission.
    state.db.upsert_personal_info(&record)?;

    let mint = match state.minter.maybe_mint(&user.address, &data_hash).await {
        Ok(MintOutcome::Skipped { reason }) => MintReport {
            skipped: true,
            reason: Some(reason),
            tx_hash: None,
        },
        Ok(MintOutcome::Minted { tx_hash }) => {
            // A newer submission may have replaced the record meanwhile;
            // the conditional update keeps the stale mint off it.
            state
                .db
                .mark_personal_info_minted(&user.user_id, &data_hash, &tx_hash)?;
            tracing::info!(user_id = %user.user_id, tx_hash = %tx_hash, "registry record minted");
            MintReport {
                skipped: false,
                reason: None,
                tx_hash: Some(tx_hash),
            }
        }
        Err(e) => {
            tracing::error!(user_id = %user.user_id, error = %e, "mint failed");
            return Err(ApiError::internal("MINT_FAILED"));
        }
    };

    let profile = state
        .db
        .get_personal_info(&user.user_id)?
        .ok_or_else(|| ApiError::internal("STORAGE_ERROR"))?;

    Ok(Json(UpsertProfileResponse {
        ok: true,
        profile,
        mint,
    }))
}

#[utoipa::path(
    get,
    path = "/profile/status",
    tag = "Profile",
    security(("bearer" = [])),
    responses((status = 200, body = ProfileStatusResponse))
)]
pub async fn profile_status(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<ProfileStatusResponse>, ApiError> {
    let profile = state.db.get_personal_info(&user.user_id)?;
    Ok(Json(ProfileStatusResponse { profile }))
}
