// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Tokengate

use axum::Json;

use crate::models::OkResponse;

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, body = OkResponse))
)]
pub async fn health() -> Json<OkResponse> {
    Json(OkResponse { ok: true })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_reports_ok() {
        let Json(body) = health().await;
        assert!(body.ok);
    }
}
