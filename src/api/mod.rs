// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Tokengate

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        CreateOrderRequest, CreatePurchaseSessionRequest, MintReport, NonceResponse, OkResponse,
        Order, OrderListResponse, OrderResponse, OrderStatus, PersonalInfo, PersonalInfoStatus,
        ProfileStatusResponse, PurchaseSessionResponse, PurchaseSessionStatus,
        SubmitPaymentRequest, SubmitPaymentResponse, UpsertProfileRequest, UpsertProfileResponse,
        UserView, Vendor, VerifyRequest, VerifyResponse,
    },
    state::AppState,
};

pub mod auth;
pub mod health;
pub mod orders;
pub mod profile;
pub mod shop;

/// 503 code for a toggled-off vendor.
pub(crate) fn vendor_disabled_code(vendor: Vendor) -> &'static str {
    match vendor {
        Vendor::Ali => "ALI_DISABLED",
        Vendor::Amazon => "AMAZON_UPDATING",
        Vendor::Temu => "TEMU_UPDATING",
    }
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let api_routes = Router::new()
        .route("/health", get(health::health))
        .route("/auth/nonce", get(auth::get_nonce))
        .route("/auth/verify", post(auth::verify))
        .route("/auth/logout", post(auth::logout))
        .route("/orders", post(orders::create_order))
        .route("/orders/me", get(orders::list_my_orders))
        .route("/orders/{id}/submit-payment", post(orders::submit_payment))
        .route("/profile", post(profile::upsert_profile))
        .route("/profile/status", get(profile::profile_status))
        .route("/shop/session", post(shop::create_session))
        .route("/shop/return/{id}", post(shop::mark_return))
        .with_state(state);

    Router::new()
        .merge(api_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ])
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::get_nonce,
        auth::verify,
        auth::logout,
        orders::create_order,
        orders::submit_payment,
        orders::list_my_orders,
        profile::upsert_profile,
        profile::profile_status,
        shop::create_session,
        shop::mark_return
    ),
    components(
        schemas(
            OkResponse,
            NonceResponse,
            VerifyRequest,
            VerifyResponse,
            UserView,
            Vendor,
            Order,
            OrderStatus,
            CreateOrderRequest,
            OrderResponse,
            SubmitPaymentRequest,
            SubmitPaymentResponse,
            OrderListResponse,
            PersonalInfo,
            PersonalInfoStatus,
            UpsertProfileRequest,
            UpsertProfileResponse,
            MintReport,
            ProfileStatusResponse,
            CreatePurchaseSessionRequest,
            PurchaseSessionResponse,
            PurchaseSessionStatus
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Auth", description = "Wallet sign-in and sessions"),
        (name = "Orders", description = "Orders and payment settlement"),
        (name = "Profile", description = "Encrypted personal data and minting"),
        (name = "Shop", description = "Vendor browsing sessions")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::test_state;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (state, _dir) = test_state();
        let app = router(state);
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }

    #[test]
    fn openapi_document_is_well_formed() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json["paths"]["/auth/verify"].is_object());
        assert!(json["paths"]["/orders/{id}/submit-payment"].is_object());
    }
}
