// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Tokengate

//! Order creation and on-chain payment settlement.

use std::str::FromStr;

use alloy::primitives::U256;
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    auth::Auth,
    blockchain::{matches_transfer, TransferExpectation},
    config::MIN_CONFIRMATIONS,
    error::ApiError,
    models::{
        CreateOrderRequest, Order, OrderListResponse, OrderResponse, OrderStatus,
        SubmitPaymentRequest, SubmitPaymentResponse,
    },
    state::AppState,
    storage::SettleOutcome,
};

use super::vendor_disabled_code;

#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    tag = "Orders",
    security(("bearer" = [])),
    responses(
        (status = 200, body = OrderResponse),
        (status = 400, description = "Amount is not a non-negative integer"),
        (status = 503, description = "Vendor is disabled"),
        (status = 500, description = "Payment token or receiver not configured")
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    Auth(user): Auth,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    if !state.config.vendor_enabled(request.vendor) {
        return Err(ApiError::unavailable(vendor_disabled_code(request.vendor)));
    }

    let (Some(token), Some(receiver)) = (
        state.config.payment_token_address.as_deref(),
        state.config.merchant_receiver_address.as_deref(),
    ) else {
        return Err(ApiError::internal("PAYMENT_CONFIG_MISSING"));
    };

    // Base-unit integer; rejects decimals, signs, and junk.
    U256::from_str(&request.amount).map_err(|_| ApiError::bad_request("INVALID_AMOUNT"))?;

    let order = Order {
        id: Uuid::new_v4().to_string(),
        user_id: user.user_id,
        vendor: request.vendor,
        product_url: request.product_url,
        amount: request.amount,
        token_address: token.to_string(),
        receiver: receiver.to_string(),
        payment_tx: None,
        status: OrderStatus::PendingPayment,
        created_at: Utc::now(),
        paid_at: None,
    };
    state.db.create_order(&order)?;

    tracing::info!(order_id = %order.id, vendor = %order.vendor, "order created");
    Ok(Json(OrderResponse { order }))
}

#[utoipa::path(
    post,
    path = "/orders/{id}/submit-payment",
    params(("id" = String, Path, description = "Order identifier")),
    request_body = SubmitPaymentRequest,
    tag = "Orders",
    security(("bearer" = [])),
    responses(
        (status = 200, body = SubmitPaymentResponse),
        (status = 400, description = "Receipt missing, unmatched, or hash already used"),
        (status = 404, description = "No such order for this user")
    )
)]
pub async fn submit_payment(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(order_id): Path<String>,
    Json(request): Json<SubmitPaymentRequest>,
) -> Result<Json<SubmitPaymentResponse>, ApiError> {
    let order = state
        .db
        .get_order_owned(&order_id, &user.user_id)?
        .ok_or_else(|| ApiError::not_found("ORDER_NOT_FOUND"))?;

    // A paid order acknowledges resubmission without touching the chain.
    if order.status == OrderStatus::Paid {
        return Ok(Json(SubmitPaymentResponse {
            ok: true,
            status: OrderStatus::Paid,
        }));
    }

    if state.db.payment_tx_claimed_by(&request.tx_hash)?.is_some() {
        return Err(ApiError::bad_request("TX_ALREADY_USED"));
    }

    let expected = TransferExpectation::from_order(
        &order.token_address,
        &user.address,
        &order.receiver,
        &order.amount,
    )
    .map_err(|_| ApiError::internal("PAYMENT_CONFIG_MISSING"))?;

    // RPC read happens with no lock held; settlement re-checks everything.
    let receipt = state
        .chain
        .fetch_confirmed(&request.tx_hash, MIN_CONFIRMATIONS)
        .await?;

    if !matches_transfer(&receipt.logs, &expected) {
        state.db.mark_order_failed(&order.id)?;
        tracing::warn!(order_id = %order.id, tx_hash = %receipt.tx_hash, "payment not matched");
        return Err(ApiError::bad_request("PAYMENT_NOT_MATCHED"));
    }

    match state.db.settle_payment(&order.id, &receipt.tx_hash, Utc::now())? {
        SettleOutcome::Paid(order) => {
            tracing::info!(order_id = %order.id, tx_hash = %receipt.tx_hash, "order settled");
            Ok(Json(SubmitPaymentResponse {
                ok: true,
                status: OrderStatus::Paid,
            }))
        }
        SettleOutcome::AlreadyPaid(_) => Ok(Json(SubmitPaymentResponse {
            ok: true,
            status: OrderStatus::Paid,
        })),
        SettleOutcome::TxAlreadyUsed => Err(ApiError::bad_request("TX_ALREADY_USED")),
    }
}

#[utoipa::path(
    get,
    path = "/orders/me",
    tag = "Orders",
    security(("bearer" = [])),
    responses((status = 200, body = OrderListResponse))
)]
pub async fn list_my_orders(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<OrderListResponse>, ApiError> {
    let orders = state.db.list_orders_for_user(&user.user_id)?;
    Ok(Json(OrderListResponse { orders }))
}
