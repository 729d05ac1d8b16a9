// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Tokengate

//! # API Data Models
//!
//! Entities persisted in the embedded store plus the request and response
//! structures used by the REST API. All wire types derive `Serialize`,
//! `Deserialize`, and `ToSchema` for JSON handling and OpenAPI docs.
//!
//! Wire field names are camelCase to match the browser client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Users
// =============================================================================

/// A registered wallet user.
///
/// Identified by the lower-cased on-chain address; created lazily on the
/// first nonce request and never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier (UUID)
    pub id: String,
    /// Canonical (lower-case) wallet address
    pub address: String,
    /// When the user record was created
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Auth Nonces
// =============================================================================

/// A single-use authentication challenge nonce.
///
/// Valid for exactly one successful verification: once `used_at` is set or
/// `expires_at` has passed, the nonce is permanently unusable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthNonce {
    /// The random hex token embedded in the signed message
    pub nonce: String,
    /// Owning user id
    pub user_id: String,
    /// Expiry timestamp (10 minutes after issuance)
    pub expires_at: DateTime<Utc>,
    /// Set when the nonce is consumed by a successful verification
    pub used_at: Option<DateTime<Utc>>,
    /// When the nonce was issued
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sessions
// =============================================================================

/// A bearer session created on successful signature verification.
///
/// Revocation is tracked on the record: a revoked session must be rejected
/// even if the bearer token itself has not expired.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique session identifier (UUID, the `sid` claim)
    pub id: String,
    /// Owning user id
    pub user_id: String,
    /// When the session was created
    pub created_at: DateTime<Utc>,
    /// Set on logout; a revoked session rejects its token
    pub revoked_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Orders
// =============================================================================

/// Third-party vendor identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Vendor {
    Ali,
    Amazon,
    Temu,
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Vendor::Ali => write!(f, "ALI"),
            Vendor::Amazon => write!(f, "AMAZON"),
            Vendor::Temu => write!(f, "TEMU"),
        }
    }
}

/// Order payment lifecycle.
///
/// `PendingPayment` is the initial state. `Paid` is terminal. `Failed` allows
/// retry with a different transaction hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    PendingPayment,
    Paid,
    Failed,
}

/// A vendor order awaiting (or settled by) an on-chain token payment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Unique order identifier (UUID)
    pub id: String,
    /// Owning user id
    pub user_id: String,
    /// Vendor this order targets
    pub vendor: Vendor,
    /// Product page URL
    pub product_url: String,
    /// Token amount in base units, decimal string (compared as U256)
    pub amount: String,
    /// ERC-20 contract expected to emit the payment transfer (lower-case)
    pub token_address: String,
    /// Merchant receiver address (lower-case)
    pub receiver: String,
    /// Settling transaction hash; globally unique once set
    pub payment_tx: Option<String>,
    /// Current lifecycle state
    pub status: OrderStatus,
    /// When the order was created
    pub created_at: DateTime<Utc>,
    /// When the payment was matched and the order marked paid
    pub paid_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Purchase Sessions
// =============================================================================

/// Browsing-intent lifecycle for the vendor bridge flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseSessionStatus {
    Created,
    Returned,
}

/// A short-lived record of a user browsing a vendor product.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseSession {
    /// Unique identifier (UUID)
    pub id: String,
    /// Owning user id
    pub user_id: String,
    /// Vendor being browsed
    pub vendor: Vendor,
    /// Product page URL
    pub product_url: String,
    /// Current state
    pub status: PurchaseSessionStatus,
    /// When the session was created
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Personal Info
// =============================================================================

/// Personal-data record lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersonalInfoStatus {
    Pending,
    Minted,
}

/// The one-per-user encrypted personal-data record.
///
/// `encrypted_json` is the base64 vault blob; `data_hash` is the 0x-prefixed
/// SHA-256 of that blob, referenced by the on-chain mint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    /// Owning user id (also the storage key; one record per user)
    pub user_id: String,
    /// Base64 `nonce || tag || ciphertext` vault blob
    pub encrypted_json: String,
    /// 0x-prefixed hex SHA-256 of the blob
    pub data_hash: String,
    /// Mint state
    pub status: PersonalInfoStatus,
    /// Mint transaction hash, set when status becomes `MINTED`
    pub mint_tx_hash: Option<String>,
    /// Last submission time
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Auth API types
// =============================================================================

/// Query parameters for `GET /auth/nonce`.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct NonceQuery {
    /// Wallet address requesting a challenge
    pub address: String,
}

/// Response for `GET /auth/nonce`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NonceResponse {
    /// The challenge nonce to embed in the signed message
    pub nonce: String,
    /// When the nonce expires
    pub expires_at: DateTime<Utc>,
}

/// Request body for `POST /auth/verify`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VerifyRequest {
    /// Claimed wallet address
    pub address: String,
    /// The full EIP-4361 message that was signed
    pub message: String,
    /// Hex-encoded 65-byte signature
    pub signature: String,
}

/// Public user view returned on verification.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserView {
    pub id: String,
    pub address: String,
}

/// Response for `POST /auth/verify`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VerifyResponse {
    /// Bearer session token (2 hour validity)
    pub token: String,
    pub user: UserView,
}

/// Generic `{ ok: true }` acknowledgement.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OkResponse {
    pub ok: bool,
}

// =============================================================================
// Order API types
// =============================================================================

/// Request body for `POST /orders`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub vendor: Vendor,
    pub product_url: String,
    /// Token amount in base units, decimal string
    pub amount: String,
}

/// Response for `POST /orders`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderResponse {
    pub order: Order,
}

/// Request body for `POST /orders/{id}/submit-payment`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPaymentRequest {
    /// 0x-prefixed 32-byte transaction hash
    pub tx_hash: String,
}

/// Response for `POST /orders/{id}/submit-payment`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubmitPaymentResponse {
    pub ok: bool,
    pub status: OrderStatus,
}

/// Response for `GET /orders/me`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<Order>,
}

// =============================================================================
// Profile API types
// =============================================================================

/// Request body for `POST /profile`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpsertProfileRequest {
    /// Arbitrary personal-data object; encrypted before storage
    pub data: serde_json::Value,
}

/// Mint outcome reported alongside a profile submission.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MintReport {
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

/// Response for `POST /profile`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UpsertProfileResponse {
    pub ok: bool,
    pub profile: PersonalInfo,
    pub mint: MintReport,
}

/// Response for `GET /profile/status`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfileStatusResponse {
    pub profile: Option<PersonalInfo>,
}

// =============================================================================
// Shop API types
// =============================================================================

/// Request body for `POST /shop/session`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchaseSessionRequest {
    pub vendor: Vendor,
    pub product_url: String,
}

/// Response for `POST /shop/session`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseSessionResponse {
    pub session_id: String,
    pub bridge_url: String,
}
