// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Tokengate

//! JSON-RPC client for payment verification.
//!
//! The server never watches the chain; it reads a receipt only when a user
//! submits a transaction hash. Every RPC read is bounded by a timeout so a
//! stalled node cannot pin request handlers.

use std::str::FromStr;
use std::time::Duration;

use alloy::{
    primitives::{Log, B256},
    providers::{Provider, RootProvider},
};

use crate::config::RPC_TIMEOUT_SECS;

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("transaction hash is not a 32-byte hex string")]
    InvalidHash,

    #[error("transaction not found")]
    TxNotFound,

    #[error("transaction reverted")]
    TxFailed,

    #[error("transaction lacks required confirmations")]
    TxNotConfirmed,

    #[error("RPC error: {0}")]
    Rpc(String),
}

impl ChainError {
    /// Stable client-facing error code.
    pub fn code(&self) -> &'static str {
        match self {
            ChainError::InvalidRpcUrl(_) | ChainError::Rpc(_) => "RPC_ERROR",
            ChainError::InvalidHash | ChainError::TxNotFound => "TX_NOT_FOUND",
            ChainError::TxFailed => "TX_FAILED",
            ChainError::TxNotConfirmed => "TX_NOT_CONFIRMED",
        }
    }
}

impl From<ChainError> for crate::error::ApiError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::InvalidRpcUrl(_) | ChainError::Rpc(_) => {
                tracing::error!(error = %err, "RPC failure");
                crate::error::ApiError::new(
                    axum::http::StatusCode::BAD_GATEWAY,
                    err.code(),
                )
            }
            _ => crate::error::ApiError::bad_request(err.code()),
        }
    }
}

/// A mined, successful, sufficiently confirmed transaction.
#[derive(Debug, Clone)]
pub struct ConfirmedReceipt {
    /// Canonical (lower-case, 0x-prefixed) transaction hash
    pub tx_hash: String,
    /// Primitive logs emitted by the transaction
    pub logs: Vec<Log>,
}

/// Read-only chain client.
#[derive(Clone)]
pub struct ChainClient {
    provider: RootProvider,
}

impl ChainClient {
    pub fn new(rpc_url: &str) -> Result<Self, ChainError> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))?;
        Ok(Self {
            provider: RootProvider::new_http(url),
        })
    }

    /// Fetch the receipt for `tx_hash` and require success plus at least
    /// `min_confirmations` confirmations.
    ///
    /// A receipt that does not exist, a timed-out read, and a malformed
    /// hash all report `TxNotFound`; a reverted transaction `TxFailed`; a
    /// mined-but-fresh one `TxNotConfirmed`.
    pub async fn fetch_confirmed(
        &self,
        tx_hash: &str,
        min_confirmations: u64,
    ) -> Result<ConfirmedReceipt, ChainError> {
        let hash = B256::from_str(tx_hash).map_err(|_| ChainError::InvalidHash)?;

        let receipt = self
            .bounded(self.provider.get_transaction_receipt(hash))
            .await?
            .ok_or(ChainError::TxNotFound)?;

        if !receipt.status() {
            return Err(ChainError::TxFailed);
        }

        let mined_in = receipt.block_number.ok_or(ChainError::TxNotConfirmed)?;
        let latest = self.bounded(self.provider.get_block_number()).await?;
        let confirmations = latest.saturating_sub(mined_in) + 1;
        if confirmations < min_confirmations {
            return Err(ChainError::TxNotConfirmed);
        }

        Ok(ConfirmedReceipt {
            tx_hash: format!("{hash:#x}"),
            logs: receipt
                .inner
                .logs()
                .iter()
                .map(|log| log.inner.clone())
                .collect(),
        })
    }

    /// Run an RPC future under the global read timeout.
    async fn bounded<T, E: std::fmt::Display>(
        &self,
        fut: impl std::future::Future<Output = Result<T, E>>,
    ) -> Result<T, ChainError> {
        match tokio::time::timeout(Duration::from_secs(RPC_TIMEOUT_SECS), fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(ChainError::Rpc(e.to_string())),
            Err(_) => Err(ChainError::TxNotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_url_is_rejected() {
        assert!(matches!(
            ChainClient::new("not a url"),
            Err(ChainError::InvalidRpcUrl(_))
        ));
        assert!(ChainClient::new("http://localhost:8545").is_ok());
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(ChainError::TxNotFound.code(), "TX_NOT_FOUND");
        assert_eq!(ChainError::InvalidHash.code(), "TX_NOT_FOUND");
        assert_eq!(ChainError::TxFailed.code(), "TX_FAILED");
        assert_eq!(ChainError::TxNotConfirmed.code(), "TX_NOT_CONFIRMED");
    }
}
