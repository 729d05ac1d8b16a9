// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Tokengate

//! Personal-data registry minting.
//!
//! After a profile submission, the server (as the fee payer) mints an
//! on-chain record binding the user's wallet to the content hash of their
//! encrypted data. Minting degrades gracefully: when the minter key or the
//! registry contract is not configured, the submission still succeeds and
//! the mint is reported as skipped.

use std::str::FromStr;
use std::time::Duration;

use alloy::{
    network::EthereumWallet,
    primitives::{Address, B256},
    providers::ProviderBuilder,
    signers::local::PrivateKeySigner,
    sol,
};

sol! {
    #[sol(rpc)]
    contract PersonalDataRegistry {
        function mint(address to, bytes32 dataHash) external returns (uint256);
    }
}

/// Upper bound on send plus one confirmation.
const MINT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum MintError {
    #[error("minter private key is malformed")]
    BadMinterKey,

    #[error("address or hash is malformed: {0}")]
    BadInput(String),

    #[error("mint transaction failed: {0}")]
    TxFailed(String),

    #[error("mint transaction timed out")]
    Timeout,
}

/// Outcome reported alongside the profile submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintOutcome {
    /// Minting is not configured on this deployment.
    Skipped { reason: String },
    /// The registry mint confirmed.
    Minted { tx_hash: String },
}

/// Server-side minter for the personal-data registry.
#[derive(Clone)]
pub struct Minter {
    rpc_url: url::Url,
    registry: Option<Address>,
    minter_key: Option<String>,
}

impl Minter {
    pub fn new(
        rpc_url: &str,
        registry_address: Option<&str>,
        minter_private_key: Option<String>,
    ) -> Result<Self, MintError> {
        let rpc_url = rpc_url
            .parse()
            .map_err(|e: url::ParseError| MintError::BadInput(e.to_string()))?;
        let registry = registry_address
            .map(Address::from_str)
            .transpose()
            .map_err(|e| MintError::BadInput(e.to_string()))?;
        Ok(Self {
            rpc_url,
            registry,
            minter_key: minter_private_key,
        })
    }

    /// Whether both the registry contract and the minter key are present.
    pub fn configured(&self) -> bool {
        self.registry.is_some() && self.minter_key.is_some()
    }

    /// Mint a registry record for `owner` with the given content hash, or
    /// report the mint as skipped when unconfigured.
    ///
    /// Waits for one confirmation before returning the transaction hash.
    pub async fn maybe_mint(
        &self,
        owner: &str,
        data_hash: &str,
    ) -> Result<MintOutcome, MintError> {
        let (Some(registry), Some(key)) = (self.registry, self.minter_key.as_deref()) else {
            return Ok(MintOutcome::Skipped {
                reason: "mint not configured".to_string(),
            });
        };

        let owner = Address::from_str(owner).map_err(|e| MintError::BadInput(e.to_string()))?;
        let hash = B256::from_str(data_hash).map_err(|e| MintError::BadInput(e.to_string()))?;

        let signer = PrivateKeySigner::from_str(key).map_err(|_| MintError::BadMinterKey)?;
        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(self.rpc_url.clone());
        let contract = PersonalDataRegistry::new(registry, provider);

        let send_and_confirm = async {
            let pending = contract
                .mint(owner, hash)
                .send()
                .await
                .map_err(|e| MintError::TxFailed(e.to_string()))?;
            pending
                .with_required_confirmations(1)
                .get_receipt()
                .await
                .map_err(|e| MintError::TxFailed(e.to_string()))
        };

        let receipt = tokio::time::timeout(
            Duration::from_secs(MINT_TIMEOUT_SECS),
            send_and_confirm,
        )
        .await
        .map_err(|_| MintError::Timeout)??;

        if !receipt.status() {
            return Err(MintError::TxFailed("transaction reverted".to_string()));
        }

        Ok(MintOutcome::Minted {
            tx_hash: format!("{:#x}", receipt.transaction_hash),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_minter_skips() {
        let minter = Minter::new("http://localhost:8545", None, None).unwrap();
        assert!(!minter.configured());

        let outcome = minter
            .maybe_mint(
                "0x1111111111111111111111111111111111111111",
                "0x0000000000000000000000000000000000000000000000000000000000000001",
            )
            .await
            .unwrap();
        assert!(matches!(outcome, MintOutcome::Skipped { .. }));
    }

    #[tokio::test]
    async fn half_configured_minter_skips() {
        // Registry without key
        let minter = Minter::new(
            "http://localhost:8545",
            Some("0x2222222222222222222222222222222222222222"),
            None,
        )
        .unwrap();
        assert!(!minter.configured());
        let outcome = minter
            .maybe_mint(
                "0x1111111111111111111111111111111111111111",
                "0x0000000000000000000000000000000000000000000000000000000000000001",
            )
            .await
            .unwrap();
        assert!(matches!(outcome, MintOutcome::Skipped { .. }));
    }

    #[test]
    fn bad_registry_address_is_rejected() {
        assert!(matches!(
            Minter::new("http://localhost:8545", Some("not-an-address"), None),
            Err(MintError::BadInput(_))
        ));
    }
}
