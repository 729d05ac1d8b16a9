// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Tokengate

//! Shared application state.

use std::sync::Arc;

use crate::auth::{NonceAuthority, SessionManager, SiweVerifier};
use crate::blockchain::{ChainClient, ChainError, MintError, Minter};
use crate::config::Config;
use crate::storage::{ShopDatabase, StoreError};
use crate::vault::PiiVault;

const DATABASE_FILE: &str = "tokengate.redb";

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Mint(#[from] MintError),
}

/// Everything a request handler needs, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<ShopDatabase>,
    pub nonces: NonceAuthority,
    pub sessions: SessionManager,
    pub siwe: SiweVerifier,
    pub vault: PiiVault,
    pub chain: ChainClient,
    pub minter: Minter,
}

impl AppState {
    /// Build the full state from validated configuration, opening the
    /// embedded database under `config.data_dir`.
    pub fn new(config: Config) -> Result<Self, StateError> {
        let db = Arc::new(ShopDatabase::open(&config.data_dir.join(DATABASE_FILE))?);

        let chain = ChainClient::new(&config.rpc_url)?;
        let minter = Minter::new(
            &config.rpc_url,
            config.registry_contract_address.as_deref(),
            config.minter_private_key.clone(),
        )?;

        Ok(Self {
            nonces: NonceAuthority::new(Arc::clone(&db)),
            sessions: SessionManager::new(Arc::clone(&db), &config.jwt_secret),
            siwe: SiweVerifier {
                domain: config.siwe_domain.clone(),
                uri: config.siwe_uri.clone(),
                chain_id: config.chain_id,
            },
            vault: PiiVault::new(config.pii_master_key),
            chain,
            minter,
            db,
            config: Arc::new(config),
        })
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// A fully wired state over a temp database and an unreachable local
    /// RPC endpoint, for handler tests that never touch the chain.
    pub fn test_state() -> (AppState, tempfile::TempDir) {
        test_state_with(|_| {})
    }

    /// Like [`test_state`], with a configuration tweak applied first.
    pub fn test_state_with(tweak: impl FnOnce(&mut Config)) -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config {
            host: "127.0.0.1".into(),
            port: 0,
            cors_origins: vec!["http://localhost:3000".into()],
            jwt_secret: "a-test-secret-of-sufficient-length".into(),
            chain_id: 97,
            rpc_url: "http://127.0.0.1:1".into(),
            payment_token_address: Some("0x5425890298aed601595a70ab815c96711a31bc65".into()),
            merchant_receiver_address: Some("0x2222222222222222222222222222222222222222".into()),
            registry_contract_address: None,
            minter_private_key: None,
            pii_master_key: [7u8; 32],
            enable_ali: true,
            enable_amazon: false,
            enable_temu: false,
            siwe_domain: "localhost".into(),
            siwe_uri: "http://localhost:3000".into(),
            data_dir: dir.path().to_path_buf(),
        };
        tweak(&mut config);
        (AppState::new(config).unwrap(), dir)
    }
}
