// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Tokengate

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup and
//! validated; anything required and missing is a fatal error.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `CORS_ORIGIN` | Comma-separated allowed origins | `http://localhost:3000` |
//! | `JWT_SECRET` | HS256 session-token secret (>= 20 chars) | Required |
//! | `CHAIN_ID` | Expected EVM chain id | `97` |
//! | `RPC_URL` | EVM JSON-RPC endpoint | Required |
//! | `PAYMENT_TOKEN_ADDRESS` | ERC-20 used for order payment | Optional |
//! | `MERCHANT_RECEIVER_ADDRESS` | Payment receiver address | Optional |
//! | `REGISTRY_CONTRACT_ADDRESS` | Personal-data registry (mint target) | Optional |
//! | `MINTER_PRIVATE_KEY` | Server-held minter key (hex) | Optional |
//! | `PII_MASTER_KEY_BASE64` | Base64 of exactly 32 key bytes | Required |
//! | `ENABLE_ALI` / `ENABLE_AMAZON` / `ENABLE_TEMU` | Vendor toggles | `true` / `false` / `false` |
//! | `SIWE_DOMAIN` | Expected sign-in domain | `localhost` |
//! | `SIWE_URI` | Expected sign-in URI | `http://localhost:3000` |
//! | `DATA_DIR` | Directory for the embedded database | `/data` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::path::PathBuf;

use base64ct::{Base64, Encoding};

use crate::models::Vendor;

/// Session token validity: 2 hours.
pub const SESSION_TTL_SECS: i64 = 2 * 60 * 60;

/// Nonce validity: 10 minutes.
pub const NONCE_TTL_SECS: i64 = 10 * 60;

/// Minimum confirmations required before a payment receipt is accepted.
pub const MIN_CONFIRMATIONS: u64 = 1;

/// Upper bound on a single RPC read.
pub const RPC_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("PII_MASTER_KEY_BASE64 must decode to exactly 32 bytes, got {0}")]
    BadMasterKeyLength(usize),
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,

    pub jwt_secret: String,

    pub chain_id: u64,
    pub rpc_url: String,

    /// Lower-cased ERC-20 contract orders are paid in (None disables orders)
    pub payment_token_address: Option<String>,
    /// Lower-cased merchant receiver address
    pub merchant_receiver_address: Option<String>,
    /// Personal-data registry contract (None degrades mint to skipped)
    pub registry_contract_address: Option<String>,
    /// Hex minter private key (None degrades mint to skipped)
    pub minter_private_key: Option<String>,

    /// Raw 32-byte PII master key
    pub pii_master_key: [u8; 32],

    pub enable_ali: bool,
    pub enable_amazon: bool,
    pub enable_temu: bool,

    pub siwe_domain: String,
    pub siwe_uri: String,

    pub data_dir: PathBuf,
}

impl Config {
    /// Load and validate configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = require("JWT_SECRET")?;
        if jwt_secret.len() < 20 {
            return Err(ConfigError::Invalid {
                name: "JWT_SECRET",
                reason: "must be at least 20 characters".into(),
            });
        }

        let rpc_url = require("RPC_URL")?;
        url::Url::parse(&rpc_url).map_err(|e| ConfigError::Invalid {
            name: "RPC_URL",
            reason: e.to_string(),
        })?;

        let chain_id = optional("CHAIN_ID")
            .unwrap_or_else(|| "97".into())
            .parse::<u64>()
            .map_err(|e| ConfigError::Invalid {
                name: "CHAIN_ID",
                reason: e.to_string(),
            })?;

        let pii_master_key = decode_master_key(&require("PII_MASTER_KEY_BASE64")?)?;

        let port = optional("PORT")
            .unwrap_or_else(|| "8080".into())
            .parse::<u16>()
            .map_err(|e| ConfigError::Invalid {
                name: "PORT",
                reason: e.to_string(),
            })?;

        Ok(Self {
            host: optional("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            cors_origins: optional("CORS_ORIGIN")
                .unwrap_or_else(|| "http://localhost:3000".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            jwt_secret,
            chain_id,
            rpc_url,
            payment_token_address: optional_address("PAYMENT_TOKEN_ADDRESS"),
            merchant_receiver_address: optional_address("MERCHANT_RECEIVER_ADDRESS"),
            registry_contract_address: optional_address("REGISTRY_CONTRACT_ADDRESS"),
            minter_private_key: optional("MINTER_PRIVATE_KEY").filter(|s| !s.is_empty()),
            pii_master_key,
            enable_ali: flag("ENABLE_ALI", true),
            enable_amazon: flag("ENABLE_AMAZON", false),
            enable_temu: flag("ENABLE_TEMU", false),
            siwe_domain: optional("SIWE_DOMAIN").unwrap_or_else(|| "localhost".into()),
            siwe_uri: optional("SIWE_URI").unwrap_or_else(|| "http://localhost:3000".into()),
            data_dir: PathBuf::from(optional("DATA_DIR").unwrap_or_else(|| "/data".into())),
        })
    }

    /// Whether the given vendor is currently enabled.
    pub fn vendor_enabled(&self, vendor: Vendor) -> bool {
        match vendor {
            Vendor::Ali => self.enable_ali,
            Vendor::Amazon => self.enable_amazon,
            Vendor::Temu => self.enable_temu,
        }
    }

}

/// Decode and length-check the PII master key.
pub fn decode_master_key(b64: &str) -> Result<[u8; 32], ConfigError> {
    let bytes = Base64::decode_vec(b64.trim()).map_err(|e| ConfigError::Invalid {
        name: "PII_MASTER_KEY_BASE64",
        reason: e.to_string(),
    })?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| ConfigError::BadMasterKeyLength(len))
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.is_empty())
}

fn optional_address(name: &str) -> Option<String> {
    optional(name).map(|s| s.to_lowercase())
}

fn flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(v) => v == "true",
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn master_key_must_be_32_bytes() {
        let ok = Base64::encode_string(&[7u8; 32]);
        assert!(decode_master_key(&ok).is_ok());

        let short = Base64::encode_string(&[7u8; 16]);
        assert!(matches!(
            decode_master_key(&short),
            Err(ConfigError::BadMasterKeyLength(16))
        ));

        assert!(matches!(
            decode_master_key("not base64!!"),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn decoded_key_roundtrips() {
        let key = [42u8; 32];
        let encoded = Base64::encode_string(&key);
        assert_eq!(decode_master_key(&encoded).unwrap(), key);
    }
}
