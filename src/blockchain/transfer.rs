// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Tokengate

//! ERC-20 Transfer log matching.
//!
//! A payment claim is accepted only if the submitted transaction's logs
//! contain a `Transfer` event emitted by the expected token contract, from
//! the payer, to the merchant receiver, for exactly the order amount.

use std::str::FromStr;

use alloy::{
    primitives::{Address, Log, U256},
    sol,
    sol_types::SolEvent,
};

sol! {
    event Transfer(address indexed from, address indexed to, uint256 value);
}

/// What a payment transaction must have emitted.
#[derive(Debug, Clone)]
pub struct TransferExpectation {
    /// Token contract that must emit the event
    pub token: Address,
    /// Payer (the authenticated user's wallet)
    pub from: Address,
    /// Merchant receiver
    pub to: Address,
    /// Exact value in base units
    pub amount: U256,
}

impl TransferExpectation {
    /// Build from the lower-case string forms stored on an order.
    pub fn from_order(
        token: &str,
        from: &str,
        to: &str,
        amount: &str,
    ) -> Result<Self, ExpectationError> {
        Ok(Self {
            token: Address::from_str(token).map_err(|_| ExpectationError::Address)?,
            from: Address::from_str(from).map_err(|_| ExpectationError::Address)?,
            to: Address::from_str(to).map_err(|_| ExpectationError::Address)?,
            amount: U256::from_str(amount).map_err(|_| ExpectationError::Amount)?,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExpectationError {
    #[error("not a valid address")]
    Address,
    #[error("not a valid decimal amount")]
    Amount,
}

/// Whether any log satisfies the expectation.
///
/// Logs from other contracts and other event kinds are skipped, not errors;
/// a transaction may carry many logs and one matching Transfer suffices.
/// The full triplet must match exactly: sender, recipient, and value, with
/// the value compared as a 256-bit integer.
pub fn matches_transfer(logs: &[Log], expected: &TransferExpectation) -> bool {
    logs.iter().any(|log| {
        if log.address != expected.token {
            return false;
        }
        match Transfer::decode_log(log) {
            Ok(event) => {
                let Transfer { from, to, value } = event.data;
                from == expected.from && to == expected.to && value == expected.amount
            }
            Err(_) => false,
        }
    })
}
