// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Tokengate

//! Chain integration: receipt reads, Transfer matching, registry minting.

mod client;
mod minter;
mod transfer;

pub use client::{ChainClient, ChainError, ConfirmedReceipt};
pub use minter::{MintError, MintOutcome, Minter};
pub use transfer::{matches_transfer, ExpectationError, TransferExpectation};
