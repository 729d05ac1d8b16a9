// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Tokengate

//! Persistence layer.

mod database;

pub use database::{SettleOutcome, ShopDatabase, StoreError, StoreResult};
