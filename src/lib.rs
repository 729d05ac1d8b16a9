// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Tokengate

//! Tokengate - Wallet-Authenticated Commerce Backend
//!
//! This crate provides wallet-based sign-in (EIP-4361 challenge-response),
//! order settlement against on-chain ERC-20 payments, and an encrypted
//! personal-data registry with conditional minting.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - SIWE verification, sessions, request extraction
//! - `blockchain` - Receipt reads, Transfer matching, registry minting
//! - `storage` - Embedded ACID store (redb)
//! - `vault` - AES-256-GCM encryption for personal data

pub mod api;
pub mod auth;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
pub mod vault;
