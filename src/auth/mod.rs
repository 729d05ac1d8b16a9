// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Tokengate

//! Wallet authentication: SIWE challenge-response, sessions, and the
//! request extractor.

mod error;
mod extractor;
mod nonce;
mod session;
mod siwe;

pub use error::AuthError;
pub use extractor::Auth;
pub use nonce::NonceAuthority;
pub use session::{AuthenticatedUser, SessionClaims, SessionManager};
pub use siwe::{verify_signature, SiweMessage, SiweVerifier};
