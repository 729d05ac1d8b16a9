// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Tokengate

//! EIP-4361 (Sign-In with Ethereum) message parsing and verification.
//!
//! Verification is an ordered pipeline so a given bad message always yields
//! the same error code: parse, address, chain id, domain, URI, then (after
//! the caller consumes the nonce) signature recovery. Signature recovery is
//! EIP-191 `personal_sign` recovery over the exact message text.

use std::str::FromStr;

use alloy::primitives::{Address, Signature};

use super::AuthError;

const HEADER_SUFFIX: &str = " wants you to sign in with your Ethereum account:";

/// Fields parsed out of an EIP-4361 message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiweMessage {
    pub domain: String,
    pub address: String,
    pub statement: Option<String>,
    pub uri: String,
    pub version: String,
    pub chain_id: u64,
    pub nonce: String,
    pub issued_at: String,
}

impl SiweMessage {
    /// Parse the plain-text EIP-4361 template.
    ///
    /// Accepts the required fields plus an optional statement; unknown
    /// trailing fields (Expiration Time, Resources, ...) are tolerated.
    pub fn parse(message: &str) -> Result<Self, AuthError> {
        let mut lines = message.lines();

        let domain = lines
            .next()
            .and_then(|line| line.strip_suffix(HEADER_SUFFIX))
            .filter(|d| !d.is_empty())
            .ok_or(AuthError::InvalidSiweMessage)?
            .to_string();

        let address = lines
            .next()
            .filter(|a| !a.is_empty())
            .ok_or(AuthError::InvalidSiweMessage)?
            .to_string();

        // Statement block sits between the address and the field list,
        // delimited by blank lines.
        let mut statement_lines = Vec::new();
        let mut uri = None;
        let mut version = None;
        let mut chain_id = None;
        let mut nonce = None;
        let mut issued_at = None;

        for line in lines {
            if let Some(value) = line.strip_prefix("URI: ") {
                uri = Some(value.to_string());
            } else if let Some(value) = line.strip_prefix("Version: ") {
                version = Some(value.to_string());
            } else if let Some(value) = line.strip_prefix("Chain ID: ") {
                chain_id = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| AuthError::InvalidSiweMessage)?,
                );
            } else if let Some(value) = line.strip_prefix("Nonce: ") {
                nonce = Some(value.to_string());
            } else if let Some(value) = line.strip_prefix("Issued At: ") {
                issued_at = Some(value.to_string());
            } else if uri.is_none() && !line.is_empty() {
                statement_lines.push(line);
            }
        }

        Ok(Self {
            domain,
            address,
            statement: (!statement_lines.is_empty()).then(|| statement_lines.join("\n")),
            uri: uri.ok_or(AuthError::InvalidSiweMessage)?,
            version: version.ok_or(AuthError::InvalidSiweMessage)?,
            chain_id: chain_id.ok_or(AuthError::InvalidSiweMessage)?,
            nonce: nonce.ok_or(AuthError::InvalidSiweMessage)?,
            issued_at: issued_at.ok_or(AuthError::InvalidSiweMessage)?,
        })
    }

    /// Render the message in the canonical EIP-4361 layout.
    ///
    /// This is what a client signs; servers only parse, but rendering keeps
    /// the two directions testable against each other.
    pub fn to_message(&self) -> String {
        let statement = match &self.statement {
            Some(s) => format!("\n{s}\n"),
            None => String::new(),
        };
        format!(
            "{domain}{HEADER_SUFFIX}\n{address}\n{statement}\nURI: {uri}\nVersion: {version}\nChain ID: {chain_id}\nNonce: {nonce}\nIssued At: {issued_at}",
            domain = self.domain,
            address = self.address,
            uri = self.uri,
            version = self.version,
            chain_id = self.chain_id,
            nonce = self.nonce,
            issued_at = self.issued_at,
        )
    }
}

/// Expected message parameters, fixed at startup from configuration.
#[derive(Debug, Clone)]
pub struct SiweVerifier {
    pub domain: String,
    pub uri: String,
    pub chain_id: u64,
}

impl SiweVerifier {
    /// Check the parsed message against the claimed address and the
    /// configured domain, URI, and chain id.
    ///
    /// Checks run in a fixed order; the first failure decides the error.
    pub fn check(&self, message: &SiweMessage, claimed_address: &str) -> Result<(), AuthError> {
        if !message.address.eq_ignore_ascii_case(claimed_address) {
            return Err(AuthError::AddressMismatch);
        }
        if message.chain_id != self.chain_id {
            return Err(AuthError::ChainMismatch);
        }
        if message.domain != self.domain {
            return Err(AuthError::DomainMismatch);
        }
        if message.uri != self.uri {
            return Err(AuthError::UriMismatch);
        }
        Ok(())
    }
}

/// Recover the EIP-191 signer of `message` and compare to the claimed
/// address (case-insensitive).
pub fn verify_signature(
    message: &str,
    signature: &str,
    claimed_address: &str,
) -> Result<Address, AuthError> {
    let signature =
        Signature::from_str(signature).map_err(|_| AuthError::SignatureInvalid)?;
    let recovered = signature
        .recover_address_from_msg(message)
        .map_err(|_| AuthError::SignatureInvalid)?;

    let claimed =
        Address::from_str(claimed_address).map_err(|_| AuthError::SignatureInvalid)?;
    if recovered != claimed {
        return Err(AuthError::SignatureInvalid);
    }
    Ok(recovered)
}
