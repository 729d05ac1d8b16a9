// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Tokengate

//! Embedded store backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: lowercase address → serialized User
//! - `auth_nonces`: composite key (user_id|nonce) → serialized AuthNonce
//! - `sessions`: session_id → serialized Session
//! - `orders`: order_id → serialized Order
//! - `payment_tx_index`: lowercase tx_hash → order_id
//! - `purchase_sessions`: session_id → serialized PurchaseSession
//! - `personal_info`: user_id → serialized PersonalInfo
//!
//! redb serializes write transactions, so every read-check-write method in
//! this module is a compare-and-set: nonce consumption, payment settlement,
//! and the minted-status update each decide and write atomically. The
//! `payment_tx_index` insert happens in the same write transaction as the
//! order's `PAID` transition, which makes the payment-hash uniqueness a
//! storage-level constraint rather than an application-level check.

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use uuid::Uuid;

use crate::models::{
    AuthNonce, Order, OrderStatus, PersonalInfo, PersonalInfoStatus, PurchaseSession,
    PurchaseSessionStatus, Session, User,
};

// =============================================================================
// Table Definitions
// =============================================================================

/// Lowercase wallet address → serialized User (JSON bytes).
const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Composite key `user_id|nonce` → serialized AuthNonce.
const AUTH_NONCES: TableDefinition<&str, &[u8]> = TableDefinition::new("auth_nonces");

/// Session id → serialized Session.
const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

/// Order id → serialized Order.
const ORDERS: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Lowercase payment tx hash → order id. Nullable-unique constraint on
/// `Order.payment_tx`: a hash can settle at most one order, ever.
const PAYMENT_TX_INDEX: TableDefinition<&str, &str> = TableDefinition::new("payment_tx_index");

/// Purchase session id → serialized PurchaseSession.
const PURCHASE_SESSIONS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("purchase_sessions");

/// User id → serialized PersonalInfo (one record per user).
const PERSONAL_INFO: TableDefinition<&str, &[u8]> = TableDefinition::new("personal_info");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of an atomic payment settlement attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleOutcome {
    /// The order transitioned to PAID with this settlement.
    Paid(Order),
    /// The order was already PAID (idempotent resubmission or lost race).
    AlreadyPaid(Order),
    /// The transaction hash has been claimed by another order.
    TxAlreadyUsed,
}

fn nonce_key(user_id: &str, nonce: &str) -> String {
    format!("{user_id}|{nonce}")
}

// =============================================================================
// ShopDatabase
// =============================================================================

/// Embedded ACID store for all shop entities.
pub struct ShopDatabase {
    db: Database,
}

impl ShopDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(AUTH_NONCES)?;
            let _ = write_txn.open_table(SESSIONS)?;
            let _ = write_txn.open_table(ORDERS)?;
            let _ = write_txn.open_table(PAYMENT_TX_INDEX)?;
            let _ = write_txn.open_table(PURCHASE_SESSIONS)?;
            let _ = write_txn.open_table(PERSONAL_INFO)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Get the user for an address, creating the record if absent.
    ///
    /// Addresses are canonicalized to lower case before lookup.
    pub fn upsert_user(&self, address: &str) -> StoreResult<User> {
        let addr = address.to_lowercase();

        let write_txn = self.db.begin_write()?;
        let user = {
            let mut table = write_txn.open_table(USERS)?;
            let existing = match table.get(addr.as_str())? {
                Some(value) => Some(serde_json::from_slice::<User>(value.value())?),
                None => None,
            };
            match existing {
                Some(user) => user,
                None => {
                    let user = User {
                        id: Uuid::new_v4().to_string(),
                        address: addr.clone(),
                        created_at: Utc::now(),
                    };
                    let json = serde_json::to_vec(&user)?;
                    table.insert(addr.as_str(), json.as_slice())?;
                    user
                }
            }
        };
        write_txn.commit()?;
        Ok(user)
    }

    /// Look up a user by (case-insensitive) address.
    pub fn get_user_by_address(&self, address: &str) -> StoreResult<Option<User>> {
        let addr = address.to_lowercase();
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        match table.get(addr.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Auth Nonces
    // =========================================================================

    /// Persist a freshly issued nonce.
    ///
    /// A colliding value for the same user is overwritten, so the stored
    /// record is always the most recently issued one.
    pub fn insert_nonce(&self, record: &AuthNonce) -> StoreResult<()> {
        let key = nonce_key(&record.user_id, &record.nonce);
        let json = serde_json::to_vec(record)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(AUTH_NONCES)?;
            table.insert(key.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Atomically consume a nonce: returns `true` if it existed, was unused,
    /// and unexpired, and is now marked used.
    ///
    /// The check and the `used_at` write happen in one write transaction;
    /// concurrent attempts on the same value yield exactly one `true`.
    pub fn consume_nonce(&self, user_id: &str, nonce: &str) -> StoreResult<bool> {
        let key = nonce_key(user_id, nonce);
        let now = Utc::now();

        let write_txn = self.db.begin_write()?;
        let consumed = {
            let mut table = write_txn.open_table(AUTH_NONCES)?;
            let existing = match table.get(key.as_str())? {
                Some(value) => Some(serde_json::from_slice::<AuthNonce>(value.value())?),
                None => None,
            };
            match existing {
                Some(mut record) if record.used_at.is_none() && record.expires_at > now => {
                    record.used_at = Some(now);
                    let json = serde_json::to_vec(&record)?;
                    table.insert(key.as_str(), json.as_slice())?;
                    true
                }
                _ => false,
            }
        };
        write_txn.commit()?;
        Ok(consumed)
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Create a new session for a user.
    pub fn create_session(&self, user_id: &str) -> StoreResult<Session> {
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
            revoked_at: None,
        };
        let json = serde_json::to_vec(&session)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSIONS)?;
            table.insert(session.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(session)
    }

    /// Look up a session by id.
    pub fn get_session(&self, session_id: &str) -> StoreResult<Option<Session>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSIONS)?;
        match table.get(session_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Revoke a session. Idempotent: an already-revoked session keeps its
    /// original revocation time.
    pub fn revoke_session(&self, session_id: &str) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSIONS)?;
            let existing = match table.get(session_id)? {
                Some(value) => serde_json::from_slice::<Session>(value.value())?,
                None => {
                    return Err(StoreError::NotFound(format!("Session {session_id}")));
                }
            };
            if existing.revoked_at.is_none() {
                let mut session = existing;
                session.revoked_at = Some(Utc::now());
                let json = serde_json::to_vec(&session)?;
                table.insert(session_id, json.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Persist a new order.
    pub fn create_order(&self, order: &Order) -> StoreResult<()> {
        let json = serde_json::to_vec(order)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ORDERS)?;
            table.insert(order.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up an order owned by the given user.
    pub fn get_order_owned(&self, order_id: &str, user_id: &str) -> StoreResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS)?;
        match table.get(order_id)? {
            Some(value) => {
                let order: Order = serde_json::from_slice(value.value())?;
                Ok((order.user_id == user_id).then_some(order))
            }
            None => Ok(None),
        }
    }

    /// All orders for a user, newest first.
    pub fn list_orders_for_user(&self, user_id: &str) -> StoreResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS)?;

        let mut orders = Vec::new();
        for entry in table.iter()? {
            let entry = entry?;
            let order: Order = serde_json::from_slice(entry.1.value())?;
            if order.user_id == user_id {
                orders.push(order);
            }
        }
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// Which order, if any, has already claimed this transaction hash.
    pub fn payment_tx_claimed_by(&self, tx_hash: &str) -> StoreResult<Option<String>> {
        let hash = tx_hash.to_lowercase();
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PAYMENT_TX_INDEX)?;
        match table.get(hash.as_str())? {
            Some(value) => Ok(Some(value.value().to_string())),
            None => Ok(None),
        }
    }

    /// Atomically settle an order as paid by `tx_hash`.
    ///
    /// In one write transaction: re-reads the order, short-circuits if it is
    /// already PAID, rejects if the hash is claimed by any order, then
    /// inserts the index entry and writes the PAID transition. Concurrent
    /// submissions for the same order or the same hash cannot both win.
    pub fn settle_payment(
        &self,
        order_id: &str,
        tx_hash: &str,
        paid_at: DateTime<Utc>,
    ) -> StoreResult<SettleOutcome> {
        let hash = tx_hash.to_lowercase();

        let write_txn = self.db.begin_write()?;
        let outcome = {
            let mut orders = write_txn.open_table(ORDERS)?;
            let mut index = write_txn.open_table(PAYMENT_TX_INDEX)?;

            let order = match orders.get(order_id)? {
                Some(value) => serde_json::from_slice::<Order>(value.value())?,
                None => {
                    return Err(StoreError::NotFound(format!("Order {order_id}")));
                }
            };

            if order.status == OrderStatus::Paid {
                SettleOutcome::AlreadyPaid(order)
            } else if index.get(hash.as_str())?.is_some() {
                SettleOutcome::TxAlreadyUsed
            } else {
                index.insert(hash.as_str(), order_id)?;

                let mut paid = order;
                paid.status = OrderStatus::Paid;
                paid.payment_tx = Some(hash.clone());
                paid.paid_at = Some(paid_at);

                let json = serde_json::to_vec(&paid)?;
                orders.insert(order_id, json.as_slice())?;
                SettleOutcome::Paid(paid)
            }
        };
        write_txn.commit()?;
        Ok(outcome)
    }

    /// Mark an order FAILED after a non-matching payment submission.
    ///
    /// Never clobbers a PAID order (a concurrent settlement wins).
    pub fn mark_order_failed(&self, order_id: &str) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ORDERS)?;
            let order = match table.get(order_id)? {
                Some(value) => serde_json::from_slice::<Order>(value.value())?,
                None => {
                    return Err(StoreError::NotFound(format!("Order {order_id}")));
                }
            };
            if order.status != OrderStatus::Paid {
                let mut failed = order;
                failed.status = OrderStatus::Failed;
                let json = serde_json::to_vec(&failed)?;
                table.insert(order_id, json.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    // =========================================================================
    // Purchase Sessions
    // =========================================================================

    /// Persist a new purchase session.
    pub fn create_purchase_session(&self, session: &PurchaseSession) -> StoreResult<()> {
        let json = serde_json::to_vec(session)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(PURCHASE_SESSIONS)?;
            table.insert(session.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up a purchase session owned by the given user.
    pub fn get_purchase_session_owned(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> StoreResult<Option<PurchaseSession>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PURCHASE_SESSIONS)?;
        match table.get(session_id)? {
            Some(value) => {
                let session: PurchaseSession = serde_json::from_slice(value.value())?;
                Ok((session.user_id == user_id).then_some(session))
            }
            None => Ok(None),
        }
    }

    /// Transition a purchase session to RETURNED.
    pub fn mark_purchase_returned(&self, session_id: &str, user_id: &str) -> StoreResult<bool> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(PURCHASE_SESSIONS)?;
            let existing = match table.get(session_id)? {
                Some(value) => Some(serde_json::from_slice::<PurchaseSession>(value.value())?),
                None => None,
            };
            match existing {
                Some(mut session) if session.user_id == user_id => {
                    session.status = PurchaseSessionStatus::Returned;
                    let json = serde_json::to_vec(&session)?;
                    table.insert(session_id, json.as_slice())?;
                    true
                }
                _ => false,
            }
        };
        write_txn.commit()?;
        Ok(updated)
    }

    // =========================================================================
    // Personal Info
    // =========================================================================

    /// Insert or overwrite the user's personal-info record.
    ///
    /// A re-submission replaces ciphertext and hash and resets status to
    /// PENDING, discarding any prior MINTED marker.
    pub fn upsert_personal_info(&self, record: &PersonalInfo) -> StoreResult<()> {
        let json = serde_json::to_vec(record)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(PERSONAL_INFO)?;
            table.insert(record.user_id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up the user's personal-info record.
    pub fn get_personal_info(&self, user_id: &str) -> StoreResult<Option<PersonalInfo>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PERSONAL_INFO)?;
        match table.get(user_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Conditionally mark the record MINTED.
    ///
    /// The update applies only if the stored content hash still equals
    /// `data_hash`; a mint that confirmed after a newer submission landed is
    /// stale and returns `false` without touching the record.
    pub fn mark_personal_info_minted(
        &self,
        user_id: &str,
        data_hash: &str,
        mint_tx_hash: &str,
    ) -> StoreResult<bool> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(PERSONAL_INFO)?;
            let existing = match table.get(user_id)? {
                Some(value) => Some(serde_json::from_slice::<PersonalInfo>(value.value())?),
                None => None,
            };
            match existing {
                Some(mut record) if record.data_hash == data_hash => {
                    record.status = PersonalInfoStatus::Minted;
                    record.mint_tx_hash = Some(mint_tx_hash.to_string());
                    let json = serde_json::to_vec(&record)?;
                    table.insert(user_id, json.as_slice())?;
                    true
                }
                _ => false,
            }
        };
        write_txn.commit()?;
        Ok(updated)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Vendor;
    use std::sync::Arc;

    fn temp_db() -> (ShopDatabase, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = ShopDatabase::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    fn sample_nonce(user_id: &str, value: &str, ttl_secs: i64) -> AuthNonce {
        AuthNonce {
            nonce: value.to_string(),
            user_id: user_id.to_string(),
            expires_at: Utc::now() + chrono::Duration::seconds(ttl_secs),
            used_at: None,
            created_at: Utc::now(),
        }
    }

    fn sample_order(id: &str, user_id: &str) -> Order {
        Order {
            id: id.to_string(),
            user_id: user_id.to_string(),
            vendor: Vendor::Ali,
            product_url: "https://example.com/p/1".into(),
            amount: "1000000".into(),
            token_address: "0x5425890298aed601595a70ab815c96711a31bc65".into(),
            receiver: "0x2222222222222222222222222222222222222222".into(),
            payment_tx: None,
            status: OrderStatus::PendingPayment,
            created_at: Utc::now(),
            paid_at: None,
        }
    }

    #[test]
    fn upsert_user_is_lazy_and_case_insensitive() {
        let (db, _dir) = temp_db();

        let first = db.upsert_user("0xAbCd1234567890aBcDeF1234567890AbCdEf1234").unwrap();
        assert_eq!(first.address, "0xabcd1234567890abcdef1234567890abcdef1234");

        let second = db.upsert_user("0xABCD1234567890ABCDEF1234567890ABCDEF1234").unwrap();
        assert_eq!(second.id, first.id, "same address must map to same user");

        let found = db
            .get_user_by_address("0xabcd1234567890abcdef1234567890abcdef1234")
            .unwrap()
            .unwrap();
        assert_eq!(found.id, first.id);
    }

    #[test]
    fn nonce_consumed_exactly_once() {
        let (db, _dir) = temp_db();
        let nonce = sample_nonce("user-1", "aabbccdd", 600);
        db.insert_nonce(&nonce).unwrap();

        assert!(db.consume_nonce("user-1", "aabbccdd").unwrap());
        assert!(!db.consume_nonce("user-1", "aabbccdd").unwrap());
    }

    #[test]
    fn expired_nonce_is_rejected() {
        let (db, _dir) = temp_db();
        let nonce = sample_nonce("user-1", "expired", -1);
        db.insert_nonce(&nonce).unwrap();

        assert!(!db.consume_nonce("user-1", "expired").unwrap());
    }

    #[test]
    fn nonce_is_scoped_to_user() {
        let (db, _dir) = temp_db();
        db.insert_nonce(&sample_nonce("user-1", "shared", 600)).unwrap();

        assert!(!db.consume_nonce("user-2", "shared").unwrap());
        assert!(db.consume_nonce("user-1", "shared").unwrap());
    }

    #[test]
    fn concurrent_nonce_consumption_has_one_winner() {
        let (db, _dir) = temp_db();
        let db = Arc::new(db);
        db.insert_nonce(&sample_nonce("user-1", "raced", 600)).unwrap();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let db = Arc::clone(&db);
            handles.push(std::thread::spawn(move || {
                db.consume_nonce("user-1", "raced").unwrap()
            }));
        }

        let wins: usize = handles
            .into_iter()
            .map(|h| usize::from(h.join().unwrap()))
            .sum();
        assert_eq!(wins, 1, "exactly one concurrent consumer may win");
    }

    #[test]
    fn session_revocation_is_sticky() {
        let (db, _dir) = temp_db();
        let session = db.create_session("user-1").unwrap();

        let loaded = db.get_session(&session.id).unwrap().unwrap();
        assert!(loaded.revoked_at.is_none());

        db.revoke_session(&session.id).unwrap();
        let revoked = db.get_session(&session.id).unwrap().unwrap();
        let first_revocation = revoked.revoked_at.unwrap();

        // Second revoke keeps the original timestamp
        db.revoke_session(&session.id).unwrap();
        let again = db.get_session(&session.id).unwrap().unwrap();
        assert_eq!(again.revoked_at.unwrap(), first_revocation);
    }

    #[test]
    fn revoke_missing_session_errors() {
        let (db, _dir) = temp_db();
        assert!(matches!(
            db.revoke_session("missing"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn settle_payment_transitions_to_paid() {
        let (db, _dir) = temp_db();
        db.create_order(&sample_order("o-1", "user-1")).unwrap();

        let outcome = db.settle_payment("o-1", "0xAAAA", Utc::now()).unwrap();
        let SettleOutcome::Paid(order) = outcome else {
            panic!("expected Paid outcome");
        };
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.payment_tx.as_deref(), Some("0xaaaa"));
        assert!(order.paid_at.is_some());

        assert_eq!(
            db.payment_tx_claimed_by("0xaaaa").unwrap(),
            Some("o-1".to_string())
        );
    }

    #[test]
    fn same_tx_hash_cannot_settle_two_orders() {
        let (db, _dir) = temp_db();
        db.create_order(&sample_order("o-1", "user-1")).unwrap();
        db.create_order(&sample_order("o-2", "user-2")).unwrap();

        let first = db.settle_payment("o-1", "0xDEAD", Utc::now()).unwrap();
        assert!(matches!(first, SettleOutcome::Paid(_)));

        let second = db.settle_payment("o-2", "0xdead", Utc::now()).unwrap();
        assert_eq!(second, SettleOutcome::TxAlreadyUsed);
    }

    #[test]
    fn settling_paid_order_is_idempotent() {
        let (db, _dir) = temp_db();
        db.create_order(&sample_order("o-1", "user-1")).unwrap();

        db.settle_payment("o-1", "0x01", Utc::now()).unwrap();
        let again = db.settle_payment("o-1", "0x02", Utc::now()).unwrap();

        let SettleOutcome::AlreadyPaid(order) = again else {
            panic!("expected AlreadyPaid");
        };
        // Original hash retained; the second hash claimed nothing
        assert_eq!(order.payment_tx.as_deref(), Some("0x01"));
        assert!(db.payment_tx_claimed_by("0x02").unwrap().is_none());
    }

    #[test]
    fn mark_failed_never_clobbers_paid() {
        let (db, _dir) = temp_db();
        db.create_order(&sample_order("o-1", "user-1")).unwrap();

        db.settle_payment("o-1", "0x01", Utc::now()).unwrap();
        db.mark_order_failed("o-1").unwrap();

        let order = db.get_order_owned("o-1", "user-1").unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
    }

    #[test]
    fn failed_order_can_be_settled_with_new_hash() {
        let (db, _dir) = temp_db();
        db.create_order(&sample_order("o-1", "user-1")).unwrap();

        db.mark_order_failed("o-1").unwrap();
        let order = db.get_order_owned("o-1", "user-1").unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Failed);

        let retry = db.settle_payment("o-1", "0x03", Utc::now()).unwrap();
        assert!(matches!(retry, SettleOutcome::Paid(_)));
    }

    #[test]
    fn list_orders_newest_first_per_user() {
        let (db, _dir) = temp_db();
        for i in 0..3 {
            let mut order = sample_order(&format!("o-{i}"), "user-1");
            order.created_at = Utc::now() - chrono::Duration::seconds(10 - i);
            db.create_order(&order).unwrap();
        }
        db.create_order(&sample_order("other", "user-2")).unwrap();

        let orders = db.list_orders_for_user("user-1").unwrap();
        assert_eq!(orders.len(), 3);
        assert_eq!(orders[0].id, "o-2", "newest order first");
    }

    #[test]
    fn order_ownership_is_enforced() {
        let (db, _dir) = temp_db();
        db.create_order(&sample_order("o-1", "user-1")).unwrap();

        assert!(db.get_order_owned("o-1", "user-1").unwrap().is_some());
        assert!(db.get_order_owned("o-1", "user-2").unwrap().is_none());
    }

    #[test]
    fn purchase_session_return_flow() {
        let (db, _dir) = temp_db();
        let session = PurchaseSession {
            id: "ps-1".into(),
            user_id: "user-1".into(),
            vendor: Vendor::Ali,
            product_url: "https://example.com/p/2".into(),
            status: PurchaseSessionStatus::Created,
            created_at: Utc::now(),
        };
        db.create_purchase_session(&session).unwrap();

        // Wrong owner cannot transition it
        assert!(!db.mark_purchase_returned("ps-1", "user-2").unwrap());

        assert!(db.mark_purchase_returned("ps-1", "user-1").unwrap());
        let loaded = db.get_purchase_session_owned("ps-1", "user-1").unwrap().unwrap();
        assert_eq!(loaded.status, PurchaseSessionStatus::Returned);
    }

    #[test]
    fn personal_info_upsert_resets_status() {
        let (db, _dir) = temp_db();
        let record = PersonalInfo {
            user_id: "user-1".into(),
            encrypted_json: "blob-1".into(),
            data_hash: "0x01".into(),
            status: PersonalInfoStatus::Pending,
            mint_tx_hash: None,
            updated_at: Utc::now(),
        };
        db.upsert_personal_info(&record).unwrap();
        assert!(db.mark_personal_info_minted("user-1", "0x01", "0xtx1").unwrap());

        // Re-submission overwrites and goes back to PENDING
        let mut replacement = record.clone();
        replacement.encrypted_json = "blob-2".into();
        replacement.data_hash = "0x02".into();
        db.upsert_personal_info(&replacement).unwrap();

        let loaded = db.get_personal_info("user-1").unwrap().unwrap();
        assert_eq!(loaded.status, PersonalInfoStatus::Pending);
        assert_eq!(loaded.data_hash, "0x02");
        assert!(loaded.mint_tx_hash.is_none());
    }

    #[test]
    fn stale_mint_does_not_overwrite_newer_record() {
        let (db, _dir) = temp_db();
        let record = PersonalInfo {
            user_id: "user-1".into(),
            encrypted_json: "blob-2".into(),
            data_hash: "0x02".into(),
            status: PersonalInfoStatus::Pending,
            mint_tx_hash: None,
            updated_at: Utc::now(),
        };
        db.upsert_personal_info(&record).unwrap();

        // Mint of the superseded hash 0x01 confirms late
        assert!(!db.mark_personal_info_minted("user-1", "0x01", "0xtx-old").unwrap());

        let loaded = db.get_personal_info("user-1").unwrap().unwrap();
        assert_eq!(loaded.status, PersonalInfoStatus::Pending);
    }
}
