//! redb-based storage layer for orders
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `OrderSnapshot` (JSON) | Current order state |
//! | `user_orders` | `user_id` | `order_id` (multimap) | Per-user order index |
//! | `order_numbers` | `order_number` | `order_id` | Uniqueness of order numbers |
//! | `daily_sequence` | `YYYYMMDD` | `u64` | Next order sequence for the day |
//! | `carts` | `user_id` | `Cart` (JSON) | Customer carts |
//!
//! # Consistency
//!
//! redb allows one write transaction at a time. Every ledger mutation loads
//! the order, checks its revision and writes it back inside a single write
//! transaction, so concurrent edits are serialized and stale revisions are
//! detected instead of silently overwritten. Order-number assignment reads
//! and bumps the day's counter inside the same transaction that inserts the
//! order.

use redb::{
    Database, MultimapTableDefinition, ReadableDatabase, ReadableMultimapTable, ReadableTable,
    TableDefinition, WriteTransaction,
};
use shared::models::Cart;
use shared::order::OrderSnapshot;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Orders: key = order_id, value = JSON-serialized OrderSnapshot
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Per-user index: key = user_id, values = order_ids
const USER_ORDERS_TABLE: MultimapTableDefinition<&str, &str> =
    MultimapTableDefinition::new("user_orders");

/// Order number index: key = order_number, value = order_id
const ORDER_NUMBERS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("order_numbers");

/// Daily sequence: key = date (YYYYMMDD, business timezone), value = next sequence
const DAILY_SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("daily_sequence");

/// Carts: key = user_id, value = JSON-serialized Cart
const CARTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("carts");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Order number already assigned: {0}")]
    DuplicateOrderNumber(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Order storage backed by redb
#[derive(Clone)]
pub struct OrderStorage {
    db: Arc<Database>,
}

impl OrderStorage {
    /// Open or create the database at the given path
    ///
    /// Commits are durable as soon as `commit()` returns (redb's default
    /// `Durability::Immediate`).
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init_tables(&db)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init_tables(&db)?;
        Ok(Self { db: Arc::new(db) })
    }

    fn init_tables(db: &Database) -> StorageResult<()> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_multimap_table(USER_ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDER_NUMBERS_TABLE)?;
            let _ = write_txn.open_table(DAILY_SEQUENCE_TABLE)?;
            let _ = write_txn.open_table(CARTS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Daily Sequence (for order number) ==========

    /// Read-and-increment the sequence for `date_key` (within transaction)
    ///
    /// Returns the value BEFORE incrementing, so the first order of a day
    /// gets 0.
    pub fn next_daily_sequence(&self, txn: &WriteTransaction, date_key: &str) -> StorageResult<u64> {
        let mut table = txn.open_table(DAILY_SEQUENCE_TABLE)?;
        let current = table.get(date_key)?.map(|g| g.value()).unwrap_or(0);
        table.insert(date_key, current + 1)?;
        Ok(current)
    }

    /// Next sequence that would be handed out for `date_key` (read-only)
    pub fn peek_daily_sequence(&self, date_key: &str) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DAILY_SEQUENCE_TABLE)?;
        Ok(table.get(date_key)?.map(|g| g.value()).unwrap_or(0))
    }

    // ========== Order Operations ==========

    /// Insert a brand-new order with its indices (within transaction)
    ///
    /// Fails if the order number is already taken.
    pub fn insert_order(&self, txn: &WriteTransaction, snapshot: &OrderSnapshot) -> StorageResult<()> {
        {
            let mut numbers = txn.open_table(ORDER_NUMBERS_TABLE)?;
            if numbers.get(snapshot.order_number.as_str())?.is_some() {
                return Err(StorageError::DuplicateOrderNumber(snapshot.order_number.clone()));
            }
            numbers.insert(snapshot.order_number.as_str(), snapshot.order_id.as_str())?;
        }
        {
            let mut by_user = txn.open_multimap_table(USER_ORDERS_TABLE)?;
            by_user.insert(snapshot.user_id.as_str(), snapshot.order_id.as_str())?;
        }
        self.store_order(txn, snapshot)
    }

    /// Store an order snapshot (within transaction)
    pub fn store_order(&self, txn: &WriteTransaction, snapshot: &OrderSnapshot) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(snapshot)?;
        table.insert(snapshot.order_id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get an order by ID
    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<OrderSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get an order by ID (within transaction)
    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<OrderSnapshot>> {
        let table = txn.open_table(ORDERS_TABLE)?;

        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Resolve an order number to its order ID
    pub fn find_order_id_by_number(&self, order_number: &str) -> StorageResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDER_NUMBERS_TABLE)?;
        Ok(table.get(order_number)?.map(|g| g.value().to_string()))
    }

    /// All orders, newest first
    pub fn list_orders(&self) -> StorageResult<Vec<OrderSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let snapshot: OrderSnapshot = serde_json::from_slice(value.value())?;
            orders.push(snapshot);
        }
        sort_newest_first(&mut orders);
        Ok(orders)
    }

    /// Orders of one user, newest first
    pub fn list_user_orders(&self, user_id: &str) -> StorageResult<Vec<OrderSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_multimap_table(USER_ORDERS_TABLE)?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders: Vec<OrderSnapshot> = Vec::new();
        for entry in index.get(user_id)? {
            let order_id = entry?;
            match table.get(order_id.value())? {
                Some(value) => orders.push(serde_json::from_slice(value.value())?),
                None => {
                    tracing::warn!(user_id, order_id = order_id.value(), "Dangling user order index entry");
                }
            }
        }
        sort_newest_first(&mut orders);
        Ok(orders)
    }

    // ========== Cart Operations ==========

    /// Get a user's cart (empty if none stored)
    pub fn get_cart(&self, user_id: &str) -> StorageResult<Cart> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CARTS_TABLE)?;

        match table.get(user_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Ok(Cart::default()),
        }
    }

    /// Replace a user's cart
    pub fn save_cart(&self, user_id: &str, cart: &Cart) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(CARTS_TABLE)?;
            let value = serde_json::to_vec(cart)?;
            table.insert(user_id, value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Empty a user's cart (within transaction)
    pub fn clear_cart_txn(&self, txn: &WriteTransaction, user_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(CARTS_TABLE)?;
        table.remove(user_id)?;
        Ok(())
    }
}

fn sort_newest_first(orders: &mut [OrderSnapshot]) {
    orders.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.order_number.cmp(&a.order_number))
    });
}
