//! redb-backed store for the floor core
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `dining_tables` | `table_id` | `DiningTable` | Table records |
//! | `table_numbers` | `table_number` | `table_id` | Unique number index |
//! | `table_active_order` | `table_id` | `order_id` | Occupancy link, owned by the coordinator |
//! | `orders` | `order_id` | `Order` | Orders with embedded lines |
//! | `active_orders` | `order_id` | `()` | Non-terminal order index |
//! | `menu_items` | `menu_item_id` | `MenuItem` | Catalog |
//! | `recipes` | `menu_item_id` | `Recipe` | Stock consumed per menu item |
//! | `stock_items` | `stock_item_id` | `StockItem` | Stock ledger |
//! | `profiles` | `profile_id` | `UserProfile` | Staff directory |
//! | `notifications` | `notification_id` | `Notification` | Derived alerts |
//! | `alert_keys` | condition key | `notification_id` | Open alert conditions |
//! | `settings` | name | JSON | Notification settings, store id |
//! | `sequence_counter` | name | `u64` | Order number counter |
//!
//! Values are JSON (serde_json). Every multi-entity mutation runs inside one
//! write transaction via [`FloorStore::write`]; returning an error from the
//! closure aborts everything the closure wrote.

use redb::{
    Database, ReadTransaction, ReadableDatabase, ReadableTable, TableDefinition,
    WriteTransaction,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::error::{AppError, AppResult, ErrorCode};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// id → JSON record
pub type RecordTable = TableDefinition<'static, i64, &'static [u8]>;
/// id → id
pub type LinkTable = TableDefinition<'static, i64, i64>;

pub const DINING_TABLES: RecordTable = TableDefinition::new("dining_tables");
pub const TABLE_NUMBERS: LinkTable = TableDefinition::new("table_numbers");
pub const TABLE_ACTIVE_ORDER: LinkTable = TableDefinition::new("table_active_order");
pub const ORDERS: RecordTable = TableDefinition::new("orders");
pub const ACTIVE_ORDERS: TableDefinition<i64, ()> = TableDefinition::new("active_orders");
pub const MENU_ITEMS: RecordTable = TableDefinition::new("menu_items");
pub const RECIPES: RecordTable = TableDefinition::new("recipes");
pub const STOCK_ITEMS: RecordTable = TableDefinition::new("stock_items");
pub const PROFILES: RecordTable = TableDefinition::new("profiles");
pub const NOTIFICATIONS: RecordTable = TableDefinition::new("notifications");
pub const ALERT_KEYS: TableDefinition<&str, i64> = TableDefinition::new("alert_keys");
pub const SETTINGS: TableDefinition<&str, &[u8]> = TableDefinition::new("settings");
pub const SEQUENCE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

const STORE_ID_KEY: &str = "store_id";

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
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Map a storage failure to an error code
fn classify_storage_error(e: &StorageError) -> ErrorCode {
    if let StorageError::Serialization(_) = e {
        return ErrorCode::DatabaseError;
    }

    // redb errors are classified by message
    let err_str = e.to_string().to_lowercase();

    if err_str.contains("no space") || err_str.contains("disk full") || err_str.contains("enospc")
    {
        return ErrorCode::StorageFull;
    }

    if err_str.contains("out of memory") || err_str.contains("cannot allocate") {
        return ErrorCode::OutOfMemory;
    }

    if err_str.contains("corrupt") || err_str.contains("invalid database") {
        return ErrorCode::StorageCorrupted;
    }

    // Database/Transaction/Table/Storage/Commit errors default to busy
    ErrorCode::SystemBusy
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        let code = classify_storage_error(&e);
        tracing::error!(error = %e, error_code = %code, "Storage error occurred");
        AppError::with_message(code, e.to_string())
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StorageResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

fn load<T: DeserializeOwned>(
    table: &impl ReadableTable<i64, &'static [u8]>,
    id: i64,
) -> StorageResult<Option<T>> {
    match table.get(id)? {
        Some(value) => Ok(Some(decode(value.value())?)),
        None => Ok(None),
    }
}

fn load_all<T: DeserializeOwned>(
    table: &impl ReadableTable<i64, &'static [u8]>,
) -> StorageResult<Vec<T>> {
    let mut records = Vec::new();
    for entry in table.iter()? {
        let (_key, value) = entry?;
        records.push(decode(value.value())?);
    }
    Ok(records)
}

fn load_links(table: &impl ReadableTable<i64, i64>) -> StorageResult<Vec<(i64, i64)>> {
    let mut links = Vec::new();
    for entry in table.iter()? {
        let (key, value) = entry?;
        links.push((key.value(), value.value()));
    }
    Ok(links)
}

/// Reads shared by read and write transactions
///
/// Each call opens the table, reads, and drops it, so calls compose inside a
/// write transaction without tripping redb's one-open-handle-per-table rule.
pub trait TxRead {
    fn record<T: DeserializeOwned>(&self, def: RecordTable, id: i64) -> StorageResult<Option<T>>;
    fn records<T: DeserializeOwned>(&self, def: RecordTable) -> StorageResult<Vec<T>>;
    fn link(&self, def: LinkTable, key: i64) -> StorageResult<Option<i64>>;
    fn links(&self, def: LinkTable) -> StorageResult<Vec<(i64, i64)>>;
    fn active_order_ids(&self) -> StorageResult<Vec<i64>>;
    fn setting<T: DeserializeOwned>(&self, name: &str) -> StorageResult<Option<T>>;
    /// Open alert condition keys with their notification ids
    fn alert_keys(&self) -> StorageResult<Vec<(String, i64)>>;
}

macro_rules! impl_tx_read {
    ($txn:ty) => {
        impl TxRead for $txn {
            fn record<T: DeserializeOwned>(
                &self,
                def: RecordTable,
                id: i64,
            ) -> StorageResult<Option<T>> {
                load(&self.open_table(def)?, id)
            }

            fn records<T: DeserializeOwned>(&self, def: RecordTable) -> StorageResult<Vec<T>> {
                load_all(&self.open_table(def)?)
            }

            fn link(&self, def: LinkTable, key: i64) -> StorageResult<Option<i64>> {
                let table = self.open_table(def)?;
                let value = table.get(key)?.map(|guard| guard.value());
                Ok(value)
            }

            fn links(&self, def: LinkTable) -> StorageResult<Vec<(i64, i64)>> {
                load_links(&self.open_table(def)?)
            }

            fn active_order_ids(&self) -> StorageResult<Vec<i64>> {
                let table = self.open_table(ACTIVE_ORDERS)?;
                let mut ids = Vec::new();
                for entry in table.iter()? {
                    let (key, _) = entry?;
                    ids.push(key.value());
                }
                Ok(ids)
            }

            fn setting<T: DeserializeOwned>(&self, name: &str) -> StorageResult<Option<T>> {
                let table = self.open_table(SETTINGS)?;
                let value = match table.get(name)? {
                    Some(guard) => Some(decode(guard.value())?),
                    None => None,
                };
                Ok(value)
            }

            fn alert_keys(&self) -> StorageResult<Vec<(String, i64)>> {
                let table = self.open_table(ALERT_KEYS)?;
                let mut keys = Vec::new();
                for entry in table.iter()? {
                    let (key, value) = entry?;
                    keys.push((key.value().to_string(), value.value()));
                }
                Ok(keys)
            }
        }
    };
}

impl_tx_read!(ReadTransaction);
impl_tx_read!(WriteTransaction);

/// Writes, only available inside a write transaction
pub trait TxWrite {
    fn put<T: Serialize>(&self, def: RecordTable, id: i64, record: &T) -> StorageResult<()>;
    fn delete(&self, def: RecordTable, id: i64) -> StorageResult<bool>;
    fn set_link(&self, def: LinkTable, key: i64, value: i64) -> StorageResult<Option<i64>>;
    fn clear_link(&self, def: LinkTable, key: i64) -> StorageResult<Option<i64>>;
    fn mark_order_active(&self, order_id: i64, active: bool) -> StorageResult<()>;
    fn put_setting<T: Serialize>(&self, name: &str, value: &T) -> StorageResult<()>;
    fn set_alert_key(&self, key: &str, notification_id: i64) -> StorageResult<()>;
    fn clear_alert_key(&self, key: &str) -> StorageResult<Option<i64>>;
    /// Increment a named counter and return the new value
    fn bump_counter(&self, name: &str) -> StorageResult<u64>;
}

impl TxWrite for WriteTransaction {
    fn put<T: Serialize>(&self, def: RecordTable, id: i64, record: &T) -> StorageResult<()> {
        let bytes = serde_json::to_vec(record)?;
        let mut table = self.open_table(def)?;
        table.insert(id, bytes.as_slice())?;
        Ok(())
    }

    fn delete(&self, def: RecordTable, id: i64) -> StorageResult<bool> {
        let mut table = self.open_table(def)?;
        let existed = table.remove(id)?.is_some();
        Ok(existed)
    }

    fn set_link(&self, def: LinkTable, key: i64, value: i64) -> StorageResult<Option<i64>> {
        let mut table = self.open_table(def)?;
        let previous = table.insert(key, value)?.map(|guard| guard.value());
        Ok(previous)
    }

    fn clear_link(&self, def: LinkTable, key: i64) -> StorageResult<Option<i64>> {
        let mut table = self.open_table(def)?;
        let previous = table.remove(key)?.map(|guard| guard.value());
        Ok(previous)
    }

    fn mark_order_active(&self, order_id: i64, active: bool) -> StorageResult<()> {
        let mut table = self.open_table(ACTIVE_ORDERS)?;
        if active {
            table.insert(order_id, ())?;
        } else {
            table.remove(order_id)?;
        }
        Ok(())
    }

    fn put_setting<T: Serialize>(&self, name: &str, value: &T) -> StorageResult<()> {
        let bytes = serde_json::to_vec(value)?;
        let mut table = self.open_table(SETTINGS)?;
        table.insert(name, bytes.as_slice())?;
        Ok(())
    }

    fn set_alert_key(&self, key: &str, notification_id: i64) -> StorageResult<()> {
        let mut table = self.open_table(ALERT_KEYS)?;
        table.insert(key, notification_id)?;
        Ok(())
    }

    fn clear_alert_key(&self, key: &str) -> StorageResult<Option<i64>> {
        let mut table = self.open_table(ALERT_KEYS)?;
        let previous = table.remove(key)?.map(|guard| guard.value());
        Ok(previous)
    }

    fn bump_counter(&self, name: &str) -> StorageResult<u64> {
        let mut table = self.open_table(SEQUENCE)?;
        let current = table.get(name)?.map(|g| g.value()).unwrap_or(0);
        let next = current + 1;
        table.insert(name, next)?;
        Ok(next)
    }
}

/// Floor store backed by redb
#[derive(Clone)]
pub struct FloorStore {
    db: Arc<Database>,
}

impl FloorStore {
    /// Open or create the database at the given path
    ///
    /// redb commits with `Durability::Immediate`: a commit is persistent as
    /// soon as `commit()` returns and the file is always consistent.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests, demos)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            // Create all tables if they don't exist
            let _ = write_txn.open_table(DINING_TABLES)?;
            let _ = write_txn.open_table(TABLE_NUMBERS)?;
            let _ = write_txn.open_table(TABLE_ACTIVE_ORDER)?;
            let _ = write_txn.open_table(ORDERS)?;
            let _ = write_txn.open_table(ACTIVE_ORDERS)?;
            let _ = write_txn.open_table(MENU_ITEMS)?;
            let _ = write_txn.open_table(RECIPES)?;
            let _ = write_txn.open_table(STOCK_ITEMS)?;
            let _ = write_txn.open_table(PROFILES)?;
            let _ = write_txn.open_table(NOTIFICATIONS)?;
            let _ = write_txn.open_table(ALERT_KEYS)?;
            let _ = write_txn.open_table(SEQUENCE)?;
            let _ = write_txn.open_table(SETTINGS)?;
        }
        if write_txn.setting::<String>(STORE_ID_KEY)?.is_none() {
            write_txn.put_setting(STORE_ID_KEY, &uuid::Uuid::new_v4().to_string())?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Identifier written when the store file was first created
    pub fn store_id(&self) -> AppResult<String> {
        self.read(|txn| {
            txn.setting::<String>(STORE_ID_KEY)?
                .ok_or_else(|| AppError::new(ErrorCode::StorageCorrupted))
        })
    }

    /// Run `f` against a consistent snapshot
    pub fn read<R>(&self, f: impl FnOnce(&ReadTransaction) -> AppResult<R>) -> AppResult<R> {
        let txn = self.db.begin_read().map_err(StorageError::from)?;
        f(&txn)
    }

    /// Run `f` in one write transaction
    ///
    /// Commits when `f` returns `Ok`; aborts, discarding every write made by
    /// `f`, when it returns `Err`.
    pub fn write<R>(&self, f: impl FnOnce(&WriteTransaction) -> AppResult<R>) -> AppResult<R> {
        let txn = self.db.begin_write().map_err(StorageError::from)?;
        match f(&txn) {
            Ok(value) => {
                txn.commit().map_err(StorageError::from)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(abort_err) = txn.abort() {
                    tracing::warn!(error = %abort_err, "Failed to abort write transaction");
                }
                Err(err)
            }
        }
    }
}
