//! Table Occupancy Coordinator
//!
//! Sole writer of `DiningTable::status` and owner of the table → active
//! order index. State machine:
//!
//! ```text
//! available ──occupy──▶ occupied ──release──▶ available | cleaning
//!     │  ▲                  ▲                                │
//!  reserve│ cancel          │ check-in          finish_cleaning
//!     ▼  │                  │                                ▼
//!   reserved ───────────────┘                            available
//! ```
//!
//! The `*_in` methods run inside a caller's write transaction so the order
//! manager can pair them with its own writes atomically.

use crate::db::{
    DINING_TABLES, FloorStore, ORDERS, TABLE_ACTIVE_ORDER, TABLE_NUMBERS, TxRead, TxWrite,
};
use redb::WriteTransaction;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    DEFAULT_TABLE_CAPACITY, DiningTable, DiningTableCreate, Order, ReleasePolicy, TableStatus,
};
use shared::util::snowflake_id;

#[derive(Clone)]
pub struct TableCoordinator {
    store: FloorStore,
    policy: ReleasePolicy,
}

impl TableCoordinator {
    pub fn new(store: FloorStore, policy: ReleasePolicy) -> Self {
        Self { store, policy }
    }

    pub fn release_policy(&self) -> ReleasePolicy {
        self.policy
    }

    // ========== Transaction-level operations ==========

    /// Load a table inside a write transaction
    pub fn table_in(&self, txn: &WriteTransaction, table_id: i64) -> AppResult<DiningTable> {
        txn.record(DINING_TABLES, table_id)?
            .ok_or_else(|| AppError::for_id(ErrorCode::TableNotFound, table_id))
    }

    fn set_status(
        &self,
        txn: &WriteTransaction,
        mut table: DiningTable,
        status: TableStatus,
    ) -> AppResult<DiningTable> {
        tracing::debug!(
            table_id = table.id,
            from = %table.status,
            to = %status,
            "Table status change"
        );
        table.status = status;
        txn.put(DINING_TABLES, table.id, &table)?;
        Ok(table)
    }

    /// Link `order_id` to the table and mark it occupied
    ///
    /// The table must be `available`, or `reserved` when `check_in` is set.
    /// Anything else is a conflict and nothing is written.
    pub fn occupy_in(
        &self,
        txn: &WriteTransaction,
        table_id: i64,
        order_id: i64,
        check_in: bool,
    ) -> AppResult<DiningTable> {
        let table = self.table_in(txn, table_id)?;

        if let Some(active) = txn.link(TABLE_ACTIVE_ORDER, table_id)? {
            return Err(AppError::new(ErrorCode::TableOccupied)
                .with_detail("table_id", table_id)
                .with_detail("active_order_id", active));
        }

        let accepted = match table.status {
            TableStatus::Available => !check_in,
            TableStatus::Reserved => check_in,
            TableStatus::Occupied | TableStatus::Cleaning => false,
        };
        if !accepted {
            let code = if table.status == TableStatus::Occupied {
                ErrorCode::TableOccupied
            } else {
                ErrorCode::TableNotAvailable
            };
            return Err(AppError::with_message(
                code,
                format!("Table {} is {}", table.table_number, table.status),
            )
            .with_detail("table_id", table_id)
            .with_detail("status", table.status.as_str()));
        }

        txn.set_link(TABLE_ACTIVE_ORDER, table_id, order_id)?;
        self.set_status(txn, table, TableStatus::Occupied)
    }

    /// Clear the active-order link and move the table per release policy
    ///
    /// Returns the updated table and the order id that was linked.
    pub fn release_in(
        &self,
        txn: &WriteTransaction,
        table_id: i64,
    ) -> AppResult<(DiningTable, i64)> {
        let table = self.table_in(txn, table_id)?;
        let order_id = txn.clear_link(TABLE_ACTIVE_ORDER, table_id)?.ok_or_else(|| {
            AppError::new(ErrorCode::TableAlreadyEmpty).with_detail("table_id", table_id)
        })?;
        let table = self.set_status(txn, table, self.policy.target_status())?;
        Ok((table, order_id))
    }

    fn transition(
        &self,
        table_id: i64,
        from: TableStatus,
        to: TableStatus,
    ) -> AppResult<DiningTable> {
        self.store.write(|txn| {
            let table = self.table_in(txn, table_id)?;
            if table.status != from {
                return Err(AppError::with_message(
                    ErrorCode::TableInvalidTransition,
                    format!("Cannot move table from {} to {}", table.status, to),
                )
                .with_detail("table_id", table_id)
                .with_detail("status", table.status.as_str()));
            }
            self.set_status(txn, table, to)
        })
    }

    // ========== Status operations ==========

    /// `cleaning → available`
    pub fn finish_cleaning(&self, table_id: i64) -> AppResult<DiningTable> {
        self.transition(table_id, TableStatus::Cleaning, TableStatus::Available)
    }

    /// `available → reserved`
    pub fn reserve(&self, table_id: i64) -> AppResult<DiningTable> {
        self.transition(table_id, TableStatus::Available, TableStatus::Reserved)
    }

    /// `reserved → available`
    pub fn cancel_reservation(&self, table_id: i64) -> AppResult<DiningTable> {
        self.transition(table_id, TableStatus::Reserved, TableStatus::Available)
    }

    // ========== Table records ==========

    pub fn create_table(&self, payload: DiningTableCreate) -> AppResult<DiningTable> {
        let capacity = payload.capacity.unwrap_or(DEFAULT_TABLE_CAPACITY);
        if capacity == 0 {
            return Err(AppError::validation("Table capacity must be positive")
                .with_detail("field", "capacity"));
        }
        if payload.table_number == Some(0) {
            return Err(AppError::validation("Table number must be positive")
                .with_detail("field", "table_number"));
        }

        let table = self.store.write(|txn| {
            let taken = txn.links(TABLE_NUMBERS)?;
            let number = match payload.table_number {
                Some(n) => n,
                None => next_free_number(taken.iter().map(|(n, _)| *n)),
            };
            if txn.link(TABLE_NUMBERS, i64::from(number))?.is_some() {
                return Err(AppError::with_message(
                    ErrorCode::TableNumberExists,
                    format!("Table number {} already exists", number),
                )
                .with_detail("table_number", number));
            }

            let table = DiningTable {
                id: snowflake_id(),
                table_number: number,
                capacity,
                status: TableStatus::Available,
            };
            txn.put(DINING_TABLES, table.id, &table)?;
            txn.set_link(TABLE_NUMBERS, i64::from(number), table.id)?;
            Ok(table)
        })?;

        tracing::info!(
            table_id = table.id,
            table_number = table.table_number,
            capacity = table.capacity,
            "Table created"
        );
        Ok(table)
    }

    pub fn update_capacity(&self, table_id: i64, capacity: u32) -> AppResult<DiningTable> {
        if capacity == 0 {
            return Err(AppError::validation("Table capacity must be positive")
                .with_detail("field", "capacity"));
        }
        self.store.write(|txn| {
            let mut table = self.table_in(txn, table_id)?;
            table.capacity = capacity;
            txn.put(DINING_TABLES, table_id, &table)?;
            Ok(table)
        })
    }

    /// Delete a table no order has ever referenced
    pub fn delete_table(&self, table_id: i64) -> AppResult<()> {
        self.store.write(|txn| {
            let table = self.table_in(txn, table_id)?;
            let orders: Vec<Order> = txn.records(ORDERS)?;
            let referencing = orders
                .iter()
                .filter(|o| o.table_id == Some(table_id))
                .count();
            if referencing > 0 || txn.link(TABLE_ACTIVE_ORDER, table_id)?.is_some() {
                return Err(AppError::new(ErrorCode::TableHasOrders)
                    .with_detail("table_id", table_id)
                    .with_detail("orders", referencing));
            }
            txn.delete(DINING_TABLES, table_id)?;
            txn.clear_link(TABLE_NUMBERS, i64::from(table.table_number))?;
            tracing::info!(table_id, table_number = table.table_number, "Table deleted");
            Ok(())
        })
    }

    // ========== Reads ==========

    pub fn get(&self, table_id: i64) -> AppResult<DiningTable> {
        self.store.read(|txn| {
            txn.record(DINING_TABLES, table_id)?
                .ok_or_else(|| AppError::for_id(ErrorCode::TableNotFound, table_id))
        })
    }

    /// All tables ordered by number
    pub fn list(&self) -> AppResult<Vec<DiningTable>> {
        let mut tables: Vec<DiningTable> = self.store.read(|txn| Ok(txn.records(DINING_TABLES)?))?;
        tables.sort_by_key(|t| t.table_number);
        Ok(tables)
    }

    pub fn find_by_number(&self, table_number: u32) -> AppResult<DiningTable> {
        self.store.read(|txn| {
            let id = txn
                .link(TABLE_NUMBERS, i64::from(table_number))?
                .ok_or_else(|| {
                    AppError::new(ErrorCode::TableNotFound)
                        .with_detail("table_number", table_number)
                })?;
            txn.record(DINING_TABLES, id)?
                .ok_or_else(|| AppError::for_id(ErrorCode::TableNotFound, id))
        })
    }

    /// Order currently seated at the table, if any
    pub fn active_order(&self, table_id: i64) -> AppResult<Option<i64>> {
        self.store.read(|txn| {
            if txn.record::<DiningTable>(DINING_TABLES, table_id)?.is_none() {
                return Err(AppError::for_id(ErrorCode::TableNotFound, table_id));
            }
            Ok(txn.link(TABLE_ACTIVE_ORDER, table_id)?)
        })
    }
}

/// Smallest positive number not in `taken`
fn next_free_number(taken: impl Iterator<Item = i64>) -> u32 {
    let mut taken: Vec<i64> = taken.collect();
    taken.sort_unstable();
    let mut candidate: i64 = 1;
    for n in taken {
        if n == candidate {
            candidate += 1;
        } else if n > candidate {
            break;
        }
    }
    u32::try_from(candidate).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ErrorKind;

    fn coordinator(policy: ReleasePolicy) -> TableCoordinator {
        TableCoordinator::new(FloorStore::open_in_memory().unwrap(), policy)
    }

    fn table(c: &TableCoordinator, number: u32) -> DiningTable {
        c.create_table(DiningTableCreate {
            table_number: Some(number),
            capacity: None,
        })
        .unwrap()
    }

    #[test]
    fn test_next_free_number() {
        assert_eq!(next_free_number(std::iter::empty()), 1);
        assert_eq!(next_free_number([1, 2, 4].into_iter()), 3);
        assert_eq!(next_free_number([3, 2, 1].into_iter()), 4);
        assert_eq!(next_free_number([2, 3].into_iter()), 1);
    }

    #[test]
    fn test_create_defaults_and_duplicates() {
        let c = coordinator(ReleasePolicy::Available);
        let t1 = table(&c, 1);
        assert_eq!(t1.capacity, DEFAULT_TABLE_CAPACITY);
        assert_eq!(t1.status, TableStatus::Available);

        let auto = c.create_table(DiningTableCreate::default()).unwrap();
        assert_eq!(auto.table_number, 2);

        let err = c
            .create_table(DiningTableCreate {
                table_number: Some(1),
                capacity: Some(2),
            })
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TableNumberExists);
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = c
            .create_table(DiningTableCreate {
                table_number: Some(9),
                capacity: Some(0),
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_occupy_twice_conflicts_and_keeps_link() {
        let c = coordinator(ReleasePolicy::Available);
        let t = table(&c, 5);
        c.store.write(|txn| c.occupy_in(txn, t.id, 100, false)).unwrap();

        let err = c
            .store
            .write(|txn| c.occupy_in(txn, t.id, 200, false))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TableOccupied);
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(c.active_order(t.id).unwrap(), Some(100));
        assert_eq!(c.get(t.id).unwrap().status, TableStatus::Occupied);
    }

    #[test]
    fn test_release_follows_policy() {
        let c = coordinator(ReleasePolicy::Cleaning);
        let t = table(&c, 3);
        c.store.write(|txn| c.occupy_in(txn, t.id, 7, false)).unwrap();

        let (released, order_id) = c.store.write(|txn| c.release_in(txn, t.id)).unwrap();
        assert_eq!(order_id, 7);
        assert_eq!(released.status, TableStatus::Cleaning);
        assert_eq!(c.active_order(t.id).unwrap(), None);

        // cleaning tables cannot be seated
        let err = c
            .store
            .write(|txn| c.occupy_in(txn, t.id, 8, false))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TableNotAvailable);

        assert_eq!(
            c.finish_cleaning(t.id).unwrap().status,
            TableStatus::Available
        );
    }

    #[test]
    fn test_release_without_link_fails() {
        let c = coordinator(ReleasePolicy::Available);
        let t = table(&c, 2);
        let err = c.store.write(|txn| c.release_in(txn, t.id)).unwrap_err();
        assert_eq!(err.code, ErrorCode::TableAlreadyEmpty);
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert_eq!(c.get(t.id).unwrap().status, TableStatus::Available);
    }

    #[test]
    fn test_finish_cleaning_only_from_cleaning() {
        let c = coordinator(ReleasePolicy::Available);
        let t = table(&c, 4);
        let err = c.finish_cleaning(t.id).unwrap_err();
        assert_eq!(err.code, ErrorCode::TableInvalidTransition);
    }

    #[test]
    fn test_reservation_check_in() {
        let c = coordinator(ReleasePolicy::Available);
        let t = table(&c, 8);
        c.reserve(t.id).unwrap();

        // walk-in seating refuses a reserved table
        let err = c
            .store
            .write(|txn| c.occupy_in(txn, t.id, 1, false))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TableNotAvailable);

        let seated = c.store.write(|txn| c.occupy_in(txn, t.id, 1, true)).unwrap();
        assert_eq!(seated.status, TableStatus::Occupied);
    }

    #[test]
    fn test_cancel_reservation() {
        let c = coordinator(ReleasePolicy::Available);
        let t = table(&c, 9);
        c.reserve(t.id).unwrap();
        assert_eq!(
            c.cancel_reservation(t.id).unwrap().status,
            TableStatus::Available
        );
        assert!(c.cancel_reservation(t.id).is_err());
    }

    #[test]
    fn test_delete_and_renumber() {
        let c = coordinator(ReleasePolicy::Available);
        let t = table(&c, 1);
        c.delete_table(t.id).unwrap();
        assert_eq!(c.get(t.id).unwrap_err().code, ErrorCode::TableNotFound);
        // number is free again
        table(&c, 1);
    }

    #[test]
    fn test_delete_occupied_table_conflicts() {
        let c = coordinator(ReleasePolicy::Available);
        let t = table(&c, 1);
        c.store.write(|txn| c.occupy_in(txn, t.id, 55, false)).unwrap();
        let err = c.delete_table(t.id).unwrap_err();
        assert_eq!(err.code, ErrorCode::TableHasOrders);
    }

    #[test]
    fn test_list_sorted_and_find_by_number() {
        let c = coordinator(ReleasePolicy::Available);
        table(&c, 10);
        table(&c, 2);
        let numbers: Vec<u32> = c.list().unwrap().iter().map(|t| t.table_number).collect();
        assert_eq!(numbers, vec![2, 10]);
        assert_eq!(c.find_by_number(10).unwrap().table_number, 10);
        assert!(c.find_by_number(3).is_err());
    }
}
