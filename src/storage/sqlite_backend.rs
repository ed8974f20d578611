use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    str::FromStr,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::core::errors::{DebtorError, Result};
use crate::core::utils::ensure_dir;
use crate::domain::{
    CollectionPhase, CollectionStatus, Debtor, DebtorChanges, DebtorId, NewDebtor,
};

use super::{cache::ListingCache, DebtorStore};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS debtors (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    external_person_id   TEXT,
    external_person_key  TEXT UNIQUE,
    name                 TEXT NOT NULL,
    total_owed           TEXT NOT NULL,
    overdue_days         INTEGER NOT NULL DEFAULT 0,
    phone                TEXT,
    status               TEXT NOT NULL DEFAULT 'pending',
    next_collection_date TEXT,
    last_collection_date TEXT,
    payment_date         TEXT,
    collection_phase     INTEGER NOT NULL DEFAULT 1
        CHECK (collection_phase BETWEEN 1 AND 3)
);
CREATE INDEX IF NOT EXISTS idx_debtors_next_collection ON debtors (next_collection_date);
"#;

const COLUMNS: &str = "id, external_person_id, name, total_owed, overdue_days, phone, status, \
     next_collection_date, last_collection_date, payment_date, collection_phase";

/// SQLite-backed debtor store with a short-lived cache of the full listing.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
    cache: ListingCache,
}

impl SqliteStore {
    /// Opens (creating if needed) the database file and applies the schema.
    pub fn open(path: &Path, cache_ttl: Duration) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent)?;
        }
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened debtor database");
        Self::from_connection(conn, Some(path.to_path_buf()), cache_ttl)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, None, Duration::ZERO)
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>, ttl: Duration) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
            cache: ListingCache::new(ttl),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| DebtorError::Storage("database connection lock poisoned".into()))
    }

    /// Scoped transaction: commits when `work` succeeds, rolls back when it fails, and
    /// always releases the connection. The listing cache is invalidated after a commit.
    fn with_transaction<T>(
        &self,
        operation: &'static str,
        work: impl FnOnce(&Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        match work(&tx) {
            Ok(value) => {
                tx.commit().map_err(|err| {
                    warn!(operation, error = %err, "commit failed");
                    DebtorError::from(err)
                })?;
                self.cache.invalidate();
                debug!(operation, "transaction committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(operation, error = %rollback_err, "rollback failed");
                }
                debug!(operation, error = %err, "transaction rolled back");
                Err(err)
            }
        }
    }
}

impl DebtorStore for SqliteStore {
    fn create(&self, record: &NewDebtor) -> Result<DebtorId> {
        let record = record.clone().normalized();
        self.with_transaction("create", |tx| {
            if let Some(key) = record.person_key() {
                if person_key_in_use(tx, &key, None)? {
                    let external = record.external_person_id.as_deref().unwrap_or(&key);
                    return Err(DebtorError::duplicate_person(external));
                }
            }
            insert_debtor(tx, &record)
        })
    }

    fn create_many(&self, records: &[NewDebtor]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        self.with_transaction("create_many", |tx| {
            for record in records {
                insert_debtor(tx, &record.clone().normalized())?;
            }
            Ok(records.len())
        })
    }

    fn get_all(&self) -> Result<Vec<Debtor>> {
        if let Some(cached) = self.cache.get() {
            return Ok(cached.as_ref().clone());
        }
        // Filled under the connection lock; commits invalidate under the same lock.
        let conn = self.connection()?;
        let records = select_all(&conn)?;
        Ok(self.cache.put(records).as_ref().clone())
    }

    fn get_by_id(&self, id: DebtorId) -> Result<Debtor> {
        let conn = self.connection()?;
        select_debtor(&conn, id)
    }

    fn update(&self, id: DebtorId, changes: &DebtorChanges) -> Result<Debtor> {
        self.with_transaction("update", |tx| {
            let mut debtor = select_debtor(tx, id)?;
            debtor.apply_changes(changes);
            if let Some(key) = debtor.person_key() {
                if person_key_in_use(tx, &key, Some(id))? {
                    let external = debtor.external_person_id.as_deref().unwrap_or(&key);
                    return Err(DebtorError::duplicate_person(external));
                }
            }
            write_debtor(tx, &debtor)?;
            Ok(debtor)
        })
    }

    fn modify(
        &self,
        id: DebtorId,
        apply: &mut dyn FnMut(&mut Debtor) -> Result<()>,
    ) -> Result<Debtor> {
        self.with_transaction("modify", |tx| {
            let mut debtor = select_debtor(tx, id)?;
            apply(&mut debtor)?;
            write_debtor(tx, &debtor)?;
            Ok(debtor)
        })
    }

    fn delete(&self, id: DebtorId) -> Result<Debtor> {
        self.with_transaction("delete", |tx| {
            let debtor = select_debtor(tx, id)?;
            tx.execute("DELETE FROM debtors WHERE id = ?1", params![id])?;
            Ok(debtor)
        })
    }

    fn person_keys(&self) -> Result<HashSet<String>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT external_person_key FROM debtors WHERE external_person_key IS NOT NULL",
        )?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(keys)
    }
}

/// Inserts without an application-level uniqueness check; the UNIQUE constraint on the
/// normalized key is the last line and maps to `DebtorError::Duplicate`.
pub(crate) fn insert_debtor(conn: &Connection, record: &NewDebtor) -> Result<DebtorId> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO debtors (external_person_id, external_person_key, name, total_owed, \
         overdue_days, phone, status, collection_phase) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    stmt.execute(params![
        record.external_person_id,
        record.person_key(),
        record.name,
        record.total_owed.to_string(),
        record.overdue_days,
        record.phone,
        CollectionStatus::Pending.as_str(),
        CollectionPhase::FIRST.get(),
    ])
    .map_err(|err| match DebtorError::from(err) {
        DebtorError::Duplicate(_) => DebtorError::duplicate_person(
            record.external_person_id.as_deref().unwrap_or_default(),
        ),
        other => other,
    })?;
    Ok(conn.last_insert_rowid())
}

fn person_key_in_use(conn: &Connection, key: &str, exclude: Option<DebtorId>) -> Result<bool> {
    let found: Option<DebtorId> = conn
        .query_row(
            "SELECT id FROM debtors WHERE external_person_key = ?1 AND id != ?2",
            params![key, exclude.unwrap_or(-1)],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn select_debtor(conn: &Connection, id: DebtorId) -> Result<Debtor> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM debtors WHERE id = ?1"),
        params![id],
        row_to_debtor,
    )
    .optional()?
    .ok_or(DebtorError::NotFound(id))
}

fn select_all(conn: &Connection) -> Result<Vec<Debtor>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM debtors ORDER BY id"))?;
    let records = stmt
        .query_map([], row_to_debtor)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(records)
}

fn write_debtor(conn: &Connection, debtor: &Debtor) -> Result<()> {
    conn.execute(
        "UPDATE debtors SET external_person_id = ?2, external_person_key = ?3, name = ?4, \
         total_owed = ?5, overdue_days = ?6, phone = ?7, status = ?8, \
         next_collection_date = ?9, last_collection_date = ?10, payment_date = ?11, \
         collection_phase = ?12 WHERE id = ?1",
        params![
            debtor.id,
            debtor.external_person_id,
            debtor.person_key(),
            debtor.name,
            debtor.total_owed.to_string(),
            debtor.overdue_days,
            debtor.phone,
            debtor.status().as_str(),
            debtor.next_collection_date(),
            debtor.last_collection_date(),
            debtor.payment_date(),
            debtor.collection_phase().get(),
        ],
    )?;
    Ok(())
}

fn row_to_debtor(row: &Row<'_>) -> rusqlite::Result<Debtor> {
    let id: DebtorId = row.get(0)?;
    let raw_amount: String = row.get(3)?;
    let total_owed = Decimal::from_str(raw_amount.trim()).unwrap_or_else(|_| {
        warn!(debtor_id = id, value = %raw_amount, "unreadable amount, using 0");
        Decimal::ZERO
    });
    let overdue_days: i64 = row.get(4)?;
    let raw_status: String = row.get(6)?;
    let status = CollectionStatus::from_str(&raw_status).unwrap_or_else(|_| {
        warn!(debtor_id = id, value = %raw_status, "unknown status, using pending");
        CollectionStatus::Pending
    });
    let phase: i64 = row.get(10)?;
    let phase = CollectionPhase::new(phase.clamp(1, 3) as u8).unwrap_or_default();

    Ok(Debtor::from_parts(
        id,
        row.get(1)?,
        row.get(2)?,
        total_owed.max(Decimal::ZERO),
        u32::try_from(overdue_days.max(0)).unwrap_or(u32::MAX),
        row.get(5)?,
        status,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        phase,
    ))
}
