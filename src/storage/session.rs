//! Store handle and scoped sessions
//!
//! A `Session` wraps one SQLite transaction. `CatalogStore::with_session`
//! commits when the body returns `Ok` and rolls back otherwise; a panic inside
//! the body drops the transaction, which also rolls back.

use std::path::Path;
use rusqlite::{Connection, OpenFlags, Transaction};
use crate::{Error, Result};
use super::schema;

/// SQLite-backed crosstalk catalog
pub struct CatalogStore {
    conn: Connection,
}

impl CatalogStore {
    /// Open an existing store file.
    ///
    /// The file is never created implicitly and its schema is never touched:
    /// a database lacking any catalog table is refused.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("store file {} does not exist", path.display()),
            )));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let store = Self { conn };
        store.check_catalog_tables(path)?;
        store.conn.execute_batch(schema::ENABLE_FOREIGN_KEYS)?;
        tracing::info!(path = %path.display(), "opened crosstalk store");
        Ok(store)
    }

    /// Create a store file (or open it if it already exists) with the catalog schema
    pub fn create(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize()?;
        tracing::info!(path = %path.display(), "created crosstalk store");
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    /// Enable foreign keys and create missing tables
    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(schema::ENABLE_FOREIGN_KEYS)?;
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    fn check_catalog_tables(&self, path: &Path) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
        let mut missing = Vec::new();
        for table in schema::CATALOG_TABLES {
            if !stmt.exists([table])? {
                missing.push(*table);
            }
        }
        if missing.is_empty() {
            return Ok(());
        }
        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "{} is not a crosstalk store (missing tables: {})",
                path.display(),
                missing.join(", ")
            ),
        )))
    }

    /// Run `body` inside one transaction.
    ///
    /// Commits on `Ok`, rolls back on `Err`. The mutable borrow rules out
    /// nested sessions against the same store.
    pub fn with_session<T, F>(&mut self, body: F) -> Result<T>
    where
        F: FnOnce(&Session<'_>) -> Result<T>,
    {
        let session = Session { tx: self.conn.transaction()? };
        match body(&session) {
            Ok(value) => {
                session.tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                tracing::debug!(error = %err, "rolling back session");
                if let Err(rollback_err) = session.tx.rollback() {
                    tracing::warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Close the connection, surfacing any error SQLite reports on close
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, err)| Error::Store(err))
    }
}

/// Open the store at `path`, run one session and release the connection.
pub fn with_session<T, F>(path: &Path, body: F) -> Result<T>
where
    F: FnOnce(&Session<'_>) -> Result<T>,
{
    let mut store = CatalogStore::open(path)?;
    let outcome = store.with_session(body);
    match (outcome, store.close()) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(err), close) => {
            if let Err(close_err) = close {
                tracing::warn!(error = %close_err, "closing store after failed session");
            }
            Err(err)
        }
    }
}

/// Handle to one unit of work against the store
pub struct Session<'conn> {
    tx: Transaction<'conn>,
}

impl Session<'_> {
    pub(crate) fn conn(&self) -> &Connection {
        &self.tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewSegment, NewSensor};

    fn sensor(name: &str, designation: &str) -> NewSensor {
        NewSensor::new(name, designation, "ITL", 16)
    }

    #[test]
    fn test_commit_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crosstalk.db");
        drop(CatalogStore::create(&path).unwrap());

        with_session(&path, |s| s.insert_sensor(&sensor("Davis", "ITL-3800C-029"))).unwrap();

        let count = with_session(&path, |s| Ok(s.sensors()?.len())).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_rollback_on_error() {
        let mut store = CatalogStore::open_in_memory().unwrap();

        let outcome: Result<()> = store.with_session(|s| {
            s.insert_sensor(&sensor("Davis", "ITL-3800C-029"))?;
            Err(Error::Usage("abort".to_string()))
        });
        assert!(matches!(outcome, Err(Error::Usage(_))));

        let count = store.with_session(|s| Ok(s.sensors()?.len())).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_rollback_keeps_earlier_sessions() {
        let mut store = CatalogStore::open_in_memory().unwrap();
        store
            .with_session(|s| s.insert_sensor(&sensor("Davis", "ITL-3800C-029")))
            .unwrap();

        let outcome = store.with_session(|s| {
            s.insert_sensor(&sensor("Tucson", "E2V-CCD250-160"))?;
            s.insert_sensor(&sensor("Davis", "ITL-3800C-999"))
        });
        assert!(matches!(outcome, Err(Error::Conflict(_))));

        let names: Vec<String> = store
            .with_session(|s| Ok(s.sensors()?.into_iter().map(|s| s.name).collect()))
            .unwrap();
        assert_eq!(names, vec!["Davis".to_string()]);
    }

    #[test]
    fn test_open_missing_file_is_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.db");

        let err = with_session(&path, |s| s.sensors()).unwrap_err();
        assert!(err.is_store_io());
        assert!(!path.exists());
    }

    #[test]
    fn test_open_corrupt_file_is_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.db");
        std::fs::write(&path, "not a sqlite database ".repeat(200)).unwrap();

        let err = CatalogStore::open(&path).err().unwrap();
        assert!(matches!(err, Error::Store(_)));
    }

    #[test]
    fn test_open_refuses_foreign_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute("CREATE TABLE notes(x)", []).unwrap();
        }

        let err = with_session(&path, |s| s.sensors()).unwrap_err();
        assert!(matches!(&err, Error::Io(e) if e.kind() == std::io::ErrorKind::InvalidData));
        assert!(err.to_string().contains("sensors, segments, results"));

        let conn = Connection::open(&path).unwrap();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(tables, vec!["notes".to_string()]);
    }

    #[test]
    fn test_open_names_only_missing_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(schema::CREATE_SENSORS_TABLE).unwrap();
        }

        let err = CatalogStore::open(&path).err().unwrap();
        assert!(err.is_store_io());
        let message = err.to_string();
        assert!(message.contains("segments, results"));
        assert!(!message.contains("sensors,"));
    }

    #[test]
    fn test_open_existing_store_enforces_foreign_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crosstalk.db");
        drop(CatalogStore::create(&path).unwrap());

        let err = with_session(&path, |s| s.insert_segment(&NewSegment::new("C10", 0, 42))).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
