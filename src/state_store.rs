use log::debug;
use rusqlite::{Connection, OptionalExtension};

use crate::error::CpMigrateError;

/// Durable key/value settings kept in the `config` table of the panel database.
///
/// All functions take a `&Connection` so they can run either directly on the
/// database connection or on an open transaction (a `Transaction` derefs to a
/// `Connection`), which is how the revision counter is advanced atomically with
/// a step's statements.
pub struct StateStore;

impl StateStore {
    pub const TABLE: &'static str = "config";

    /// Key holding the schema revision counter: the next revision to apply.
    pub const DATABASE_REVISION: &'static str = "DATABASE_REVISION";

    const INITIAL_REVISION: u32 = 1;

    pub fn ensure_table(conn: &Connection) -> Result<(), CpMigrateError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS config (
                name TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    pub fn get(conn: &Connection, name: &str) -> Result<Option<String>, CpMigrateError> {
        conn.query_row("SELECT value FROM config WHERE name = ?", [name], |row| {
            row.get(0)
        })
        .optional()
        .map_err(CpMigrateError::DatabaseError)
    }

    pub fn set(conn: &Connection, name: &str, value: &str) -> Result<(), CpMigrateError> {
        conn.execute(
            "INSERT INTO config (name, value) VALUES (?1, ?2)
            ON CONFLICT(name) DO UPDATE SET value = excluded.value",
            [name, value],
        )?;
        Ok(())
    }

    /// Returns true if the key existed.
    pub fn delete(conn: &Connection, name: &str) -> Result<bool, CpMigrateError> {
        let deleted = conn.execute("DELETE FROM config WHERE name = ?", [name])?;
        Ok(deleted > 0)
    }

    /// Reads the schema revision counter, creating it with its initial value
    /// the first time it is found missing.
    pub fn schema_revision(conn: &Connection) -> Result<u32, CpMigrateError> {
        match Self::get(conn, Self::DATABASE_REVISION)? {
            Some(value) => value.trim().parse::<u32>().map_err(|_| {
                CpMigrateError::Error(format!(
                    "Invalid {} value '{}' in the {} table",
                    Self::DATABASE_REVISION,
                    value,
                    Self::TABLE
                ))
            }),
            None => {
                debug!(
                    "{} not set, initializing to {}",
                    Self::DATABASE_REVISION,
                    Self::INITIAL_REVISION
                );
                Self::set_schema_revision(conn, Self::INITIAL_REVISION)?;
                Ok(Self::INITIAL_REVISION)
            }
        }
    }

    pub fn set_schema_revision(conn: &Connection, revision: u32) -> Result<(), CpMigrateError> {
        Self::set(conn, Self::DATABASE_REVISION, &revision.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    #[test]
    fn test_get_set_delete() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.conn();

        assert_eq!(StateStore::get(conn, "USER_INITIAL_LANG").unwrap(), None);

        StateStore::set(conn, "USER_INITIAL_LANG", "lang_EnglishBritain").unwrap();
        assert_eq!(
            StateStore::get(conn, "USER_INITIAL_LANG").unwrap().as_deref(),
            Some("lang_EnglishBritain")
        );

        StateStore::set(conn, "USER_INITIAL_LANG", "en_GB").unwrap();
        assert_eq!(
            StateStore::get(conn, "USER_INITIAL_LANG").unwrap().as_deref(),
            Some("en_GB")
        );

        assert!(StateStore::delete(conn, "USER_INITIAL_LANG").unwrap());
        assert!(!StateStore::delete(conn, "USER_INITIAL_LANG").unwrap());
        assert_eq!(StateStore::get(conn, "USER_INITIAL_LANG").unwrap(), None);
    }

    #[test]
    fn test_schema_revision_created_lazily() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.conn();

        assert_eq!(StateStore::get(conn, StateStore::DATABASE_REVISION).unwrap(), None);
        assert_eq!(StateStore::schema_revision(conn).unwrap(), 1);
        assert_eq!(
            StateStore::get(conn, StateStore::DATABASE_REVISION).unwrap().as_deref(),
            Some("1")
        );
    }

    #[test]
    fn test_schema_revision_round_trip() {
        let db = Database::open_in_memory().unwrap();
        StateStore::set_schema_revision(db.conn(), 49).unwrap();
        assert_eq!(StateStore::schema_revision(db.conn()).unwrap(), 49);
    }

    #[test]
    fn test_schema_revision_rejects_garbage() {
        let db = Database::open_in_memory().unwrap();
        StateStore::set(db.conn(), StateStore::DATABASE_REVISION, "forty-six").unwrap();
        assert!(StateStore::schema_revision(db.conn()).is_err());
    }

    #[test]
    fn test_values_persist_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel.db");

        {
            let db = Database::open(&path).unwrap();
            StateStore::set_schema_revision(db.conn(), 67).unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(StateStore::schema_revision(db.conn()).unwrap(), 67);
    }
}
