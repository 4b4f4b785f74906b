use log::info;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::{io, path::Path};

use crate::error::CpMigrateError;
use crate::state_store::StateStore;

/// Owns the connection to the control panel database.
///
/// Every statement an update runs, and the revision counter it advances, go
/// through this single connection so that a step's statements and its counter
/// write commit or roll back together.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(db_path: &Path) -> Result<Self, CpMigrateError> {
        // Ensure the parent folder exists and is a directory
        if let Some(folder_path) = db_path.parent() {
            if !folder_path.as_os_str().is_empty() && !folder_path.is_dir() {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!(
                        "Database folder '{}' does not exist or is not a directory",
                        folder_path.display()
                    ),
                )
                .into());
            }
        }

        let conn = Connection::open(db_path)?;
        info!("Database opened at: {}", db_path.display());

        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, CpMigrateError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, CpMigrateError> {
        StateStore::ensure_table(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Runs `f` inside a `BEGIN IMMEDIATE` transaction. Commits if `f` succeeds,
    /// rolls back (on drop) otherwise.
    pub fn immediate_transaction<T, F>(conn: &mut Connection, f: F) -> Result<T, CpMigrateError>
    where
        F: FnOnce(&Transaction) -> Result<T, CpMigrateError>,
    {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Lists the user tables of the main schema, sorted by name.
    pub fn list_tables(conn: &Connection) -> Result<Vec<String>, CpMigrateError> {
        let mut stmt = conn.prepare(
            "SELECT name
            FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
            ORDER BY name ASC",
        )?;

        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut tables = Vec::new();
        for row in rows {
            tables.push(row?);
        }

        Ok(tables)
    }

    pub fn table_exists(conn: &Connection, table: &str) -> Result<bool, CpMigrateError> {
        let exists = conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get::<_, bool>(0),
        )?;

        Ok(exists)
    }

    /// Catalog lookup for a column. A missing table reports the column as absent.
    pub fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, CpMigrateError> {
        let exists = conn.query_row(
            "SELECT COUNT(*) > 0 FROM pragma_table_info(?1) WHERE name = ?2",
            [table, column],
            |row| row.get::<_, bool>(0),
        )?;

        Ok(exists)
    }

    /// Quotes a table or column name for interpolation into DDL.
    ///
    /// Identifiers cannot be bound as parameters, so they are allow-listed to
    /// `[A-Za-z_][A-Za-z0-9_]*` before being double-quoted.
    pub fn quote_identifier(ident: &str) -> Result<String, CpMigrateError> {
        let mut chars = ident.chars();
        let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
        let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

        if !valid_start || !valid_rest {
            return Err(CpMigrateError::InvalidIdentifier(ident.to_owned()));
        }

        Ok(format!("\"{}\"", ident))
    }

    /// True when the database holds no tables besides the state store.
    pub fn is_pristine(conn: &Connection) -> Result<bool, CpMigrateError> {
        let tables = Self::list_tables(conn)?;
        Ok(tables.iter().all(|t| t == StateStore::TABLE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory_creates_state_store() {
        let db = Database::open_in_memory().unwrap();
        assert!(Database::table_exists(db.conn(), StateStore::TABLE).unwrap());
        assert!(Database::is_pristine(db.conn()).unwrap());
    }

    #[test]
    fn test_open_rejects_missing_folder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("panel.db");
        let result = Database::open(&path);
        assert!(matches!(result, Err(CpMigrateError::IoError(_))));
    }

    #[test]
    fn test_open_file_backed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel.db");
        let db = Database::open(&path).unwrap();
        assert!(path.exists());
        assert!(Database::is_pristine(db.conn()).unwrap());
    }

    #[test]
    fn test_list_tables_sorted() {
        let db = Database::open_in_memory().unwrap();
        db.conn()
            .execute_batch("CREATE TABLE zeta (id INTEGER); CREATE TABLE alpha (id INTEGER);")
            .unwrap();

        let tables = Database::list_tables(db.conn()).unwrap();
        assert_eq!(tables, vec!["alpha", "config", "zeta"]);
        assert!(!Database::is_pristine(db.conn()).unwrap());
    }

    #[test]
    fn test_column_exists() {
        let db = Database::open_in_memory().unwrap();
        db.conn()
            .execute_batch("CREATE TABLE domain (domain_id INTEGER, domain_name TEXT);")
            .unwrap();

        assert!(Database::column_exists(db.conn(), "domain", "domain_name").unwrap());
        assert!(!Database::column_exists(db.conn(), "domain", "domain_software_allowed").unwrap());
        assert!(!Database::column_exists(db.conn(), "no_such_table", "domain_name").unwrap());
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(Database::quote_identifier("ftp_users").unwrap(), "\"ftp_users\"");
        assert_eq!(Database::quote_identifier("_x1").unwrap(), "\"_x1\"");

        assert!(Database::quote_identifier("").is_err());
        assert!(Database::quote_identifier("1table").is_err());
        assert!(Database::quote_identifier("log\"; DROP TABLE admin; --").is_err());
        assert!(Database::quote_identifier("user-props").is_err());
    }

    #[test]
    fn test_immediate_transaction_rolls_back_on_error() {
        let mut db = Database::open_in_memory().unwrap();
        db.conn().execute_batch("CREATE TABLE log (msg TEXT);").unwrap();

        let result: Result<(), CpMigrateError> =
            Database::immediate_transaction(db.conn_mut(), |tx| {
                tx.execute("INSERT INTO log (msg) VALUES ('kept?')", [])?;
                Err(CpMigrateError::Error("boom".to_string()))
            });
        assert!(result.is_err());

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM log", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
