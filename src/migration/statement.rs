use std::borrow::Cow;
use std::fmt;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use crate::database::Database;
use crate::error::CpMigrateError;

/// One unit of work produced by an update step.
///
/// The executor runs a step's statements in order on a single transaction.
/// The conditional variants do their catalog check on that same transaction,
/// so check and alteration cannot be split by another writer.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Raw DDL or DML. May contain several `;`-separated statements.
    Sql(Cow<'static, str>),

    /// A single statement whose runtime-derived values are bound as parameters.
    Bound {
        sql: Cow<'static, str>,
        params: Vec<Value>,
    },

    /// `ALTER TABLE .. ADD COLUMN ..`, skipped when the column already exists.
    AddColumnIfMissing {
        table: Cow<'static, str>,
        column: Cow<'static, str>,
        definition: Cow<'static, str>,
    },

    /// `ALTER TABLE .. DROP COLUMN ..`, skipped when the column is absent.
    DropColumnIfPresent {
        table: Cow<'static, str>,
        column: Cow<'static, str>,
    },
}

impl Statement {
    pub fn sql(sql: impl Into<Cow<'static, str>>) -> Self {
        Statement::Sql(sql.into())
    }

    pub fn bound(sql: impl Into<Cow<'static, str>>, params: Vec<Value>) -> Self {
        Statement::Bound {
            sql: sql.into(),
            params,
        }
    }

    pub fn add_column_if_missing(
        table: impl Into<Cow<'static, str>>,
        column: impl Into<Cow<'static, str>>,
        definition: impl Into<Cow<'static, str>>,
    ) -> Self {
        Statement::AddColumnIfMissing {
            table: table.into(),
            column: column.into(),
            definition: definition.into(),
        }
    }

    pub fn drop_column_if_present(
        table: impl Into<Cow<'static, str>>,
        column: impl Into<Cow<'static, str>>,
    ) -> Self {
        Statement::DropColumnIfPresent {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn execute(&self, conn: &Connection) -> Result<(), CpMigrateError> {
        match self {
            Statement::Sql(sql) => {
                conn.execute_batch(sql)?;
            }
            Statement::Bound { sql, params } => {
                conn.execute(sql, params_from_iter(params.iter()))?;
            }
            Statement::AddColumnIfMissing {
                table,
                column,
                definition,
            } => {
                if !Database::column_exists(conn, table, column)? {
                    let sql = format!(
                        "ALTER TABLE {} ADD COLUMN {} {}",
                        Database::quote_identifier(table)?,
                        Database::quote_identifier(column)?,
                        definition.trim()
                    );
                    conn.execute_batch(&sql)?;
                }
            }
            Statement::DropColumnIfPresent { table, column } => {
                if Database::column_exists(conn, table, column)? {
                    let sql = format!(
                        "ALTER TABLE {} DROP COLUMN {}",
                        Database::quote_identifier(table)?,
                        Database::quote_identifier(column)?
                    );
                    conn.execute_batch(&sql)?;
                }
            }
        }

        Ok(())
    }
}

/// Statement text as shown in failure reports. Bound values are never shown:
/// some of them are credentials.
impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Sql(sql) | Statement::Bound { sql, .. } => write!(f, "{}", sql.trim()),
            Statement::AddColumnIfMissing {
                table,
                column,
                definition,
            } => write!(
                f,
                "ALTER TABLE \"{}\" ADD COLUMN \"{}\" {} -- if column is missing",
                table,
                column,
                definition.trim()
            ),
            Statement::DropColumnIfPresent { table, column } => write!(
                f,
                "ALTER TABLE \"{}\" DROP COLUMN \"{}\" -- if column is present",
                table, column
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.conn()
            .execute_batch(
                "CREATE TABLE reseller_props (id INTEGER PRIMARY KEY, reseller_id INTEGER NOT NULL);
                INSERT INTO reseller_props (reseller_id) VALUES (2), (3);",
            )
            .unwrap();
        db
    }

    fn column_names(db: &Database, table: &str) -> Vec<String> {
        let mut stmt = db
            .conn()
            .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
            .unwrap();
        stmt.query_map([table], |row| row.get::<_, String>(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_add_column_if_missing_is_idempotent() {
        let db = setup();
        let stmt = Statement::add_column_if_missing(
            "reseller_props",
            "software_allowed",
            "TEXT NOT NULL DEFAULT 'no'",
        );

        stmt.execute(db.conn()).unwrap();
        let after_first = column_names(&db, "reseller_props");
        assert_eq!(after_first, vec!["id", "reseller_id", "software_allowed"]);

        stmt.execute(db.conn()).unwrap();
        let after_second = column_names(&db, "reseller_props");
        assert_eq!(after_first, after_second);

        let allowed: String = db
            .conn()
            .query_row(
                "SELECT software_allowed FROM reseller_props WHERE reseller_id = 2",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(allowed, "no");
    }

    #[test]
    fn test_drop_column_if_present_is_idempotent() {
        let db = setup();
        db.conn()
            .execute_batch("ALTER TABLE reseller_props ADD COLUMN legacy TEXT")
            .unwrap();

        let stmt = Statement::drop_column_if_present("reseller_props", "legacy");
        stmt.execute(db.conn()).unwrap();
        stmt.execute(db.conn()).unwrap();

        assert_eq!(column_names(&db, "reseller_props"), vec!["id", "reseller_id"]);
    }

    #[test]
    fn test_add_column_on_missing_table_fails() {
        let db = setup();
        let stmt = Statement::add_column_if_missing("ftp_users", "rawpasswd", "TEXT");
        assert!(stmt.execute(db.conn()).is_err());
    }

    #[test]
    fn test_conditional_statement_rejects_bad_identifier() {
        let db = setup();
        let stmt = Statement::add_column_if_missing("reseller_props", "x\" TEXT; --", "TEXT");
        assert!(matches!(
            stmt.execute(db.conn()),
            Err(CpMigrateError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_bound_statement() {
        let db = setup();
        let stmt = Statement::bound(
            "UPDATE reseller_props SET reseller_id = ?1 WHERE reseller_id = ?2",
            vec![Value::Integer(7), Value::Integer(3)],
        );
        stmt.execute(db.conn()).unwrap();

        let count: i64 = db
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM reseller_props WHERE reseller_id = 7",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_display_hides_bound_values() {
        let stmt = Statement::bound(
            "  UPDATE sql_user SET sqlu_pass = ?1 WHERE sqlu_id = ?2  ",
            vec![Value::Text("s3cret".to_string()), Value::Integer(1)],
        );
        let text = stmt.to_string();
        assert_eq!(text, "UPDATE sql_user SET sqlu_pass = ?1 WHERE sqlu_id = ?2");
        assert!(!text.contains("s3cret"));
    }

    #[test]
    fn test_display_conditional() {
        let stmt = Statement::add_column_if_missing("ftp_users", "rawpasswd", " TEXT DEFAULT NULL ");
        assert_eq!(
            stmt.to_string(),
            "ALTER TABLE \"ftp_users\" ADD COLUMN \"rawpasswd\" TEXT DEFAULT NULL -- if column is missing"
        );
    }
}
