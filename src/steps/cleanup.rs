use log::warn;
use rusqlite::types::Value;

use crate::database::Database;
use crate::error::CpMigrateError;
use crate::migration::{Statement, StepContext};

/// Entries logged before the CSRF fixes may hold injected markup; drop them all.
pub const REV_46_SQL: &[&str] = &["DELETE FROM log"];

pub const REV_47_SQL: &[&str] = &["DROP TABLE IF EXISTS suexec_props"];

/// Network cards were stored with their alias suffix (`eth0:1`). Keep the card name only.
pub fn rev_68(ctx: &mut StepContext<'_>) -> Result<Vec<Statement>, CpMigrateError> {
    let mut stmt = ctx
        .conn()
        .prepare("SELECT ip_id, ip_card FROM server_ips ORDER BY ip_id ASC")?;

    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, Option<String>>(1)?))
    })?;

    let mut statements = Vec::new();
    for row in rows {
        let (ip_id, ip_card) = row?;
        let ip_card = ip_card.unwrap_or_default();
        let card_name = ip_card.split(':').next().unwrap_or("").to_owned();

        statements.push(Statement::bound(
            "UPDATE server_ips SET ip_card = ?1 WHERE ip_id = ?2",
            vec![Value::Text(card_name), Value::Integer(ip_id)],
        ));
    }

    Ok(statements)
}

/// Owner columns of rows that must point at an existing `admin` account.
///
/// Tickets are cleaned by sender only; the recipient column was never part of
/// this cleanup and installations that already ran it must keep matching.
const ORPHAN_OWNER_COLUMNS: &[(&str, &str)] = &[
    ("email_tpls", "owner_id"),
    ("hosting_plans", "reseller_id"),
    ("orders", "user_id"),
    ("orders_settings", "user_id"),
    ("reseller_props", "reseller_id"),
    ("tickets", "ticket_from"),
    ("user_gui_props", "user_id"),
    ("web_software", "reseller_id"),
];

pub fn rev_70(ctx: &mut StepContext<'_>) -> Result<Vec<Statement>, CpMigrateError> {
    let admin_count: i64 = ctx
        .conn()
        .query_row("SELECT COUNT(*) FROM admin", [], |row| row.get(0))?;

    // With no accounts at all every row would look orphaned.
    if admin_count == 0 {
        warn!("The admin table is empty, orphan items were not deleted");
        return Ok(Vec::new());
    }

    ORPHAN_OWNER_COLUMNS
        .iter()
        .map(|(table, owner_column)| {
            Ok(Statement::sql(format!(
                "DELETE FROM {} WHERE {} NOT IN (SELECT admin_id FROM admin)",
                Database::quote_identifier(table)?,
                Database::quote_identifier(owner_column)?
            )))
        })
        .collect()
}
