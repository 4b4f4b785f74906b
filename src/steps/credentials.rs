use rusqlite::types::Value;
use rusqlite::Connection;

use crate::error::CpMigrateError;
use crate::migration::{Statement, StepContext};
use crate::passwords::PasswordDecoder;

pub fn rev_51(_ctx: &mut StepContext<'_>) -> Result<Vec<Statement>, CpMigrateError> {
    Ok(vec![Statement::add_column_if_missing(
        "ftp_users",
        "rawpasswd",
        "TEXT DEFAULT NULL",
    )])
}

/// Rewrites every stored mail, SQL and FTP password in decoded form.
///
/// One `UPDATE` per row. Mail accounts are also flagged for the daemon so the
/// mail server picks up the new password format, and the daemon is asked to
/// run once the update completes.
pub fn rev_53(ctx: &mut StepContext<'_>) -> Result<Vec<Statement>, CpMigrateError> {
    let mut statements = Vec::new();
    let status = ctx.settings().item_change_status.clone();

    let mail_rows = select_secrets(
        ctx.conn(),
        "SELECT mail_id, mail_pass FROM mail_users
        WHERE mail_type GLOB 'normal_mail*'
        OR mail_type GLOB 'alias_mail*'
        OR mail_type GLOB 'subdom_mail*'
        ORDER BY mail_id ASC",
    )?;
    for (mail_id, stored) in mail_rows {
        statements.push(Statement::bound(
            "UPDATE mail_users SET mail_pass = ?1, status = ?2 WHERE mail_id = ?3",
            vec![
                decode(ctx.passwords(), stored)?,
                Value::Text(status.clone()),
                mail_id,
            ],
        ));
    }

    if !statements.is_empty() {
        ctx.request_daemon_notification();
    }

    let sql_rows = select_secrets(
        ctx.conn(),
        "SELECT sqlu_id, sqlu_pass FROM sql_user ORDER BY sqlu_id ASC",
    )?;
    for (sqlu_id, stored) in sql_rows {
        statements.push(Statement::bound(
            "UPDATE sql_user SET sqlu_pass = ?1 WHERE sqlu_id = ?2",
            vec![decode(ctx.passwords(), stored)?, sqlu_id],
        ));
    }

    let ftp_rows = select_secrets(
        ctx.conn(),
        "SELECT userid, rawpasswd FROM ftp_users ORDER BY userid ASC",
    )?;
    for (userid, stored) in ftp_rows {
        statements.push(Statement::bound(
            "UPDATE ftp_users SET rawpasswd = ?1 WHERE userid = ?2",
            vec![decode(ctx.passwords(), stored)?, userid],
        ));
    }

    Ok(statements)
}

fn select_secrets(
    conn: &Connection,
    query: &str,
) -> Result<Vec<(Value, Option<String>)>, CpMigrateError> {
    let mut stmt = conn.prepare(query)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, Value>(0)?, row.get::<_, Option<String>>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn decode(passwords: &dyn PasswordDecoder, stored: Option<String>) -> Result<Value, CpMigrateError> {
    let stored = stored.unwrap_or_default();
    Ok(Value::Text(passwords.decode(&stored)?))
}
