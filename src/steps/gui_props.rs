use crate::error::CpMigrateError;
use crate::migration::{Statement, StepContext};

pub const REV_56_SQL: &[&str] = &[
    "DROP INDEX IF EXISTS user_gui_props_user_id",
    "CREATE UNIQUE INDEX user_gui_props_user_id ON user_gui_props (user_id)",
];

pub fn rev_59(_ctx: &mut StepContext<'_>) -> Result<Vec<Statement>, CpMigrateError> {
    Ok(vec![Statement::drop_column_if_present("user_gui_props", "id")])
}

/// `0` was the placeholder for "no custom logo".
pub const REV_69_SQL: &[&str] = &["UPDATE user_gui_props SET logo = '' WHERE logo = '0'"];
