mod base;

use log::info;

use crate::database::Database;
use crate::error::CpMigrateError;
use crate::migration::Registry;
use crate::state_store::StateStore;

pub use base::CREATE_BASE_SCHEMA_SQL;

/// Creates the baseline panel tables in a database that holds nothing yet, and
/// points the revision counter at the first known update.
///
/// Returns false, changing nothing, when the database already has tables.
pub fn create_base_schema(db: &mut Database, registry: &Registry) -> Result<bool, CpMigrateError> {
    if !Database::is_pristine(db.conn())? {
        info!("Database already initialized, baseline schema not created");
        return Ok(false);
    }

    let first_revision = registry.first_revision().unwrap_or(1);

    Database::immediate_transaction(db.conn_mut(), |tx| {
        tx.execute_batch(CREATE_BASE_SCHEMA_SQL)?;
        StateStore::set_schema_revision(tx, first_revision)?;
        Ok(())
    })?;

    info!(
        "Created baseline schema, first pending database update is {}",
        first_revision
    );

    Ok(true)
}
