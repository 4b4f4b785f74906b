use rusqlite::Connection;

use crate::config::PanelConfig;
use crate::database::Database;
use crate::error::CpMigrateError;
use crate::passwords::PasswordDecoder;
use crate::state_store::StateStore;

/// Panel settings some steps need while producing their statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSettings {
    /// Status written on rows the daemon must reprocess after a step changed them.
    pub item_change_status: String,
}

impl Default for StepSettings {
    fn default() -> Self {
        Self {
            item_change_status: PanelConfig::ITEM_CHANGE_STATUS.to_owned(),
        }
    }
}

impl From<&PanelConfig> for StepSettings {
    fn from(panel: &PanelConfig) -> Self {
        Self {
            item_change_status: panel.item_change_status.clone(),
        }
    }
}

/// What a step sees while producing its statements.
///
/// Producers run before the step's transaction is opened: reads here observe
/// the committed state of the database, and state store writes made through
/// the context take effect immediately.
pub struct StepContext<'a> {
    conn: &'a Connection,
    settings: &'a StepSettings,
    passwords: &'a dyn PasswordDecoder,
    daemon_request: bool,
}

impl<'a> StepContext<'a> {
    pub fn new(
        conn: &'a Connection,
        settings: &'a StepSettings,
        passwords: &'a dyn PasswordDecoder,
    ) -> Self {
        Self {
            conn,
            settings,
            passwords,
            daemon_request: false,
        }
    }

    pub fn conn(&self) -> &Connection {
        self.conn
    }

    pub fn settings(&self) -> &StepSettings {
        self.settings
    }

    pub fn passwords(&self) -> &dyn PasswordDecoder {
        self.passwords
    }

    pub fn list_tables(&self) -> Result<Vec<String>, CpMigrateError> {
        Database::list_tables(self.conn)
    }

    pub fn get_config(&self, name: &str) -> Result<Option<String>, CpMigrateError> {
        StateStore::get(self.conn, name)
    }

    pub fn set_config(&self, name: &str, value: &str) -> Result<(), CpMigrateError> {
        StateStore::set(self.conn, name, value)
    }

    pub fn delete_config(&self, name: &str) -> Result<bool, CpMigrateError> {
        StateStore::delete(self.conn, name)
    }

    /// Asks for the panel daemon to be notified once the whole run succeeds.
    pub fn request_daemon_notification(&mut self) {
        self.daemon_request = true;
    }

    pub fn daemon_requested(&self) -> bool {
        self.daemon_request
    }
}
