use std::collections::BTreeMap;

use log::{debug, error, info, warn, Level};
use logging_timer::timer;
use rusqlite::TransactionBehavior;

use super::context::{StepContext, StepSettings};
use super::failure::UpdateFailure;
use super::registry::{Lookup, Registry, NO_REVISION};
use crate::database::Database;
use crate::error::CpMigrateError;
use crate::notifier::DaemonNotifier;
use crate::passwords::{ClearTextPasswords, PasswordDecoder};
use crate::state_store::StateStore;

/// How the engine was invoked. The daemon is only ever notified from an
/// interactive run: a one-shot run may be rebuilding a schema in isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationMode {
    Interactive,
    OneShot,
}

/// Applies pending database updates, one transaction per update.
///
/// The engine assumes it is the only one driving updates against its database.
/// Nothing here guards against a second process running updates at the same time.
pub struct UpdateEngine {
    db: Database,
    registry: Registry,
    settings: StepSettings,
    passwords: Box<dyn PasswordDecoder + Send>,
    notifier: Option<Box<dyn DaemonNotifier + Send>>,
    mode: InvocationMode,
    daemon_request: bool,
    last_error: Option<UpdateFailure>,
}

impl UpdateEngine {
    pub fn new(db: Database, registry: Registry, mode: InvocationMode) -> Self {
        Self {
            db,
            registry,
            settings: StepSettings::default(),
            passwords: Box::new(ClearTextPasswords),
            notifier: None,
            mode,
            daemon_request: false,
            last_error: None,
        }
    }

    pub fn with_settings(mut self, settings: StepSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_password_decoder(mut self, passwords: Box<dyn PasswordDecoder + Send>) -> Self {
        self.passwords = passwords;
        self
    }

    pub fn with_notifier(mut self, notifier: Box<dyn DaemonNotifier + Send>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The stored revision counter: the next revision to apply.
    pub fn current_revision(&self) -> Result<u32, CpMigrateError> {
        StateStore::schema_revision(self.db.conn())
    }

    fn next_pending(&self) -> Result<Option<u32>, CpMigrateError> {
        let last_applied = self.current_revision()?.saturating_sub(1);
        let next = self.registry.next_revision_after(last_applied);
        Ok((next != NO_REVISION).then_some(next))
    }

    pub fn is_update_available(&self) -> Result<bool, CpMigrateError> {
        Ok(self.next_pending()?.is_some())
    }

    /// One-line description of every defined update from the next pending one
    /// upwards. Empty when nothing is pending.
    pub fn pending_update_details(&self) -> Result<BTreeMap<u32, String>, CpMigrateError> {
        Ok(match self.next_pending()? {
            Some(next) => self.registry.details_from(next),
            None => BTreeMap::new(),
        })
    }

    /// Asks for the daemon to be notified after the next successful run.
    pub fn request_daemon_notification(&mut self) {
        self.daemon_request = true;
    }

    /// Why the last call to [`UpdateEngine::apply_all_updates`] returned false.
    pub fn last_error(&self) -> Option<&UpdateFailure> {
        self.last_error.as_ref()
    }

    /// Applies every pending update in ascending order.
    ///
    /// Returns true once the database is caught up. Returns false on the first
    /// update that fails; that update is rolled back, the counter still names
    /// it, and the reason is available from [`UpdateEngine::last_error`].
    pub fn apply_all_updates(&mut self) -> bool {
        self.last_error = None;

        loop {
            let revision = match self.next_pending() {
                Ok(Some(revision)) => revision,
                Ok(None) => break,
                Err(e) => {
                    error!("Unable to determine the next database update: {}", e);
                    self.last_error = Some(UpdateFailure::new(None, failure_message(&e), None));
                    return false;
                }
            };

            if let Err(failure) = self.run_step(revision) {
                error!("{}", failure);
                self.last_error = Some(failure);
                return false;
            }
        }

        info!(
            "Database is up to date (highest known revision {})",
            self.registry.highest_known_revision()
        );

        self.notify_daemon();

        true
    }

    fn run_step(&mut self, revision: u32) -> Result<(), UpdateFailure> {
        let _tmr = timer!(Level::Debug; "UpdateEngine::run_step", "{}", revision);

        let step = match self.registry.lookup(revision) {
            Lookup::Found(step) => *step,
            Lookup::NotFound => {
                debug!("Database update {} is not defined, skipping", revision);
                return self.advance_counter(revision);
            }
        };

        info!("Applying database update {}: {}", revision, step.summary);

        let (produced, daemon_requested) = {
            let mut ctx = StepContext::new(self.db.conn(), &self.settings, self.passwords.as_ref());
            let produced = step.produce(&mut ctx);
            (produced, ctx.daemon_requested())
        };

        let statements = produced
            .map_err(|e| UpdateFailure::new(Some(revision), failure_message(&e), None))?;

        if statements.is_empty() {
            debug!("Database update {} produced no statements", revision);
            self.advance_counter(revision)?;
            self.daemon_request |= daemon_requested;
            return Ok(());
        }

        let fail = |e: CpMigrateError| UpdateFailure::new(Some(revision), failure_message(&e), None);

        let tx = self
            .db
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| fail(e.into()))?;

        for statement in &statements {
            if let Err(e) = statement.execute(&tx) {
                let failure = UpdateFailure::new(
                    Some(revision),
                    failure_message(&e),
                    Some(statement.to_string()),
                );
                if let Err(rollback_err) = tx.rollback() {
                    warn!("Rollback of database update {} failed: {}", revision, rollback_err);
                }
                return Err(failure);
            }
        }

        if let Err(e) = StateStore::set_schema_revision(&tx, revision.saturating_add(1)) {
            let failure = fail(e);
            if let Err(rollback_err) = tx.rollback() {
                warn!("Rollback of database update {} failed: {}", revision, rollback_err);
            }
            return Err(failure);
        }

        tx.commit().map_err(|e| fail(e.into()))?;

        // Only committed work is worth a daemon run.
        self.daemon_request |= daemon_requested;

        debug!(
            "Database update {} committed ({} statement(s))",
            revision,
            statements.len()
        );

        Ok(())
    }

    fn advance_counter(&self, revision: u32) -> Result<(), UpdateFailure> {
        StateStore::set_schema_revision(self.db.conn(), revision.saturating_add(1))
            .map_err(|e| UpdateFailure::new(Some(revision), failure_message(&e), None))
    }

    fn notify_daemon(&mut self) {
        if self.mode != InvocationMode::Interactive || !self.daemon_request {
            return;
        }

        self.daemon_request = false;

        match &self.notifier {
            Some(notifier) => match notifier.notify() {
                Ok(()) => info!("Daemon notified of database updates"),
                Err(e) => warn!("Unable to notify the daemon: {}", e),
            },
            None => warn!("Daemon notification requested but no notifier is configured"),
        }
    }
}

/// The database's own message for database errors, our message otherwise.
fn failure_message(e: &CpMigrateError) -> String {
    match e {
        CpMigrateError::DatabaseError(inner) => inner.to_string(),
        other => other.to_string(),
    }
}
