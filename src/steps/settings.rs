use log::info;

use crate::error::CpMigrateError;
use crate::migration::{Statement, StepContext};

/// `port;protocol;name;enabled;custom;address`
const PORT_DAEMON: &str = "9876;tcp;Panel-Daemon;1;0;127.0.0.1";

pub fn rev_50(ctx: &mut StepContext<'_>) -> Result<Vec<Statement>, CpMigrateError> {
    ctx.set_config("PORT_DAEMON", PORT_DAEMON)?;
    Ok(Vec::new())
}

pub fn rev_66(ctx: &mut StepContext<'_>) -> Result<Vec<Statement>, CpMigrateError> {
    if ctx.delete_config("DUMP_GUI_DEBUG")? {
        info!("Removed obsolete DUMP_GUI_DEBUG setting");
    }
    Ok(Vec::new())
}
