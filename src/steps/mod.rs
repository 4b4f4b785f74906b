mod cleanup;
mod credentials;
mod gui_props;
mod language;
mod mail;
mod settings;
mod software;

use crate::migration::registry::revisions_strictly_ascending;
use crate::migration::Step;

/// Every database update shipped with this release, in revision order.
///
/// History is append-only. An update that is no longer wanted stays here as
/// [`Step::noop`] so counters stored by older installations keep their meaning.
pub const STEPS: &[Step] = &[
    Step::sql_only(46, "Fixes some CSRF issues in admin log.", cleanup::REV_46_SQL),
    Step::sql_only(47, "Removes useless 'suexec_props' table.", cleanup::REV_47_SQL),
    Step::code(48, "#14: Adds table for software installer.", software::rev_48),
    Step::code(50, "Adds daemon service properties in config table.", settings::rev_50),
    Step::code(
        51,
        "Adds required field for on-click-logon from the ftp-user site.",
        credentials::rev_51,
    ),
    Step::code(52, "Adds new options for applications installer.", software::rev_52),
    Step::code(
        53,
        "Decrypts email, ftp and SQL users passwords in database.",
        credentials::rev_53,
    ),
    // Storage engines do not exist in SQLite.
    Step::noop(54, "Converts all tables to InnoDB engine."),
    Step::sql_only(56, "Adds unique index on user_gui_props.user_id column.", gui_props::REV_56_SQL),
    Step::code(59, "Drops useless column in user_gui_props table.", gui_props::rev_59),
    Step::noop(60, "Converts the autoreplies_log table to InnoDB engine."),
    Step::code(66, "Deletes old DUMP_GUI_DEBUG parameter from the config table.", settings::rev_66),
    Step::code(
        67,
        "#124: Enhancement - Switch to gettext (Machine Object Files)",
        language::rev_67,
    ),
    Step::code(68, "#119: Defect - Error when adding IP's", cleanup::rev_68),
    Step::sql_only(69, "Some fixes for the user_gui_props table.", gui_props::REV_69_SQL),
    Step::code(70, "Deletes possible orphan items in many tables.", cleanup::rev_70),
    // TEXT columns are unbounded in SQLite.
    Step::noop(71, "Changes the log table schema to allow storage of large messages."),
    Step::sql_only(
        72,
        "Adds unique index on the web_software_options.use_webdepot column.",
        software::REV_72_SQL,
    ),
    Step::sql_only(73, "#166: Adds dovecot quota table.", mail::REV_73_SQL),
    Step::sql_only(75, "#58: Increases mail quota value from 10 Mio to 100 Mio.", mail::REV_75_SQL),
];

const _: () = assert!(
    revisions_strictly_ascending(STEPS),
    "database update revisions must be non-zero and strictly ascending"
);
