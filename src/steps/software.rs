//! Tables and permissions for the application installer.

use crate::error::CpMigrateError;
use crate::migration::{Statement, StepContext};

const CREATE_WEB_SOFTWARE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS web_software (
    software_id INTEGER PRIMARY KEY AUTOINCREMENT,
    software_master_id INTEGER NOT NULL DEFAULT 0,
    reseller_id INTEGER NOT NULL DEFAULT 0,
    software_name TEXT NOT NULL,
    software_version TEXT NOT NULL,
    software_language TEXT NOT NULL,
    software_type TEXT NOT NULL,
    software_db INTEGER NOT NULL,
    software_archive TEXT NOT NULL,
    software_installfile TEXT NOT NULL,
    software_prefix TEXT NOT NULL,
    software_link TEXT NOT NULL,
    software_desc TEXT NOT NULL,
    software_active INTEGER NOT NULL,
    software_status TEXT NOT NULL,
    rights_add_by INTEGER NOT NULL DEFAULT 0,
    software_depot TEXT NOT NULL DEFAULT 'no'
);
"#;

const CREATE_WEB_SOFTWARE_INST_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS web_software_inst (
    domain_id INTEGER NOT NULL,
    alias_id INTEGER NOT NULL DEFAULT 0,
    subdomain_id INTEGER NOT NULL DEFAULT 0,
    subdomain_alias_id INTEGER NOT NULL DEFAULT 0,
    software_id INTEGER NOT NULL,
    software_master_id INTEGER NOT NULL DEFAULT 0,
    software_res_del INTEGER NOT NULL DEFAULT 0,
    software_name TEXT NOT NULL,
    software_version TEXT NOT NULL,
    software_language TEXT NOT NULL,
    path TEXT NOT NULL DEFAULT '0',
    software_prefix TEXT NOT NULL DEFAULT '0',
    db TEXT NOT NULL DEFAULT '0',
    database_user TEXT NOT NULL DEFAULT '0',
    database_tmp_pwd TEXT NOT NULL DEFAULT '0',
    install_username TEXT NOT NULL DEFAULT '0',
    install_password TEXT NOT NULL DEFAULT '0',
    install_email TEXT NOT NULL DEFAULT '0',
    software_status TEXT NOT NULL,
    software_depot TEXT NOT NULL DEFAULT 'no'
);

CREATE INDEX IF NOT EXISTS idx_web_software_inst_software ON web_software_inst (software_id);
"#;

pub fn rev_48(_ctx: &mut StepContext<'_>) -> Result<Vec<Statement>, CpMigrateError> {
    Ok(vec![
        Statement::sql(CREATE_WEB_SOFTWARE_SQL),
        Statement::sql(CREATE_WEB_SOFTWARE_INST_SQL),
        Statement::add_column_if_missing(
            "domain",
            "domain_software_allowed",
            "TEXT NOT NULL DEFAULT 'no'",
        ),
        Statement::add_column_if_missing(
            "reseller_props",
            "software_allowed",
            "TEXT NOT NULL DEFAULT 'no'",
        ),
        Statement::add_column_if_missing(
            "reseller_props",
            "softwaredepot_allowed",
            "TEXT NOT NULL DEFAULT 'yes'",
        ),
        // Hosting plan props are a `;`-separated list; append the software permission.
        Statement::sql("UPDATE hosting_plans SET props = props || ';_no_'"),
    ])
}

const CREATE_WEB_SOFTWARE_DEPOT_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS web_software_depot (
    package_id INTEGER PRIMARY KEY AUTOINCREMENT,
    package_install_type TEXT NOT NULL,
    package_title TEXT NOT NULL,
    package_version TEXT NOT NULL,
    package_language TEXT NOT NULL,
    package_type TEXT NOT NULL,
    package_description TEXT NOT NULL,
    package_vendor_hp TEXT NOT NULL,
    package_download_link TEXT NOT NULL,
    package_signature_link TEXT NOT NULL
);
"#;

const CREATE_WEB_SOFTWARE_OPTIONS_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS web_software_options (
    use_webdepot INTEGER NOT NULL DEFAULT 1,
    webdepot_xml_url TEXT NOT NULL,
    webdepot_last_update TEXT NOT NULL
);
"#;

const DEFAULT_WEB_SOFTWARE_OPTIONS_SQL: &str = r#"
REPLACE INTO web_software_options (use_webdepot, webdepot_xml_url, webdepot_last_update)
VALUES (1, 'http://app-pkg.i-mscp.net/imscp_webdepot_list.xml', '0000-00-00 00:00:00');
"#;

pub fn rev_52(_ctx: &mut StepContext<'_>) -> Result<Vec<Statement>, CpMigrateError> {
    Ok(vec![
        Statement::sql(CREATE_WEB_SOFTWARE_DEPOT_SQL),
        Statement::sql(CREATE_WEB_SOFTWARE_OPTIONS_SQL),
        Statement::sql(DEFAULT_WEB_SOFTWARE_OPTIONS_SQL),
        Statement::add_column_if_missing(
            "web_software",
            "software_installtype",
            "TEXT DEFAULT NULL",
        ),
        Statement::sql("UPDATE web_software SET software_installtype = 'install'"),
        Statement::add_column_if_missing(
            "reseller_props",
            "websoftwaredepot_allowed",
            "TEXT DEFAULT 'yes'",
        ),
    ])
}

/// Repeated runs of revision 52 may have left duplicate option rows. Keep the
/// oldest row per `use_webdepot` value, then enforce uniqueness.
pub const REV_72_SQL: &[&str] = &[
    "DELETE FROM web_software_options
    WHERE rowid NOT IN (
        SELECT MIN(rowid) FROM web_software_options GROUP BY use_webdepot
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_web_software_options_use_webdepot
    ON web_software_options (use_webdepot)",
];
