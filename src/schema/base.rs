/// Panel tables as they stood at the first revision this tool knows about.
///
/// Fresh databases are created from this baseline, then brought up to date by
/// running every update, so new and old installations end in the same state.
pub const CREATE_BASE_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS admin (
    admin_id INTEGER PRIMARY KEY AUTOINCREMENT,
    admin_name TEXT NOT NULL UNIQUE,
    admin_type TEXT NOT NULL DEFAULT 'user',
    created_by INTEGER NOT NULL DEFAULT 0
);

-- Admin activity log. Messages are stored as rendered markup.
CREATE TABLE IF NOT EXISTS log (
    log_id INTEGER PRIMARY KEY AUTOINCREMENT,
    log_time TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    log_message TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS suexec_props (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    usr TEXT NOT NULL,
    grp TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS domain (
    domain_id INTEGER PRIMARY KEY AUTOINCREMENT,
    domain_name TEXT NOT NULL UNIQUE,
    domain_admin_id INTEGER NOT NULL,
    domain_status TEXT NOT NULL DEFAULT 'ok'
);

CREATE TABLE IF NOT EXISTS reseller_props (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    reseller_id INTEGER NOT NULL,
    current_dmn_cnt INTEGER NOT NULL DEFAULT 0,
    max_dmn_cnt INTEGER NOT NULL DEFAULT 0
);

-- props is a ';'-separated list of plan limits and permissions
CREATE TABLE IF NOT EXISTS hosting_plans (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    reseller_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    props TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS ftp_users (
    userid TEXT PRIMARY KEY,
    passwd TEXT NOT NULL,
    uid INTEGER NOT NULL DEFAULT 0,
    gid INTEGER NOT NULL DEFAULT 0,
    homedir TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS mail_users (
    mail_id INTEGER PRIMARY KEY AUTOINCREMENT,
    mail_acc TEXT NOT NULL,
    mail_pass TEXT DEFAULT NULL,
    mail_type TEXT NOT NULL,
    domain_id INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'ok',
    quota INTEGER NOT NULL DEFAULT 10485760
);

CREATE TABLE IF NOT EXISTS sql_user (
    sqlu_id INTEGER PRIMARY KEY AUTOINCREMENT,
    sqld_id INTEGER NOT NULL DEFAULT 0,
    sqlu_name TEXT NOT NULL,
    sqlu_pass TEXT DEFAULT NULL
);

CREATE TABLE IF NOT EXISTS server_ips (
    ip_id INTEGER PRIMARY KEY AUTOINCREMENT,
    ip_number TEXT NOT NULL UNIQUE,
    ip_card TEXT DEFAULT NULL,
    ip_status TEXT NOT NULL DEFAULT 'ok'
);

-- id is a leftover surrogate column; rows are keyed by user_id
CREATE TABLE IF NOT EXISTS user_gui_props (
    id INTEGER NOT NULL DEFAULT 0,
    user_id INTEGER NOT NULL,
    lang TEXT DEFAULT '',
    layout TEXT DEFAULT '',
    logo TEXT NOT NULL DEFAULT '0'
);

CREATE INDEX IF NOT EXISTS user_gui_props_user_id ON user_gui_props (user_id);

CREATE TABLE IF NOT EXISTS email_tpls (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    subject TEXT DEFAULT NULL,
    message TEXT DEFAULT NULL
);

CREATE TABLE IF NOT EXISTS orders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    plan_id INTEGER NOT NULL,
    domain_name TEXT DEFAULT NULL,
    status TEXT DEFAULT NULL
);

CREATE TABLE IF NOT EXISTS orders_settings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    header TEXT DEFAULT NULL,
    footer TEXT DEFAULT NULL
);

CREATE TABLE IF NOT EXISTS tickets (
    ticket_id INTEGER PRIMARY KEY AUTOINCREMENT,
    ticket_level INTEGER DEFAULT NULL,
    ticket_from INTEGER NOT NULL,
    ticket_to INTEGER NOT NULL,
    ticket_status INTEGER NOT NULL DEFAULT 1,
    ticket_subject TEXT DEFAULT NULL,
    ticket_message TEXT DEFAULT NULL
);

CREATE TABLE IF NOT EXISTS autoreplies_log (
    time TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    "from" TEXT NOT NULL,
    "to" TEXT NOT NULL
);

-- Translations lived in one table per language before gettext catalogs
CREATE TABLE IF NOT EXISTS lang_EnglishBritain (
    msgid TEXT NOT NULL PRIMARY KEY,
    msgstr TEXT NOT NULL
);
"#;
