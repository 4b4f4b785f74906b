pub const REV_73_SQL: &[&str] = &["CREATE TABLE IF NOT EXISTS quota_dovecot (
    username TEXT NOT NULL PRIMARY KEY,
    bytes INTEGER NOT NULL DEFAULT 0,
    messages INTEGER NOT NULL DEFAULT 0
)"];

/// Only mailboxes still on the old default are raised; custom quotas stay.
pub const REV_75_SQL: &[&str] = &["UPDATE mail_users SET quota = 104857600 WHERE quota = 10485760"];
