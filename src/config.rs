use std::fs;
use std::path::Path;

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::CpMigrateError;

pub static CONFIG: OnceCell<Config> = OnceCell::new();

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub path: String,
}

impl DatabaseConfig {
    const DB_FILENAME: &'static str = "panel.db";

    fn default_in(data_dir: &Path) -> Self {
        DatabaseConfig {
            path: data_dir.join(Self::DB_FILENAME).to_string_lossy().into_owned(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub cpmigrate: String,
    pub default: String,
}

impl LoggingConfig {
    const LOG_LEVELS: [&'static str; 5] = ["error", "warn", "info", "debug", "trace"];
    const CPMIGRATE_LEVEL: &'static str = "info";
    const DEFAULT_LEVEL: &'static str = "warn";

    fn default() -> Self {
        LoggingConfig {
            cpmigrate: Self::CPMIGRATE_LEVEL.to_string(),
            default: Self::DEFAULT_LEVEL.to_string(),
        }
    }

    fn ensure_valid(&mut self) {
        Self::ensure_level("cpmigrate", &mut self.cpmigrate, Self::CPMIGRATE_LEVEL);
        Self::ensure_level("default", &mut self.default, Self::DEFAULT_LEVEL);
    }

    fn ensure_level(name: &str, level: &mut String, fallback: &str) {
        let str_original = level.clone();
        *level = level.trim().to_ascii_lowercase();
        if !Self::LOG_LEVELS.contains(&level.as_str()) {
            eprintln!(
                "Config error: {} log level of '{}' is invalid - using default of '{}'",
                name, str_original, fallback
            );
            *level = fallback.to_owned();
        }
    }

    /// Log specification for flexi_logger, e.g. `warn, cpmigrate=info`.
    pub fn log_spec(&self) -> String {
        format!("{}, cpmigrate={}", self.default, self.cpmigrate)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DaemonConfig {
    pub host: String,
    pub port: u16,
    pub client_name: String,
    pub timeout_secs: u64,
}

impl DaemonConfig {
    const HOST: &'static str = "127.0.0.1";
    const PORT: u16 = 9876;
    const CLIENT_NAME: &'static str = "cpmigrate";
    const TIMEOUT_SECS: u64 = 10;

    fn default() -> Self {
        DaemonConfig {
            host: Self::HOST.to_owned(),
            port: Self::PORT,
            client_name: Self::CLIENT_NAME.to_owned(),
            timeout_secs: Self::TIMEOUT_SECS,
        }
    }

    fn ensure_valid(&mut self) {
        self.host = self.host.trim().to_owned();
        if self.host.is_empty() {
            eprintln!(
                "Config error: daemon host is empty - using default of '{}'",
                Self::HOST
            );
            self.host = Self::HOST.to_owned();
        }
        if self.timeout_secs == 0 {
            eprintln!(
                "Config error: daemon timeout of 0 is invalid - using default of {}",
                Self::TIMEOUT_SECS
            );
            self.timeout_secs = Self::TIMEOUT_SECS;
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PanelConfig {
    pub item_change_status: String,
}

impl PanelConfig {
    pub const ITEM_CHANGE_STATUS: &'static str = "change";

    fn default() -> Self {
        PanelConfig {
            item_change_status: Self::ITEM_CHANGE_STATUS.to_owned(),
        }
    }

    fn ensure_valid(&mut self) {
        self.item_change_status = self.item_change_status.trim().to_owned();
        if self.item_change_status.is_empty() {
            eprintln!(
                "Config error: item_change_status is empty - using default of '{}'",
                Self::ITEM_CHANGE_STATUS
            );
            self.item_change_status = Self::ITEM_CHANGE_STATUS.to_owned();
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    const HOST: &'static str = "127.0.0.1";
    const PORT: u16 = 8090;

    fn default() -> Self {
        ServerConfig {
            host: Self::HOST.to_owned(),
            port: Self::PORT,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub daemon: DaemonConfig,
    pub panel: PanelConfig,
    pub server: ServerConfig,
}

impl Config {
    const ENV_PREFIX: &'static str = "CPMIGRATE_";

    fn default_in(data_dir: &Path) -> Self {
        Config {
            database: DatabaseConfig::default_in(data_dir),
            logging: LoggingConfig::default(),
            daemon: DaemonConfig::default(),
            panel: PanelConfig::default(),
            server: ServerConfig::default(),
        }
    }

    /// Loads the configuration from a TOML file located in the app's data directory,
    /// then applies `CPMIGRATE_` environment overrides (`CPMIGRATE_DAEMON__PORT=9000`).
    /// If the file is missing or fails to parse, defaults are used.
    /// Additionally, writes the default config to disk if no file exists.
    pub fn load_config(project_dirs: &ProjectDirs) -> Self {
        let data_dir = project_dirs.data_local_dir();
        let config_path = data_dir.join("config.toml");

        let default_config = Config::default_in(data_dir);

        // If the config file doesn't exist, write the default configuration to disk.
        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                if let Err(e) = fs::create_dir_all(parent) {
                    eprintln!(
                        "Failed to create configuration directory {}: {}",
                        parent.display(),
                        e
                    );
                }
            }
            if let Ok(toml_string) = toml::to_string_pretty(&default_config) {
                if let Err(e) = fs::write(&config_path, toml_string) {
                    eprintln!(
                        "Failed to write default config to {}: {}",
                        config_path.display(),
                        e
                    );
                }
            } else {
                eprintln!("Failed to serialize default config.");
            }
        }

        let figment = Self::figment(&default_config, &config_path);

        // Attempt to extract the configuration; on error, log a message and fall back to defaults.
        let mut config = Self::extract(&figment).unwrap_or_else(|err| {
            eprintln!(
                "Could not load config file {}: {}. Using default configuration.",
                config_path.display(),
                err
            );
            default_config
        });

        config.ensure_valid();

        config
    }

    /// Defaults, then the TOML file (if it exists), then environment overrides.
    fn figment(defaults: &Config, config_path: &Path) -> Figment {
        Figment::from(Serialized::defaults(defaults.clone()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(Self::ENV_PREFIX).split("__"))
    }

    fn extract(figment: &Figment) -> Result<Config, CpMigrateError> {
        figment
            .extract()
            .map_err(|e| CpMigrateError::Config(e.to_string()))
    }

    fn ensure_valid(&mut self) {
        self.logging.ensure_valid();
        self.daemon.ensure_valid();
        self.panel.ensure_valid();
    }

    pub fn init(config: Config) -> Result<(), CpMigrateError> {
        CONFIG
            .set(config)
            .map_err(|_| CpMigrateError::Config("Configuration already initialized".to_string()))
    }

    pub fn get() -> Result<&'static Config, CpMigrateError> {
        CONFIG
            .get()
            .ok_or_else(|| CpMigrateError::Config("Configuration not initialized".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    fn load_in_jail(jail: &Jail) -> Config {
        let dir = jail.directory();
        let defaults = Config::default_in(dir);
        let mut config = Config::extract(&Config::figment(&defaults, &dir.join("config.toml")))
            .expect("config should extract");
        config.ensure_valid();
        config
    }

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|jail| {
            let config = load_in_jail(jail);
            assert_eq!(config.daemon.port, 9876);
            assert_eq!(config.panel.item_change_status, "change");
            assert_eq!(config.logging.log_spec(), "warn, cpmigrate=info");
            assert!(config.database.path.ends_with("panel.db"));
            Ok(())
        });
    }

    #[test]
    fn test_file_values_override_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [database]
                path = "/var/lib/panel/panel.db"

                [daemon]
                port = 9000
                "#,
            )?;

            let config = load_in_jail(jail);
            assert_eq!(config.database.path, "/var/lib/panel/panel.db");
            assert_eq!(config.daemon.port, 9000);
            assert_eq!(config.daemon.host, "127.0.0.1");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[daemon]\nport = 9000\n")?;
            jail.set_env("CPMIGRATE_DAEMON__PORT", "9100");
            jail.set_env("CPMIGRATE_PANEL__ITEM_CHANGE_STATUS", "tochange");

            let config = load_in_jail(jail);
            assert_eq!(config.daemon.port, 9100);
            assert_eq!(config.panel.item_change_status, "tochange");
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_fall_back() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [logging]
                cpmigrate = " DEBUG "
                default = "loud"

                [daemon]
                host = "  "
                timeout_secs = 0

                [panel]
                item_change_status = ""
                "#,
            )?;

            let config = load_in_jail(jail);
            assert_eq!(config.logging.cpmigrate, "debug");
            assert_eq!(config.logging.default, "warn");
            assert_eq!(config.daemon.host, "127.0.0.1");
            assert_eq!(config.daemon.timeout_secs, 10);
            assert_eq!(config.panel.item_change_status, "change");
            Ok(())
        });
    }
}
