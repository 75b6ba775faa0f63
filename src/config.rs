//! Application settings read from environment variables.

use std::fmt;
use std::path::Path;

use serde::{Serialize, Serializer, ser::SerializeStruct};

use crate::database::{DatabaseUrl, MYSQL_DRIVER_SCHEME};
use crate::env::{EnvSource, find_env_file};
use crate::error::{ConfigError, ConfigResult};

pub const APP_NAME: &str = "APP_NAME";
pub const DEBUG: &str = "DEBUG";
pub const MYSQL_USER: &str = "MYSQL_USER";
pub const MYSQL_PASSWORD: &str = "MYSQL_PASSWORD";
pub const MYSQL_HOST: &str = "MYSQL_HOST";
pub const MYSQL_PORT: &str = "MYSQL_PORT";
pub const MYSQL_DB: &str = "MYSQL_DB";

pub const DEFAULT_APP_NAME: &str = "FastAPI App";
pub const DEFAULT_DEBUG: &str = "False";
pub const DEFAULT_MYSQL_PORT: &str = "3306";

/// Only this exact spelling turns debug mode on.
const DEBUG_ENABLED: &str = "True";

#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub app_name: String,
    pub debug: bool,
    pub mysql_user: Option<String>,
    pub mysql_password: Option<String>,
    pub mysql_host: Option<String>,
    pub mysql_port: String,
    pub mysql_db: Option<String>,
}

impl Settings {
    /// Build settings from `source`, applying defaults for absent keys.
    ///
    /// Never fails: missing database variables are left as `None` and only
    /// reported by [`validate`](Self::validate).
    pub fn from_source(source: &EnvSource) -> Self {
        let owned = |key: &str| source.get(key).map(str::to_owned);

        Self {
            app_name: owned(APP_NAME).unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
            debug: source.get(DEBUG).unwrap_or(DEFAULT_DEBUG) == DEBUG_ENABLED,
            mysql_user: owned(MYSQL_USER),
            mysql_password: owned(MYSQL_PASSWORD),
            mysql_host: owned(MYSQL_HOST),
            mysql_port: owned(MYSQL_PORT).unwrap_or_else(|| DEFAULT_MYSQL_PORT.to_string()),
            mysql_db: owned(MYSQL_DB),
        }
    }

    /// Process environment only, no env file.
    pub fn from_env() -> Self {
        Self::from_source(&EnvSource::process())
    }

    /// Process environment layered over the nearest `.env` file.
    pub fn load() -> Self {
        let source = EnvSource::process();
        match std::env::current_dir() {
            Ok(cwd) => Self::load_from(source, &cwd),
            Err(err) => {
                tracing::warn!(error = %err, "cannot resolve working directory, skipping env file");
                Self::from_source(&source)
            }
        }
    }

    /// Layer the `.env` nearest to `start` under `source`.
    ///
    /// An env file that cannot be read is logged and ignored.
    pub fn load_from(source: EnvSource, start: &Path) -> Self {
        let Some(path) = find_env_file(start) else {
            tracing::debug!(start = %start.display(), "no env file found");
            return Self::from_source(&source);
        };

        match source.clone().with_env_file(&path) {
            Ok(layered) => Self::from_source(&layered),
            Err(err) => {
                tracing::warn!(error = %err, "ignoring env file");
                Self::from_source(&source)
            }
        }
    }

    /// Connection string for the MySQL database.
    ///
    /// Recomputed on each call. Absent parts become empty segments; use
    /// [`try_database_url`](Self::try_database_url) to reject them.
    pub fn database_url(&self) -> String {
        self.database_url_parts().render()
    }

    pub fn try_database_url(&self) -> ConfigResult<String> {
        self.validate()?;
        Ok(self.database_url())
    }

    /// Fails with the name of every unset MySQL variable.
    pub fn validate(&self) -> ConfigResult<()> {
        let missing = self.missing_database_vars();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingVars(missing))
        }
    }

    pub fn missing_database_vars(&self) -> Vec<&'static str> {
        [
            (MYSQL_USER, &self.mysql_user),
            (MYSQL_PASSWORD, &self.mysql_password),
            (MYSQL_HOST, &self.mysql_host),
            (MYSQL_DB, &self.mysql_db),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name)
        .collect()
    }

    fn database_url_parts(&self) -> DatabaseUrl<'_> {
        DatabaseUrl {
            driver: MYSQL_DRIVER_SCHEME,
            user: self.mysql_user.as_deref(),
            password: self.mysql_password.as_deref(),
            host: self.mysql_host.as_deref(),
            port: &self.mysql_port,
            db: self.mysql_db.as_deref(),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("app_name", &self.app_name)
            .field("debug", &self.debug)
            .field("mysql_user", &self.mysql_user)
            .field(
                "mysql_password",
                &self.mysql_password.as_ref().map(|_| "[REDACTED]"),
            )
            .field("mysql_host", &self.mysql_host)
            .field("mysql_port", &self.mysql_port)
            .field("mysql_db", &self.mysql_db)
            .finish()
    }
}

// Startup summary; the password only appears masked inside `database_url`.
impl Serialize for Settings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Settings", 7)?;
        state.serialize_field("app_name", &self.app_name)?;
        state.serialize_field("debug", &self.debug)?;
        state.serialize_field("mysql_user", &self.mysql_user)?;
        state.serialize_field("mysql_host", &self.mysql_host)?;
        state.serialize_field("mysql_port", &self.mysql_port)?;
        state.serialize_field("mysql_db", &self.mysql_db)?;
        state.serialize_field("database_url", &self.database_url_parts().redacted())?;
        state.end()
    }
}
