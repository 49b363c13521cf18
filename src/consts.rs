/// Directory name under the platform config/data dirs
pub(crate) const APP_DIR: &str = "intake";

/// Overrides the config search and the data directory
pub(crate) const HOME_ENV: &str = "INTAKE_HOME";

/// Log filter in `EnvFilter` syntax
pub(crate) const LOG_ENV: &str = "INTAKE_LOG";

/// SQLite file inside the data directory
pub(crate) const DB_FILE: &str = "intake.db";

/// Display format for timestamps in tables
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";
