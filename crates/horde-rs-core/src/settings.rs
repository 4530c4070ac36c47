//! Settings for horde-rs.
//!
//! This module provides the [`Settings`] struct, which holds the small amount
//! of configuration the ORM layer consults, and [`LazySettings`], a global,
//! set-once settings instance.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::HordeError;

/// The SQL dialect the emitted statements target.
///
/// The dialect decides how named parameters are written and how a generated
/// identity value is recovered after an INSERT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Microsoft SQL Server (`@name` parameters, `SCOPE_IDENTITY()`).
    #[default]
    SqlServer,
    /// SQLite (`:name` parameters, `RETURNING rowid`).
    Sqlite,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SqlServer => write!(f, "sqlserver"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for Dialect {
    type Err = HordeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlserver" | "mssql" => Ok(Self::SqlServer),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            other => Err(HordeError::ConfigurationError(format!(
                "Unknown SQL dialect '{other}'"
            ))),
        }
    }
}

/// What the row materializer does when a numeric column does not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoercionPolicy {
    /// Substitute zero and keep going. A warning is logged for each value.
    #[default]
    Lenient,
    /// Fail the whole call with a coercion error.
    Strict,
}

impl FromStr for CoercionPolicy {
    type Err = HordeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(HordeError::ConfigurationError(format!(
                "Unknown coercion policy '{other}'"
            ))),
        }
    }
}

/// The complete set of horde-rs settings.
///
/// # Examples
///
/// ```
/// use horde_rs_core::settings::{CoercionPolicy, Dialect, Settings};
///
/// let settings = Settings::default();
/// assert_eq!(settings.dialect, Dialect::SqlServer);
/// assert_eq!(settings.coercion, CoercionPolicy::Lenient);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Whether debug mode is enabled (pretty logs instead of JSON).
    pub debug: bool,
    /// The log level filter (e.g. "debug", "info", "horde_rs_db=trace").
    pub log_level: String,
    /// The dialect `Model::build_default` renders SQL for.
    pub dialect: Dialect,
    /// The default numeric coercion policy for new query builders.
    pub coercion: CoercionPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            dialect: Dialect::default(),
            coercion: CoercionPolicy::default(),
        }
    }
}

/// A lazily-initialized, globally-accessible settings container.
///
/// Call [`configure`](LazySettings::configure) once at startup. Library code
/// reads it through [`try_get`](LazySettings::try_get) and falls back to the
/// defaults when nothing was configured.
pub struct LazySettings {
    inner: OnceLock<Settings>,
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    /// Creates a new, unconfigured `LazySettings`.
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Configures the global settings. Must be called exactly once.
    ///
    /// # Panics
    ///
    /// Panics if settings have already been configured.
    pub fn configure(&self, settings: Settings) {
        self.inner
            .set(settings)
            .expect("Settings have already been configured");
    }

    /// Returns a reference to the configured settings.
    ///
    /// # Panics
    ///
    /// Panics if settings have not been configured.
    pub fn get(&self) -> &Settings {
        self.inner
            .get()
            .expect("Settings have not been configured. Call SETTINGS.configure() first.")
    }

    /// Returns the configured settings, if any.
    pub fn try_get(&self) -> Option<&Settings> {
        self.inner.get()
    }

    /// Returns `true` if settings have been configured.
    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// The global settings instance.
pub static SETTINGS: LazySettings = LazySettings::new();
