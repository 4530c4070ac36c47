//! # horde-rs-core
//!
//! Foundation types shared by every horde-rs crate. Nothing in here knows
//! about records, queries, or rows.
//!
//! ## Modules
//!
//! - [`error`] - The [`HordeError`] taxonomy and the [`HordeResult`] alias
//! - [`settings`] - [`Settings`], the SQL [`Dialect`], and the [`CoercionPolicy`]
//! - [`settings_loader`] - Loading settings from TOML and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{HordeError, HordeResult};
pub use settings::{CoercionPolicy, Dialect, Settings, SETTINGS};
