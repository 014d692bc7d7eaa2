//! Settings module for nodesync
//!
//! Every field has a default matching a stock OpenClash install, so an empty
//! or missing settings file is a valid configuration.

pub mod settings_struct;

pub use settings_struct::{GroupMode, Settings, SettingsError};
