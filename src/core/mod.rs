//! Core logic shared by the CLI and the HTTP bridge.

pub mod agents;
pub mod approval;
pub mod commands;
mod error;
pub mod plan;
pub mod plugin;
pub mod progress;
pub mod prompts;
pub mod storage;

pub use error::{Error, Result};
pub use plugin::{ClineModePlugin, PluginHooks};
