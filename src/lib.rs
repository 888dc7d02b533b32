//! cline-mode - Cline-style plan and act modes for OpenCode.
//!
//! This library provides:
//! - configuration loading and validation
//! - system prompts from local files or the Cline repository
//! - host plugin hooks (agents, messages transform, tools, commands)
//! - plan status store with an approval gate
//! - an HTTP bridge for hosts that talk to the plugin over the network
//!
//! The synchronous transcript logic lives in the `mode-core` crate.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐        ┌─────────────┐
//! │     CLI     │        │ HTTP bridge │
//! └──────┬──────┘        └──────┬──────┘
//!        │                      │
//!        └──────────┬───────────┘
//!                   │
//!            ┌──────┴──────┐
//!            │    Core     │
//!            └──────┬──────┘
//!                   │
//!            ┌──────┴──────┐
//!            │  mode-core  │
//!            └─────────────┘
//! ```

pub mod api;
pub mod build_info;
pub mod cli;
pub mod config;
pub mod core;

pub use config::PluginConfig;
pub use core::{ClineModePlugin, PluginHooks};
pub use mode_core::{ChatMessage, Mode, TransformOptions, transform};
