//! Plan/act mode core for cline-mode.
//!
//! Everything in this crate is synchronous and free of I/O: the chat transcript
//! data model, the two operating modes, the tool-name mapper and the message
//! transform engine that injects completion banners and inherited plans.

pub mod banner;
pub mod mode;
pub mod tools;
pub mod transform;
pub mod types;

pub use mode::{ACT_AGENT, Mode, PLAN_AGENT};
pub use transform::{
    Diagnostic, DiagnosticSink, TracingSink, TransformOptions, TransformOutcome, transform,
};
pub use types::{ChatMessage, MessageInfo, MessagePart, PartKind, Role, TransformOutput};
