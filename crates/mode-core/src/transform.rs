//! Message transform engine.
//!
//! Runs once per chat turn over the host's transcript snapshot and mutates only
//! the last message:
//!
//! - a finished `cline-plan` assistant message gets a completion banner appended
//!   to its last text part, unless an earlier plan message already has one;
//! - the first `cline-act` message after a plan gets the plan text prepended as a
//!   new synthetic part.
//!
//! Both injections are guarded by marker checks, so running the transform again
//! on its own output changes nothing. Malformed input is never an error; the
//! corresponding injection is skipped and reported to the diagnostic sink.

use crate::banner::{
    INHERITED_PLAN_MARKER, PLAN_COMPLETE_MARKER, completion_block, inherited_plan_block,
    strip_completion_block,
};
use crate::mode::Mode;
use crate::types::{ChatMessage, MessagePart};

/// Advisory event emitted while transforming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Nothing to transform.
    EmptyTranscript,
    /// Last message has an unrecognised role.
    MalformedLastMessage { index: usize },
    /// Completion banner appended to the last message.
    CompletionAppended { index: usize },
    /// An earlier plan message already carries a completion banner.
    CompletionAlreadyPresent { index: usize },
    /// Plan message has no text part to append to.
    NoTextPart { index: usize },
    /// Plan content from `source` prepended to the last message.
    PlanInherited { index: usize, source: usize },
    /// Last message already starts with an inherited plan.
    PlanAlreadyInherited { index: usize },
    /// Act-mode message with no earlier plan to inherit.
    NoPlanToInherit { index: usize },
}

/// Receiver of transform diagnostics.
pub trait DiagnosticSink {
    /// Record one diagnostic.
    fn record(&self, diagnostic: &Diagnostic);
}

/// Sink that forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::MalformedLastMessage { index } => {
                tracing::warn!(index, "last message has no recognizable role, skipping");
            }
            other => tracing::debug!(diagnostic = ?other, "message transform"),
        }
    }
}

/// Options for [`transform`].
#[derive(Clone, Copy)]
pub struct TransformOptions<'a> {
    /// Whether the `start-act` tool is available.
    pub enable_execute_command: bool,
    /// Whether plans must be approved before execution.
    pub enable_plan_approval: bool,
    /// Optional diagnostic sink.
    pub diagnostics: Option<&'a dyn DiagnosticSink>,
}

impl Default for TransformOptions<'_> {
    fn default() -> Self {
        Self {
            enable_execute_command: true,
            enable_plan_approval: true,
            diagnostics: None,
        }
    }
}

impl TransformOptions<'_> {
    fn report(&self, diagnostic: &Diagnostic) {
        if let Some(sink) = self.diagnostics {
            sink.record(diagnostic);
        }
    }
}

/// What a transform changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransformOutcome {
    /// A completion banner was appended.
    pub completion_appended: bool,
    /// An inherited-plan part was prepended.
    pub plan_inherited: bool,
}

impl TransformOutcome {
    /// Check if the transcript was modified.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.completion_appended || self.plan_inherited
    }
}

/// Facts gathered by the backward scan over plan-mode assistant messages.
#[derive(Debug, Default)]
struct PlanScan {
    /// Whether any plan message already carries a completion banner.
    has_marker: bool,
    /// Nearest plan message with at least one text part.
    target: Option<usize>,
    /// Nearest non-empty plan text and the index it came from.
    content: Option<(usize, String)>,
}

fn is_plan_reply(message: &ChatMessage) -> bool {
    message.is_assistant() && message.mode() == Some(Mode::Plan)
}

fn scan_plans(messages: &[ChatMessage]) -> PlanScan {
    let mut scan = PlanScan::default();

    for (index, message) in messages.iter().enumerate().rev() {
        if !is_plan_reply(message) {
            continue;
        }

        if !scan.has_marker && message.contains_text(PLAN_COMPLETE_MARKER) {
            scan.has_marker = true;
        }

        if scan.target.is_none() && message.last_text_part().is_some() {
            scan.target = Some(index);
        }

        if scan.content.is_none() {
            let text = message.text_content();
            let plan = strip_completion_block(&text);
            if !plan.trim().is_empty() {
                scan.content = Some((index, plan.to_string()));
            }
        }

        if scan.has_marker && scan.target.is_some() && scan.content.is_some() {
            break;
        }
    }

    scan
}

/// Transform the transcript in place.
pub fn transform(messages: &mut [ChatMessage], options: &TransformOptions<'_>) -> TransformOutcome {
    let mut outcome = TransformOutcome::default();

    let Some(last_index) = messages.len().checked_sub(1) else {
        options.report(&Diagnostic::EmptyTranscript);
        return outcome;
    };

    if !messages[last_index].info.role.is_recognized() {
        options.report(&Diagnostic::MalformedLastMessage { index: last_index });
        return outcome;
    }

    let current_mode = messages[last_index].mode();
    let scan = scan_plans(messages);

    if is_plan_reply(&messages[last_index]) {
        if scan.has_marker {
            options.report(&Diagnostic::CompletionAlreadyPresent { index: last_index });
        } else if scan.target == Some(last_index) {
            outcome.completion_appended = append_completion(&mut messages[last_index], options);
            options.report(&Diagnostic::CompletionAppended { index: last_index });
        } else {
            options.report(&Diagnostic::NoTextPart { index: last_index });
        }
    }

    if current_mode == Some(Mode::Act) && last_index >= 1 {
        let last = &mut messages[last_index];
        match scan.content {
            _ if last.contains_text(INHERITED_PLAN_MARKER) => {
                options.report(&Diagnostic::PlanAlreadyInherited { index: last_index });
            }
            Some((source, content)) => {
                let block = inherited_plan_block(
                    &content,
                    options.enable_execute_command,
                    options.enable_plan_approval,
                );
                last.parts.insert(0, MessagePart::synthetic_text(block));
                outcome.plan_inherited = true;
                options.report(&Diagnostic::PlanInherited {
                    index: last_index,
                    source,
                });
            }
            None => options.report(&Diagnostic::NoPlanToInherit { index: last_index }),
        }
    }

    outcome
}

fn append_completion(message: &mut ChatMessage, options: &TransformOptions<'_>) -> bool {
    let Some(part_index) = message.last_text_part() else {
        return false;
    };
    let block = completion_block(options.enable_execute_command, options.enable_plan_approval);
    message.parts[part_index]
        .text
        .get_or_insert_with(String::new)
        .push_str(&block);
    true
}
