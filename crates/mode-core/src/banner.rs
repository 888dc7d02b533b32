//! Text blocks injected into the transcript on mode transitions.
//!
//! Each block starts with a sentinel marker so repeated transforms can detect
//! their own output by substring containment.

use crate::mode::{ACT_AGENT, PLAN_AGENT};

/// Sentinel for the completion banner appended to a finished plan.
pub const PLAN_COMPLETE_MARKER: &str = "<!-- cline-mode:plan-complete -->";

/// Sentinel for the plan block prepended to the first act-mode message.
pub const INHERITED_PLAN_MARKER: &str = "<!-- cline-mode:inherited-plan -->";

/// Tool that switches to act mode.
pub const START_ACT_TOOL: &str = "start-act";

/// How the banner tells the user to invoke [`START_ACT_TOOL`].
pub const START_ACT_COMMAND: &str = "/start-act";

/// Slash command that approves the current plan.
pub const APPROVE_PLAN_COMMAND: &str = "/approve-plan";

/// How the user moves on from a finished plan.
#[must_use]
pub fn proceed_hint(enable_execute_command: bool) -> String {
    if enable_execute_command {
        format!("✅ **To execute**: Run `{START_ACT_COMMAND}` to switch to `{ACT_AGENT}`")
    } else {
        format!("✅ **To execute**: Press `Tab` and select the `{ACT_AGENT}` agent")
    }
}

fn approval_hint() -> String {
    format!("⚠️ **Approval Required**: Run `{APPROVE_PLAN_COMMAND}` before executing the plan")
}

/// Block appended to the last text part of a completed plan message.
#[must_use]
pub fn completion_block(enable_execute_command: bool, enable_plan_approval: bool) -> String {
    let mut lines = vec![
        String::new(),
        String::new(),
        PLAN_COMPLETE_MARKER.to_string(),
        "---".to_string(),
        "**📋 Plan Complete!**".to_string(),
        String::new(),
    ];
    if enable_plan_approval {
        lines.push(approval_hint());
    }
    lines.push(proceed_hint(enable_execute_command));
    lines.push("✏️ **To modify**: Describe the change, e.g. \"revise step 2\"".to_string());
    lines.push("❌ **To cancel**: Say \"cancel\"".to_string());
    lines.join("\n")
}

/// Part prepended to the first act-mode message, carrying the plan forward.
#[must_use]
pub fn inherited_plan_block(
    plan_content: &str,
    enable_execute_command: bool,
    enable_plan_approval: bool,
) -> String {
    let mut lines = vec![
        INHERITED_PLAN_MARKER.to_string(),
        format!("## 📋 Plan inherited from `{PLAN_AGENT}`"),
        String::new(),
        format!(
            "You are now running as `{ACT_AGENT}`. Carry out the plan below step by step."
        ),
    ];
    if enable_plan_approval {
        lines.push(format!(
            "Execution requires an approved plan (`{APPROVE_PLAN_COMMAND}`)."
        ));
    }
    lines.push(proceed_hint(enable_execute_command));
    lines.extend([
        String::new(),
        "---".to_string(),
        String::new(),
        plan_content.to_string(),
        String::new(),
        "---".to_string(),
        String::new(),
        "Follow the plan above exactly and report progress after each step.".to_string(),
    ]);
    lines.join("\n")
}

/// Plan text with any previously appended completion block removed.
#[must_use]
pub fn strip_completion_block(text: &str) -> &str {
    text.find(PLAN_COMPLETE_MARKER)
        .map_or(text, |index| &text[..index])
        .trim_end()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_block_uses_slash_command_when_enabled() {
        let block = completion_block(true, false);
        assert!(block.starts_with("\n\n"));
        assert!(block.contains(PLAN_COMPLETE_MARKER));
        assert!(block.contains(START_ACT_COMMAND));
        assert!(!block.contains("Approval Required"));
    }

    #[test]
    fn completion_block_falls_back_to_tab_hint() {
        let block = completion_block(false, false);
        assert!(block.contains("Tab"));
        assert!(block.contains(ACT_AGENT));
        assert!(!block.contains(START_ACT_COMMAND));
    }

    #[test]
    fn completion_block_mentions_approval() {
        let block = completion_block(true, true);
        assert!(block.contains(APPROVE_PLAN_COMMAND));
        assert!(block.contains("Approval Required"));
    }

    #[test]
    fn start_act_command_invokes_start_act_tool() {
        assert_eq!(START_ACT_COMMAND.strip_prefix('/'), Some(START_ACT_TOOL));
    }

    #[test]
    fn inherited_block_keeps_proceed_hint_with_approval() {
        let block = inherited_plan_block("Step 1", true, true);
        assert!(block.contains(APPROVE_PLAN_COMMAND));
        assert!(block.contains(&proceed_hint(true)));

        let block = inherited_plan_block("Step 1", false, false);
        assert!(!block.contains(APPROVE_PLAN_COMMAND));
        assert!(block.contains(&proceed_hint(false)));
    }

    #[test]
    fn inherited_block_wraps_plan_verbatim() {
        let block = inherited_plan_block("Step 1\nStep 2", true, false);
        assert!(block.starts_with(INHERITED_PLAN_MARKER));
        assert!(block.contains("---\n\nStep 1\nStep 2\n\n---"));
    }

    #[test]
    fn strip_removes_banner() {
        let text = format!("Step 1{}", completion_block(true, true));
        assert_eq!(strip_completion_block(&text), "Step 1");
        assert_eq!(strip_completion_block("Plain"), "Plain");
    }
}
