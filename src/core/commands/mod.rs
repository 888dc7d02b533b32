//! Slash commands for the plan lifecycle.
//!
//! Every command returns a short message for the user. Failures are reported
//! in the message; nothing here returns an error to the caller.

use std::fmt::Write as _;
use std::str::FromStr;

use serde::Serialize;

use crate::core::approval::{ApprovalError, DEFAULT_APPROVER, PlanStatus, PlanStatusStore};
use crate::core::plan::PlanManager;

/// Lifecycle commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Command {
    /// `create-plan-status [id]`
    CreatePlanStatus,
    /// `approve-plan [id]`
    ApprovePlan,
    /// `reject-plan [id] [reason]`
    RejectPlan,
    /// `start-execution [id]`
    StartExecution,
    /// `complete-plan [id]`
    CompletePlan,
    /// `plan-status [id]`
    PlanStatus,
}

impl Command {
    pub const ALL: [Self; 6] = [
        Self::CreatePlanStatus,
        Self::ApprovePlan,
        Self::RejectPlan,
        Self::StartExecution,
        Self::CompletePlan,
        Self::PlanStatus,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CreatePlanStatus => "create-plan-status",
            Self::ApprovePlan => "approve-plan",
            Self::RejectPlan => "reject-plan",
            Self::StartExecution => "start-execution",
            Self::CompletePlan => "complete-plan",
            Self::PlanStatus => "plan-status",
        }
    }

    #[must_use]
    pub const fn usage(self) -> &'static str {
        match self {
            Self::CreatePlanStatus => "/create-plan-status [plan-id]",
            Self::ApprovePlan => "/approve-plan [plan-id]",
            Self::RejectPlan => "/reject-plan [plan-id] [reason]",
            Self::StartExecution => "/start-execution [plan-id]",
            Self::CompletePlan => "/complete-plan [plan-id]",
            Self::PlanStatus => "/plan-status [plan-id]",
        }
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().trim_start_matches('/');
        Self::ALL
            .into_iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| format!("unknown command: {name}"))
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Runs lifecycle commands against a status store.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    store: PlanStatusStore,
}

impl CommandDispatcher {
    #[must_use]
    pub const fn new(store: PlanStatusStore) -> Self {
        Self { store }
    }

    #[must_use]
    pub const fn store(&self) -> &PlanStatusStore {
        &self.store
    }

    /// Run a command by name with whitespace-separated arguments.
    #[must_use]
    pub fn execute(&self, name: &str, args: &str) -> String {
        match name.parse::<Command>() {
            Ok(command) => self.run(command, args),
            Err(e) => {
                tracing::warn!(command = %name, "unknown command");
                format!("❌ {e}")
            }
        }
    }

    /// Run a parsed command.
    #[must_use]
    pub fn run(&self, command: Command, args: &str) -> String {
        tracing::debug!(command = %command, args, "running command");
        let args = args.trim();
        let result = match command {
            Command::CreatePlanStatus => self.create(args),
            Command::ApprovePlan => self.approve(args),
            Command::RejectPlan => self.reject(args),
            Command::StartExecution => self.start(args),
            Command::CompletePlan => self.complete(args),
            Command::PlanStatus => self.status(args),
        };
        result.unwrap_or_else(|e| {
            tracing::warn!(command = %command, error = %e, "command failed");
            failure_message(command, &e)
        })
    }

    /// Explicit id from the first argument, otherwise the current plan.
    fn target(&self, args: &str) -> Result<Option<String>, ApprovalError> {
        match args.split_whitespace().next() {
            Some(id) => Ok(Some(id.to_string())),
            None => self.store.get_current_plan_id(),
        }
    }

    fn create(&self, args: &str) -> Result<String, ApprovalError> {
        let id = args
            .split_whitespace()
            .next()
            .map_or_else(PlanManager::generate_plan_id, str::to_string);
        let status = self.store.create_plan_status(&id)?;
        Ok(format!(
            "📋 Plan '{}' created ({}). Approve it with /approve-plan {}",
            status.id, status.status, status.id
        ))
    }

    fn approve(&self, args: &str) -> Result<String, ApprovalError> {
        let Some(id) = self.target(args)? else {
            return Ok(no_plan_message());
        };
        let status = self.store.approve(&id, DEFAULT_APPROVER)?;
        Ok(format!(
            "✅ Plan '{}' approved. Run /start-execution to begin.",
            status.id
        ))
    }

    /// `reject-plan <id> <reason>` when the first word names a known plan,
    /// otherwise the current plan with every word as the reason.
    fn reject(&self, args: &str) -> Result<String, ApprovalError> {
        let (first, rest) = args
            .split_once(char::is_whitespace)
            .map_or((args, ""), |(first, rest)| (first, rest.trim()));

        let (id, reason) = if !first.is_empty() && self.store.get_plan_status(first)?.is_some() {
            (first.to_string(), rest)
        } else {
            match self.store.get_current_plan_id()? {
                Some(current) => (current, args),
                None => return Ok(no_plan_message()),
            }
        };

        let reason = if reason.is_empty() {
            "no reason given"
        } else {
            reason
        };
        let status = self.store.reject(&id, reason)?;
        Ok(format!("🚫 Plan '{}' rejected: {reason}", status.id))
    }

    fn start(&self, args: &str) -> Result<String, ApprovalError> {
        let Some(id) = self.target(args)? else {
            return Ok(no_plan_message());
        };
        let status = self.store.start_execution(&id)?;
        Ok(format!("🚀 Executing plan '{}'.", status.id))
    }

    fn complete(&self, args: &str) -> Result<String, ApprovalError> {
        let Some(id) = self.target(args)? else {
            return Ok(no_plan_message());
        };
        let status = self.store.complete(&id)?;
        Ok(format!("🏁 Plan '{}' completed.", status.id))
    }

    fn status(&self, args: &str) -> Result<String, ApprovalError> {
        let Some(id) = self.target(args)? else {
            return Ok(no_plan_message());
        };
        let status = self
            .store
            .get_plan_status(&id)?
            .ok_or_else(|| ApprovalError::NotFound(id.clone()))?;
        Ok(describe(&status))
    }
}

fn no_plan_message() -> String {
    "❌ No current plan. Create one with /create-plan-status".to_string()
}

fn failure_message(command: Command, error: &ApprovalError) -> String {
    match error {
        ApprovalError::NotFound(_) | ApprovalError::NotApproved(_) => format!("❌ {error}"),
        ApprovalError::Storage(e) => format!("❌ {command} failed: {e}"),
    }
}

/// Multi-line description of a plan's status.
#[must_use]
pub fn describe(status: &PlanStatus) -> String {
    let mut out = format!("Plan: {}\nStatus: {}", status.id, status.status);
    let _ = write!(out, "\nCreated: {}", status.created_at.to_rfc3339());
    let _ = write!(out, "\nUpdated: {}", status.updated_at.to_rfc3339());
    if let (Some(at), Some(by)) = (&status.approved_at, &status.approved_by) {
        let _ = write!(out, "\nApproved: {} by {by}", at.to_rfc3339());
    }
    if let Some(at) = &status.rejected_at {
        let _ = write!(
            out,
            "\nRejected: {} ({})",
            at.to_rfc3339(),
            status.rejected_reason.as_deref().unwrap_or("")
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::approval::PlanState;

    fn dispatcher() -> (CommandDispatcher, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = PlanStatusStore::new(dir.path().join("plans"));
        (CommandDispatcher::new(store), dir)
    }

    fn state(d: &CommandDispatcher, id: &str) -> PlanState {
        d.store().get_plan_status(id).unwrap().unwrap().status
    }

    #[test]
    fn parse_names() {
        assert_eq!("approve-plan".parse::<Command>(), Ok(Command::ApprovePlan));
        assert_eq!("/start-execution".parse::<Command>(), Ok(Command::StartExecution));
        assert!("deploy".parse::<Command>().is_err());
    }

    #[test]
    fn full_lifecycle_on_current_plan() {
        let (d, _dir) = dispatcher();

        let out = d.execute("create-plan-status", "plan-a");
        assert!(out.contains("plan-a"));
        assert_eq!(state(&d, "plan-a"), PlanState::Draft);

        let out = d.execute("start-execution", "");
        assert!(out.starts_with("❌"));
        assert!(out.contains("not approved"));

        assert!(d.execute("approve-plan", "").starts_with("✅"));
        assert_eq!(state(&d, "plan-a"), PlanState::Approved);

        assert!(d.execute("start-execution", "").starts_with("🚀"));
        assert_eq!(state(&d, "plan-a"), PlanState::InProgress);

        assert!(d.execute("complete-plan", "plan-a").starts_with("🏁"));
        assert_eq!(state(&d, "plan-a"), PlanState::Completed);
    }

    #[test]
    fn create_without_id_generates_one() {
        let (d, _dir) = dispatcher();
        d.execute("create-plan-status", "");

        let id = d.store().get_current_plan_id().unwrap().unwrap();
        assert!(id.starts_with("plan-"));
    }

    #[test]
    fn missing_plan_is_reported() {
        let (d, _dir) = dispatcher();

        assert!(d.execute("approve-plan", "").contains("No current plan"));
        let out = d.execute("approve-plan", "ghost");
        assert_eq!(out, "❌ plan 'ghost' not found");
        assert!(d.execute("start-execution", "ghost").contains("not found"));
    }

    #[test]
    fn reject_with_explicit_id_and_reason() {
        let (d, _dir) = dispatcher();
        d.execute("create-plan-status", "plan-a");
        d.execute("create-plan-status", "plan-b");

        let out = d.execute("reject-plan", "plan-b too risky");
        assert_eq!(out, "🚫 Plan 'plan-b' rejected: too risky");

        let plan = d.store().get_plan_status("plan-b").unwrap().unwrap();
        assert_eq!(plan.rejected_reason.as_deref(), Some("too risky"));
        assert_eq!(state(&d, "plan-a"), PlanState::Draft);
    }

    #[test]
    fn reject_current_plan_with_reason_only() {
        let (d, _dir) = dispatcher();
        d.execute("create-plan-status", "plan-a");

        let out = d.execute("reject-plan", "needs more detail");
        assert_eq!(out, "🚫 Plan 'plan-a' rejected: needs more detail");
    }

    #[test]
    fn status_describes_plan() {
        let (d, _dir) = dispatcher();
        d.execute("create-plan-status", "plan-a");
        d.execute("approve-plan", "plan-a");

        let out = d.execute("plan-status", "");
        assert!(out.contains("Plan: plan-a"));
        assert!(out.contains("Status: approved"));
        assert!(out.contains("by user"));
    }

    #[test]
    fn unknown_command_is_a_message() {
        let (d, _dir) = dispatcher();
        assert_eq!(d.execute("deploy", ""), "❌ unknown command: deploy");
    }
}
