//! Plan lifecycle and approval gate.
//!
//! All records live in one `plan-status.json` document inside the plans
//! directory. Every operation re-reads the document and every mutation rewrites
//! it as a whole. Mutations made through this module are serialised by a
//! process-wide lock; two separate processes can still race and lose a write.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::storage::{Storage, StorageError};

/// Format version written to new status files.
pub const STATUS_FILE_VERSION: &str = "1.0.0";

/// Storage key of the status file (`plan-status.json`).
const STATUS_KEY: &[&str] = &["plan-status"];

/// Default approver recorded by [`PlanStatusStore::approve`].
pub const DEFAULT_APPROVER: &str = "user";

static WRITE_LOCK: Mutex<()> = Mutex::new(());

/// Lifecycle state of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanState {
    Draft,
    Approved,
    Rejected,
    InProgress,
    Completed,
}

impl std::fmt::Display for PlanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Draft => "draft",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        })
    }
}

/// Persisted status of one plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStatus {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: PlanState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_reason: Option<String>,
}

impl PlanStatus {
    fn draft(id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            created_at: now,
            updated_at: now,
            status: PlanState::Draft,
            approved_at: None,
            approved_by: None,
            rejected_at: None,
            rejected_reason: None,
        }
    }

    /// Whether the plan has been approved and not moved on since.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self.status, PlanState::Approved) && self.approved_at.is_some()
    }
}

/// The whole status document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStatusFile {
    pub version: String,
    pub current_plan: Option<String>,
    #[serde(default)]
    pub plans: BTreeMap<String, PlanStatus>,
}

impl Default for PlanStatusFile {
    fn default() -> Self {
        Self {
            version: STATUS_FILE_VERSION.to_string(),
            current_plan: None,
            plans: BTreeMap::new(),
        }
    }
}

/// Approval errors.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// No record for the plan id.
    #[error("plan '{0}' not found")]
    NotFound(String),

    /// The plan exists but is not approved.
    #[error("plan '{0}' is not approved; approve it first with /approve-plan")]
    NotApproved(String),

    /// Status file could not be read or written.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for approval operations.
pub type Result<T> = std::result::Result<T, ApprovalError>;

/// File-backed plan status store.
#[derive(Debug, Clone)]
pub struct PlanStatusStore {
    storage: Storage,
}

impl PlanStatusStore {
    /// Create a store over a plans directory.
    #[must_use]
    pub fn new(plans_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage: Storage::with_root(plans_dir.into()),
        }
    }

    /// Plans directory.
    #[must_use]
    pub fn plans_dir(&self) -> &Path {
        self.storage.root()
    }

    /// Path of the status file.
    #[must_use]
    pub fn status_path(&self) -> PathBuf {
        self.storage.path(STATUS_KEY)
    }

    /// Read the status document, creating an empty one if absent.
    ///
    /// Creating the empty document takes the write lock, so it cannot clobber
    /// a concurrent first mutation.
    pub fn load(&self) -> Result<PlanStatusFile> {
        match self.storage.read(STATUS_KEY) {
            Err(StorageError::NotFound(_)) => {
                let _guard = WRITE_LOCK.lock();
                self.load_locked()
            }
            other => Ok(other?),
        }
    }

    /// [`Self::load`] for callers already holding `WRITE_LOCK`.
    fn load_locked(&self) -> Result<PlanStatusFile> {
        Ok(self.storage.read_or_init(STATUS_KEY, PlanStatusFile::default)?)
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut PlanStatusFile) -> Result<R>) -> Result<R> {
        let _guard = WRITE_LOCK.lock();
        let mut file = self.load_locked()?;
        let result = f(&mut file)?;
        self.storage.write(STATUS_KEY, &file)?;
        tracing::debug!(path = %self.status_path().display(), "plan status saved");
        Ok(result)
    }

    fn mutate_plan(
        &self,
        id: &str,
        f: impl FnOnce(&mut PlanStatus, DateTime<Utc>),
    ) -> Result<PlanStatus> {
        self.mutate(|file| {
            let plan = file
                .plans
                .get_mut(id)
                .ok_or_else(|| ApprovalError::NotFound(id.to_string()))?;
            let now = Utc::now();
            f(plan, now);
            plan.updated_at = now;
            Ok(plan.clone())
        })
    }

    /// Insert a new draft record. The first plan created becomes current.
    pub fn create_plan_status(&self, id: &str) -> Result<PlanStatus> {
        let status = self.mutate(|file| {
            let status = PlanStatus::draft(id, Utc::now());
            file.plans.insert(id.to_string(), status.clone());
            if file.current_plan.is_none() {
                file.current_plan = Some(id.to_string());
            }
            Ok(status)
        })?;
        tracing::info!(plan = %id, "plan status created");
        Ok(status)
    }

    /// Look up a plan.
    pub fn get_plan_status(&self, id: &str) -> Result<Option<PlanStatus>> {
        Ok(self.load()?.plans.remove(id))
    }

    /// Id of the current plan, if any.
    pub fn get_current_plan_id(&self) -> Result<Option<String>> {
        Ok(self.load()?.current_plan)
    }

    /// All plans, oldest first.
    pub fn list(&self) -> Result<Vec<PlanStatus>> {
        let mut plans: Vec<_> = self.load()?.plans.into_values().collect();
        plans.sort_by_key(|p| p.created_at);
        Ok(plans)
    }

    /// Mark a plan approved.
    pub fn approve(&self, id: &str, approved_by: &str) -> Result<PlanStatus> {
        let status = self.mutate_plan(id, |plan, now| {
            plan.status = PlanState::Approved;
            plan.approved_at = Some(now);
            plan.approved_by = Some(approved_by.to_string());
        })?;
        tracing::info!(plan = %id, approved_by, "plan approved");
        Ok(status)
    }

    /// Mark a plan rejected.
    pub fn reject(&self, id: &str, reason: &str) -> Result<PlanStatus> {
        let status = self.mutate_plan(id, |plan, now| {
            plan.status = PlanState::Rejected;
            plan.rejected_at = Some(now);
            plan.rejected_reason = Some(reason.to_string());
        })?;
        tracing::info!(plan = %id, reason, "plan rejected");
        Ok(status)
    }

    /// Check whether a plan is approved. Unknown plans are not approved.
    pub fn check_approval(&self, id: &str) -> Result<bool> {
        let Some(plan) = self.get_plan_status(id)? else {
            tracing::warn!(plan = %id, "plan not found");
            return Ok(false);
        };
        let approved = plan.is_approved();
        tracing::debug!(plan = %id, approved, status = %plan.status, "approval check");
        Ok(approved)
    }

    /// Fail with [`ApprovalError::NotApproved`] unless the plan is approved.
    pub fn require_approval(&self, id: &str) -> Result<()> {
        if self.check_approval(id)? {
            Ok(())
        } else {
            Err(ApprovalError::NotApproved(id.to_string()))
        }
    }

    /// Move an approved plan to `in_progress`.
    pub fn start_execution(&self, id: &str) -> Result<PlanStatus> {
        if self.get_plan_status(id)?.is_none() {
            return Err(ApprovalError::NotFound(id.to_string()));
        }
        self.require_approval(id)?;
        let status = self.mutate_plan(id, |plan, _| plan.status = PlanState::InProgress)?;
        tracing::info!(plan = %id, "plan execution started");
        Ok(status)
    }

    /// Mark a plan completed.
    pub fn complete(&self, id: &str) -> Result<PlanStatus> {
        let status = self.mutate_plan(id, |plan, _| plan.status = PlanState::Completed)?;
        tracing::info!(plan = %id, "plan completed");
        Ok(status)
    }
}
