//! Implementation plan documents.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// File name of the rendered plan inside the plans directory.
pub const PLAN_FILE_NAME: &str = "implementation_plan.md";

/// Kind of change a task makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
    Read,
    Command,
}

/// Risk classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

/// Progress of a single task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

/// One step of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanTask {
    pub id: String,
    pub title: String,
    pub operation: Operation,
    pub target: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub verification: String,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
}

/// A file touched by the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    /// Why the file changes, or what a new file is for.
    pub reason: String,
}

/// Files the plan touches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImpactScope {
    pub modified_files: Vec<FileChange>,
    pub new_files: Vec<FileChange>,
    pub deleted_files: Vec<FileChange>,
}

/// A risk and how to handle it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Risk {
    pub description: String,
    pub mitigation: String,
}

/// Risks grouped by severity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Risks {
    pub high: Vec<Risk>,
    pub medium: Vec<Risk>,
    pub low: Vec<Risk>,
}

/// An approach that was considered and not chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternative {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
}

/// A structured implementation plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplementationPlan {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_plan_status")]
    pub status: String,
    #[serde(default = "default_plan_version")]
    pub version: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub impact_scope: ImpactScope,
    #[serde(default)]
    pub tasks: Vec<PlanTask>,
    #[serde(default)]
    pub risks: Risks,
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

fn default_plan_status() -> String {
    "draft".to_string()
}

fn default_plan_version() -> String {
    "1.0".to_string()
}

impl ImplementationPlan {
    /// Render the plan as markdown.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Implementation Plan: {}\n", self.title);
        let _ = writeln!(out, "**ID**: {}", self.id);
        let _ = writeln!(out, "**Created**: {}", self.created_at.to_rfc3339());
        let _ = writeln!(out, "**Status**: {}", self.status);
        let _ = writeln!(out, "**Version**: {}\n", self.version);
        out.push_str("---\n\n");

        let _ = writeln!(out, "## 📊 Overview\n\n{}\n", self.overview);

        out.push_str("## 🎯 Goals\n\n");
        for (i, goal) in self.goals.iter().enumerate() {
            let _ = writeln!(out, "{}. {goal}", i + 1);
        }
        out.push('\n');

        out.push_str("## 📁 Impact Scope\n\n");
        let scope = &self.impact_scope;
        for (heading, files) in [
            ("Modified files", &scope.modified_files),
            ("New files", &scope.new_files),
            ("Deleted files", &scope.deleted_files),
        ] {
            if files.is_empty() {
                continue;
            }
            let _ = writeln!(out, "**{heading}**:");
            for file in files {
                let _ = writeln!(out, "- `{}` - {}", file.path, file.reason);
            }
            out.push('\n');
        }

        out.push_str("## 📝 Steps\n\n");
        for (i, task) in self.tasks.iter().enumerate() {
            let _ = writeln!(out, "### Task {}: {}", i + 1, task.title);
            let _ = writeln!(out, "- **Operation**: {}", label(&task.operation));
            let _ = writeln!(out, "- **Target**: {}", task.target);
            let _ = writeln!(out, "- **Description**: {}", task.description);
            let _ = writeln!(out, "- **Verification**: {}", task.verification);
            let _ = writeln!(out, "- **Risk**: {}", label(&task.risk_level));
            let _ = writeln!(out, "- **Status**: {}", label(&task.status));
            if let Some(estimate) = &task.estimated_time {
                let _ = writeln!(out, "- **Estimate**: {estimate}");
            }
            out.push('\n');
        }

        out.push_str("## ⚠️ Risks\n\n");
        for (heading, risks) in [
            ("High", &self.risks.high),
            ("Medium", &self.risks.medium),
            ("Low", &self.risks.low),
        ] {
            if risks.is_empty() {
                continue;
            }
            let _ = writeln!(out, "### {heading}");
            for risk in risks {
                let _ = writeln!(out, "- {} - {}", risk.description, risk.mitigation);
            }
            out.push('\n');
        }

        if !self.alternatives.is_empty() {
            out.push_str("## 🔄 Alternatives\n\n");
            for (letter, alt) in ('A'..='Z').zip(&self.alternatives) {
                let _ = writeln!(out, "### Option {letter}: {}\n{}\n", alt.name, alt.description);
                out.push_str("**Pros**:\n");
                for pro in &alt.pros {
                    let _ = writeln!(out, "- {pro}");
                }
                out.push_str("\n**Cons**:\n");
                for con in &alt.cons {
                    let _ = writeln!(out, "- {con}");
                }
                out.push('\n');
            }
        }

        out.push_str("## ✅ Acceptance Criteria\n\n");
        for criterion in &self.acceptance_criteria {
            let _ = writeln!(out, "- [ ] {criterion}");
        }
        out.push('\n');

        if !self.dependencies.is_empty() {
            out.push_str("## 📌 Dependencies\n\n");
            for dep in &self.dependencies {
                let _ = writeln!(out, "- {dep}");
            }
            out.push('\n');
        }

        out.push_str("---\n\n## 📜 History\n\n");
        out.push_str("| Date | Version | Change | Author |\n");
        out.push_str("|------|---------|--------|--------|\n");
        let _ = write!(
            out,
            "| {} | {} | Initial version | AI |",
            self.created_at.format("%Y-%m-%d"),
            self.version
        );

        out
    }
}

/// Lowercase serde name of a unit enum variant.
fn label<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(ToString::to_string))
        .unwrap_or_default()
}

/// Writes plan documents into a plans directory.
#[derive(Debug, Clone)]
pub struct PlanManager {
    plans_dir: PathBuf,
}

impl PlanManager {
    /// Create a plan manager over a plans directory.
    #[must_use]
    pub fn new(plans_dir: impl Into<PathBuf>) -> Self {
        Self {
            plans_dir: plans_dir.into(),
        }
    }

    /// Plans directory.
    #[must_use]
    pub fn plans_dir(&self) -> &Path {
        &self.plans_dir
    }

    /// Path the rendered plan is written to.
    #[must_use]
    pub fn plan_path(&self) -> PathBuf {
        self.plans_dir.join(PLAN_FILE_NAME)
    }

    /// New plan id of the form `plan-YYYY-MM-DD-<millis>`.
    #[must_use]
    pub fn generate_plan_id() -> String {
        Self::plan_id_at(Utc::now())
    }

    /// Plan id for a given instant.
    #[must_use]
    pub fn plan_id_at(now: DateTime<Utc>) -> String {
        format!("plan-{}-{}", now.format("%Y-%m-%d"), now.timestamp_millis())
    }

    /// Check if `path` is a markdown file inside the plans directory.
    #[must_use]
    pub fn is_plan_path(&self, path: &Path) -> bool {
        path.starts_with(&self.plans_dir) && path.extension().is_some_and(|e| e == "md")
    }

    /// Create the plans directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_plans_dir(&self) -> std::io::Result<&Path> {
        std::fs::create_dir_all(&self.plans_dir)?;
        Ok(&self.plans_dir)
    }

    /// Render `plan` to `implementation_plan.md` and return its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_plan(&self, plan: &ImplementationPlan) -> std::io::Result<PathBuf> {
        self.ensure_plans_dir()?;
        let path = self.plan_path();
        std::fs::write(&path, plan.to_markdown())?;
        tracing::info!(plan = %plan.id, path = %path.display(), "plan written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn task(id: &str, title: &str, status: TaskStatus) -> PlanTask {
        PlanTask {
            id: id.to_string(),
            title: title.to_string(),
            operation: Operation::Update,
            target: "src/lib.rs".to_string(),
            description: "Change it".to_string(),
            verification: "cargo test".to_string(),
            risk_level: RiskLevel::Medium,
            status,
            estimated_time: None,
        }
    }

    fn sample_plan() -> ImplementationPlan {
        ImplementationPlan {
            id: "plan-2025-01-02-1735776000000".to_string(),
            title: "Add greeting".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap(),
            status: "draft".to_string(),
            version: "1.0".to_string(),
            overview: "Print hello".to_string(),
            goals: vec!["Say hello".to_string()],
            impact_scope: ImpactScope {
                new_files: vec![FileChange {
                    path: "src/hello.rs".to_string(),
                    reason: "greeting".to_string(),
                }],
                ..Default::default()
            },
            tasks: vec![task("1", "Write hello", TaskStatus::InProgress)],
            risks: Risks::default(),
            alternatives: vec![Alternative {
                name: "Macro".to_string(),
                description: "Use a macro".to_string(),
                pros: vec!["short".to_string()],
                cons: vec!["opaque".to_string()],
            }],
            acceptance_criteria: vec!["prints hello".to_string()],
            dependencies: Vec::new(),
        }
    }

    #[test]
    fn plan_id_format() {
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
        assert_eq!(PlanManager::plan_id_at(at), "plan-2025-01-02-1735776000000");
        assert!(PlanManager::generate_plan_id().starts_with("plan-"));
    }

    #[test]
    fn markdown_has_sections() {
        let md = sample_plan().to_markdown();
        assert!(md.starts_with("# Implementation Plan: Add greeting"));
        assert!(md.contains("1. Say hello"));
        assert!(md.contains("**New files**:\n- `src/hello.rs` - greeting"));
        assert!(!md.contains("**Modified files**"));
        assert!(md.contains("### Task 1: Write hello"));
        assert!(md.contains("- **Status**: in_progress"));
        assert!(md.contains("- **Risk**: medium"));
        assert!(md.contains("### Option A: Macro"));
        assert!(md.contains("- [ ] prints hello"));
        assert!(!md.contains("Dependencies"));
        assert!(md.ends_with("| 2025-01-02 | 1.0 | Initial version | AI |"));
    }

    #[test]
    fn write_plan_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let manager = PlanManager::new(dir.path().join("plans"));

        let path = manager.write_plan(&sample_plan()).unwrap();

        assert!(path.ends_with(PLAN_FILE_NAME));
        assert!(manager.is_plan_path(&path));
        assert!(!manager.is_plan_path(&dir.path().join("other.md")));
        assert!(!manager.is_plan_path(&manager.plans_dir().join("plan-status.json")));
    }

    #[test]
    fn plan_deserializes_with_defaults() {
        let plan: ImplementationPlan = serde_json::from_value(serde_json::json!({
            "id": "plan-x",
            "title": "T",
            "createdAt": "2025-01-02T00:00:00Z",
            "tasks": [{ "id": "1", "title": "a", "operation": "command", "target": "make" }]
        }))
        .unwrap();

        assert_eq!(plan.status, "draft");
        assert_eq!(plan.tasks[0].status, TaskStatus::Pending);
        assert_eq!(plan.tasks[0].risk_level, RiskLevel::Low);
    }
}
