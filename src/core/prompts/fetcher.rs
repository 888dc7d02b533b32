//! Builds system prompts from the Cline repository's prompt components.

use std::sync::LazyLock;
use std::time::Duration;

use futures::future::try_join_all;
use mode_core::Mode;
use regex::Regex;

use super::PromptError;

/// Raw file host for the Cline repository.
pub const DEFAULT_RAW_BASE: &str = "https://raw.githubusercontent.com/cline/cline";

/// GitHub API base for the Cline repository.
pub const DEFAULT_API_BASE: &str = "https://api.github.com/repos/cline/cline";

/// Directory holding the prompt components.
pub const COMPONENTS_PATH: &str = "src/core/prompts/system-prompt/components";

/// Per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Version used when the latest commit cannot be resolved.
pub const FALLBACK_VERSION: &str = "main";

/// Separator between prompt sections.
pub const SECTION_SEPARATOR: &str = "\n\n====\n\n";

/// Prompt component files, in prompt order.
pub const COMPONENTS: &[&str] = &[
    "agent_role.ts",
    "act_vs_plan_mode.ts",
    "objective.ts",
    "capabilities.ts",
    "rules.ts",
    "editing_files.ts",
    "tool_use/index.ts",
    "task_progress.ts",
    "skills.ts",
    "mcp.ts",
    "system_info.ts",
    "user_instructions.ts",
    "feedback.ts",
];

static TEMPLATE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"const\s+get\w+TemplateText\s*=\s*\([^)]*\)\s*=>\s*`([\s\S]*?)`\s*(?:export|const|function|$)",
    )
    .ok()
});

static LITERAL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"`([\s\S]*?)`").ok());

/// Source of every component file, in prompt order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptComponents {
    pub version: String,
    pub sources: Vec<String>,
}

/// Extract the prompt template from a component's TypeScript source.
///
/// Prefers a `const getXxxTemplateText = (..) => \`...\`` definition and
/// falls back to the first template literal. Returns an empty string when
/// neither is present.
#[must_use]
pub fn extract_template_text(source: &str) -> String {
    [&*TEMPLATE_RE, &*LITERAL_RE]
        .into_iter()
        .flatten()
        .find_map(|re| re.captures(source).and_then(|c| c.get(1)))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Join the non-empty templates of all components.
#[must_use]
pub fn build_prompt(components: &PromptComponents) -> String {
    components
        .sources
        .iter()
        .map(|source| extract_template_text(source))
        .filter(|section| !section.is_empty())
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR)
}

/// Short mode statement placed ahead of the shared components.
#[must_use]
pub const fn mode_preamble(mode: Mode) -> &'static str {
    match mode {
        Mode::Plan => {
            "You are in PLAN MODE. Gather information, ask clarifying questions and \
             produce a detailed, step-by-step implementation plan. Do not modify files \
             or run commands that change the system."
        }
        Mode::Act => {
            "You are in ACT MODE. Execute the approved plan step by step with full tool \
             access, verifying each step and reporting progress as you go."
        }
    }
}

/// Prompt for `mode` built from fetched components.
#[must_use]
pub fn build_mode_prompt(mode: Mode, components: &PromptComponents) -> String {
    let body = build_prompt(components);
    if body.is_empty() {
        mode_preamble(mode).to_string()
    } else {
        format!("{}{SECTION_SEPARATOR}{body}", mode_preamble(mode))
    }
}

/// HTTP client for the Cline repository.
#[derive(Debug, Clone)]
pub struct ClineFetcher {
    client: reqwest::Client,
    raw_base: String,
    api_base: String,
}

impl Default for ClineFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ClineFetcher {
    /// Fetcher against GitHub.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_urls(DEFAULT_RAW_BASE, DEFAULT_API_BASE, DEFAULT_TIMEOUT)
    }

    /// Fetcher against custom hosts.
    #[must_use]
    pub fn with_base_urls(raw_base: &str, api_base: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cline-mode/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            client,
            raw_base: raw_base.trim_end_matches('/').to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_file(&self, path: &str, version: &str) -> Result<String, PromptError> {
        let url = format!("{}/{version}/{path}", self.raw_base);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| PromptError::Fetch {
                path: path.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            tracing::warn!(url = %url, status = %response.status(), "prompt component fetch failed");
            return Err(PromptError::Status {
                path: path.to_string(),
                status: response.status().as_u16(),
            });
        }

        response.text().await.map_err(|source| PromptError::Fetch {
            path: path.to_string(),
            source,
        })
    }

    /// Fetch every component at `version`. Fails if any single file fails.
    pub async fn fetch_components(&self, version: &str) -> Result<PromptComponents, PromptError> {
        tracing::info!(version, "fetching Cline prompt components");

        let sources = try_join_all(COMPONENTS.iter().map(|file| {
            let path = format!("{COMPONENTS_PATH}/{file}");
            async move { self.fetch_file(&path, version).await }
        }))
        .await?;

        Ok(PromptComponents {
            version: version.to_string(),
            sources,
        })
    }

    /// Short hash of the newest commit on `main`, or `main` if it cannot be resolved.
    pub async fn latest_version(&self) -> String {
        let url = format!("{}/commits/main", self.api_base);

        let sha = async {
            let response = self.client.get(&url).send().await.ok()?;
            if !response.status().is_success() {
                return None;
            }
            let json: serde_json::Value = response.json().await.ok()?;
            json.get("sha")?.as_str().map(|sha| sha.chars().take(7).collect::<String>())
        }
        .await;

        sha.filter(|s| !s.is_empty()).unwrap_or_else(|| {
            tracing::warn!(url = %url, "failed to resolve latest Cline version, using main");
            FALLBACK_VERSION.to_string()
        })
    }

    /// Resolve `latest` to a concrete version.
    pub async fn resolve_version(&self, requested: &str) -> String {
        if requested == "latest" {
            self.latest_version().await
        } else {
            requested.to_string()
        }
    }
}
