//! System prompts for the two mode agents.
//!
//! Prompts come from local markdown files or are built from the Cline
//! repository, optionally through an on-disk cache. Whatever the source, tool
//! names are rewritten into the host's vocabulary before use.

pub mod cache;
pub mod fetcher;

use std::path::{Path, PathBuf};

use mode_core::Mode;
use mode_core::tools::adapt_prompt_tool_names;
use serde::Serialize;
use thiserror::Error;

pub use cache::{CacheStats, PromptCache};
pub use fetcher::{ClineFetcher, PromptComponents};

use crate::config::{self, PluginConfig, PromptSource};

/// Plan prompt shipped with the binary.
pub const BUNDLED_PLAN_PROMPT: &str = include_str!("../../../prompts/plan.md");

/// Act prompt shipped with the binary.
pub const BUNDLED_ACT_PROMPT: &str = include_str!("../../../prompts/act.md");

/// Prompt loading errors.
#[derive(Debug, Error)]
pub enum PromptError {
    /// Request failed (connection, timeout, body).
    #[error("failed to fetch {path}: {source}")]
    Fetch {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status.
    #[error("failed to fetch {path}: HTTP {status}")]
    Status { path: String, status: u16 },

    /// Local prompt file could not be read.
    #[error("failed to load local prompt {path}: {source}")]
    Local {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where a prompt set was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PromptOrigin {
    Local,
    Github,
    Cache,
}

impl std::fmt::Display for PromptOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::Github => "github",
            Self::Cache => "cache",
        })
    }
}

/// Adapted prompts for both modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct PromptSet {
    pub plan: String,
    pub act: String,
    pub source: PromptOrigin,
}

impl PromptSet {
    /// Prompt for a mode.
    #[must_use]
    pub fn for_mode(&self, mode: Mode) -> &str {
        match mode {
            Mode::Plan => &self.plan,
            Mode::Act => &self.act,
        }
    }

    fn adapted(plan: &str, act: &str, source: PromptOrigin) -> Self {
        Self {
            plan: adapt_prompt_tool_names(plan).into_owned(),
            act: adapt_prompt_tool_names(act).into_owned(),
            source,
        }
    }
}

/// Directories searched for `plan.md` and `act.md`, in order.
#[must_use]
pub fn prompt_dir_candidates(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = explicit {
        candidates.push(dir.to_path_buf());
    }
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(exe_dir.join("prompts"));
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("prompts"));
    }
    if let Ok(config_dir) = config::opencode_config_dir() {
        candidates.push(
            config_dir
                .join("plugins")
                .join("opencode-cline-mode")
                .join("prompts"),
        );
    }
    if let Ok(data_dir) = config::data_dir() {
        candidates.push(data_dir.join("prompts"));
    }
    candidates
}

/// First existing prompt directory.
#[must_use]
pub fn resolve_prompts_dir(explicit: Option<&Path>) -> Option<PathBuf> {
    prompt_dir_candidates(explicit)
        .into_iter()
        .find(|dir| dir.is_dir())
}

/// Loads prompts according to the configured source.
#[derive(Debug, Clone)]
pub struct PromptLoader {
    source: PromptSource,
    version: String,
    fallback_to_local: bool,
    cache: PromptCache,
    fetcher: ClineFetcher,
    local_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Loader for a project, caching under `<project>/.cline-cache`.
    #[must_use]
    pub fn new(config: &PluginConfig, project_dir: &Path) -> Self {
        Self {
            source: config.prompt_source,
            version: config.cline_version.clone(),
            fallback_to_local: config.fallback_to_local,
            cache: PromptCache::new(config::cache_dir(project_dir), config.cache_ttl()),
            fetcher: ClineFetcher::new(),
            local_dir: None,
        }
    }

    /// Use a different fetcher.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: ClineFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Search this directory before the default prompt locations.
    #[must_use]
    pub fn with_local_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_dir = Some(dir.into());
        self
    }

    /// Prompt cache.
    #[must_use]
    pub const fn cache(&self) -> &PromptCache {
        &self.cache
    }

    /// Load both prompts.
    ///
    /// # Errors
    ///
    /// Returns an error if local prompt files cannot be read, or if fetching
    /// fails and falling back to local prompts is disabled.
    pub async fn load(&self) -> Result<PromptSet, PromptError> {
        let (plan, act, origin) = match self.source {
            PromptSource::Local => {
                let (plan, act) = self.load_local()?;
                (plan, act, PromptOrigin::Local)
            }
            PromptSource::Github => self.fetch_or_fallback().await?,
            PromptSource::Auto => match self.load_cached().await {
                Some((plan, act)) => (plan, act, PromptOrigin::Cache),
                None => self.fetch_or_fallback().await?,
            },
        };

        tracing::info!(source = %origin, "prompts loaded and adapted");
        Ok(PromptSet::adapted(&plan, &act, origin))
    }

    /// Plan and act prompts from the first prompt directory found, or the
    /// bundled copies if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if a prompt directory exists but a file in it cannot be read.
    pub fn load_local(&self) -> Result<(String, String), PromptError> {
        let Some(dir) = resolve_prompts_dir(self.local_dir.as_deref()) else {
            tracing::debug!("no prompt directory found, using bundled prompts");
            return Ok((BUNDLED_PLAN_PROMPT.to_string(), BUNDLED_ACT_PROMPT.to_string()));
        };

        tracing::info!(dir = %dir.display(), "loading prompts from local files");
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read_to_string(&path).map_err(|source| PromptError::Local { path, source })
        };
        Ok((read("plan.md")?, read("act.md")?))
    }

    async fn load_cached(&self) -> Option<(String, String)> {
        let version = self.fetcher.resolve_version(&self.version).await;
        let plan = self.cache.get(Mode::Plan, &version)?;
        let act = self.cache.get(Mode::Act, &version)?;
        tracing::info!(version = %version, "loaded prompts from cache");
        Some((plan, act))
    }

    async fn fetch(&self) -> Result<(String, String), PromptError> {
        let version = self.fetcher.resolve_version(&self.version).await;
        let components = self.fetcher.fetch_components(&version).await?;

        let plan = fetcher::build_mode_prompt(Mode::Plan, &components);
        let act = fetcher::build_mode_prompt(Mode::Act, &components);
        self.cache.set(Mode::Plan, &version, &plan);
        self.cache.set(Mode::Act, &version, &act);
        Ok((plan, act))
    }

    async fn fetch_or_fallback(&self) -> Result<(String, String, PromptOrigin), PromptError> {
        match self.fetch().await {
            Ok((plan, act)) => Ok((plan, act, PromptOrigin::Github)),
            Err(e) if self.fallback_to_local => {
                tracing::warn!(error = %e, "GitHub fetch failed, falling back to local prompts");
                let (plan, act) = self.load_local()?;
                Ok((plan, act, PromptOrigin::Local))
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to get prompts");
                Err(e)
            }
        }
    }

    /// Remove every cached prompt.
    pub fn clear_cache(&self) -> usize {
        self.cache.clear()
    }

    /// Cache statistics.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config(source: PromptSource) -> PluginConfig {
        PluginConfig {
            prompt_source: source,
            cline_version: "v1".to_string(),
            ..PluginConfig::default()
        }
    }

    fn local_prompts(dir: &Path) -> PathBuf {
        let prompts = dir.join("my-prompts");
        std::fs::create_dir_all(&prompts).unwrap();
        std::fs::write(prompts.join("plan.md"), "Plan with `read_file`").unwrap();
        std::fs::write(prompts.join("act.md"), "Act with <execute_command>").unwrap();
        prompts
    }

    async fn github(server: &MockServer) -> ClineFetcher {
        for file in fetcher::COMPONENTS {
            Mock::given(method("GET"))
                .and(path(format!("/v1/{}/{file}", fetcher::COMPONENTS_PATH)))
                .respond_with(ResponseTemplate::new(200).set_body_string(
                    "const getRulesTemplateText = () => `Use write_to_file: now`\nexport {}",
                ))
                .mount(server)
                .await;
        }
        ClineFetcher::with_base_urls(&server.uri(), &server.uri(), Duration::from_secs(5))
    }

    #[test]
    fn bundled_prompts_are_not_empty() {
        assert!(BUNDLED_PLAN_PROMPT.contains("PLAN MODE"));
        assert!(BUNDLED_ACT_PROMPT.contains("ACT MODE"));
    }

    #[tokio::test]
    async fn local_prompts_are_adapted() {
        let dir = tempfile::tempdir().unwrap();
        let prompts = local_prompts(dir.path());
        let loader = PromptLoader::new(&config(PromptSource::Local), dir.path()).with_local_dir(prompts);

        let set = loader.load().await.unwrap();

        assert_eq!(set.source, PromptOrigin::Local);
        assert_eq!(set.plan, "Plan with `read`");
        assert_eq!(set.for_mode(Mode::Act), "Act with <bash>");
    }

    #[tokio::test]
    async fn unreadable_local_prompt_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let prompts = dir.path().join("partial");
        std::fs::create_dir_all(&prompts).unwrap();
        std::fs::write(prompts.join("plan.md"), "plan").unwrap();
        let loader = PromptLoader::new(&config(PromptSource::Local), dir.path()).with_local_dir(prompts);

        let err = loader.load().await.unwrap_err();
        assert!(matches!(err, PromptError::Local { .. }));
    }

    #[tokio::test]
    async fn github_source_fetches_and_caches() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let loader =
            PromptLoader::new(&config(PromptSource::Github), dir.path()).with_fetcher(github(&server).await);

        let set = loader.load().await.unwrap();

        assert_eq!(set.source, PromptOrigin::Github);
        assert!(set.plan.starts_with("You are in PLAN MODE"));
        assert!(set.act.ends_with("Use write: now"));
        assert!(loader.cache().has(Mode::Plan, "v1"));
        assert_eq!(loader.cache_stats().valid_entries, 2);
    }

    #[tokio::test]
    async fn auto_source_prefers_cache() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let loader = PromptLoader::new(&config(PromptSource::Auto), dir.path())
            .with_fetcher(ClineFetcher::with_base_urls(
                &server.uri(),
                &server.uri(),
                Duration::from_secs(5),
            ));
        loader.cache().set(Mode::Plan, "v1", "cached `read_file`");
        loader.cache().set(Mode::Act, "v1", "cached act");

        let set = loader.load().await.unwrap();

        assert_eq!(set.source, PromptOrigin::Cache);
        assert_eq!(set.plan, "cached `read`");
    }

    #[tokio::test]
    async fn failed_fetch_falls_back_to_local() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let prompts = local_prompts(dir.path());
        let fetcher = ClineFetcher::with_base_urls(&server.uri(), &server.uri(), Duration::from_secs(5));
        let loader = PromptLoader::new(&config(PromptSource::Auto), dir.path())
            .with_fetcher(fetcher)
            .with_local_dir(prompts);

        let set = loader.load().await.unwrap();

        assert_eq!(set.source, PromptOrigin::Local);
        assert_eq!(loader.cache_stats().total_entries, 0);
    }

    #[tokio::test]
    async fn failed_fetch_without_fallback_is_an_error() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let config = PluginConfig {
            fallback_to_local: false,
            ..config(PromptSource::Github)
        };
        let fetcher = ClineFetcher::with_base_urls(&server.uri(), &server.uri(), Duration::from_secs(5));
        let loader = PromptLoader::new(&config, dir.path()).with_fetcher(fetcher);

        let err = loader.load().await.unwrap_err();
        assert!(matches!(err, PromptError::Status { status: 404, .. }));
    }

    #[test]
    fn explicit_dir_is_searched_first() {
        let dir = tempfile::tempdir().unwrap();
        let candidates = prompt_dir_candidates(Some(dir.path()));
        assert_eq!(candidates[0], dir.path());
        assert_eq!(resolve_prompts_dir(Some(dir.path())).as_deref(), Some(dir.path()));
    }
}
