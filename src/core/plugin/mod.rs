//! Host plugin hooks.
//!
//! [`PluginHooks`] is the surface a host calls into: configuration, the
//! per-turn messages transform, the system prompt, chat messages, tools and
//! slash commands. [`ClineModePlugin`] implements it for the plan/act modes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mode_core::banner::START_ACT_TOOL;
use mode_core::{
    ACT_AGENT, ChatMessage, Mode, TracingSink, TransformOptions, TransformOutcome,
    TransformOutput, transform,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::{self, PluginConfig};
use crate::core::agents;
use crate::core::approval::PlanStatusStore;
use crate::core::commands::CommandDispatcher;
use crate::core::prompts::{PromptLoader, PromptSet};

/// Name of the tool that switches to the act agent.
pub const EXECUTE_PLAN_TOOL: &str = "execute-plan";

/// Tool definition exposed to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// Parameters as a JSON Schema object.
    #[schema(value_type = Object)]
    pub input_schema: Value,
}

/// Event the host should publish on the plugin's behalf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HostEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[schema(value_type = Object)]
    pub properties: Value,
}

impl HostEvent {
    /// Ask the TUI to cycle to the next agent.
    #[must_use]
    pub fn agent_cycle() -> Self {
        Self {
            kind: "tui.command.execute".to_string(),
            properties: json!({ "command": "agent.cycle" }),
        }
    }

    /// Show a toast notification.
    #[must_use]
    pub fn toast(title: &str, message: &str, variant: &str) -> Self {
        Self {
            kind: "tui.toast.show".to_string(),
            properties: json!({ "title": title, "message": message, "variant": variant }),
        }
    }
}

/// Tool execution result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ToolResult {
    pub output: String,
    pub is_error: bool,
    /// Events to publish after the tool returns.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<HostEvent>,
}

/// Hooks a host invokes on a plugin.
#[async_trait]
pub trait PluginHooks: Send + Sync {
    /// Plugin name.
    fn name(&self) -> &str;

    /// Called once the plugin is ready.
    async fn on_load(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Adjust the host configuration object in place.
    async fn on_config(&self, _config: &mut Value) -> anyhow::Result<()> {
        Ok(())
    }

    /// Transform the transcript in a messages-transform payload.
    ///
    /// Must not fail; malformed payloads are left untouched.
    async fn on_messages_transform(&self, _output: &mut Value) -> Vec<HostEvent> {
        Vec::new()
    }

    /// Adjust the system prompt for a turn handled by `agent`.
    async fn on_system(&self, _agent: Option<&str>, _system: &mut Vec<String>) {}

    /// Called for every chat message.
    async fn on_chat_message(&self, _agent: Option<&str>, _session_id: Option<&str>) {}

    /// Tools provided by this plugin.
    fn tools(&self) -> Vec<ToolDefinition> {
        Vec::new()
    }

    /// Execute a tool.
    async fn execute_tool(&self, name: &str, _args: Value) -> anyhow::Result<ToolResult> {
        anyhow::bail!("tool not found: {name}")
    }

    /// Run a slash command, returning the message for the user.
    async fn execute_command(&self, name: &str, _args: &str) -> String {
        format!("❌ unknown command: {name}")
    }
}

/// Plan/act mode plugin for one project directory.
pub struct ClineModePlugin {
    directory: PathBuf,
    config: PluginConfig,
    prompts: PromptSet,
    commands: CommandDispatcher,
}

impl ClineModePlugin {
    /// Load configuration and prompts for `directory`.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompts cannot be loaded.
    pub async fn load(directory: &Path) -> crate::core::Result<Self> {
        let config = PluginConfig::load(directory);
        let prompts = PromptLoader::new(&config, directory).load().await?;
        tracing::info!(
            directory = %directory.display(),
            source = %prompts.source,
            plan_len = prompts.plan.len(),
            act_len = prompts.act.len(),
            "cline-mode plugin initialized"
        );
        Ok(Self::new(directory, config, prompts))
    }

    /// Assemble a plugin from already loaded parts.
    #[must_use]
    pub fn new(directory: &Path, config: PluginConfig, prompts: PromptSet) -> Self {
        let store = PlanStatusStore::new(config::plans_dir(directory));
        Self {
            directory: directory.to_path_buf(),
            config,
            prompts,
            commands: CommandDispatcher::new(store),
        }
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    #[must_use]
    pub const fn config(&self) -> &PluginConfig {
        &self.config
    }

    #[must_use]
    pub const fn prompts(&self) -> &PromptSet {
        &self.prompts
    }

    #[must_use]
    pub const fn commands(&self) -> &CommandDispatcher {
        &self.commands
    }

    /// Run the transform engine with this plugin's options.
    pub fn transform_messages(&self, messages: &mut [ChatMessage]) -> TransformOutcome {
        let sink = TracingSink;
        let options = TransformOptions {
            enable_execute_command: self.config.enable_execute_command,
            enable_plan_approval: self.config.enable_plan_approval,
            diagnostics: Some(&sink),
        };
        transform(messages, &options)
    }

    fn completion_events(&self, outcome: TransformOutcome) -> Vec<HostEvent> {
        if outcome.completion_appended && self.config.show_completion_toast {
            vec![HostEvent::toast(
                "Plan complete",
                "Review the plan, then switch to cline-act to execute it.",
                "success",
            )]
        } else {
            Vec::new()
        }
    }
}

#[async_trait]
impl PluginHooks for ClineModePlugin {
    fn name(&self) -> &str {
        "cline-mode"
    }

    async fn on_config(&self, config: &mut Value) -> anyhow::Result<()> {
        agents::apply_to_host_config(config, &self.prompts.plan, &self.prompts.act, &self.config);
        Ok(())
    }

    async fn on_messages_transform(&self, output: &mut Value) -> Vec<HostEvent> {
        let Some(mut parsed) = TransformOutput::from_value(output) else {
            tracing::warn!("invalid transform output structure, leaving it untouched");
            return Vec::new();
        };

        let outcome = self.transform_messages(&mut parsed.messages);
        if !outcome.changed() {
            return Vec::new();
        }

        match (serde_json::to_value(&parsed.messages), output.as_object_mut()) {
            (Ok(messages), Some(object)) => {
                object.insert("messages".to_string(), messages);
                self.completion_events(outcome)
            }
            (Err(e), _) => {
                tracing::warn!(error = %e, "failed to write transformed messages");
                Vec::new()
            }
            (_, None) => Vec::new(),
        }
    }

    async fn on_system(&self, agent: Option<&str>, system: &mut Vec<String>) {
        let Some(mode) = agent.and_then(Mode::from_agent_name) else {
            return;
        };
        let prompt = self.prompts.for_mode(mode);
        if !system.iter().any(|s| s == prompt) {
            tracing::debug!(agent = mode.agent_name(), "adding mode prompt to system");
            system.push(prompt.to_string());
        }
    }

    async fn on_chat_message(&self, agent: Option<&str>, session_id: Option<&str>) {
        if let Some(mode) = agent.and_then(Mode::from_agent_name) {
            tracing::info!(agent = mode.agent_name(), session = ?session_id, "mode agent activated");
        }
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        if !self.config.enable_execute_command {
            return Vec::new();
        }
        let no_args = json!({ "type": "object", "properties": {} });
        vec![
            ToolDefinition {
                name: EXECUTE_PLAN_TOOL.to_string(),
                description: "Switch to cline-act agent and execute the plan".to_string(),
                input_schema: no_args.clone(),
            },
            ToolDefinition {
                name: START_ACT_TOOL.to_string(),
                description: "Switch from cline-plan to cline-act to start executing".to_string(),
                input_schema: no_args,
            },
        ]
    }

    async fn execute_tool(&self, name: &str, _args: Value) -> anyhow::Result<ToolResult> {
        if !self.config.enable_execute_command {
            anyhow::bail!("tool not found: {name}");
        }
        let output = match name {
            EXECUTE_PLAN_TOOL => "✅ Switching to cline-act agent...".to_string(),
            START_ACT_TOOL => format!(
                "✅ Switching to `{ACT_AGENT}`...\n\n\
                 If the agent did not change, switch manually:\n\
                 1. Press `Tab`\n\
                 2. Select `{ACT_AGENT}`\n\
                 3. Ask it to execute the plan"
            ),
            _ => anyhow::bail!("tool not found: {name}"),
        };
        tracing::info!(tool = name, "switching to act agent");
        Ok(ToolResult {
            output,
            is_error: false,
            events: vec![HostEvent::agent_cycle()],
        })
    }

    async fn execute_command(&self, name: &str, args: &str) -> String {
        self.commands.execute(name, args)
    }
}
