//! Agent profiles for the host configuration.

use std::collections::BTreeMap;

use mode_core::Mode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::PluginConfig;

/// Model used when neither the plugin nor the host names one.
pub const INHERIT_MODEL: &str = "inherit";

/// Permission decision for a tool family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PermissionAction {
    Allow,
    Ask,
    Deny,
}

/// Per-pattern permission, serialized as `{"*": action}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PatternPermission {
    #[serde(rename = "*")]
    pub all: PermissionAction,
}

impl PatternPermission {
    const fn all(action: PermissionAction) -> Self {
        Self { all: action }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AgentPermission {
    pub edit: PatternPermission,
    pub bash: PatternPermission,
}

impl AgentPermission {
    /// Permissions for a mode: plan may neither edit nor run commands, act may
    /// edit and asks before running commands.
    #[must_use]
    pub const fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Plan => Self {
                edit: PatternPermission::all(PermissionAction::Deny),
                bash: PatternPermission::all(PermissionAction::Deny),
            },
            Mode::Act => Self {
                edit: PatternPermission::all(PermissionAction::Allow),
                bash: PatternPermission::all(PermissionAction::Ask),
            },
        }
    }
}

/// Agent profile as the host expects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AgentProfile {
    pub mode: String,
    pub model: String,
    pub temperature: f64,
    pub description: String,
    pub permission: AgentPermission,
    pub system: Vec<String>,
}

/// Description shown by the host for a mode agent.
#[must_use]
pub const fn description(mode: Mode) -> &'static str {
    match mode {
        Mode::Plan => "Cline Plan Mode - Analysis and planning without code changes",
        Mode::Act => "Cline Act Mode - Execute plans with full tool access",
    }
}

/// Build the profile for one mode.
#[must_use]
pub fn build_agent(mode: Mode, prompt: &str, config: &PluginConfig, default_model: &str) -> AgentProfile {
    AgentProfile {
        mode: "primary".to_string(),
        model: config.model_for(mode, default_model).to_string(),
        temperature: config.temperature_for(mode),
        description: description(mode).to_string(),
        permission: AgentPermission::for_mode(mode),
        system: vec![prompt.to_string()],
    }
}

/// Both mode agents keyed by agent name.
#[must_use]
pub fn build_mode_agents(
    plan_prompt: &str,
    act_prompt: &str,
    config: &PluginConfig,
    default_model: &str,
) -> BTreeMap<String, AgentProfile> {
    [(Mode::Plan, plan_prompt), (Mode::Act, act_prompt)]
        .into_iter()
        .map(|(mode, prompt)| {
            (
                mode.agent_name().to_string(),
                build_agent(mode, prompt, config, default_model),
            )
        })
        .collect()
}

/// Install the mode agents into a host configuration object.
///
/// With `replace_default_agents` the host's agents are replaced and
/// `default_agent` is set to the configured mode agent. Otherwise the mode
/// agents are added next to the existing ones, overriding any with the same
/// name. Other fields of the host configuration are left untouched; a
/// non-object `config` is replaced by an object.
pub fn apply_to_host_config(
    host: &mut Value,
    plan_prompt: &str,
    act_prompt: &str,
    config: &PluginConfig,
) {
    if !host.is_object() {
        tracing::warn!("host config is not an object, starting from an empty one");
        *host = Value::Object(Map::new());
    }
    let Value::Object(host) = host else {
        return;
    };

    let default_model = host
        .get("model")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or(INHERIT_MODEL)
        .to_string();

    let agents: Map<String, Value> = build_mode_agents(plan_prompt, act_prompt, config, &default_model)
        .into_iter()
        .filter_map(|(name, profile)| serde_json::to_value(profile).ok().map(|v| (name, v)))
        .collect();

    if config.replace_default_agents {
        let default_agent = if agents.contains_key(config.default_agent.agent_name()) {
            config.default_agent.agent_name()
        } else {
            Mode::Plan.agent_name()
        };
        tracing::info!(
            agents = ?agents.keys().collect::<Vec<_>>(),
            default_agent,
            "default agents replaced with mode agents"
        );
        host.insert("agent".to_string(), Value::Object(agents));
        host.insert("default_agent".to_string(), Value::String(default_agent.to_string()));
    } else {
        let mut merged = match host.remove("agent") {
            Some(Value::Object(existing)) => existing,
            _ => Map::new(),
        };
        merged.extend(agents);
        tracing::info!(
            agents = ?merged.keys().collect::<Vec<_>>(),
            "mode agents added alongside existing agents"
        );
        host.insert("agent".to_string(), Value::Object(merged));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn profiles_follow_config() {
        let config = PluginConfig {
            plan_model: "anthropic/plan".to_string(),
            ..PluginConfig::default()
        };
        let agents = build_mode_agents("P", "A", &config, "host/model");

        let plan = &agents["cline-plan"];
        assert_eq!(plan.model, "anthropic/plan");
        assert!((plan.temperature - 0.1).abs() < f64::EPSILON);
        assert_eq!(plan.system, vec!["P".to_string()]);
        assert_eq!(plan.permission, AgentPermission::for_mode(Mode::Plan));

        let act = &agents["cline-act"];
        assert_eq!(act.model, "host/model");
        assert!((act.temperature - 0.3).abs() < f64::EPSILON);
        assert_eq!(act.mode, "primary");
    }

    #[test]
    fn permission_shape() {
        let value = serde_json::to_value(AgentPermission::for_mode(Mode::Act)).unwrap();
        assert_eq!(value, json!({ "edit": { "*": "allow" }, "bash": { "*": "ask" } }));

        let value = serde_json::to_value(AgentPermission::for_mode(Mode::Plan)).unwrap();
        assert_eq!(value, json!({ "edit": { "*": "deny" }, "bash": { "*": "deny" } }));
    }

    #[test]
    fn replace_drops_existing_agents() {
        let mut host = json!({
            "model": "host/model",
            "theme": "dark",
            "agent": { "build": { "mode": "primary" } },
        });
        let config = PluginConfig {
            default_agent: Mode::Act,
            ..PluginConfig::default()
        };

        apply_to_host_config(&mut host, "P", "A", &config);

        let agents = host["agent"].as_object().unwrap();
        assert_eq!(agents.len(), 2);
        assert!(agents.contains_key("cline-plan"));
        assert_eq!(host["default_agent"], "cline-act");
        assert_eq!(host["theme"], "dark");
        assert_eq!(host["agent"]["cline-act"]["model"], "host/model");
    }

    #[test]
    fn merge_keeps_existing_agents() {
        let mut host = json!({
            "agent": { "build": { "mode": "primary" }, "cline-plan": { "mode": "old" } },
            "default_agent": "build",
        });
        let config = PluginConfig {
            replace_default_agents: false,
            ..PluginConfig::default()
        };

        apply_to_host_config(&mut host, "P", "A", &config);

        let agents = host["agent"].as_object().unwrap();
        assert_eq!(agents.len(), 3);
        assert_eq!(agents["build"], json!({ "mode": "primary" }));
        assert_eq!(agents["cline-plan"]["mode"], "primary");
        assert_eq!(host["default_agent"], "build");
    }

    #[test]
    fn missing_model_inherits() {
        let mut host = json!({});
        apply_to_host_config(&mut host, "P", "A", &PluginConfig::default());

        assert_eq!(host["agent"]["cline-plan"]["model"], INHERIT_MODEL);
        assert_eq!(host["default_agent"], "cline-plan");
    }

    #[test]
    fn non_object_host_is_replaced() {
        let mut host = json!(null);
        apply_to_host_config(&mut host, "P", "A", &PluginConfig::default());
        assert!(host["agent"].is_object());
    }
}
