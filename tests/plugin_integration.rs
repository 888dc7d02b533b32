//! End-to-end tests for the plugin: transcript transforms across turns and the
//! plan lifecycle persisted on disk.

use std::path::Path;

use serde_json::{Value, json};

use cline_mode::core::approval::{ApprovalError, PlanState, PlanStatusStore};
use cline_mode::core::prompts::{PromptLoader, PromptOrigin};
use cline_mode::{ClineModePlugin, PluginConfig, PluginHooks, config};

async fn plugin(dir: &Path) -> ClineModePlugin {
    ClineModePlugin::load(dir).await.unwrap()
}

fn text_of(message: &Value) -> String {
    message["parts"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["text"].as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_project_config(dir: &Path, body: &Value) {
    let path = PluginConfig::project_config_path(dir);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, body.to_string()).unwrap();
}

#[tokio::test]
async fn plan_then_act_across_turns() {
    let dir = tempfile::tempdir().unwrap();
    let plugin = plugin(dir.path()).await;

    let mut output = json!({
        "messages": [
            { "info": { "role": "user", "agent": "cline-plan" }, "parts": [{ "type": "text", "text": "Refactor auth" }] },
            { "info": { "role": "assistant", "agent": "cline-plan" }, "parts": [{ "type": "text", "text": "Step 1\nStep 2" }] }
        ]
    });

    plugin.on_messages_transform(&mut output).await;
    let plan_text = text_of(&output["messages"][1]);
    assert_eq!(plan_text.matches("<!-- cline-mode:plan-complete -->").count(), 1);
    assert!(plan_text.starts_with("Step 1\nStep 2"));
    assert!(plan_text.contains("/start-act"));

    output["messages"].as_array_mut().unwrap().push(json!({
        "info": { "role": "assistant", "agent": "cline-act" },
        "parts": [{ "type": "text", "text": "Executing" }]
    }));
    plugin.on_messages_transform(&mut output).await;

    let first = &output["messages"][2]["parts"][0];
    let inherited = first["text"].as_str().unwrap();
    assert!(inherited.contains("Step 1"));
    assert!(inherited.contains("Step 2"));
    assert_eq!(output["messages"][2]["parts"][1]["text"], "Executing");

    // A third run on the same transcript changes nothing.
    let before = output.clone();
    plugin.on_messages_transform(&mut output).await;
    assert_eq!(output, before);
}

#[tokio::test]
async fn project_config_drives_behavior() {
    let dir = tempfile::tempdir().unwrap();
    write_project_config(
        dir.path(),
        &json!({
            "enable_execute_command": false,
            "replace_default_agents": false,
            "act_model": "provider/act"
        }),
    );
    let plugin = plugin(dir.path()).await;

    assert!(plugin.tools().is_empty());

    let mut host = json!({ "model": "provider/default", "agent": { "build": {} } });
    plugin.on_config(&mut host).await.unwrap();
    assert!(host["agent"]["build"].is_object());
    assert_eq!(host["agent"]["cline-act"]["model"], "provider/act");
    assert_eq!(host["agent"]["cline-plan"]["model"], "provider/default");

    let mut output = json!({
        "messages": [
            { "info": { "role": "assistant", "agent": "cline-plan" }, "parts": [{ "type": "text", "text": "Plan" }] }
        ]
    });
    plugin.on_messages_transform(&mut output).await;
    assert!(!text_of(&output["messages"][0]).contains("/start-act"));
}

#[tokio::test]
async fn invalid_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    write_project_config(dir.path(), &json!({ "plan_temperature": 4, "unknown": true }));

    let plugin = plugin(dir.path()).await;

    assert_eq!(plugin.config(), &PluginConfig::default());
    assert_eq!(plugin.tools().len(), 2);
}

#[tokio::test]
async fn huge_cache_ttl_still_loads() {
    let dir = tempfile::tempdir().unwrap();
    write_project_config(dir.path(), &json!({ "cache_ttl": 1e16 }));

    let plugin = plugin(dir.path()).await;

    assert!((plugin.config().cache_ttl - 1e16).abs() < 1.0);
    assert_eq!(plugin.config().cache_ttl(), std::time::Duration::MAX);
}

#[tokio::test]
async fn local_prompts_are_tool_adapted() {
    let dir = tempfile::tempdir().unwrap();
    let prompts = dir.path().join("prompts");
    std::fs::create_dir_all(&prompts).unwrap();
    std::fs::write(prompts.join("plan.md"), "Use `read_file` to look around.").unwrap();
    std::fs::write(prompts.join("act.md"), "Run <execute_command>.").unwrap();

    let set = PromptLoader::new(&PluginConfig::default(), dir.path())
        .with_local_dir(&prompts)
        .load()
        .await
        .unwrap();

    assert_eq!(set.source, PromptOrigin::Local);
    assert_eq!(set.plan, "Use `read` to look around.");
    assert_eq!(set.act, "Run <bash>.");
}

#[tokio::test]
async fn plan_lifecycle_through_commands() {
    let dir = tempfile::tempdir().unwrap();
    let plugin = plugin(dir.path()).await;

    plugin.execute_command("create-plan-status", "plan-1").await;
    plugin.execute_command("create-plan-status", "plan-2").await;

    let blocked = plugin.execute_command("start-execution", "").await;
    assert!(blocked.contains("not approved"));

    plugin.execute_command("approve-plan", "").await;
    let started = plugin.execute_command("start-execution", "").await;
    assert!(started.contains("plan-1"));

    // State is on disk: a fresh store sees it.
    let store = PlanStatusStore::new(config::plans_dir(dir.path()));
    assert_eq!(store.get_current_plan_id().unwrap().as_deref(), Some("plan-1"));
    let plan = store.get_plan_status("plan-1").unwrap().unwrap();
    assert_eq!(plan.status, PlanState::InProgress);
    assert_eq!(plan.approved_by.as_deref(), Some("user"));
    assert!(plan.approved_at.is_some());

    assert!(!store.check_approval("plan-2").unwrap());
    assert!(matches!(
        store.require_approval("plan-2"),
        Err(ApprovalError::NotApproved(_))
    ));
    assert!(matches!(
        store.approve("missing", "user"),
        Err(ApprovalError::NotFound(_))
    ));
}
