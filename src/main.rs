use std::io::Read as _;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use mode_core::tools::{TOOL_MAPPINGS, adapt_prompt_tool_names, map_tool_name};
use tracing_subscriber::EnvFilter;

use cline_mode::{
    PluginConfig,
    cli::{Cli, Commands, ConfigCommands, PlanCommands, PromptCommands, ToolCommands},
    config::{self, PromptSource},
    core::{
        ClineModePlugin, PluginHooks,
        approval::PlanStatusStore,
        commands::{Command, CommandDispatcher},
        plan::{ImplementationPlan, PlanManager, PlanTask},
        progress,
        prompts::PromptLoader,
    },
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let directory = cli.project_dir()?;

    match cli.command {
        Commands::Serve { host, port } => {
            let plugin = ClineModePlugin::load(&directory).await?;
            cline_mode::api::serve(&host, port, Arc::new(plugin)).await?;
        }

        Commands::Transform { input } => {
            let plugin = ClineModePlugin::load(&directory).await?;
            let mut output: serde_json::Value = serde_json::from_str(&read_input(input.as_deref())?)?;
            let events = plugin.on_messages_transform(&mut output).await;
            for event in &events {
                tracing::info!(event = %event.kind, "host event");
            }
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Commands::Agents { host_config } => {
            let plugin = ClineModePlugin::load(&directory).await?;
            let mut host = match host_config {
                Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
                None => serde_json::json!({}),
            };
            plugin.on_config(&mut host).await?;
            println!("{}", serde_json::to_string_pretty(&host)?);
        }

        Commands::Plan { command } => handle_plan_command(&directory, command)?,

        Commands::Prompts { command } => handle_prompt_command(&directory, command).await?,

        Commands::Config { command } => handle_config_command(&directory, command)?,

        Commands::Tools { command } => handle_tool_command(command)?,
    }

    Ok(())
}

/// Contents of `path`, or stdin when no path is given.
fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn read_plan(path: &Path) -> anyhow::Result<ImplementationPlan> {
    Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
}

fn handle_plan_command(directory: &Path, command: PlanCommands) -> anyhow::Result<()> {
    let plans_dir = config::plans_dir(directory);
    let dispatcher = CommandDispatcher::new(PlanStatusStore::new(&plans_dir));
    let optional = |id: Option<String>| id.unwrap_or_default();

    let output = match command {
        PlanCommands::Create { id } => dispatcher.run(Command::CreatePlanStatus, &optional(id)),
        PlanCommands::Approve { id } => dispatcher.run(Command::ApprovePlan, &optional(id)),
        PlanCommands::Reject { args } => dispatcher.run(Command::RejectPlan, &args.join(" ")),
        PlanCommands::Start { id } => dispatcher.run(Command::StartExecution, &optional(id)),
        PlanCommands::Complete { id } => dispatcher.run(Command::CompletePlan, &optional(id)),
        PlanCommands::Status { id } => dispatcher.run(Command::PlanStatus, &optional(id)),

        PlanCommands::List { json } => {
            let plans = dispatcher.store().list()?;
            let current = dispatcher.store().get_current_plan_id()?;
            if json {
                serde_json::to_string_pretty(&plans)?
            } else {
                let mut lines = vec![format!("{:<2}{:<36} {:<12} Updated", "", "ID", "Status")];
                lines.push("-".repeat(72));
                for plan in plans {
                    let marker = if current.as_deref() == Some(plan.id.as_str()) {
                        "*"
                    } else {
                        ""
                    };
                    lines.push(format!(
                        "{marker:<2}{:<36} {:<12} {}",
                        plan.id,
                        plan.status.to_string(),
                        plan.updated_at.format("%Y-%m-%d %H:%M")
                    ));
                }
                lines.join("\n")
            }
        }

        PlanCommands::Render { file, stdout } => {
            let plan = read_plan(&file)?;
            if stdout {
                plan.to_markdown()
            } else {
                let path = PlanManager::new(&plans_dir).write_plan(&plan)?;
                format!("Plan written to {}", path.display())
            }
        }

        PlanCommands::Progress { file } => {
            let tasks: Vec<PlanTask> = read_plan(&file)?.tasks;
            let report = progress::progress(&tasks);
            [
                progress::format_progress(&report),
                progress::format_task_list(&tasks),
                progress::format_focus_chain(&tasks),
            ]
            .join("\n\n")
        }
    };

    println!("{output}");
    Ok(())
}

async fn handle_prompt_command(directory: &Path, command: PromptCommands) -> anyhow::Result<()> {
    let config = PluginConfig::load(directory);

    match command {
        PromptCommands::Show { mode } => {
            let prompts = PromptLoader::new(&config, directory).load().await?;
            tracing::info!(source = %prompts.source, "prompt loaded");
            println!("{}", prompts.for_mode(mode.into()));
        }
        PromptCommands::Refresh => {
            let config = PluginConfig {
                prompt_source: PromptSource::Github,
                fallback_to_local: false,
                ..config
            };
            let loader = PromptLoader::new(&config, directory);
            let prompts = loader.load().await?;
            let stats = loader.cache_stats();
            println!(
                "Fetched prompts (plan {} bytes, act {} bytes); cache holds {} valid entries",
                prompts.plan.len(),
                prompts.act.len(),
                stats.valid_entries
            );
        }
        PromptCommands::ClearCache => {
            let removed = PromptLoader::new(&config, directory).clear_cache();
            println!("Removed {removed} cached prompt(s)");
        }
        PromptCommands::Stats => {
            let stats = PromptLoader::new(&config, directory).cache_stats();
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

fn handle_config_command(directory: &Path, command: ConfigCommands) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Show => {
            let config = PluginConfig::load(directory);
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommands::Path => match PluginConfig::resolve_path(directory) {
            Some(path) => println!("{}", path.display()),
            None => {
                println!("No config file found. Searched:");
                for path in PluginConfig::candidate_paths(directory) {
                    println!("  {}", path.display());
                }
            }
        },
        ConfigCommands::Validate { file } => {
            let path = file
                .or_else(|| PluginConfig::resolve_path(directory))
                .ok_or_else(|| anyhow::anyhow!("no config file found"))?;
            PluginConfig::load_from_path(&path)?;
            println!("{} is valid", path.display());
        }
    }

    Ok(())
}

fn handle_tool_command(command: ToolCommands) -> anyhow::Result<()> {
    match command {
        ToolCommands::List => {
            println!("{:<28} {:<24} Description", "Cline", "OpenCode");
            println!("{}", "-".repeat(80));
            for mapping in TOOL_MAPPINGS {
                println!(
                    "{:<28} {:<24} {}",
                    mapping.source, mapping.host, mapping.description
                );
            }
        }
        ToolCommands::Map { name } => println!("{}", map_tool_name(&name)),
        ToolCommands::Adapt { input } => {
            let prompt = read_input(input.as_deref())?;
            print!("{}", adapt_prompt_tool_names(&prompt));
        }
    }

    Ok(())
}
