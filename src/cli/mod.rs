//! CLI command parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use mode_core::Mode;

/// cline-mode - Cline-style plan and act modes for OpenCode.
#[derive(Parser)]
#[command(name = "cline-mode")]
#[command(about = "Cline-style plan and act modes for OpenCode")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Project directory (defaults to the current directory).
    #[arg(short = 'C', long = "directory", global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Project directory to operate on.
    ///
    /// # Errors
    ///
    /// Returns an error if no directory was given and the current directory
    /// cannot be determined.
    pub fn project_dir(&self) -> std::io::Result<PathBuf> {
        match &self.directory {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir(),
        }
    }
}

/// Mode selector for commands that act on one prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Plan,
    Act,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Plan => Self::Plan,
            ModeArg::Act => Self::Act,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP bridge.
    Serve {
        /// Host to bind to.
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to.
        #[arg(short, long, default_value = "7891")]
        port: u16,
    },

    /// Run the messages transform over a transcript read from a file or stdin.
    Transform {
        /// Transcript file (`{"messages": [...]}`); stdin if omitted.
        input: Option<PathBuf>,
    },

    /// Print a host configuration with the mode agents installed.
    Agents {
        /// Host configuration file; an empty object if omitted.
        #[arg(long, value_name = "FILE")]
        host_config: Option<PathBuf>,
    },

    /// Manage plans and their approval status.
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },

    /// Inspect and refresh system prompts.
    Prompts {
        #[command(subcommand)]
        command: PromptCommands,
    },

    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Tool-name mapping.
    Tools {
        #[command(subcommand)]
        command: ToolCommands,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Create a draft plan status record.
    Create {
        /// Plan id (generated if omitted).
        id: Option<String>,
    },

    /// Approve a plan (the current one if no id is given).
    Approve { id: Option<String> },

    /// Reject a plan: `[ID] [REASON]...`.
    Reject {
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },

    /// Start executing an approved plan.
    Start { id: Option<String> },

    /// Mark a plan completed.
    Complete { id: Option<String> },

    /// Show a plan's status.
    Status { id: Option<String> },

    /// List all plans.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Render an implementation plan (JSON) to markdown in the plans directory.
    Render {
        /// Plan file.
        file: PathBuf,

        /// Print the markdown instead of writing it.
        #[arg(long)]
        stdout: bool,
    },

    /// Show progress for the tasks of an implementation plan (JSON).
    Progress {
        /// Plan file.
        file: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum PromptCommands {
    /// Print the adapted prompt for a mode.
    Show {
        #[arg(value_enum)]
        mode: ModeArg,
    },

    /// Fetch prompts from the Cline repository and refresh the cache.
    Refresh,

    /// Remove all cached prompts.
    ClearCache,

    /// Show cache statistics.
    Stats,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration.
    Show,

    /// Show the configuration file path.
    Path,

    /// Validate a configuration file (the resolved one if omitted).
    Validate { file: Option<PathBuf> },
}

#[derive(Subcommand)]
pub enum ToolCommands {
    /// List the tool-name mapping.
    List,

    /// Map one Cline tool name.
    Map { name: String },

    /// Rewrite tool names in a prompt read from a file or stdin.
    Adapt { input: Option<PathBuf> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_verbose_flag() {
        let cli = Cli::parse_from(["cline-mode", "-v", "tools", "list"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["cline-mode", "-vvv", "tools", "list"]);
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn cli_parses_serve_with_defaults() {
        let cli = Cli::parse_from(["cline-mode", "serve"]);
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 7891);
            }
            _ => panic!("expected Serve command"),
        }
    }

    #[test]
    fn cli_parses_serve_with_custom_host_port() {
        let cli = Cli::parse_from(["cline-mode", "serve", "-H", "0.0.0.0", "-p", "8080"]);
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host, "0.0.0.0");
                assert_eq!(port, 8080);
            }
            _ => panic!("expected Serve command"),
        }
    }

    #[test]
    fn cli_parses_directory() {
        let cli = Cli::parse_from(["cline-mode", "plan", "list", "-C", "/tmp/project"]);
        assert_eq!(cli.project_dir().unwrap(), PathBuf::from("/tmp/project"));
    }

    #[test]
    fn cli_parses_reject_with_reason() {
        let cli = Cli::parse_from(["cline-mode", "plan", "reject", "plan-1", "too", "risky"]);
        match cli.command {
            Commands::Plan {
                command: PlanCommands::Reject { args },
            } => assert_eq!(args, vec!["plan-1", "too", "risky"]),
            _ => panic!("expected Reject command"),
        }
    }

    #[test]
    fn cli_parses_prompt_mode() {
        let cli = Cli::parse_from(["cline-mode", "prompts", "show", "act"]);
        match cli.command {
            Commands::Prompts {
                command: PromptCommands::Show { mode },
            } => assert_eq!(Mode::from(mode), Mode::Act),
            _ => panic!("expected Show command"),
        }
        assert!(Cli::try_parse_from(["cline-mode", "prompts", "show", "build"]).is_err());
    }

    #[test]
    fn cli_parses_config_validate() {
        let cli = Cli::parse_from(["cline-mode", "config", "validate", "cfg.json"]);
        match cli.command {
            Commands::Config {
                command: ConfigCommands::Validate { file },
            } => assert_eq!(file, Some(PathBuf::from("cfg.json"))),
            _ => panic!("expected Validate command"),
        }
    }

    #[test]
    fn cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["cline-mode"]).is_err());
    }

    #[test]
    fn cli_verbose_is_global() {
        let cli = Cli::parse_from(["cline-mode", "tools", "map", "read_file", "-v"]);
        assert_eq!(cli.verbose, 1);
        assert!(matches!(
            cli.command,
            Commands::Tools {
                command: ToolCommands::Map { .. }
            }
        ));
    }

    #[test]
    fn cli_debug_assert() {
        Cli::command().debug_assert();
    }
}
