use clap::{Parser, Subcommand};
use git_fleet::commands::*;
use git_fleet::core::{
    activity::{EntryStatus, LogQuery},
    command_init::{FleetContext, GlobalOptions},
    error::Result,
    groups::GroupUpdate,
    print_error,
    pull::PullStrategy,
    sync_state::SyncState,
};
use std::env;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "git-fleet")]
#[command(about = "Watch and pull a directory full of git repositories")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Base directory containing the repositories (overrides settings)
    #[arg(long, global = true, value_name = "DIR")]
    path: Option<PathBuf>,

    /// Settings file to use instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the sync state of every repository
    Scan {
        /// Ignore cached statuses
        #[arg(short, long)]
        refresh: bool,
        /// Scan only this zero-based batch of repositories
        #[arg(long)]
        batch: Option<usize>,
        /// Repositories per batch (defaults to the configured batch size)
        #[arg(long)]
        batch_size: Option<usize>,
        /// Only show repositories in this state (repeatable)
        #[arg(long = "state", value_name = "STATE")]
        states: Vec<SyncState>,
    },
    /// Show one repository in detail
    Status {
        /// Repository directory name
        repo: String,
        /// Ignore the cached status
        #[arg(short, long)]
        refresh: bool,
        /// Also show the last N commits
        #[arg(long, value_name = "N")]
        history: Option<usize>,
    },
    /// Fetch and reconcile one repository
    Pull {
        /// Repository directory name
        repo: String,
        /// merge, rebase or reset (required when the repository has diverged)
        #[arg(short, long)]
        strategy: Option<PullStrategy>,
    },
    /// Pull every repository
    PullAll {
        #[arg(short, long)]
        strategy: Option<PullStrategy>,
    },
    /// Pull the named repositories
    PullSelected {
        #[arg(required = true)]
        repos: Vec<String>,
        #[arg(short, long)]
        strategy: Option<PullStrategy>,
    },
    /// Pull every repository in a group
    PullGroup {
        /// Group id or name
        group: String,
        #[arg(short, long)]
        strategy: Option<PullStrategy>,
    },
    /// Manage repository groups
    Group {
        #[command(subcommand)]
        action: GroupCommand,
    },
    /// Tag repositories
    Tag {
        #[command(subcommand)]
        action: TagCommand,
    },
    /// Show or change the settings file
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
    /// Show recent pulls
    Activity {
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
        #[arg(long)]
        repo: Option<String>,
        #[arg(long)]
        operation: Option<String>,
        #[arg(long)]
        status: Option<EntryStatus>,
    },
    /// Fleet totals, activity and cache statistics
    Stats {
        #[arg(short, long)]
        refresh: bool,
    },
}

#[derive(Subcommand)]
enum GroupCommand {
    /// List groups
    List,
    /// Create a group
    Create {
        name: String,
        repos: Vec<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Rename, recolor or replace the members of a group
    Update {
        group: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
        /// New member list; pass the flag with no names to empty the group
        #[arg(long, num_args = 0.., value_name = "REPO")]
        repos: Option<Vec<String>>,
    },
    /// Delete a group
    Delete { group: String },
    /// Add repositories to a group
    Add {
        group: String,
        #[arg(required = true)]
        repos: Vec<String>,
    },
    /// Remove repositories from a group
    Remove {
        group: String,
        #[arg(required = true)]
        repos: Vec<String>,
    },
}

impl From<GroupCommand> for GroupAction {
    fn from(command: GroupCommand) -> Self {
        match command {
            GroupCommand::List => GroupAction::List,
            GroupCommand::Create { name, repos, color } => GroupAction::Create { name, repos, color },
            GroupCommand::Update {
                group,
                name,
                color,
                repos,
            } => GroupAction::Update {
                group,
                changes: GroupUpdate { name, color, repos },
            },
            GroupCommand::Delete { group } => GroupAction::Delete { group },
            GroupCommand::Add { group, repos } => GroupAction::Add { group, repos },
            GroupCommand::Remove { group, repos } => GroupAction::Remove { group, repos },
        }
    }
}

#[derive(Subcommand)]
enum TagCommand {
    /// List every tag, or the tags of one repository
    List { repo: Option<String> },
    /// Tag a repository
    Add {
        repo: String,
        #[arg(required = true)]
        tags: Vec<String>,
    },
    /// Remove tags from a repository
    Remove {
        repo: String,
        #[arg(required = true)]
        tags: Vec<String>,
    },
}

impl From<TagCommand> for TagAction {
    fn from(command: TagCommand) -> Self {
        match command {
            TagCommand::List { repo } => TagAction::List { repo },
            TagCommand::Add { repo, tags } => TagAction::Add { repo, tags },
            TagCommand::Remove { repo, tags } => TagAction::Remove { repo, tags },
        }
    }
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the settings and where they are stored
    Show,
    /// Change one setting
    Set { key: String, value: String },
    /// Restore the default settings
    Reset,
}

impl From<ConfigCommand> for ConfigAction {
    fn from(command: ConfigCommand) -> Self {
        match command {
            ConfigCommand::Show => ConfigAction::Show,
            ConfigCommand::Set { key, value } => ConfigAction::Set { key, value },
            ConfigCommand::Reset => ConfigAction::Reset,
        }
    }
}

fn run(cli: Cli) -> Result<CommandStatus> {
    let options = GlobalOptions {
        config: cli.config,
        path: cli.path,
        json: cli.json,
    };
    // built per command so `config` still works when the settings do not validate
    let context = || FleetContext::initialize(&options);

    match cli.command {
        Commands::Scan {
            refresh,
            batch,
            batch_size,
            states,
        } => execute_scan(
            &context()?,
            &ScanArgs {
                refresh,
                batch,
                batch_size,
                states,
            },
        ),
        Commands::Status {
            repo,
            refresh,
            history,
        } => execute_status(&context()?, &repo, refresh, history),
        Commands::Pull { repo, strategy } => execute_pull(&context()?, &repo, strategy),
        Commands::PullAll { strategy } => execute_pull_all(&context()?, strategy),
        Commands::PullSelected { repos, strategy } => {
            execute_pull_selected(&context()?, &repos, strategy)
        }
        Commands::PullGroup { group, strategy } => execute_pull_group(&context()?, &group, strategy),
        Commands::Group { action } => execute_group(&context()?, action.into()),
        Commands::Tag { action } => execute_tag(&context()?, action.into()),
        Commands::Config { action } => execute_config(&options, action.into()),
        Commands::Activity {
            limit,
            repo,
            operation,
            status,
        } => execute_activity(
            &context()?,
            &LogQuery {
                limit,
                repo,
                operation,
                status,
            },
        ),
        Commands::Stats { refresh } => execute_stats(&context()?, refresh),
    }
}

fn main() {
    let cli = Cli::parse();

    // Configure logging based on --debug flag
    if cli.debug {
        env::set_var("RUST_LOG", "debug");
    } else if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", "warn");
    }
    env_logger::init();

    match run(cli) {
        Ok(CommandStatus::Success) => {}
        Ok(CommandStatus::Failed) => std::process::exit(1),
        Err(e) => {
            print_error(&e.to_string());
            std::process::exit(1);
        }
    }
}
