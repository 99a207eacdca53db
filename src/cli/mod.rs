pub mod daemon_path;
pub mod interaction;
pub mod process;
pub mod report;

use std::{env, fmt, path::PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use interaction::{ConsoleNotifier, TerminalPrompt};
use process::{kill_previous_servers, restart_server, TrackerExecutables};
use report::{print_status, print_tree};
use tracing::level_filters::LevelFilter;

use crate::{
    daemon::{
        start_daemon,
        storage::{
            kv_store::FileStore,
            ledger::{resolve_project_key, TimeLedger},
        },
    },
    sync::mirror::{export_ledger, import_ledger, SyncOutcome},
    utils::{
        dir::{create_application_default_path, home_dir},
        logging::{enable_logging, CLI_PREFIX, DAEMON_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Worktally", version, long_about = None)]
#[command(about = "Tracks minutes spent per project per day", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

/// Which project the command is about.
#[derive(clap::Args, Debug, Clone)]
pub struct ProjectTarget {
    #[arg(long, help = "Project name. Defaults to the name of the workspace directory")]
    project: Option<String>,
    #[arg(long, help = "Workspace directory. Defaults to the current directory")]
    workspace: Option<PathBuf>,
}

impl ProjectTarget {
    pub fn project_key(&self) -> String {
        let workspace = self.workspace.clone().or_else(|| env::current_dir().ok());
        resolve_project_key(self.project.as_deref(), workspace.as_deref())
    }
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Starts a tracker daemon for a workspace, replacing the running one")]
    Start {
        #[command(flatten)]
        target: ProjectTarget,
    },
    #[command(
        about = "Run the tracker directly in current console. Used for creating a daemon internally and for debugging"
    )]
    Serve {
        #[command(flatten)]
        target: ProjectTarget,
    },
    #[command(about = "Stop currently running trackers.")]
    Stop {},
    #[command(about = "Print today's minutes of a project as a status line")]
    Status {
        #[command(flatten)]
        target: ProjectTarget,
    },
    #[command(about = "List projects with their totals, or the days of a single project")]
    Tree {
        #[arg(help = "Project to expand")]
        project: Option<String>,
        #[arg(long, short, help = "Expand every project")]
        all: bool,
    },
    #[command(about = "Sync time tracker data to a JSON file and remember it for auto-sync")]
    Export {
        #[arg(help = "Target file. Asks when omitted")]
        path: Option<PathBuf>,
    },
    #[command(about = "Load time tracker data from a JSON file, replacing the current data")]
    Import {
        #[arg(help = "Source file. Asks when omitted")]
        path: Option<PathBuf>,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args.dir.map_or_else(create_application_default_path, Ok)?;
    let logging_level = args.log.then_some(LevelFilter::TRACE);
    let prefix = match args.commands {
        Commands::Serve { .. } => DAEMON_PREFIX,
        _ => CLI_PREFIX,
    };
    enable_logging(prefix, &app_dir.join("logs"), logging_level, args.log)?;

    let store = || FileStore::new(app_dir.join(FileStore::FILE_NAME));

    match args.commands {
        Commands::Start { target } => {
            let project = target.project_key();
            restart_server(&app_dir, &project)?;
            println!("Tracking {project}");
            Ok(())
        }
        Commands::Stop {} => {
            let stopped = kill_previous_servers(&TrackerExecutables::current()?)?;
            println!("Stopped {stopped} tracker(s)");
            Ok(())
        }
        Commands::Serve { target } => start_daemon(&app_dir, target.project_key()).await,
        Commands::Status { target } => {
            print_status(&TimeLedger::new(store()?), &target.project_key()).await
        }
        Commands::Tree { project, all } => {
            print_tree(&TimeLedger::new(store()?), project.as_deref(), all).await
        }
        Commands::Export { path } => {
            let mut ledger = TimeLedger::new(store()?);
            let outcome = export_ledger(
                &mut ledger,
                path,
                &mut TerminalPrompt::stdio(),
                &mut ConsoleNotifier,
                &home_dir(),
            )
            .await;
            outcome_to_result(outcome)
        }
        Commands::Import { path } => {
            let mut ledger = TimeLedger::new(store()?);
            let outcome = import_ledger(
                &mut ledger,
                path,
                &mut TerminalPrompt::stdio(),
                &mut ConsoleNotifier,
            )
            .await;
            outcome_to_result(outcome)
        }
    }
}

/// A failure that was already shown to the user. It only decides the exit code.
#[derive(Debug)]
pub struct ReportedFailure(pub String);

impl fmt::Display for ReportedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ReportedFailure {}

fn outcome_to_result(outcome: SyncOutcome) -> Result<()> {
    match outcome {
        SyncOutcome::Cancelled | SyncOutcome::Completed(_) => Ok(()),
        SyncOutcome::Failed(message) => Err(ReportedFailure(message).into()),
    }
}
