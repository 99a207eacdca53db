use std::process::ExitCode;

use anyhow::Result;
use tracing::error;
use worktally::{
    cli::{run_cli, ReportedFailure},
    utils::runtime::single_thread_runtime,
};

fn main() -> Result<ExitCode> {
    match single_thread_runtime()?.block_on(run_cli()) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        // Already printed by the command itself.
        Err(e) if e.is::<ReportedFailure>() => Ok(ExitCode::FAILURE),
        Err(e) => {
            error!("Error running cli {e:?}");
            Err(e)
        }
    }
}
