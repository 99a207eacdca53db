use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
};

use anyhow::{anyhow, Result};
use sysinfo::{get_current_pid, Signal, System};
use tracing::info;

use super::daemon_path::to_daemon_path;

/// Binaries a tracker may be running from.
#[derive(Debug, Clone)]
pub struct TrackerExecutables {
    /// This executable. It only tracks when started with `serve`.
    pub cli: PathBuf,
    /// The dedicated daemon next to it.
    pub daemon: PathBuf,
}

impl TrackerExecutables {
    pub fn current() -> Result<Self> {
        let cli = env::current_exe()?;
        let daemon = to_daemon_path(cli.clone());
        Ok(Self { cli, daemon })
    }

    /// Whether a process started from `exe` with `cmd` is a tracker. Other cli invocations, such
    /// as an export waiting for input, are left alone.
    pub fn is_tracker(&self, exe: &Path, cmd: &[OsString]) -> bool {
        exe == self.daemon || (exe == self.cli && runs_serve(cmd))
    }
}

/// `serve` in subcommand position, not as the value of an option.
fn runs_serve(cmd: &[OsString]) -> bool {
    const VALUE_OPTIONS: [&str; 3] = ["--dir", "--project", "--workspace"];
    // `cmd[index]` is the argument before `arg`.
    cmd.iter().skip(1).enumerate().any(|(index, arg)| {
        arg == "serve" && !VALUE_OPTIONS.iter().any(|option| cmd[index] == **option)
    })
}

/// Terminates every other tracker process. Returns how many were stopped.
pub fn kill_previous_servers(executables: &TrackerExecutables) -> Result<usize> {
    let system = System::new_all();
    let current_id = get_current_pid().map_err(|e| anyhow!("Can't find own process {e}"))?;
    let mut stopped = 0;
    for (pid, process) in system.processes().iter() {
        if *pid == current_id {
            continue;
        }
        if matches!(process.parent(), Some(p) if p == current_id) {
            continue;
        }

        if process
            .exe()
            .filter(|v| v.exists())
            .filter(|v| executables.is_tracker(v, process.cmd()))
            .is_some()
        {
            info!("Stopping tracker process {pid}");
            // This will forcefully terminate the process on Windows. Anything better will require a
            // lot more work.
            if process.kill_with(Signal::Term).is_none() {
                process.kill();
            }
            process.wait();
            stopped += 1;
        }
    }
    Ok(stopped)
}

/// Intended for shutting down the previous tracker and starting a new one. Only one workspace is
/// tracked at a time. Currently for simplicity sake it operates using a detached process.
pub fn restart_server(app_dir: &Path, project: &str) -> Result<()> {
    let executables = TrackerExecutables::current()?;
    kill_previous_servers(&executables)?;
    let mut command = std::process::Command::new(&executables.cli);
    command
        .arg("--dir")
        .arg(app_dir)
        .args(["serve", "--project", project]);

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    command.stdin(Stdio::null());
    command.stdout(Stdio::null());
    command.stderr(Stdio::null());

    #[allow(clippy::zombie_processes)]
    let child = command.spawn()?;
    info!("Spawned tracker {} for {project}", child.id());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{ffi::OsString, path::PathBuf};

    use super::TrackerExecutables;

    fn executables() -> TrackerExecutables {
        TrackerExecutables {
            cli: PathBuf::from("/bin/worktally"),
            daemon: PathBuf::from("/bin/worktally-daemon"),
        }
    }

    fn cmd(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_serving_cli_is_a_tracker() {
        let cli = PathBuf::from("/bin/worktally");
        let serving = cmd(&["worktally", "--dir", "/tmp/app", "serve", "--project", "p"]);

        assert!(executables().is_tracker(&cli, &serving));
        assert!(executables().is_tracker(&cli, &cmd(&["worktally", "serve"])));
    }

    #[test]
    fn test_other_cli_invocations_are_left_alone() {
        let cli = PathBuf::from("/bin/worktally");

        assert!(!executables().is_tracker(&cli, &cmd(&["worktally", "export"])));
        assert!(!executables().is_tracker(
            &cli,
            &cmd(&["worktally", "status", "--project", "serve"])
        ));
        assert!(!executables().is_tracker(&cli, &cmd(&["worktally", "--dir", "serve", "tree"])));
    }

    #[test]
    fn test_daemon_is_always_a_tracker() {
        let daemon = PathBuf::from("/bin/worktally-daemon");

        assert!(executables().is_tracker(&daemon, &cmd(&["worktally-daemon", "--force"])));
        let other = PathBuf::from("/bin/other");
        assert!(!executables().is_tracker(&other, &cmd(&["other", "serve"])));
    }
}
