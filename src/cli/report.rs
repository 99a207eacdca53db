use anyhow::Result;
use chrono::Local;

use crate::{
    daemon::storage::{kv_store::KeyValueStore, ledger::TimeLedger},
    utils::time::day_key,
    view::{
        status::format_status,
        tree::{children, render_tree, TreeNode},
    },
};

/// Same line the daemon keeps in its status file, computed from the store directly.
pub async fn status_line<S: KeyValueStore>(ledger: &TimeLedger<S>, project: &str) -> Result<String> {
    let today = day_key(&Local::now());
    let minutes = ledger.read_minutes(project, &today).await?;
    Ok(format_status(project, minutes))
}

pub async fn print_status<S: KeyValueStore>(ledger: &TimeLedger<S>, project: &str) -> Result<()> {
    println!("{}", status_line(ledger, project).await?);
    Ok(())
}

/// Renders the root of the tree, every project expanded with `all`, or the days of `project`.
pub async fn tree_listing<S: KeyValueStore>(
    ledger: &TimeLedger<S>,
    project: Option<&str>,
    all: bool,
) -> Result<String> {
    let ledger = ledger.load().await?;
    let Some(project) = project else {
        return Ok(render_tree(&ledger, all));
    };

    let node = TreeNode::Project {
        project: project.to_owned(),
        total: ledger.project_total(project),
    };
    let mut output = format!("{}\t{}\n", node.label(), node.description());
    for day in children(&ledger, Some(&node)) {
        output += &format!("  {}\t{}\n", day.label(), day.description());
    }
    Ok(output)
}

pub async fn print_tree<S: KeyValueStore>(
    ledger: &TimeLedger<S>,
    project: Option<&str>,
    all: bool,
) -> Result<()> {
    print!("{}", tree_listing(ledger, project, all).await?);
    Ok(())
}
