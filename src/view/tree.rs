use std::{fmt::Write, future::Future, path::PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::daemon::storage::ledger::{total_minutes, Ledger, OVERALL_KEY};

/// A row of the project tree. Projects expand into their days, days are leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    Project {
        project: String,
        total: u64,
    },
    Day {
        project: String,
        day: String,
        minutes: u64,
    },
}

impl TreeNode {
    pub fn label(&self) -> &str {
        match self {
            TreeNode::Project { project, .. } => project,
            TreeNode::Day { day, .. } => day,
        }
    }

    pub fn description(&self) -> String {
        match self {
            TreeNode::Project { total, .. } => format!("{total} min overall"),
            TreeNode::Day { minutes, .. } => format!("{minutes} min"),
        }
    }

    pub fn is_expandable(&self) -> bool {
        matches!(self, TreeNode::Project { .. })
    }
}

/// Children of `parent`, or the root level when there is no parent.
///
/// The root lists every project except [OVERALL_KEY] together with its all time total. A
/// project lists its days, most recent first. Zero padded day keys make descending string order
/// the same as descending date order.
pub fn children(ledger: &Ledger, parent: Option<&TreeNode>) -> Vec<TreeNode> {
    match parent {
        None => ledger
            .projects()
            .filter(|(project, _)| *project != OVERALL_KEY)
            .map(|(project, days)| TreeNode::Project {
                project: project.to_owned(),
                total: total_minutes(days),
            })
            .collect(),
        Some(TreeNode::Project { project, .. }) => {
            let Some(days) = ledger.days(project) else {
                return vec![];
            };
            days.iter()
                .rev()
                .map(|(day, minutes)| TreeNode::Day {
                    project: project.clone(),
                    day: day.clone(),
                    minutes: *minutes,
                })
                .collect()
        }
        Some(TreeNode::Day { .. }) => vec![],
    }
}

/// Renders the tree as tab separated lines. Days are indented under their project when
/// `expand` is set.
pub fn render_tree(ledger: &Ledger, expand: bool) -> String {
    let mut output = String::new();
    for project in children(ledger, None) {
        let _ = writeln!(output, "{}\t{}", project.label(), project.description());
        if expand {
            for day in children(ledger, Some(&project)) {
                let _ = writeln!(output, "  {}\t{}", day.label(), day.description());
            }
        }
    }
    output
}

/// Something presenting the tree. The tree holds no state of its own, so a refresh means
/// querying it again from the root.
pub trait TreeView {
    fn refresh(&mut self, ledger: &Ledger) -> impl Future<Output = Result<()>>;
}

/// Keeps a fully expanded rendering of the tree in a file.
pub struct TreeSnapshotFile {
    path: PathBuf,
}

impl TreeSnapshotFile {
    pub const FILE_NAME: &'static str = "projects";

    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TreeView for TreeSnapshotFile {
    async fn refresh(&mut self, ledger: &Ledger) -> Result<()> {
        debug!("Refreshing project tree {:?}", self.path);
        tokio::fs::write(&self.path, render_tree(ledger, true))
            .await
            .with_context(|| format!("Failed to write project tree to {:?}", self.path))
    }
}
