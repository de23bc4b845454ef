//! Review pending changes and commit the accepted ones.

use std::io::IsTerminal;
use std::path::PathBuf;

use tagsync_engine::{ChangeSet, PartitionKind, RecordSink, SelectionKey, TableKind};

use crate::project::{print_classification, Project};
use crate::prompt::{prompt_review, prompt_yes_no, Review};
use crate::style;

pub struct SyncOptions {
    pub reject: Vec<String>,
    pub reject_all: Vec<String>,
    pub interactive: bool,
    pub dry_run: bool,
    pub yes: bool,
}

pub fn run_sync(project: Option<PathBuf>, options: SyncOptions) -> anyhow::Result<()> {
    let mut project = Project::open(project)?;
    let classification = project.classify()?;
    print_classification(&classification);
    if !classification.has_changes() {
        println!("{}", style::success("Project tables are up to date."));
        return Ok(());
    }

    let mut review = ChangeSet::new(classification);
    for spec in &options.reject_all {
        let (table, partition) = parse_partition(spec)?;
        let touched = review.bulk_set(table, partition, false);
        if touched == 0 {
            eprintln!(
                "{}",
                style::warning(format!("Warning: no pending {partition} {table} changes"))
            );
        }
    }
    for spec in &options.reject {
        let key = SelectionKey::parse(spec)?;
        if !review.set(&key, false) {
            eprintln!(
                "{}",
                style::warning(format!("Warning: no pending change {key}"))
            );
        }
    }
    if options.interactive {
        ensure_interactive()?;
        review_each(&mut review)?;
    }

    let rejected: Vec<String> = review
        .selection()
        .rejected()
        .map(ToString::to_string)
        .collect();
    for key in &rejected {
        println!("{}", style::change_line(&format!("  x {key}")));
    }

    let write_back = review.project();
    if write_back.is_empty() {
        println!("Nothing to write: every change was rejected.");
        return Ok(());
    }
    if options.dry_run {
        for delta in write_back.iter().filter(|delta| !delta.is_empty()) {
            println!(
                "{}: would append {}, update {}, delete {}",
                delta.table,
                delta.append.len(),
                delta.update.len(),
                delta.delete.len()
            );
        }
        println!("Dry run: nothing written.");
        return Ok(());
    }
    if !options.yes
        && std::io::stdin().is_terminal()
        && !prompt_yes_no("Write accepted changes?", true)?
    {
        println!("Sync cancelled.");
        return Ok(());
    }

    let summary = project.store.commit_all(&write_back)?;
    println!(
        "{}",
        style::success(format!(
            "Synced {}: {} appended, {} updated, {} deleted.",
            project.root.display(),
            summary.appended,
            summary.updated,
            summary.deleted
        ))
    );
    Ok(())
}

fn review_each(review: &mut ChangeSet) -> anyhow::Result<()> {
    let keys: Vec<SelectionKey> = review.selection().keys().cloned().collect();
    let mut rest = None;
    for key in keys {
        let accepted = match rest {
            Some(accepted) => accepted,
            None => match prompt_review(&format!("Apply {key}?"))? {
                Review::Accept => true,
                Review::Reject => false,
                Review::AcceptRest => {
                    rest = Some(true);
                    true
                }
                Review::RejectRest => {
                    rest = Some(false);
                    false
                }
            },
        };
        review.set(&key, accepted);
    }
    Ok(())
}

fn parse_partition(spec: &str) -> anyhow::Result<(TableKind, PartitionKind)> {
    let Some((table, partition)) = spec.split_once(['/', '·']) else {
        anyhow::bail!("invalid partition '{spec}' (expected table/partition, e.g. variable/orphaned)");
    };
    let partition = PartitionKind::parse(partition)?;
    if partition == PartitionKind::Unchanged {
        anyhow::bail!("unchanged rows are never written; nothing to reject");
    }
    Ok((TableKind::parse(table)?, partition))
}

fn ensure_interactive() -> anyhow::Result<()> {
    if !std::io::stdin().is_terminal() {
        anyhow::bail!("no TTY available; use --reject or --reject-all to review non-interactively");
    }
    Ok(())
}
