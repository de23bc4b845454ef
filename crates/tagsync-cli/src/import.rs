//! Rebuild the tag list from the persisted tables.

use std::path::PathBuf;

use tagsync_engine::{
    merge_import, tags_from_records, ImportDiff, ImportSelection, RecordSource, TagSink,
    TagSource,
};

use crate::project::Project;
use crate::style;

pub struct ImportOptions {
    pub reject_added: Vec<String>,
    pub keep: Vec<String>,
    pub keep_all: bool,
    pub dry_run: bool,
}

pub fn run_import(project: Option<PathBuf>, options: ImportOptions) -> anyhow::Result<()> {
    let mut project = Project::open(project)?;
    let incoming = tags_from_records(&project.store.load_all()?, &project.config.settings)?;
    let current = project.store.load_tags()?;
    let diff = merge_import(&current, &incoming);
    print_diff(&diff);

    let mut selection = ImportSelection::new();
    for identity in &options.reject_added {
        if !diff.added.iter().any(|tag| tag.identity() == identity.as_str()) {
            eprintln!(
                "{}",
                style::warning(format!("Warning: '{identity}' is not a new tag"))
            );
        }
        selection.reject_added(identity.as_str());
    }
    if options.keep_all {
        selection.set_all_removals(&diff, true);
    }
    for identity in &options.keep {
        if !diff.removed.iter().any(|tag| tag.identity() == identity.as_str()) {
            eprintln!(
                "{}",
                style::warning(format!("Warning: '{identity}' is not a removed tag"))
            );
        }
        selection.reject_removal(identity.as_str());
    }

    let tags = diff.apply(&selection);
    if options.dry_run {
        println!("Tag list would hold {} entries.", tags.len());
        println!("Dry run: nothing written.");
        return Ok(());
    }
    project.store.save_tags(&tags)?;
    println!(
        "{}",
        style::success(format!(
            "Imported {} tags into {}.",
            tags.len(),
            project.store.tags_path().display()
        ))
    );
    Ok(())
}

fn print_diff(diff: &ImportDiff) {
    println!(
        "{}",
        style::accent(format!(
            "import: {} added, {} removed, {} unchanged",
            diff.added.len(),
            diff.removed.len(),
            diff.unchanged_count
        ))
    );
    for tag in &diff.added {
        println!("{}", style::change_line(&format!("  + {}", tag.identity())));
    }
    for tag in &diff.removed {
        println!("{}", style::change_line(&format!("  - {}", tag.identity())));
    }
}
