//! Project folder context shared by the commands.

use std::path::PathBuf;

use tagsync_engine::{
    classify_tables, expand_all, Classification, Expansion, ProjectConfig, RecordSource,
    TagSource,
};

use crate::store::JsonProject;
use crate::style;

pub struct Project {
    pub root: PathBuf,
    pub config: ProjectConfig,
    pub store: JsonProject,
}

impl Project {
    pub fn open(project: Option<PathBuf>) -> anyhow::Result<Self> {
        let root = match project {
            Some(root) => root,
            None => std::env::current_dir()?,
        };
        if !root.is_dir() {
            anyhow::bail!("invalid project folder: {}", root.display());
        }
        let config = ProjectConfig::load_project(&root)?;
        let store = JsonProject::open(&root)?;
        Ok(Self {
            root,
            config,
            store,
        })
    }

    /// Expands the saved tag list, reporting entries that failed on their own.
    pub fn expand(&self) -> anyhow::Result<Expansion> {
        let tags = self.store.load_tags()?;
        let expansion = expand_all(&tags, &self.config.templates, &self.config.settings)?;
        for failure in &expansion.failures {
            eprintln!(
                "{}",
                style::warning(format!(
                    "Warning: skipped tag {}: {}",
                    failure.identity, failure.error
                ))
            );
        }
        Ok(expansion)
    }

    /// Expands the tag list and classifies it against the saved tables.
    pub fn classify(&self) -> anyhow::Result<Classification> {
        let expansion = self.expand()?;
        let persisted = self.store.load_all()?;
        Ok(classify_tables(&persisted, &expansion.tables)?)
    }
}

/// Prints the summary of every table, one colored line at a time.
pub fn print_classification(classification: &Classification) {
    for partition in classification.iter() {
        for line in partition.render().lines() {
            println!("{}", style::change_line(line));
        }
    }
}
