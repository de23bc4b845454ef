//! CLI definitions for tagsync.

use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(
    name = "tagsync",
    version,
    about = "Expand, diff and sync PlantSCADA tag databases",
    infer_subcommands = true,
    after_help = "Examples:\n  tagsync diff --project ./plant        # show pending changes\n  tagsync sync --project ./plant --dry-run\n  tagsync sync --reject variable/orphaned/Pump01.Mode\n  tagsync sanitize Prog:Station01.Level.PV --prefix FIT"
)]
pub struct Cli {
    /// Show debug logging.
    #[arg(long, short, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the tag name derived from a PLC address.
    Sanitize {
        /// Raw PLC address.
        address: String,
        /// Prefix placed before the sanitized address.
        #[arg(long, default_value = "")]
        prefix: String,
    },
    /// Expand the tag list into variable, trend and alarm rows.
    Expand {
        /// Project folder directory (defaults to the current directory).
        #[arg(long)]
        project: Option<PathBuf>,
        /// Print the generated rows as JSON.
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
    /// Compare generated rows against the project tables.
    Diff {
        /// Project folder directory (defaults to the current directory).
        #[arg(long)]
        project: Option<PathBuf>,
        /// Print the classification as JSON.
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
    /// Review pending changes and write the accepted ones.
    #[command(
        after_help = "Keys have the form table/partition/identity, e.g. alarm/new/Pump01.Fault.\nPartitions for --reject-all have the form table/partition, e.g. variable/orphaned."
    )]
    Sync {
        /// Project folder directory (defaults to the current directory).
        #[arg(long)]
        project: Option<PathBuf>,
        /// Reject one change (repeatable).
        #[arg(long = "reject", value_name = "KEY")]
        reject: Vec<String>,
        /// Reject every change of one table partition (repeatable).
        #[arg(long = "reject-all", value_name = "TABLE/PARTITION")]
        reject_all: Vec<String>,
        /// Ask about every change.
        #[arg(long, short, action = ArgAction::SetTrue)]
        interactive: bool,
        /// Show the result without writing.
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,
        /// Skip the final confirmation.
        #[arg(long, short, action = ArgAction::SetTrue)]
        yes: bool,
    },
    /// Rebuild the tag list from the project tables.
    Import {
        /// Project folder directory (defaults to the current directory).
        #[arg(long)]
        project: Option<PathBuf>,
        /// Drop an imported tag that is not in the current list (repeatable).
        #[arg(long = "reject-added", value_name = "TAG")]
        reject_added: Vec<String>,
        /// Keep a current tag the import would remove (repeatable).
        #[arg(long = "keep", value_name = "TAG")]
        keep: Vec<String>,
        /// Keep every current tag the import would remove.
        #[arg(long, action = ArgAction::SetTrue)]
        keep_all: bool,
        /// Show the result without writing.
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,
    },
    /// List the templates available to the project.
    Templates {
        /// Project folder directory (defaults to the current directory).
        #[arg(long)]
        project: Option<PathBuf>,
        /// Print full definitions as JSON.
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
}

impl Command {
    /// Project folder named on the command line, if the command takes one.
    pub fn project(&self) -> Option<&Path> {
        match self {
            Self::Sanitize { .. } => None,
            Self::Expand { project, .. }
            | Self::Diff { project, .. }
            | Self::Sync { project, .. }
            | Self::Import { project, .. }
            | Self::Templates { project, .. } => project.as_deref(),
        }
    }
}
