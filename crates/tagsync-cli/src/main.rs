//! CLI entrypoint for tagsync.

mod cli;
mod import;
mod inspect;
mod project;
mod prompt;
mod store;
mod style;
mod sync;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tagsync_engine::ProjectConfig;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};

fn main() {
    if let Err(err) = run() {
        let message = format_error_with_tip(&err);
        eprintln!("{}", style::error(format!("Error: {message}")));
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let raw_args: Vec<String> = std::env::args().collect();
    let cli = match Cli::try_parse_from(&raw_args) {
        Ok(cli) => cli,
        Err(err) => {
            if err.kind() == ErrorKind::InvalidSubcommand {
                if let Some(input) = raw_args.get(1) {
                    if let Some(suggestion) = suggest_subcommand(input) {
                        eprintln!("Did you mean: {suggestion}?");
                    }
                }
            }
            err.exit();
        }
    };
    init_tracing(cli.verbose, cli.command.as_ref());

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };
    match command {
        Command::Sanitize { address, prefix } => inspect::run_sanitize(&prefix, &address),
        Command::Expand { project, json } => inspect::run_expand(project, json),
        Command::Diff { project, json } => inspect::run_diff(project, json),
        Command::Sync {
            project,
            reject,
            reject_all,
            interactive,
            dry_run,
            yes,
        } => sync::run_sync(
            project,
            sync::SyncOptions {
                reject,
                reject_all,
                interactive,
                dry_run,
                yes,
            },
        ),
        Command::Import {
            project,
            reject_added,
            keep,
            keep_all,
            dry_run,
        } => import::run_import(
            project,
            import::ImportOptions {
                reject_added,
                keep,
                keep_all,
                dry_run,
            },
        ),
        Command::Templates { project, json } => inspect::run_templates(project, json),
    }
}

/// `RUST_LOG` wins; otherwise `--verbose`, then the project's `log_level`.
fn init_tracing(verbose: bool, command: Option<&Command>) {
    let level = if verbose {
        Level::DEBUG
    } else {
        command
            .and_then(project_log_level)
            .and_then(|level| level.parse().ok())
            .unwrap_or(Level::WARN)
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn project_log_level(command: &Command) -> Option<String> {
    if matches!(command, Command::Sanitize { .. }) {
        return None;
    }
    let root = match command.project() {
        Some(root) => root.to_path_buf(),
        None => std::env::current_dir().ok()?,
    };
    ProjectConfig::load_project(root)
        .ok()
        .map(|config| config.log_level.to_string())
}

fn suggest_subcommand(input: &str) -> Option<&'static str> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    let candidates = ["sanitize", "expand", "diff", "sync", "import", "templates"];
    let mut best = None;
    let mut best_score = usize::MAX;
    for candidate in candidates {
        let score = levenshtein(input, candidate);
        if score < best_score {
            best_score = score;
            best = Some(candidate);
        }
    }
    if best_score <= 2 {
        best
    } else {
        None
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        prev.clone_from_slice(&curr);
    }
    prev[b.len()]
}

fn format_error_with_tip(err: &anyhow::Error) -> String {
    let message = err.to_string();
    let tip = if message.contains("invalid project folder") {
        Some("Tip: pass --project <dir> or run tagsync inside a project folder.")
    } else if message.contains("invalid config") {
        Some("Tip: check tagsync.toml in the project folder.")
    } else if message.contains("duplicate") && message.contains("identity") {
        Some("Tip: rename one of the clashing tags, or remove the duplicate row from the table file.")
    } else if message.contains("no TTY available") {
        Some("Tip: run sync without --interactive and pass --reject/--reject-all instead.")
    } else {
        None
    };
    match tip {
        Some(tip) => format!("{message}\n{tip}"),
        None => message,
    }
}
