//! Read-only commands: sanitize, expand, diff, templates.

use std::path::PathBuf;

use tagsync_engine::{derive_identity, TableKind, TemplateStore};

use crate::project::{print_classification, Project};
use crate::style;

pub fn run_sanitize(prefix: &str, address: &str) -> anyhow::Result<()> {
    println!("{}", derive_identity(prefix, address));
    Ok(())
}

pub fn run_expand(project: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let project = Project::open(project)?;
    let expansion = project.expand()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&expansion.tables)?);
        return Ok(());
    }
    for table in TableKind::ALL {
        let rows = expansion.tables.get(table);
        println!("{}", style::accent(format!("{table}: {} rows", rows.len())));
        for row in rows {
            println!("  {}", row.identity().unwrap_or_default());
        }
    }
    Ok(())
}

pub fn run_diff(project: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let project = Project::open(project)?;
    let classification = project.classify()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&classification)?);
        return Ok(());
    }
    print_classification(&classification);
    if !classification.has_changes() {
        println!("{}", style::success("Project tables are up to date."));
    }
    Ok(())
}

pub fn run_templates(project: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let project = Project::open(project)?;
    let templates = &project.config.templates;
    if json {
        let all: Vec<_> = templates.iter().collect();
        println!("{}", serde_json::to_string_pretty(&all)?);
        return Ok(());
    }
    for name in templates.names() {
        let Some(template) = templates.get(&name) else {
            continue;
        };
        println!(
            "{} v{} - {}",
            style::accent(&template.name),
            template.version,
            template.description
        );
        for member in &template.members {
            let mut flags = Vec::new();
            if member.is_trend {
                flags.push("trend");
            }
            if member.is_alarm {
                flags.push("alarm");
            }
            println!(
                "  {:<12} {:<8} {}",
                member.suffix,
                member.data_type,
                flags.join(", ")
            );
        }
    }
    Ok(())
}
