//! Project configuration loading (`tagsync.toml`).

#![allow(missing_docs)]

use std::path::Path;

use serde::Deserialize;
use smol_str::SmolStr;
use tracing::debug;

use crate::error::SyncError;
use crate::settings::{DefaultField, DefaultSet, Settings};
use crate::template::{Template, TemplateLibrary, TemplateStore};

pub const CONFIG_FILE: &str = "tagsync.toml";

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub name: SmolStr,
    pub log_level: SmolStr,
    pub settings: Settings,
    /// Built-in templates plus the ones declared in the file.
    pub templates: TemplateLibrary,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: SmolStr::new_static("project"),
            log_level: SmolStr::new_static("info"),
            settings: Settings::default(),
            templates: TemplateLibrary::builtin(),
        }
    }
}

impl ProjectConfig {
    /// Loads `tagsync.toml` from a project folder; a missing file yields defaults.
    pub fn load_project(root: impl AsRef<Path>) -> Result<Self, SyncError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(SyncError::InvalidConfig(
                format!("project folder not found: {}", root.display()).into(),
            ));
        }
        let path = root.join(CONFIG_FILE);
        if !path.is_file() {
            debug!(path = %path.display(), "no project config, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SyncError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|err| SyncError::InvalidConfig(format!("{CONFIG_FILE}: {err}").into()))?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, SyncError> {
        let raw: ProjectToml = toml::from_str(text)
            .map_err(|err| SyncError::InvalidConfig(format!("{CONFIG_FILE}: {err}").into()))?;
        raw.into_config()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectToml {
    #[serde(default)]
    project: ProjectSection,
    #[serde(default)]
    defaults: DefaultsSection,
    #[serde(default)]
    template: Vec<Template>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectSection {
    name: Option<String>,
    log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DefaultsSection {
    cluster: Option<String>,
    io_device: Option<String>,
    sample_period: Option<String>,
    trend_type: Option<String>,
    trend_files: Option<String>,
    storage_method: Option<String>,
    alarm_category: Option<String>,
    alarm_priority: Option<String>,
    alarm_help: Option<String>,
    alarm_delay: Option<String>,
    alarm_area: Option<String>,
}

impl ProjectToml {
    fn into_config(self) -> Result<ProjectConfig, SyncError> {
        let mut config = ProjectConfig::default();

        if let Some(name) = self.project.name {
            if name.trim().is_empty() {
                return Err(SyncError::InvalidConfig("project.name must not be empty".into()));
            }
            config.name = SmolStr::new(name.trim());
        }
        if let Some(level) = self.project.log_level {
            let level = level.trim().to_ascii_lowercase();
            if !LOG_LEVELS.contains(&level.as_str()) {
                return Err(SyncError::InvalidConfig(
                    format!("project.log_level '{level}' (expected one of {})", LOG_LEVELS.join("/"))
                        .into(),
                ));
            }
            config.log_level = level.into();
        }

        let defaults = self.defaults;
        if let Some(cluster) = non_blank("defaults.cluster", defaults.cluster)? {
            config.settings.cluster = cluster;
        }
        if let Some(io_device) = non_blank("defaults.io_device", defaults.io_device)? {
            config.settings.io_device = io_device;
        }
        config.settings.defaults = [
            (DefaultField::SamplePeriod, defaults.sample_period),
            (DefaultField::TrendType, defaults.trend_type),
            (DefaultField::TrendFiles, defaults.trend_files),
            (DefaultField::StorageMethod, defaults.storage_method),
            (DefaultField::AlarmCategory, defaults.alarm_category),
            (DefaultField::AlarmPriority, defaults.alarm_priority),
            (DefaultField::AlarmHelp, defaults.alarm_help),
            (DefaultField::AlarmDelay, defaults.alarm_delay),
            (DefaultField::AlarmArea, defaults.alarm_area),
        ]
        .into_iter()
        .fold(DefaultSet::default(), |set, (field, value)| match value {
            Some(value) => set.with(field, value),
            None => set,
        });

        let mut declared = rustc_hash::FxHashSet::default();
        for template in self.template {
            if !declared.insert(template.name.clone()) {
                return Err(SyncError::InvalidConfig(
                    format!("template '{}' declared twice", template.name).into(),
                ));
            }
            config.templates.put(template)?;
        }

        debug!(
            project = %config.name,
            templates = config.templates.len(),
            "loaded project config"
        );
        Ok(config)
    }
}

fn non_blank(key: &str, value: Option<String>) -> Result<Option<SmolStr>, SyncError> {
    match value {
        Some(value) if value.trim().is_empty() => Err(SyncError::InvalidConfig(
            format!("{key} must not be empty").into(),
        )),
        Some(value) => Ok(Some(SmolStr::new(value.trim()))),
        None => Ok(None),
    }
}
