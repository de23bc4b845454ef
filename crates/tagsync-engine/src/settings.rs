//! Project-wide defaults and the field fallback chain.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Trend and alarm fields that fall back through member, template and
/// project defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultField {
    SamplePeriod,
    TrendType,
    TrendFiles,
    StorageMethod,
    AlarmCategory,
    AlarmPriority,
    AlarmHelp,
    AlarmDelay,
    AlarmArea,
}

impl DefaultField {
    pub const ALL: [DefaultField; 9] = [
        DefaultField::SamplePeriod,
        DefaultField::TrendType,
        DefaultField::TrendFiles,
        DefaultField::StorageMethod,
        DefaultField::AlarmCategory,
        DefaultField::AlarmPriority,
        DefaultField::AlarmHelp,
        DefaultField::AlarmDelay,
        DefaultField::AlarmArea,
    ];

    /// Last-resort value when no layer provides one.
    #[must_use]
    pub fn literal(self) -> &'static str {
        match self {
            Self::SamplePeriod => "00:00:01",
            Self::TrendType => "TRN_PERIODIC",
            Self::TrendFiles => "2",
            Self::StorageMethod => "Scaled",
            Self::AlarmCategory | Self::AlarmPriority => "1",
            Self::AlarmHelp | Self::AlarmArea => "",
            Self::AlarmDelay => "0",
        }
    }

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::SamplePeriod => "sample_period",
            Self::TrendType => "trend_type",
            Self::TrendFiles => "trend_files",
            Self::StorageMethod => "storage_method",
            Self::AlarmCategory => "alarm_category",
            Self::AlarmPriority => "alarm_priority",
            Self::AlarmHelp => "alarm_help",
            Self::AlarmDelay => "alarm_delay",
            Self::AlarmArea => "alarm_area",
        }
    }
}

/// Optional values for every [`DefaultField`]. Used on members, templates,
/// single tags and the project settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_period: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_type: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_files: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_method: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm_category: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm_priority: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm_help: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm_delay: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm_area: Option<SmolStr>,
}

impl DefaultSet {
    fn slot(&self, field: DefaultField) -> &Option<SmolStr> {
        match field {
            DefaultField::SamplePeriod => &self.sample_period,
            DefaultField::TrendType => &self.trend_type,
            DefaultField::TrendFiles => &self.trend_files,
            DefaultField::StorageMethod => &self.storage_method,
            DefaultField::AlarmCategory => &self.alarm_category,
            DefaultField::AlarmPriority => &self.alarm_priority,
            DefaultField::AlarmHelp => &self.alarm_help,
            DefaultField::AlarmDelay => &self.alarm_delay,
            DefaultField::AlarmArea => &self.alarm_area,
        }
    }

    fn slot_mut(&mut self, field: DefaultField) -> &mut Option<SmolStr> {
        match field {
            DefaultField::SamplePeriod => &mut self.sample_period,
            DefaultField::TrendType => &mut self.trend_type,
            DefaultField::TrendFiles => &mut self.trend_files,
            DefaultField::StorageMethod => &mut self.storage_method,
            DefaultField::AlarmCategory => &mut self.alarm_category,
            DefaultField::AlarmPriority => &mut self.alarm_priority,
            DefaultField::AlarmHelp => &mut self.alarm_help,
            DefaultField::AlarmDelay => &mut self.alarm_delay,
            DefaultField::AlarmArea => &mut self.alarm_area,
        }
    }

    /// Value for `field`; blank strings count as unset.
    #[must_use]
    pub fn get(&self, field: DefaultField) -> Option<&SmolStr> {
        self.slot(field)
            .as_ref()
            .filter(|value| !value.trim().is_empty())
    }

    pub fn set(&mut self, field: DefaultField, value: impl Into<SmolStr>) {
        *self.slot_mut(field) = Some(value.into());
    }

    #[must_use]
    pub fn with(mut self, field: DefaultField, value: impl Into<SmolStr>) -> Self {
        self.set(field, value);
        self
    }

    /// Overlays every value set in `other` onto `self`.
    pub fn merge_from(&mut self, other: &DefaultSet) {
        for field in DefaultField::ALL {
            if let Some(value) = other.get(field) {
                self.set(field, value.clone());
            }
        }
    }
}

/// Resolves `field` from the first layer that sets it, falling back to the
/// literal default. Layers are ordered most specific first.
#[must_use]
pub fn resolve_default(field: DefaultField, layers: &[&DefaultSet]) -> SmolStr {
    layers
        .iter()
        .find_map(|layer| layer.get(field))
        .cloned()
        .unwrap_or_else(|| SmolStr::new_static(field.literal()))
}

/// Settings consumed by expansion and single-tag fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub cluster: SmolStr,
    pub io_device: SmolStr,
    pub defaults: DefaultSet,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cluster: SmolStr::new_static("Cluster1"),
            io_device: SmolStr::new_static("IO_DEV_1"),
            defaults: DefaultSet::default(),
        }
    }
}
