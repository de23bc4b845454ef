//! Editable tag entries.

#![allow(missing_docs)]

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::identity::{derive_identity, NameMode};
use crate::settings::DefaultSet;

/// Per-instance control over a template member's trend or alarm flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Enablement {
    /// Use the member's own flag.
    #[default]
    FromTemplate,
    /// Generate for every member.
    Enabled,
    /// Generate for no member.
    Disabled,
}

impl Enablement {
    #[must_use]
    pub fn resolve(self, member_flag: bool) -> bool {
        match self {
            Self::FromTemplate => member_flag,
            Self::Enabled => true,
            Self::Disabled => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendOptions {
    pub enabled: bool,
    /// Trend tag name; the entry identity when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<SmolStr>,
    pub trigger: SmolStr,
    pub defaults: DefaultSet,
    /// Remaining trend columns carried through unchanged.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub extra: IndexMap<SmolStr, SmolStr>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmOptions {
    pub enabled: bool,
    /// Alarm tag; the entry identity when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<SmolStr>,
    pub defaults: DefaultSet,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub extra: IndexMap<SmolStr, SmolStr>,
}

/// A tag mapping directly to one variable row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SingleTag {
    pub data_type: SmolStr,
    pub eng_units: SmolStr,
    pub eng_zero: SmolStr,
    pub eng_full: SmolStr,
    pub format: SmolStr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<SmolStr>,
    pub trend: TrendOptions,
    pub alarm: AlarmOptions,
    /// Remaining variable columns carried through unchanged.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub extra: IndexMap<SmolStr, SmolStr>,
}

impl Default for SingleTag {
    fn default() -> Self {
        Self {
            data_type: SmolStr::new_static("DIGITAL"),
            eng_units: SmolStr::default(),
            eng_zero: SmolStr::default(),
            eng_full: SmolStr::default(),
            format: SmolStr::default(),
            equipment: None,
            item: None,
            trend: TrendOptions::default(),
            alarm: AlarmOptions::default(),
            extra: IndexMap::new(),
        }
    }
}

/// A template-backed entry; records exist only after expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UdtInstance {
    pub template: SmolStr,
    #[serde(default)]
    pub trends: Enablement,
    #[serde(default)]
    pub alarms: Enablement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    Single(SingleTag),
    Udt(UdtInstance),
}

/// Editable unit of the tag list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEntry {
    #[serde(default)]
    prefix: SmolStr,
    #[serde(default)]
    address: SmolStr,
    identity: SmolStr,
    #[serde(default)]
    name_mode: NameMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub io_device: Option<SmolStr>,
    #[serde(default)]
    pub description: SmolStr,
    pub kind: TagKind,
}

impl TagEntry {
    pub fn single(prefix: impl Into<SmolStr>, address: impl Into<SmolStr>) -> Self {
        Self::with_kind(prefix, address, TagKind::Single(SingleTag::default()))
    }

    pub fn udt(
        prefix: impl Into<SmolStr>,
        address: impl Into<SmolStr>,
        template: impl Into<SmolStr>,
    ) -> Self {
        Self::with_kind(
            prefix,
            address,
            TagKind::Udt(UdtInstance {
                template: template.into(),
                trends: Enablement::FromTemplate,
                alarms: Enablement::FromTemplate,
            }),
        )
    }

    pub fn with_kind(
        prefix: impl Into<SmolStr>,
        address: impl Into<SmolStr>,
        kind: TagKind,
    ) -> Self {
        let mut entry = Self {
            prefix: prefix.into(),
            address: address.into(),
            identity: SmolStr::default(),
            name_mode: NameMode::Derived,
            cluster: None,
            io_device: None,
            description: SmolStr::default(),
            kind,
        };
        entry.identity = entry.derived_identity().into();
        entry
    }

    /// Entry whose name is authoritative, e.g. read back from a project.
    pub fn named(
        identity: impl Into<SmolStr>,
        prefix: impl Into<SmolStr>,
        address: impl Into<SmolStr>,
        kind: TagKind,
    ) -> Self {
        let mut entry = Self::with_kind(prefix, address, kind);
        entry.rename(identity);
        entry
    }

    #[must_use]
    pub fn identity(&self) -> &SmolStr {
        &self.identity
    }

    #[must_use]
    pub fn prefix(&self) -> &SmolStr {
        &self.prefix
    }

    #[must_use]
    pub fn address(&self) -> &SmolStr {
        &self.address
    }

    #[must_use]
    pub fn name_mode(&self) -> NameMode {
        self.name_mode
    }

    #[must_use]
    pub fn is_udt(&self) -> bool {
        matches!(self.kind, TagKind::Udt(_))
    }

    /// Identity the entry would carry in `Derived` mode. UDT instances are
    /// named by their prefix; member offsets consume the address.
    #[must_use]
    pub fn derived_identity(&self) -> String {
        match self.kind {
            TagKind::Single(_) => derive_identity(&self.prefix, &self.address),
            TagKind::Udt(_) => self.prefix.to_string(),
        }
    }

    pub fn set_prefix(&mut self, prefix: impl Into<SmolStr>) {
        self.prefix = prefix.into();
        self.refresh_identity();
    }

    pub fn set_address(&mut self, address: impl Into<SmolStr>) {
        self.address = address.into();
        self.refresh_identity();
    }

    /// Hand-edits the name; later prefix/address edits leave it alone.
    pub fn rename(&mut self, identity: impl Into<SmolStr>) {
        self.identity = identity.into();
        self.name_mode = NameMode::Manual;
    }

    /// Switches naming mode without touching the current name.
    pub fn set_name_mode(&mut self, mode: NameMode) {
        self.name_mode = mode;
    }

    fn refresh_identity(&mut self) {
        if self.name_mode.is_manual() {
            return;
        }
        self.identity = self.derived_identity().into();
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<SmolStr>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_cluster(mut self, cluster: impl Into<SmolStr>) -> Self {
        self.cluster = Some(cluster.into());
        self
    }

    #[must_use]
    pub fn with_io_device(mut self, io_device: impl Into<SmolStr>) -> Self {
        self.io_device = Some(io_device.into());
        self
    }

    pub fn single_mut(&mut self) -> Option<&mut SingleTag> {
        match &mut self.kind {
            TagKind::Single(single) => Some(single),
            TagKind::Udt(_) => None,
        }
    }

    pub fn udt_mut(&mut self) -> Option<&mut UdtInstance> {
        match &mut self.kind {
            TagKind::Udt(udt) => Some(udt),
            TagKind::Single(_) => None,
        }
    }
}
