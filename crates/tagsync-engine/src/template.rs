//! UDT templates and the template store.

#![allow(missing_docs)]

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::SyncError;
use crate::settings::{DefaultField, DefaultSet};

/// Placeholder in member comment templates replaced by the instance description.
pub const PARENT_DESC: &str = "{parent_desc}";

/// One child tag generated for every instance of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSpec {
    /// Appended to the parent identity, e.g. `.Run`.
    pub suffix: SmolStr,
    /// Appended to the parent address, e.g. `.RunStatus`.
    #[serde(default)]
    pub address_offset: SmolStr,
    #[serde(default = "default_data_type")]
    pub data_type: SmolStr,
    #[serde(default)]
    pub comment_template: SmolStr,
    #[serde(default)]
    pub is_trend: bool,
    #[serde(default)]
    pub is_alarm: bool,
    #[serde(default)]
    pub defaults: DefaultSet,
}

fn default_data_type() -> SmolStr {
    SmolStr::new_static("DIGITAL")
}

impl MemberSpec {
    pub fn new(suffix: impl Into<SmolStr>, data_type: impl Into<SmolStr>) -> Self {
        Self {
            suffix: suffix.into(),
            address_offset: SmolStr::default(),
            data_type: data_type.into(),
            comment_template: SmolStr::new_static(PARENT_DESC),
            is_trend: false,
            is_alarm: false,
            defaults: DefaultSet::default(),
        }
    }

    #[must_use]
    pub fn offset(mut self, offset: impl Into<SmolStr>) -> Self {
        self.address_offset = offset.into();
        self
    }

    #[must_use]
    pub fn comment(mut self, template: impl Into<SmolStr>) -> Self {
        self.comment_template = template.into();
        self
    }

    #[must_use]
    pub fn trend(mut self) -> Self {
        self.is_trend = true;
        self
    }

    #[must_use]
    pub fn alarm(mut self) -> Self {
        self.is_alarm = true;
        self
    }

    #[must_use]
    pub fn with_default(mut self, field: DefaultField, value: impl Into<SmolStr>) -> Self {
        self.defaults.set(field, value);
        self
    }

    /// Comment with every `{parent_desc}` replaced.
    #[must_use]
    pub fn render_comment(&self, parent_desc: &str) -> String {
        self.comment_template.replace(PARENT_DESC, parent_desc)
    }

    /// `ITEM` column value: the suffix without its leading separator.
    #[must_use]
    pub fn item(&self) -> &str {
        self.suffix.trim_start_matches(['.', '_'])
    }
}

/// Named, versioned UDT definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: SmolStr,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub description: SmolStr,
    #[serde(default)]
    pub defaults: DefaultSet,
    #[serde(default, rename = "member")]
    pub members: Vec<MemberSpec>,
}

fn default_version() -> u32 {
    1
}

impl Template {
    pub fn new(name: impl Into<SmolStr>, description: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            version: 1,
            description: description.into(),
            defaults: DefaultSet::default(),
            members: Vec::new(),
        }
    }

    #[must_use]
    pub fn member(mut self, member: MemberSpec) -> Self {
        self.members.push(member);
        self
    }

    /// Checks name and member suffix invariants.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.name.trim().is_empty() {
            return Err(SyncError::InvalidTemplate {
                name: self.name.clone(),
                reason: "template name is empty".into(),
            });
        }
        let mut seen = rustc_hash::FxHashSet::default();
        for member in &self.members {
            if member.suffix.is_empty() {
                return Err(SyncError::InvalidTemplate {
                    name: self.name.clone(),
                    reason: "member suffix is empty".into(),
                });
            }
            if !seen.insert(member.suffix.as_str()) {
                return Err(SyncError::InvalidTemplate {
                    name: self.name.clone(),
                    reason: format!("duplicate member suffix '{}'", member.suffix).into(),
                });
            }
        }
        Ok(())
    }
}

/// Resolves template names for expansion.
pub trait TemplateStore {
    fn get(&self, name: &str) -> Option<&Template>;

    /// Inserts or replaces a template. Replacing bumps the version.
    fn put(&mut self, template: Template) -> Result<(), SyncError>;

    fn remove(&mut self, name: &str) -> Option<Template>;

    fn names(&self) -> Vec<SmolStr>;
}

/// In-memory template store preserving definition order.
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: IndexMap<SmolStr, Template>,
}

impl TemplateLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Library seeded with the stock motor and valve templates.
    #[must_use]
    pub fn builtin() -> Self {
        let mut library = Self::new();
        for template in [motor_basic(), valve_basic()] {
            library.templates.insert(template.name.clone(), template);
        }
        library
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateStore for TemplateLibrary {
    fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    fn put(&mut self, mut template: Template) -> Result<(), SyncError> {
        template.validate()?;
        if let Some(previous) = self.templates.get(&template.name) {
            if *previous == template {
                return Ok(());
            }
            template.version = template.version.max(previous.version + 1);
        }
        self.templates.insert(template.name.clone(), template);
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Option<Template> {
        self.templates.shift_remove(name)
    }

    fn names(&self) -> Vec<SmolStr> {
        self.templates.keys().cloned().collect()
    }
}

fn motor_basic() -> Template {
    Template::new("Motor_Basic", "Basic Motor Control")
        .member(
            MemberSpec::new(".Run", "DIGITAL")
                .offset(".RunStatus")
                .comment("{parent_desc} Run Status")
                .trend(),
        )
        .member(
            MemberSpec::new(".Fault", "DIGITAL")
                .offset(".Fault")
                .comment("{parent_desc} Fault")
                .trend()
                .alarm()
                .with_default(DefaultField::AlarmCategory, "ALM_CRIT")
                .with_default(DefaultField::AlarmHelp, "Check motor breaker"),
        )
        .member(
            MemberSpec::new(".Mode", "INT")
                .offset(".Mode")
                .comment("{parent_desc} Control Mode"),
        )
}

fn valve_basic() -> Template {
    Template::new("Valve_Basic", "Basic Valve Control")
        .member(
            MemberSpec::new(".Open", "DIGITAL")
                .offset(".Opened")
                .comment("{parent_desc} Open Limit")
                .trend(),
        )
        .member(
            MemberSpec::new(".Closed", "DIGITAL")
                .offset(".Closed")
                .comment("{parent_desc} Closed Limit")
                .trend(),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_suffix_is_rejected() {
        let template = Template::new("Pump", "")
            .member(MemberSpec::new(".Run", "DIGITAL"))
            .member(MemberSpec::new(".Run", "INT"));
        assert!(matches!(
            template.validate(),
            Err(SyncError::InvalidTemplate { .. })
        ));
    }

    #[test]
    fn replacing_a_template_bumps_version() {
        let mut library = TemplateLibrary::builtin();
        let mut motor = library.get("Motor_Basic").cloned().expect("builtin motor");
        motor.description = "Motor with interlocks".into();
        library.put(motor).expect("valid template");
        assert_eq!(library.get("Motor_Basic").map(|t| t.version), Some(2));
        assert_eq!(library.names(), vec!["Motor_Basic", "Valve_Basic"]);
    }

    #[test]
    fn comment_placeholder_is_replaced_everywhere() {
        let member = MemberSpec::new(".Run", "DIGITAL").comment("{parent_desc} / {parent_desc}");
        assert_eq!(member.render_comment("P1"), "P1 / P1");
        assert_eq!(member.item(), "Run");
    }
}
