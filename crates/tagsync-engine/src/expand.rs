//! Tag expansion into variable, trend and alarm rows.

#![allow(missing_docs)]

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::error::SyncError;
use crate::record::{Record, TableKind, TableSet};
use crate::settings::{resolve_default, DefaultField, Settings};
use crate::tag::{Enablement, SingleTag, TagEntry, TagKind};
use crate::template::{Template, TemplateStore};

/// Result of expanding a whole tag list.
#[derive(Debug, Clone, Default)]
pub struct Expansion {
    pub tables: TableSet,
    /// Entries skipped because they could not be expanded on their own.
    pub failures: Vec<ExpansionFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionFailure {
    pub identity: SmolStr,
    pub error: SyncError,
}

/// Attributes shared by every row generated from one entry.
struct Shared<'a> {
    cluster: &'a SmolStr,
    io_device: &'a SmolStr,
}

impl<'a> Shared<'a> {
    fn new(entry: &'a TagEntry, settings: &'a Settings) -> Self {
        Self {
            cluster: entry.cluster.as_ref().unwrap_or(&settings.cluster),
            io_device: entry.io_device.as_ref().unwrap_or(&settings.io_device),
        }
    }
}

/// Expands a UDT instance against `template`.
///
/// Member rows are named `identity + suffix` and addressed
/// `address + offset`. Trend and alarm rows share the member identity.
/// Nothing is returned when two members collide.
pub fn expand_udt(
    entry: &TagEntry,
    template: &Template,
    settings: &Settings,
) -> Result<TableSet, SyncError> {
    let (trends, alarms) = match &entry.kind {
        TagKind::Udt(udt) => (udt.trends, udt.alarms),
        TagKind::Single(_) => (Enablement::FromTemplate, Enablement::FromTemplate),
    };
    let shared = Shared::new(entry, settings);
    let parent = entry.identity();
    let mut out = TableSet::default();
    let mut seen = rustc_hash::FxHashSet::default();

    for member in &template.members {
        let name = format!("{parent}{}", member.suffix);
        if !seen.insert(name.clone()) {
            return Err(SyncError::collision(TableKind::Variable, name));
        }
        let address = format!("{}{}", entry.address(), member.address_offset);
        let comment = member.render_comment(&entry.description);
        let item = member.item();
        let layers = [&member.defaults, &template.defaults, &settings.defaults];
        let value = |field| resolve_default(field, &layers);

        let mut variable = Record::new(TableKind::Variable);
        variable.put("NAME", name.as_str());
        variable.put("TYPE", &member.data_type);
        variable.put("UNIT", shared.io_device);
        variable.put("ADDR", address);
        variable.put("COMMENT", comment.as_str());
        variable.put("EQUIP", parent);
        variable.put("ITEM", item);
        variable.put("CLUSTER", shared.cluster);
        out.variable.push(variable);

        if trends.resolve(member.is_trend) {
            let mut trend = Record::new(TableKind::Trend);
            trend.put("NAME", name.as_str());
            trend.put("EXPR", name.as_str());
            trend.put("SAMPLEPER", value(DefaultField::SamplePeriod));
            trend.put("TYPE", value(DefaultField::TrendType));
            trend.put("FILENAME", name.as_str());
            trend.put("FILES", value(DefaultField::TrendFiles));
            trend.put("STORMETHOD", value(DefaultField::StorageMethod));
            trend.put("COMMENT", comment.as_str());
            trend.put("EQUIP", parent);
            trend.put("ITEM", item);
            trend.put("CLUSTER", shared.cluster);
            out.trend.push(trend);
        }

        if alarms.resolve(member.is_alarm) {
            let help = value(DefaultField::AlarmHelp);
            let mut alarm = Record::new(TableKind::Alarm);
            alarm.put("TAG", name.as_str());
            alarm.put("NAME", name.as_str());
            alarm.put(
                "DESC",
                if help.is_empty() {
                    comment.as_str()
                } else {
                    help.as_str()
                },
            );
            alarm.put("VAR_A", name.as_str());
            alarm.put("CATEGORY", value(DefaultField::AlarmCategory));
            alarm.put("PRIORITY", value(DefaultField::AlarmPriority));
            alarm.put("HELP", help.clone());
            alarm.put("DELAY", value(DefaultField::AlarmDelay));
            alarm.put("AREA", value(DefaultField::AlarmArea));
            alarm.put("COMMENT", comment.as_str());
            alarm.put("EQUIP", parent);
            alarm.put("ITEM", item);
            alarm.put("CLUSTER", shared.cluster);
            out.alarm.push(alarm);
        }
    }

    debug!(
        instance = %parent,
        template = %template.name,
        variables = out.variable.len(),
        trends = out.trend.len(),
        alarms = out.alarm.len(),
        "expanded udt instance"
    );
    Ok(out)
}

/// Builds the rows of a single tag, filling trend and alarm fields from the
/// tag's own values, then the project defaults.
pub fn expand_single(
    entry: &TagEntry,
    single: &SingleTag,
    settings: &Settings,
) -> Result<TableSet, SyncError> {
    let shared = Shared::new(entry, settings);
    let name = entry.identity();
    let equipment = single.equipment.as_ref().unwrap_or(name);
    let item = single.item.as_deref().unwrap_or("Value");
    let mut out = TableSet::default();

    let mut variable = Record::new(TableKind::Variable);
    variable.put("NAME", name);
    variable.put("TYPE", &single.data_type);
    variable.put("UNIT", shared.io_device);
    variable.put("ADDR", entry.address());
    variable.put("COMMENT", &entry.description);
    variable.put("EQUIP", equipment);
    variable.put("ITEM", item);
    variable.put("CLUSTER", shared.cluster);
    variable.put("ENG_UNITS", &single.eng_units);
    variable.put("FORMAT", &single.format);
    variable.put("ENG_ZERO", &single.eng_zero);
    variable.put("ENG_FULL", &single.eng_full);
    apply_extra(&mut variable, &single.extra)?;
    out.variable.push(variable);

    if single.trend.enabled {
        let layers = [&single.trend.defaults, &settings.defaults];
        let value = |field| resolve_default(field, &layers);
        let trend_name = single.trend.name.as_ref().unwrap_or(name);
        let mut trend = Record::new(TableKind::Trend);
        trend.put("NAME", trend_name);
        trend.put("EXPR", name);
        trend.put("SAMPLEPER", value(DefaultField::SamplePeriod));
        trend.put("TYPE", value(DefaultField::TrendType));
        trend.put("COMMENT", &entry.description);
        trend.put("EQUIP", equipment);
        trend.put("ITEM", item);
        trend.put("CLUSTER", shared.cluster);
        trend.put("FILENAME", trend_name);
        trend.put("FILES", value(DefaultField::TrendFiles));
        trend.put("STORMETHOD", value(DefaultField::StorageMethod));
        trend.put("TRIG", &single.trend.trigger);
        apply_extra(&mut trend, &single.trend.extra)?;
        out.trend.push(trend);
    }

    if single.alarm.enabled {
        let layers = [&single.alarm.defaults, &settings.defaults];
        let value = |field| resolve_default(field, &layers);
        let tag = single.alarm.name.as_ref().unwrap_or(name);
        let help = value(DefaultField::AlarmHelp);
        let mut alarm = Record::new(TableKind::Alarm);
        alarm.put("TAG", tag);
        alarm.put("NAME", tag);
        alarm.put(
            "DESC",
            if help.is_empty() {
                entry.description.clone()
            } else {
                help.clone()
            },
        );
        alarm.put("VAR_A", name);
        alarm.put("CATEGORY", value(DefaultField::AlarmCategory));
        alarm.put("PRIORITY", value(DefaultField::AlarmPriority));
        alarm.put("HELP", help);
        alarm.put("DELAY", value(DefaultField::AlarmDelay));
        alarm.put("AREA", value(DefaultField::AlarmArea));
        alarm.put("COMMENT", &entry.description);
        alarm.put("EQUIP", equipment);
        alarm.put("ITEM", item);
        alarm.put("CLUSTER", shared.cluster);
        apply_extra(&mut alarm, &single.alarm.extra)?;
        out.alarm.push(alarm);
    }

    Ok(out)
}

fn apply_extra(record: &mut Record, extra: &IndexMap<SmolStr, SmolStr>) -> Result<(), SyncError> {
    for (field, value) in extra {
        record.set(field, value)?;
    }
    Ok(())
}

/// Expands one entry, resolving its template through `templates`.
pub fn expand_entry(
    entry: &TagEntry,
    templates: &impl TemplateStore,
    settings: &Settings,
) -> Result<TableSet, SyncError> {
    match &entry.kind {
        TagKind::Single(single) => expand_single(entry, single, settings),
        TagKind::Udt(udt) => {
            let template = templates
                .get(&udt.template)
                .ok_or_else(|| SyncError::UnknownTemplate(udt.template.clone()))?;
            expand_udt(entry, template, settings)
        }
    }
}

/// Expands every entry of a tag list.
///
/// An entry that fails on its own (unknown template, bad column) is
/// recorded in [`Expansion::failures`] and the rest still expand. An
/// identity produced twice in any table fails the whole batch.
pub fn expand_all(
    tags: &[TagEntry],
    templates: &impl TemplateStore,
    settings: &Settings,
) -> Result<Expansion, SyncError> {
    let mut expansion = Expansion::default();
    for entry in tags {
        match expand_entry(entry, templates, settings) {
            Ok(tables) => expansion.tables.extend(tables),
            Err(err @ SyncError::IdentityCollision { .. }) => return Err(err),
            Err(error) => {
                warn!(tag = %entry.identity(), %error, "skipping tag that failed to expand");
                expansion.failures.push(ExpansionFailure {
                    identity: entry.identity().clone(),
                    error,
                });
            }
        }
    }
    expansion.tables.ensure_unique()?;
    debug!(
        tags = tags.len(),
        records = expansion.tables.len(),
        failures = expansion.failures.len(),
        "expanded tag list"
    );
    Ok(expansion)
}
