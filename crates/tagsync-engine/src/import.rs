//! Re-import of persisted tables into the editable tag list.

#![allow(missing_docs)]

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::error::SyncError;
use crate::expand::expand_single;
use crate::identity::infer_prefix;
use crate::record::{Record, TableSet};
use crate::settings::{DefaultField, DefaultSet, Settings};
use crate::tag::{AlarmOptions, SingleTag, TagEntry, TagKind, TrendOptions};

/// Tag-level difference between the current list and a re-import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportDiff {
    /// Incoming versions of entries present on both sides, in current order.
    pub matched: Vec<TagEntry>,
    /// Incoming only, in incoming order.
    pub added: Vec<TagEntry>,
    /// Current only, in current order.
    pub removed: Vec<TagEntry>,
    pub unchanged_count: usize,
}

/// Keep/drop decisions over an [`ImportDiff`]. Everything is accepted until
/// rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSelection {
    rejected_added: FxHashSet<SmolStr>,
    rejected_removals: FxHashSet<SmolStr>,
}

impl ImportSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops an incoming-only entry from the merged list.
    pub fn reject_added(&mut self, identity: impl Into<SmolStr>) {
        self.rejected_added.insert(identity.into());
    }

    /// Keeps a current-only entry the import would remove.
    pub fn reject_removal(&mut self, identity: impl Into<SmolStr>) {
        self.rejected_removals.insert(identity.into());
    }

    pub fn toggle_added(&mut self, identity: &str) {
        if !self.rejected_added.remove(identity) {
            self.rejected_added.insert(identity.into());
        }
    }

    pub fn toggle_removal(&mut self, identity: &str) {
        if !self.rejected_removals.remove(identity) {
            self.rejected_removals.insert(identity.into());
        }
    }

    /// Rejects or re-accepts every added entry of `diff`.
    pub fn set_all_added(&mut self, diff: &ImportDiff, rejected: bool) {
        self.rejected_added.clear();
        if rejected {
            self.rejected_added
                .extend(diff.added.iter().map(|tag| tag.identity().clone()));
        }
    }

    /// Rejects or re-accepts every removal of `diff`.
    pub fn set_all_removals(&mut self, diff: &ImportDiff, rejected: bool) {
        self.rejected_removals.clear();
        if rejected {
            self.rejected_removals
                .extend(diff.removed.iter().map(|tag| tag.identity().clone()));
        }
    }

    #[must_use]
    pub fn accepts_added(&self, identity: &str) -> bool {
        !self.rejected_added.contains(identity)
    }

    #[must_use]
    pub fn accepts_removal(&self, identity: &str) -> bool {
        !self.rejected_removals.contains(identity)
    }
}

impl ImportDiff {
    /// Final tag list: matched entries, then accepted additions, then the
    /// removals the caller rejected.
    #[must_use]
    pub fn apply(&self, selection: &ImportSelection) -> Vec<TagEntry> {
        let added = self
            .added
            .iter()
            .filter(|tag| selection.accepts_added(tag.identity()));
        let kept = self
            .removed
            .iter()
            .filter(|tag| !selection.accepts_removal(tag.identity()));
        self.matched.iter().chain(added).chain(kept).cloned().collect()
    }
}

/// Compares `current` against `incoming` by identity.
///
/// A repeated identity within one side keeps its first entry; later
/// duplicates are dropped with a warning.
#[must_use]
pub fn merge_import(current: &[TagEntry], incoming: &[TagEntry]) -> ImportDiff {
    let current = first_by_identity(current, "current");
    let incoming = first_by_identity(incoming, "incoming");

    let mut diff = ImportDiff::default();
    for (identity, tag) in &current {
        match incoming.get(identity) {
            Some(newer) => diff.matched.push((*newer).clone()),
            None => diff.removed.push((*tag).clone()),
        }
    }
    diff.added = incoming
        .iter()
        .filter(|(identity, _)| !current.contains_key(*identity))
        .map(|(_, tag)| (*tag).clone())
        .collect();
    diff.unchanged_count = diff.matched.len();

    debug!(
        matched = diff.matched.len(),
        added = diff.added.len(),
        removed = diff.removed.len(),
        "merged import"
    );
    diff
}

fn first_by_identity<'a>(tags: &'a [TagEntry], side: &str) -> IndexMap<&'a str, &'a TagEntry> {
    let mut map = IndexMap::with_capacity(tags.len());
    for tag in tags {
        if map.contains_key(tag.identity().as_str()) {
            warn!(identity = %tag.identity(), side, "ignoring duplicate tag in import");
            continue;
        }
        map.insert(tag.identity().as_str(), tag);
    }
    map
}

/// Rebuilds single tag entries from persisted tables.
///
/// Variable rows are the master list. A trend row attaches to the variable
/// with the same `NAME`; an alarm row attaches to the variable named by its
/// `VAR_A`. Rebuilt entries keep the persisted name (`Manual` naming) and
/// carry every column the default fill would not reproduce, so expanding
/// them again yields the persisted rows.
pub fn tags_from_records(tables: &TableSet, settings: &Settings) -> Result<Vec<TagEntry>, SyncError> {
    tables.ensure_unique()?;

    let trends: FxHashMap<SmolStr, &Record> = tables
        .trend
        .iter()
        .filter_map(|record| record.identity().map(|name| (name, record)))
        .collect();
    let mut alarms: FxHashMap<SmolStr, &Record> = FxHashMap::default();
    for record in &tables.alarm {
        let var_a = record.text("VAR_A");
        if var_a.is_empty() {
            warn!(tag = ?record.identity(), "alarm without VAR_A is not linked to a tag");
            continue;
        }
        if alarms.contains_key(&var_a) {
            warn!(tag = ?record.identity(), variable = %var_a, "variable already has an alarm");
            continue;
        }
        alarms.insert(var_a, record);
    }

    let mut linked_trends = 0;
    let mut linked_alarms = 0;
    let mut tags = Vec::with_capacity(tables.variable.len());
    for variable in &tables.variable {
        let Some(name) = variable.identity() else {
            warn!("skipping variable without NAME");
            continue;
        };
        let trend = trends.get(&name).copied();
        let alarm = alarms.get(&name).copied();
        linked_trends += usize::from(trend.is_some());
        linked_alarms += usize::from(alarm.is_some());
        tags.push(rebuild_entry(&name, variable, trend, alarm, settings)?);
    }

    let unlinked = tables.trend.len() + tables.alarm.len() - linked_trends - linked_alarms;
    if unlinked > 0 {
        warn!(unlinked, "trend or alarm rows without a matching variable were not imported");
    }
    debug!(tags = tags.len(), linked_trends, linked_alarms, "rebuilt tags from records");
    Ok(tags)
}

fn rebuild_entry(
    name: &SmolStr,
    variable: &Record,
    trend: Option<&Record>,
    alarm: Option<&Record>,
    settings: &Settings,
) -> Result<TagEntry, SyncError> {
    let address = variable.text("ADDR");
    let prefix = infer_prefix(name, &address).unwrap_or_default();
    let equip = variable.text("EQUIP");
    let item = variable.text("ITEM");

    let mut single = SingleTag {
        data_type: variable.text("TYPE"),
        eng_units: variable.text("ENG_UNITS"),
        eng_zero: variable.text("ENG_ZERO"),
        eng_full: variable.text("ENG_FULL"),
        format: variable.text("FORMAT"),
        equipment: (equip != *name).then_some(equip),
        item: (item != "Value").then_some(item),
        ..SingleTag::default()
    };
    if let Some(trend) = trend {
        single.trend = TrendOptions {
            enabled: true,
            name: None,
            trigger: trend.text("TRIG"),
            defaults: defaults_from(
                trend,
                &[
                    (DefaultField::SamplePeriod, "SAMPLEPER"),
                    (DefaultField::TrendType, "TYPE"),
                    (DefaultField::TrendFiles, "FILES"),
                    (DefaultField::StorageMethod, "STORMETHOD"),
                ],
            ),
            extra: IndexMap::new(),
        };
    }
    if let Some(alarm) = alarm {
        let tag = alarm.text("TAG");
        single.alarm = AlarmOptions {
            enabled: true,
            name: (tag != *name).then_some(tag),
            defaults: defaults_from(
                alarm,
                &[
                    (DefaultField::AlarmCategory, "CATEGORY"),
                    (DefaultField::AlarmPriority, "PRIORITY"),
                    (DefaultField::AlarmHelp, "HELP"),
                    (DefaultField::AlarmDelay, "DELAY"),
                    (DefaultField::AlarmArea, "AREA"),
                ],
            ),
            extra: IndexMap::new(),
        };
    }

    let mut entry = TagEntry::named(name.clone(), prefix, address, TagKind::Single(single.clone()))
        .with_description(variable.text("COMMENT"));
    let cluster = variable.text("CLUSTER");
    if cluster != settings.cluster {
        entry.cluster = Some(cluster);
    }
    let unit = variable.text("UNIT");
    if unit != settings.io_device {
        entry.io_device = Some(unit);
    }

    let baseline = expand_single(&entry, &single, settings)?;
    single.extra = residue(variable, baseline.variable.first());
    if let Some(trend) = trend {
        single.trend.extra = residue(trend, baseline.trend.first());
    }
    if let Some(alarm) = alarm {
        single.alarm.extra = residue(alarm, baseline.alarm.first());
    }
    entry.kind = TagKind::Single(single);
    Ok(entry)
}

fn defaults_from(record: &Record, columns: &[(DefaultField, &str)]) -> DefaultSet {
    let mut defaults = DefaultSet::default();
    for &(field, column) in columns {
        let value = record.text(column);
        if !value.is_empty() {
            defaults.set(field, value);
        }
    }
    defaults
}

/// Columns of `persisted` that the default fill renders differently.
fn residue(persisted: &Record, baseline: Option<&Record>) -> IndexMap<SmolStr, SmolStr> {
    let mut extra = IndexMap::new();
    for spec in persisted.table().schema().iter().filter(|spec| !spec.managed) {
        let value = persisted.text(spec.name);
        let generated = baseline.map(|record| record.text(spec.name)).unwrap_or_default();
        if value != generated {
            extra.insert(SmolStr::new_static(spec.name), value);
        }
    }
    extra
}
