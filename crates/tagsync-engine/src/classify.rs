//! Keyed diff of persisted rows against freshly generated rows.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};

use serde::Serialize;
use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::error::SyncError;
use crate::record::{Record, TableKind, TableSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionKind {
    New,
    Modified,
    Orphaned,
    Unchanged,
}

impl PartitionKind {
    /// Partitions that carry a write-back delta.
    pub const CHANGES: [PartitionKind; 3] = [
        PartitionKind::New,
        PartitionKind::Modified,
        PartitionKind::Orphaned,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Modified => "modified",
            Self::Orphaned => "orphaned",
            Self::Unchanged => "unchanged",
        }
    }

    pub fn parse(text: &str) -> Result<Self, SyncError> {
        match text.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "modified" | "mod" => Ok(Self::Modified),
            "orphaned" | "orphan" | "deleted" => Ok(Self::Orphaned),
            "unchanged" => Ok(Self::Unchanged),
            other => Err(SyncError::InvalidConfig(
                format!("unknown partition '{other}' (expected new/modified/orphaned)").into(),
            )),
        }
    }
}

impl fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row present on both sides whose fields differ.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Modification {
    pub identity: SmolStr,
    pub existing: Record,
    pub proposed: Record,
    /// Differing columns in schema order.
    pub changed_fields: Vec<SmolStr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Persisted,
    Proposed,
}

/// A row left out of classification because it has no identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRecord {
    pub side: Side,
    pub record: Record,
}

/// Four-way split of one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Partition {
    pub table: TableKind,
    pub new: Vec<Record>,
    pub modified: Vec<Modification>,
    pub orphaned: Vec<Record>,
    pub unchanged: Vec<Record>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedRecord>,
}

impl Partition {
    #[must_use]
    pub fn empty(table: TableKind) -> Self {
        Self {
            table,
            new: Vec::new(),
            modified: Vec::new(),
            orphaned: Vec::new(),
            unchanged: Vec::new(),
            skipped: Vec::new(),
        }
    }

    #[must_use]
    pub fn has_changes(&self) -> bool {
        !(self.new.is_empty() && self.modified.is_empty() && self.orphaned.is_empty())
    }

    #[must_use]
    pub fn count(&self, kind: PartitionKind) -> usize {
        match kind {
            PartitionKind::New => self.new.len(),
            PartitionKind::Modified => self.modified.len(),
            PartitionKind::Orphaned => self.orphaned.len(),
            PartitionKind::Unchanged => self.unchanged.len(),
        }
    }

    /// Identities in `kind`, in partition order.
    #[must_use]
    pub fn identities(&self, kind: PartitionKind) -> Vec<SmolStr> {
        match kind {
            PartitionKind::New => self.new.iter().filter_map(Record::identity).collect(),
            PartitionKind::Modified => self.modified.iter().map(|m| m.identity.clone()).collect(),
            PartitionKind::Orphaned => self.orphaned.iter().filter_map(Record::identity).collect(),
            PartitionKind::Unchanged => {
                self.unchanged.iter().filter_map(Record::identity).collect()
            }
        }
    }

    /// One summary line followed by one line per change.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!(
            "{}: {} new, {} modified, {} orphaned, {} unchanged\n",
            self.table,
            self.new.len(),
            self.modified.len(),
            self.orphaned.len(),
            self.unchanged.len()
        );
        for identity in self.identities(PartitionKind::New) {
            let _ = writeln!(out, "  + {identity}");
        }
        for modification in &self.modified {
            let _ = writeln!(
                out,
                "  ~ {} [{}]",
                modification.identity,
                modification.changed_fields.join(", ")
            );
        }
        for identity in self.identities(PartitionKind::Orphaned) {
            let _ = writeln!(out, "  - {identity}");
        }
        out
    }
}

/// Classification of all three tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub variable: Partition,
    pub trend: Partition,
    pub alarm: Partition,
}

impl Classification {
    #[must_use]
    pub fn get(&self, table: TableKind) -> &Partition {
        match table {
            TableKind::Variable => &self.variable,
            TableKind::Trend => &self.trend,
            TableKind::Alarm => &self.alarm,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Partition> {
        [&self.variable, &self.trend, &self.alarm].into_iter()
    }

    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.iter().any(Partition::has_changes)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClassifyOptions {
    /// Compare persistence-managed columns such as `GUID`.
    pub compare_managed: bool,
    /// Extra columns left out of the comparison.
    pub ignore: Vec<SmolStr>,
}

impl ClassifyOptions {
    fn compares(&self, table: TableKind, field: &str) -> bool {
        if self.ignore.iter().any(|ignored| ignored == field) {
            return false;
        }
        self.compare_managed || !table.field(field).is_some_and(|spec| spec.managed)
    }
}

/// Classifies one table with default options.
pub fn classify(
    table: TableKind,
    persisted: &[Record],
    proposed: &[Record],
) -> Result<Partition, SyncError> {
    classify_with(table, persisted, proposed, &ClassifyOptions::default())
}

/// Splits `persisted` and `proposed` into new, modified, orphaned and
/// unchanged rows keyed by identity.
///
/// Rows without an identity are reported in [`Partition::skipped`]. An
/// identity repeated on one side is an [`SyncError::IdentityCollision`].
pub fn classify_with(
    table: TableKind,
    persisted: &[Record],
    proposed: &[Record],
    options: &ClassifyOptions,
) -> Result<Partition, SyncError> {
    let mut partition = Partition::empty(table);
    let existing = index(table, persisted, Side::Persisted, &mut partition.skipped)?;
    let candidates = index(table, proposed, Side::Proposed, &mut partition.skipped)?;

    for (identity, candidate) in &candidates {
        match existing.get(identity) {
            None => partition.new.push((*candidate).clone()),
            Some(current) => {
                let changed_fields = changed_fields(table, current, candidate, options);
                if changed_fields.is_empty() {
                    partition.unchanged.push((*candidate).clone());
                } else {
                    partition.modified.push(Modification {
                        identity: identity.clone(),
                        existing: (*current).clone(),
                        proposed: (*candidate).clone(),
                        changed_fields,
                    });
                }
            }
        }
    }
    for (identity, current) in &existing {
        if !candidates.contains_key(identity) {
            partition.orphaned.push((*current).clone());
        }
    }

    debug!(
        %table,
        new = partition.new.len(),
        modified = partition.modified.len(),
        orphaned = partition.orphaned.len(),
        unchanged = partition.unchanged.len(),
        skipped = partition.skipped.len(),
        "classified table"
    );
    Ok(partition)
}

/// Classifies each table independently.
pub fn classify_tables(persisted: &TableSet, proposed: &TableSet) -> Result<Classification, SyncError> {
    classify_tables_with(persisted, proposed, &ClassifyOptions::default())
}

pub fn classify_tables_with(
    persisted: &TableSet,
    proposed: &TableSet,
    options: &ClassifyOptions,
) -> Result<Classification, SyncError> {
    let run = |table| classify_with(table, persisted.get(table), proposed.get(table), options);
    Ok(Classification {
        variable: run(TableKind::Variable)?,
        trend: run(TableKind::Trend)?,
        alarm: run(TableKind::Alarm)?,
    })
}

fn index<'a>(
    table: TableKind,
    records: &'a [Record],
    side: Side,
    skipped: &mut Vec<SkippedRecord>,
) -> Result<BTreeMap<SmolStr, &'a Record>, SyncError> {
    let mut map = BTreeMap::new();
    for record in records {
        let identity = if record.table() == table {
            record.identity()
        } else {
            None
        };
        let Some(identity) = identity else {
            warn!(
                %table,
                side = ?side,
                "skipping record without {} identity",
                table.identity_field()
            );
            skipped.push(SkippedRecord {
                side,
                record: record.clone(),
            });
            continue;
        };
        if map.insert(identity.clone(), record).is_some() {
            return Err(SyncError::collision(table, identity));
        }
    }
    Ok(map)
}

/// Columns whose normalized values differ, missing columns reading as empty.
#[must_use]
pub fn changed_fields(
    table: TableKind,
    existing: &Record,
    proposed: &Record,
    options: &ClassifyOptions,
) -> Vec<SmolStr> {
    let mut fields: Vec<&SmolStr> = existing.fields().map(|(name, _)| name).collect();
    for (name, _) in proposed.fields() {
        if !fields.contains(&name) {
            fields.push(name);
        }
    }
    fields.sort_by_key(|name| (table.column_index(name).unwrap_or(usize::MAX), *name));

    fields
        .into_iter()
        .filter(|name| options.compares(table, name))
        .filter(|name| existing.text(name) != proposed.text(name))
        .cloned()
        .collect()
}
