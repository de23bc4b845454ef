//! Review state over a classification and the filtered write-back.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use smol_str::SmolStr;

use crate::classify::{Classification, Partition, PartitionKind};
use crate::error::SyncError;
use crate::record::{Record, TableKind};

const KEY_SEPARATOR: char = '·';

/// Addresses one reviewable change: `table·partition·identity`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectionKey {
    pub table: TableKind,
    pub partition: PartitionKind,
    pub identity: SmolStr,
}

impl SelectionKey {
    pub fn new(table: TableKind, partition: PartitionKind, identity: impl Into<SmolStr>) -> Self {
        Self {
            table,
            partition,
            identity: identity.into(),
        }
    }

    /// Parses `table·partition·identity`; `/` is accepted as separator too.
    /// Everything after the second separator belongs to the identity.
    pub fn parse(text: &str) -> Result<Self, SyncError> {
        let mut parts = text.splitn(3, [KEY_SEPARATOR, '/']);
        let (Some(table), Some(partition), Some(identity)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(SyncError::InvalidConfig(
                format!("invalid change key '{text}' (expected table/partition/identity)").into(),
            ));
        };
        Ok(Self::new(
            TableKind::parse(table)?,
            PartitionKind::parse(partition)?,
            identity.trim(),
        ))
    }
}

impl fmt::Display for SelectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{KEY_SEPARATOR}{}{KEY_SEPARATOR}{}",
            self.table, self.partition, self.identity
        )
    }
}

/// Accept/reject flags for the changes of one review session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    entries: BTreeMap<SelectionKey, bool>,
}

impl Selection {
    /// Every new, modified and orphaned row accepted.
    #[must_use]
    pub fn init(classification: &Classification) -> Self {
        let mut selection = Self::default();
        for partition in classification.iter() {
            selection.add_partition(partition);
        }
        selection
    }

    #[must_use]
    pub fn init_partition(partition: &Partition) -> Self {
        let mut selection = Self::default();
        selection.add_partition(partition);
        selection
    }

    fn add_partition(&mut self, partition: &Partition) {
        for kind in PartitionKind::CHANGES {
            for identity in partition.identities(kind) {
                self.entries
                    .insert(SelectionKey::new(partition.table, kind, identity), true);
            }
        }
    }

    /// Absent keys count as accepted.
    #[must_use]
    pub fn is_accepted(&self, key: &SelectionKey) -> bool {
        self.entries.get(key).copied().unwrap_or(true)
    }

    #[must_use]
    pub fn contains(&self, key: &SelectionKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Flips `key`. Unknown keys are ignored; returns whether anything changed.
    pub fn toggle(&mut self, key: &SelectionKey) -> bool {
        match self.entries.get_mut(key) {
            Some(accepted) => {
                *accepted = !*accepted;
                true
            }
            None => false,
        }
    }

    /// Sets `key`. Unknown keys are ignored; returns whether the key exists.
    pub fn set(&mut self, key: &SelectionKey, accepted: bool) -> bool {
        match self.entries.get_mut(key) {
            Some(slot) => {
                *slot = accepted;
                true
            }
            None => false,
        }
    }

    /// Sets every key of one table partition; returns how many were touched.
    pub fn bulk_set(&mut self, table: TableKind, partition: PartitionKind, accepted: bool) -> usize {
        let mut touched = 0;
        for (key, slot) in &mut self.entries {
            if key.table == table && key.partition == partition {
                *slot = accepted;
                touched += 1;
            }
        }
        touched
    }

    pub fn keys(&self) -> impl Iterator<Item = &SelectionKey> {
        self.entries.keys()
    }

    pub fn rejected(&self) -> impl Iterator<Item = &SelectionKey> {
        self.entries
            .iter()
            .filter(|(_, accepted)| !**accepted)
            .map(|(key, _)| key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Accepted changes of one table, ready for the record sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDelta {
    pub table: TableKind,
    pub append: Vec<Record>,
    pub update: Vec<Record>,
    pub delete: Vec<Record>,
}

impl TableDelta {
    #[must_use]
    pub fn empty(table: TableKind) -> Self {
        Self {
            table,
            append: Vec::new(),
            update: Vec::new(),
            delete: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.append.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.append.len() + self.update.len() + self.delete.len()
    }
}

/// Accepted changes of all three tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteBack {
    pub variable: TableDelta,
    pub trend: TableDelta,
    pub alarm: TableDelta,
}

impl WriteBack {
    #[must_use]
    pub fn get(&self, table: TableKind) -> &TableDelta {
        match table {
            TableKind::Variable => &self.variable,
            TableKind::Trend => &self.trend,
            TableKind::Alarm => &self.alarm,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableDelta> {
        [&self.variable, &self.trend, &self.alarm].into_iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().all(TableDelta::is_empty)
    }
}

/// Keeps the accepted new, modified and orphaned rows of `partition`.
/// Unchanged rows are never part of the delta.
#[must_use]
pub fn project(partition: &Partition, selection: &Selection) -> TableDelta {
    let table = partition.table;
    let accepted = |kind, record: &Record| {
        record
            .identity()
            .is_some_and(|identity| selection.is_accepted(&SelectionKey::new(table, kind, identity)))
    };
    TableDelta {
        table,
        append: partition
            .new
            .iter()
            .filter(|record| accepted(PartitionKind::New, record))
            .cloned()
            .collect(),
        update: partition
            .modified
            .iter()
            .filter(|m| {
                selection.is_accepted(&SelectionKey::new(
                    table,
                    PartitionKind::Modified,
                    m.identity.clone(),
                ))
            })
            .map(|m| m.proposed.clone())
            .collect(),
        delete: partition
            .orphaned
            .iter()
            .filter(|record| accepted(PartitionKind::Orphaned, record))
            .cloned()
            .collect(),
    }
}

/// A classification under review.
#[derive(Debug, Clone)]
pub struct ChangeSet {
    classification: Classification,
    selection: Selection,
}

impl ChangeSet {
    /// Starts a review with every change accepted.
    #[must_use]
    pub fn new(classification: Classification) -> Self {
        let selection = Selection::init(&classification);
        Self {
            classification,
            selection,
        }
    }

    #[must_use]
    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn toggle(&mut self, key: &SelectionKey) -> bool {
        self.selection.toggle(key)
    }

    pub fn set(&mut self, key: &SelectionKey, accepted: bool) -> bool {
        self.selection.set(key, accepted)
    }

    pub fn bulk_set(&mut self, table: TableKind, partition: PartitionKind, accepted: bool) -> usize {
        self.selection.bulk_set(table, partition, accepted)
    }

    /// Consumes the review, keeping only accepted changes.
    #[must_use]
    pub fn project(self) -> WriteBack {
        let selection = &self.selection;
        WriteBack {
            variable: project(&self.classification.variable, selection),
            trend: project(&self.classification.trend, selection),
            alarm: project(&self.classification.alarm, selection),
        }
    }
}
