//! Persistence collaborators.
//!
//! The engine never touches files. Callers hand it persisted rows through a
//! [`RecordSource`] and commit accepted changes through a [`RecordSink`].

#![allow(missing_docs)]

use crate::change_set::{TableDelta, WriteBack};
use crate::error::SyncError;
use crate::record::{Record, TableKind, TableSet};
use crate::tag::TagEntry;

/// Reads the persisted rows of one table.
pub trait RecordSource {
    fn load(&self, table: TableKind) -> Result<Vec<Record>, SyncError>;

    fn load_all(&self) -> Result<TableSet, SyncError> {
        Ok(TableSet {
            variable: self.load(TableKind::Variable)?,
            trend: self.load(TableKind::Trend)?,
            alarm: self.load(TableKind::Alarm)?,
        })
    }
}

/// Applies accepted changes to one table.
///
/// A commit either lands completely or reports an error. Implementations
/// keep the managed columns of updated rows and assign them to appended rows.
pub trait RecordSink {
    fn commit(&mut self, delta: &TableDelta) -> Result<CommitSummary, SyncError>;

    /// Commits every non-empty table delta, stopping at the first failure.
    fn commit_all(&mut self, write_back: &WriteBack) -> Result<CommitSummary, SyncError> {
        let mut total = CommitSummary::default();
        for delta in write_back.iter().filter(|delta| !delta.is_empty()) {
            total += self.commit(delta)?;
        }
        Ok(total)
    }
}

/// Counts of rows written by a commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub appended: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl std::ops::AddAssign for CommitSummary {
    fn add_assign(&mut self, other: Self) {
        self.appended += other.appended;
        self.updated += other.updated;
        self.deleted += other.deleted;
    }
}

/// Holds the editable tag list between sessions.
pub trait TagSource {
    fn load_tags(&self) -> Result<Vec<TagEntry>, SyncError>;
}

pub trait TagSink {
    fn save_tags(&mut self, tags: &[TagEntry]) -> Result<(), SyncError>;
}
