//! `tagsync-engine` - reconciliation and UDT expansion for PlantSCADA tag databases.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

/// Accept/reject review and the filtered write-back.
pub mod change_set;
/// Keyed diff of persisted against generated rows.
pub mod classify;
/// Project configuration (`tagsync.toml`).
pub mod config;
/// Engine errors.
pub mod error;
/// Tag and template expansion into table rows.
pub mod expand;
/// Canonical identity derivation.
pub mod identity;
/// Re-import merge and tag reconstruction.
pub mod import;
/// Record tables and field schemas.
pub mod record;
/// Project defaults and the fallback chain.
pub mod settings;
/// Persistence collaborator traits.
pub mod store;
/// Editable tag entries.
pub mod tag;
/// UDT templates and the template store.
pub mod template;

pub use change_set::{project, ChangeSet, Selection, SelectionKey, TableDelta, WriteBack};
pub use classify::{
    classify, classify_tables, classify_tables_with, classify_with, Classification,
    ClassifyOptions, Modification, Partition, PartitionKind,
};
pub use config::ProjectConfig;
pub use error::SyncError;
pub use expand::{expand_all, expand_entry, expand_single, expand_udt, Expansion};
pub use identity::{derive_identity, infer_prefix, sanitize_address, NameMode};
pub use import::{merge_import, tags_from_records, ImportDiff, ImportSelection};
pub use record::{FieldValue, Record, TableKind, TableSet};
pub use settings::{DefaultField, DefaultSet, Settings};
pub use store::{CommitSummary, RecordSink, RecordSource, TagSink, TagSource};
pub use tag::{Enablement, TagEntry, TagKind};
pub use template::{MemberSpec, Template, TemplateLibrary, TemplateStore};
