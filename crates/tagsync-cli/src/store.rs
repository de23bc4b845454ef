//! JSON-file project store.
//!
//! Each table lives in `<project>/<stem>.json` as an array of field objects;
//! the editable tag list lives in `tags.json`. Writes keep the previous file
//! as `*.bak` and replace the target through a temp-file rename.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use smol_str::SmolStr;
use tagsync_engine::{
    CommitSummary, FieldValue, Record, RecordSink, RecordSource, SyncError, TableDelta, TableKind,
    TagEntry, TagSink, TagSource,
};
use tracing::{debug, info};

pub const TAGS_FILE: &str = "tags.json";

const GUID: &str = "GUID";

#[derive(Debug, Clone)]
pub struct JsonProject {
    root: PathBuf,
}

impl JsonProject {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, SyncError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(SyncError::Store(
                format!("project folder not found: {}", root.display()).into(),
            ));
        }
        Ok(Self { root })
    }

    pub fn table_path(&self, table: TableKind) -> PathBuf {
        self.root.join(format!("{}.json", table.file_stem()))
    }

    pub fn tags_path(&self) -> PathBuf {
        self.root.join(TAGS_FILE)
    }

    fn write_records(&self, table: TableKind, rows: &[Record]) -> Result<(), SyncError> {
        let text = serde_json::to_string_pretty(rows)
            .map_err(|err| SyncError::Store(format!("encode {table} rows: {err}").into()))?;
        write_replacing(&self.table_path(table), &text)
    }
}

impl RecordSource for JsonProject {
    fn load(&self, table: TableKind) -> Result<Vec<Record>, SyncError> {
        let path = self.table_path(table);
        let Some(text) = read_optional(&path)? else {
            return Ok(Vec::new());
        };
        let rows: Vec<Map<String, Value>> = serde_json::from_str(&text)
            .map_err(|err| SyncError::Store(format!("{}: {err}", path.display()).into()))?;
        rows.into_iter()
            .map(|row| {
                let fields = row
                    .into_iter()
                    .map(|(key, value)| Ok((key, field_value(value)?)))
                    .collect::<Result<Vec<_>, SyncError>>()?;
                Record::from_raw(table, fields)
            })
            .collect()
    }
}

impl RecordSink for JsonProject {
    fn commit(&mut self, delta: &TableDelta) -> Result<CommitSummary, SyncError> {
        let table = delta.table;
        let mut rows = self.load(table)?;
        let summary = apply_delta(&mut rows, delta)?;
        self.write_records(table, &rows)?;
        info!(
            %table,
            appended = summary.appended,
            updated = summary.updated,
            deleted = summary.deleted,
            "committed table"
        );
        Ok(summary)
    }
}

impl TagSource for JsonProject {
    fn load_tags(&self) -> Result<Vec<TagEntry>, SyncError> {
        let path = self.tags_path();
        let Some(text) = read_optional(&path)? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&text)
            .map_err(|err| SyncError::Store(format!("{}: {err}", path.display()).into()))
    }
}

impl TagSink for JsonProject {
    fn save_tags(&mut self, tags: &[TagEntry]) -> Result<(), SyncError> {
        let text = serde_json::to_string_pretty(tags)
            .map_err(|err| SyncError::Store(format!("encode tags: {err}").into()))?;
        write_replacing(&self.tags_path(), &text)
    }
}

/// Applies a delta in place. Updated rows keep their GUID; appended rows
/// without one get a fresh v4 GUID.
fn apply_delta(rows: &mut Vec<Record>, delta: &TableDelta) -> Result<CommitSummary, SyncError> {
    let mut summary = CommitSummary::default();

    let doomed: Vec<SmolStr> = delta.delete.iter().filter_map(Record::identity).collect();
    let before = rows.len();
    rows.retain(|row| row.identity().map_or(true, |id| !doomed.contains(&id)));
    summary.deleted = before - rows.len();

    for proposed in &delta.update {
        let identity = proposed.identity();
        let Some(row) = rows.iter_mut().find(|row| row.identity() == identity) else {
            return Err(SyncError::Store(
                format!(
                    "{} row '{}' vanished before update",
                    delta.table,
                    identity.unwrap_or_default()
                )
                .into(),
            ));
        };
        let guid = row.get(GUID).cloned();
        *row = proposed.clone();
        if let Some(guid) = guid {
            row.set(GUID, guid)?;
        }
        summary.updated += 1;
    }

    for proposed in &delta.append {
        let mut row = proposed.clone();
        if row.text(GUID).is_empty() {
            row.set(GUID, uuid::Uuid::new_v4().to_string())?;
        }
        rows.push(row);
        summary.appended += 1;
    }
    Ok(summary)
}

fn field_value(value: Value) -> Result<FieldValue, SyncError> {
    match value {
        Value::String(text) => Ok(FieldValue::Text(text.into())),
        Value::Bool(flag) => Ok(FieldValue::Bool(flag)),
        Value::Number(number) => number
            .as_f64()
            .map(FieldValue::Number)
            .ok_or_else(|| SyncError::Store(format!("unsupported number {number}").into())),
        Value::Null => Ok(FieldValue::Text(SmolStr::default())),
        other => Err(SyncError::Store(
            format!("field values must be scalars, found {other}").into(),
        )),
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, SyncError> {
    if !path.exists() {
        return Ok(None);
    }
    fs::read_to_string(path)
        .map(Some)
        .map_err(|err| SyncError::Store(format!("read {}: {err}", path.display()).into()))
}

/// Backs up `path` to `*.bak`, then swaps in `text` through a temp file.
fn write_replacing(path: &Path, text: &str) -> Result<(), SyncError> {
    let store_err = |action: &str, err: std::io::Error| {
        SyncError::Store(format!("{action} {}: {err}", path.display()).into())
    };
    let temp = sibling(path, "tmp");
    fs::write(&temp, text).map_err(|err| store_err("write", err))?;
    if path.exists() {
        fs::copy(path, sibling(path, "bak")).map_err(|err| store_err("back up", err))?;
    }
    fs::rename(&temp, path).map_err(|err| store_err("replace", err))?;
    debug!(path = %path.display(), "wrote project file");
    Ok(())
}

fn sibling(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str) -> Record {
        Record::new(TableKind::Variable).with("NAME", name).unwrap()
    }

    #[test]
    fn updates_keep_guid_and_appends_get_one() {
        let mut rows = vec![
            row("A").with("GUID", "keep-me").unwrap(),
            row("B").with("GUID", "gone").unwrap(),
        ];
        let delta = TableDelta {
            table: TableKind::Variable,
            append: vec![row("C")],
            update: vec![row("A").with("FORMAT", "#.##").unwrap()],
            delete: vec![row("B")],
        };
        let summary = apply_delta(&mut rows, &delta).unwrap();

        assert_eq!((summary.appended, summary.updated, summary.deleted), (1, 1, 1));
        assert_eq!(rows[0].text("GUID"), "keep-me");
        assert_eq!(rows[0].text("FORMAT"), "#.##");
        assert_eq!(rows[1].identity().as_deref(), Some("C"));
        assert_eq!(rows[1].text("GUID").len(), 36);
    }

    #[test]
    fn nested_values_are_rejected() {
        assert!(field_value(Value::Array(vec![])).is_err());
        assert_eq!(
            field_value(Value::Null).unwrap(),
            FieldValue::Text(SmolStr::default())
        );
    }

    #[test]
    fn sibling_appends_extension() {
        assert_eq!(
            sibling(Path::new("/p/variable.json"), "bak"),
            PathBuf::from("/p/variable.json.bak")
        );
    }
}
