#![allow(dead_code)]

use tagsync_engine::{
    CommitSummary, DefaultField, MemberSpec, Record, RecordSink, RecordSource, SyncError,
    TableDelta, TableKind, TableSet, Template,
};

/// Two-member pump: `.Run` plain, `.Fault` alarmed with category 2.
pub fn pump_template() -> Template {
    Template::new("Pump", "Pump with fault")
        .member(MemberSpec::new(".Run", "DIGITAL"))
        .member(
            MemberSpec::new(".Fault", "DIGITAL")
                .alarm()
                .with_default(DefaultField::AlarmCategory, "2"),
        )
}

pub fn record(table: TableKind, fields: &[(&str, &str)]) -> Record {
    Record::from_raw(table, fields.iter().copied()).expect("fields in schema")
}

pub fn variable(fields: &[(&str, &str)]) -> Record {
    record(TableKind::Variable, fields)
}

pub fn names(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .filter_map(Record::identity)
        .map(|name| name.to_string())
        .collect()
}

/// In-memory record store with sequential GUIDs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub tables: TableSet,
    next_guid: usize,
}

impl MemoryStore {
    pub fn new(tables: TableSet) -> Self {
        Self {
            tables,
            next_guid: 0,
        }
    }
}

impl RecordSource for MemoryStore {
    fn load(&self, table: TableKind) -> Result<Vec<Record>, SyncError> {
        Ok(self.tables.get(table).to_vec())
    }
}

impl RecordSink for MemoryStore {
    fn commit(&mut self, delta: &TableDelta) -> Result<CommitSummary, SyncError> {
        let rows = self.tables.get_mut(delta.table);
        let mut summary = CommitSummary::default();
        for removed in &delta.delete {
            let before = rows.len();
            rows.retain(|row| row.identity() != removed.identity());
            summary.deleted += before - rows.len();
        }
        for updated in &delta.update {
            if let Some(row) = rows.iter_mut().find(|row| row.identity() == updated.identity()) {
                let guid = row.get("GUID").cloned();
                *row = updated.clone();
                if let Some(guid) = guid {
                    row.set("GUID", guid)?;
                }
                summary.updated += 1;
            }
        }
        for appended in &delta.append {
            self.next_guid += 1;
            let row = appended
                .clone()
                .with("GUID", format!("guid-{}", self.next_guid))?;
            rows.push(row);
            summary.appended += 1;
        }
        Ok(summary)
    }
}
