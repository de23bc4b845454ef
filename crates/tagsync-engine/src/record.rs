//! Record tables and their closed field schemas.

#![allow(missing_docs)]

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use smol_str::SmolStr;

use crate::error::SyncError;

/// One of the three correlated record tables of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Variable,
    Trend,
    Alarm,
}

impl TableKind {
    pub const ALL: [TableKind; 3] = [TableKind::Variable, TableKind::Trend, TableKind::Alarm];

    pub fn parse(text: &str) -> Result<Self, SyncError> {
        match text.trim().to_ascii_lowercase().as_str() {
            "variable" | "var" => Ok(Self::Variable),
            "trend" => Ok(Self::Trend),
            "alarm" | "digalm" => Ok(Self::Alarm),
            other => Err(SyncError::InvalidConfig(
                format!("unknown table '{other}' (expected variable/trend/alarm)").into(),
            )),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Variable => "variable",
            Self::Trend => "trend",
            Self::Alarm => "alarm",
        }
    }

    /// Name of the identity column.
    #[must_use]
    pub fn identity_field(self) -> &'static str {
        match self {
            Self::Variable | Self::Trend => "NAME",
            Self::Alarm => "TAG",
        }
    }

    /// File stem of the project database backing this table.
    #[must_use]
    pub fn file_stem(self) -> &'static str {
        match self {
            Self::Variable => "variable",
            Self::Trend => "trend",
            Self::Alarm => "digalm",
        }
    }

    #[must_use]
    pub fn schema(self) -> &'static [FieldSpec] {
        match self {
            Self::Variable => VARIABLE_SCHEMA,
            Self::Trend => TREND_SCHEMA,
            Self::Alarm => ALARM_SCHEMA,
        }
    }

    #[must_use]
    pub fn field(self, name: &str) -> Option<&'static FieldSpec> {
        self.schema().iter().find(|spec| spec.name == name)
    }

    /// Column position used to order field lists.
    #[must_use]
    pub fn column_index(self, name: &str) -> Option<usize> {
        self.schema().iter().position(|spec| spec.name == name)
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Character column definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub width: u16,
    /// Owned by the persistence layer (never generated or compared by the engine).
    pub managed: bool,
}

const fn c(name: &'static str, width: u16) -> FieldSpec {
    FieldSpec {
        name,
        width,
        managed: false,
    }
}

const GUID: FieldSpec = FieldSpec {
    name: "GUID",
    width: 36,
    managed: true,
};

static VARIABLE_SCHEMA: &[FieldSpec] = &[
    c("NAME", 79),
    c("TYPE", 16),
    c("UNIT", 31),
    c("ADDR", 254),
    c("RAW_ZERO", 11),
    c("RAW_FULL", 11),
    c("ENG_ZERO", 11),
    c("ENG_FULL", 11),
    c("ENG_UNITS", 8),
    c("FORMAT", 11),
    c("COMMENT", 254),
    c("EDITCODE", 16),
    c("LINKED", 1),
    c("OID", 10),
    c("REF1", 11),
    c("REF2", 11),
    c("DEADBAND", 11),
    c("CUSTOM", 128),
    c("TAGGENLINK", 32),
    c("CLUSTER", 16),
    c("EQUIP", 254),
    c("ITEM", 63),
    c("HISTORIAN", 6),
    c("CUSTOM1", 254),
    c("CUSTOM2", 254),
    c("CUSTOM3", 254),
    c("CUSTOM4", 254),
    c("CUSTOM5", 254),
    c("CUSTOM6", 254),
    c("CUSTOM7", 254),
    c("CUSTOM8", 254),
    c("WRITEROLES", 254),
    GUID,
];

static TREND_SCHEMA: &[FieldSpec] = &[
    c("NAME", 79),
    c("EXPR", 254),
    c("TRIG", 254),
    c("SAMPLEPER", 16),
    c("PRIV", 16),
    c("AREA", 16),
    c("ENG_UNITS", 8),
    c("FORMAT", 11),
    c("FILENAME", 253),
    c("FILES", 4),
    c("TIME", 32),
    c("PERIOD", 32),
    c("COMMENT", 254),
    c("TYPE", 32),
    c("SPCFLAG", 4),
    c("LSL", 16),
    c("USL", 16),
    c("SUBGRPSIZE", 8),
    c("XDOUBLEBAR", 16),
    c("RANGE", 16),
    c("SDEVIATION", 16),
    c("STORMETHOD", 64),
    c("CLUSTER", 16),
    c("TAGGENLINK", 32),
    c("EDITCODE", 16),
    c("LINKED", 1),
    c("DEADBAND", 16),
    c("EQUIP", 254),
    c("ITEM", 63),
    c("HISTORIAN", 6),
    c("ENG_ZERO", 11),
    c("ENG_FULL", 11),
    GUID,
];

static ALARM_SCHEMA: &[FieldSpec] = &[
    c("TAG", 79),
    c("NAME", 79),
    c("DESC", 254),
    c("VAR_A", 254),
    c("VAR_B", 254),
    c("CATEGORY", 16),
    c("PRIORITY", 16),
    c("HELP", 64),
    c("PRIV", 16),
    c("AREA", 16),
    c("COMMENT", 254),
    c("SEQUENCE", 16),
    c("DELAY", 16),
    c("CUSTOM1", 64),
    c("CUSTOM2", 64),
    c("CUSTOM3", 64),
    c("CUSTOM4", 64),
    c("CUSTOM5", 64),
    c("CUSTOM6", 64),
    c("CUSTOM7", 64),
    c("CUSTOM8", 64),
    c("CLUSTER", 16),
    c("TAGGENLINK", 32),
    c("PAGING", 8),
    c("PAGINGGRP", 80),
    c("EDITCODE", 16),
    c("LINKED", 1),
    c("EQUIP", 254),
    c("ITEM", 63),
    c("HISTORIAN", 6),
    GUID,
];

/// Scalar cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(SmolStr),
}

impl FieldValue {
    /// String form used for comparison: trimmed text, integral numbers
    /// without a fraction, booleans as `TRUE`/`FALSE`.
    #[must_use]
    pub fn normalized(&self) -> SmolStr {
        match self {
            Self::Text(text) => SmolStr::new(text.trim()),
            Self::Number(value) => format_number(*value).into(),
            Self::Bool(true) => SmolStr::new_inline("TRUE"),
            Self::Bool(false) => SmolStr::new_inline("FALSE"),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value.into())
    }
}

impl From<SmolStr> for FieldValue {
    fn from(value: SmolStr) -> Self {
        Self::Text(value)
    }
}

impl From<&SmolStr> for FieldValue {
    fn from(value: &SmolStr) -> Self {
        Self::Text(value.clone())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for FieldValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized())
    }
}

/// A row of one table. Field names are restricted to the table schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    table: TableKind,
    fields: IndexMap<SmolStr, FieldValue>,
}

impl Record {
    #[must_use]
    pub fn new(table: TableKind) -> Self {
        Self {
            table,
            fields: IndexMap::new(),
        }
    }

    /// Builds a record from boundary data, upper-casing keys.
    ///
    /// Keys outside the table schema are rejected.
    pub fn from_raw<K, V>(
        table: TableKind,
        raw: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, SyncError>
    where
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        let mut record = Self::new(table);
        for (key, value) in raw {
            let key = key.as_ref().trim().to_ascii_uppercase();
            record.set(&key, value)?;
        }
        Ok(record)
    }

    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Result<Self, SyncError> {
        self.set(field, value)?;
        Ok(self)
    }

    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) -> Result<(), SyncError> {
        let Some(spec) = self.table.field(field) else {
            return Err(SyncError::UnknownField {
                table: self.table,
                field: field.into(),
            });
        };
        self.fields.insert(SmolStr::new_static(spec.name), value.into());
        Ok(())
    }

    /// Sets a column known to be in the schema.
    pub(crate) fn put(&mut self, field: &'static str, value: impl Into<FieldValue>) {
        debug_assert!(
            self.table.field(field).is_some(),
            "{field} is not a {} column",
            self.table
        );
        self.fields.insert(SmolStr::new_static(field), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.fields.shift_remove(field)
    }

    #[must_use]
    pub fn table(&self) -> TableKind {
        self.table
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Normalized text of a field; missing fields read as empty.
    #[must_use]
    pub fn text(&self, field: &str) -> SmolStr {
        self.fields
            .get(field)
            .map(FieldValue::normalized)
            .unwrap_or_default()
    }

    /// Identity value, or `None` when the identity column is missing or blank.
    #[must_use]
    pub fn identity(&self) -> Option<SmolStr> {
        let value = self.text(self.table.identity_field());
        (!value.is_empty()).then_some(value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&SmolStr, &FieldValue)> {
        self.fields.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

/// Candidate or persisted rows for all three tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableSet {
    pub variable: Vec<Record>,
    pub trend: Vec<Record>,
    pub alarm: Vec<Record>,
}

impl TableSet {
    #[must_use]
    pub fn get(&self, table: TableKind) -> &[Record] {
        match table {
            TableKind::Variable => &self.variable,
            TableKind::Trend => &self.trend,
            TableKind::Alarm => &self.alarm,
        }
    }

    pub fn get_mut(&mut self, table: TableKind) -> &mut Vec<Record> {
        match table {
            TableKind::Variable => &mut self.variable,
            TableKind::Trend => &mut self.trend,
            TableKind::Alarm => &mut self.alarm,
        }
    }

    pub fn extend(&mut self, other: TableSet) {
        self.variable.extend(other.variable);
        self.trend.extend(other.trend);
        self.alarm.extend(other.alarm);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.variable.len() + self.trend.len() + self.alarm.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fails on the first identity used twice within one table.
    pub fn ensure_unique(&self) -> Result<(), SyncError> {
        for table in TableKind::ALL {
            let mut seen = rustc_hash::FxHashSet::default();
            for identity in self.get(table).iter().filter_map(Record::identity) {
                if !seen.insert(identity.clone()) {
                    return Err(SyncError::collision(table, identity));
                }
            }
        }
        Ok(())
    }
}
