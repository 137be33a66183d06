//! Column type inference.
//!
//! The [`Sniffer`] walks sample rows once and keeps one [`ColumnCandidate`]
//! per header column. Candidates start as `VARCHAR(150)` and move through
//! integer, float and text as values arrive. Explicit overrides seed a
//! column directly and are never re-examined.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::{ConvertError, Result},
    mangle::mangle,
};

/// Default text width before any sample has been seen.
pub const DEFAULT_TEXT_WIDTH: usize = 150;

/// Widest text column still rendered as `VARCHAR(n)`.
pub const MAX_VARCHAR_WIDTH: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnKind::Integer => "integer",
            ColumnKind::Float => "float",
            ColumnKind::Text => "text",
        };
        f.write_str(label)
    }
}

/// Inferred SQL type together with its width payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SqlType {
    Integer { bytes: u8 },
    Float { bytes: u8 },
    /// `None` means unbounded.
    Text { width: Option<usize> },
}

impl SqlType {
    pub const fn default_text() -> Self {
        SqlType::Text {
            width: Some(DEFAULT_TEXT_WIDTH),
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            SqlType::Integer { .. } => ColumnKind::Integer,
            SqlType::Float { .. } => ColumnKind::Float,
            SqlType::Text { .. } => ColumnKind::Text,
        }
    }

    /// PostgreSQL column type for this descriptor.
    pub fn ddl(&self) -> String {
        match *self {
            SqlType::Text { width: Some(width) } if width > 0 && width <= MAX_VARCHAR_WIDTH => {
                format!("VARCHAR({width})")
            }
            SqlType::Text { .. } => "TEXT".to_string(),
            SqlType::Integer { bytes } if bytes > 4 => "BIGINT".to_string(),
            SqlType::Integer { bytes } if bytes > 2 => "INTEGER".to_string(),
            SqlType::Integer { .. } => "SMALLINT".to_string(),
            SqlType::Float { bytes } if bytes > 4 => "DOUBLE PRECISION".to_string(),
            SqlType::Float { .. } => "REAL".to_string(),
        }
    }

    /// Width as a plain number; unbounded text reports `-1`.
    pub fn width(&self) -> i64 {
        match *self {
            SqlType::Integer { bytes } | SqlType::Float { bytes } => i64::from(bytes),
            SqlType::Text { width: Some(width) } => width as i64,
            SqlType::Text { width: None } => -1,
        }
    }
}

/// An explicit `--datatype` override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeOverride {
    Integer,
    SmallInt,
    BigInt,
    Float,
    Text,
}

impl TypeOverride {
    pub fn seed(self) -> SqlType {
        match self {
            TypeOverride::Integer => SqlType::Integer { bytes: 4 },
            TypeOverride::SmallInt => SqlType::Integer { bytes: 2 },
            TypeOverride::BigInt => SqlType::Integer { bytes: 8 },
            TypeOverride::Float => SqlType::Float { bytes: 8 },
            TypeOverride::Text => SqlType::Text { width: None },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TypeOverride::Integer => "integer",
            TypeOverride::SmallInt => "smallint",
            TypeOverride::BigInt => "bigint",
            TypeOverride::Float => "float8",
            TypeOverride::Text => "text",
        }
    }
}

impl FromStr for TypeOverride {
    type Err = ConvertError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "int" | "int4" | "integer" => Ok(TypeOverride::Integer),
            "smallint" | "short" => Ok(TypeOverride::SmallInt),
            "int8" | "bigint" => Ok(TypeOverride::BigInt),
            "float" | "double" | "float8" => Ok(TypeOverride::Float),
            "text" | "str" => Ok(TypeOverride::Text),
            _ => Err(ConvertError::UnknownTypeOverride(value.trim().to_string())),
        }
    }
}

impl TryFrom<String> for TypeOverride {
    type Error = ConvertError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TypeOverride> for String {
    fn from(value: TypeOverride) -> Self {
        value.as_str().to_string()
    }
}

/// How many rows to examine while sniffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum SniffLimit {
    Skip,
    Unbounded,
    Rows(usize),
}

impl From<i64> for SniffLimit {
    fn from(value: i64) -> Self {
        match value {
            0 => SniffLimit::Skip,
            n if n < 0 => SniffLimit::Unbounded,
            n => SniffLimit::Rows(n as usize),
        }
    }
}

impl From<SniffLimit> for i64 {
    fn from(value: SniffLimit) -> Self {
        match value {
            SniffLimit::Skip => 0,
            SniffLimit::Unbounded => -1,
            SniffLimit::Rows(n) => n as i64,
        }
    }
}

impl Default for SniffLimit {
    fn default() -> Self {
        SniffLimit::Rows(1000)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Mangled column name.
    pub name: String,
    /// Header text as it appeared in the source.
    pub source_name: String,
    pub sql_type: SqlType,
}

/// Ordered mapping of mangled column name to descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaMap {
    pub columns: Vec<ColumnDescriptor>,
}

impl SchemaMap {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }
}

/// Width class for a text value of `len` characters.
pub fn grow(len: Option<usize>) -> usize {
    match len {
        None => DEFAULT_TEXT_WIDTH,
        Some(l) if l <= 80 => DEFAULT_TEXT_WIDTH,
        Some(l) if l <= 255 => 255,
        Some(l) if l <= MAX_VARCHAR_WIDTH => MAX_VARCHAR_WIDTH,
        Some(l) => l,
    }
}

pub fn grow_for(value: &str) -> usize {
    grow(Some(value.chars().count()))
}

pub fn is_bool_literal(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false")
}

pub fn try_parse_int(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok()
}

pub fn try_parse_float(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok()
}

#[derive(Debug, Clone)]
struct ColumnCandidate {
    sql_type: SqlType,
    overridden: bool,
    // set once a value failed both numeric parses; numbers no longer narrow it
    settled_text: bool,
}

impl ColumnCandidate {
    fn new(seed: Option<TypeOverride>) -> Self {
        match seed {
            Some(ov) => Self {
                sql_type: ov.seed(),
                overridden: true,
                settled_text: false,
            },
            None => Self {
                sql_type: SqlType::default_text(),
                overridden: false,
                settled_text: false,
            },
        }
    }

    fn observe(&mut self, value: &str) {
        if self.overridden || value.is_empty() {
            return;
        }
        if self.settled_text {
            self.widen_text(value);
            return;
        }
        let current = self.sql_type.kind();
        if is_bool_literal(value) || try_parse_int(value).is_some() {
            if current != ColumnKind::Float {
                self.sql_type = SqlType::Integer { bytes: 4 };
            }
            return;
        }
        if current == ColumnKind::Integer {
            self.sql_type = SqlType::Text {
                width: Some(grow_for(value)),
            };
        }
        if try_parse_float(value).is_some() {
            self.sql_type = SqlType::Float { bytes: 8 };
            return;
        }
        match current {
            ColumnKind::Float => {
                self.sql_type = SqlType::Text {
                    width: Some(grow_for(value)),
                };
            }
            ColumnKind::Text => self.widen_text(value),
            ColumnKind::Integer => {}
        }
        self.settled_text = true;
    }

    fn widen_text(&mut self, value: &str) {
        if let SqlType::Text { width: Some(width) } = self.sql_type {
            let len = value.chars().count();
            if width < len {
                self.sql_type = SqlType::Text {
                    width: Some(grow(Some(len))),
                };
            }
        }
    }
}

/// Streaming type inference over a header and its rows.
#[derive(Debug, Clone)]
pub struct Sniffer {
    names: Vec<String>,
    source_names: Vec<String>,
    candidates: Vec<ColumnCandidate>,
    limit: SniffLimit,
    rows_seen: usize,
}

impl Sniffer {
    /// Mangles every header name and seeds candidates from `overrides`,
    /// which are keyed by mangled name.
    pub fn new<S: AsRef<str>>(
        fieldnames: &[S],
        limit: SniffLimit,
        overrides: &BTreeMap<String, TypeOverride>,
    ) -> Result<Self> {
        let mut names: Vec<String> = Vec::with_capacity(fieldnames.len());
        let mut source_names = Vec::with_capacity(fieldnames.len());
        let mut candidates = Vec::with_capacity(fieldnames.len());
        for raw in fieldnames {
            let raw = raw.as_ref();
            let name = mangle(raw)?;
            if names.contains(&name) {
                return Err(ConvertError::identifier(
                    raw,
                    format!("mangles to '{name}', which another column already uses"),
                ));
            }
            candidates.push(ColumnCandidate::new(overrides.get(&name).copied()));
            names.push(name);
            source_names.push(raw.to_string());
        }
        Ok(Self {
            names,
            source_names,
            candidates,
            limit,
            rows_seen: 0,
        })
    }

    /// False when sniffing is disabled or every column is overridden.
    pub fn needs_scan(&self) -> bool {
        self.limit != SniffLimit::Skip && self.candidates.iter().any(|c| !c.overridden)
    }

    pub fn wants_more(&self) -> bool {
        if !self.needs_scan() {
            return false;
        }
        match self.limit {
            SniffLimit::Rows(max) => self.rows_seen < max,
            _ => true,
        }
    }

    pub fn rows_seen(&self) -> usize {
        self.rows_seen
    }

    /// Feeds one row; missing trailing cells count as empty.
    pub fn observe<S: AsRef<str>>(&mut self, row: &[S]) {
        self.rows_seen += 1;
        for (candidate, value) in self.candidates.iter_mut().zip(row) {
            candidate.observe(value.as_ref());
        }
    }

    pub fn finish(self) -> SchemaMap {
        let columns = self
            .names
            .into_iter()
            .zip(self.source_names)
            .zip(self.candidates)
            .map(|((name, source_name), candidate)| ColumnDescriptor {
                name,
                source_name,
                sql_type: candidate.sql_type,
            })
            .collect();
        SchemaMap { columns }
    }
}

/// Infers a schema from in-memory rows.
pub fn sniff<S, R, I>(
    fieldnames: &[S],
    rows: I,
    limit: SniffLimit,
    overrides: &BTreeMap<String, TypeOverride>,
) -> Result<SchemaMap>
where
    S: AsRef<str>,
    R: AsRef<[String]>,
    I: IntoIterator<Item = R>,
{
    let mut sniffer = Sniffer::new(fieldnames, limit, overrides)?;
    for row in rows {
        if !sniffer.wants_more() {
            break;
        }
        sniffer.observe(row.as_ref());
    }
    Ok(sniffer.finish())
}
