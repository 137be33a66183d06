//! Conversion settings.
//!
//! A [`ConversionConfig`] is assembled once (defaults, then an optional YAML
//! file, then command-line flags) and stays read-only for the whole run.

use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::{ConvertError, Result},
    mangle::mangle,
    sniff::{SniffLimit, TypeOverride},
};

/// Columns combined into a synthesized primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinKeys {
    pub columns: Vec<String>,
    pub name: String,
}

impl JoinKeys {
    /// Parses `a,b,c:key_name`.
    pub fn parse(spec: &str) -> Result<Self> {
        let (columns, name) = spec
            .split_once(':')
            .ok_or_else(|| ConvertError::Config(format!("join keys '{spec}' must look like a,b:name")))?;
        let columns = split_list(columns, ',');
        let name = name.trim().to_lowercase();
        if columns.is_empty() || name.is_empty() {
            return Err(ConvertError::Config(format!(
                "join keys '{spec}' need at least one column and a key name"
            )));
        }
        Ok(Self { columns, name })
    }
}

/// Columns holding dates written in `format` (a PostgreSQL `to_date` pattern).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSpec {
    pub format: String,
    pub columns: Vec<String>,
}

impl DateSpec {
    /// Parses `a,b:format`. The format keeps its case.
    pub fn parse(spec: &str) -> Result<Self> {
        let (columns, format) = spec
            .split_once(':')
            .ok_or_else(|| ConvertError::Config(format!("dates '{spec}' must look like a,b:format")))?;
        let columns = split_list(columns, ',');
        let format = format.trim().to_string();
        if columns.is_empty() || format.is_empty() {
            return Err(ConvertError::Config(format!(
                "dates '{spec}' need at least one column and a format"
            )));
        }
        Ok(Self { format, columns })
    }
}

/// Parses `name[,name]:type` into one override per column.
pub fn parse_datatype_spec(spec: &str) -> Result<Vec<(String, TypeOverride)>> {
    let (names, datatype) = spec
        .split_once(':')
        .ok_or_else(|| ConvertError::Config(format!("datatype '{spec}' must look like name:type")))?;
    let datatype: TypeOverride = datatype.parse()?;
    let names = split_list(names, ',');
    if names.is_empty() {
        return Err(ConvertError::Config(format!(
            "datatype '{spec}' names no columns"
        )));
    }
    Ok(names.into_iter().map(|name| (name, datatype)).collect())
}

/// Splits `a:b:c` style key lists, dropping blanks.
pub fn split_list(value: &str, separator: char) -> Vec<String> {
    value
        .split(separator)
        .map(|part| part.trim().to_lowercase())
        .filter(|part| !part.is_empty())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop the conversion at the first bad row.
    Abort,
    /// Log the bad row and leave it out of the payload.
    SkipRow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConversionConfig {
    pub table: String,
    pub schema: Option<String>,
    pub role: Option<String>,
    pub primary_key: Vec<String>,
    pub unique_key: Vec<String>,
    pub join_keys: Option<JoinKeys>,
    pub datatypes: BTreeMap<String, TypeOverride>,
    pub dates: Vec<DateSpec>,
    pub sniff_limit: SniffLimit,
    pub delimiter: char,
    pub cascade: bool,
    /// Columns accept NULL; when false every column is `NOT NULL`.
    pub default_to_null: bool,
    pub quiet: bool,
    pub force_utf8: bool,
    pub create_table: bool,
    pub truncate_table: bool,
    pub load_data: bool,
    pub analyze_table: bool,
    pub strip_prefix: bool,
    pub merge: bool,
    pub dump: bool,
    pub database_name: Option<String>,
    pub primary_key_first: bool,
    pub serial: Option<String>,
    pub timestamp: Option<String>,
    pub track_modified_time: bool,
    pub exit_on_error: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            table: String::new(),
            schema: None,
            role: None,
            primary_key: Vec::new(),
            unique_key: Vec::new(),
            join_keys: None,
            datatypes: BTreeMap::new(),
            dates: Vec::new(),
            sniff_limit: SniffLimit::default(),
            delimiter: ',',
            cascade: false,
            default_to_null: true,
            quiet: true,
            force_utf8: false,
            create_table: true,
            truncate_table: false,
            load_data: true,
            analyze_table: true,
            strip_prefix: true,
            merge: false,
            dump: false,
            database_name: None,
            primary_key_first: false,
            serial: None,
            timestamp: None,
            track_modified_time: false,
            exit_on_error: false,
        }
    }
}

impl ConversionConfig {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        serde_yaml::from_reader(BufReader::new(file)).map_err(|err| {
            ConvertError::Config(format!("Parsing configuration {path:?}: {err}"))
        })
    }

    /// Insert-only mode: no table creation, truncation, or sniffing.
    pub fn append_only(&mut self) {
        self.create_table = false;
        self.truncate_table = false;
        self.load_data = true;
        self.sniff_limit = SniffLimit::Skip;
    }

    /// Merge and dump runs load into `temp_<table>` instead of the table.
    pub fn uses_staging(&self) -> bool {
        self.merge || self.dump
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        if self.exit_on_error {
            ErrorPolicy::Abort
        } else {
            ErrorPolicy::SkipRow
        }
    }

    pub fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(ConvertError::Config(format!(
                "delimiter {:?} must be a single ASCII character",
                self.delimiter
            )))
        }
    }

    /// Overrides re-keyed by mangled column name.
    pub fn resolved_overrides(&self) -> Result<BTreeMap<String, TypeOverride>> {
        self.datatypes
            .iter()
            .map(|(name, datatype)| Ok((mangle(name)?, *datatype)))
            .collect()
    }

    /// Reconciliation key for a merge: the first primary-key column, else
    /// the synthesized join key.
    pub fn merge_key(&self) -> Option<&str> {
        self.primary_key
            .first()
            .map(String::as_str)
            .or_else(|| self.join_keys.as_ref().map(|keys| keys.name.as_str()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.table.trim().is_empty() {
            return Err(ConvertError::Config("a target table name is required".into()));
        }
        self.delimiter_byte()?;
        self.resolved_overrides()?;
        Ok(())
    }
}
