//! Conversion orchestration.
//!
//! [`Converter::run`] reads the source header, sniffs column types, and then
//! writes every enabled stage in a fixed order: session preamble, DDL,
//! truncate, COPY payload, date repairs, bookkeeping columns, duplicate
//! removal, composite key, dump command, and finally the merge transaction.
//! Later stages rely on the schema and staging name settled by earlier ones.

use std::{
    fs::File,
    io::{BufReader, Read, Write},
    path::{Path, PathBuf},
};

use encoding_rs::{Encoding, UTF_8};
use log::{debug, info, warn};

use crate::{
    config::ConversionConfig,
    copy::{CopyStats, CopyWriter},
    error::{ConvertError, Result},
    io_utils,
    mangle::mangle_table,
    sniff::{SchemaMap, Sniffer},
    sql::{
        AugmentColumns, CompositeKey, DateRepair, DuplicateQuery, DumpCommand, MergeTransaction,
        SessionPreamble, TableDdl,
        ddl::{analyze_table, modified_time_procedure, modified_time_trigger, truncate_table},
    },
};

pub const STAGING_PREFIX: &str = "temp_";

/// Something that can hand out a fresh reader over the same CSV data.
/// The orchestrator opens it once for sniffing and once for loading.
pub trait RecordSource {
    fn describe(&self) -> String;
    fn open(&self) -> Result<Box<dyn Read + '_>>;
}

#[derive(Debug, Clone)]
pub struct PathSource {
    path: PathBuf,
}

impl PathSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for PathSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&self) -> Result<Box<dyn Read + '_>> {
        let file = File::open(&self.path)?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// CSV data held in memory, typically buffered from stdin.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    label: String,
    data: Vec<u8>,
}

impl InMemorySource {
    pub fn new(label: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

impl RecordSource for InMemorySource {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn open(&self) -> Result<Box<dyn Read + '_>> {
        Ok(Box::new(self.data.as_slice()))
    }
}

/// Table names decided before any SQL is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    /// The long-lived table.
    pub table: String,
    /// Where DDL and COPY go: `temp_<table>` in merge/dump mode.
    pub load_table: String,
}

impl TableNames {
    pub fn resolve(config: &ConversionConfig) -> Result<Self> {
        let mut table = mangle_table(&config.table)?;
        if config.strip_prefix
            && !config.uses_staging()
            && let Some(schema) = config.schema.as_deref()
            && let Some(stripped) = strip_schema_prefix(&table, schema)
        {
            debug!("Stripped schema prefix '{schema}' from table '{table}'");
            table = stripped;
        }
        let load_table = if config.uses_staging() {
            format!("{STAGING_PREFIX}{table}")
        } else {
            table.clone()
        };
        Ok(Self { table, load_table })
    }
}

/// `public_parcels` under schema `public` becomes `parcels`. The schema
/// must be followed by a separator, so `publications` is left alone.
pub fn strip_schema_prefix(table: &str, schema: &str) -> Option<String> {
    let rest = table.strip_prefix(schema)?;
    if !rest.starts_with(|c: char| !c.is_ascii_alphanumeric()) {
        return None;
    }
    let trimmed = rest.trim_start_matches(|c: char| !c.is_ascii_alphabetic());
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub schema: SchemaMap,
    pub names: TableNames,
    pub rows_sniffed: usize,
    pub copy: Option<CopyStats>,
    pub merge_key: Option<String>,
    pub dump_command: Option<String>,
}

pub struct Converter {
    config: ConversionConfig,
    encoding: &'static Encoding,
}

impl Converter {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            config,
            encoding: UTF_8,
        }
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Sniffs `source` and returns the inferred schema without writing SQL.
    pub fn sniff(&self, source: &dyn RecordSource) -> Result<(SchemaMap, usize)> {
        let delimiter = self.config.delimiter_byte()?;
        let overrides = self.config.resolved_overrides()?;
        let mut reader = io_utils::open_csv_reader(source.open()?, delimiter);
        let headers = io_utils::reader_headers(&mut reader, self.encoding)?;
        debug!("Fieldnames: {headers:?}");
        if headers.is_empty() {
            return Err(ConvertError::EmptyHeader {
                input: source.describe(),
            });
        }
        let mut sniffer = Sniffer::new(&headers, self.config.sniff_limit, &overrides)?;
        if sniffer.needs_scan() {
            let mut record = csv::ByteRecord::new();
            while sniffer.wants_more() && reader.read_byte_record(&mut record)? {
                let decoded = io_utils::decode_record(&record, self.encoding)?;
                sniffer.observe(&decoded);
            }
        } else {
            debug!("Skipping type detection for {}", source.describe());
        }
        let rows = sniffer.rows_seen();
        Ok((sniffer.finish(), rows))
    }

    pub fn run<W: Write>(&self, source: &dyn RecordSource, out: &mut W) -> Result<ConversionReport> {
        let config = &self.config;
        config.validate()?;
        let names = TableNames::resolve(config)?;
        let staging = config.uses_staging();
        info!(
            "Converting '{}' into table '{}'",
            source.describe(),
            names.load_table
        );

        let (schema, rows_sniffed) = self.sniff(source)?;
        info!(
            "Sniffed {} column(s) from {} row(s)",
            schema.len(),
            rows_sniffed
        );

        let preamble = SessionPreamble {
            role: config.role.as_deref().filter(|_| !staging),
            search_path: config.schema.as_deref().filter(|_| !staging),
            force_utf8: config.force_utf8,
            quiet: config.quiet && !staging,
        };
        if let Some(sql) = preamble.render() {
            writeln!(out, "{sql}\n")?;
        }

        if config.create_table {
            let owner = config.role.as_deref().filter(|_| !staging);
            let ddl = TableDdl::new(&names.load_table, &schema)
                .cascade(config.cascade)
                .not_null(!config.default_to_null)
                .owner(owner)
                .primary_key(&config.primary_key)
                .unique(&config.unique_key);
            writeln!(out, "{}\n", ddl.render()?)?;
            if config.track_modified_time {
                writeln!(out, "{}\n", modified_time_procedure())?;
            }
        }

        if config.truncate_table && !config.load_data {
            writeln!(out, "{}\n", truncate_table(&names.load_table))?;
        }

        let copy = if config.load_data {
            let stats = self.write_copy(source, &names.load_table, &schema, out)?;
            info!(
                "Encoded {} row(s) into '{}' ({} skipped)",
                stats.rows_written, names.load_table, stats.rows_skipped
            );
            if config.analyze_table {
                writeln!(out, "{}\n", analyze_table(&names.load_table))?;
            }
            Some(stats)
        } else {
            None
        };

        for spec in &config.dates {
            let repair = DateRepair {
                format: &spec.format,
                columns: &spec.columns,
            };
            writeln!(out, "{}\n", repair.render(&names.load_table)?)?;
        }

        let augment = AugmentColumns {
            modified_time: config.track_modified_time,
            serial: config.serial.as_deref(),
            timestamp: config.timestamp.as_deref(),
        };
        if let Some(sql) = augment.render(&names.load_table)? {
            writeln!(out, "{sql}\n")?;
        }

        if let Some(keys) = &config.join_keys {
            if let Some(serial) = config.serial.as_deref() {
                let dupes = DuplicateQuery {
                    table: &names.load_table,
                    natural_key: &keys.columns,
                    serial,
                };
                writeln!(out, "{}\n", dupes.count()?)?;
                writeln!(out, "{}\n", dupes.delete()?)?;
            }
            let key = CompositeKey {
                columns: &keys.columns,
                key_name: &keys.name,
            };
            writeln!(out, "{}\n", key.render(&names.load_table)?)?;
        }

        let merge_key = config.merge_key().map(str::to_string);

        let mut dump_command = None;
        if config.dump && merge_key.is_some() && config.create_table {
            match config.database_name.as_deref() {
                Some(database) if !database.is_empty() => {
                    let command = DumpCommand {
                        database,
                        schema: config.schema.as_deref(),
                        table: &names.load_table,
                        option: None,
                    }
                    .render();
                    writeln!(out, "-- {command}\n")?;
                    dump_command = Some(command);
                }
                _ => warn!("Dump mode needs a database name; no pg_dump command generated"),
            }
        }

        if config.merge {
            match merge_key.as_deref() {
                Some(key) => {
                    if config.track_modified_time {
                        writeln!(out, "{}\n", modified_time_trigger(&names.table))?;
                    }
                    let mut fields: Vec<String> = schema.names().map(str::to_string).collect();
                    if let Some(keys) = &config.join_keys {
                        let synthesized = crate::mangle::mangle(&keys.name)?;
                        if !fields.contains(&synthesized) {
                            fields.push(synthesized);
                        }
                    }
                    let merge =
                        MergeTransaction::new(&names.table, &names.load_table, key, fields)
                            .key_first(config.primary_key_first);
                    writeln!(out, "{}", merge.render()?)?;
                }
                None => warn!(
                    "Merge requested for '{}' without a primary key or join keys; skipping merge",
                    names.table
                ),
            }
        }

        out.flush()?;
        Ok(ConversionReport {
            schema,
            names,
            rows_sniffed,
            copy,
            merge_key,
            dump_command,
        })
    }

    fn write_copy<W: Write>(
        &self,
        source: &dyn RecordSource,
        table: &str,
        schema: &SchemaMap,
        out: &mut W,
    ) -> Result<CopyStats> {
        let delimiter = self.config.delimiter_byte()?;
        let mut reader = io_utils::open_csv_reader(source.open()?, delimiter);
        let headers = io_utils::reader_headers(&mut reader, self.encoding)?;
        if headers.len() != schema.len() {
            return Err(ConvertError::Config(format!(
                "{} changed between passes ({} header(s), expected {})",
                source.describe(),
                headers.len(),
                schema.len()
            )));
        }
        let mut writer = CopyWriter::begin(out, table, schema, self.config.error_policy())?;
        let mut record = csv::ByteRecord::new();
        let mut row = 0usize;
        while reader.read_byte_record(&mut record)? {
            row += 1;
            let decoded = io_utils::decode_record(&record, self.encoding)?;
            writer.write_row(row, &decoded)?;
        }
        let stats = writer.finish()?;
        writeln!(out)?;
        Ok(stats)
    }
}
