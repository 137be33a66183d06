use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Convert CSV files into PostgreSQL tables", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Emit DDL, a COPY payload, and optional merge SQL for a CSV file
    Convert(ConvertArgs),
    /// Print the column types inferred from a CSV file
    Sniff(SniffArgs),
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Input CSV file ('-' reads stdin)
    pub input: PathBuf,
    /// Target table name (defaults to the input file name)
    pub table: Option<String>,
    /// Override the table name taken from the input or positional argument
    #[arg(long = "table-name")]
    pub table_name: Option<String>,
    /// Output SQL file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// YAML file with conversion settings; flags take precedence
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Schema placed on the search path; a matching table-name prefix is stripped
    #[arg(short = 's', long, env = "CSV2PSQL_SCHEMA")]
    pub schema: Option<String>,
    /// Role used for the session and as table owner
    #[arg(long, env = "CSV2PSQL_ROLE")]
    pub role: Option<String>,
    /// Primary key columns, e.g. `a:b:c`
    #[arg(short = 'k', long = "key", value_delimiter = ':')]
    pub key: Vec<String>,
    /// Unique constraint columns, e.g. `a:b:c`
    #[arg(long = "unique", value_delimiter = ':')]
    pub unique: Vec<String>,
    /// Insert only: skip table creation, truncation and type detection
    #[arg(short = 'a', long)]
    pub append: bool,
    /// Drop the existing table with CASCADE
    #[arg(long)]
    pub cascade: bool,
    /// Rows to sample for type detection (0 disables, negative scans everything)
    #[arg(long = "sniff", allow_negative_numbers = true)]
    pub sniff: Option<i64>,
    /// Switch the client encoding to UTF-8
    #[arg(long = "utf8")]
    pub utf8: bool,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Explicit column types such as `zip,fips:text` (repeatable)
    #[arg(long = "datatype", action = clap::ArgAction::Append)]
    pub datatypes: Vec<String>,
    /// Synthesize a primary key from columns, e.g. `parcel,block:pkey`
    #[arg(long = "joinkeys")]
    pub join_keys: Option<String>,
    /// Convert columns to DATE using a to_date format, e.g. `sold_on:YYYYMMDD` (repeatable)
    #[arg(long = "dates", action = clap::ArgAction::Append)]
    pub dates: Vec<String>,
    /// Database name used for the pg_dump command in dump mode
    #[arg(long = "database-name")]
    pub database_name: Option<String>,
    /// Load into temp_<table> and merge it into <table>
    #[arg(long)]
    pub merge: bool,
    /// Load into temp_<table> and emit a pg_dump command for it
    #[arg(long)]
    pub dump: bool,
    /// Put the primary key first in the merge insert
    #[arg(long = "primary-key-first")]
    pub primary_key_first: bool,
    /// Add a SERIAL column with this name (also orders duplicates)
    #[arg(long)]
    pub serial: Option<String>,
    /// Add a timestamp column with this name defaulting to now
    #[arg(long)]
    pub timestamp: Option<String>,
    /// Add a modified_time column maintained by an update trigger
    #[arg(long = "track-modified-time")]
    pub track_modified_time: bool,
    /// Abort on the first row that does not match its column type
    #[arg(long = "exit-on-error")]
    pub exit_on_error: bool,
    /// Declare every column NOT NULL
    #[arg(long = "not-null")]
    pub not_null: bool,
    /// Keep server notices (omit `SET client_min_messages TO ERROR`)
    #[arg(long = "show-notices")]
    pub show_notices: bool,
    /// Skip ANALYZE after loading
    #[arg(long = "no-analyze")]
    pub no_analyze: bool,
    /// Truncate the table when not loading data
    #[arg(long)]
    pub truncate: bool,
}

#[derive(Debug, Args)]
pub struct SniffArgs {
    /// Input CSV file ('-' reads stdin)
    pub input: PathBuf,
    /// Rows to sample for type detection (0 disables, negative scans everything)
    #[arg(long = "sniff", default_value_t = 1000, allow_negative_numbers = true)]
    pub sniff: i64,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Explicit column types such as `zip,fips:text` (repeatable)
    #[arg(long = "datatype", action = clap::ArgAction::Append)]
    pub datatypes: Vec<String>,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" | "\\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
