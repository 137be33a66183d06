pub mod cli;
pub mod config;
pub mod convert;
pub mod copy;
pub mod encode;
pub mod error;
pub mod io_utils;
pub mod mangle;
pub mod sniff;
pub mod sql;
pub mod table;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, ConvertArgs, SniffArgs},
    config::{ConversionConfig, DateSpec, JoinKeys, parse_datatype_spec},
    convert::{Converter, InMemorySource, PathSource, RecordSource, strip_schema_prefix},
    sniff::SniffLimit,
};

static LOGGER: OnceLock<()> = OnceLock::new();

/// Schemas recognised from a table-name prefix when none is given.
const KNOWN_SCHEMAS: &[&str] = &["public"];

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv2psql", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Convert(args) => handle_convert(&args),
        Commands::Sniff(args) => handle_sniff(&args),
    }
}

fn open_source(input: &Path) -> Result<Box<dyn RecordSource>> {
    if io_utils::is_dash(input) {
        let data = io_utils::read_stdin().context("Reading CSV from stdin")?;
        debug!("Buffered {} byte(s) from stdin", data.len());
        Ok(Box::new(InMemorySource::new("stdin", data)))
    } else {
        Ok(Box::new(PathSource::new(input)))
    }
}

fn handle_convert(args: &ConvertArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => ConversionConfig::load(path)
            .with_context(|| format!("Loading configuration from {path:?}"))?,
        None => ConversionConfig::default(),
    };
    apply_convert_args(&mut config, args)?;
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    info!(
        "Converting '{}' with delimiter '{}'",
        args.input.display(),
        printable_delimiter(config.delimiter as u8)
    );

    let source = open_source(&args.input)?;
    let mut out = io_utils::open_output(args.output.as_deref())
        .with_context(|| format!("Opening output {:?}", args.output))?;
    let report = Converter::new(config)
        .with_encoding(encoding)
        .run(source.as_ref(), &mut out)
        .with_context(|| format!("Converting {:?}", args.input))?;

    if let Some(stats) = report.copy {
        info!(
            "Loaded {} row(s) into '{}'; {} row(s) skipped",
            stats.rows_written, report.names.load_table, stats.rows_skipped
        );
    }
    Ok(())
}

fn apply_convert_args(config: &mut ConversionConfig, args: &ConvertArgs) -> Result<()> {
    let table = args
        .table_name
        .clone()
        .or_else(|| args.table.clone())
        .or_else(|| (!config.table.is_empty()).then(|| config.table.clone()));
    config.table = match table {
        Some(table) => table.to_lowercase(),
        None if io_utils::is_dash(&args.input) => {
            return Err(anyhow!("cannot guess a table name when reading stdin"));
        }
        None => args
            .input
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| anyhow!("cannot guess a table name from {:?}", args.input))?,
    };

    if args.schema.is_some() {
        config.schema = args.schema.clone();
    }
    if config.schema.is_none()
        && let Some(schema) = KNOWN_SCHEMAS
            .iter()
            .find(|schema| strip_schema_prefix(&config.table, schema).is_some())
    {
        config.schema = Some(schema.to_string());
    }
    if args.role.is_some() {
        config.role = args.role.clone();
    }
    if !args.key.is_empty() {
        config.primary_key = config::split_list(&args.key.join(":"), ':');
    }
    if !args.unique.is_empty() {
        config.unique_key = config::split_list(&args.unique.join(":"), ':');
    }
    if let Some(limit) = args.sniff {
        config.sniff_limit = SniffLimit::from(limit);
    }
    let fallback = config.delimiter_byte()?;
    config.delimiter =
        io_utils::resolve_input_delimiter(&args.input, args.delimiter, fallback) as char;
    for spec in &args.datatypes {
        for (name, datatype) in parse_datatype_spec(spec)? {
            config.datatypes.insert(name, datatype);
        }
    }
    if let Some(spec) = &args.join_keys {
        config.join_keys = Some(JoinKeys::parse(spec)?);
    }
    for spec in &args.dates {
        config.dates.push(DateSpec::parse(spec)?);
    }
    if args.database_name.is_some() {
        config.database_name = args.database_name.as_deref().map(str::to_lowercase);
    }
    if args.serial.is_some() {
        config.serial = args.serial.clone();
    }
    if args.timestamp.is_some() {
        config.timestamp = args.timestamp.clone();
    }

    config.cascade |= args.cascade;
    config.force_utf8 |= args.utf8;
    config.merge |= args.merge;
    config.dump |= args.dump;
    config.primary_key_first |= args.primary_key_first;
    config.track_modified_time |= args.track_modified_time;
    config.exit_on_error |= args.exit_on_error;
    config.truncate_table |= args.truncate;
    if args.not_null {
        config.default_to_null = false;
    }
    if args.show_notices {
        config.quiet = false;
    }
    if args.no_analyze {
        config.analyze_table = false;
    }
    if args.append {
        config.append_only();
    }
    config.validate()?;
    Ok(())
}

fn handle_sniff(args: &SniffArgs) -> Result<()> {
    let mut config = ConversionConfig::new("sniff");
    config.sniff_limit = SniffLimit::from(args.sniff);
    config.delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter, b',') as char;
    for spec in &args.datatypes {
        config.datatypes.extend(parse_datatype_spec(spec)?);
    }
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    info!(
        "Sniffing '{}' with delimiter '{}'",
        args.input.display(),
        printable_delimiter(config.delimiter as u8)
    );

    let source = open_source(&args.input)?;
    let (schema, rows) = Converter::new(config)
        .with_encoding(encoding)
        .sniff(source.as_ref())
        .with_context(|| format!("Inferring types from {:?}", args.input))?;
    if args.json {
        let rendered = serde_json::to_string_pretty(&schema).context("Serializing schema")?;
        println!("{rendered}");
    } else {
        print!("{}", table::render_schema_table(&schema));
    }
    info!("Inferred {} column(s) from {} row(s)", schema.len(), rows);
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
