use super::{render, templates};

pub const DEFAULT_DUMP_SCHEMA: &str = "public";
/// Schema-only dump.
pub const DEFAULT_DUMP_OPTION: &str = "-s";

/// Command line for fetching a table definition with `pg_dump`. Only the
/// string is built here; running it is up to the caller.
#[derive(Debug, Clone)]
pub struct DumpCommand<'a> {
    pub database: &'a str,
    pub schema: Option<&'a str>,
    pub table: &'a str,
    pub option: Option<&'a str>,
}

impl DumpCommand<'_> {
    pub fn render(&self) -> String {
        let rendered = render(
            templates::PG_DUMP,
            &[
                ("database", self.database),
                ("schema", self.schema.unwrap_or(DEFAULT_DUMP_SCHEMA)),
                ("table", self.table),
                ("option", self.option.unwrap_or(DEFAULT_DUMP_OPTION)),
            ],
        );
        rendered.trim_end().to_string()
    }
}
