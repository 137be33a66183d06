//! Table definitions, session settings, and post-load column additions.

use itertools::Itertools;

use super::{render, templates};
use crate::{
    error::Result,
    mangle::{quote_identifier, sql_identifier},
    sniff::SchemaMap,
};

/// `DROP`/`CREATE TABLE` plus optional owner, primary key and unique
/// constraint for a sniffed schema.
#[derive(Debug, Clone)]
pub struct TableDdl<'a> {
    table: &'a str,
    schema: &'a SchemaMap,
    cascade: bool,
    not_null: bool,
    owner: Option<&'a str>,
    primary_key: &'a [String],
    unique: &'a [String],
}

impl<'a> TableDdl<'a> {
    pub fn new(table: &'a str, schema: &'a SchemaMap) -> Self {
        Self {
            table,
            schema,
            cascade: false,
            not_null: false,
            owner: None,
            primary_key: &[],
            unique: &[],
        }
    }

    pub fn cascade(mut self, cascade: bool) -> Self {
        self.cascade = cascade;
        self
    }

    /// Marks every column `NOT NULL`.
    pub fn not_null(mut self, not_null: bool) -> Self {
        self.not_null = not_null;
        self
    }

    pub fn owner(mut self, owner: Option<&'a str>) -> Self {
        self.owner = owner;
        self
    }

    pub fn primary_key(mut self, columns: &'a [String]) -> Self {
        self.primary_key = columns;
        self
    }

    pub fn unique(mut self, columns: &'a [String]) -> Self {
        self.unique = columns;
        self
    }

    pub fn render(&self) -> Result<String> {
        let table = quote_identifier(self.table);
        let mut statements = vec![render(
            templates::DROP_TABLE,
            &[
                ("table", &table),
                ("cascade", if self.cascade { " CASCADE" } else { "" }),
            ],
        )];

        let suffix = if self.not_null { " NOT NULL" } else { "" };
        let columns = self
            .schema
            .columns
            .iter()
            .map(|column| {
                format!(
                    "{} {}{suffix}",
                    quote_identifier(&column.name),
                    column.sql_type.ddl()
                )
            })
            .join(",\n\t");
        statements.push(render(
            templates::CREATE_TABLE,
            &[("table", &table), ("columns", &columns)],
        ));

        if let Some(owner) = self.owner {
            statements.push(render(
                templates::OWNER_TO,
                &[("table", &table), ("role", &quote_identifier(owner))],
            ));
        }
        if !self.primary_key.is_empty() {
            let columns = identifier_list(self.primary_key)?;
            statements.push(render(
                templates::ADD_PRIMARY_KEY,
                &[("table", &table), ("columns", &columns)],
            ));
        }
        if !self.unique.is_empty() {
            let columns = identifier_list(self.unique)?;
            statements.push(render(
                templates::ADD_UNIQUE,
                &[("table", &table), ("columns", &columns)],
            ));
        }
        Ok(statements.join("\n"))
    }
}

pub(crate) fn identifier_list(columns: &[String]) -> Result<String> {
    let idents = columns
        .iter()
        .map(|column| sql_identifier(column))
        .collect::<Result<Vec<_>>>()?;
    Ok(idents.join(", "))
}

/// Session statements emitted ahead of the DDL.
#[derive(Debug, Clone, Default)]
pub struct SessionPreamble<'a> {
    pub role: Option<&'a str>,
    pub search_path: Option<&'a str>,
    pub force_utf8: bool,
    pub quiet: bool,
}

impl SessionPreamble<'_> {
    pub fn render(&self) -> Option<String> {
        let mut lines = Vec::new();
        if let Some(role) = self.role {
            lines.push(render(
                templates::SET_ROLE,
                &[("role", &quote_identifier(role))],
            ));
        }
        if let Some(schema) = self.search_path {
            lines.push(render(
                templates::SET_SEARCH_PATH,
                &[("schema", &quote_identifier(schema))],
            ));
        }
        if self.force_utf8 {
            lines.push(templates::FORCE_UTF8.to_string());
        }
        if self.quiet {
            lines.push(templates::QUIET_NOTICES.to_string());
        }
        (!lines.is_empty()).then(|| lines.join("\n"))
    }
}

pub fn truncate_table(table: &str) -> String {
    render(
        templates::TRUNCATE_TABLE,
        &[("table", &quote_identifier(table))],
    )
}

pub fn analyze_table(table: &str) -> String {
    render(
        templates::ANALYZE_TABLE,
        &[("table", &quote_identifier(table))],
    )
}

pub const MODIFIED_TIME_COLUMN: &str = "modified_time";

/// Bookkeeping columns added after the data is loaded.
#[derive(Debug, Clone, Default)]
pub struct AugmentColumns<'a> {
    pub modified_time: bool,
    pub serial: Option<&'a str>,
    pub timestamp: Option<&'a str>,
}

impl AugmentColumns<'_> {
    pub fn is_empty(&self) -> bool {
        !self.modified_time && self.serial.is_none() && self.timestamp.is_none()
    }

    pub fn render(&self, table: &str) -> Result<Option<String>> {
        let table = quote_identifier(table);
        let mut columns: Vec<(String, &str)> = Vec::new();
        if self.modified_time {
            columns.push((
                MODIFIED_TIME_COLUMN.to_string(),
                "TIMESTAMP DEFAULT current_timestamp",
            ));
        }
        if let Some(serial) = self.serial {
            columns.push((sql_identifier(serial)?, "SERIAL"));
        }
        if let Some(timestamp) = self.timestamp {
            columns.push((
                sql_identifier(timestamp)?,
                "TIMESTAMP DEFAULT current_timestamp",
            ));
        }
        if columns.is_empty() {
            return Ok(None);
        }
        let statements = columns
            .iter()
            .map(|(column, definition)| {
                render(
                    templates::ADD_COLUMN,
                    &[
                        ("table", &table),
                        ("column", column),
                        ("definition", definition),
                    ],
                )
            })
            .join("\n");
        Ok(Some(statements))
    }
}

/// Trigger function that stamps `modified_time` on every update.
pub fn modified_time_procedure() -> &'static str {
    templates::MODIFIED_TIME_PROCEDURE
}

pub fn modified_time_trigger(table: &str) -> String {
    let trigger = format!("update_modified_time_{table}");
    render(
        templates::MODIFIED_TIME_TRIGGER,
        &[
            ("trigger", &trigger),
            ("table", &quote_identifier(table)),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preamble_is_empty_without_settings() {
        assert!(SessionPreamble::default().render().is_none());
    }

    #[test]
    fn augment_columns_render_in_fixed_order() {
        let augment = AugmentColumns {
            modified_time: true,
            serial: Some("id"),
            timestamp: Some("loaded_at"),
        };
        let sql = augment.render("people").unwrap().unwrap();
        let lines: Vec<_> = sql.lines().collect();
        assert_eq!(
            lines,
            vec![
                "ALTER TABLE people ADD COLUMN modified_time TIMESTAMP DEFAULT current_timestamp;",
                "ALTER TABLE people ADD COLUMN id SERIAL;",
                "ALTER TABLE people ADD COLUMN loaded_at TIMESTAMP DEFAULT current_timestamp;",
            ]
        );
    }
}
