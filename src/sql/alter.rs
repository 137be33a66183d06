//! Post-load repairs: date conversion, composite primary keys, and
//! duplicate detection in staging tables.

use itertools::Itertools;

use super::{quote_literal, render, templates};
use crate::{
    error::Result,
    mangle::{quote_identifier, sql_identifier},
};

/// Delimiter placed between key parts of a synthesized composite key.
pub const JOIN_KEY_DELIMITER: &str = "'-'";

/// Converts text/integer date columns in place using `to_date(..., format)`.
#[derive(Debug, Clone)]
pub struct DateRepair<'a> {
    pub format: &'a str,
    pub columns: &'a [String],
}

impl DateRepair<'_> {
    pub fn render(&self, table: &str) -> Result<String> {
        let table = quote_identifier(table);
        let format = quote_literal(self.format);
        let statements = self
            .columns
            .iter()
            .map(|column| {
                let column = sql_identifier(column)?;
                Ok(render(
                    templates::DATE_REPAIR,
                    &[("table", &table), ("column", &column), ("format", &format)],
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(statements.join("\n"))
    }
}

/// Builds a `VARCHAR(200)` primary key from several columns joined with `-`.
#[derive(Debug, Clone)]
pub struct CompositeKey<'a> {
    pub columns: &'a [String],
    pub key_name: &'a str,
}

impl CompositeKey<'_> {
    /// `a || '-' || b || '-' || c`
    pub fn joined(&self) -> Result<String> {
        let idents = self
            .columns
            .iter()
            .map(|column| sql_identifier(column))
            .collect::<Result<Vec<_>>>()?;
        Ok(idents.join(&format!(" || {JOIN_KEY_DELIMITER} || ")))
    }

    pub fn render(&self, table: &str) -> Result<String> {
        let table = quote_identifier(table);
        let key = sql_identifier(self.key_name)?;
        let joined = self.joined()?;
        let missing = self
            .columns
            .iter()
            .map(|column| sql_identifier(column).map(|ident| format!("{ident} IS NULL")))
            .collect::<Result<Vec<_>>>()?
            .join(" OR ");
        let deletion = render(
            templates::BAD_KEY_DELETION,
            &[("table", &table), ("missing_keys", &missing)],
        );
        Ok(render(
            templates::JOIN_KEY_PRIMARY,
            &[
                ("table", &table),
                ("key", &key),
                ("joined", &joined),
                ("bad_key_deletion", &deletion),
            ],
        ))
    }
}

/// Self-join over a staging table that finds rows sharing the same natural
/// key. The row with the higher serial is treated as the duplicate.
#[derive(Debug, Clone)]
pub struct DuplicateQuery<'a> {
    pub table: &'a str,
    pub natural_key: &'a [String],
    pub serial: &'a str,
}

impl DuplicateQuery<'_> {
    /// `t1.serial > t2.serial AND t1.k = t2.k ...`
    pub fn clause(&self) -> Result<String> {
        let serial = sql_identifier(self.serial)?;
        let mut parts = vec![format!("t1.{serial} > t2.{serial}")];
        for column in self.natural_key {
            let ident = sql_identifier(column)?;
            parts.push(format!("t1.{ident} = t2.{ident}"));
        }
        Ok(parts.iter().join(" AND "))
    }

    fn select(&self) -> Result<String> {
        let table = quote_identifier(self.table);
        let clause = self.clause()?;
        Ok(render(
            templates::SELECT_DUPLICATES,
            &[("table", &table), ("clause", &clause)],
        ))
    }

    pub fn count(&self) -> Result<String> {
        let select = self.select()?;
        Ok(render(templates::COUNT_DUPLICATES, &[("select", &select)]))
    }

    pub fn delete(&self) -> Result<String> {
        let table = quote_identifier(self.table);
        let serial = sql_identifier(self.serial)?;
        let select = self.select()?;
        Ok(render(
            templates::DELETE_DUPLICATES,
            &[("table", &table), ("serial", &serial), ("select", &select)],
        ))
    }
}
