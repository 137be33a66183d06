//! `COPY ... FROM stdin` payload framing.
//!
//! A payload is the header line, one tab-separated line per accepted row,
//! and a closing `\.`. Rows that fail to encode are either fatal or left
//! out entirely, depending on the [`ErrorPolicy`].

use std::io::Write;

use log::warn;

use crate::{
    config::ErrorPolicy,
    encode::{check_quoting, encode},
    error::{ConvertError, Result, ValueError},
    mangle::quote_identifier,
    sniff::{ColumnKind, SchemaMap},
    sql::{render, templates},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub rows_written: usize,
    pub rows_skipped: usize,
    /// Rows whose encoded line reads as the `\.` terminator. PostgreSQL
    /// stops reading the payload at the first of them.
    pub terminator_rows: usize,
}

pub struct CopyWriter<'a, W: Write> {
    out: &'a mut W,
    schema: &'a SchemaMap,
    policy: ErrorPolicy,
    stats: CopyStats,
    line: String,
}

impl<'a, W: Write> CopyWriter<'a, W> {
    /// Writes the `COPY` header for `table` and returns the writer.
    pub fn begin(
        out: &'a mut W,
        table: &str,
        schema: &'a SchemaMap,
        policy: ErrorPolicy,
    ) -> Result<Self> {
        let header = render(
            templates::COPY_HEADER,
            &[("table", &quote_identifier(table))],
        );
        writeln!(out, "{header}")?;
        Ok(Self {
            out,
            schema,
            policy,
            stats: CopyStats::default(),
            line: String::new(),
        })
    }

    /// Encodes and writes one row. `row` is the 1-based data row index used
    /// in diagnostics. Returns `false` when the row was skipped.
    pub fn write_row<S: AsRef<str>>(&mut self, row: usize, values: &[S]) -> Result<bool> {
        self.line.clear();
        let schema = self.schema;
        for (idx, column) in schema.columns.iter().enumerate() {
            let value = values.get(idx).map(AsRef::as_ref);
            let kind = column.sql_type.kind();
            if kind == ColumnKind::Text
                && let Some(text) = value
            {
                check_quoting(text)
                    .map_err(|err| ConvertError::row(row, &column.source_name, err))?;
            }
            match encode(value, kind) {
                Ok(token) => {
                    if idx > 0 {
                        self.line.push('\t');
                    }
                    self.line.push_str(&token);
                }
                Err(err) => return self.reject(row, &column.source_name, err),
            }
        }
        if self.line == templates::COPY_TERMINATOR {
            warn!("Row {row} encodes as the COPY terminator; rows after it will not load");
            self.stats.terminator_rows += 1;
        }
        writeln!(self.out, "{}", self.line)?;
        self.stats.rows_written += 1;
        Ok(true)
    }

    fn reject(&mut self, row: usize, column: &str, err: ValueError) -> Result<bool> {
        match self.policy {
            ErrorPolicy::Abort => Err(ConvertError::row(row, column, err)),
            ErrorPolicy::SkipRow => {
                warn!("Skipping row {row}: column '{column}': {err}");
                self.stats.rows_skipped += 1;
                Ok(false)
            }
        }
    }

    /// Writes the `\.` terminator.
    pub fn finish(self) -> Result<CopyStats> {
        writeln!(self.out, "{}", templates::COPY_TERMINATOR)?;
        Ok(self.stats)
    }
}
