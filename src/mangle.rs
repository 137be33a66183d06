//! Identifier normalization and reserved-word quoting for PostgreSQL.
//!
//! Raw CSV headers and file names are turned into lower-case identifiers made
//! of `[a-z0-9_]`. Anything emitted into SQL goes through [`sql_identifier`]
//! or [`quote_identifier`] so reserved key words end up double-quoted.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ConvertError, Result};

/// PostgreSQL truncates identifiers beyond this many bytes.
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

const TABLE_EXTENSIONS: &[&str] = &["csv", "tsv", "txt"];

static ILLEGAL_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_]+").expect("valid identifier regex"));
static UNDERSCORE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_{2,}").expect("valid underscore regex"));

/// Key words PostgreSQL reserves outright (sorted for binary search).
pub const RESERVED_WORDS: &[&str] = &[
    "all",
    "analyse",
    "analyze",
    "and",
    "any",
    "array",
    "as",
    "asc",
    "asymmetric",
    "authorization",
    "binary",
    "both",
    "case",
    "cast",
    "check",
    "collate",
    "collation",
    "column",
    "concurrently",
    "constraint",
    "create",
    "cross",
    "current_catalog",
    "current_date",
    "current_role",
    "current_schema",
    "current_time",
    "current_timestamp",
    "current_user",
    "default",
    "deferrable",
    "desc",
    "distinct",
    "do",
    "else",
    "end",
    "except",
    "false",
    "fetch",
    "for",
    "foreign",
    "freeze",
    "from",
    "full",
    "grant",
    "group",
    "having",
    "ilike",
    "in",
    "initially",
    "inner",
    "intersect",
    "into",
    "is",
    "isnull",
    "join",
    "lateral",
    "leading",
    "left",
    "like",
    "limit",
    "localtime",
    "localtimestamp",
    "natural",
    "not",
    "notnull",
    "null",
    "offset",
    "on",
    "only",
    "or",
    "order",
    "outer",
    "overlaps",
    "placing",
    "primary",
    "references",
    "returning",
    "right",
    "select",
    "session_user",
    "similar",
    "some",
    "symmetric",
    "system_user",
    "table",
    "tablesample",
    "then",
    "to",
    "trailing",
    "true",
    "union",
    "unique",
    "user",
    "using",
    "variadic",
    "verbose",
    "when",
    "where",
    "window",
    "with",
];

pub fn is_reserved(name: &str) -> bool {
    RESERVED_WORDS
        .binary_search(&name.to_ascii_lowercase().as_str())
        .is_ok()
}

/// Normalizes a raw column name into a bare identifier.
///
/// Runs of characters outside `[a-z0-9_]` collapse to a single `_`, leading
/// and trailing underscores are dropped when anything else remains, and a
/// leading digit gets a `_` prefix. Blank input is rejected.
pub fn mangle(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ConvertError::identifier(name, "identifier cannot be empty"));
    }
    let lowered = trimmed.to_lowercase();
    let replaced = ILLEGAL_RUN.replace_all(&lowered, "_");
    let collapsed = UNDERSCORE_RUN.replace_all(&replaced, "_");
    let stripped = collapsed.trim_matches('_');
    let mut ident = if stripped.is_empty() {
        "_".to_string()
    } else {
        stripped.to_string()
    };
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident.truncate(MAX_IDENTIFIER_LENGTH);
    Ok(ident)
}

/// Like [`mangle`], but first drops any directory prefix and a trailing
/// `.csv`, `.tsv` or `.txt` extension.
pub fn mangle_table(name: &str) -> Result<String> {
    let base = name
        .trim()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let stem = match base.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && TABLE_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known)) =>
        {
            stem
        }
        _ => base,
    };
    if stem.trim().is_empty() {
        return Err(ConvertError::identifier(name, "table name cannot be empty"));
    }
    mangle(stem)
}

/// Wraps an already-mangled identifier in double quotes when it is reserved.
pub fn quote_identifier(mangled: &str) -> String {
    if is_reserved(mangled) {
        format!("\"{mangled}\"")
    } else {
        mangled.to_string()
    }
}

/// Mangles and quotes in one step.
pub fn sql_identifier(raw: &str) -> Result<String> {
    mangle(raw).map(|ident| quote_identifier(&ident))
}
