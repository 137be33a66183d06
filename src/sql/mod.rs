//! SQL statement synthesis.
//!
//! Every builder here is a pure function of its arguments: the same schema
//! and settings always render the same text. Literal SQL lives in
//! [`templates`]; builders only compute the substitutions.

pub mod alter;
pub mod ddl;
pub mod dump;
pub mod merge;
pub mod templates;

pub use alter::{CompositeKey, DateRepair, DuplicateQuery};
pub use ddl::{AugmentColumns, SessionPreamble, TableDdl};
pub use dump::DumpCommand;
pub use merge::MergeTransaction;

/// Fills `{name}` placeholders in a single left-to-right pass.
///
/// Substituted text is never rescanned, and unknown placeholders are left
/// untouched.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + 64);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after.find('}');
        let replacement = close.and_then(|end| {
            let name = &after[..end];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, end))
        });
        match replacement {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Doubles single quotes for use inside a SQL string literal.
pub fn quote_literal(value: &str) -> String {
    value.replace('\'', "''")
}
