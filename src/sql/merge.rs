//! Staging-to-permanent reconciliation inside one exclusively locked
//! transaction.

use itertools::Itertools;

use super::{render, templates};
use crate::{
    error::Result,
    mangle::{mangle, quote_identifier},
};

/// Updates rows of `target` whose key exists in `staging`, then inserts the
/// staging rows whose key is missing from `target`.
#[derive(Debug, Clone)]
pub struct MergeTransaction<'a> {
    target: &'a str,
    staging: &'a str,
    key: &'a str,
    fields: Vec<String>,
    key_first: bool,
}

impl<'a> MergeTransaction<'a> {
    /// `fields` are mangled column names in table order.
    pub fn new<I, S>(target: &'a str, staging: &'a str, key: &'a str, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target,
            staging,
            key,
            fields: fields.into_iter().map(Into::into).collect(),
            key_first: false,
        }
    }

    /// Moves the key column to the front of the insert column list.
    pub fn key_first(mut self, key_first: bool) -> Self {
        self.key_first = key_first;
        self
    }

    fn ordered_fields(&self, key: &str) -> Vec<String> {
        if !self.key_first {
            return self.fields.clone();
        }
        let mut ordered = Vec::with_capacity(self.fields.len() + 1);
        ordered.push(key.to_string());
        ordered.extend(self.fields.iter().filter(|f| f.as_str() != key).cloned());
        ordered
    }

    pub fn render(&self) -> Result<String> {
        let target = quote_identifier(self.target);
        let staging = quote_identifier(self.staging);
        let key_name = mangle(self.key)?;
        let key = quote_identifier(&key_name);
        let fields = self.ordered_fields(&key_name);

        let mut sections = vec![render(templates::MERGE_BEGIN, &[("target", &target)])];

        let sets = fields
            .iter()
            .filter(|field| field.as_str() != key_name)
            .map(|field| {
                let ident = quote_identifier(field);
                format!("{ident} = {staging}.{ident}")
            })
            .join(", ");
        if !sets.is_empty() {
            sections.push(render(
                templates::MERGE_UPDATE,
                &[
                    ("target", &target),
                    ("staging", &staging),
                    ("key", &key),
                    ("sets", &sets),
                ],
            ));
        }

        if !fields.is_empty() {
            let columns = fields.iter().map(|f| quote_identifier(f)).join(", ");
            let selects = fields
                .iter()
                .map(|f| format!("{staging}.{}", quote_identifier(f)))
                .join(", ");
            sections.push(render(
                templates::MERGE_INSERT,
                &[
                    ("target", &target),
                    ("staging", &staging),
                    ("key", &key),
                    ("columns", &columns),
                    ("selects", &selects),
                ],
            ));
        }

        sections.push(templates::MERGE_COMMIT.to_string());
        Ok(sections.join("\n\n"))
    }
}
