//! Declarative description of record shapes: the name of the record,
//! its fields in declaration order, and the tags on each field. Built
//! once per shape (see the `record!` family of macros), then only
//! read.

use std::str::FromStr;

use kstring::KString;
use strum_macros::EnumString;

/// Per-field metadata, given as a comma-separated string in the
/// record declaration, e.g. `"table-hide"` or `"search"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
pub enum FieldTag {
    /// Exclude this field from generated table headers and rows.
    #[strum(serialize = "table-hide")]
    TableHide,
    /// Mark a field of a criteria shape as a user-editable filter
    /// input.
    #[strum(serialize = "search")]
    Search,
}

#[derive(Debug)]
pub struct FieldMeta {
    /// The Rust identifier.
    pub ident: &'static str,
    /// The externally visible name, used for headings, table headers,
    /// route patterns and query keys.
    pub label: KString,
    pub tags: Vec<FieldTag>,
}

impl FieldMeta {
    pub fn has_tag(&self, tag: FieldTag) -> bool {
        self.tags.contains(&tag)
    }
}

#[derive(Debug)]
pub struct Schema {
    pub name: &'static str,
    pub fields: Vec<FieldMeta>,
    problems: Vec<String>,
}

/// `shopping_lists` -> `ShoppingLists`. Raw identifiers lose their
/// `r#`.
pub fn label_from_ident(ident: &str) -> String {
    let ident = ident.strip_prefix("r#").unwrap_or(ident);
    let mut s = String::with_capacity(ident.len());
    for part in ident.split('_') {
        let mut cs = part.chars();
        if let Some(c) = cs.next() {
            s.extend(c.to_uppercase());
            s.push_str(cs.as_str());
        }
    }
    s
}

fn parse_tags(tagstr: &str) -> Result<Vec<FieldTag>, String> {
    tagstr.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| FieldTag::from_str(t).map_err(
            |_| format!("unknown field tag {t:?}")))
        .collect()
}

impl Schema {
    /// `fields` are (identifier, comma-separated tags) pairs in
    /// declaration order. Problems (unknown tags, labels that
    /// collide) are collected, not reported; registration checks
    /// them via `check`.
    pub fn new(name: &'static str, fields: &[(&'static str, &'static str)]) -> Self {
        let mut problems = Vec::new();
        let mut metas: Vec<FieldMeta> = Vec::with_capacity(fields.len());
        for &(ident, tagstr) in fields {
            let label = KString::from_string(label_from_ident(ident));
            let tags = match parse_tags(tagstr) {
                Ok(tags) => tags,
                Err(e) => {
                    problems.push(format!("field {ident:?}: {e}"));
                    Vec::new()
                }
            };
            if label.is_empty() {
                problems.push(format!("field {ident:?} has an empty label"));
            }
            if let Some(other) = metas.iter().find(|m| m.label.as_str() == label.as_str()) {
                problems.push(format!("fields {:?} and {ident:?} both have the label {:?}",
                                      other.ident, label.as_str()));
            }
            metas.push(FieldMeta { ident, label, tags });
        }
        Schema { name, fields: metas, problems }
    }

    pub fn check(&self) -> Result<(), String> {
        if self.problems.is_empty() {
            Ok(())
        } else {
            Err(self.problems.join("; "))
        }
    }

    pub fn field_index(&self, ident: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.ident == ident)
    }

    pub fn field_by_label(&self, label: &str) -> Option<(usize, &FieldMeta)> {
        self.fields.iter().enumerate().find(|(_, f)| f.label.as_str() == label)
    }

    /// The fields that show up as table columns, with their index.
    pub fn table_fields(&self) -> impl Iterator<Item = (usize, &FieldMeta)> {
        self.fields.iter().enumerate().filter(|(_, f)| !f.has_tag(FieldTag::TableHide))
    }

    /// The fields that are user-editable search inputs, with their
    /// index.
    pub fn search_fields(&self) -> impl Iterator<Item = (usize, &FieldMeta)> {
        self.fields.iter().enumerate().filter(|(_, f)| f.has_tag(FieldTag::Search))
    }
}
