//! The named page fragments the engine renders into: the page body,
//! tables, and search inputs. Any of them can be swapped out.

use std::{any::type_name, collections::BTreeMap, fmt::Debug, sync::Arc};

use anyhow::{Context, Result, bail};
use kstring::KString;
use lazy_static::lazy_static;

use crate::{error::GtmlError,
            html::{HtmlAllocator, Node, att, opt_att},
            table::TableData};

pub const BODY: &str = "body.html";
pub const TABLE: &str = "table.html";
pub const STRING_INPUT: &str = "string_input.html";

pub const DEFAULT_HTMX_SRC: &str = "https://unpkg.com/htmx.org@1.9.12";

/// What a template is filled with.
pub enum Slots<'t> {
    Body {
        main: Node,
    },
    Table(&'t TableData),
    StringInput {
        /// The query string key, `Criteria.Field`.
        name: String,
        value: String,
        placeholder: String,
        /// CSS selector of the container the results go into.
        target: String,
    },
}

impl<'t> Slots<'t> {
    pub fn kind(&self) -> &'static str {
        match self {
            Slots::Body { .. } => "Body",
            Slots::Table(_) => "Table",
            Slots::StringInput { .. } => "StringInput",
        }
    }
}

fn slot_mismatch(name: &str, expected: &str, slots: &Slots) -> anyhow::Error {
    GtmlError::TemplateFailure {
        name: name.into(),
        reason: format!("expects {expected} slots, got {}", slots.kind())
    }.into()
}

pub trait Template: Send + Sync {
    fn execute(&self, slots: Slots, html: &HtmlAllocator) -> Result<Node>;
}

/// A template given as a closure.
pub struct FnTemplate<F>
where F: Fn(Slots, &HtmlAllocator) -> Result<Node> + Send + Sync
{
    template: F,
}

impl<F> FnTemplate<F>
where F: Fn(Slots, &HtmlAllocator) -> Result<Node> + Send + Sync
{
    pub fn new(template: F) -> Self {
        FnTemplate { template }
    }
}

impl<F> Template for FnTemplate<F>
where F: Fn(Slots, &HtmlAllocator) -> Result<Node> + Send + Sync
{
    fn execute(&self, slots: Slots, html: &HtmlAllocator) -> Result<Node> {
        (self.template)(slots, html)
    }
}

impl<F> Debug for FnTemplate<F>
where F: Fn(Slots, &HtmlAllocator) -> Result<Node> + Send + Sync
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(type_name::<Self>())
    }
}


// ------------------------------------------------------------------
// The built-in templates

struct BodyTemplate {
    htmx_src: KString,
}

impl Template for BodyTemplate {
    fn execute(&self, slots: Slots, html: &HtmlAllocator) -> Result<Node> {
        let main = match slots {
            Slots::Body { main } => main,
            other => return Err(slot_mismatch(BODY, "Body", &other)),
        };
        html.html(
            [],
            [
                html.head(
                    [],
                    [
                        html.meta([att("charset", "utf-8")], [])?,
                        html.title([], [html.staticstr("gtml")?])?,
                        html.script([att("src", self.htmx_src.clone())], [])?,
                    ])?,
                html.body([], [main])?,
            ])
    }
}

struct TableTemplate;

impl Template for TableTemplate {
    fn execute(&self, slots: Slots, html: &HtmlAllocator) -> Result<Node> {
        let table = match slots {
            Slots::Table(table) => table,
            other => return Err(slot_mismatch(TABLE, "Table", &other)),
        };
        let mut header = Vec::with_capacity(table.headers.len());
        for h in &table.headers {
            header.push(html.th([], [html.str(h)?])?);
        }
        let mut rows = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let mut cells = Vec::with_capacity(row.values.len());
            for (i, cell) in row.values.iter().enumerate() {
                // The first cell links to the row's own page unless it
                // has a link of its own.
                let href = match (&cell.href, i) {
                    (Some(href), _) => Some(href),
                    (None, 0) => row.href.as_ref(),
                    _ => None,
                };
                let text = html.str(&cell.value)?;
                let content = match href {
                    Some(href) => html.a([att("href", href.clone())], [text])?,
                    None => text,
                };
                cells.push(html.td([], [content])?);
            }
            rows.push(html.tr([], cells)?);
        }
        html.table(
            [],
            [
                html.thead([], [html.tr([], header)?])?,
                html.tbody([], rows)?,
            ])
    }
}

struct StringInputTemplate;

impl Template for StringInputTemplate {
    fn execute(&self, slots: Slots, html: &HtmlAllocator) -> Result<Node> {
        match slots {
            Slots::StringInput { name, value, placeholder, target } =>
                html.input(
                    [att("type", "search"),
                     att("name", name),
                     att("value", value),
                     opt_att("placeholder", (!placeholder.is_empty()).then(|| placeholder)),
                     att("hx-get", "/"),
                     att("hx-target", target),
                     // send the other inputs of the form along
                     att("hx-include", "closest form"),
                     att("hx-swap", "outerHTML"),
                     att("hx-trigger", "keyup changed delay:300ms, search")],
                    []),
            other => Err(slot_mismatch(STRING_INPUT, "StringInput", &other)),
        }
    }
}


// ------------------------------------------------------------------
// The store

#[derive(Clone, Default)]
pub struct TemplateStore {
    templates: BTreeMap<KString, Arc<dyn Template>>,
}

impl Debug for TemplateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.templates.keys()).finish()
    }
}

impl TemplateStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in templates, loading htmx from `htmx_src`.
    pub fn builtin(htmx_src: &str) -> Self {
        Self::empty()
            .with(BODY, BodyTemplate { htmx_src: KString::from_ref(htmx_src) })
            .with(TABLE, TableTemplate)
            .with(STRING_INPUT, StringInputTemplate)
    }

    /// Add or replace the template called `name`.
    pub fn with(mut self, name: &str, template: impl Template + 'static) -> Self {
        self.templates.insert(KString::from_ref(name), Arc::new(template));
        self
    }

    pub fn get(&self, name: &str) -> Result<&Arc<dyn Template>> {
        match self.templates.get(name) {
            Some(t) => Ok(t),
            None => bail!(GtmlError::TemplateFailure {
                name: name.into(),
                reason: "no such template".into()
            }),
        }
    }

    pub fn execute(&self, name: &str, slots: Slots, html: &HtmlAllocator) -> Result<Node> {
        self.get(name)?
            .execute(slots, html)
            .with_context(|| format!("executing template {name:?}"))
    }
}

lazy_static! {
    static ref DEFAULT_STORE: Arc<TemplateStore> =
        Arc::new(TemplateStore::builtin(DEFAULT_HTMX_SRC));
}

/// The built-in templates with the default htmx location, created on
/// first use.
pub fn default_store() -> Arc<TemplateStore> {
    DEFAULT_STORE.clone()
}
