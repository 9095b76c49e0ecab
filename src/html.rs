//! Html dom abstraction, with runtime typing.

//! Nodes are plain owned trees; the `HtmlAllocator` hands them out
//! and counts them, so that a runaway record graph can't make a
//! single request build an unbounded document.

use std::{cell::Cell, io::Write};

use anyhow::{Result, bail};
use kstring::KString;

use crate::error::GtmlError;

// https://www.w3.org/International/questions/qa-byte-order-mark#problems
const BOM: &str = "\u{FEFF}";
const DOCTYPE: &str = "<!DOCTYPE html>\n";

#[derive(Debug, PartialEq, Eq)]
pub struct ElementMeta {
    pub tag_name: &'static str,
    pub has_closing_tag: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub meta: &'static ElementMeta,
    pub attr: Vec<(KString, KString)>,
    pub body: Vec<Node>,
}

/// HTML that was serialized (or written by hand) elsewhere and is
/// trusted to be well-formed; it is output verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct SerHtmlFrag(KString);

impl SerHtmlFrag {
    pub fn new(s: impl Into<KString>) -> Self {
        SerHtmlFrag(s.into())
    }
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    String(KString),
    Preserialized(SerHtmlFrag),
    /// A sequence of sibling nodes without a wrapper element.
    List(Vec<Node>),
    None,
}

pub fn att<T, U>(key: T, val: U) -> Option<(KString, KString)>
where T: Into<KString>, U: Into<KString>
{
    Some((key.into(), val.into()))
}

pub fn opt_att<T, U>(key: T, val: Option<U>) -> Option<(KString, KString)>
where T: Into<KString>, U: Into<KString>
{
    val.map(|val| (key.into(), val.into()))
}

pub trait ToAttrs {
    fn to_attrs(self) -> Vec<(KString, KString)>;
}

// Values returned by `att` and `opt_att`:
impl<const N: usize> ToAttrs for [Option<(KString, KString)>; N] {
    fn to_attrs(self) -> Vec<(KString, KString)> {
        self.into_iter().flatten().collect()
    }
}

impl ToAttrs for Vec<(KString, KString)> {
    fn to_attrs(self) -> Vec<(KString, KString)> {
        self
    }
}

pub trait ToBody {
    fn to_body(self) -> Vec<Node>;
}

impl<const N: usize> ToBody for [Node; N] {
    fn to_body(self) -> Vec<Node> {
        self.into_iter().collect()
    }
}

impl ToBody for Vec<Node> {
    fn to_body(self) -> Vec<Node> {
        self
    }
}

pub struct HtmlAllocator {
    max_nodes: u32,
    nodes: Cell<u32>,
}

impl HtmlAllocator {
    pub fn new(max_nodes: u32) -> Self {
        HtmlAllocator {
            max_nodes,
            nodes: Cell::new(0),
        }
    }

    /// How many nodes have been handed out so far.
    pub fn node_count(&self) -> u32 {
        self.nodes.get()
    }

    fn count_node(&self) -> Result<()> {
        let n = self.nodes.get() + 1;
        if n > self.max_nodes {
            bail!(GtmlError::RenderFailure(format!(
                "document exceeds the limit of {} HTML nodes", self.max_nodes)))
        }
        self.nodes.set(n);
        Ok(())
    }

    pub fn element(
        &self,
        meta: &'static ElementMeta,
        attr: impl ToAttrs,
        body: impl ToBody
    ) -> Result<Node> {
        self.count_node()?;
        Ok(Node::Element(Element {
            meta,
            attr: attr.to_attrs(),
            body: body.to_body(),
        }))
    }

    pub fn string(&self, s: impl Into<KString>) -> Result<Node> {
        self.count_node()?;
        Ok(Node::String(s.into()))
    }

    pub fn staticstr(&self, s: &'static str) -> Result<Node> {
        self.count_node()?;
        Ok(Node::String(KString::from_static(s)))
    }

    pub fn str(&self, s: &str) -> Result<Node> {
        self.count_node()?;
        Ok(Node::String(KString::from_ref(s)))
    }

    pub fn preserialized(&self, frag: SerHtmlFrag) -> Result<Node> {
        self.count_node()?;
        Ok(Node::Preserialized(frag))
    }

    pub fn list(&self, nodes: impl ToBody) -> Result<Node> {
        self.count_node()?;
        Ok(Node::List(nodes.to_body()))
    }
}

macro_rules! def_elements {
    { $( $name:ident $tag:literal $closing:literal; )* } => {
        impl HtmlAllocator {
            $(
                pub fn $name(&self, attr: impl ToAttrs, body: impl ToBody) -> Result<Node> {
                    self.element(&ElementMeta { tag_name: $tag, has_closing_tag: $closing },
                                 attr, body)
                }
            )*
        }
    }
}

def_elements! {
    html "html" true;
    head "head" true;
    title "title" true;
    meta "meta" false;
    script "script" true;
    body "body" true;
    h1 "h1" true;
    h2 "h2" true;
    p "p" true;
    div "div" true;
    span "span" true;
    a "a" true;
    table "table" true;
    thead "thead" true;
    tbody "tbody" true;
    tr "tr" true;
    th "th" true;
    td "td" true;
    form "form" true;
    input "input" false;
}


pub fn html_escape(s: &str, out: &mut impl Write) -> std::io::Result<()> {
    let bytes = s.as_bytes();
    let mut last = 0;
    for (i, b) in bytes.iter().enumerate() {
        let rep: &[u8] = match b {
            b'&' => b"&amp;",
            b'<' => b"&lt;",
            b'>' => b"&gt;",
            b'"' => b"&quot;",
            b'\'' => b"&#39;",
            _ => continue
        };
        out.write_all(&bytes[last..i])?;
        out.write_all(rep)?;
        last = i + 1;
    }
    out.write_all(&bytes[last..])
}

pub fn html_escape_string(s: &str) -> String {
    let mut v = Vec::with_capacity(s.len());
    html_escape(s, &mut v).expect("no I/O errors writing to a Vec");
    String::from_utf8(v).expect("escaping only replaces ASCII bytes")
}


pub trait Print {
    /// Print serialized HTML.
    fn print_html_fragment(&self, out: &mut impl Write) -> Result<()>;

    fn to_html_fragment_string(&self) -> String {
        let mut s = Vec::new();
        self.print_html_fragment(&mut s).expect("no I/O errors writing to a Vec");
        // Only str values and ASCII literals were written.
        String::from_utf8(s).expect("valid UTF-8")
    }

    fn to_html_document_string(&self) -> String {
        let mut s = Vec::new();
        // Add a byte-order mark (BOM) to make sure the output is read
        // correctly from files, too (e.g. by Safari).
        s.extend_from_slice(BOM.as_bytes());
        s.extend_from_slice(DOCTYPE.as_bytes());
        self.print_html_fragment(&mut s).expect("no I/O errors writing to a Vec");
        String::from_utf8(s).expect("valid UTF-8")
    }
}

impl Print for (KString, KString) {
    fn print_html_fragment(&self, out: &mut impl Write) -> Result<()> {
        out.write_all(self.0.as_bytes())?; // keys are always our own literals
        out.write_all(b"=\"")?;
        html_escape(&self.1, out)?;
        out.write_all(b"\"")?;
        Ok(())
    }
}

impl Print for Element {
    fn print_html_fragment(&self, out: &mut impl Write) -> Result<()> {
        let meta = self.meta;
        out.write_all(b"<")?;
        out.write_all(meta.tag_name.as_bytes())?;
        for att in &self.attr {
            out.write_all(b" ")?;
            att.print_html_fragment(out)?;
        }
        out.write_all(b">")?;
        for node in &self.body {
            node.print_html_fragment(out)?;
        }
        if meta.has_closing_tag {
            out.write_all(b"</")?;
            out.write_all(meta.tag_name.as_bytes())?;
            out.write_all(b">")?;
        }
        Ok(())
    }
}

impl Print for Node {
    fn print_html_fragment(&self, out: &mut impl Write) -> Result<()> {
        match self {
            Node::Element(e) => e.print_html_fragment(out)?,
            Node::String(s) => html_escape(s, out)?,
            Node::Preserialized(ser) => out.write_all(ser.as_str().as_bytes())?,
            Node::List(nodes) => for node in nodes {
                node.print_html_fragment(out)?;
            },
            Node::None => (),
        }
        Ok(())
    }
}
