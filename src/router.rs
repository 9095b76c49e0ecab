//! A trie of path segments with `{param}` placeholders, mapping
//! request paths to handlers and the values bound to the
//! placeholders.

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use kstring::KString;

use crate::{error::GtmlError, path_codec::{PathParams, path_segments}};

#[derive(Debug, PartialEq)]
enum PatternSegment {
    Literal(KString),
    Param(KString),
}

fn parse_pattern(pattern: &str) -> Result<Vec<PatternSegment>> {
    // Literals are decoded the same way as request paths, so that they
    // compare equal.
    let segments = path_segments(pattern)?;
    segments.into_iter().map(|s| {
        let param = s.strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .map(KString::from_ref);
        match param {
            Some(name) if name.is_empty() =>
                bail!("empty parameter name in route pattern {pattern:?}"),
            Some(name) => Ok(PatternSegment::Param(name)),
            None => Ok(PatternSegment::Literal(s)),
        }
    }).collect()
}

#[derive(Debug)]
struct RouteNode<T> {
    literals: BTreeMap<KString, RouteNode<T>>,
    param: Option<(KString, Box<RouteNode<T>>)>,
    endpoint: Option<T>,
}

impl<T> RouteNode<T> {
    fn new() -> Self {
        RouteNode {
            literals: BTreeMap::new(),
            param: None,
            endpoint: None,
        }
    }

    fn lookup<'s>(
        &'s self,
        path: &[KString],
        params: &mut Vec<(KString, KString)>
    ) -> Option<&'s T> {
        let (fst, rst) = match path.split_first() {
            Some(fst_rst) => fst_rst,
            None => return self.endpoint.as_ref(),
        };
        // Literals win over placeholders.
        if let Some(node) = self.literals.get(fst.as_str()) {
            if let Some(val) = node.lookup(rst, params) {
                return Some(val)
            }
        }
        if let Some((name, node)) = &self.param {
            params.push((name.clone(), fst.clone()));
            if let Some(val) = node.lookup(rst, params) {
                return Some(val)
            }
            params.pop();
        }
        None
    }
}

/// Only exact matches: no default handlers for path prefixes.
#[derive(Debug)]
pub struct PatternRouter<T> {
    root: RouteNode<T>,
    patterns: Vec<KString>,
}

impl<T> PatternRouter<T> {
    pub fn new() -> Self {
        PatternRouter {
            root: RouteNode::new(),
            patterns: Vec::new(),
        }
    }

    /// Add `val` at `pattern`, e.g. `/Product/{Product}`. Fails if
    /// a pattern of the same shape is already present.
    pub fn add(&mut self, pattern: &str, val: T) -> Result<&mut Self> {
        let segments = parse_pattern(pattern)?;
        let mut node = &mut self.root;
        for segment in segments {
            node = match segment {
                PatternSegment::Literal(lit) =>
                    node.literals.entry(lit).or_insert_with(RouteNode::new),
                PatternSegment::Param(name) => {
                    if let Some((existing, _)) = &node.param {
                        if *existing != name {
                            bail!(GtmlError::DuplicateRegistration(format!(
                                "route pattern {pattern:?} clashes with parameter {:?} \
                                 of an existing route", existing.as_str())))
                        }
                    }
                    let (_, next) = node.param.get_or_insert_with(
                        || (name, Box::new(RouteNode::new())));
                    &mut **next
                }
            };
        }
        if node.endpoint.is_some() {
            bail!(GtmlError::DuplicateRegistration(format!("route {pattern:?}")))
        }
        node.endpoint = Some(val);
        self.patterns.push(KString::from_ref(pattern));
        Ok(self)
    }

    /// Look up the decoded segments of a request path.
    pub fn get(&self, path: &[KString]) -> Option<(&T, PathParams)> {
        let mut bound = Vec::new();
        let val = self.root.lookup(path, &mut bound)?;
        let mut params = PathParams::new();
        for (name, value) in bound {
            params.push(name, value);
        }
        Some((val, params))
    }

    /// The registered patterns, in registration order.
    pub fn patterns(&self) -> &[KString] {
        &self.patterns
    }
}
