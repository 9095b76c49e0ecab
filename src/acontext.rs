//! What the engine knows about the request it is rendering for.

use anyhow::{Result, anyhow};
use rouille::Request;

use crate::{error::GtmlError, query::QueryString};

/// The request header naming the container a partial update is for.
pub const HX_TARGET: &str = "HX-Target";
/// The response header telling the client which URL to show.
pub const HX_PUSH_URL: &str = "HX-Push-Url";
/// Prefix of the ids of search result containers.
pub const SEARCH_TARGET_PREFIX: &str = "search-";

pub struct AContext<'r> {
    request: &'r Request,
    query: QueryString,
}

impl<'r> AContext<'r> {
    pub fn new(request: &'r Request) -> Result<Self> {
        let query = QueryString::from_str(request.raw_query_string())
            .map_err(|e| anyhow!(GtmlError::DecodeFailure(e.to_string())))?;
        Ok(AContext {
            request,
            query,
        })
    }

    /// Path plus query string, as requested.
    pub fn raw_url(&self) -> &str { self.request.raw_url() }
    /// Path only, still percent-encoded.
    pub fn path_str(&self) -> &str {
        let url = self.request.raw_url();
        url.split_once('?').map(|(p, _)| p).unwrap_or(url)
    }
    pub fn query(&self) -> &QueryString { &self.query }
    pub fn header(&self, key: &str) -> Option<&str> { self.request.header(key) }

    /// The field label of the search container a partial update
    /// request targets, if this is one.
    pub fn search_target(&self) -> Option<&str> {
        let target = self.header(HX_TARGET)?;
        // htmx sends the bare id; allow a selector, too.
        let target = target.strip_prefix('#').unwrap_or(target);
        target.strip_prefix(SEARCH_TARGET_PREFIX)
    }
}
