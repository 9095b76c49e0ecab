//! Server settings, taken from `GTML_*` environment variables.

use std::{env::VarError, path::PathBuf};

use anyhow::{Context, Result, bail};

use crate::{registrar::DEFAULT_MAX_HTML_NODES, templates::DEFAULT_HTMX_SRC};

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";

/// Get an env var as a String; decoding failures are reported as
/// errors.
pub fn getenv(name: &str) -> Result<Option<String>> {
    match std::env::var(name) {
        Ok(s) => Ok(Some(s)),
        Err(e) => match e {
            VarError::NotPresent => Ok(None),
            VarError::NotUnicode(_) => bail!("{name:?} env var is not unicode"),
        }
    }
}

pub fn parse_bool(s: &str) -> Result<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("not a boolean: {s:?}"),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Where the body template loads htmx from.
    pub htmx_src: String,
    pub max_html_nodes: u32,
    /// Access log file, stderr if `None`.
    pub access_log: Option<PathBuf>,
    pub verbose: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen_addr: DEFAULT_LISTEN_ADDR.into(),
            htmx_src: DEFAULT_HTMX_SRC.into(),
            max_html_nodes: DEFAULT_MAX_HTML_NODES,
            access_log: None,
            verbose: false,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(getenv)
    }

    /// `lookup` returns the value of the variable of the given name,
    /// if set. Unset variables keep their default.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Result<Option<String>>
    ) -> Result<Self> {
        let mut config = ServerConfig::default();
        if let Some(v) = lookup("GTML_LISTEN")? {
            config.listen_addr = v;
        }
        if let Some(v) = lookup("GTML_HTMX_SRC")? {
            config.htmx_src = v;
        }
        if let Some(v) = lookup("GTML_MAX_HTML_NODES")? {
            config.max_html_nodes = v.trim().parse()
                .with_context(|| format!("GTML_MAX_HTML_NODES: {v:?}"))?;
        }
        if let Some(v) = lookup("GTML_ACCESS_LOG")? {
            config.access_log = if v.is_empty() { None } else { Some(v.into()) };
        }
        if let Some(v) = lookup("GTML_VERBOSE")? {
            config.verbose = parse_bool(&v).context("GTML_VERBOSE")?;
        }
        Ok(config)
    }
}
