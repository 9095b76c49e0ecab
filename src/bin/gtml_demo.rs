use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser as ClapParser;
use gtml::{config::ServerConfig, demo, server::serve, templates::TemplateStore};


#[derive(clap::Parser, Debug)]
/// Serve the products and shopping lists demo. Options override the
/// GTML_* environment variables.
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:3000 (GTML_LISTEN)
    #[clap(long)]
    listen: Option<String>,

    /// URL to load htmx from (GTML_HTMX_SRC)
    #[clap(long)]
    htmx_src: Option<String>,

    /// Maximum number of HTML nodes per response (GTML_MAX_HTML_NODES)
    #[clap(long)]
    max_html_nodes: Option<u32>,

    /// Append the access log to this file instead of stderr
    /// (GTML_ACCESS_LOG)
    #[clap(long)]
    access_log: Option<PathBuf>,

    /// Print informational messages (GTML_VERBOSE)
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = ServerConfig::from_env()?;
    if let Some(v) = args.listen {
        config.listen_addr = v;
    }
    if let Some(v) = args.htmx_src {
        config.htmx_src = v;
    }
    if let Some(v) = args.max_html_nodes {
        config.max_html_nodes = v;
    }
    if let Some(v) = args.access_log {
        config.access_log = Some(v);
    }
    config.verbose |= args.verbose;

    let templates = Arc::new(TemplateStore::builtin(&config.htmx_src));
    let app = demo::app(templates, config.max_html_nodes)?;
    serve(Arc::new(app), &config)
}
