//! Running an `App` with rouille.

use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use rouille::{Request, Response, Server};

use crate::{apachelog::{log_combined, open_log_output},
            config::ServerConfig,
            info,
            registrar::App,
            warn::set_verbose};

/// Serve `app` at the configured address; only returns if the server
/// could not be started.
pub fn serve(app: Arc<App>, config: &ServerConfig) -> Result<()> {
    set_verbose(config.verbose);
    for route in app.routes() {
        info!("route {route}");
    }
    let access_log = Mutex::new(open_log_output(config.access_log.as_deref())?);
    let server = Server::new(config.listen_addr.as_str(), move |request: &Request| -> Response {
        log_combined(request, &access_log, || app.handle(request))
    }).map_err(|e| anyhow!("starting server at {:?}: {e}", config.listen_addr))?;
    info!("listening on {}", server.server_addr());
    server.run();
    Ok(())
}
