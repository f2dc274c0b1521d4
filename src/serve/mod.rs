//! Static file server for the output directory.
//!
//! Serves GET and HEAD requests one at a time. Requests are resolved by
//! [`FileServer`], which honors `.redirect` files and falls back to
//! `error.html` for missing paths.

mod resolve;
mod response;

pub use resolve::{FileServer, Resolution, ResolveError};

use anyhow::{Result, anyhow};
use std::net::{IpAddr, SocketAddr};
use tiny_http::{Method, Request, Server};

use crate::config::SiteConfig;
use crate::{debug, log};

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind and serve the output directory until the process is stopped.
pub fn serve(config: &SiteConfig) -> Result<()> {
    let (server, addr) = bind_with_retry(config.serve.interface, config.serve.port)?;
    let files = FileServer::new(config.output_dir());
    log!("serve"; "http://{} ({})", addr, files.root().display());

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &files) {
            log!("serve"; "request error: {e:#}");
        }
    }
    Ok(())
}

/// Bind to the interface, trying the following ports when one is taken.
fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);
        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }
    Err(anyhow!(
        "failed to bind after {MAX_PORT_RETRIES} attempts (ports {base_port}-{}): {}",
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map_or_else(String::new, |e| e.to_string())
    ))
}

fn handle_request(request: Request, files: &FileServer) -> Result<()> {
    let method = request.method().clone();
    let url = request.url().to_string();

    if !matches!(method, Method::Get | Method::Head) {
        debug!("serve"; "{} {} -> 405", method, url);
        return response::respond_method_not_allowed(request);
    }

    let resolution = match files.resolve_request(&url) {
        Ok(resolution) => resolution,
        Err(e) => {
            log!("warning"; "{e}");
            Resolution::NotFound
        }
    };
    let status = response::respond(request, resolution, files.root())?;
    debug!("serve"; "{} {} -> {}", method, url, status);
    Ok(())
}
