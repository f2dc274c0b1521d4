//! HTTP responses for resolved requests.

use anyhow::{Context, Result, anyhow};
use std::{fs, path::Path};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use super::resolve::Resolution;
use crate::generator::ERROR_PATH;
use crate::utils::mime::{self, types};

/// Answer `request` according to `resolution`. Returns the status sent.
pub fn respond(request: Request, resolution: Resolution, root: &Path) -> Result<u16> {
    match resolution {
        Resolution::File { path, content_type } => {
            respond_file(request, 200, &path, content_type)?;
            Ok(200)
        }
        Resolution::Redirect {
            location, status, ..
        } => {
            let response = Response::empty(StatusCode(status))
                .with_header(header("Location", &location)?)
                .with_header(header("Content-Type", &mime::header_value(types::PLAIN))?);
            request.respond(response)?;
            Ok(status)
        }
        Resolution::NotFound => {
            respond_not_found(request, root)?;
            Ok(404)
        }
        Resolution::Forbidden => {
            send_body(request, 403, types::PLAIN, b"403 Forbidden".to_vec())?;
            Ok(403)
        }
    }
}

/// Anything other than GET and HEAD.
pub fn respond_method_not_allowed(request: Request) -> Result<()> {
    let response = Response::from_data(b"405 Method Not Allowed".to_vec())
        .with_status_code(StatusCode(405))
        .with_header(header("Allow", "GET, HEAD")?)
        .with_header(header("Content-Type", &mime::header_value(types::PLAIN))?);
    request.respond(response)?;
    Ok(())
}

fn respond_file(request: Request, status: u16, path: &Path, content_type: &'static str) -> Result<()> {
    if is_head_request(&request) {
        let response = Response::empty(StatusCode(status))
            .with_header(header("Content-Type", &mime::header_value(content_type))?);
        request.respond(response)?;
        return Ok(());
    }

    let body = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    send_body(request, status, content_type, body)
}

/// 404 with the site's error page when there is one.
fn respond_not_found(request: Request, root: &Path) -> Result<()> {
    let error_page = root.join(ERROR_PATH.trim_start_matches('/'));
    if error_page.is_file() {
        return respond_file(request, 404, &error_page, types::HTML);
    }
    send_body(request, 404, types::PLAIN, b"404 Not Found".to_vec())
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_body(request: Request, status: u16, content_type: &'static str, body: Vec<u8>) -> Result<()> {
    let body = if is_head_request(&request) { Vec::new() } else { body };
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(header("Content-Type", &mime::header_value(content_type))?);
    request.respond(response)?;
    Ok(())
}

fn header(key: &'static str, value: &str) -> Result<Header> {
    Header::from_bytes(key, value).map_err(|()| anyhow!("invalid {key} header: {value:?}"))
}
