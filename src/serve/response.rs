//! HTTP response handlers.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use super::content::maybe_inject_reload;
use crate::embed::serve::reload_js;
use crate::utils::mime;

/// Respond with a static file; HTML pages get the reload script.
pub fn respond_file(request: Request, path: &Path) -> Result<()> {
    let content_type = mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    let body = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let body = maybe_inject_reload(body, content_type);
    send_body(request, 200, content_type, body)
}

/// Respond with 404.
pub fn respond_not_found(request: Request) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, 404, mime::PLAIN);
    }
    send_body(request, 404, mime::PLAIN, b"404 Not Found".to_vec())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, mime::PLAIN, b"503 Service Unavailable".to_vec())
}

/// Respond with reload.js from memory.
pub fn respond_reload_js(request: Request, ws_port: u16) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, 200, mime::JAVASCRIPT);
    }
    let body = reload_js(ws_port);
    send_body(request, 200, mime::JAVASCRIPT, body.into_bytes())
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<()> {
    let mut response = Response::empty(StatusCode(status));
    add_header(&mut response, "Content-Type", content_type);
    request.respond(response)?;
    Ok(())
}

fn send_body(request: Request, status: u16, content_type: &'static str, body: Vec<u8>) -> Result<()> {
    let mut response = Response::from_data(body).with_status_code(StatusCode(status));
    add_header(&mut response, "Content-Type", content_type);
    add_header(&mut response, "Cache-Control", "no-store");
    request.respond(response)?;
    Ok(())
}

fn add_header<R: std::io::Read>(response: &mut Response<R>, key: &'static str, value: &'static str) {
    if let Ok(header) = Header::from_bytes(key, value) {
        response.add_header(header);
    }
}
