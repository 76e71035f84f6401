//! HTTP response handlers.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::utils::mime;

/// Live reload client script, with the WebSocket port substituted at
/// request time.
const RELOAD_JS: &str = include_str!("reload.js");

/// URL the client script is served from.
pub const RELOAD_JS_PATH: &str = "/__pipewright/reload.js";

/// Render the reload client for a given WebSocket port.
pub fn reload_js(ws_port: u16) -> String {
    RELOAD_JS.replace("__PW_WS_PORT__", &ws_port.to_string())
}

/// Script tag injected into served HTML.
fn reload_script_tag() -> String {
    format!(r#"<script src="{RELOAD_JS_PATH}"></script>"#)
}

/// Resolve a request URL to a file under `root`.
///
/// Directory URLs resolve to their `index.html`. Path traversal
/// components are rejected.
pub fn resolve_path(url: &str, root: &Path) -> Option<PathBuf> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let path = path.trim_start_matches('/');

    let mut resolved = root.to_path_buf();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }

    if resolved.is_dir() {
        let index = resolved.join("index.html");
        return index.is_file().then_some(index);
    }
    resolved.is_file().then_some(resolved)
}

/// Respond with a static file, injecting the reload script into HTML.
pub fn respond_file(request: Request, path: &Path, ws_port: Option<u16>) -> Result<()> {
    let content_type = mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    let body = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let body = maybe_inject_reload(body, content_type, ws_port);
    send_body(request, 200, content_type, body)
}

/// Respond with the reload client script from memory.
pub fn respond_reload_js(request: Request, ws_port: u16) -> Result<()> {
    send_body(
        request,
        200,
        mime::types::JAVASCRIPT,
        reload_js(ws_port).into_bytes(),
    )
}

/// Respond with 404 (custom `404.html` under `root` when present).
pub fn respond_not_found(request: Request, root: &Path, ws_port: Option<u16>) -> Result<()> {
    use mime::types::{HTML, PLAIN};

    let custom = root.join("404.html");
    let has_custom = custom.is_file();

    if is_head_request(&request) {
        return send_head(request, 404, if has_custom { HTML } else { PLAIN });
    }

    if has_custom
        && let Ok(body) = fs::read(&custom)
    {
        let body = maybe_inject_reload(body, HTML, ws_port);
        return send_body(request, 404, HTML, body);
    }

    send_body(request, 404, PLAIN, b"404 Not Found".to_vec())
}

/// Respond with 502 when the PHP upstream cannot be reached.
pub fn respond_bad_gateway(request: Request, detail: &str) -> Result<()> {
    let body = format!("502 Bad Gateway\n{detail}");
    send_body(request, 502, mime::types::PLAIN, body.into_bytes())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(
        request,
        503,
        mime::types::PLAIN,
        b"503 Service Unavailable".to_vec(),
    )
}

/// Inject the reload script into HTML bodies when live reload is on.
pub fn maybe_inject_reload(body: Vec<u8>, content_type: &str, ws_port: Option<u16>) -> Vec<u8> {
    match (mime::is_html(content_type), ws_port) {
        (true, Some(_)) => inject_reload_script(&body),
        _ => body,
    }
}

/// Inject the script tag before `</body>`, or append when absent.
fn inject_reload_script(content: &[u8]) -> Vec<u8> {
    let tag = reload_script_tag();
    let tag_bytes = tag.as_bytes();

    const PATTERN: &[u8] = b"</body>";

    if let Some(pos) = content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
    {
        let mut result = Vec::with_capacity(content.len() + tag_bytes.len());
        result.extend_from_slice(&content[..pos]);
        result.extend_from_slice(tag_bytes);
        result.extend_from_slice(&content[pos..]);
        return result;
    }

    let mut result = Vec::with_capacity(content.len() + tag_bytes.len());
    result.extend_from_slice(content);
    result.extend_from_slice(tag_bytes);
    result
}

pub fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<()> {
    let response =
        Response::empty(StatusCode(status)).with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &str) -> Header {
    Header::from_bytes(key, value).expect("static header is valid")
}
