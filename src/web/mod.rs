//! Embedded web dashboard for dupdash.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - A single-page duplicates dashboard with statistics, category tabs,
//!   search, and the embedded analytics report
//! - JSON API endpoints over the shared [`DashboardStore`](crate::store::DashboardStore)
//!
//! Scans run on a background thread so the page stays responsive while the
//! scan service works. Launched via `dupdash web` (default:
//! `http://127.0.0.1:9747`).

mod api;
mod frontend;

use std::io::Cursor;
use std::sync::Arc;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::client::{DuplicatesSource, ScanClient};
use crate::config::schema::DupdashConfig;
use crate::store::{self, SharedStore};

// ---------------------------------------------------------------------------
// Server state
// ---------------------------------------------------------------------------

/// Everything request handlers need. Cloned handles only; the store itself
/// lives behind its mutex.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub source: Arc<dyn DuplicatesSource + Send + Sync>,
    /// Scan service client for the health endpoint. `None` when serving a
    /// saved file.
    pub service: Option<ScanClient>,
    pub config: DupdashConfig,
}

impl AppState {
    /// State backed by the configured scan service.
    pub fn from_config(config: DupdashConfig) -> Self {
        let client = ScanClient::from_config(&config.api);
        Self {
            store: store::shared(),
            source: Arc::new(client.clone()),
            service: Some(client),
            config,
        }
    }

    /// State backed by an arbitrary source, e.g. a saved scan file.
    pub fn with_source(config: DupdashConfig, source: Arc<dyn DuplicatesSource + Send + Sync>) -> Self {
        Self {
            store: store::shared(),
            source,
            service: None,
            config,
        }
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Bind the dashboard server without serving yet.
pub fn bind(addr: &str) -> Result<Server> {
    Server::http(addr).map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))
}

/// Start the web dashboard server on the given address.
///
/// Blocks the current thread.
pub fn serve(addr: &str, state: AppState, open: bool) -> Result<()> {
    let server = bind(addr)?;

    println!("dupdash dashboard running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    if open {
        let url = format!("http://{addr}");
        if let Err(e) = open_browser(&url) {
            log::debug!("could not open browser: {e}");
        }
    }

    run(&server, &state);
    Ok(())
}

/// Handle requests sequentially until the server shuts down. Errors are
/// answered per request without stopping the loop.
pub fn run(server: &Server, state: &AppState) {
    for request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        let response = match dispatch(state, &method, &url) {
            Ok(resp) => resp,
            Err(e) => {
                log::error!("{method} {url} failed: {e:#}");
                json_error(500, &e.to_string())
            }
        };

        if let Err(e) = request.respond(response) {
            log::debug!("failed to send response for {url}: {e}");
        }

        log::info!("{method} {url}");
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch an incoming request to the appropriate handler.
fn dispatch(state: &AppState, method: &Method, url: &str) -> Result<Response<Cursor<Vec<u8>>>> {
    // Strip query string for path matching
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        // Frontend
        (&Method::Get, "/") | (&Method::Get, "/index.html") => Ok(serve_frontend()),

        // API: Scan lifecycle
        (&Method::Post, "/api/scan") => api::post_scan(state),
        (&Method::Post, "/api/error/clear") => api::post_clear_error(state),
        (&Method::Post, "/api/reset") => api::post_reset(state),

        // API: Read models
        (&Method::Get, "/api/state") => api::get_state(state),
        (&Method::Get, "/api/duplicates") => api::get_duplicates(state, url),
        (&Method::Get, "/api/breakdown") => api::get_breakdown(state),

        // API: Health
        (&Method::Get, "/api/health") => api::get_health(state),

        // 404
        _ => Ok(json_error(404, "not found")),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Serve the embedded single-page frontend.
fn serve_frontend() -> Response<Cursor<Vec<u8>>> {
    let html = frontend::INDEX_HTML;
    Response::from_data(html.as_bytes().to_vec())
        .with_header(content_type("text/html; charset=utf-8"))
        .with_status_code(StatusCode(200))
}

/// JSON error body with the given status.
pub(crate) fn json_error(status: u16, message: &str) -> Response<Cursor<Vec<u8>>> {
    let body = serde_json::json!({ "error": message }).to_string();
    Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(status))
}

/// JSON content type header.
pub(crate) fn content_type_json() -> Header {
    content_type("application/json; charset=utf-8")
}

fn content_type(value: &str) -> Header {
    Header::from_bytes("Content-Type", value).expect("static header is valid ASCII")
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}
