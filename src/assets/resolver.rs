//! Static file resolution with SPA fallback.
//!
//! # Responsibilities
//! - Map a request path to a file under the static root
//! - Fall back to the entry document for unmatched paths
//! - Hand the chosen file to tower-http's file services, which stream it
//!   and answer `HEAD` and `If-Modified-Since`
//!
//! # Design Decisions
//! - The root is canonicalized per request, so a build output swapped in
//!   place is picked up without restart
//! - Dot-file segments never match; they behave like unknown routes
//! - Lookup only stats files; bytes are read by `ServeDir`/`ServeFile`
//! - Entry documents are always sent uncached, regular assets revalidate

use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

use crate::config::schema::{FallbackMode, StaticFilesConfig};
use crate::http::response::{method_not_allowed, set_no_cache};
use crate::security::traversal::{ensure_within, sanitize, TraversalError};

/// `Cache-Control` for regular assets: cache, but revalidate every time.
pub const REVALIDATE: &str = "public, max-age=0";

/// Validators the entry document must not carry into `ServeFile`.
const CONDITIONAL_HEADERS: [header::HeaderName; 6] = [
    header::IF_MODIFIED_SINCE,
    header::IF_UNMODIFIED_SINCE,
    header::IF_NONE_MATCH,
    header::IF_MATCH,
    header::IF_RANGE,
    header::RANGE,
];

/// A file found under the static root.
#[derive(Debug, Clone)]
pub struct StaticFile {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl StaticFile {
    async fn stat(path: PathBuf) -> Option<Self> {
        let meta = tokio::fs::metadata(&path).await.ok()?;
        if !meta.is_file() {
            return None;
        }
        Some(Self {
            path,
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }

    /// Weak validator from size and modification time.
    pub fn etag(&self) -> String {
        let mtime = self
            .modified
            .and_then(|m| m.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_millis());
        format!("W/\"{:x}-{:x}\"", self.len, mtime)
    }
}

/// Result of resolving a request path.
#[derive(Debug)]
pub enum Resolved {
    /// A regular asset.
    File(StaticFile),
    /// The entry document, served directly or as SPA fallback.
    EntryDocument(StaticFile),
    NotFound,
}

/// Serves the build output directory.
#[derive(Debug, Clone)]
pub struct StaticResponder {
    root: PathBuf,
    index_file: String,
    fallback: FallbackMode,
    assets: ServeDir,
}

impl StaticResponder {
    pub fn new(config: &StaticFilesConfig) -> Self {
        Self {
            root: PathBuf::from(&config.root),
            index_file: config.index_file.clone(),
            fallback: config.fallback,
            assets: ServeDir::new(&config.root),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `request_path` (raw, percent-encoded) to a file.
    pub async fn resolve(&self, request_path: &str) -> Result<Resolved, TraversalError> {
        let relative = sanitize(request_path)?;

        let root = match tokio::fs::canonicalize(&self.root).await {
            Ok(root) => root,
            Err(e) => {
                tracing::warn!(root = %self.root.display(), error = %e, "Static root not accessible");
                return Ok(Resolved::NotFound);
            }
        };

        if let Some(file) = self.lookup(&root, &relative).await? {
            let is_entry = file
                .path
                .file_name()
                .is_some_and(|name| name == self.index_file.as_str());
            return Ok(if is_entry {
                Resolved::EntryDocument(file)
            } else {
                Resolved::File(file)
            });
        }

        let wants_fallback = match self.fallback {
            FallbackMode::Always => true,
            FallbackMode::Extensionless => relative.extension().is_none(),
            FallbackMode::Disabled => false,
        };
        if !wants_fallback {
            return Ok(Resolved::NotFound);
        }

        Ok(match StaticFile::stat(root.join(&self.index_file)).await {
            Some(file) => Resolved::EntryDocument(file),
            None => {
                tracing::warn!(
                    root = %root.display(),
                    index_file = %self.index_file,
                    "Entry document missing, SPA fallback unavailable"
                );
                Resolved::NotFound
            }
        })
    }

    /// True when the entry document exists.
    pub async fn is_ready(&self) -> bool {
        tokio::fs::metadata(self.root.join(&self.index_file))
            .await
            .is_ok_and(|m| m.is_file())
    }

    async fn lookup(
        &self,
        root: &Path,
        relative: &Path,
    ) -> Result<Option<StaticFile>, TraversalError> {
        let hidden = relative
            .components()
            .any(|c| c.as_os_str().to_string_lossy().starts_with('.'));
        if hidden {
            return Ok(None);
        }

        let mut candidate = root.join(relative);
        match tokio::fs::metadata(&candidate).await {
            Ok(meta) if meta.is_dir() => candidate.push(&self.index_file),
            Ok(meta) if meta.is_file() => {}
            _ => return Ok(None),
        }
        if !tokio::fs::metadata(&candidate)
            .await
            .is_ok_and(|m| m.is_file())
        {
            return Ok(None);
        }

        let confined = ensure_within(root, &candidate).await?;
        Ok(StaticFile::stat(confined).await)
    }

    /// Serve a request that no other route claimed.
    pub async fn respond(&self, req: Request<Body>) -> Response {
        if req.method() != Method::GET && req.method() != Method::HEAD {
            return method_not_allowed();
        }

        let path = req.uri().path().to_string();
        let resolved = match self.resolve(&path).await {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Rejected static path");
                return e.into_response();
            }
        };

        match resolved {
            Resolved::File(file) => self.asset_response(file, req).await,
            Resolved::EntryDocument(file) => entry_response(file, req).await,
            Resolved::NotFound => (StatusCode::NOT_FOUND, "Not Found").into_response(),
        }
    }

    async fn asset_response(&self, file: StaticFile, req: Request<Body>) -> Response {
        let etag = file.etag();
        let if_none_match = req
            .headers()
            .get(header::IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok());
        if check_etag_match(if_none_match, &etag) {
            let mut response = StatusCode::NOT_MODIFIED.into_response();
            add_validators(&mut response, &etag);
            return response;
        }

        let mut response = match self.assets.clone().oneshot(req).await {
            Ok(response) => response.into_response(),
            Err(never) => match never {},
        };
        if response.status().is_success() || response.status() == StatusCode::NOT_MODIFIED {
            add_validators(&mut response, &etag);
        }
        response
    }
}

/// The entry document, always a full uncached `200`.
async fn entry_response(file: StaticFile, mut req: Request<Body>) -> Response {
    for name in CONDITIONAL_HEADERS {
        req.headers_mut().remove(name);
    }

    let result: Result<_, Infallible> = ServeFile::new(&file.path).oneshot(req).await;
    let mut response = match result {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    };
    response.headers_mut().remove(header::LAST_MODIFIED);
    set_no_cache(response.headers_mut());
    response
}

fn add_validators(response: &mut Response, etag: &str) {
    if let Ok(value) = HeaderValue::from_str(etag) {
        response.headers_mut().insert(header::ETAG, value);
    }
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static(REVALIDATE));
}

/// `If-None-Match` check with weak comparison.
///
/// Supports a single tag, a comma-separated list and `*`.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    let opaque = |tag: &str| tag.trim().trim_start_matches("W/").to_string();
    let ours = opaque(etag);
    if_none_match.is_some_and(|client| {
        client
            .split(',')
            .any(|tag| tag.trim() == "*" || opaque(tag) == ours)
    })
}
