//! Request path sanitizing.
//!
//! # Responsibilities
//! - Percent-decode request paths
//! - Reject `..` segments, NUL bytes and backslashes
//! - Confirm a resolved file stays under the canonical static root
//!
//! # Design Decisions
//! - Fail closed: anything ambiguous is rejected, never normalized
//! - Escapes are 403, undecodable input is 400

use std::path::{Component, Path, PathBuf};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;

/// Why a path was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TraversalError {
    #[error("path escapes the configured root")]
    Escape,

    #[error("malformed request path")]
    Malformed,
}

impl TraversalError {
    pub fn status(self) -> StatusCode {
        match self {
            Self::Escape => StatusCode::FORBIDDEN,
            Self::Malformed => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for TraversalError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Percent-decode `raw`, rejecting invalid UTF-8, NUL and backslash.
pub fn decode_path(raw: &str) -> Result<String, TraversalError> {
    let decoded = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| TraversalError::Malformed)?;
    if decoded.contains(['\0', '\\']) {
        return Err(TraversalError::Malformed);
    }
    Ok(decoded.into_owned())
}

/// Turn a request path into a relative filesystem path.
///
/// Empty and `.` segments are dropped; any `..` segment is an escape.
pub fn sanitize(raw: &str) -> Result<PathBuf, TraversalError> {
    let decoded = decode_path(raw)?;
    let mut relative = PathBuf::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(TraversalError::Escape),
            s => {
                // A segment that is not a plain name (e.g. a Windows prefix).
                let mut components = Path::new(s).components();
                match (components.next(), components.next()) {
                    (Some(Component::Normal(_)), None) => relative.push(s),
                    _ => return Err(TraversalError::Malformed),
                }
            }
        }
    }
    Ok(relative)
}

/// True when the decoded path has a `.` or `..` segment.
pub fn has_dot_segments(raw: &str) -> Result<bool, TraversalError> {
    let decoded = decode_path(raw)?;
    Ok(decoded.split('/').any(|s| s == "." || s == ".."))
}

/// Canonicalize `candidate` and require it to live under `root`, which
/// must already be canonical.
pub async fn ensure_within(root: &Path, candidate: &Path) -> Result<PathBuf, TraversalError> {
    let canonical = tokio::fs::canonicalize(candidate)
        .await
        .map_err(|_| TraversalError::Escape)?;
    if canonical.starts_with(root) {
        Ok(canonical)
    } else {
        tracing::warn!(
            candidate = %candidate.display(),
            resolved = %canonical.display(),
            "Path traversal attempt blocked"
        );
        Err(TraversalError::Escape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_paths_become_relative() {
        assert_eq!(sanitize("/assets/app.js").unwrap(), PathBuf::from("assets/app.js"));
        assert_eq!(sanitize("/").unwrap(), PathBuf::new());
        assert_eq!(sanitize("//a/./b/").unwrap(), PathBuf::from("a/b"));
        assert_eq!(sanitize("/my%20file.txt").unwrap(), PathBuf::from("my file.txt"));
    }

    #[test]
    fn parent_segments_are_escapes() {
        assert_eq!(sanitize("/../../etc/passwd"), Err(TraversalError::Escape));
        assert_eq!(sanitize("/assets/../../etc/passwd"), Err(TraversalError::Escape));
        assert_eq!(sanitize("/%2e%2e/%2e%2e/etc/passwd"), Err(TraversalError::Escape));
        assert_eq!(sanitize("/%2E%2E%2fetc%2fpasswd"), Err(TraversalError::Escape));
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert_eq!(sanitize("/a%00b"), Err(TraversalError::Malformed));
        assert_eq!(sanitize("/..%5c..%5cwindows"), Err(TraversalError::Malformed));
        assert_eq!(sanitize("/%ff%fe"), Err(TraversalError::Malformed));
    }

    #[test]
    fn statuses() {
        assert_eq!(TraversalError::Escape.status(), StatusCode::FORBIDDEN);
        assert_eq!(TraversalError::Malformed.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn dot_segment_detection() {
        assert!(has_dot_segments("/api/../admin").unwrap());
        assert!(has_dot_segments("/api/%2e%2e/admin").unwrap());
        assert!(has_dot_segments("/api/./x").unwrap());
        assert!(!has_dot_segments("/api/v1.2/file.json").unwrap());
    }

    #[tokio::test]
    async fn symlink_out_of_root_is_an_escape() {
        let root = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret.txt"), "secret").unwrap();
        std::fs::write(root.path().join("ok.txt"), "ok").unwrap();

        let canonical_root = std::fs::canonicalize(root.path()).unwrap();
        assert!(ensure_within(&canonical_root, &root.path().join("ok.txt")).await.is_ok());

        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(outside.path().join("secret.txt"), root.path().join("link.txt"))
                .unwrap();
            assert_eq!(
                ensure_within(&canonical_root, &root.path().join("link.txt")).await,
                Err(TraversalError::Escape)
            );
        }
    }
}
