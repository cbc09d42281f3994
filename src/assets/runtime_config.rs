//! Runtime configuration script (`/config.js`).
//!
//! The SPA is built once and deployed to many environments; it learns its
//! backend URL by loading this script before the bundle. The value is read
//! from the environment on every request and never cached.

use std::fmt;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};

use crate::config::env::EnvSource;
use crate::config::schema::RuntimeConfigScript;
use crate::http::response::no_cache;
use crate::http::server::AppState;

pub const CONTENT_TYPE: &str = "application/javascript; charset=utf-8";

/// Renders `window.<name>=<url>;`.
#[derive(Clone)]
pub struct ConfigScript {
    global_name: String,
    env_vars: Vec<String>,
    fallback_url: String,
    env: Arc<dyn EnvSource>,
}

impl fmt::Debug for ConfigScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigScript")
            .field("global_name", &self.global_name)
            .field("env_vars", &self.env_vars)
            .field("fallback_url", &self.fallback_url)
            .finish_non_exhaustive()
    }
}

impl ConfigScript {
    pub fn new(
        config: &RuntimeConfigScript,
        fallback_url: impl Into<String>,
        env: Arc<dyn EnvSource>,
    ) -> Self {
        Self {
            global_name: config.global_name.clone(),
            env_vars: config.env_vars.clone(),
            fallback_url: fallback_url.into(),
            env,
        }
    }

    /// Backend URL as of now.
    pub fn backend_url(&self) -> String {
        self.env
            .first_of(&self.env_vars)
            .unwrap_or_else(|| self.fallback_url.clone())
    }

    pub fn render(&self) -> String {
        let url = self.backend_url();
        // A JSON string is a valid JS string literal.
        let literal = serde_json::to_string(&url).unwrap_or_else(|_| "\"\"".to_string());
        format!("window.{}={};", self.global_name, literal)
    }
}

/// `GET /config.js`
pub async fn config_script(State(state): State<AppState>) -> Response {
    no_cache((
        [(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE))],
        state.config_script.render(),
    ))
}
