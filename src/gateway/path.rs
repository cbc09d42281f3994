//! Upstream URL construction.

use axum::http::Uri;
use url::Url;

use crate::routing::ProxyRule;

/// Path as the upstream should see it, before the target's base path.
pub fn transform_path<'a>(rule: &ProxyRule, path: &'a str) -> &'a str {
    if !rule.strip_prefix {
        return path;
    }
    match path.strip_prefix(rule.prefix.as_str()) {
        Some("") => "/",
        Some(rest) => rest,
        None => path,
    }
}

/// `<target base path><transformed path>?<query>`
///
/// Existing escapes are kept byte for byte; `%2F` stays `%2F`. `Url`
/// applies the WHATWG encode sets to the rest, which the inbound `Uri`
/// lets through in three places: `"`, `{` and `}` and raw non-ASCII in
/// the path become `%22`, `%7B`, `%7D` and UTF-8 escapes, and `'` in the
/// query becomes `%27`. A backslash never gets here; the gateway rejects
/// it with 400 first.
pub fn upstream_url(rule: &ProxyRule, uri: &Uri) -> Url {
    let forwarded = transform_path(rule, uri.path());
    let mut url = rule.target.clone();
    let full = format!("{}{}", url.path().trim_end_matches('/'), forwarded);
    url.set_path(&full);
    url.set_query(uri.query());
    url
}
