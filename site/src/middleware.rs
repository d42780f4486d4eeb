use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::BodyExt;

use crate::config::RedirectRule;

/// Immutable legacy-path lookup table, built once at startup.
pub struct Redirects {
    targets: HashMap<String, String>,
}

impl Redirects {
    pub fn new(rules: &[RedirectRule]) -> Self {
        let mut targets = HashMap::new();
        for rule in rules {
            let to = if rule.to.starts_with('/') || rule.to.contains("://") {
                rule.to.clone()
            } else {
                format!("/{}", rule.to)
            };
            targets.insert(rule.from.clone(), to);
        }
        Self { targets }
    }

    // Exact, case-sensitive match on the path component; the query string
    // never reaches the lookup. Only the leading slash of the request path
    // is dropped so table keys read like the paths in site.toml; trailing
    // slashes and case make a miss.
    pub fn location(&self, path: &str) -> Option<&str> {
        let key = path.strip_prefix('/').unwrap_or(path);
        self.targets.get(key).map(String::as_str)
    }
}

pub async fn redirect_legacy_paths(
    State(redirects): State<Arc<Redirects>>,
    req: Request,
    next: Next,
) -> Response {
    let Some(location) = redirects.location(req.uri().path()) else {
        return next.run(req).await;
    };
    tracing::debug!(path = %req.uri().path(), %location, "redirecting legacy path");
    (
        StatusCode::PERMANENT_REDIRECT,
        [(header::LOCATION, location.to_string())],
    )
        .into_response()
}

/// Pageview tagging for Google Analytics, keyed by tracking ID.
pub struct Analytics {
    tracking_id: String,
}

impl Analytics {
    pub fn new(tracking_id: impl Into<String>) -> Self {
        Self {
            tracking_id: tracking_id.into(),
        }
    }

    /// The tracking ID comes from `GA_TRACKING_ID` rather than the config
    /// file; `None` means tagging stays off.
    pub fn from_env() -> Option<Self> {
        env::var("GA_TRACKING_ID")
            .ok()
            .filter(|id| !id.is_empty())
            .map(Self::new)
    }

    fn snippet(&self) -> String {
        format!(
            concat!(
                r#"<script async src="https://www.googletagmanager.com/gtag/js?id={id}"></script>"#,
                "\n<script>window.dataLayer=window.dataLayer||[];",
                "function gtag(){{dataLayer.push(arguments);}}",
                "gtag('js',new Date());gtag('config','{id}');</script>\n"
            ),
            id = self.tracking_id
        )
    }
}

pub async fn tag_pageviews(
    State(analytics): State<Arc<Analytics>>,
    req: Request,
    next: Next,
) -> Response {
    // A HEAD response carries no body to splice into; leave it alone so
    // its headers keep describing the GET representation.
    let head = req.method() == Method::HEAD;
    let res = next.run(req).await;
    if head || res.status() != StatusCode::OK || !is_html(&res) {
        return res;
    }
    let (mut parts, body) = res.into_parts();
    let page = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            tracing::error!(%err, "failed to buffer page for analytics tagging");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let snippet = analytics.snippet();
    let mut tagged = Vec::with_capacity(page.len() + snippet.len());
    // Spliced on the raw bytes: a page that is not valid UTF-8 is re-served
    // byte for byte, not run through lossy replacement.
    match rfind(&page, b"</body>") {
        Some(at) => {
            tagged.extend_from_slice(&page[..at]);
            tagged.extend_from_slice(snippet.as_bytes());
            tagged.extend_from_slice(&page[at..]);
        }
        None => {
            tagged.extend_from_slice(&page);
            tagged.extend_from_slice(snippet.as_bytes());
        }
    }
    parts
        .headers
        .insert(header::CONTENT_LENGTH, HeaderValue::from(tagged.len()));
    Response::from_parts(parts, Body::from(tagged))
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|window| window == needle)
}

fn is_html(res: &Response) -> bool {
    res.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("text/html"))
}
