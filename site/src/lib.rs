use std::sync::Arc;

use axum::{middleware::from_fn_with_state, Router};
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

mod config;
mod middleware;

pub use config::{AvatarStyle, Link, RedirectRule, ServerConfig, Site, SiteConfig};
pub use middleware::{redirect_legacy_paths, tag_pageviews, Analytics, Redirects};

/// Hands the site configuration and the middleware stack to axum. Everything
/// past this point (routing, file serving, the HTTP machinery itself) is the
/// framework's business.
pub fn app(config: &SiteConfig, analytics: Option<Analytics>) -> Router {
    let root = &config.server.root;
    let notfound = format!("{root}/notfound.html");
    let mut app = Router::new()
        .fallback_service(ServeDir::new(root).not_found_service(ServeFile::new(notfound)))
        .layer(from_fn_with_state(
            Arc::new(Redirects::new(&config.redirects)),
            redirect_legacy_paths,
        ));
    if let Some(analytics) = analytics {
        app = app.layer(from_fn_with_state(Arc::new(analytics), tag_pageviews));
    }
    app.layer(TraceLayer::new_for_http())
}
