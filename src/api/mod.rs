pub use error::{ApiError, Result};
pub use state::{create_app, App, AppEngine};

pub mod admin;
pub mod watch;

mod error;
mod state;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;

/// Maps the url table to handlers. Request logging is a boundary layer
/// here, keeping the handlers themselves quiet.
pub fn create_router(config: &Config, app: App) -> Router {
    Router::new()
        .route("/admin-login/", get(admin::login_page).post(admin::login))
        .route("/admin-logout/", get(admin::logout))
        .route("/admin-dashboard/", get(admin::dashboard))
        .route(
            "/admin-dashboard/upload/",
            get(admin::edit_page).post(admin::save),
        )
        .route(
            "/admin-dashboard/edit/:id/",
            get(admin::edit_page).post(admin::save),
        )
        .route(
            "/admin-dashboard/delete/:id/",
            post(admin::delete).fallback(admin::method_not_allowed),
        )
        .route("/watch/:filename/", get(watch::watch))
        .nest_service("/media", ServeDir::new(&config.media_root))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}
