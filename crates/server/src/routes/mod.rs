pub mod activity;
pub mod clients;
pub mod dashboard;
pub mod documents;
pub mod health;
pub mod milestones;
pub mod templates;
pub mod tenders;

use axum::Router;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::app::AppState;

/// Assemble the full application router: the JSON API under /api and the
/// stored objects under /files.
pub fn router(app: AppState) -> Router {
    let api = Router::new()
        .merge(health::router())
        .merge(tenders::router())
        .merge(milestones::router())
        .merge(clients::router())
        .merge(documents::router())
        .merge(dashboard::router())
        .merge(activity::router())
        .merge(templates::router());

    Router::new()
        .nest("/api", api)
        .nest_service("/files", ServeDir::new(app.storage().root()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app)
}
