pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod notes;
pub mod state;
pub mod store;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Build the HTTP application around an already-constructed state.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.api.max_request_size_bytes;
    let enable_cors = state.config.security.enable_cors;

    let mut router = Router::new()
        // Public
        .route("/api/health", get(handlers::health))
        // Protected
        .merge(note_routes(&state))
        .fallback(handlers::route_not_found)
        // Global middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router.with_state(state)
}

fn note_routes(state: &AppState) -> Router<AppState> {
    use handlers::notes;

    Router::new()
        .route("/api/notes", get(notes::list_notes).post(notes::create_note))
        .route(
            "/api/notes/:id",
            get(notes::get_note)
                .put(notes::update_note)
                .delete(notes::delete_note),
        )
        // route_layer so unknown paths fall through to the 404 fallback unauthenticated
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
}
