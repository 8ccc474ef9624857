use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod cookies;
mod health;
mod switches;

pub use health::health;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    let switch_router = Router::new()
        .route(
            "/",
            post(switches::routes::create).get(switches::routes::list),
        )
        .route("/{name}", get(switches::routes::get))
        .route("/{name}/toggle", post(switches::routes::toggle))
        .route("/{name}/attributes", put(switches::routes::configure))
        .route("/{name}/type", put(switches::routes::change_type))
        .route("/{name}/evaluate", get(switches::routes::evaluate));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/switches", switch_router)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn root() -> &'static str {
    "Feature switch service"
}
