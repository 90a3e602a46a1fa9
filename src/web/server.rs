use axum::{routing::get, routing::post, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::navigation::Navigator;
use crate::position::ChannelPositionSource;
use crate::routing::DirectRouter;

use super::api::navigation as navigation_handlers;
use super::api::position as position_handlers;
use super::api_doc::ApiDoc;
use super::auth::AppState;
use super::config::Config;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Navigation API endpoints
        .route("/api/navigation/start", post(navigation_handlers::start))
        .route("/api/navigation/stop", post(navigation_handlers::stop))
        .route(
            "/api/navigation/destination",
            post(navigation_handlers::set_destination)
                .delete(navigation_handlers::clear_destination),
        )
        .route("/api/navigation/status", get(navigation_handlers::status))
        .route("/api/navigation/events", get(navigation_handlers::events))
        // Device reports
        .route("/api/position", post(position_handlers::report))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind_addr = config.web.bind.clone();
    if config.api_keys.is_empty() {
        log::warn!("no API keys configured, every request will be rejected");
    }

    let source = Arc::new(ChannelPositionSource::new());
    let directions = Arc::new(DirectRouter::new(config.routing));
    let navigator = Navigator::spawn(directions, source.clone(), config.navigation);

    let state = AppState {
        config: Arc::new(config),
        navigator: Arc::new(navigator),
        source,
    };

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, router(state)).await
}
