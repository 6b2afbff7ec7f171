use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{self, SharedState};

/// Create the main application router with all API endpoints
pub fn create_router(state: SharedState) -> Router {
    // Create CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Derived data
        .route("/api/resumo", get(handlers::get_resumo))
        .route("/api/alertas", get(handlers::get_alertas))
        // Income entries
        .route(
            "/api/entradas",
            get(handlers::list_entradas).post(handlers::create_entrada),
        )
        .route(
            "/api/entradas/:id",
            put(handlers::update_entrada).delete(handlers::delete_entrada),
        )
        // Expense categories
        .route(
            "/api/saidas",
            get(handlers::list_saidas).post(handlers::create_saida),
        )
        .route(
            "/api/saidas/:id",
            put(handlers::update_saida).delete(handlers::delete_saida),
        )
        // Investments
        .route(
            "/api/investimentos",
            get(handlers::list_investimentos).post(handlers::create_investimento),
        )
        .route(
            "/api/investimentos/:id",
            put(handlers::update_investimento).delete(handlers::delete_investimento),
        )
        // Income goal
        .route("/api/meta", get(handlers::get_meta).put(handlers::set_meta))
        // Assistant
        .route("/api/assistente", post(handlers::ask_assistant))
        // Add shared state
        .with_state(state)
        // Add middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
