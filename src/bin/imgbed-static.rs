use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use imgbed::config::AppConfig;

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env();

    tracing_subscriber::fmt()
        .with_max_level(if config.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(health))
        .nest_service(
            &format!("/{}", config.path_prefix),
            ServeDir::new(config.upload_dir()),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = config.static_socket_addr();
    tracing::info!(
        "Static file server running on {}, serving {}",
        addr,
        config.upload_dir().display()
    );

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "imgbed static file server" }))
}
