use axum::http::header::HeaderName;
use axum::http::Method;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::AppConfig;
use crate::games::backend_wheel_game::{create_wheel_game_router, WheelState};

mod config;
mod error;
mod games;
mod logging;

pub async fn health_check() -> impl IntoResponse {
    "OK"
}

fn build_app(state: WheelState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(state.config.allowed_origins.clone())
        .allow_methods(vec![Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(vec![HeaderName::from_static("content-type")]);

    Router::new()
        .route("/api/health_check", get(health_check))
        .nest("/wheel", create_wheel_game_router().with_state(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::from_path(".env").ok();
    logging::setup()?;

    let config = AppConfig::from_env()?;
    let addr = config.bind_addr;
    info!(
        "🎡 Wheel ready: {} layout, {} rotations over {:?}, {} angles",
        config.layout, config.rotation_count, config.spin_duration, config.angle_mode
    );

    let app = build_app(WheelState::new(config));

    info!("listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
