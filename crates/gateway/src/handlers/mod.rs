//! API handlers module

pub mod health;
pub mod papers;
pub mod review;
pub mod search;
pub mod users;

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct WelcomeResponse {
    pub message: &'static str,
}

/// Service banner
pub async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the AI Academic Research Assistant API",
    })
}
