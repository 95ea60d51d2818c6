pub mod chat;
pub mod response;
pub mod role_reply;
pub mod state;

use axum::Json;
use serde::Serialize;

pub use response::ApiError;

#[derive(Serialize)]
pub struct Health {
    status: &'static str,
}

// GET /api/health
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}
