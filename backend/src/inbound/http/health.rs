//! Liveness endpoint.

use actix_web::{HttpResponse, get};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
struct Health {
    status: &'static str,
}

/// Report process liveness.
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(Health { status: "ok" })
}
