//! User lifecycle and maintenance handlers.
//!
//! ```text
//! DELETE /api/v1/users/{id}                    Retire an account
//! POST   /api/v1/maintenance/completed-events  Complete ended events now
//! ```

use actix_web::{HttpResponse, delete, post, web};
use serde::Serialize;

use crate::domain::UserId;
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Retire an account: free its seats, suspend and detach its events, purge
/// its rows.
#[delete("/users/{id}")]
pub async fn retire_user(
    state: web::Data<HttpState>,
    path: web::Path<UserId>,
) -> ApiResult<HttpResponse> {
    let report = state.offboarding.retire_user(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(report))
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionResponse {
    completed: usize,
}

/// Run the completion transition immediately instead of waiting for the
/// hourly sweep.
#[post("/maintenance/completed-events")]
pub async fn complete_expired(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let completed = state.catalog.mark_expired_completed().await?;
    Ok(HttpResponse::Ok().json(CompletionResponse { completed }))
}
