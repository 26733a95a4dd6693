//! Registration API handlers.
//!
//! ```text
//! POST   /api/v1/events/{id}/registrations   Register the caller
//! DELETE /api/v1/events/{id}/registrations   Cancel the caller's registration
//! POST   /api/v1/events/{id}/promotions      Promote the next waitlist entry
//! ```

use actix_web::{HttpRequest, HttpResponse, delete, post, web};

use crate::domain::EventId;
use crate::inbound::http::ApiResult;
use crate::inbound::http::identity::require_caller;
use crate::inbound::http::state::HttpState;

/// Register the caller, assigning a seat or a waitlist slot.
#[post("/events/{id}/registrations")]
pub async fn register(
    state: web::Data<HttpState>,
    request: HttpRequest,
    path: web::Path<EventId>,
) -> ApiResult<HttpResponse> {
    let user = require_caller(&request)?;
    let view = state.enrollment.register(path.into_inner(), user).await?;
    Ok(HttpResponse::Created().json(view))
}

/// Cancel the caller's registration, promoting from the waitlist when a
/// confirmed seat is freed.
#[delete("/events/{id}/registrations")]
pub async fn cancel(
    state: web::Data<HttpState>,
    request: HttpRequest,
    path: web::Path<EventId>,
) -> ApiResult<HttpResponse> {
    let user = require_caller(&request)?;
    state.enrollment.cancel(path.into_inner(), user).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Promote the longest-waiting entrant if a seat is free.
#[post("/events/{id}/promotions")]
pub async fn promote(
    state: web::Data<HttpState>,
    path: web::Path<EventId>,
) -> ApiResult<HttpResponse> {
    state
        .enrollment
        .promote_from_waitlist(path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
