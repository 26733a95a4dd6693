//! Event API handlers.
//!
//! ```text
//! POST /api/v1/events                   Create an event
//! GET  /api/v1/events                   List events (filtered, ranked)
//! GET  /api/v1/events/{id}              Fetch one event
//! PUT  /api/v1/events/{id}              Update an event (host only)
//! GET  /api/v1/events/{id}/attendees    Roster (host only)
//! GET  /api/v1/events/{id}/analytics    Analytics (host only)
//! ```

use actix_web::{HttpRequest, HttpResponse, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::{EventDraft, EventFilter, EventId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::identity::{optional_caller, require_caller};
use crate::inbound::http::state::HttpState;

/// Event attributes accepted on create and update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraftRequest {
    /// Display title.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Venue label.
    pub venue: String,
    /// Category label.
    pub category: String,
    /// Scheduled start instant.
    pub event_date: DateTime<Utc>,
    /// Scheduled end instant; omitted means start plus two hours.
    #[serde(default)]
    pub event_end_time: Option<DateTime<Utc>>,
    /// Registration cut-off.
    pub registration_deadline: DateTime<Utc>,
    /// Seat capacity.
    pub max_participants: u32,
    /// Optional reminder lead time in hours.
    #[serde(default)]
    pub reminder_lead_hours: Option<u32>,
}

impl From<EventDraftRequest> for EventDraft {
    fn from(request: EventDraftRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            venue: request.venue,
            category: request.category,
            event_date: request.event_date,
            event_end_time: request.event_end_time,
            registration_deadline: request.registration_deadline,
            max_participants: request.max_participants,
            reminder_lead_hours: request.reminder_lead_hours,
        }
    }
}

/// Create an event owned by the caller.
#[post("/events")]
pub async fn create_event(
    state: web::Data<HttpState>,
    request: HttpRequest,
    payload: web::Json<EventDraftRequest>,
) -> ApiResult<HttpResponse> {
    let host = require_caller(&request)?;
    let view = state
        .catalog
        .create_event(host, payload.into_inner().into())
        .await?;
    Ok(HttpResponse::Created().json(view))
}

/// List events for the caller, filtered and ranked.
#[get("/events")]
pub async fn list_events(
    state: web::Data<HttpState>,
    request: HttpRequest,
    filter: web::Query<EventFilter>,
) -> ApiResult<HttpResponse> {
    let caller = optional_caller(&request)?;
    let views = state.listing.list_events(&filter, caller).await?;
    Ok(HttpResponse::Ok().json(views))
}

/// Fetch one event with derived figures.
#[get("/events/{id}")]
pub async fn get_event(
    state: web::Data<HttpState>,
    request: HttpRequest,
    path: web::Path<EventId>,
) -> ApiResult<HttpResponse> {
    let caller = optional_caller(&request)?;
    let view = state.catalog.get_event(path.into_inner(), caller).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// Update an event's details.
#[put("/events/{id}")]
pub async fn update_event(
    state: web::Data<HttpState>,
    request: HttpRequest,
    path: web::Path<EventId>,
    payload: web::Json<EventDraftRequest>,
) -> ApiResult<HttpResponse> {
    let host = require_caller(&request)?;
    let view = state
        .catalog
        .update_event(path.into_inner(), host, payload.into_inner().into())
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

/// Roster for the caller's event, newest registration first.
#[get("/events/{id}/attendees")]
pub async fn list_attendees(
    state: web::Data<HttpState>,
    request: HttpRequest,
    path: web::Path<EventId>,
) -> ApiResult<HttpResponse> {
    let host = require_caller(&request)?;
    let roster = state
        .catalog
        .list_attendees(path.into_inner(), host)
        .await?;
    Ok(HttpResponse::Ok().json(roster))
}

/// Analytics for the caller's event.
#[get("/events/{id}/analytics")]
pub async fn get_analytics(
    state: web::Data<HttpState>,
    request: HttpRequest,
    path: web::Path<EventId>,
) -> ApiResult<HttpResponse> {
    let host = require_caller(&request)?;
    let analytics = state
        .catalog
        .get_analytics(path.into_inner(), host)
        .await?;
    Ok(HttpResponse::Ok().json(analytics))
}
