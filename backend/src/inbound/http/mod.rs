//! HTTP inbound adapter exposing REST endpoints.

pub mod error;
pub mod events;
pub mod health;
pub mod identity;
pub mod registrations;
pub mod state;
pub mod users;

pub use error::ApiResult;

use actix_web::web;

/// Register every route on an Actix application.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health).service(
        web::scope("/api/v1")
            .service(events::create_event)
            .service(events::list_events)
            .service(events::get_event)
            .service(events::update_event)
            .service(events::list_attendees)
            .service(events::get_analytics)
            .service(registrations::register)
            .service(registrations::cancel)
            .service(registrations::promote)
            .service(users::retire_user)
            .service(users::complete_expired),
    );
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
