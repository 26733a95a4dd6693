//! Backend entry-point: wires adapters, services, sweeps, and the HTTP
//! server.

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use eventhub_backend::config::AppConfig;
use eventhub_backend::domain::ports::{
    EventRepository, NotificationSink, RatingSource, RegistrationRepository, UserDirectory,
};
use eventhub_backend::domain::{
    CompletionSweep, EnrollmentService, EventCatalogService, EventListingService,
    OffboardingService, ReminderSweep,
};
use eventhub_backend::inbound::http;
use eventhub_backend::inbound::http::state::HttpState;
use eventhub_backend::outbound::memory::{
    InMemoryEventRepository, InMemoryRegistrationRepository, InMemoryUserDirectory,
};
use eventhub_backend::outbound::notify::{NoRatings, TracingNotificationSink};
use eventhub_backend::scheduler::{Scheduler, SweepSleeper, TokioSleeper};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let config = AppConfig::load().map_err(std::io::Error::other)?;
    let schedule = config.schedule().map_err(std::io::Error::other)?;

    let events = Arc::new(InMemoryEventRepository::default()) as Arc<dyn EventRepository>;
    let registrations =
        Arc::new(InMemoryRegistrationRepository::default()) as Arc<dyn RegistrationRepository>;
    let users = Arc::new(InMemoryUserDirectory::default()) as Arc<dyn UserDirectory>;
    let notifier = Arc::new(TracingNotificationSink) as Arc<dyn NotificationSink>;
    let ratings = Arc::new(NoRatings) as Arc<dyn RatingSource>;
    let clock = Arc::new(DefaultClock) as Arc<dyn Clock>;

    let enrollment = Arc::new(EnrollmentService::new(
        Arc::clone(&events),
        Arc::clone(&registrations),
        Arc::clone(&users),
        Arc::clone(&notifier),
        Arc::clone(&clock),
    ));
    let catalog = Arc::new(EventCatalogService::new(
        Arc::clone(&events),
        Arc::clone(&registrations),
        Arc::clone(&users),
        Arc::clone(&ratings),
        Arc::clone(&notifier),
        Arc::clone(&clock),
    ));
    let listing = Arc::new(EventListingService::new(
        Arc::clone(&events),
        Arc::clone(&registrations),
        Arc::clone(&ratings),
        Arc::clone(&clock),
    ));
    let offboarding = Arc::new(OffboardingService::new(
        Arc::clone(&enrollment),
        Arc::clone(&catalog),
        Arc::clone(&registrations),
    ));

    let reminder = Arc::new(ReminderSweep::new(
        Arc::clone(&events),
        Arc::clone(&registrations),
        Arc::clone(&users),
        Arc::clone(&notifier),
        Arc::clone(&clock),
    ));
    let completion = Arc::new(CompletionSweep::new(Arc::clone(&catalog)));
    let scheduler = Scheduler::new(
        reminder,
        completion,
        Arc::new(TokioSleeper) as Arc<dyn SweepSleeper>,
        schedule,
    )
    .map_err(std::io::Error::other)?;
    let _handles = scheduler.spawn();

    let state = HttpState {
        enrollment,
        catalog,
        listing,
        offboarding,
    };

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(http::configure)
    })
    .bind(("0.0.0.0", config.port()))?
    .run()
    .await
}
