use axum::{Router, routing::get};
use booking_service::{
    api::{self, handler::booking, handler::slots, state::BookingAppState},
    domain::{
        booking::{BookingAccepted, BookingEvaluation, BookingRequest},
        calendar::CalendarBusyProvider,
        config::BookingConfig,
        service::{BookingPorts, BookingService},
        slots::{DaySlots, SlotView},
    },
    infrastructure::{
        booking::PgBookingStore,
        calendar::{DisabledCalendar, HttpCalendarClient},
        circuit_breaker::CircuitBreakerCalendar,
        contact::PgContactResolver,
        events::PgBookingEventSink,
        settings::PgConfigurationStore,
    },
};
use shared::telemetry::{TelemetrySettings, init_telemetry};
use sqlx::postgres::PgPoolOptions;
use std::{env, net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        booking::create_booking,
        booking::create_embed_booking,
        booking::evaluate_booking,
        slots::list_slots,
    ),
    components(schemas(BookingRequest, BookingAccepted, BookingEvaluation, DaySlots, SlotView)),
    tags(
        (name = "Bookings", description = "Dashboard booking requests"),
        (name = "Embed", description = "Public widget booking requests"),
        (name = "Slots", description = "Bookable slots of a day"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    let _guard = init_telemetry("booking-service", &TelemetrySettings::from_env());

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let port = env::var("SERVER_PORT").unwrap_or_else(|_| "8082".to_string());
    let config_path =
        env::var("BOOKING_CONFIG_PATH").unwrap_or_else(|_| "booking.toml".to_string());
    let config = BookingConfig::load(&config_path).expect("Failed to load booking config");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .expect("Failed to establish connection into Postgres");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    let calendar: Arc<dyn CalendarBusyProvider> = match env::var("CALENDAR_SERVICE_URL") {
        Ok(url) if !url.trim().is_empty() => {
            tracing::info!(%url, "Calendar busy checks enabled");
            Arc::new(CircuitBreakerCalendar::new(
                Arc::new(HttpCalendarClient::new(url)),
                config.circuit_breaker.clone(),
            ))
        }
        _ => {
            tracing::info!("CALENDAR_SERVICE_URL not set, calendar busy checks disabled");
            Arc::new(DisabledCalendar)
        }
    };

    let ports = BookingPorts {
        settings: Arc::new(PgConfigurationStore::new(pool.clone())),
        bookings: Arc::new(PgBookingStore::new(pool.clone())),
        calendar,
        contacts: Arc::new(PgContactResolver::new(pool.clone())),
        events: Arc::new(PgBookingEventSink::new(pool.clone())),
    };
    let rate_limit = config.embed_rate_limit.clone();
    let booking_service = Arc::new(BookingService::new(ports, config));

    let state = Arc::new(BookingAppState {
        booking_service: booking_service.clone(),
    });

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(rate_limit.per_second)
        .burst_size(rate_limit.burst_size)
        .key_extractor(SmartIpKeyExtractor)
        .use_headers()
        .finish()
        .expect("Failed to build governor config");

    let app = Router::new()
        .route(
            "/headpat",
            get(|| async {
                axum::Json(shared::responses::HeadpatResponse {
                    message: "nyaa~! bookings are open, senpai! (=^-w-^=)",
                })
            }),
        )
        .merge(api::dashboard_routes())
        // Public widget traffic is limited per client IP
        .merge(api::embed_routes().layer(GovernorLayer::new(governor_conf)))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(tower_http::LatencyUnit::Millis),
                ),
        )
        .with_state(state);

    tracing::info!("booking-service listening on 0.0.0.0:{port}");

    let listener = TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("Failed to bind");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shared::shutdown::shutdown_signal())
    .await
    .expect("Oppsie! Server crashed!");

    shared::shutdown::drain_background_tasks(
        booking_service.task_tracker(),
        shared::shutdown::DEFAULT_SHUTDOWN_TIMEOUT,
    )
    .await;
    tracing::info!("booking-service shut down");
}
