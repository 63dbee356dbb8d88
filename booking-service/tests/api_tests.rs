use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use booking_service::{
    api::{self, state::BookingAppState},
    domain::{
        booking::{MockBookingStore, NewBooking},
        calendar::MockCalendarBusyProvider,
        config::BookingConfig,
        contact::MockContactResolver,
        events::MockBookingEventSink,
        service::{BookingPorts, BookingService},
        settings::MockConfigurationStore,
    },
    error::BookingServiceError,
};
use shared::{
    time::FixedClock,
    types::{AvailabilitySettings, Booking, BookingStatus, EventType},
};

fn utc(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

/// Settings record as the dashboard stores it.
fn settings() -> AvailabilitySettings {
    let hours = json!({
        "enabled": true,
        "startTime": "09:00",
        "endTime": "17:00",
        "breaks": [{ "start": "12:00", "end": "13:00" }]
    });
    serde_json::from_value(json!({
        "timezone": "America/New_York",
        "autoConfirm": true,
        "weeklySchedule": {
            "monday": hours,
            "tuesday": hours,
            "wednesday": hours,
            "thursday": hours,
            "friday": hours,
            "saturday": { "enabled": false, "startTime": "09:00", "endTime": "17:00" }
        },
        "individualOverrides": { "2024-06-10-14": false }
    }))
    .unwrap()
}

fn stored(new: NewBooking) -> Booking {
    Booking {
        id: Uuid::new_v4(),
        workspace_id: new.workspace_id,
        event_type_id: new.event_type_id,
        service_provider_id: new.service_provider_id,
        department_id: new.department_id,
        contact_id: None,
        invitee_name: new.invitee_name,
        invitee_email: new.invitee_email,
        invitee_phone: new.invitee_phone,
        notes: new.notes,
        start_at: new.start_at,
        end_at: new.end_at,
        status: new.status,
        created_at: utc("2024-06-01T00:00:00Z"),
    }
}

struct Ports {
    settings: MockConfigurationStore,
    bookings: MockBookingStore,
    calendar: MockCalendarBusyProvider,
    contacts: MockContactResolver,
    events: MockBookingEventSink,
}

impl Ports {
    fn reading(existing: Vec<Booking>) -> Self {
        let mut settings = MockConfigurationStore::new();
        settings
            .expect_get_availability_settings()
            .returning(|_| Ok(Some(self::settings())));
        settings.expect_get_event_type().returning(|ws, id| {
            Ok(Some(EventType {
                id,
                workspace_id: ws,
                name: "Intro call".into(),
                duration_minutes: Some(30),
            }))
        });

        let mut bookings = MockBookingStore::new();
        bookings
            .expect_list_bookings_for_range()
            .returning(move |_, _, _, _| Ok(existing.clone()));

        let mut calendar = MockCalendarBusyProvider::new();
        calendar
            .expect_get_busy_slots()
            .returning(|_, _, _| Ok(vec![]));

        Self {
            settings,
            bookings,
            calendar,
            contacts: MockContactResolver::new(),
            events: MockBookingEventSink::new(),
        }
    }

    fn accepting(mut self) -> Self {
        self.bookings
            .expect_insert()
            .returning(|new| Ok(stored(new)));
        self.bookings
            .expect_link_contact()
            .returning(|_, _| Ok(()));
        self.contacts
            .expect_find_or_create()
            .returning(|_, _| Ok(Uuid::new_v4()));
        self.events.expect_booking_accepted().returning(|_| Ok(()));
        self
    }

    fn into_app(self) -> Router {
        let svc = BookingService::new(
            BookingPorts {
                settings: Arc::new(self.settings),
                bookings: Arc::new(self.bookings),
                calendar: Arc::new(self.calendar),
                contacts: Arc::new(self.contacts),
                events: Arc::new(self.events),
            },
            BookingConfig::default(),
        )
        .with_clock(Arc::new(FixedClock(utc("2024-06-01T00:00:00Z"))));
        let state = Arc::new(BookingAppState {
            booking_service: Arc::new(svc),
        });

        api::dashboard_routes()
            .merge(api::embed_routes())
            .with_state(state)
    }
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn bookings_uri(ws: Uuid) -> String {
    format!("/api/v1/workspaces/{ws}/bookings")
}

#[tokio::test]
async fn create_booking_returns_201() {
    let app = Ports::reading(vec![]).accepting().into_app();

    // Monday 10:00-10:30 New York
    let body = json!({
        "start_at": "2024-06-10T14:00:00Z",
        "end_at": "2024-06-10T14:30:00Z",
        "invitee_name": "Ada Lovelace",
        "invitee_email": "ada@example.com"
    });
    let response = app
        .oneshot(post_json(&bookings_uri(Uuid::new_v4()), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = read_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["status"], "CONFIRMED");
    assert_eq!(json["data"]["start_at"], "2024-06-10T14:00:00Z");
}

#[tokio::test]
async fn embed_booking_takes_event_duration() {
    let app = Ports::reading(vec![]).accepting().into_app();

    let body = json!({
        "event_type_id": Uuid::new_v4(),
        "start_at": "2024-06-11T13:00:00Z",
        "invitee_name": "Grace Hopper",
        "client_timezone": "Europe/Paris"
    });
    let response = app
        .oneshot(post_json(
            &format!("/api/v1/embed/{}/bookings", Uuid::new_v4()),
            body,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = read_json(response).await;
    // 13:00 UTC is 15:00 in Paris, inside the same weekday hours
    assert_eq!(json["data"]["end_at"], "2024-06-11T13:30:00Z");
}

#[tokio::test]
async fn closed_day_returns_422_with_reason() {
    let app = Ports::reading(vec![]).into_app();

    // Saturday
    let body = json!({
        "start_at": "2024-06-15T14:00:00Z",
        "end_at": "2024-06-15T14:30:00Z",
        "invitee_name": "Ada"
    });
    let response = app
        .oneshot(post_json(&bookings_uri(Uuid::new_v4()), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = read_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error_code"], "DAY_DISABLED");
    assert!(json.get("retryable").is_none());
}

#[tokio::test]
async fn blocked_hour_returns_422() {
    let app = Ports::reading(vec![]).into_app();

    // 14:15 New York, hour 14 is switched off for this date
    let body = json!({
        "start_at": "2024-06-10T18:15:00Z",
        "end_at": "2024-06-10T18:45:00Z",
        "invitee_name": "Ada"
    });
    let response = app
        .oneshot(post_json(&bookings_uri(Uuid::new_v4()), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        read_json(response).await["error_code"],
        "INDIVIDUAL_OVERRIDE_DENIED"
    );
}

#[tokio::test]
async fn malformed_body_returns_400() {
    let app = Ports::reading(vec![]).into_app();

    let request = Request::builder()
        .method("POST")
        .uri(bookings_uri(Uuid::new_v4()))
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error_code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn missing_name_returns_400() {
    let app = Ports::reading(vec![]).into_app();

    let body = json!({ "start_at": "2024-06-10T14:00:00Z", "invitee_name": "  " });
    let response = app
        .oneshot(post_json(&bookings_uri(Uuid::new_v4()), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn overlapping_booking_returns_409() {
    let provider = Uuid::new_v4();
    let existing = stored(NewBooking {
        workspace_id: Uuid::nil(),
        event_type_id: None,
        service_provider_id: Some(provider),
        department_id: None,
        invitee_name: "Existing".into(),
        invitee_email: None,
        invitee_phone: None,
        notes: None,
        start_at: utc("2024-06-10T14:00:00Z"),
        end_at: Some(utc("2024-06-10T15:00:00Z")),
        status: BookingStatus::Confirmed,
    });
    let app = Ports::reading(vec![existing]).into_app();

    let body = json!({
        "service_provider_id": provider,
        "start_at": "2024-06-10T14:30:00Z",
        "end_at": "2024-06-10T15:00:00Z",
        "invitee_name": "Ada"
    });
    let response = app
        .oneshot(post_json(&bookings_uri(Uuid::new_v4()), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(read_json(response).await["error_code"], "BOOKING_CONFLICT");
}

#[tokio::test]
async fn store_failure_returns_503_retryable() {
    let mut ports = Ports::reading(vec![]);
    ports.bookings = MockBookingStore::new();
    ports
        .bookings
        .expect_list_bookings_for_range()
        .returning(|_, _, _, _| Err(BookingServiceError::Timeout("existing bookings")));
    let app = ports.into_app();

    let body = json!({
        "start_at": "2024-06-10T14:00:00Z",
        "end_at": "2024-06-10T14:30:00Z",
        "invitee_name": "Ada"
    });
    let response = app
        .oneshot(post_json(&bookings_uri(Uuid::new_v4()), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = read_json(response).await;
    assert_eq!(json["error_code"], "STORE_ERROR");
    assert_eq!(json["retryable"], true);
}

#[tokio::test]
async fn evaluate_returns_200_without_insert() {
    // no insert expectation: a write would panic the mock
    let app = Ports::reading(vec![]).into_app();

    let body = json!({
        "start_at": "2024-06-10T14:00:00Z",
        "end_at": "2024-06-10T14:30:00Z",
        "invitee_name": "Ada",
        "client_timezone": "Not/AZone"
    });
    let response = app
        .oneshot(post_json(
            &format!("/api/v1/workspaces/{}/bookings/evaluate", Uuid::new_v4()),
            body,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["data"]["status"], "CONFIRMED");
    assert_eq!(json["data"]["timezone"], "America/New_York");
}

#[tokio::test]
async fn slots_lists_the_local_day() {
    let app = Ports::reading(vec![]).into_app();

    let request = Request::builder()
        .uri(format!(
            "/api/v1/workspaces/{}/slots?date=2024-06-10",
            Uuid::new_v4()
        ))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["data"]["timezone"], "America/New_York");
    assert_eq!(json["data"]["duration_minutes"], 30);

    let slots = json["data"]["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 48);
    let available: Vec<&str> = slots
        .iter()
        .filter(|s| s["available"] == true)
        .map(|s| s["local_time"].as_str().unwrap())
        .collect();
    assert_eq!(
        available,
        [
            "09:00", "09:30", "10:00", "10:30", "11:00", "11:30", "13:00", "13:30", "15:00",
            "15:30", "16:00", "16:30"
        ]
    );
}

#[tokio::test]
async fn slots_rejects_bad_date() {
    let app = Ports::reading(vec![]).into_app();

    let request = Request::builder()
        .uri(format!(
            "/api/v1/workspaces/{}/slots?date=10-06-2024",
            Uuid::new_v4()
        ))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error_code"], "VALIDATION_ERROR");
}
