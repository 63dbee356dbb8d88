use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opentelemetry::global;
use opentelemetry::propagation::Injector;
use reqwest::{Client, StatusCode, header};
use shared::{responses::ApiResponse, types::ExternalBusyPeriod};
use tracing_opentelemetry::OpenTelemetrySpanExt;
use uuid::Uuid;

use crate::domain::calendar::{CalendarBusyProvider, CalendarError};

/// HTTP client for the calendar-sync service, with retries and trace propagation.
pub struct HttpCalendarClient {
    client: Client,
    base_url: String,
}

/// Attempts per lookup, transport errors and 5xx only.
const MAX_ATTEMPTS: u32 = 2;
/// Per-request timeout. The service applies its own, shorter, overall deadline.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

impl HttpCalendarClient {
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (invalid TLS configuration).
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }
}

struct HeaderMapInjector<'a>(&'a mut header::HeaderMap);

impl Injector for HeaderMapInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if let Ok(name) = header::HeaderName::from_bytes(key.as_bytes())
            && let Ok(val) = header::HeaderValue::from_str(&value)
        {
            self.0.insert(name, val);
        }
    }
}

fn trace_headers() -> header::HeaderMap {
    let mut headers = header::HeaderMap::new();
    let cx = tracing::Span::current().context();
    global::get_text_map_propagator(|propagator| {
        propagator.inject_context(&cx, &mut HeaderMapInjector(&mut headers));
    });
    headers
}

#[async_trait]
impl CalendarBusyProvider for HttpCalendarClient {
    #[tracing::instrument(skip(self))]
    async fn get_busy_slots(
        &self,
        workspace_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ExternalBusyPeriod>, CalendarError> {
        let base_url = &self.base_url;
        let url = format!("{base_url}/api/v1/workspaces/{workspace_id}/busy");
        let query = [("start", start.to_rfc3339()), ("end", end.to_rfc3339())];

        let mut last_err = String::new();
        for attempt in 1..=MAX_ATTEMPTS {
            let sent = self
                .client
                .get(&url)
                .headers(trace_headers())
                .query(&query)
                .send()
                .await;

            match sent {
                Ok(res) if res.status().is_server_error() => {
                    last_err = format!("calendar service returned {}", res.status());
                }
                Ok(res) if res.status() == StatusCode::NOT_FOUND => {
                    tracing::debug!("No calendar connected for workspace");
                    return Ok(Vec::new());
                }
                Ok(res) if !res.status().is_success() => {
                    return Err(CalendarError::InvalidResponse(format!(
                        "calendar service returned {}",
                        res.status()
                    )));
                }
                Ok(res) => {
                    let body = res
                        .json::<ApiResponse<Vec<ExternalBusyPeriod>>>()
                        .await
                        .map_err(|e| CalendarError::InvalidResponse(e.to_string()))?;
                    return Ok(body.data.unwrap_or_default());
                }
                Err(e) => last_err = e.to_string(),
            }

            tracing::warn!(attempt, max_attempts = MAX_ATTEMPTS, error = %last_err, "Calendar lookup failed");
            if attempt < MAX_ATTEMPTS {
                tokio::time::sleep(Duration::from_millis(100 * 2u64.pow(attempt - 1))).await;
            }
        }

        Err(CalendarError::Unavailable(format!(
            "no answer after {MAX_ATTEMPTS} attempts: {last_err}"
        )))
    }
}

/// Used when no calendar service is configured; nothing is ever busy.
pub struct DisabledCalendar;

#[async_trait]
impl CalendarBusyProvider for DisabledCalendar {
    async fn get_busy_slots(
        &self,
        _workspace_id: Uuid,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<ExternalBusyPeriod>, CalendarError> {
        Ok(Vec::new())
    }
}
