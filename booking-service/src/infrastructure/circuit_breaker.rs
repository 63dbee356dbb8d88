use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::types::ExternalBusyPeriod;
use uuid::Uuid;

use crate::domain::calendar::{CalendarBusyProvider, CalendarError};
use crate::domain::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};

/// Wraps a [`CalendarBusyProvider`] so a dead calendar service is skipped without waiting.
///
/// A lookup dropped before it answered (the caller's deadline ran out) counts as a failure,
/// so a hanging service opens the circuit like a refusing one.
pub struct CircuitBreakerCalendar {
    inner: Arc<dyn CalendarBusyProvider>,
    breaker: Mutex<CircuitBreaker>,
}

impl CircuitBreakerCalendar {
    pub fn new(inner: Arc<dyn CalendarBusyProvider>, config: CircuitBreakerConfig) -> Self {
        Self {
            inner,
            breaker: Mutex::new(CircuitBreaker::new(config)),
        }
    }

    pub fn is_open(&self) -> bool {
        self.breaker().is_open()
    }

    fn breaker(&self) -> MutexGuard<'_, CircuitBreaker> {
        self.breaker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Armed while the inner lookup is pending.
struct InFlight<'a> {
    calendar: &'a CircuitBreakerCalendar,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut breaker = self.calendar.breaker();
            breaker.on_failure();
            tracing::warn!(circuit_state = ?breaker.state(), "Calendar lookup abandoned before answering");
        }
    }
}

#[async_trait]
impl CalendarBusyProvider for CircuitBreakerCalendar {
    #[tracing::instrument(skip(self))]
    async fn get_busy_slots(
        &self,
        workspace_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ExternalBusyPeriod>, CalendarError> {
        let allowed = self.breaker().allow_request();
        if !allowed {
            tracing::debug!("Calendar circuit open, skipping lookup");
            return Err(CalendarError::CircuitOpen);
        }

        let mut in_flight = InFlight {
            calendar: self,
            armed: true,
        };
        let result = self.inner.get_busy_slots(workspace_id, start, end).await;
        in_flight.armed = false;

        let mut breaker = self.breaker();
        match &result {
            Ok(_) => breaker.on_success(),
            // a bad payload still means the service answered
            Err(CalendarError::InvalidResponse(_)) => breaker.on_success(),
            Err(_) => {
                breaker.on_failure();
                tracing::warn!(circuit_state = ?breaker.state(), "Calendar lookup failed");
            }
        }
        result
    }
}
