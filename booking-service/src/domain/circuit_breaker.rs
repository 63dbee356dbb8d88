use std::time::{Duration, Instant};

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed { consecutive_failures: u32 },
    Open { opened_at: Instant },
    /// One trial call is let through; its outcome decides the next state.
    HalfOpen,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub cooldown_secs: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown_secs: 30,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

/// Guards calls to a flaky dependency so repeated failures are skipped fast.
pub struct CircuitBreaker {
    state: CircuitState,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            state: CircuitState::Closed {
                consecutive_failures: 0,
            },
            config,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, CircuitState::Open { .. })
    }

    /// Whether a call may go through now. Moves Open to HalfOpen once the cooldown ran out.
    pub fn allow_request(&mut self) -> bool {
        match self.state {
            CircuitState::Closed { .. } | CircuitState::HalfOpen => true,
            CircuitState::Open { opened_at } if opened_at.elapsed() >= self.config.cooldown() => {
                tracing::info!("Calendar circuit half-open, sending trial request");
                self.state = CircuitState::HalfOpen;
                true
            }
            CircuitState::Open { .. } => false,
        }
    }

    pub fn on_success(&mut self) {
        if !matches!(self.state, CircuitState::Closed { .. }) {
            tracing::info!(previous_state = ?self.state, "Calendar circuit closed");
        }
        self.state = CircuitState::Closed {
            consecutive_failures: 0,
        };
    }

    pub fn on_failure(&mut self) {
        self.state = match self.state {
            CircuitState::Closed {
                consecutive_failures,
            } => {
                let failures = consecutive_failures + 1;
                if failures >= self.config.failure_threshold {
                    tracing::warn!(failures, "Calendar circuit opened");
                    CircuitState::Open {
                        opened_at: Instant::now(),
                    }
                } else {
                    CircuitState::Closed {
                        consecutive_failures: failures,
                    }
                }
            }
            CircuitState::HalfOpen => {
                tracing::warn!("Calendar trial request failed, circuit reopened");
                CircuitState::Open {
                    opened_at: Instant::now(),
                }
            }
            open @ CircuitState::Open { .. } => open,
        };
    }
}
