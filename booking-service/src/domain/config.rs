use std::path::Path;
use std::time::Duration;

use chrono_tz::Tz;
use serde::Deserialize;

use crate::domain::circuit_breaker::CircuitBreakerConfig;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    /// Zone used when neither the request nor the workspace names a valid one.
    pub default_timezone: String,
    /// Slot length for the slot list when the event type has no duration.
    pub default_slot_minutes: u32,
    pub store_timeout_ms: u64,
    pub calendar_timeout_ms: u64,
    /// Half-width of the window of existing bookings prefetched around a requested start.
    /// Longer bookings trigger a second read up to their end.
    pub booking_lookaround_hours: u32,
    pub circuit_breaker: CircuitBreakerConfig,
    pub embed_rate_limit: RateLimitConfig,
    pub side_effects: SideEffectConfig,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            default_timezone: "UTC".to_string(),
            default_slot_minutes: 30,
            store_timeout_ms: 2_000,
            calendar_timeout_ms: 1_500,
            booking_lookaround_hours: 24,
            circuit_breaker: CircuitBreakerConfig::default(),
            embed_rate_limit: RateLimitConfig::default(),
            side_effects: SideEffectConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub per_second: u64,
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_second: 2,
            burst_size: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SideEffectConfig {
    pub max_attempts: u32,
}

impl Default for SideEffectConfig {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

impl BookingConfig {
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        if !Path::new(path).exists() {
            tracing::info!("Config file not found at {path}, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        tracing::info!(?config, "Loaded booking config from {path}");
        Ok(config)
    }

    pub fn timezone(&self) -> Tz {
        shared::time::parse_timezone(&self.default_timezone).unwrap_or_else(|e| {
            tracing::warn!("{e}, default timezone falls back to UTC");
            Tz::UTC
        })
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn calendar_timeout(&self) -> Duration {
        Duration::from_millis(self.calendar_timeout_ms)
    }

    pub fn lookaround(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.booking_lookaround_hours))
    }

    pub fn slot_minutes(&self) -> u32 {
        self.default_slot_minutes.max(1)
    }
}
