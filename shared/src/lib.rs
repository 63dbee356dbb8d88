//! Types and runtime plumbing shared by the booking service and its clients.

pub mod responses;
pub mod shutdown;
pub mod telemetry;
pub mod time;
pub mod types;
