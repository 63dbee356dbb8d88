pub mod booking;
pub mod calendar;
pub mod circuit_breaker;
pub mod contact;
pub mod events;
pub mod settings;
