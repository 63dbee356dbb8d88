pub mod booking;
pub mod calendar;
pub mod circuit_breaker;
pub mod config;
pub mod conflict;
pub mod contact;
pub mod events;
pub mod feasibility;
pub mod gate;
pub mod locks;
pub mod rejection;
pub mod schedule;
pub mod service;
pub mod settings;
pub mod slots;
