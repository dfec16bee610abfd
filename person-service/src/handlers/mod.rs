//! HTTP handlers for person-service.

pub mod contact;
pub mod health;
pub mod people;

pub use health::{health_check, metrics_endpoint, readiness_check};
