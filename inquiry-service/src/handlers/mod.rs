//! HTTP handlers for inquiry-service.

pub mod health;
pub mod inquiries;

pub use health::{health_check, metrics_endpoint, readiness_check, root};
pub use inquiries::{create_inquiry, get_inquiry, list_inquiries};
