//! HTTP API handlers for ehc-api

pub mod auth;
pub mod bookings;
pub mod events;
pub mod gallery;
pub mod health;
pub mod resources;
pub mod training;

pub use auth::{require_admin, require_staff_or_admin, CurrentUser};
pub use health::health_routes;
