//! # EHC Common Library
//!
//! Shared code for the Even House Club services:
//! - Database schema, migrations and queries
//! - Membership tier normalization
//! - Role resolution (admin / staff / member)
//! - Configuration loading
//! - Transient-error retry helper

pub mod config;
pub mod db;
pub mod error;
pub mod retry;
pub mod roles;
pub mod tiers;

pub use error::{Error, Result};
pub use roles::Role;
pub use tiers::{parse_tier, Tier, TierMapping};
