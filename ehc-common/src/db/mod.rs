//! Database schema, models and queries

pub mod init;
pub mod migrations;
pub mod models;
pub mod staff;
pub mod users;

pub use init::*;
pub use migrations::*;
pub use models::*;
