//! # EHC Import
//!
//! Batch jobs that move legacy booking-system exports into the club database:
//! - Member CSV reconciliation (tier normalization, dedup, upsert, role elevation)
//! - Production SQL update script generation
//! - Staff directory import

pub mod csv_parser;
pub mod member_row;
pub mod reconcile;
pub mod source;
pub mod sql_script;
pub mod staff_import;

pub use csv_parser::{parse_csv, CsvRow};
pub use member_row::MemberRow;
pub use reconcile::{import_members, ImportReport, MemberImporter, RowError};
