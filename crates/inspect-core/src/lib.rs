//! inspect-core - Core library for receiving inspection records
//!
//! This crate contains the inspection record model, the `SQLite`-backed
//! record store, the bulk-sync reconciler, the dashboard aggregator and the
//! async service the HTTP layer talks to.

pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod stats;
pub mod sync;
mod util;

pub use error::{Error, Result};
pub use models::{InspectionId, InspectionPatch, InspectionRecord, NewInspection, PhotoAttachment};
pub use services::InspectionService;
pub use stats::DashboardStats;
pub use sync::{SyncOutcome, SyncRequest};
