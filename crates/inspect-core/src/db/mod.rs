//! Record store for inspections

mod connection;
mod repository;
mod schema;

pub use connection::Database;
pub use repository::{CountFilter, InspectionRepository, SqliteInspectionRepository};
