//! Async services shared by the HTTP layer.

mod inspection;

pub use inspection::InspectionService;
