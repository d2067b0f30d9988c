//! Data models for inspection records

mod inspection;
mod patch;
mod photo;

pub use inspection::{InspectionId, InspectionRecord, NewInspection};
pub use patch::InspectionPatch;
pub use photo::PhotoAttachment;
