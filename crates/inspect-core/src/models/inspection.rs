//! Inspection record model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::util::normalize_text_option;

use super::photo::PhotoAttachment;

/// Identifier of an inspection record.
///
/// Clients may supply their own ids (offline-created records keep theirs when
/// synced), so any non-blank string is accepted. Server-side ids are UUID v7.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InspectionId(String);

impl InspectionId {
    /// Create a new unique id using UUID v7
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is empty or only whitespace
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Default for InspectionId {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Display for InspectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for InspectionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for InspectionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A receiving inspection as stored and returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionRecord {
    #[serde(default)]
    pub id: InspectionId,
    pub invoice_number: String,
    pub material_type: String,
    #[serde(default)]
    pub quantity_received: Option<String>,
    /// Opaque client-formatted date string.
    #[serde(default)]
    pub receive_date: Option<String>,
    pub quality_inspector: String,
    #[serde(default)]
    pub safety_inspector: Option<String>,
    #[serde(default)]
    pub logistics_inspector: Option<String>,
    #[serde(default)]
    pub non_conforming: bool,
    #[serde(default)]
    pub non_conformance_type: Option<String>,
    #[serde(default)]
    pub non_conforming_quantity: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub photos: Vec<PhotoAttachment>,
    /// Set once at creation.
    #[serde(default = "Utc::now")]
    pub inspection_date: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub last_modified: DateTime<Utc>,
}

impl InspectionRecord {
    /// The non-conformance category used for dashboard grouping, if any.
    ///
    /// Only non-conforming records with a non-blank type contribute.
    pub fn non_conformance_category(&self) -> Option<&str> {
        if !self.non_conforming {
            return None;
        }
        self.non_conformance_type
            .as_deref()
            .filter(|value| !value.trim().is_empty())
    }
}

/// Input for creating a record.
///
/// Required fields are optional here so that a missing field is reported as a
/// validation error naming the field instead of a generic decode failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewInspection {
    pub id: Option<String>,
    pub invoice_number: Option<String>,
    pub material_type: Option<String>,
    pub quantity_received: Option<String>,
    pub receive_date: Option<String>,
    pub quality_inspector: Option<String>,
    pub safety_inspector: Option<String>,
    pub logistics_inspector: Option<String>,
    pub non_conforming: bool,
    pub non_conformance_type: Option<String>,
    pub non_conforming_quantity: Option<String>,
    pub notes: Option<String>,
    pub photos: Vec<PhotoAttachment>,
}

impl NewInspection {
    /// Validate required fields and build the record to store.
    pub fn into_record(self, now: DateTime<Utc>) -> Result<InspectionRecord> {
        let invoice_number = required("invoiceNumber", self.invoice_number)?;
        let material_type = required("materialType", self.material_type)?;
        let quality_inspector = required("qualityInspector", self.quality_inspector)?;
        let id = normalize_text_option(self.id).map_or_else(InspectionId::generate, Into::into);

        Ok(InspectionRecord {
            id,
            invoice_number,
            material_type,
            quantity_received: self.quantity_received,
            receive_date: self.receive_date,
            quality_inspector,
            safety_inspector: self.safety_inspector,
            logistics_inspector: self.logistics_inspector,
            non_conforming: self.non_conforming,
            non_conformance_type: self.non_conformance_type,
            non_conforming_quantity: self.non_conforming_quantity,
            notes: self.notes,
            photos: self.photos,
            inspection_date: now,
            last_modified: now,
        })
    }
}

/// Blank values are rejected; accepted values are stored exactly as sent.
fn required(field: &str, value: Option<String>) -> Result<String> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| Error::Validation(format!("{field} is required and cannot be empty")))
}
