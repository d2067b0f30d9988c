//! Partial update model

use serde::{Deserialize, Deserializer};

use super::inspection::InspectionRecord;
use super::photo::PhotoAttachment;

/// A partial update to an inspection record.
///
/// Fields absent from the request are left untouched. Nullable fields use
/// `Option<Option<T>>`: `None` means "absent", `Some(None)` means the client
/// sent `null` and the stored value is cleared. Required text fields and the
/// `nonConforming` flag cannot be cleared, so `null` there is treated the
/// same as absent. `id` and `inspectionDate` are not part of the patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InspectionPatch {
    pub invoice_number: Option<String>,
    pub material_type: Option<String>,
    pub quality_inspector: Option<String>,
    pub non_conforming: Option<bool>,
    #[serde(deserialize_with = "present")]
    pub quantity_received: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub receive_date: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub safety_inspector: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub logistics_inspector: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub non_conformance_type: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub non_conforming_quantity: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub notes: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub photos: Option<Option<Vec<PhotoAttachment>>>,
}

impl InspectionPatch {
    /// Returns true when the patch carries no field at all.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Merge the present fields into `record`.
    ///
    /// Does not touch `lastModified`; the service stamps it after merging.
    pub fn apply_to(self, record: &mut InspectionRecord) {
        if let Some(value) = self.invoice_number {
            record.invoice_number = value;
        }
        if let Some(value) = self.material_type {
            record.material_type = value;
        }
        if let Some(value) = self.quality_inspector {
            record.quality_inspector = value;
        }
        if let Some(value) = self.non_conforming {
            record.non_conforming = value;
        }
        overwrite(&mut record.quantity_received, self.quantity_received);
        overwrite(&mut record.receive_date, self.receive_date);
        overwrite(&mut record.safety_inspector, self.safety_inspector);
        overwrite(&mut record.logistics_inspector, self.logistics_inspector);
        overwrite(&mut record.non_conformance_type, self.non_conformance_type);
        overwrite(&mut record.non_conforming_quantity, self.non_conforming_quantity);
        overwrite(&mut record.notes, self.notes);
        if let Some(photos) = self.photos {
            record.photos = photos.unwrap_or_default();
        }
    }
}

fn overwrite<T>(slot: &mut Option<T>, value: Option<Option<T>>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// Deserialize a field that was present in the payload, `null` included.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
