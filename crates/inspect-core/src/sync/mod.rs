//! Bulk sync of client-held inspection records.
//!
//! Each incoming record is reconciled on its own: an existence check by id,
//! then an insert or a full replace. Nothing spans the batch, and the check
//! and the write are separate store calls, so two syncs touching the same id
//! concurrently may race (a duplicate insert attempt or a lost update). The
//! last write wins; the client's sync timestamp is not consulted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::InspectionRepository;
use crate::error::Result;
use crate::models::InspectionRecord;

/// Payload of a bulk sync request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    /// Full records in the order they should be applied.
    #[serde(alias = "cargos")]
    pub records: Vec<InspectionRecord>,
    /// When the client last synced. Logged only.
    #[serde(default)]
    pub last_sync_timestamp: Option<String>,
}

/// Batch-level result of a bulk sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub synced_count: usize,
    pub sync_timestamp: DateTime<Utc>,
}

/// What reconciling a single record did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Inserted,
    Replaced,
}

/// Insert `record` if its id is unknown, otherwise replace the stored one.
///
/// The record is written verbatim, client-supplied `inspectionDate` and
/// `lastModified` included.
pub fn reconcile_record(
    repo: &impl InspectionRepository,
    record: &InspectionRecord,
) -> Result<SyncAction> {
    if repo.exists(&record.id)? {
        repo.replace(record)?;
        Ok(SyncAction::Replaced)
    } else {
        repo.insert(record)?;
        Ok(SyncAction::Inserted)
    }
}
