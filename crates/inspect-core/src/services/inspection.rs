//! Shared inspection service used by the HTTP handlers.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::db::{Database, InspectionRepository, SqliteInspectionRepository};
use crate::models::{InspectionId, InspectionPatch, InspectionRecord, NewInspection};
use crate::stats::{dashboard_stats, DashboardStats};
use crate::sync::{reconcile_record, SyncAction, SyncOutcome, SyncRequest};
use crate::util::next_modified;
use crate::{Error, Result};

/// Thread-safe service over the single store connection.
///
/// Every method takes the connection lock for the store calls it needs and
/// releases it before returning. Bulk sync re-acquires it per record.
#[derive(Clone)]
pub struct InspectionService {
    db: Arc<Mutex<Database>>,
}

impl InspectionService {
    /// Open the record store at the given filesystem path.
    pub fn open_path(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        tracing::info!("Opening inspection store at {}", db_path.display());
        Ok(Self::from_database(Database::open(db_path)?))
    }

    /// Open an in-memory record store (primarily for tests).
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_database(Database::open_in_memory()?))
    }

    /// Wrap an already opened database.
    pub fn from_database(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    pub async fn create(&self, input: NewInspection) -> Result<InspectionRecord> {
        let record = input.into_record(Utc::now())?;

        let db = self.db.lock().await;
        SqliteInspectionRepository::new(db.connection()).insert(&record)?;
        drop(db);

        tracing::info!(
            id = %record.id,
            non_conforming = record.non_conforming,
            photos = record.photos.len(),
            "Created inspection record"
        );
        Ok(record)
    }

    pub async fn get(&self, id: &InspectionId) -> Result<InspectionRecord> {
        let db = self.db.lock().await;
        SqliteInspectionRepository::new(db.connection())
            .get(id)?
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Records newest first. `limit` is not capped here.
    pub async fn list(&self, skip: usize, limit: usize) -> Result<Vec<InspectionRecord>> {
        let db = self.db.lock().await;
        SqliteInspectionRepository::new(db.connection()).list(limit, skip)
    }

    /// Merge the fields present in `patch` and stamp `lastModified`.
    pub async fn update(
        &self,
        id: &InspectionId,
        patch: InspectionPatch,
    ) -> Result<InspectionRecord> {
        if patch.is_empty() {
            tracing::debug!(id = %id, "Empty patch; only lastModified changes");
        }

        let db = self.db.lock().await;
        let repo = SqliteInspectionRepository::new(db.connection());

        let mut record = repo
            .get(id)?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        patch.apply_to(&mut record);
        record.last_modified = next_modified(record.last_modified, Utc::now());
        repo.replace(&record)?;
        drop(db);

        tracing::info!(id = %record.id, "Updated inspection record");
        Ok(record)
    }

    pub async fn delete(&self, id: &InspectionId) -> Result<()> {
        let db = self.db.lock().await;
        SqliteInspectionRepository::new(db.connection()).delete(id)?;
        drop(db);

        tracing::info!(id = %id, "Deleted inspection record");
        Ok(())
    }

    /// Reconcile a batch of client records in order.
    ///
    /// Stops at the first failing record; records before it stay committed.
    pub async fn bulk_sync(&self, request: SyncRequest) -> Result<SyncOutcome> {
        let total = request.records.len();
        tracing::info!(
            records = total,
            last_sync = request.last_sync_timestamp.as_deref().unwrap_or("none"),
            "Starting bulk sync"
        );

        let (mut inserted, mut replaced) = (0_usize, 0_usize);
        for (index, mut record) in request.records.into_iter().enumerate() {
            // A blank id could never be addressed again, so it gets a fresh one
            if record.id.is_blank() {
                record.id = InspectionId::generate();
            }

            let db = self.db.lock().await;
            let action = reconcile_record(&SqliteInspectionRepository::new(db.connection()), &record)
                .inspect_err(|error| {
                    tracing::error!(
                        id = %record.id,
                        index,
                        "Bulk sync aborted: {error}"
                    );
                })?;
            drop(db);

            match action {
                SyncAction::Inserted => inserted += 1,
                SyncAction::Replaced => replaced += 1,
            }
        }

        tracing::info!(inserted, replaced, "Bulk sync finished");
        Ok(SyncOutcome {
            synced_count: total,
            sync_timestamp: Utc::now(),
        })
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        let db = self.db.lock().await;
        dashboard_stats(&SqliteInspectionRepository::new(db.connection()), Utc::now())
    }

    /// Cheap store round trip for health checks.
    pub async fn ping(&self) -> Result<()> {
        let db = self.db.lock().await;
        db.connection()
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// Close the store connection if this is the last handle to it.
    pub fn shutdown(self) -> Result<()> {
        match Arc::try_unwrap(self.db) {
            Ok(db) => {
                db.into_inner().close()?;
                tracing::info!("Inspection store closed");
            }
            Err(_) => {
                tracing::warn!("Inspection store still shared at shutdown; leaving it to drop");
            }
        }
        Ok(())
    }
}
