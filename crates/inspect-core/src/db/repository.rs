//! Inspection repository implementation

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use crate::error::{Error, Result};
use crate::models::{InspectionId, InspectionRecord};

/// Filter for [`InspectionRepository::count`]. `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountFilter {
    pub non_conforming: Option<bool>,
    pub inspected_since: Option<DateTime<Utc>>,
}

impl CountFilter {
    /// Every record
    pub const fn all() -> Self {
        Self {
            non_conforming: None,
            inspected_since: None,
        }
    }

    /// Records with the given `nonConforming` flag
    pub const fn non_conforming(flag: bool) -> Self {
        Self {
            non_conforming: Some(flag),
            inspected_since: None,
        }
    }

    /// Records whose `inspectionDate` is at or after `since`
    pub const fn inspected_since(since: DateTime<Utc>) -> Self {
        Self {
            non_conforming: None,
            inspected_since: Some(since),
        }
    }
}

/// Trait for inspection storage operations
pub trait InspectionRepository {
    /// Insert a new record; fails with `Conflict` when the id is taken
    fn insert(&self, record: &InspectionRecord) -> Result<()>;

    /// Get a record by ID
    fn get(&self, id: &InspectionId) -> Result<Option<InspectionRecord>>;

    /// Check whether a record with this ID exists
    fn exists(&self, id: &InspectionId) -> Result<bool>;

    /// List records, newest `inspectionDate` first
    fn list(&self, limit: usize, offset: usize) -> Result<Vec<InspectionRecord>>;

    /// Overwrite every field of an existing record; `NotFound` if absent
    fn replace(&self, record: &InspectionRecord) -> Result<()>;

    /// Delete a record; `NotFound` if absent
    fn delete(&self, id: &InspectionId) -> Result<()>;

    /// Count records matching the filter
    fn count(&self, filter: CountFilter) -> Result<usize>;

    /// Most frequent non-conformance types with their counts, most frequent
    /// first. Equal counts keep the order in which the types first entered
    /// the store.
    fn top_non_conformance_types(&self, limit: usize) -> Result<Vec<(String, usize)>>;
}

/// `SQLite` implementation of `InspectionRepository`
pub struct SqliteInspectionRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteInspectionRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// `SQLite` binds LIMIT/OFFSET as i64; larger values saturate
    fn sql_bound(value: usize) -> i64 {
        i64::try_from(value).unwrap_or(i64::MAX)
    }

    fn parse_documents(documents: Vec<String>) -> Result<Vec<InspectionRecord>> {
        documents
            .iter()
            .map(|document| serde_json::from_str(document).map_err(Error::from))
            .collect()
    }
}

impl InspectionRepository for SqliteInspectionRepository<'_> {
    fn insert(&self, record: &InspectionRecord) -> Result<()> {
        let document = serde_json::to_string(record)?;

        let result = self.conn.execute(
            "INSERT INTO inspections (id, inspection_date, non_conforming, non_conformance_type, document)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id.as_str(),
                record.inspection_date.timestamp_millis(),
                record.non_conforming,
                record.non_conformance_category(),
                document
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(Error::Conflict(record.id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get(&self, id: &InspectionId) -> Result<Option<InspectionRecord>> {
        let document: Option<String> = self
            .conn
            .query_row(
                "SELECT document FROM inspections WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        document
            .map(|document| serde_json::from_str(&document).map_err(Error::from))
            .transpose()
    }

    fn exists(&self, id: &InspectionId) -> Result<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM inspections WHERE id = ?1)",
            params![id.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn list(&self, limit: usize, offset: usize) -> Result<Vec<InspectionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT document
             FROM inspections
             ORDER BY inspection_date DESC, rowid DESC
             LIMIT ?1 OFFSET ?2",
        )?;

        let documents = stmt
            .query_map(
                params![Self::sql_bound(limit), Self::sql_bound(offset)],
                |row| row.get(0),
            )?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        Self::parse_documents(documents)
    }

    fn replace(&self, record: &InspectionRecord) -> Result<()> {
        let document = serde_json::to_string(record)?;

        let rows = self.conn.execute(
            "UPDATE inspections
             SET inspection_date = ?1, non_conforming = ?2, non_conformance_type = ?3, document = ?4
             WHERE id = ?5",
            params![
                record.inspection_date.timestamp_millis(),
                record.non_conforming,
                record.non_conformance_category(),
                document,
                record.id.as_str()
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound(record.id.to_string()));
        }

        Ok(())
    }

    fn delete(&self, id: &InspectionId) -> Result<()> {
        let rows = self.conn.execute(
            "DELETE FROM inspections WHERE id = ?1",
            params![id.as_str()],
        )?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }

        Ok(())
    }

    fn count(&self, filter: CountFilter) -> Result<usize> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM inspections
             WHERE (?1 IS NULL OR non_conforming = ?1)
               AND (?2 IS NULL OR inspection_date >= ?2)",
            params![
                filter.non_conforming,
                filter.inspected_since.map(|since| since.timestamp_millis())
            ],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn top_non_conformance_types(&self, limit: usize) -> Result<Vec<(String, usize)>> {
        let mut stmt = self.conn.prepare(
            "SELECT non_conformance_type, COUNT(*) AS count
             FROM inspections
             WHERE non_conforming = 1 AND non_conformance_type IS NOT NULL
             GROUP BY non_conformance_type
             ORDER BY count DESC, MIN(rowid) ASC
             LIMIT ?1",
        )?;

        let types = stmt
            .query_map(params![Self::sql_bound(limit)], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, usize>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(types)
    }
}
