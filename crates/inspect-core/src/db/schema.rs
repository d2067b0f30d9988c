//! Inspection collection schema
//!
//! Records are stored as JSON documents. The projection columns exist only
//! for ordering, counting and grouping and are rewritten with every write.

use crate::error::Result;
use rusqlite::Connection;

/// Create the inspections collection if it does not exist yet
pub fn ensure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS inspections (
            id TEXT PRIMARY KEY,
            inspection_date INTEGER NOT NULL,
            non_conforming INTEGER NOT NULL DEFAULT 0,
            non_conformance_type TEXT,
            document TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_inspections_date ON inspections(inspection_date DESC);
        CREATE INDEX IF NOT EXISTS idx_inspections_non_conforming
            ON inspections(non_conforming, non_conformance_type);",
    )?;
    Ok(())
}
