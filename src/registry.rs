//! The member registry: supplies existing members for duplicate checks and
//! stores committed records.

use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::error::Result;
use crate::models::{CanonicalEmployeeRecord, ExistingMember};

pub struct MemberRow {
    pub id: String,
    pub employee_number: String,
    pub name: String,
    pub email: String,
    pub plan_id: String,
    pub department: String,
    pub coverage_start: String,
    pub coverage_end: String,
}

pub struct ImportBatch<'a> {
    pub filename: &'a str,
    pub checksum: Option<&'a str>,
    pub corporate_id: &'a str,
    pub invalid_count: usize,
}

pub fn existing_members(conn: &Connection) -> Result<Vec<ExistingMember>> {
    let mut stmt = conn.prepare("SELECT employee_number, email, name FROM members ORDER BY rowid")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ExistingMember {
                employee_number: row.get(0)?,
                email: row.get(1)?,
                name: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Last import that carried this checksum, as `(imported_at, valid_count)`.
pub fn previous_import(conn: &Connection, checksum: &str) -> Result<Option<(String, i64)>> {
    let row = conn
        .query_row(
            "SELECT imported_at, valid_count FROM imports WHERE checksum = ?1 ORDER BY id DESC LIMIT 1",
            [checksum],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    Ok(row)
}

/// Inserts accepted records and logs the batch. Returns the number of
/// members written.
pub fn insert_members(
    conn: &mut Connection,
    batch: &ImportBatch<'_>,
    records: &[CanonicalEmployeeRecord],
) -> Result<usize> {
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO imports (filename, checksum, corporate_id, valid_count, invalid_count) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            batch.filename,
            batch.checksum,
            batch.corporate_id,
            records.len() as i64,
            batch.invalid_count as i64,
        ],
    )?;
    let import_id = tx.last_insert_rowid();
    {
        let mut stmt = tx.prepare(
            "INSERT INTO members (id, corporate_id, employee_number, name, email, mobile, national_id, \
             plan_id, designation, department, coverage_start, coverage_end, import_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )?;
        for r in records {
            stmt.execute(rusqlite::params![
                r.id,
                r.corporate_id,
                r.employee_number,
                r.name,
                r.email,
                r.mobile,
                r.national_id,
                r.plan_id,
                r.designation,
                r.department,
                r.coverage_start,
                r.coverage_end,
                import_id,
            ])?;
        }
    }
    tx.commit()?;
    info!(import_id, inserted = records.len(), "members committed");
    Ok(records.len())
}

pub fn list_members(conn: &Connection) -> Result<Vec<MemberRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, employee_number, name, email, plan_id, department, coverage_start, coverage_end \
         FROM members ORDER BY employee_number",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(MemberRow {
                id: row.get(0)?,
                employee_number: row.get(1)?,
                name: row.get(2)?,
                email: row.get(3)?,
                plan_id: row.get(4)?,
                department: row.get(5)?,
                coverage_start: row.get(6)?,
                coverage_end: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
