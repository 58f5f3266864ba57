//! Course database operations
//!
//! Records are upserted by normalized code: created when absent, overwritten
//! when present, never deleted.

use crate::error::PersistenceError;
use crate::models::{CourseRecord, NormalizedRequirements};
use async_trait::async_trait;
use dplan_common::Result;
use serde::Serialize;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use std::collections::{BTreeSet, HashMap};

/// Rows per multi-row statement, well under SQLite's bound-parameter limit
const UPSERT_CHUNK_SIZE: usize = 100;

/// Per-batch write counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertOutcome {
    /// Records whose code already existed
    pub matched: usize,
    /// Existing records whose stored fields changed
    pub modified: usize,
    /// Records created
    pub upserted: usize,
}

/// Batch writer for course records
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Upsert the whole batch in one call
    async fn upsert_batch(&self, records: &[CourseRecord]) -> std::result::Result<UpsertOutcome, PersistenceError>;
}

/// SQLite-backed sink writing the `courses` table
pub struct SqliteCourseSink {
    pool: SqlitePool,
}

impl SqliteCourseSink {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn write_batch(&self, records: &[CourseRecord]) -> Result<UpsertOutcome> {
        let mut outcome = UpsertOutcome::default();
        let mut tx = self.pool.begin().await?;

        for chunk in records.chunks(UPSERT_CHUNK_SIZE) {
            let rows = chunk
                .iter()
                .map(StoredColumns::from_record)
                .collect::<Result<Vec<_>>>()?;
            let existing = load_stored_columns(&mut *tx, &rows).await?;

            let mut changed = Vec::with_capacity(rows.len());
            for row in rows {
                match existing.get(&row.code) {
                    Some(stored) if *stored == row => outcome.matched += 1,
                    Some(_) => {
                        outcome.matched += 1;
                        outcome.modified += 1;
                        changed.push(row);
                    }
                    None => {
                        outcome.upserted += 1;
                        changed.push(row);
                    }
                }
            }

            if changed.is_empty() {
                continue;
            }

            let mut insert = QueryBuilder::<Sqlite>::new(
                "INSERT INTO courses (code, name, prerequisites, corequisites, cross_listings, created_at, updated_at) ",
            );
            insert.push_values(changed, |mut values, row| {
                values
                    .push_bind(row.code)
                    .push_bind(row.name)
                    .push_bind(row.prerequisites)
                    .push_bind(row.corequisites)
                    .push_bind(row.cross_listings)
                    .push("CURRENT_TIMESTAMP")
                    .push("CURRENT_TIMESTAMP");
            });
            insert.push(
                r#"
                ON CONFLICT(code) DO UPDATE SET
                    name = excluded.name,
                    prerequisites = excluded.prerequisites,
                    corequisites = excluded.corequisites,
                    cross_listings = excluded.cross_listings,
                    updated_at = CURRENT_TIMESTAMP
                "#,
            );
            insert.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(outcome)
    }
}

#[async_trait]
impl PersistenceSink for SqliteCourseSink {
    async fn upsert_batch(&self, records: &[CourseRecord]) -> std::result::Result<UpsertOutcome, PersistenceError> {
        // The transaction rolls back on any failure, so the whole batch is in flight
        self.write_batch(records).await.map_err(|source| PersistenceError {
            codes: records.iter().map(|r| r.code.clone()).collect(),
            source,
        })
    }
}

/// JSON-encoded column values for one record
#[derive(Debug, PartialEq, Eq)]
struct StoredColumns {
    code: String,
    name: String,
    prerequisites: String,
    corequisites: String,
    cross_listings: String,
}

impl StoredColumns {
    fn from_record(record: &CourseRecord) -> Result<Self> {
        Ok(Self {
            code: record.code.clone(),
            name: record.name.clone(),
            prerequisites: serde_json::to_string(&record.requirements)?,
            corequisites: serde_json::to_string(&record.corequisites)?,
            cross_listings: serde_json::to_string(&record.cross_listings)?,
        })
    }
}

/// Stored columns for every code in `rows` that already exists, in one query
async fn load_stored_columns(
    conn: &mut SqliteConnection,
    rows: &[StoredColumns],
) -> Result<HashMap<String, StoredColumns>> {
    let mut select = QueryBuilder::<Sqlite>::new(
        "SELECT code, name, prerequisites, corequisites, cross_listings FROM courses WHERE code IN (",
    );
    let mut codes = select.separated(", ");
    for row in rows {
        codes.push_bind(row.code.clone());
    }
    select.push(")");

    let stored: Vec<(String, String, String, String, String)> =
        select.build_query_as().fetch_all(conn).await?;

    Ok(stored
        .into_iter()
        .map(|(code, name, prerequisites, corequisites, cross_listings)| {
            let columns = StoredColumns {
                code: code.clone(),
                name,
                prerequisites,
                corequisites,
                cross_listings,
            };
            (code, columns)
        })
        .collect())
}

fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<CourseRecord> {
    let prerequisites: String = row.get("prerequisites");
    let corequisites: String = row.get("corequisites");
    let cross_listings: String = row.get("cross_listings");

    Ok(CourseRecord {
        code: row.get("code"),
        name: row.get("name"),
        requirements: serde_json::from_str::<NormalizedRequirements>(&prerequisites)?,
        corequisites: serde_json::from_str::<BTreeSet<String>>(&corequisites)?,
        cross_listings: serde_json::from_str::<BTreeSet<String>>(&cross_listings)?,
    })
}

/// Load course by normalized code
pub async fn load_course(pool: &SqlitePool, code: &str) -> Result<Option<CourseRecord>> {
    let row = sqlx::query(
        r#"
        SELECT code, name, prerequisites, corequisites, cross_listings
        FROM courses
        WHERE code = ?
        "#,
    )
    .bind(code)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(record_from_row).transpose()
}

/// Substring search on name or code, ordered by code
///
/// SQLite `LIKE` is case-insensitive for ASCII.
pub async fn find_courses_by_name_or_code(
    pool: &SqlitePool,
    query: &str,
    limit: i64,
) -> Result<Vec<CourseRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT code, name, prerequisites, corequisites, cross_listings
        FROM courses
        WHERE name LIKE '%' || ? || '%'
           OR code LIKE '%' || ? || '%'
        ORDER BY code
        LIMIT ?
        "#,
    )
    .bind(query)
    .bind(query)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(record_from_row).collect()
}

/// Number of stored courses
pub async fn count_courses(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
