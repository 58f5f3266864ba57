//! Database access for dplan-ingest
//!
//! Course persistence behind the `PersistenceSink` seam, plus the read
//! queries the API service runs against the same table.

pub mod courses;

pub use courses::{
    count_courses, find_courses_by_name_or_code, load_course, PersistenceSink, SqliteCourseSink,
    UpsertOutcome,
};
