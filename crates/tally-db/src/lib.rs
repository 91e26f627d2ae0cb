//! Storage layer for tally.
//!
//! Provides persistence for categories, activities and facts using `rusqlite`, and
//! implements [`FactStore`] so the core lifecycle can admit and commit facts.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared across threads
//! without external synchronization.
//!
//! The overlap check in the core is check-then-act. Two processes writing to the same
//! file can still race; the `facts_no_overlap_*` triggers reject the losing write inside
//! SQLite, which surfaces as a conflict.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Fact timestamps are naive local times stored as TEXT in `YYYY-MM-DD HH:MM:SS` form.
//! Lexicographic ordering matches chronological ordering, so range filters and the
//! overlap triggers compare the strings directly. Sub-second precision is not stored.
//!
//! ## Activity Identity
//!
//! An activity is unique per `(name, category)`. A uniqueness index over
//! `IFNULL(category_id, 0)` makes this hold for activities without a category too.
//!
//! Removing an activity that facts still reference only sets its `deleted` flag, which
//! hides it from [`Database::list_activities`]. Storing a fact with it clears the flag.

use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use thiserror::Error;

use tally_core::{
    Activity, ActivityId, ActivityName, Category, CategoryId, CategoryName, Fact, FactFilter,
    FactId, FactStore, ResolvedInterval, TrackError, ValidationError,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Message raised by the overlap triggers.
const OVERLAP_MESSAGE: &str = "fact overlaps a stored fact";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to parse a stored fact timestamp.
    #[error("invalid timestamp for fact {fact_id}: {timestamp}")]
    TimestampParse {
        fact_id: i64,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored name no longer passes validation.
    #[error("invalid stored name: {0}")]
    InvalidName(#[from] ValidationError),
    /// The overlap triggers rejected a write.
    #[error("fact {start} - {end} overlaps a stored fact")]
    Overlap {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// No fact exists with the given primary key.
    #[error("no fact with id {0}")]
    FactNotFound(FactId),
    /// No activity exists with the given primary key.
    #[error("no activity with id {0}")]
    ActivityNotFound(ActivityId),
}

/// What [`Database::remove_activity`] did with the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityRemoval {
    /// No fact referenced the activity, so the row is gone.
    Deleted,
    /// Facts still reference the activity; it is only marked deleted.
    Hidden,
}

impl From<DbError> for TrackError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Overlap { start, end } => Self::Conflict { start, end },
            DbError::FactNotFound(pk) => Self::not_found("fact", pk),
            DbError::ActivityNotFound(pk) => Self::not_found("activity", pk),
            other => Self::Storage(Box::new(other)),
        }
    }
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Raw fact row as read from the database, before validation.
struct FactRow {
    id: i64,
    start: String,
    end: String,
    description: Option<String>,
    activity_id: i64,
    activity_name: String,
    deleted: bool,
    category_id: Option<i64>,
    category_name: Option<String>,
}

const FACT_COLUMNS: &str = "
    SELECT f.id, f.start_time, f.end_time, f.description,
           a.id, a.name, a.deleted, c.id, c.name
    FROM facts f
    JOIN activities a ON a.id = f.activity_id
    LEFT JOIN categories c ON c.id = a.category_id
";

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS activities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                category_id INTEGER,
                deleted INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE SET NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_activities_name_category
                ON activities(name, IFNULL(category_id, 0));

            -- Facts table: non-overlapping closed intervals
            -- start_time/end_time: 'YYYY-MM-DD HH:MM:SS' naive local time
            CREATE TABLE IF NOT EXISTS facts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                activity_id INTEGER NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                description TEXT,
                FOREIGN KEY (activity_id) REFERENCES activities(id),
                CHECK (start_time < end_time)
            );

            CREATE INDEX IF NOT EXISTS idx_facts_start ON facts(start_time);
            CREATE INDEX IF NOT EXISTS idx_facts_end ON facts(end_time);

            CREATE TRIGGER IF NOT EXISTS facts_no_overlap_insert
            BEFORE INSERT ON facts
            WHEN EXISTS (
                SELECT 1 FROM facts
                WHERE start_time BETWEEN NEW.start_time AND NEW.end_time
                   OR end_time BETWEEN NEW.start_time AND NEW.end_time
            )
            BEGIN
                SELECT RAISE(ABORT, 'fact overlaps a stored fact');
            END;

            CREATE TRIGGER IF NOT EXISTS facts_no_overlap_update
            BEFORE UPDATE OF start_time, end_time ON facts
            WHEN EXISTS (
                SELECT 1 FROM facts
                WHERE id != NEW.id
                  AND (start_time BETWEEN NEW.start_time AND NEW.end_time
                       OR end_time BETWEEN NEW.start_time AND NEW.end_time)
            )
            BEGIN
                SELECT RAISE(ABORT, 'fact overlaps a stored fact');
            END;
            ",
        )?;
        Ok(())
    }

    // ========== Categories ==========

    /// Looks up a category by its exact name.
    pub fn category_by_name(&self, name: &CategoryName) -> Result<Option<Category>, DbError> {
        find_category(&self.conn, name)
    }

    /// Returns the category with this name, creating it if it does not exist yet.
    pub fn get_or_create_category(&mut self, name: &CategoryName) -> Result<Category, DbError> {
        ensure_category(&self.conn, name)
    }

    /// Lists all categories ordered by name.
    pub fn list_categories(&self) -> Result<Vec<Category>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM categories ORDER BY name ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut categories = Vec::new();
        for row in rows {
            let (id, name) = row?;
            categories.push(Category {
                pk: Some(CategoryId::new(id)),
                name: CategoryName::new(name)?,
            });
        }
        Ok(categories)
    }

    // ========== Activities ==========

    /// Looks up an activity by its `(name, category)` composite key.
    pub fn activity_by_composite(
        &self,
        name: &ActivityName,
        category: Option<&CategoryName>,
    ) -> Result<Option<Activity>, DbError> {
        find_activity(&self.conn, name, category)
    }

    /// Returns the activity matching `activity`'s composite key, creating it (and its
    /// category) if needed. Any primary keys on `activity` are ignored.
    pub fn get_or_create_activity(&mut self, activity: &Activity) -> Result<Activity, DbError> {
        ensure_activity(&self.conn, activity)
    }

    /// Removes an activity, or hides it when facts still reference it.
    pub fn remove_activity(&mut self, pk: ActivityId) -> Result<ActivityRemoval, DbError> {
        let tx = self.conn.transaction()?;
        let in_use = tx.query_row(
            "SELECT EXISTS (SELECT 1 FROM facts WHERE activity_id = ?)",
            [pk.get()],
            |row| row.get::<_, bool>(0),
        )?;
        let (changed, removal) = if in_use {
            let changed =
                tx.execute("UPDATE activities SET deleted = 1 WHERE id = ?", [pk.get()])?;
            (changed, ActivityRemoval::Hidden)
        } else {
            let changed = tx.execute("DELETE FROM activities WHERE id = ?", [pk.get()])?;
            (changed, ActivityRemoval::Deleted)
        };
        if changed == 0 {
            return Err(DbError::ActivityNotFound(pk));
        }
        tx.commit()?;
        tracing::debug!(activity_id = %pk, ?removal, "removed activity");
        Ok(removal)
    }

    /// Lists activities that are not marked deleted, ordered by name.
    ///
    /// `category` restricts the list to one category; `search` keeps only activities
    /// whose name contains it (case-insensitive).
    pub fn list_activities(
        &self,
        category: Option<&CategoryName>,
        search: Option<&str>,
    ) -> Result<Vec<Activity>, DbError> {
        let pattern = search.map(like_pattern);
        let mut stmt = self.conn.prepare(
            "
            SELECT a.id, a.name, a.deleted, c.id, c.name
            FROM activities a
            LEFT JOIN categories c ON c.id = a.category_id
            WHERE a.deleted = 0
              AND (?1 IS NULL OR c.name = ?1)
              AND (?2 IS NULL OR a.name LIKE ?2 ESCAPE '\\')
            ORDER BY a.name ASC, c.name ASC
            ",
        )?;
        let rows = stmt.query_map(
            params![category.map(CategoryName::as_str), pattern],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, bool>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            },
        )?;
        let mut activities = Vec::new();
        for row in rows {
            let (id, name, deleted, category_id, category_name) = row?;
            activities.push(build_activity(
                id,
                name,
                deleted,
                category_id,
                category_name,
            )?);
        }
        Ok(activities)
    }

    // ========== Facts ==========

    /// Fetches one fact by primary key.
    pub fn get_fact(&self, pk: FactId) -> Result<Fact, DbError> {
        let row = self
            .conn
            .query_row(
                &format!("{FACT_COLUMNS} WHERE f.id = ?"),
                [pk.get()],
                read_fact_row,
            )
            .optional()?;
        row.ok_or(DbError::FactNotFound(pk))?.into_fact()
    }

    /// Lists facts inside the filter's window, ordered by start time.
    ///
    /// A fact is included when it starts at or after `filter.start` and ends at or before
    /// `filter.end`. The search term matches activity or category names.
    pub fn list_facts(&self, filter: &FactFilter) -> Result<Vec<Fact>, DbError> {
        let start = filter.start.map(format_timestamp);
        let end = filter.end.map(format_timestamp);
        let pattern = filter.search.as_deref().map(like_pattern);
        let mut stmt = self.conn.prepare(&format!(
            "
            {FACT_COLUMNS}
            WHERE (?1 IS NULL OR f.start_time >= ?1)
              AND (?2 IS NULL OR f.end_time <= ?2)
              AND (?3 IS NULL OR a.name LIKE ?3 ESCAPE '\\' OR c.name LIKE ?3 ESCAPE '\\')
            ORDER BY f.start_time ASC, f.id ASC
            "
        ))?;
        let rows = stmt.query_map(params![start, end, pattern], read_fact_row)?;
        let mut facts = Vec::new();
        for row in rows {
            facts.push(row?.into_fact()?);
        }
        Ok(facts)
    }

    /// Lists the stored fact spans, optionally leaving one fact out.
    pub fn fact_spans(
        &self,
        exclude: Option<FactId>,
    ) -> Result<Vec<(NaiveDateTime, NaiveDateTime)>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, start_time, end_time
            FROM facts
            WHERE ?1 IS NULL OR id != ?1
            ORDER BY start_time ASC
            ",
        )?;
        let rows = stmt.query_map([exclude.map(FactId::get)], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        let mut spans = Vec::new();
        for row in rows {
            let (id, start, end) = row?;
            spans.push((parse_timestamp(&start, id)?, parse_timestamp(&end, id)?));
        }
        Ok(spans)
    }

    /// Inserts or replaces a fact, resolving its activity by composite key.
    pub fn save_fact(&mut self, fact: &Fact) -> Result<Fact, DbError> {
        let tx = self.conn.transaction()?;
        let activity = ensure_activity(&tx, &fact.activity)?;
        let activity_id = activity.pk.map(ActivityId::get);
        let start = format_timestamp(fact.start);
        let end = format_timestamp(fact.end);
        let classify = |err: rusqlite::Error| classify_write_error(err, fact);

        let pk = match fact.pk {
            None => {
                tx.execute(
                    "
                    INSERT INTO facts (activity_id, start_time, end_time, description)
                    VALUES (?, ?, ?, ?)
                    ",
                    params![activity_id, start, end, fact.description],
                )
                .map_err(classify)?;
                FactId::new(tx.last_insert_rowid())
            }
            Some(pk) => {
                let changed = tx
                    .execute(
                        "
                        UPDATE facts
                        SET activity_id = ?, start_time = ?, end_time = ?, description = ?
                        WHERE id = ?
                        ",
                        params![activity_id, start, end, fact.description, pk.get()],
                    )
                    .map_err(classify)?;
                if changed == 0 {
                    return Err(DbError::FactNotFound(pk));
                }
                pk
            }
        };
        tx.commit()?;
        tracing::debug!(fact_id = %pk, %start, %end, "saved fact");

        Ok(Fact {
            pk: Some(pk),
            activity,
            ..fact.clone()
        })
    }

    /// Deletes a fact by primary key.
    pub fn delete_fact(&mut self, pk: FactId) -> Result<(), DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM facts WHERE id = ?", [pk.get()])?;
        if deleted == 0 {
            return Err(DbError::FactNotFound(pk));
        }
        tracing::debug!(fact_id = %pk, "deleted fact");
        Ok(())
    }
}

impl FactStore for Database {
    fn list_intervals_excluding(
        &self,
        exclude: Option<FactId>,
    ) -> tally_core::Result<Vec<ResolvedInterval>> {
        self.fact_spans(exclude)?
            .into_iter()
            .map(|(start, end)| ResolvedInterval::new(start, end))
            .collect()
    }

    fn commit(&mut self, fact: Fact) -> tally_core::Result<Fact> {
        Ok(self.save_fact(&fact)?)
    }

    fn delete(&mut self, pk: FactId) -> tally_core::Result<()> {
        Ok(self.delete_fact(pk)?)
    }
}

fn find_category(conn: &Connection, name: &CategoryName) -> Result<Option<Category>, DbError> {
    let id = conn
        .query_row(
            "SELECT id FROM categories WHERE name = ?",
            [name.as_str()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(id.map(|id| Category {
        pk: Some(CategoryId::new(id)),
        name: name.clone(),
    }))
}

fn ensure_category(conn: &Connection, name: &CategoryName) -> Result<Category, DbError> {
    if let Some(category) = find_category(conn, name)? {
        return Ok(category);
    }
    conn.execute("INSERT INTO categories (name) VALUES (?)", [name.as_str()])?;
    tracing::debug!(category = %name, "created category");
    Ok(Category {
        pk: Some(CategoryId::new(conn.last_insert_rowid())),
        name: name.clone(),
    })
}

fn find_activity(
    conn: &Connection,
    name: &ActivityName,
    category: Option<&CategoryName>,
) -> Result<Option<Activity>, DbError> {
    let row = conn
        .query_row(
            "
            SELECT a.id, a.deleted, c.id
            FROM activities a
            LEFT JOIN categories c ON c.id = a.category_id
            WHERE a.name = ?1
              AND ((?2 IS NULL AND a.category_id IS NULL) OR c.name = ?2)
            ",
            params![name.as_str(), category.map(CategoryName::as_str)],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, bool>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                ))
            },
        )
        .optional()?;
    Ok(row.map(|(id, deleted, category_id)| Activity {
        pk: Some(ActivityId::new(id)),
        name: name.clone(),
        category: category.map(|name| Category {
            pk: category_id.map(CategoryId::new),
            name: name.clone(),
        }),
        deleted,
    }))
}

fn ensure_activity(conn: &Connection, activity: &Activity) -> Result<Activity, DbError> {
    if let Some(found) = find_activity(conn, &activity.name, activity.category_name())? {
        if !found.deleted {
            return Ok(found);
        }
        let pk = found.pk.map(ActivityId::get);
        conn.execute("UPDATE activities SET deleted = 0 WHERE id = ?", [pk])?;
        tracing::debug!(activity = %found, "restored activity");
        return Ok(Activity {
            deleted: false,
            ..found
        });
    }
    let category = activity
        .category_name()
        .map(|name| ensure_category(conn, name))
        .transpose()?;
    conn.execute(
        "INSERT INTO activities (name, category_id, deleted) VALUES (?, ?, ?)",
        params![
            activity.name.as_str(),
            category
                .as_ref()
                .and_then(|category| category.pk)
                .map(CategoryId::get),
            activity.deleted,
        ],
    )?;
    tracing::debug!(activity = %activity, "created activity");
    Ok(Activity {
        pk: Some(ActivityId::new(conn.last_insert_rowid())),
        name: activity.name.clone(),
        category,
        deleted: activity.deleted,
    })
}

fn read_fact_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FactRow> {
    Ok(FactRow {
        id: row.get(0)?,
        start: row.get(1)?,
        end: row.get(2)?,
        description: row.get(3)?,
        activity_id: row.get(4)?,
        activity_name: row.get(5)?,
        deleted: row.get(6)?,
        category_id: row.get(7)?,
        category_name: row.get(8)?,
    })
}

impl FactRow {
    fn into_fact(self) -> Result<Fact, DbError> {
        Ok(Fact {
            pk: Some(FactId::new(self.id)),
            start: parse_timestamp(&self.start, self.id)?,
            end: parse_timestamp(&self.end, self.id)?,
            activity: build_activity(
                self.activity_id,
                self.activity_name,
                self.deleted,
                self.category_id,
                self.category_name,
            )?,
            description: self.description,
        })
    }
}

fn build_activity(
    id: i64,
    name: String,
    deleted: bool,
    category_id: Option<i64>,
    category_name: Option<String>,
) -> Result<Activity, DbError> {
    let category = match (category_id, category_name) {
        (Some(id), Some(name)) => Some(Category {
            pk: Some(CategoryId::new(id)),
            name: CategoryName::new(name)?,
        }),
        _ => None,
    };
    Ok(Activity {
        pk: Some(ActivityId::new(id)),
        name: ActivityName::new(name)?,
        category,
        deleted,
    })
}

/// Maps a trigger abort onto [`DbError::Overlap`]; other errors pass through.
fn classify_write_error(err: rusqlite::Error, fact: &Fact) -> DbError {
    let overlaps = matches!(
        &err,
        rusqlite::Error::SqliteFailure(failure, Some(message))
            if failure.code == ErrorCode::ConstraintViolation
                && message.contains(OVERLAP_MESSAGE)
    );
    if overlaps {
        DbError::Overlap {
            start: fact.start,
            end: fact.end,
        }
    } else {
        DbError::Sqlite(err)
    }
}

/// Builds a `LIKE` pattern matching `term` anywhere, escaping wildcards.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.trim().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn parse_timestamp(timestamp: &str, fact_id: i64) -> Result<NaiveDateTime, DbError> {
    NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).map_err(|source| {
        DbError::TimestampParse {
            fact_id,
            timestamp: timestamp.to_string(),
            source,
        }
    })
}

fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use chrono::{NaiveDate, NaiveTime};
    use tally_core::{DayBoundary, FactLifecycle, OverlapRule};

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2015, 12, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn activity(name: &str, category: Option<&str>) -> Activity {
        Activity::new(
            ActivityName::new(name).unwrap(),
            category.map(|c| Category::new(CategoryName::new(c).unwrap())),
        )
    }

    fn fact(name: &str, category: Option<&str>, start: NaiveDateTime, end: NaiveDateTime) -> Fact {
        Fact::new(
            activity(name, category),
            ResolvedInterval::new(start, end).unwrap(),
            None,
        )
    }

    fn boundary() -> DayBoundary {
        DayBoundary::new(NaiveTime::from_hms_opt(5, 30, 0).unwrap())
    }

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");

        assert_eq!(table_columns(&db.conn, "categories"), vec!["id", "name"]);
        assert_eq!(
            table_columns(&db.conn, "activities"),
            vec!["id", "name", "category_id", "deleted"]
        );
        assert_eq!(
            table_columns(&db.conn, "facts"),
            vec!["id", "activity_id", "start_time", "end_time", "description"]
        );

        let fact_indexes = index_names(&db.conn, "facts");
        assert!(fact_indexes.contains("idx_facts_start"));
        assert!(fact_indexes.contains("idx_facts_end"));
        assert!(index_names(&db.conn, "activities").contains("idx_activities_name_category"));

        let triggers: HashSet<String> = {
            let mut stmt = db
                .conn
                .prepare("SELECT name FROM sqlite_master WHERE type = 'trigger'")
                .unwrap();
            stmt.query_map([], |row| row.get::<_, String>(0))
                .unwrap()
                .map(|row| row.unwrap())
                .collect()
        };
        assert!(triggers.contains("facts_no_overlap_insert"));
        assert!(triggers.contains("facts_no_overlap_update"));
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info");
        rows.map(|row| row.expect("table_info row")).collect()
    }

    fn index_names(conn: &Connection, table: &str) -> HashSet<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA index_list({table})"))
            .expect("prepare index_list");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query index_list");
        rows.map(|row| row.expect("index_list row")).collect()
    }

    #[test]
    fn get_or_create_category_is_idempotent() {
        let mut db = Database::open_in_memory().unwrap();
        let name = CategoryName::new("work").unwrap();
        let first = db.get_or_create_category(&name).unwrap();
        let second = db.get_or_create_category(&name).unwrap();
        assert_eq!(first, second);
        assert!(first.pk.is_some());
        assert_eq!(db.list_categories().unwrap().len(), 1);
        assert_eq!(db.category_by_name(&name).unwrap(), Some(first));
        assert!(
            db.category_by_name(&CategoryName::new("home").unwrap())
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn activities_are_unique_per_name_and_category() {
        let mut db = Database::open_in_memory().unwrap();
        let work = db.get_or_create_activity(&activity("coding", Some("work"))).unwrap();
        let again = db.get_or_create_activity(&activity("coding", Some("work"))).unwrap();
        let plain = db.get_or_create_activity(&activity("coding", None)).unwrap();
        let plain_again = db.get_or_create_activity(&activity("coding", None)).unwrap();

        assert_eq!(work.pk, again.pk);
        assert_eq!(plain.pk, plain_again.pk);
        assert_ne!(work.pk, plain.pk);
        assert_eq!(work.to_string(), "coding@work");

        let found = db
            .activity_by_composite(
                &ActivityName::new("coding").unwrap(),
                Some(&CategoryName::new("work").unwrap()),
            )
            .unwrap()
            .unwrap();
        assert_eq!(found.pk, work.pk);
        assert_eq!(found.category.unwrap().pk, work.category.unwrap().pk);
    }

    #[test]
    fn list_activities_filters_by_category_and_search() {
        let mut db = Database::open_in_memory().unwrap();
        db.get_or_create_activity(&activity("coding", Some("work"))).unwrap();
        db.get_or_create_activity(&activity("meeting", Some("work"))).unwrap();
        db.get_or_create_activity(&activity("reading", None)).unwrap();

        let all = db.list_activities(None, None).unwrap();
        assert_eq!(all.len(), 3);

        let work = CategoryName::new("work").unwrap();
        let names: Vec<String> = db
            .list_activities(Some(&work), None)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, vec!["coding@work", "meeting@work"]);

        let found = db.list_activities(None, Some("READ")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name.as_str(), "reading");
    }

    #[test]
    fn remove_activity_deletes_unused_rows() {
        let mut db = Database::open_in_memory().unwrap();
        let idle = db.get_or_create_activity(&activity("idle", None)).unwrap();

        let removal = db.remove_activity(idle.pk.unwrap()).unwrap();
        assert_eq!(removal, ActivityRemoval::Deleted);
        assert!(
            db.activity_by_composite(&ActivityName::new("idle").unwrap(), None)
                .unwrap()
                .is_none()
        );

        let err = db.remove_activity(idle.pk.unwrap()).unwrap_err();
        assert!(matches!(err, DbError::ActivityNotFound(_)));
    }

    #[test]
    fn remove_activity_hides_referenced_rows() {
        let mut db = Database::open_in_memory().unwrap();
        let stored = db
            .save_fact(&fact("coding", Some("work"), at(10, 9, 0), at(10, 10, 0)))
            .unwrap();
        db.get_or_create_activity(&activity("reading", None)).unwrap();

        let removal = db.remove_activity(stored.activity.pk.unwrap()).unwrap();
        assert_eq!(removal, ActivityRemoval::Hidden);

        let names: Vec<String> = db
            .list_activities(None, None)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, vec!["reading"]);

        let kept = db.get_fact(stored.pk.unwrap()).unwrap();
        assert!(kept.activity.deleted);
        assert_eq!(kept.activity.to_string(), "coding@work");
    }

    #[test]
    fn saving_a_fact_restores_a_hidden_activity() {
        let mut db = Database::open_in_memory().unwrap();
        let stored = db
            .save_fact(&fact("coding", Some("work"), at(10, 9, 0), at(10, 10, 0)))
            .unwrap();
        db.remove_activity(stored.activity.pk.unwrap()).unwrap();
        assert!(db.list_activities(None, None).unwrap().is_empty());

        let again = db
            .save_fact(&fact("coding", Some("work"), at(10, 11, 0), at(10, 12, 0)))
            .unwrap();
        assert_eq!(again.activity.pk, stored.activity.pk);
        assert!(!again.activity.deleted);
        assert_eq!(db.list_activities(None, None).unwrap().len(), 1);
    }

    #[test]
    fn save_fact_assigns_pk_and_round_trips() {
        let mut db = Database::open_in_memory().unwrap();
        let mut candidate = fact("coding", Some("work"), at(10, 9, 0), at(10, 10, 0));
        candidate.description = Some("reviewing".to_string());

        let stored = db.save_fact(&candidate).unwrap();
        let pk = stored.pk.unwrap();
        assert!(stored.activity.pk.is_some());

        let loaded = db.get_fact(pk).unwrap();
        assert_eq!(loaded, stored);
        assert_eq!(loaded.description.as_deref(), Some("reviewing"));
    }

    #[test]
    fn save_fact_replaces_existing_row() {
        let mut db = Database::open_in_memory().unwrap();
        let mut stored = db
            .save_fact(&fact("coding", None, at(10, 9, 0), at(10, 10, 0)))
            .unwrap();
        stored.end = at(10, 10, 30);
        stored.activity = activity("writing", Some("home"));
        db.save_fact(&stored).unwrap();

        let loaded = db.get_fact(stored.pk.unwrap()).unwrap();
        assert_eq!(loaded.end, at(10, 10, 30));
        assert_eq!(loaded.activity.to_string(), "writing@home");
        assert_eq!(db.list_facts(&FactFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn save_fact_with_unknown_pk_is_not_found() {
        let mut db = Database::open_in_memory().unwrap();
        let mut ghost = fact("coding", None, at(10, 9, 0), at(10, 10, 0));
        ghost.pk = Some(FactId::new(42));
        let err = db.save_fact(&ghost).unwrap_err();
        assert!(matches!(err, DbError::FactNotFound(pk) if pk == FactId::new(42)));
    }

    #[test]
    fn triggers_reject_overlap_written_past_the_core() {
        let mut db = Database::open_in_memory().unwrap();
        db.save_fact(&fact("coding", None, at(10, 10, 0), at(10, 11, 0)))
            .unwrap();

        let err = db
            .commit(fact("coding", None, at(10, 10, 30), at(10, 12, 0)))
            .unwrap_err();
        assert!(matches!(err, TrackError::Conflict { .. }));
        assert_eq!(db.list_facts(&FactFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn rejected_fact_leaves_no_new_activity_or_category() {
        let mut db = Database::open_in_memory().unwrap();
        db.save_fact(&fact("coding", Some("work"), at(10, 10, 0), at(10, 11, 0)))
            .unwrap();
        let activities = db.list_activities(None, None).unwrap();
        let categories = db.list_categories().unwrap();

        let err = db
            .save_fact(&fact("call", Some("meetings"), at(10, 10, 30), at(10, 12, 0)))
            .unwrap_err();
        assert!(matches!(err, DbError::Overlap { .. }));
        assert_eq!(db.list_activities(None, None).unwrap(), activities);
        assert_eq!(db.list_categories().unwrap(), categories);
        assert!(
            db.category_by_name(&CategoryName::new("meetings").unwrap())
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn update_trigger_ignores_the_row_itself() {
        let mut db = Database::open_in_memory().unwrap();
        let mut stored = db
            .save_fact(&fact("coding", None, at(10, 10, 0), at(10, 11, 0)))
            .unwrap();
        stored.start = at(10, 10, 15);
        assert!(db.save_fact(&stored).is_ok());
    }

    #[test]
    fn delete_fact_reports_missing_rows() {
        let mut db = Database::open_in_memory().unwrap();
        let stored = db
            .save_fact(&fact("coding", None, at(10, 9, 0), at(10, 10, 0)))
            .unwrap();
        let pk = stored.pk.unwrap();
        db.delete_fact(pk).unwrap();

        let err = db.delete(pk).unwrap_err();
        assert!(matches!(err, TrackError::NotFound { entity: "fact", .. }));
        assert!(matches!(db.get_fact(pk), Err(DbError::FactNotFound(_))));
    }

    #[test]
    fn list_facts_applies_window_and_search() {
        let mut db = Database::open_in_memory().unwrap();
        db.save_fact(&fact("coding", Some("work"), at(9, 9, 0), at(9, 10, 0)))
            .unwrap();
        db.save_fact(&fact("coding", Some("work"), at(10, 9, 0), at(10, 10, 0)))
            .unwrap();
        db.save_fact(&fact("reading", Some("home"), at(10, 20, 0), at(10, 21, 0)))
            .unwrap();
        db.save_fact(&fact("sleep", None, at(11, 1, 0), at(11, 5, 0)))
            .unwrap();

        let day = FactFilter::day(NaiveDate::from_ymd_opt(2015, 12, 10).unwrap(), boundary())
            .unwrap();
        let facts = db.list_facts(&day).unwrap();
        let names: Vec<&str> = facts.iter().map(|f| f.activity.name.as_str()).collect();
        assert_eq!(names, vec!["coding", "reading", "sleep"]);

        let facts = db.list_facts(&day.clone().with_search("WORK")).unwrap();
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].start, at(10, 9, 0));

        let facts = db.list_facts(&day.with_search("50%")).unwrap();
        assert!(facts.is_empty());
    }

    #[test]
    fn fact_spans_exclude_requested_fact() {
        let mut db = Database::open_in_memory().unwrap();
        let first = db
            .save_fact(&fact("coding", None, at(10, 9, 0), at(10, 10, 0)))
            .unwrap();
        db.save_fact(&fact("coding", None, at(10, 11, 0), at(10, 12, 0)))
            .unwrap();

        assert_eq!(db.fact_spans(None).unwrap().len(), 2);
        assert_eq!(
            db.fact_spans(first.pk).unwrap(),
            vec![(at(10, 11, 0), at(10, 12, 0))]
        );
    }

    #[test]
    fn lifecycle_rejects_nested_fact() {
        let db = Database::open_in_memory().unwrap();
        let mut lifecycle = FactLifecycle::new(db, boundary());
        lifecycle
            .create(fact("coding", None, at(10, 10, 0), at(10, 11, 0)))
            .unwrap();
        let err = lifecycle
            .create(fact("coding", None, at(10, 10, 30), at(10, 10, 45)))
            .unwrap_err();
        assert!(matches!(err, TrackError::Conflict { .. }));
    }

    #[test]
    fn lifecycle_with_endpoint_rule_stores_nested_fact() {
        let db = Database::open_in_memory().unwrap();
        let mut lifecycle =
            FactLifecycle::new(db, boundary()).with_overlap_rule(OverlapRule::Endpoints);
        lifecycle
            .create(fact("coding", None, at(10, 10, 0), at(10, 11, 0)))
            .unwrap();
        lifecycle
            .create(fact("coding", None, at(10, 10, 30), at(10, 10, 45)))
            .unwrap();
        assert_eq!(lifecycle.store().fact_spans(None).unwrap().len(), 2);
    }

    #[test]
    fn facts_persist_across_connections() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("tally.db");
        {
            let mut db = Database::open(&path).unwrap();
            db.save_fact(&fact("coding", Some("work"), at(10, 9, 0), at(10, 10, 0)))
                .unwrap();
        }
        let db = Database::open(&path).unwrap();
        let facts = db.list_facts(&FactFilter::default()).unwrap();
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].activity.to_string(), "coding@work");
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("a_b%"), "%a\\_b\\%%");
    }
}
