//! Application database: rewritten properties, summaries, ratings and reviews.

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use super::models::{Property, PropertyRatingReview, PropertySummary};
use super::{like_pattern, open_connection, StoreError};

const MIGRATIONS: &[(i64, &str)] = &[
    (1, "CREATE TABLE IF NOT EXISTS rewrite_property_info (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            original_id INTEGER NOT NULL DEFAULT 0,
            original_title TEXT NOT NULL DEFAULT 'Unknown',
            rewritten_title TEXT NOT NULL DEFAULT 'Not rewritten',
            description TEXT NOT NULL DEFAULT 'Not rewritten'
        );
        CREATE TABLE IF NOT EXISTS properties_propertysummary (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            property_id INTEGER NOT NULL UNIQUE,
            summary TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS properties_propertyratingreview (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            property_id INTEGER NOT NULL UNIQUE,
            rating REAL NOT NULL,
            review TEXT NOT NULL
        );"),
    (2, "CREATE INDEX IF NOT EXISTS idx_rewrite_property_info_original_id
            ON rewrite_property_info (original_id);"),
];

pub struct PropertyStore {
    conn: Connection,
}

impl PropertyStore {
    /// Open the database at `path` and bring its schema up to date.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = open_connection(path)?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::open(":memory:")
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn create_property(
        &self,
        original_id: i64,
        original_title: &str,
        rewritten_title: &str,
        description: &str,
    ) -> Result<Property, StoreError> {
        self.conn.execute(
            "INSERT INTO rewrite_property_info (original_id, original_title, rewritten_title, description)
             VALUES (?1, ?2, ?3, ?4)",
            params![original_id, original_title, rewritten_title, description],
        )?;

        Ok(Property {
            id: self.conn.last_insert_rowid(),
            original_id,
            original_title: original_title.to_string(),
            rewritten_title: rewritten_title.to_string(),
            description: description.to_string(),
        })
    }

    /// First property (lowest id) created for the given hotel.
    pub fn find_property_by_original_id(&self, original_id: i64) -> Result<Option<Property>, StoreError> {
        let property = self.conn.query_row(
            "SELECT id, original_id, original_title, rewritten_title, description
             FROM rewrite_property_info
             WHERE original_id = ?1
             ORDER BY id ASC
             LIMIT 1",
            [original_id],
            property_from_row,
        ).optional()?;
        Ok(property)
    }

    pub fn update_property_content(
        &self,
        id: i64,
        rewritten_title: &str,
        description: &str,
    ) -> Result<(), StoreError> {
        let updated = self.conn.execute(
            "UPDATE rewrite_property_info SET rewritten_title = ?1, description = ?2 WHERE id = ?3",
            params![rewritten_title, description, id],
        )?;

        if updated == 0 {
            return Err(StoreError::NotFound { entity: "Property".to_string(), id: id.to_string() });
        }
        Ok(())
    }

    pub fn count_properties(&self) -> Result<i64, StoreError> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM rewrite_property_info",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn upsert_summary(&self, property_id: i64, summary: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO properties_propertysummary (property_id, summary) VALUES (?1, ?2)
             ON CONFLICT(property_id) DO UPDATE SET summary = excluded.summary",
            params![property_id, summary],
        )?;
        Ok(())
    }

    pub fn get_summary(&self, property_id: i64) -> Result<Option<PropertySummary>, StoreError> {
        let summary = self.conn.query_row(
            "SELECT property_id, summary FROM properties_propertysummary WHERE property_id = ?1",
            [property_id],
            |row| Ok(PropertySummary { property_id: row.get(0)?, summary: row.get(1)? }),
        ).optional()?;
        Ok(summary)
    }

    pub fn upsert_rating_review(&self, property_id: i64, rating: f64, review: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO properties_propertyratingreview (property_id, rating, review) VALUES (?1, ?2, ?3)
             ON CONFLICT(property_id) DO UPDATE SET rating = excluded.rating, review = excluded.review",
            params![property_id, rating, review],
        )?;
        Ok(())
    }

    pub fn get_rating_review(&self, property_id: i64) -> Result<Option<PropertyRatingReview>, StoreError> {
        let review = self.conn.query_row(
            "SELECT property_id, rating, review FROM properties_propertyratingreview WHERE property_id = ?1",
            [property_id],
            rating_review_from_row,
        ).optional()?;
        Ok(review)
    }

    /// Summaries whose property id contains `term`; all summaries when `term` is `None`.
    pub fn search_summaries(&self, term: Option<&str>) -> Result<Vec<PropertySummary>, StoreError> {
        let pattern = like_pattern(term.unwrap_or(""));
        let mut stmt = self.conn.prepare(
            "SELECT property_id, summary FROM properties_propertysummary
             WHERE CAST(property_id AS TEXT) LIKE ?1 ESCAPE '\\'
             ORDER BY property_id",
        )?;
        let rows = stmt.query_map([pattern], |row| {
            Ok(PropertySummary { property_id: row.get(0)?, summary: row.get(1)? })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Rating reviews whose property id or rating contains `term`.
    pub fn search_rating_reviews(&self, term: Option<&str>) -> Result<Vec<PropertyRatingReview>, StoreError> {
        let pattern = like_pattern(term.unwrap_or(""));
        let mut stmt = self.conn.prepare(
            "SELECT property_id, rating, review FROM properties_propertyratingreview
             WHERE CAST(property_id AS TEXT) LIKE ?1 ESCAPE '\\'
                OR CAST(rating AS TEXT) LIKE ?1 ESCAPE '\\'
             ORDER BY property_id",
        )?;
        let rows = stmt.query_map([pattern], rating_review_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn property_from_row(row: &Row<'_>) -> rusqlite::Result<Property> {
    Ok(Property {
        id: row.get(0)?,
        original_id: row.get(1)?,
        original_title: row.get(2)?,
        rewritten_title: row.get(3)?,
        description: row.get(4)?,
    })
}

fn rating_review_from_row(row: &Row<'_>) -> rusqlite::Result<PropertyRatingReview> {
    Ok(PropertyRatingReview {
        property_id: row.get(0)?,
        rating: row.get(1)?,
        review: row.get(2)?,
    })
}

fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
    )?;

    let current_version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    for (version, sql) in MIGRATIONS {
        if *version > current_version {
            info!("Running migration v{}", version);
            conn.execute_batch(sql).map_err(|e| StoreError::MigrationFailed {
                version: *version,
                reason: e.to_string(),
            })?;
            conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_creation() {
        let store = PropertyStore::in_memory().unwrap();
        let property = store.create_property(999, "Unknown", "Test Property", "Test Description").unwrap();

        assert_eq!(store.count_properties().unwrap(), 1);
        assert_eq!(property.rewritten_title, "Test Property");
    }

    #[test]
    fn test_column_defaults() {
        let store = PropertyStore::in_memory().unwrap();
        store.connection()
            .execute("INSERT INTO rewrite_property_info DEFAULT VALUES", [])
            .unwrap();

        let property = store.find_property_by_original_id(0).unwrap().unwrap();
        assert_eq!(property.original_title, "Unknown");
        assert_eq!(property.rewritten_title, "Not rewritten");
        assert_eq!(property.description, "Not rewritten");
    }

    #[test]
    fn test_update_property_content() {
        let store = PropertyStore::in_memory().unwrap();
        let property = store.create_property(1, "Old", "Original Title", "Original Description").unwrap();

        store.update_property_content(property.id, "New Title", "New Description").unwrap();

        let updated = store.find_property_by_original_id(1).unwrap().unwrap();
        assert_eq!(updated.rewritten_title, "New Title");
        assert_eq!(updated.description, "New Description");

        let missing = store.update_property_content(property.id + 100, "x", "y");
        assert!(matches!(missing, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_upsert_summary_replaces_existing() {
        let store = PropertyStore::in_memory().unwrap();
        store.upsert_summary(5, "first").unwrap();
        store.upsert_summary(5, "second").unwrap();

        let summary = store.get_summary(5).unwrap().unwrap();
        assert_eq!(summary.summary, "second");
        assert_eq!(store.search_summaries(None).unwrap().len(), 1);
    }

    #[test]
    fn test_upsert_rating_review() {
        let store = PropertyStore::in_memory().unwrap();
        store.upsert_rating_review(5, 4.5, "Great").unwrap();
        store.upsert_rating_review(5, 3.0, "Fine").unwrap();

        let review = store.get_rating_review(5).unwrap().unwrap();
        assert_eq!(review.rating, 3.0);
        assert_eq!(review.review, "Fine");
        assert!(store.get_rating_review(6).unwrap().is_none());
    }

    #[test]
    fn test_search_rating_reviews_by_id_or_rating() {
        let store = PropertyStore::in_memory().unwrap();
        store.upsert_rating_review(12, 4.5, "Great").unwrap();
        store.upsert_rating_review(30, 3.5, "Fine").unwrap();

        assert_eq!(store.search_rating_reviews(Some("12")).unwrap().len(), 1);
        assert_eq!(store.search_rating_reviews(Some("3.5")).unwrap()[0].property_id, 30);
        assert_eq!(store.search_rating_reviews(None).unwrap().len(), 2);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("default.sqlite3");
        let path = path.to_str().unwrap();

        PropertyStore::open(path).unwrap().upsert_summary(1, "kept").unwrap();
        let reopened = PropertyStore::open(path).unwrap();

        assert_eq!(reopened.get_summary(1).unwrap().unwrap().summary, "kept");
        let version: i64 = reopened.connection()
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, 2);
    }
}
