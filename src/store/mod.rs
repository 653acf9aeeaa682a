pub mod models;
pub mod property_store;
pub mod hotel_store;

pub use models::{Hotel, Property, PropertyRatingReview, PropertySummary};
pub use property_store::PropertyStore;
pub use hotel_store::HotelStore;

use rusqlite::Connection;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{entity} not found with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },
}

/// Open a SQLite connection; `:memory:` opens an in-memory database.
pub fn open_connection(path: &str) -> Result<Connection, StoreError> {
    let conn = if path == ":memory:" {
        Connection::open_in_memory()?
    } else {
        Connection::open(path)?
    };
    debug!("Opened SQLite database: {}", path);
    Ok(conn)
}

/// Escape `%`, `_` and `\` for use inside a LIKE pattern.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Sea"), "%Sea%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_open_in_memory() {
        let conn = open_connection(":memory:").unwrap();
        let one: i64 = conn.query_row("SELECT 1", [], |row| row.get(0)).unwrap();
        assert_eq!(one, 1);
    }
}
