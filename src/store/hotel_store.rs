//! Trip database access. The `hotels` table is owned by the scraper and is
//! never created here; only its optional `description` column is added.

use rusqlite::{params, Connection, Row};
use tracing::info;

use super::models::Hotel;
use super::{like_pattern, open_connection, StoreError};

const HOTEL_COLUMNS: &str =
    "hotel_id, \"hotelName\", city_id, city_name, \"positionName\", price, \"roomType\", latitude, longitude";

pub struct HotelStore {
    conn: Connection,
}

impl HotelStore {
    pub fn open(path: &str) -> Result<Self, StoreError> {
        Ok(Self { conn: open_connection(path)? })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn has_description_column(&self) -> Result<bool, StoreError> {
        let mut stmt = self.conn.prepare("SELECT name FROM pragma_table_info('hotels')")?;
        let names = stmt.query_map([], |row| row.get::<_, String>(0))?;
        for name in names {
            if name? == "description" {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Add the `description` column to `hotels` if it is missing.
    /// Returns `true` when the column was added.
    pub fn ensure_description_column(&self) -> Result<bool, StoreError> {
        if self.has_description_column()? {
            return Ok(false);
        }
        self.conn.execute_batch("ALTER TABLE hotels ADD COLUMN description TEXT")?;
        info!("Added 'description' column to the 'hotels' table");
        Ok(true)
    }

    /// Hotels ordered by id, at most `limit` of them.
    pub fn fetch_hotels(&self, limit: Option<usize>) -> Result<Vec<Hotel>, StoreError> {
        let with_description = self.has_description_column()?;
        let columns = select_columns(with_description);
        let limit = limit.map(|l| l as i64).unwrap_or(-1);

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM hotels ORDER BY hotel_id LIMIT ?1",
            columns
        ))?;
        let rows = stmt.query_map([limit], |row| hotel_from_row(row, with_description))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn update_hotel(&self, hotel_id: i64, hotel_name: &str, description: &str) -> Result<(), StoreError> {
        let updated = self.conn.execute(
            "UPDATE hotels SET \"hotelName\" = ?1, description = ?2 WHERE hotel_id = ?3",
            params![hotel_name, description, hotel_id],
        )?;

        if updated == 0 {
            return Err(StoreError::NotFound { entity: "Hotel".to_string(), id: hotel_id.to_string() });
        }
        Ok(())
    }

    /// Admin-style search over name, city and nearby position, optionally
    /// restricted to one city.
    pub fn search_hotels(&self, term: Option<&str>, city: Option<&str>) -> Result<Vec<Hotel>, StoreError> {
        let with_description = self.has_description_column()?;
        let pattern = like_pattern(term.unwrap_or(""));

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM hotels
             WHERE (\"hotelName\" LIKE ?1 ESCAPE '\\'
                 OR city_name LIKE ?1 ESCAPE '\\'
                 OR \"positionName\" LIKE ?1 ESCAPE '\\')
               AND (?2 IS NULL OR city_name = ?2)
             ORDER BY hotel_id",
            select_columns(with_description)
        ))?;
        let rows = stmt.query_map(params![pattern, city], |row| hotel_from_row(row, with_description))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn select_columns(with_description: bool) -> String {
    if with_description {
        format!("{}, description", HOTEL_COLUMNS)
    } else {
        HOTEL_COLUMNS.to_string()
    }
}

fn hotel_from_row(row: &Row<'_>, with_description: bool) -> rusqlite::Result<Hotel> {
    Ok(Hotel {
        hotel_id: row.get(0)?,
        hotel_name: row.get(1)?,
        city_id: row.get(2)?,
        city_name: row.get(3)?,
        position_name: row.get(4)?,
        price: row.get(5)?,
        room_type: row.get(6)?,
        latitude: row.get(7)?,
        longitude: row.get(8)?,
        description: if with_description { row.get(9)? } else { None },
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const CREATE_HOTELS: &str = "CREATE TABLE hotels (
        hotel_id INTEGER PRIMARY KEY,
        \"hotelName\" VARCHAR(255),
        city_id INTEGER,
        city_name VARCHAR(255),
        \"positionName\" VARCHAR(255),
        price DECIMAL,
        \"roomType\" VARCHAR(255),
        latitude DECIMAL,
        longitude DECIMAL
    )";

    pub(crate) fn seeded_store() -> HotelStore {
        let store = HotelStore::open(":memory:").unwrap();
        store.connection().execute_batch(CREATE_HOTELS).unwrap();
        store.connection().execute_batch(
            "INSERT INTO hotels VALUES (1, 'Original Hotel Name', 1, 'Test City', 'Downtown', 199.99, 'Deluxe', 40.7128, -74.0060);
             INSERT INTO hotels VALUES (2, 'Harbor View', 2, 'Port Town', 'Marina', NULL, NULL, NULL, NULL);
             INSERT INTO hotels VALUES (3, 'City Lodge', 1, 'Test City', 'Old Town', 89.5, 'Twin', NULL, NULL);"
        ).unwrap();
        store
    }

    #[test]
    fn test_fetch_hotels_respects_limit() {
        let store = seeded_store();

        let hotels = store.fetch_hotels(Some(2)).unwrap();
        assert_eq!(hotels.len(), 2);
        assert_eq!(hotels[0].hotel_id, 1);
        assert_eq!(hotels[0].price, Some(199.99));
        assert_eq!(hotels[1].room_type, None);

        assert_eq!(store.fetch_hotels(None).unwrap().len(), 3);
    }

    #[test]
    fn test_ensure_description_column_once() {
        let store = seeded_store();
        assert!(!store.has_description_column().unwrap());

        assert!(store.ensure_description_column().unwrap());
        assert!(!store.ensure_description_column().unwrap());
        assert!(store.has_description_column().unwrap());
    }

    #[test]
    fn test_update_hotel() {
        let store = seeded_store();
        store.ensure_description_column().unwrap();

        store.update_hotel(1, "Grand Test Hotel", "Luxurious downtown hotel.").unwrap();

        let hotel = &store.fetch_hotels(Some(1)).unwrap()[0];
        assert_eq!(hotel.hotel_name, "Grand Test Hotel");
        assert_eq!(hotel.description.as_deref(), Some("Luxurious downtown hotel."));

        assert!(matches!(store.update_hotel(42, "x", "y"), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_search_hotels_with_city_filter() {
        let store = seeded_store();

        assert_eq!(store.search_hotels(Some("town"), None).unwrap().len(), 3);
        assert_eq!(store.search_hotels(Some("town"), Some("Test City")).unwrap().len(), 2);
        assert_eq!(store.search_hotels(Some("Harbor"), None).unwrap()[0].hotel_id, 2);
        assert!(store.search_hotels(Some("nowhere"), None).unwrap().is_empty());
    }
}
