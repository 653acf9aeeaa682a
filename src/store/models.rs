use serde::{Deserialize, Serialize};
use std::fmt;

/// A row of the `rewrite_property_info` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: i64,
    pub original_id: i64,
    pub original_title: String,
    pub rewritten_title: String,
    pub description: String,
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.original_title, self.rewritten_title)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySummary {
    pub property_id: i64,
    pub summary: String,
}

impl fmt::Display for PropertySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Summary for Property {}", self.property_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRatingReview {
    pub property_id: i64,
    pub rating: f64,
    pub review: String,
}

impl fmt::Display for PropertyRatingReview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rating and Review for Property {}", self.property_id)
    }
}

/// A scraped hotel from the trip database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    pub hotel_id: i64,
    pub hotel_name: String,
    pub city_id: i64,
    pub city_name: String,
    pub position_name: String,
    pub price: Option<f64>,
    pub room_type: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub description: Option<String>,
}

impl fmt::Display for Hotel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.hotel_name, self.city_name)
    }
}
