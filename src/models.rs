use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Heading stored when a paste is submitted without one.
pub const DEFAULT_HEADING: &str = "My Paste";

#[derive(Debug, Clone, FromRow)]
pub struct Paste {
    pub key: String,
    pub data: String,
    pub heading: String,
    pub created_at: DateTime<Utc>,
    pub ip_address: String,
    pub open_count: i64,
}
