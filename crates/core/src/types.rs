/// All primary keys in the notification schema are UUIDs, supplied by the
/// caller on insert.
pub type DbId = uuid::Uuid;

/// Alert identifiers are integers assigned by the alert engine.
pub type AlertId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
