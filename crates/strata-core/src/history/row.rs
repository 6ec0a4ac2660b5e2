//! Snapshots read back from shadow tables.

use chrono::{DateTime, Utc};

use super::{CREATED_AT, DELETED_AT};
use crate::error::{StrataError, StrataResult};
use crate::types::{Row, Value};

/// One version of an entity and the interval during which it was current.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    /// Identifier of the entity this version belongs to.
    pub id: Value,
    /// Column values of the version, temporal columns excluded.
    pub values: Row,
    /// Start of the validity interval (inclusive).
    pub created_at: DateTime<Utc>,
    /// End of the validity interval (exclusive); `None` while current.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl HistoryRow {
    /// Split a shadow-table row into values and validity interval.
    pub fn from_row(row: Row, id_field: &str) -> StrataResult<Self> {
        let id = row
            .get(id_field)
            .cloned()
            .ok_or_else(|| StrataError::missing_field(id_field))?;
        let created_at = row
            .get(CREATED_AT)
            .ok_or_else(|| StrataError::missing_field(CREATED_AT))?
            .as_timestamp()?
            .ok_or_else(|| StrataError::missing_field(CREATED_AT))?;
        let deleted_at = match row.get(DELETED_AT) {
            Some(v) => v.as_timestamp()?,
            None => None,
        };

        let mut values = Row::new();
        for (column, value) in row.iter() {
            if column != CREATED_AT && column != DELETED_AT {
                values.push(column, value.clone());
            }
        }

        Ok(Self {
            id,
            values,
            created_at,
            deleted_at,
        })
    }

    /// Whether this is the currently-open version.
    pub fn is_open(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Whether `instant` falls in `[created_at, deleted_at)`.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.created_at <= instant && self.deleted_at.map_or(true, |end| end > instant)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::format_timestamp;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_from_shadow_row() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let t1 = t0 + Duration::hours(1);
        let row = Row::new()
            .with("id", 1i64)
            .with("name", "a")
            .with(CREATED_AT, format_timestamp(&t0))
            .with(DELETED_AT, format_timestamp(&t1));

        let version = HistoryRow::from_row(row, "id").unwrap();
        assert_eq!(version.id, Value::from(1i64));
        assert_eq!(version.get("name"), Some(&Value::from("a")));
        assert!(version.get(CREATED_AT).is_none());
        assert!(!version.is_open());

        assert!(version.contains(t0));
        assert!(version.contains(t1 - Duration::microseconds(1)));
        assert!(!version.contains(t1));
        assert!(!version.contains(t0 - Duration::seconds(1)));
    }

    #[test]
    fn test_open_row() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let row = Row::new()
            .with("id", 1i64)
            .with(CREATED_AT, Value::Timestamp(t0))
            .with(DELETED_AT, Value::Null);

        let version = HistoryRow::from_row(row, "id").unwrap();
        assert!(version.is_open());
        assert!(version.contains(t0 + Duration::days(365)));
    }

    #[test]
    fn test_missing_created_at() {
        let row = Row::new().with("id", 1i64);
        assert!(HistoryRow::from_row(row, "id").is_err());
    }
}
