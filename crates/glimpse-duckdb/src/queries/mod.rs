//! Report queries over the `events` table.

pub mod dimensions;
pub mod timeseries;

use duckdb::types::ToSql;
use uuid::Uuid;

use glimpse_core::window::TimeRange;

use crate::backend::bind_timestamp;

/// `WHERE` clause shared by every report: one app, one time range. The upper
/// bound is only emitted for closed ranges.
pub(crate) struct RangeFilter {
    pub sql: String,
    pub params: Vec<Box<dyn ToSql>>,
}

impl RangeFilter {
    pub(crate) fn new(tracking_id: Uuid, range: &TimeRange) -> Self {
        let mut sql = String::from("tracking_id = ?1 AND created_at >= CAST(?2 AS TIMESTAMP)");
        let mut params: Vec<Box<dyn ToSql>> = vec![
            Box::new(tracking_id.to_string()),
            Box::new(bind_timestamp(&range.start)),
        ];
        if let Some(end) = range.end {
            sql.push_str(" AND created_at < CAST(?3 AS TIMESTAMP)");
            params.push(Box::new(bind_timestamp(&end)));
        }
        Self { sql, params }
    }

    pub(crate) fn param_refs(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}
