use anyhow::Result;
use uuid::Uuid;

use glimpse_core::event::PAGEVIEW;
use glimpse_core::store::{Dimension, GroupCount};
use glimpse_core::window::TimeRange;

use super::RangeFilter;
use crate::DuckDbBackend;

impl DuckDbBackend {
    /// Distinct visitors per value of `dimension`. Null values never form a
    /// group. Ordered by visitors descending, then value ascending.
    pub async fn count_distinct_visitors(
        &self,
        tracking_id: Uuid,
        dimension: Dimension,
        range: &TimeRange,
    ) -> Result<Vec<GroupCount>> {
        // Boxed params are not Send; build them only once the lock is held.
        let conn = self.conn.lock().await;
        let mut filter = RangeFilter::new(tracking_id, range);
        let column = dimension.column();

        // Only pageviews contribute to the pages report.
        let mut extra = String::new();
        if dimension == Dimension::Page {
            extra.push_str(&format!(" AND event_type = ?{}", filter.params.len() + 1));
            filter.params.push(Box::new(PAGEVIEW.to_string()));
        }

        let sql = format!(
            r#"
            SELECT
                {column} AS value,
                COUNT(DISTINCT visitor_id) AS visitors
            FROM events
            WHERE {range_sql}
              AND {column} IS NOT NULL
              {extra}
            GROUP BY {column}
            ORDER BY visitors DESC, value ASC
            "#,
            range_sql = filter.sql,
        );

        let param_refs = filter.param_refs();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), |row| {
            Ok(GroupCount {
                value: row.get(0)?,
                visitors: row.get(1)?,
            })
        })?;

        let mut groups = Vec::new();
        for row in rows {
            groups.push(row?);
        }
        Ok(groups)
    }
}
