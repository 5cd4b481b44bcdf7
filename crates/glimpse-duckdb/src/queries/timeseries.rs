use anyhow::Result;
use uuid::Uuid;

use glimpse_core::store::{BucketCount, SeriesMeasure};
use glimpse_core::window::{BucketSize, TimeRange};

use super::RangeFilter;
use crate::backend::read_timestamp;
use crate::DuckDbBackend;

fn measure_sql(measure: SeriesMeasure) -> &'static str {
    match measure {
        SeriesMeasure::DistinctVisitors => "COUNT(DISTINCT visitor_id)",
        SeriesMeasure::Views => "COUNT(url)",
    }
}

impl DuckDbBackend {
    /// Per-bucket counts ordered by bucket start. Buckets without events are
    /// not returned.
    pub async fn bucketed_counts(
        &self,
        tracking_id: Uuid,
        range: &TimeRange,
        bucket: BucketSize,
        measure: SeriesMeasure,
    ) -> Result<Vec<BucketCount>> {
        let conn = self.conn.lock().await;
        let filter = RangeFilter::new(tracking_id, range);
        let sql = format!(
            r#"
            SELECT
                CAST(date_trunc('{unit}', created_at) AS VARCHAR) AS bucket,
                {value} AS value
            FROM events
            WHERE {range_sql}
            GROUP BY 1
            HAVING {value} > 0
            ORDER BY 1
            "#,
            unit = bucket.trunc_unit(),
            value = measure_sql(measure),
            range_sql = filter.sql,
        );

        let param_refs = filter.param_refs();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), |row| {
            let bucket: String = row.get(0)?;
            let value: i64 = row.get(1)?;
            Ok((bucket, value))
        })?;

        let mut series = Vec::new();
        for row in rows {
            let (bucket, value) = row?;
            series.push(BucketCount {
                bucket: read_timestamp(&bucket)?,
                value,
            });
        }
        Ok(series)
    }
}
