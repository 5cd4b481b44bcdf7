//! Storage abstraction consumed by the ingestion pipeline, the access guard
//! and the analytics engine.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::application::Application;
use crate::event::Event;
use crate::window::{BucketSize, TimeRange};

/// Event columns that grouped reports aggregate over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Referrer,
    /// Pageview URLs. Only `pageview` events with a non-null url count.
    Page,
    Browser,
    Country,
    Device,
    OperatingSystem,
}

impl Dimension {
    pub fn column(self) -> &'static str {
        match self {
            Dimension::Referrer => "referrer",
            Dimension::Page => "url",
            Dimension::Browser => "browser",
            Dimension::Country => "country",
            Dimension::Device => "device",
            Dimension::OperatingSystem => "operating_system",
        }
    }
}

/// What a time-series bucket counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesMeasure {
    /// Distinct visitor ids across all events.
    DistinctVisitors,
    /// Events with a non-null url.
    Views,
}

/// One group of a grouped count-distinct query. Rows where the grouped
/// column is null (direct traffic, non-page events) never form a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCount {
    pub value: String,
    pub visitors: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketCount {
    pub bucket: DateTime<Utc>,
    pub value: i64,
}

#[async_trait::async_trait]
pub trait EventStore: Send + Sync + 'static {
    /// Insert the user if the email is new; return its id either way.
    async fn upsert_user(&self, email: &str) -> anyhow::Result<Uuid>;

    async fn find_app_by_tracking_id(&self, tracking_id: Uuid)
        -> anyhow::Result<Option<Application>>;

    async fn find_app_by_owner_and_name(
        &self,
        owner_id: Uuid,
        name: &str,
    ) -> anyhow::Result<Option<Application>>;

    /// Insert `app` unless the owner already has an app with that name.
    /// Returns `false` on a name clash. The check and the insert are atomic.
    async fn insert_app(&self, app: &Application) -> anyhow::Result<bool>;

    /// Applications owned by `owner_id`, oldest first.
    async fn list_apps(&self, owner_id: Uuid) -> anyhow::Result<Vec<Application>>;

    /// Rename the app. Returns `false` when another app of the same owner
    /// already carries `name`. The check and the update are atomic.
    async fn rename_app(&self, tracking_id: Uuid, name: &str) -> anyhow::Result<bool>;

    /// Delete the app and all of its events in one transaction.
    async fn delete_app(&self, tracking_id: Uuid) -> anyhow::Result<()>;

    async fn insert_event(&self, event: &Event) -> anyhow::Result<()>;

    /// Distinct visitors per value of `dimension`, ordered by visitor count
    /// descending then value ascending.
    async fn count_distinct_visitors(
        &self,
        tracking_id: Uuid,
        dimension: Dimension,
        range: &TimeRange,
    ) -> anyhow::Result<Vec<GroupCount>>;

    /// Per-bucket counts ordered by bucket start. Empty buckets are omitted.
    async fn bucketed_counts(
        &self,
        tracking_id: Uuid,
        range: &TimeRange,
        bucket: BucketSize,
        measure: SeriesMeasure,
    ) -> anyhow::Result<Vec<BucketCount>>;
}
