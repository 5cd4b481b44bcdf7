use async_trait::async_trait;
use uuid::Uuid;

use glimpse_core::application::Application;
use glimpse_core::event::Event;
use glimpse_core::store::{BucketCount, Dimension, EventStore, GroupCount, SeriesMeasure};
use glimpse_core::window::{BucketSize, TimeRange};

use crate::DuckDbBackend;

#[async_trait]
impl EventStore for DuckDbBackend {
    async fn upsert_user(&self, email: &str) -> anyhow::Result<Uuid> {
        DuckDbBackend::upsert_user(self, email).await
    }

    async fn find_app_by_tracking_id(
        &self,
        tracking_id: Uuid,
    ) -> anyhow::Result<Option<Application>> {
        DuckDbBackend::find_app_by_tracking_id(self, tracking_id).await
    }

    async fn find_app_by_owner_and_name(
        &self,
        owner_id: Uuid,
        name: &str,
    ) -> anyhow::Result<Option<Application>> {
        DuckDbBackend::find_app_by_owner_and_name(self, owner_id, name).await
    }

    async fn insert_app(&self, app: &Application) -> anyhow::Result<bool> {
        DuckDbBackend::insert_app(self, app).await
    }

    async fn list_apps(&self, owner_id: Uuid) -> anyhow::Result<Vec<Application>> {
        DuckDbBackend::list_apps(self, owner_id).await
    }

    async fn rename_app(&self, tracking_id: Uuid, name: &str) -> anyhow::Result<bool> {
        DuckDbBackend::rename_app(self, tracking_id, name).await
    }

    async fn delete_app(&self, tracking_id: Uuid) -> anyhow::Result<()> {
        DuckDbBackend::delete_app(self, tracking_id).await
    }

    async fn insert_event(&self, event: &Event) -> anyhow::Result<()> {
        DuckDbBackend::insert_event(self, event).await
    }

    async fn count_distinct_visitors(
        &self,
        tracking_id: Uuid,
        dimension: Dimension,
        range: &TimeRange,
    ) -> anyhow::Result<Vec<GroupCount>> {
        DuckDbBackend::count_distinct_visitors(self, tracking_id, dimension, range).await
    }

    async fn bucketed_counts(
        &self,
        tracking_id: Uuid,
        range: &TimeRange,
        bucket: BucketSize,
        measure: SeriesMeasure,
    ) -> anyhow::Result<Vec<BucketCount>> {
        DuckDbBackend::bucketed_counts(self, tracking_id, range, bucket, measure).await
    }
}
