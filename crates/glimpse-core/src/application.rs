use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A tracked application. Clients only ever see `tracking_id`; `id` stays
/// internal to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Application {
    #[serde(skip_serializing)]
    pub id: Uuid,
    #[serde(rename = "trackingID")]
    pub tracking_id: Uuid,
    #[serde(skip_serializing)]
    pub owner_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Application {
    /// Build a new application owned by `owner_id` with fresh identifiers.
    pub fn new(owner_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tracking_id: Uuid::new_v4(),
            owner_id,
            name: name.into(),
            created_at: Utc::now(),
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }
}
