use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type the tracker script sends for page loads and history navigation.
pub const PAGEVIEW: &str = "pageview";

/// Free-form key/value payload attached to an event by the client.
pub type EventDetails = serde_json::Map<String, serde_json::Value>;

/// The `tracking` block of a beacon, as serialized by the tracker script.
///
/// Wire names are camelCase with an upper-case `ID` suffix (`visitorID`,
/// `trackingID`). `country` is accepted for compatibility with older trackers
/// but is always overwritten by the server-side GeoIP result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingData {
    #[serde(rename = "visitorID", alias = "visitorId")]
    pub visitor_id: String,
    #[serde(rename = "trackingID", alias = "trackingId")]
    pub tracking_id: Uuid,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub ua: String,
    #[serde(default)]
    pub details: Option<EventDetails>,
}

/// The decoded beacon payload sent to `GET /analytics/track?data=...`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPayload {
    pub tracking: TrackingData,
    #[serde(rename = "type")]
    pub event_type: String,
}

/// The enriched, stored version of an event. Mirrors the `events` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub tracking_id: Uuid,
    pub visitor_id: String,
    pub event_type: String,
    pub url: Option<String>,
    pub referrer: Option<String>,
    pub country: String,
    pub browser: String,
    pub device: String,
    pub operating_system: String,
    pub details: EventDetails,
    pub timestamp: DateTime<Utc>,
}

/// Treat an empty or whitespace-only optional string as absent.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
