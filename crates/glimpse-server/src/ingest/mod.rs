//! Beacon ingestion: decode, validate, enrich, store.

pub mod agent;
pub mod geo;

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use glimpse_core::event::{non_empty, Event, EventPayload};
use glimpse_core::store::EventStore;

use self::agent::AgentClassifier;
use self::geo::GeoResolver;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("data is not valid base64")]
    InvalidEncoding,

    #[error("invalid event payload: {0}")]
    InvalidPayload(String),

    #[error("failed to resolve location: {0}")]
    GeoResolutionFailed(#[source] geo::GeoError),

    #[error("unknown tracking id {0}")]
    UnknownApplication(Uuid),

    #[error("failed to store event: {0}")]
    StorageFailure(#[source] anyhow::Error),
}

pub struct IngestionPipeline {
    store: Arc<dyn EventStore>,
    geo: Arc<dyn GeoResolver>,
    agents: Arc<dyn AgentClassifier>,
}

impl IngestionPipeline {
    pub fn new(
        store: Arc<dyn EventStore>,
        geo: Arc<dyn GeoResolver>,
        agents: Arc<dyn AgentClassifier>,
    ) -> Self {
        Self { store, geo, agents }
    }

    /// Turn an encoded beacon into a stored, enriched [`Event`].
    ///
    /// Nothing is written unless every earlier step succeeds.
    #[tracing::instrument(skip(self, encoded))]
    pub async fn ingest(&self, encoded: &str, caller_ip: &str) -> Result<Event, IngestError> {
        let payload = decode_payload(encoded)?;
        let tracking = payload.tracking;

        let location = self
            .geo
            .resolve(caller_ip)
            .map_err(IngestError::GeoResolutionFailed)?;

        let app = self
            .store
            .find_app_by_tracking_id(tracking.tracking_id)
            .await
            .map_err(IngestError::StorageFailure)?;
        if app.is_none() {
            return Err(IngestError::UnknownApplication(tracking.tracking_id));
        }

        let agent = self.agents.classify(&tracking.ua);

        let event = Event {
            id: Uuid::new_v4(),
            tracking_id: tracking.tracking_id,
            visitor_id: tracking.visitor_id,
            event_type: payload.event_type,
            url: non_empty(tracking.url),
            referrer: non_empty(tracking.referrer),
            country: location.country,
            browser: agent.browser,
            device: agent.device,
            operating_system: agent.operating_system,
            details: tracking.details.unwrap_or_default(),
            timestamp: Utc::now(),
        };

        self.store
            .insert_event(&event)
            .await
            .map_err(IngestError::StorageFailure)?;

        tracing::info!(
            tracking_id = %event.tracking_id,
            event_type = %event.event_type,
            "event ingested"
        );
        Ok(event)
    }
}

/// Base64 → JSON → validated payload.
///
/// A raw `btoa` string placed in a query string without escaping has its `+`
/// turned into a space by form decoding, so spaces are read back as `+`.
pub fn decode_payload(encoded: &str) -> Result<EventPayload, IngestError> {
    let normalized = encoded.trim().replace(' ', "+");
    let bytes = STANDARD
        .decode(normalized.as_bytes())
        .map_err(|_| IngestError::InvalidEncoding)?;
    let payload: EventPayload = serde_json::from_slice(&bytes)
        .map_err(|e| IngestError::InvalidPayload(e.to_string()))?;

    if payload.tracking.visitor_id.trim().is_empty() {
        return Err(IngestError::InvalidPayload(
            "visitorID must not be empty".to_string(),
        ));
    }
    if payload.event_type.trim().is_empty() {
        return Err(IngestError::InvalidPayload("type must not be empty".to_string()));
    }
    if let Some(url) = payload.tracking.url.as_deref().filter(|u| !u.trim().is_empty()) {
        url::Url::parse(url.trim())
            .map_err(|e| IngestError::InvalidPayload(format!("url {url:?} is invalid: {e}")))?;
    }
    Ok(payload)
}
