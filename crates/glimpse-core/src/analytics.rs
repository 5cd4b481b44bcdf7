//! Report derivation over an [`EventStore`].
//!
//! Every report issues exactly one store query and derives its statistics in
//! memory: percentage shares, URL path normalization, and series labels.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use crate::error::QueryError;
use crate::store::{Dimension, EventStore, GroupCount, SeriesMeasure};
use crate::window::RequestWindow;

/// Base used to resolve stored page URLs that carry no scheme or host.
const RELATIVE_URL_BASE: &str = "http://localhost";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferralStats {
    pub referrer: String,
    pub visitor_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageStats {
    pub path: String,
    pub visitor_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrowserStats {
    pub browser: String,
    pub percentage: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryStats {
    pub country: String,
    pub percentage: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceStats {
    pub device: String,
    pub percentage: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OsStats {
    #[serde(rename = "operating_system")]
    pub os: String,
    pub percentage: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitorStats {
    pub time: DateTime<Utc>,
    pub visitors: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageViewStats {
    pub time: DateTime<Utc>,
    pub views: i64,
}

pub struct AnalyticsEngine {
    store: Arc<dyn EventStore>,
}

impl AnalyticsEngine {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    pub async fn get_referrals(
        &self,
        window: &RequestWindow,
    ) -> Result<Vec<ReferralStats>, QueryError> {
        let groups = self.groups(window, Dimension::Referrer).await?;
        Ok(groups
            .into_iter()
            .map(|g| ReferralStats {
                referrer: g.value,
                visitor_count: g.visitors,
            })
            .collect())
    }

    /// Distinct visitors per page. Different URLs sharing a path stay separate
    /// rows, one per stored URL.
    pub async fn get_pages(&self, window: &RequestWindow) -> Result<Vec<PageStats>, QueryError> {
        let groups = self.groups(window, Dimension::Page).await?;
        groups
            .into_iter()
            .map(|g| {
                Ok(PageStats {
                    path: page_path(&g.value)?,
                    visitor_count: g.visitors,
                })
            })
            .collect()
    }

    pub async fn get_browsers(
        &self,
        window: &RequestWindow,
    ) -> Result<Vec<BrowserStats>, QueryError> {
        let groups = self.groups(window, Dimension::Browser).await?;
        Ok(percentage_shares(groups)
            .into_iter()
            .map(|(browser, percentage)| BrowserStats {
                browser,
                percentage,
            })
            .collect())
    }

    pub async fn get_countries(
        &self,
        window: &RequestWindow,
    ) -> Result<Vec<CountryStats>, QueryError> {
        let groups = self.groups(window, Dimension::Country).await?;
        Ok(percentage_shares(groups)
            .into_iter()
            .map(|(country, percentage)| CountryStats {
                country,
                percentage,
            })
            .collect())
    }

    pub async fn get_devices(&self, window: &RequestWindow) -> Result<Vec<DeviceStats>, QueryError> {
        let groups = self.groups(window, Dimension::Device).await?;
        Ok(percentage_shares(groups)
            .into_iter()
            .map(|(device, percentage)| DeviceStats { device, percentage })
            .collect())
    }

    pub async fn get_operating_systems(
        &self,
        window: &RequestWindow,
    ) -> Result<Vec<OsStats>, QueryError> {
        let groups = self.groups(window, Dimension::OperatingSystem).await?;
        Ok(percentage_shares(groups)
            .into_iter()
            .map(|(os, percentage)| OsStats { os, percentage })
            .collect())
    }

    pub async fn get_visitors(
        &self,
        window: &RequestWindow,
    ) -> Result<Vec<VisitorStats>, QueryError> {
        let rows = self
            .store
            .bucketed_counts(
                window.tracking_id(),
                &window.time_range(Utc::now()),
                window.bucket(),
                SeriesMeasure::DistinctVisitors,
            )
            .await
            .map_err(QueryError::QueryFailed)?;
        Ok(rows
            .into_iter()
            .map(|r| VisitorStats {
                time: r.bucket,
                visitors: r.value,
            })
            .collect())
    }

    pub async fn get_page_views(
        &self,
        window: &RequestWindow,
    ) -> Result<Vec<PageViewStats>, QueryError> {
        let rows = self
            .store
            .bucketed_counts(
                window.tracking_id(),
                &window.time_range(Utc::now()),
                window.bucket(),
                SeriesMeasure::Views,
            )
            .await
            .map_err(QueryError::QueryFailed)?;
        Ok(rows
            .into_iter()
            .map(|r| PageViewStats {
                time: r.bucket,
                views: r.value,
            })
            .collect())
    }

    async fn groups(
        &self,
        window: &RequestWindow,
        dimension: Dimension,
    ) -> Result<Vec<GroupCount>, QueryError> {
        self.store
            .count_distinct_visitors(
                window.tracking_id(),
                dimension,
                &window.time_range(Utc::now()),
            )
            .await
            .map_err(|e| {
                tracing::warn!(?dimension, error = %e, "grouped analytics query failed");
                QueryError::QueryFailed(e)
            })
    }
}

/// Reduce a stored page URL to its path. An empty path becomes `/`.
pub fn page_path(raw: &str) -> Result<String, QueryError> {
    let parsed = match Url::parse(raw) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(RELATIVE_URL_BASE)
            .and_then(|base| base.join(raw))
            .map_err(|source| QueryError::MalformedStoredUrl {
                url: raw.to_string(),
                source,
            })?,
        Err(source) => {
            return Err(QueryError::MalformedStoredUrl {
                url: raw.to_string(),
                source,
            })
        }
    };
    let path = parsed.path();
    Ok(if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    })
}

/// Convert distinct-visitor groups into rounded percentage shares of the
/// summed group counts, highest share first. Equal shares keep store order.
pub fn percentage_shares(groups: Vec<GroupCount>) -> Vec<(String, i64)> {
    let total: i64 = groups.iter().map(|g| g.visitors).sum();
    if total <= 0 {
        return Vec::new();
    }
    let mut shares: Vec<(String, i64)> = groups
        .into_iter()
        .map(|g| {
            let pct = (g.visitors as f64 * 100.0 / total as f64).round() as i64;
            (g.value, pct)
        })
        .collect();
    shares.sort_by(|a, b| b.1.cmp(&a.1));
    shares
}
