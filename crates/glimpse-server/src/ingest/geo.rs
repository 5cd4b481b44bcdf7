use std::net::IpAddr;

use anyhow::Context;
use maxminddb::{geoip2, Reader};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct GeoLocation {
    pub country: String,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeoError {
    #[error("{0:?} is not an IP address")]
    InvalidAddress(String),

    #[error("no location recorded for {0}")]
    NotFound(IpAddr),

    #[error("geo database lookup failed: {0}")]
    Lookup(String),
}

/// Resolves a caller IP to a location. Implementations are read-only and
/// shared across requests.
pub trait GeoResolver: Send + Sync + 'static {
    fn resolve(&self, ip: &str) -> Result<GeoLocation, GeoError>;
}

/// [`GeoResolver`] backed by a MaxMind City database (`.mmdb`).
pub struct MaxMindResolver {
    reader: Reader<Vec<u8>>,
}

impl MaxMindResolver {
    pub fn open(path: &str) -> anyhow::Result<Self> {
        let reader = Reader::open_readfile(path)
            .with_context(|| format!("failed to open GeoIP database at {path}"))?;
        Ok(Self { reader })
    }
}

impl GeoResolver for MaxMindResolver {
    fn resolve(&self, ip: &str) -> Result<GeoLocation, GeoError> {
        let addr: IpAddr = ip
            .trim()
            .parse()
            .map_err(|_| GeoError::InvalidAddress(ip.to_string()))?;

        let result = self
            .reader
            .lookup(addr)
            .map_err(|e| GeoError::Lookup(e.to_string()))?;
        let city = result
            .decode::<geoip2::City>()
            .map_err(|e| GeoError::Lookup(e.to_string()))?
            .ok_or(GeoError::NotFound(addr))?;

        // English name when present, ISO code otherwise.
        let country = city
            .country
            .names
            .english
            .or(city.country.iso_code)
            .ok_or(GeoError::NotFound(addr))?;

        Ok(GeoLocation {
            country: country.to_string(),
            city: city.city.names.english.map(str::to_string),
            latitude: city.location.latitude,
            longitude: city.location.longitude,
        })
    }
}
