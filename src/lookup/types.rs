//! Core types for the lookup subsystem.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A classified search input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// Dotted-decimal IPv4 shape (digit groups only; ranges are not checked).
    IPv4Literal(String),
    FreeTextLocation(String),
    /// Blank input: look up the caller's own address.
    Empty,
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IPv4Literal(ip) => write!(f, "IP {}", ip),
            Self::FreeTextLocation(text) => write!(f, "place '{}'", text),
            Self::Empty => write!(f, "own address"),
        }
    }
}

/// A point on the globe, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Build coordinates, rejecting values outside the valid ranges.
    pub fn checked(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self { latitude, longitude })
    }
}

/// Where an address is, as reported by the geolocation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoLocation {
    pub ip: String,
    pub city: String,
    pub region: String,
    /// ISO 3166-1 alpha-2 (or alpha-3) code, e.g. "US"
    pub country_code: String,
    pub latitude: f64,
    pub longitude: f64,
    /// IANA zone id (e.g. "America/Los_Angeles")
    pub timezone_name: String,
    pub isp: Option<String>,
}

impl GeoLocation {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Descriptive facts about a country.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryInfo {
    pub common_name: String,
    pub flag_image_url: String,
    pub population: u64,
    pub capital: String,
    /// Language names, ordered by language code.
    pub languages: Vec<String>,
}

/// Why a lookup failed. Never carries partial data.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum LookupError {
    /// Transport failure, timeout, or a non-2xx status.
    #[error("Network error: {0}")]
    NetworkFailure(String),
    /// A well-formed answer with zero matches.
    #[error("Not found: {0}")]
    NotFound(String),
    /// A 2xx answer missing the fields we need.
    #[error("Invalid upstream response: {0}")]
    UpstreamMalformed(String),
}

impl LookupError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NetworkFailure(_) => "NetworkFailure",
            Self::NotFound(_) => "NotFound",
            Self::UpstreamMalformed(_) => "UpstreamMalformed",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::NetworkFailure(msg) | Self::NotFound(msg) | Self::UpstreamMalformed(msg) => msg,
        }
    }
}
