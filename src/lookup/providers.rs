//! Upstream providers: ipify geolocation, REST Countries, and Nominatim search.
//!
//! Each provider returns the raw wire record. Deciding whether a record is
//! complete is the job of the resolver and the enricher.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use super::types::{Coordinates, LookupError};
use crate::config::Config;

// ─── Service seams ──────────────────────────────────────────────

/// What the geolocation service is asked to locate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoTarget<'a> {
    /// The caller's own apparent address; the upstream infers it.
    OwnAddress,
    Ip(&'a str),
    Coordinates(Coordinates),
}

pub trait GeolocationService: Send + Sync {
    fn locate(&self, target: GeoTarget<'_>) -> Result<GeoRecord, LookupError>;
}

pub trait CountryService: Send + Sync {
    /// All records the upstream holds for `code`, in upstream order.
    fn by_code(&self, code: &str) -> Result<Vec<CountryRecord>, LookupError>;
}

pub trait PlaceSearch: Send + Sync {
    /// Candidates for a free-text place name, best first.
    fn search(&self, text: &str) -> Result<Vec<PlaceRecord>, LookupError>;
}

// ─── Wire records ───────────────────────────────────────────────

#[derive(Deserialize, Debug, Clone, Default)]
pub struct GeoRecord {
    pub ip: Option<String>,
    pub location: Option<GeoRecordLocation>,
    pub isp: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct GeoRecordLocation {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub timezone: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CountryRecord {
    pub name: Option<CountryName>,
    pub flags: Option<CountryFlags>,
    pub population: Option<u64>,
    pub capital: Option<Vec<String>>,
    /// Language code → language name. Sorted by code.
    pub languages: Option<BTreeMap<String, String>>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CountryName {
    pub common: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CountryFlags {
    pub svg: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct PlaceRecord {
    pub lat: Option<Degrees>,
    pub lon: Option<Degrees>,
}

/// Nominatim sends degrees as strings; other search services send numbers.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Degrees {
    Number(f64),
    Text(String),
}

impl Degrees {
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

// ─── HTTP plumbing ──────────────────────────────────────────────

const USER_AGENT: &str = concat!("geoscope/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP agent. `timeout` bounds each whole request.
pub fn build_agent(timeout: Option<Duration>) -> ureq::Agent {
    let mut builder = ureq::AgentBuilder::new().user_agent(USER_AGENT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

fn network_error(service: &str, err: ureq::Error) -> LookupError {
    match err {
        ureq::Error::Status(code, response) => LookupError::NetworkFailure(format!(
            "{} service returned HTTP {} {}",
            service,
            code,
            response.status_text()
        )),
        ureq::Error::Transport(transport) => {
            LookupError::NetworkFailure(format!("{} service unreachable: {}", service, transport))
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    service: &str,
    response: ureq::Response,
) -> Result<T, LookupError> {
    response
        .into_json()
        .map_err(|e| LookupError::UpstreamMalformed(format!("{} service sent unreadable JSON: {}", service, e)))
}

// ─── ipify geolocation ──────────────────────────────────────────

pub struct IpifyClient {
    agent: ureq::Agent,
    url: String,
    api_key: String,
}

impl IpifyClient {
    pub fn new(agent: ureq::Agent, url: &str, api_key: &str) -> Self {
        Self {
            agent,
            url: url.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

impl GeolocationService for IpifyClient {
    fn locate(&self, target: GeoTarget<'_>) -> Result<GeoRecord, LookupError> {
        let request = self.agent.get(&self.url).query("apiKey", &self.api_key);
        let request = match target {
            GeoTarget::OwnAddress => request,
            GeoTarget::Ip(ip) => request.query("ipAddress", ip),
            GeoTarget::Coordinates(c) => request
                .query("latitude", &c.latitude.to_string())
                .query("longitude", &c.longitude.to_string()),
        };

        debug!(url = %self.url, target = ?target, "geolocation request");
        let response = request.call().map_err(|e| network_error("geolocation", e))?;
        decode("geolocation", response)
    }
}

// ─── REST Countries ─────────────────────────────────────────────

pub struct RestCountriesClient {
    agent: ureq::Agent,
    base_url: String,
}

impl RestCountriesClient {
    pub fn new(agent: ureq::Agent, base_url: &str) -> Self {
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl CountryService for RestCountriesClient {
    fn by_code(&self, code: &str) -> Result<Vec<CountryRecord>, LookupError> {
        let url = format!("{}/{}", self.base_url, urlencoding::encode(code));

        debug!(url = %url, "country request");
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| network_error("country", e))?;
        decode("country", response)
    }
}

// ─── Nominatim place search ─────────────────────────────────────

pub struct NominatimClient {
    agent: ureq::Agent,
    url: String,
}

impl NominatimClient {
    pub fn new(agent: ureq::Agent, url: &str) -> Self {
        Self {
            agent,
            url: url.to_string(),
        }
    }
}

impl PlaceSearch for NominatimClient {
    fn search(&self, text: &str) -> Result<Vec<PlaceRecord>, LookupError> {
        debug!(url = %self.url, query = text, "place search request");
        let response = self
            .agent
            .get(&self.url)
            .query("q", text)
            .query("format", "json")
            .query("limit", "1")
            .set("Accept", "application/json")
            .call()
            .map_err(|e| network_error("place search", e))?;
        decode("place search", response)
    }
}

/// The three HTTP services, wired from configuration.
pub struct HttpServices {
    pub geolocation: IpifyClient,
    pub countries: RestCountriesClient,
    pub places: NominatimClient,
}

impl HttpServices {
    pub fn from_config(config: &Config) -> Self {
        let agent = build_agent(config.timeout);
        Self {
            geolocation: IpifyClient::new(agent.clone(), &config.geolocation_url, &config.api_key),
            countries: RestCountriesClient::new(agent.clone(), &config.country_url),
            places: NominatimClient::new(agent, &config.place_search_url),
        }
    }
}
