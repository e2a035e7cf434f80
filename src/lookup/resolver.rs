//! Geolocation resolver: turns a classified query into a `GeoLocation`.
//!
//! Empty flow:     geolocation(own address)
//! IP flow:        geolocation(ip)
//! Free-text flow: place search → first candidate's coordinates → geolocation(coords)

use std::sync::Arc;

use tracing::debug;

use super::providers::{GeoRecord, GeoTarget, GeolocationService, PlaceRecord, PlaceSearch};
use super::types::{Coordinates, GeoLocation, LookupError, SearchQuery};

pub struct GeolocationResolver {
    geolocation: Arc<dyn GeolocationService>,
    places: Arc<dyn PlaceSearch>,
}

impl GeolocationResolver {
    pub fn new(geolocation: Arc<dyn GeolocationService>, places: Arc<dyn PlaceSearch>) -> Self {
        Self { geolocation, places }
    }

    /// Resolve a query. Never returns a partially populated location.
    pub fn resolve(&self, query: &SearchQuery) -> Result<GeoLocation, LookupError> {
        let record = match query {
            SearchQuery::Empty => self.geolocation.locate(GeoTarget::OwnAddress)?,
            SearchQuery::IPv4Literal(ip) => self.geolocation.locate(GeoTarget::Ip(ip))?,
            SearchQuery::FreeTextLocation(text) => {
                let coords = self.locate_place(text)?;
                debug!(place = %text, lat = coords.latitude, lon = coords.longitude, "place resolved");
                self.geolocation.locate(GeoTarget::Coordinates(coords))?
            }
        };
        geo_from_record(record)
    }

    fn locate_place(&self, text: &str) -> Result<Coordinates, LookupError> {
        let candidates = self.places.search(text)?;
        let top = candidates
            .into_iter()
            .next()
            .ok_or_else(|| LookupError::NotFound(format!("no place matches '{}'", text)))?;
        coords_from_place(&top)
    }
}

fn coords_from_place(place: &PlaceRecord) -> Result<Coordinates, LookupError> {
    let lat = place.lat.as_ref().and_then(|d| d.value());
    let lon = place.lon.as_ref().and_then(|d| d.value());
    match (lat, lon) {
        (Some(lat), Some(lon)) => Coordinates::checked(lat, lon).ok_or_else(|| {
            LookupError::UpstreamMalformed(format!("place search returned out-of-range coordinates {}, {}", lat, lon))
        }),
        _ => Err(LookupError::UpstreamMalformed(
            "place search result has no usable lat/lon".into(),
        )),
    }
}

fn geo_from_record(record: GeoRecord) -> Result<GeoLocation, LookupError> {
    let location = record.location.ok_or_else(|| missing("location"))?;

    let ip = non_empty(record.ip, "ip")?;
    let country_code = non_empty(location.country, "location.country")?;
    let timezone_name = non_empty(location.timezone, "location.timezone")?;
    // City and region may legitimately be blank for some addresses.
    let city = location.city.ok_or_else(|| missing("location.city"))?;
    let region = location.region.ok_or_else(|| missing("location.region"))?;
    let lat = location.lat.ok_or_else(|| missing("location.lat"))?;
    let lng = location.lng.ok_or_else(|| missing("location.lng"))?;

    let coords = Coordinates::checked(lat, lng).ok_or_else(|| {
        LookupError::UpstreamMalformed(format!("geolocation returned out-of-range coordinates {}, {}", lat, lng))
    })?;

    Ok(GeoLocation {
        ip,
        city,
        region,
        country_code: country_code.to_uppercase(),
        latitude: coords.latitude,
        longitude: coords.longitude,
        timezone_name,
        isp: record.isp.filter(|s| !s.trim().is_empty()),
    })
}

fn non_empty(value: Option<String>, field: &str) -> Result<String, LookupError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(missing(field)),
    }
}

fn missing(field: &str) -> LookupError {
    LookupError::UpstreamMalformed(format!("geolocation response is missing '{}'", field))
}
