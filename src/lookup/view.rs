//! View model assembler and rendering helpers.

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use super::types::{CountryInfo, GeoLocation};

/// Long date-time format, e.g. "October 17, 2026 at 3:04 PM PDT".
const LONG_FORMAT: &str = "%B %-d, %Y at %-I:%M %p";

/// Zoom level the map panel opens at.
pub const MAP_ZOOM: u8 = 13;

/// A completed, successful lookup. Only `assemble` builds one.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    geo: GeoLocation,
    country: CountryInfo,
}

/// Merge a location and its country into a view model. Pure.
pub fn assemble(geo: GeoLocation, country: CountryInfo) -> ViewModel {
    ViewModel { geo, country }
}

impl ViewModel {
    pub fn geo(&self) -> &GeoLocation {
        &self.geo
    }

    pub fn country(&self) -> &CountryInfo {
        &self.country
    }

    /// Wall-clock time at the location, right now. Recomputed on every call.
    pub fn local_time_display(&self) -> String {
        self.local_time_at(Utc::now())
    }

    /// Wall-clock time at the location for a given instant.
    pub fn local_time_at(&self, now: DateTime<Utc>) -> String {
        format_in_zone(now, &self.geo.timezone_name)
    }

    /// OpenStreetMap link centred on the location.
    pub fn map_link(&self) -> String {
        let (lat, lon) = (self.geo.latitude, self.geo.longitude);
        format!(
            "https://www.openstreetmap.org/?mlat={:.4}&mlon={:.4}#map={}/{:.4}/{:.4}",
            lat, lon, MAP_ZOOM, lat, lon
        )
    }

    /// "Mountain View, California, US", skipping blank parts.
    pub fn place_line(&self) -> String {
        [&self.geo.city, &self.geo.region, &self.geo.country_code]
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Text panel for terminals.
    pub fn render_text(&self, now: DateTime<Utc>) -> String {
        let geo = &self.geo;
        let country = &self.country;
        let languages = if country.languages.is_empty() {
            "-".to_string()
        } else {
            country.languages.join(", ")
        };

        let mut out = String::new();
        out.push_str(&format!("  IP Address:  {}\n", geo.ip));
        out.push_str(&format!("  Location:    {}\n", self.place_line()));
        out.push_str(&format!("  Coordinates: {}\n", format_coords(geo.latitude, geo.longitude)));
        out.push_str(&format!("  Time Zone:   {}\n", geo.timezone_name));
        out.push_str(&format!("  ISP:         {}\n", geo.isp.as_deref().unwrap_or("-")));
        out.push_str(&format!("  Local Time:  {}\n", self.local_time_at(now)));
        out.push_str(&format!("  Country:     {}\n", country.common_name));
        out.push_str(&format!("  Flag:        {}\n", country.flag_image_url));
        out.push_str(&format!("  Population:  {}\n", country.population));
        out.push_str(&format!("  Capital:     {}\n", country.capital));
        out.push_str(&format!("  Languages:   {}\n", languages));
        out.push_str(&format!("  Map:         {}\n", self.map_link()));
        out
    }

    /// Flat, serializable snapshot including the derived fields at `now`.
    pub fn snapshot_at(&self, now: DateTime<Utc>) -> ViewSnapshot<'_> {
        ViewSnapshot {
            ip: &self.geo.ip,
            city: &self.geo.city,
            region: &self.geo.region,
            country_code: &self.geo.country_code,
            latitude: self.geo.latitude,
            longitude: self.geo.longitude,
            timezone: &self.geo.timezone_name,
            isp: self.geo.isp.as_deref(),
            country_name: &self.country.common_name,
            flag_url: &self.country.flag_image_url,
            population: self.country.population,
            capital: &self.country.capital,
            languages: &self.country.languages,
            local_time: self.local_time_at(now),
            map_link: self.map_link(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ViewSnapshot<'a> {
    pub ip: &'a str,
    pub city: &'a str,
    pub region: &'a str,
    pub country_code: &'a str,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isp: Option<&'a str>,
    pub country_name: &'a str,
    pub flag_url: &'a str,
    pub population: u64,
    pub capital: &'a str,
    pub languages: &'a [String],
    pub local_time: String,
    pub map_link: String,
}

/// Render `now` in `zone`: an IANA id, a fixed offset like "-07:00", or,
/// failing both, UTC labelled with the raw zone string.
fn format_in_zone(now: DateTime<Utc>, zone: &str) -> String {
    if let Ok(tz) = zone.trim().parse::<Tz>() {
        let local = now.with_timezone(&tz);
        return format!("{} {}", local.format(LONG_FORMAT), local.format("%Z"));
    }
    if let Some(offset) = parse_fixed_offset(zone) {
        return format!("{} UTC{}", now.with_timezone(&offset).format(LONG_FORMAT), offset);
    }
    format!("{} UTC ({})", now.format(LONG_FORMAT), zone)
}

/// Parse "+05:30", "-0700", "+03" or "UTC+02:00".
fn parse_fixed_offset(zone: &str) -> Option<FixedOffset> {
    let s = zone.trim();
    let s = s.strip_prefix("UTC").or_else(|| s.strip_prefix("GMT")).unwrap_or(s);
    let (sign, rest) = match s.chars().next()? {
        '+' => (1, &s[1..]),
        '-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes): (i32, i32) = match digits.len() {
        1 | 2 => (digits.parse().ok()?, 0),
        4 => (digits[..2].parse().ok()?, digits[2..].parse().ok()?),
        _ => return None,
    };
    if hours > 14 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// "37.4000°N, 122.0700°W"
pub fn format_coords(lat: f64, lon: f64) -> String {
    let ns = if lat >= 0.0 { 'N' } else { 'S' };
    let ew = if lon >= 0.0 { 'E' } else { 'W' };
    format!("{:.4}\u{00B0}{}, {:.4}\u{00B0}{}", lat.abs(), ns, lon.abs(), ew)
}
