//! Lookup subsystem for Geoscope.
//!
//! Classifies a search, resolves it to a location via IP geolocation (and
//! place search for free text), enriches it with country facts, and
//! assembles a view model. `SearchController` sequences searches so a slow,
//! superseded lookup never replaces a newer one.

pub mod enricher;
pub mod orchestrator;
pub mod providers;
pub mod query;
pub mod resolver;
pub mod types;
pub mod view;

pub use enricher::CountryEnricher;
pub use orchestrator::{Commit, LookupPipeline, SearchController, SearchState};
pub use query::classify;
pub use resolver::GeolocationResolver;
pub use types::{Coordinates, CountryInfo, GeoLocation, LookupError, SearchQuery};
pub use view::{assemble, format_coords, ViewModel};
