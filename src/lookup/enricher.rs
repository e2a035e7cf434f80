//! Country enricher: country code to `CountryInfo`.

use std::sync::Arc;

use super::providers::{CountryRecord, CountryService};
use super::types::{CountryInfo, LookupError};

pub struct CountryEnricher {
    countries: Arc<dyn CountryService>,
}

impl CountryEnricher {
    pub fn new(countries: Arc<dyn CountryService>) -> Self {
        Self { countries }
    }

    /// Look up one country.
    ///
    /// The upstream answers with an array. Index 0 is always taken; this
    /// tie-break is fixed, even if a code maps to several records.
    pub fn enrich(&self, country_code: &str) -> Result<CountryInfo, LookupError> {
        let code = country_code.trim();
        if code.is_empty() {
            return Err(LookupError::UpstreamMalformed(
                "no country code to look up".into(),
            ));
        }

        let records = self.countries.by_code(code)?;
        let first = records
            .into_iter()
            .next()
            .ok_or_else(|| LookupError::NotFound(format!("no country with code '{}'", code)))?;
        country_from_record(first)
    }
}

fn country_from_record(record: CountryRecord) -> Result<CountryInfo, LookupError> {
    let common_name = record
        .name
        .and_then(|n| n.common)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| missing("name.common"))?;
    let flag_image_url = record
        .flags
        .and_then(|f| f.svg)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| missing("flags.svg"))?;
    let population = record.population.ok_or_else(|| missing("population"))?;
    let capital = record
        .capital
        .and_then(|c| c.into_iter().next())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| missing("capital"))?;
    let languages: Vec<String> = record
        .languages
        .ok_or_else(|| missing("languages"))?
        .into_values()
        .collect();

    Ok(CountryInfo {
        common_name,
        flag_image_url,
        population,
        capital,
        languages,
    })
}

fn missing(field: &str) -> LookupError {
    LookupError::UpstreamMalformed(format!("country response is missing '{}'", field))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::lookup::providers::{CountryFlags, CountryName};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    pub(crate) fn country_record(name: &str, capital: &str, population: u64, langs: &[(&str, &str)]) -> CountryRecord {
        CountryRecord {
            name: Some(CountryName {
                common: Some(name.into()),
            }),
            flags: Some(CountryFlags {
                svg: Some(format!("https://flags.example/{}.svg", name.to_lowercase().replace(' ', "_"))),
            }),
            population: Some(population),
            capital: Some(vec![capital.into()]),
            languages: Some(
                langs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<BTreeMap<_, _>>(),
            ),
        }
    }

    pub(crate) fn united_states() -> CountryRecord {
        country_record("United States", "Washington, D.C.", 331_000_000, &[("eng", "English")])
    }

    /// Returns the same records for every code and remembers what was asked.
    pub(crate) struct FixedCountries {
        pub records: Vec<CountryRecord>,
        pub asked: Mutex<Vec<String>>,
    }

    impl FixedCountries {
        pub(crate) fn new(records: Vec<CountryRecord>) -> Self {
            Self {
                records,
                asked: Mutex::new(Vec::new()),
            }
        }
    }

    impl CountryService for FixedCountries {
        fn by_code(&self, code: &str) -> Result<Vec<CountryRecord>, LookupError> {
            self.asked.lock().unwrap().push(code.to_string());
            Ok(self.records.clone())
        }
    }

    fn enrich_with(records: Vec<CountryRecord>, code: &str) -> Result<CountryInfo, LookupError> {
        CountryEnricher::new(Arc::new(FixedCountries::new(records))).enrich(code)
    }

    #[test]
    fn test_enrich_united_states() {
        let info = enrich_with(vec![united_states()], "US").unwrap();
        assert_eq!(info.common_name, "United States");
        assert_eq!(info.capital, "Washington, D.C.");
        assert_eq!(info.population, 331_000_000);
        assert_eq!(info.languages, vec!["English".to_string()]);
        assert_eq!(info.flag_image_url, "https://flags.example/united_states.svg");
    }

    #[test]
    fn test_first_record_wins() {
        let records = vec![
            country_record("Dominica", "Roseau", 71_991, &[("eng", "English")]),
            country_record("Dominican Republic", "Santo Domingo", 10_847_904, &[("spa", "Spanish")]),
        ];
        let info = enrich_with(records, "DM").unwrap();
        assert_eq!(info.common_name, "Dominica");
    }

    #[test]
    fn test_empty_array_is_not_found() {
        let err = enrich_with(vec![], "XX").unwrap_err();
        assert!(matches!(err, LookupError::NotFound(_)));
    }

    #[test]
    fn test_missing_capital_is_malformed() {
        let mut no_capital = united_states();
        no_capital.capital = None;
        let err = enrich_with(vec![no_capital], "US").unwrap_err();
        assert_eq!(err, LookupError::UpstreamMalformed("country response is missing 'capital'".into()));

        // Antarctica-style records carry an empty capital list.
        let mut empty_capital = united_states();
        empty_capital.capital = Some(vec![]);
        let err = enrich_with(vec![empty_capital], "US").unwrap_err();
        assert!(matches!(err, LookupError::UpstreamMalformed(_)));
    }

    #[test]
    fn test_each_required_field() {
        for field in ["name.common", "flags.svg", "population", "languages"] {
            let mut rec = united_states();
            match field {
                "name.common" => rec.name = None,
                "flags.svg" => rec.flags = None,
                "population" => rec.population = None,
                _ => rec.languages = None,
            }
            let err = enrich_with(vec![rec], "US").unwrap_err();
            assert!(err.message().contains(field), "{}: {}", field, err);
        }
    }

    #[test]
    fn test_blank_code_skips_request() {
        let service = Arc::new(FixedCountries::new(vec![united_states()]));
        let enricher = CountryEnricher::new(service.clone());
        let err = enricher.enrich("  ").unwrap_err();
        assert!(matches!(err, LookupError::UpstreamMalformed(_)));
        assert!(service.asked.lock().unwrap().is_empty());
    }

    #[test]
    fn test_zero_population_is_valid() {
        let rec = country_record("Bouvet Island", "None", 0, &[]);
        let info = enrich_with(vec![rec], "BV").unwrap();
        assert_eq!(info.population, 0);
        assert!(info.languages.is_empty());
    }
}
