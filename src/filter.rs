//! Station filtering for selective output.
//!
//! Filters select decoded stations by homecall or prefix patterns, country,
//! continent and zones. They are usually loaded from the `[[filters]]`
//! tables of the config file.

use serde::Deserialize;

use crate::country::Continent;
use crate::station::Station;

/// One or more wildcard patterns.
///
/// Deserializes from either form:
/// - `homecall = "DL*"`
/// - `homecall = ["DL*", "DK*"]` (OR logic)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PatternList {
    One(String),
    Many(Vec<String>),
}

impl PatternList {
    pub fn patterns(&self) -> &[String] {
        match self {
            PatternList::One(pattern) => std::slice::from_ref(pattern),
            PatternList::Many(patterns) => patterns,
        }
    }

    pub fn matches_any(&self, value: &str) -> bool {
        self.patterns().iter().any(|p| matches_wildcard(p, value))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns().is_empty()
    }
}

/// A filter for matching decoded stations.
///
/// All specified fields must match (AND logic).
/// Use multiple filters for OR logic.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StationFilter {
    /// Optional name, shown in log output.
    pub name: Option<String>,

    /// Homecall patterns (`*` as leading or trailing wildcard).
    pub homecall: Option<PatternList>,

    /// Patterns matched against the resolved prefix alias.
    pub prefix: Option<PatternList>,

    /// Country names, compared case-insensitively.
    pub countries: Option<Vec<String>>,

    pub continents: Option<Vec<Continent>>,

    pub cq_zones: Option<Vec<u8>>,

    pub itu_zones: Option<Vec<u8>>,

    /// Only match stations that decoded successfully.
    pub valid_only: bool,
}

impl Default for StationFilter {
    fn default() -> Self {
        Self {
            name: None,
            homecall: None,
            prefix: None,
            countries: None,
            continents: None,
            cq_zones: None,
            itu_zones: None,
            valid_only: true,
        }
    }
}

impl StationFilter {
    /// Check if a station matches this filter.
    pub fn matches(&self, station: &Station) -> bool {
        if self.valid_only && !station.valid {
            return false;
        }

        if let Some(ref patterns) = self.homecall
            && !patterns.is_empty()
            && !patterns.matches_any(&station.homecall)
        {
            return false;
        }

        if let Some(ref patterns) = self.prefix
            && !patterns.is_empty()
            && !patterns.matches_any(&station.prefix)
        {
            return false;
        }

        if let Some(ref countries) = self.countries
            && !countries
                .iter()
                .any(|c| c.trim().eq_ignore_ascii_case(&station.country))
        {
            return false;
        }

        if let Some(ref continents) = self.continents {
            match station.continent {
                Some(continent) if continents.contains(&continent) => {}
                _ => return false,
            }
        }

        if let Some(ref zones) = self.cq_zones
            && !zones.contains(&station.cqz)
        {
            return false;
        }

        if let Some(ref zones) = self.itu_zones
            && !zones.contains(&station.ituz)
        {
            return false;
        }

        true
    }

    /// Validate the filter configuration.
    pub fn validate(&self) -> Result<(), String> {
        for patterns in [&self.homecall, &self.prefix].into_iter().flatten() {
            for pattern in patterns.patterns() {
                validate_wildcard_pattern(pattern)?;
            }
        }
        Ok(())
    }
}

/// Check if any filter in the list matches the station.
///
/// Returns `false` if the list is empty.
pub fn any_filter_matches(filters: &[StationFilter], station: &Station) -> bool {
    filters.iter().any(|f| f.matches(station))
}

/// Match a string against a wildcard pattern.
///
/// `*` may lead (`*/P`) or trail (`DL*`); matching is case-insensitive.
fn matches_wildcard(pattern: &str, value: &str) -> bool {
    let pattern = pattern.to_ascii_uppercase();
    let value = value.to_ascii_uppercase();

    if let Some(suffix) = pattern.strip_prefix('*') {
        value.ends_with(suffix)
    } else if let Some(prefix) = pattern.strip_suffix('*') {
        value.starts_with(prefix)
    } else {
        pattern == value
    }
}

fn validate_wildcard_pattern(pattern: &str) -> Result<(), String> {
    let wildcard_count = pattern.matches('*').count();

    if wildcard_count > 1 {
        return Err(format!(
            "Pattern '{}' has multiple wildcards; only one is allowed",
            pattern
        ));
    }

    if wildcard_count == 1 && !pattern.starts_with('*') && !pattern.ends_with('*') {
        return Err(format!(
            "Pattern '{}' has wildcard in middle; only leading (*ABC) or trailing (ABC*) allowed",
            pattern
        ));
    }

    Ok(())
}
