//! Country (DXCC entity) records and prefix aliases as described by `cty.dat`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Continent abbreviation used by `cty.dat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Continent {
    #[serde(rename = "NA")]
    NorthAmerica,
    #[serde(rename = "SA")]
    SouthAmerica,
    #[serde(rename = "EU")]
    Europe,
    #[serde(rename = "AF")]
    Africa,
    #[serde(rename = "AS")]
    Asia,
    #[serde(rename = "OC")]
    Oceania,
    #[serde(rename = "AN")]
    Antarctica,
}

impl Continent {
    /// The two-letter code as it appears in the reference file.
    pub fn code(&self) -> &'static str {
        match self {
            Continent::NorthAmerica => "NA",
            Continent::SouthAmerica => "SA",
            Continent::Europe => "EU",
            Continent::Africa => "AF",
            Continent::Asia => "AS",
            Continent::Oceania => "OC",
            Continent::Antarctica => "AN",
        }
    }
}

impl fmt::Display for Continent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Continent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NA" => Ok(Continent::NorthAmerica),
            "SA" => Ok(Continent::SouthAmerica),
            "EU" => Ok(Continent::Europe),
            "AF" => Ok(Continent::Africa),
            "AS" => Ok(Continent::Asia),
            "OC" => Ok(Continent::Oceania),
            "AN" => Ok(Continent::Antarctica),
            other => Err(format!("unknown continent code: {:?}", other)),
        }
    }
}

/// One country/entity definition line of `cty.dat`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryRecord {
    /// Entity name, e.g. "Fed. Rep. of Germany".
    pub name: String,

    /// Base CQ zone.
    pub cqz: u8,

    /// Base ITU zone.
    pub ituz: u8,

    pub continent: Continent,

    /// Latitude in decimal degrees, north positive.
    pub latitude: f64,

    /// Longitude in decimal degrees as stored in `cty.dat` (west positive).
    pub longitude: f64,

    /// Offset from UTC in hours, as stored in `cty.dat` (west positive).
    pub utc_offset: f64,

    /// Canonical prefix used as the main lookup key.
    pub primary_prefix: String,

    /// Position in the reference file, starting at 1.
    pub number: u32,
}

/// A registered prefix alias with its (possibly overridden) zones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrefixAlias {
    /// The literal prefix text, e.g. "VK6".
    pub prefix: String,

    /// CQ zone; the parent's base zone unless the alias overrides it.
    pub cqz: u8,

    /// ITU zone; the parent's base zone unless the alias overrides it.
    pub ituz: u8,

    /// Index of the parent record in the database's record table.
    #[serde(skip)]
    pub(crate) country: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continent_round_trip_codes() {
        for code in ["NA", "SA", "EU", "AF", "AS", "OC", "AN"] {
            let continent: Continent = code.parse().unwrap();
            assert_eq!(continent.to_string(), code);
        }
    }

    #[test]
    fn test_continent_lenient_input() {
        assert_eq!(" eu ".parse::<Continent>(), Ok(Continent::Europe));
        assert!("XX".parse::<Continent>().is_err());
        assert!("".parse::<Continent>().is_err());
    }

    #[test]
    fn test_continent_serde_uses_codes() {
        let json = serde_json::to_string(&Continent::SouthAmerica).unwrap();
        assert_eq!(json, r#""SA""#);
        let back: Continent = serde_json::from_str(r#""OC""#).unwrap();
        assert_eq!(back, Continent::Oceania);
    }
}
