//! Decoded station records.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::country::Continent;

/// Why a callsign could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidReason {
    /// Fewer than three significant characters in a row.
    TooShort,
    /// No segment has the shape of a callsign.
    #[serde(rename = "no-homecall-match")]
    NoHomecall,
    /// No segment resolves to a registered prefix.
    #[serde(rename = "no-prefix-match")]
    NoPrefix,
    /// The resolved prefix has no country entry.
    #[serde(rename = "country-lookup-miss")]
    UnknownCountry,
    /// Maritime or aeronautical mobile combined with a prefix and designator.
    #[serde(rename = "unsupported-designator-combination")]
    UnsupportedDesignator,
    /// More than three slash-separated segments.
    TooManySegments,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::TooShort => write!(f, "too short"),
            InvalidReason::NoHomecall => write!(f, "no homecall match"),
            InvalidReason::NoPrefix => write!(f, "no prefix match"),
            InvalidReason::UnknownCountry => write!(f, "no country info for prefix"),
            InvalidReason::UnsupportedDesignator => {
                write!(f, "unsupported designator combination")
            }
            InvalidReason::TooManySegments => write!(f, "too many segments"),
        }
    }
}

/// A slash appendix describing how the station operates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Designator {
    /// `/MM`
    MaritimeMobile,
    /// `/AM`
    AeronauticalMobile,
    /// `/BCN` or `/B`
    Beacon,
    /// `/LH`
    Lighthouse,
    /// `/M`
    Mobile,
    /// `/P`
    Portable,
    /// `/QRP`
    Qrp,
    /// `/QRPP`
    Qrpp,
}

impl Designator {
    /// Recognize a designator token. Matching is exact (input is already
    /// uppercased by the parser).
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "MM" => Some(Designator::MaritimeMobile),
            "AM" => Some(Designator::AeronauticalMobile),
            "BCN" | "B" => Some(Designator::Beacon),
            "LH" => Some(Designator::Lighthouse),
            "M" => Some(Designator::Mobile),
            "P" => Some(Designator::Portable),
            "QRP" => Some(Designator::Qrp),
            "QRPP" => Some(Designator::Qrpp),
            _ => None,
        }
    }
}

/// A decoded callsign with its country data.
///
/// Country fields are empty/zero when the station is maritime or
/// aeronautical mobile, or when it is invalid.
///
/// # Example
///
/// `HC2/DH1TW/P` decodes to:
/// - `homecall`: "DH1TW"
/// - `prefix`: "HC"
/// - `country`: "Ecuador", CQ zone 10, ITU zone 12, continent SA
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Station {
    pub valid: bool,

    /// The input, trimmed and uppercased.
    pub call: String,

    /// The registered alias the station was attributed to.
    pub prefix: String,

    /// The primary prefix of the station's country.
    pub primary_prefix: String,

    /// The operator's own call without prefixes or appendices.
    pub homecall: String,

    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub cqz: u8,
    pub ituz: u8,
    pub continent: Option<Continent>,

    /// Hours offset from UTC, as stored in `cty.dat`.
    pub utc_offset: f64,

    /// Maritime mobile.
    pub mm: bool,

    /// Aeronautical mobile.
    pub am: bool,

    pub beacon: bool,

    /// Call area digit, either from the homecall or an explicit appendix.
    pub call_area: Option<String>,

    /// Set exactly when `valid` is false.
    pub invalid_reason: Option<InvalidReason>,
}

impl Station {
    /// Whether the station operates from a ship or aircraft.
    pub fn is_mobile_at_sea_or_air(&self) -> bool {
        self.mm || self.am
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.valid {
            let reason = self
                .invalid_reason
                .map(|r| r.to_string())
                .unwrap_or_else(|| "invalid".to_string());
            return write!(f, "{}: invalid ({})", self.call, reason);
        }

        write!(f, "{}: {}", self.call, self.homecall)?;
        if self.mm {
            write!(f, " maritime mobile")?;
        } else if self.am {
            write!(f, " aeronautical mobile")?;
        } else {
            write!(
                f,
                " {} [{}] {} CQ {} ITU {}",
                self.country,
                self.prefix,
                self.continent.map(|c| c.code()).unwrap_or("--"),
                self.cqz,
                self.ituz
            )?;
        }
        if let Some(area) = &self.call_area {
            write!(f, " area {}", area)?;
        }
        if self.beacon {
            write!(f, " beacon")?;
        }
        Ok(())
    }
}
