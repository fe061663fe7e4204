//! rbn-callparser - Decode amateur radio callsigns into country data.
//!
//! This crate provides:
//! - A loader for the `cty.dat` country file with a right-truncation prefix
//!   resolver
//! - A callsign decoder that separates homecall, prefix and designators
//! - A nom-based parser for Reverse Beacon Network spot lines and a
//!   decorator that attaches country data to both ends of a spot
//! - Station filters and decode statistics with HDR histograms
//!
//! # Example
//!
//! ```rust,no_run
//! use rbn_callparser::{CountryDatabase, parse_callsign};
//!
//! let db = CountryDatabase::load("cty.dat").expect("Failed to load cty.dat");
//! let station = parse_callsign("HC2/DH1TW/P", &db);
//!
//! assert!(station.valid);
//! assert_eq!(station.homecall, "DH1TW");
//! println!("{}", station);
//! ```

pub mod callsign;
pub mod config;
pub mod country;
pub mod cty;
pub mod decorate;
pub mod filter;
pub mod parser;
pub mod patterns;
pub mod spot;
pub mod station;
pub mod stats;

pub use callsign::parse_callsign;
pub use config::Config;
pub use country::{Continent, CountryRecord, PrefixAlias};
pub use cty::{CountryDatabase, LoadError};
pub use decorate::{DecorateError, DecoratedSpot, decorate};
pub use filter::{StationFilter, any_filter_matches};
pub use parser::{ParseError, looks_like_spot, parse_spot};
pub use spot::{Mode, RbnSpot, SpotType};
pub use station::{Designator, InvalidReason, Station};
pub use stats::{DecodeStats, StatsSummary};
