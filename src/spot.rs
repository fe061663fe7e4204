//! Data structures representing RBN spots.
//!
//! A spot is one line of Reverse Beacon Network output: a skimmer station
//! heard another station on some frequency at some time.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Amateur bands as inclusive kHz ranges.
const BANDS: &[(f64, f64, &str)] = &[
    (135.7, 137.8, "2200m"),
    (472.0, 479.0, "600m"),
    (1800.0, 2000.0, "160m"),
    (3500.0, 4000.0, "80m"),
    (5300.0, 5500.0, "60m"),
    (7000.0, 7300.0, "40m"),
    (10100.0, 10150.0, "30m"),
    (14000.0, 14300.0, "20m"),
    (18068.0, 18168.0, "17m"),
    (21000.0, 21450.0, "15m"),
    (24890.0, 24990.0, "12m"),
    (28000.0, 30000.0, "10m"),
    (50000.0, 54000.0, "6m"),
    (69900.0, 70500.0, "4m"),
    (144000.0, 148000.0, "2m"),
    (219000.0, 225000.0, "1.25m"),
    (420000.0, 450000.0, "70cm"),
    (902000.0, 928000.0, "33cm"),
    (1240000.0, 1300000.0, "23cm"),
];

/// Classify a frequency in kHz into an amateur band name.
pub fn band_for_frequency(frequency_khz: f64) -> Option<&'static str> {
    BANDS
        .iter()
        .find(|(low, high, _)| (*low..=*high).contains(&frequency_khz))
        .map(|(_, _, name)| *name)
}

/// The type of activity the skimmer detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpotType {
    /// Standard CQ call
    Cq,
    /// NCDXF/IARU beacon
    NcdxfBeacon,
    /// Generic beacon
    Beacon,
    /// Station working someone else
    Dx,
    /// Unknown or other type
    Other,
}

impl fmt::Display for SpotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpotType::Cq => write!(f, "CQ"),
            SpotType::NcdxfBeacon => write!(f, "NCDXF B"),
            SpotType::Beacon => write!(f, "BEACON"),
            SpotType::Dx => write!(f, "DX"),
            SpotType::Other => write!(f, "OTHER"),
        }
    }
}

/// The transmission mode of the spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    Cw,
    Rtty,
    Ft8,
    Ft4,
    Psk31,
    Unknown,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Cw => write!(f, "CW"),
            Mode::Rtty => write!(f, "RTTY"),
            Mode::Ft8 => write!(f, "FT8"),
            Mode::Ft4 => write!(f, "FT4"),
            Mode::Psk31 => write!(f, "PSK31"),
            Mode::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Unit the skimmer reports the sending speed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpeedUnit {
    /// Words per minute (CW)
    Wpm,
    /// Baud (RTTY and other digital modes)
    Bps,
}

impl fmt::Display for SpeedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeedUnit::Wpm => write!(f, "WPM"),
            SpeedUnit::Bps => write!(f, "BPS"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speed {
    pub value: u16,
    pub unit: SpeedUnit,
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// A parsed spot from the Reverse Beacon Network.
///
/// # Example
///
/// A raw spot like:
/// ```text
/// DX de EA5WU-#:    7018.3  RW1M           CW    19 dB  18 WPM  CQ      2259Z
/// ```
///
/// parses into an `RbnSpot` with:
/// - `spotter`: "EA5WU-#"
/// - `frequency_khz`: 7018.3
/// - `dx_call`: "RW1M"
/// - `speed`: 18 WPM
/// - `spot_type`: SpotType::Cq
/// - `time`: 22:59 UTC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RbnSpot {
    /// The skimmer station that detected this signal, usually with a `-#`
    /// suffix.
    pub spotter: String,

    pub frequency_khz: f64,

    /// The station being spotted.
    pub dx_call: String,

    pub mode: Mode,

    /// Signal-to-noise ratio in decibels.
    pub snr_db: i32,

    pub speed: Speed,

    pub spot_type: SpotType,

    /// UTC time of the spot (time only, no date).
    pub time: NaiveTime,
}

impl RbnSpot {
    /// Returns the amateur band for this spot's frequency, if any.
    pub fn band(&self) -> Option<&'static str> {
        band_for_frequency(self.frequency_khz)
    }
}

impl fmt::Display for RbnSpot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DX de {}: {:>8.1} {} {} {} dB {} {} {}",
            self.spotter,
            self.frequency_khz,
            self.dx_call,
            self.mode,
            self.snr_db,
            self.speed,
            self.spot_type,
            self.time.format("%H%MZ")
        )
    }
}
