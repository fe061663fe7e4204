//! Spot decoration.
//!
//! Turns a parsed [`RbnSpot`] into the flat record downstream consumers
//! expect: both calls decoded to primary prefix and continent, the band
//! name, a rounded frequency and a full epoch timestamp.

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::callsign::parse_callsign;
use crate::country::Continent;
use crate::cty::CountryDatabase;
use crate::spot::{RbnSpot, band_for_frequency};
use crate::station::{InvalidReason, Station};

#[derive(Debug, Error, PartialEq)]
pub enum DecorateError {
    #[error("Cannot locate prefix for {call:?}: {reason}")]
    UnknownStation { call: String, reason: InvalidReason },

    #[error("Cannot ascertain band for {0:.1} kHz")]
    UnknownBand(f64),
}

/// A spot with both ends decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecoratedSpot {
    pub band: String,

    /// Homecall of the skimmer, with any SSID suffix removed by the decoder
    /// rather than by trimming digits off the raw spotter text.
    pub callsign: String,
    pub de_pfx: String,
    pub de_cont: Option<Continent>,

    /// The spotted call as it appeared in the feed.
    pub dx: String,
    pub dx_pfx: String,
    pub dx_cont: Option<Continent>,

    /// Frequency in kHz, rounded to 100 Hz.
    pub freq: f64,
    pub mode: String,
    pub tx_mode: String,
    pub db: i32,
    pub speed: u16,

    /// Spot time in milliseconds since the Unix epoch.
    pub date: i64,
}

/// Decode both calls of a spot and build the decorated record.
pub fn decorate(
    spot: &RbnSpot,
    db: &CountryDatabase,
    now: DateTime<Utc>,
) -> Result<DecoratedSpot, DecorateError> {
    let de = parse_callsign(&spot.spotter, db);
    let dx = parse_callsign(&spot.dx_call, db);
    decorate_stations(spot, &de, &dx, now)
}

/// Build the decorated record from already decoded stations.
pub fn decorate_stations(
    spot: &RbnSpot,
    de: &Station,
    dx: &Station,
    now: DateTime<Utc>,
) -> Result<DecoratedSpot, DecorateError> {
    for station in [de, dx] {
        if !station.valid {
            return Err(DecorateError::UnknownStation {
                call: station.call.clone(),
                reason: station
                    .invalid_reason
                    .unwrap_or(InvalidReason::NoPrefix),
            });
        }
    }

    let freq = round_frequency(spot.frequency_khz);
    let band = band_for_frequency(freq).ok_or(DecorateError::UnknownBand(freq))?;

    Ok(DecoratedSpot {
        band: band.to_string(),
        callsign: de.homecall.clone(),
        de_pfx: de.primary_prefix.clone(),
        de_cont: de.continent,
        dx: spot.dx_call.clone(),
        dx_pfx: dx.primary_prefix.clone(),
        dx_cont: dx.continent,
        freq,
        mode: spot.mode.to_string(),
        tx_mode: spot.spot_type.to_string(),
        db: spot.snr_db,
        speed: spot.speed.value,
        date: spot_timestamp(spot.time, now).timestamp_millis(),
    })
}

/// Round a frequency to the nearest 0.1 kHz.
pub fn round_frequency(frequency_khz: f64) -> f64 {
    (frequency_khz * 10.0).round() / 10.0
}

/// Attach a date to a spot's time of day.
///
/// Spots carry only `HHMM`. Today's date is used, except across midnight:
/// a 23xx spot seen during hour 0 belongs to yesterday, and a 00xx spot
/// seen during hour 23 belongs to tomorrow.
pub fn spot_timestamp(time: NaiveTime, now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive();
    let date = match (now.hour(), time.hour()) {
        (0, 23) => today.pred_opt().unwrap_or(today),
        (23, 0) => today.succ_opt().unwrap_or(today),
        _ => today,
    };
    date.and_time(time).and_utc()
}
