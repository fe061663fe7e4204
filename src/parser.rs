//! Parser for RBN (Reverse Beacon Network) spot lines.
//!
//! Built on `nom`, so recorded feed output can be decoded offline.
//!
//! # Spot Format
//!
//! ```text
//! DX de SPOTTER:  FREQ  CALLSIGN  MODE  SNR dB  SPEED WPM|BPS  TYPE  TIMEZ
//! ```
//!
//! Examples:
//! ```text
//! DX de EA5WU-#:    7018.3  RW1M           CW    19 dB  18 WPM  CQ      2259Z
//! DX de KM3T-#:    14080.0  W1AW           RTTY  12 dB  45 BPS  CQ      1200Z
//! ```

use chrono::NaiveTime;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag_no_case, take_while1, take_while_m_n},
    character::complete::{char, digit1, multispace1, space0, space1},
    combinator::{map_res, opt, recognize, value},
    sequence::terminated,
};
use thiserror::Error;

use crate::spot::{Mode, RbnSpot, Speed, SpeedUnit, SpotType};

/// Errors that can occur while parsing a spot line.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid spot format: {0}")]
    InvalidFormat(String),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Callsign characters, plus `/` for portable designators and `-`/`#` for
/// skimmer suffixes.
fn is_callsign_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '/' || c == '-' || c == '#'
}

fn parse_dx_de_prefix(input: &str) -> IResult<&str, ()> {
    value(
        (),
        (
            tag_no_case("DX"),
            multispace1,
            tag_no_case("de"),
            multispace1,
        ),
    )
    .parse(input)
}

fn parse_call(input: &str) -> IResult<&str, &str> {
    take_while1(is_callsign_char).parse(input)
}

fn parse_spotter(input: &str) -> IResult<&str, &str> {
    terminated(parse_call, (char(':'), space0)).parse(input)
}

/// Frequency in kHz, e.g. `7018.3`.
fn parse_frequency(input: &str) -> IResult<&str, f64> {
    map_res(recognize((digit1, opt((char('.'), digit1)))), |s: &str| {
        s.parse::<f64>()
    })
    .parse(input)
}

fn parse_mode(input: &str) -> IResult<&str, Mode> {
    alt((
        value(Mode::Cw, tag_no_case("CW")),
        value(Mode::Rtty, tag_no_case("RTTY")),
        value(Mode::Ft8, tag_no_case("FT8")),
        value(Mode::Ft4, tag_no_case("FT4")),
        value(Mode::Psk31, tag_no_case("PSK31")),
    ))
    .parse(input)
}

/// Signal-to-noise ratio, e.g. `19 dB` or `-5 dB`.
fn parse_snr(input: &str) -> IResult<&str, i32> {
    terminated(
        map_res(recognize((opt(char('-')), digit1)), |s: &str| {
            s.parse::<i32>()
        }),
        (space1, tag_no_case("dB")),
    )
    .parse(input)
}

/// Speed with its unit, e.g. `18 WPM` or `45 BPS`.
fn parse_speed(input: &str) -> IResult<&str, Speed> {
    let (input, amount) = map_res(digit1, |s: &str| s.parse::<u16>()).parse(input)?;
    let (input, _) = space1(input)?;
    let (input, unit) = alt((
        value(SpeedUnit::Wpm, tag_no_case("WPM")),
        value(SpeedUnit::Bps, tag_no_case("BPS")),
    ))
    .parse(input)?;
    Ok((
        input,
        Speed {
            value: amount,
            unit,
        },
    ))
}

fn parse_spot_type(input: &str) -> IResult<&str, SpotType> {
    alt((
        value(
            SpotType::NcdxfBeacon,
            (tag_no_case("NCDXF"), space1, tag_no_case("B")),
        ),
        value(SpotType::Beacon, tag_no_case("BEACON")),
        value(SpotType::Cq, tag_no_case("CQ")),
        value(SpotType::Dx, tag_no_case("DX")),
        // Anything else up to the time field
        value(
            SpotType::Other,
            take_while1(|c: char| c.is_ascii_alphabetic()),
        ),
    ))
    .parse(input)
}

/// UTC time from exactly four digits and a `Z`, e.g. `2259Z`.
fn parse_time(input: &str) -> IResult<&str, NaiveTime> {
    map_res(
        terminated(
            take_while_m_n(4, 4, |c: char| c.is_ascii_digit()),
            tag_no_case("Z"),
        ),
        |s: &str| {
            let hour: u32 = s[0..2].parse().map_err(|_| "Invalid hour")?;
            let min: u32 = s[2..4].parse().map_err(|_| "Invalid minute")?;
            NaiveTime::from_hms_opt(hour, min, 0).ok_or("Invalid time values")
        },
    )
    .parse(input)
}

/// Parse a complete RBN spot line.
///
/// # Example
///
/// ```
/// use rbn_callparser::parser::parse_spot;
///
/// let line = "DX de EA5WU-#:    7018.3  RW1M           CW    19 dB  18 WPM  CQ      2259Z";
/// let spot = parse_spot(line).unwrap();
/// assert_eq!(spot.spotter, "EA5WU-#");
/// assert_eq!(spot.dx_call, "RW1M");
/// ```
pub fn parse_spot(input: &str) -> ParseResult<RbnSpot> {
    let input = input.trim();

    let result: IResult<&str, RbnSpot> = (|input| {
        let (input, _) = parse_dx_de_prefix(input)?;
        let (input, spotter) = parse_spotter(input)?;
        let (input, _) = space0(input)?;
        let (input, frequency_khz) = parse_frequency(input)?;
        let (input, _) = space1(input)?;
        let (input, dx_call) = parse_call(input)?;
        let (input, _) = space1(input)?;
        let (input, mode) = parse_mode(input)?;
        let (input, _) = space1(input)?;
        let (input, snr_db) = parse_snr(input)?;
        let (input, _) = space1(input)?;
        let (input, speed) = parse_speed(input)?;
        let (input, _) = space1(input)?;
        let (input, spot_type) = parse_spot_type(input)?;
        let (input, _) = space0(input)?;
        let (input, time) = parse_time(input)?;

        Ok((
            input,
            RbnSpot {
                spotter: spotter.to_string(),
                frequency_khz,
                dx_call: dx_call.to_string(),
                mode,
                snr_db,
                speed,
                spot_type,
                time,
            },
        ))
    })(input);

    match result {
        Ok((_, spot)) => Ok(spot),
        Err(e) => Err(ParseError::InvalidFormat(format!("{:?}", e))),
    }
}

/// Quick pre-filter so the full parser only runs on candidate lines.
#[inline]
pub fn looks_like_spot(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() > 20
        && trimmed
            .get(..6)
            .is_some_and(|head| head.eq_ignore_ascii_case("DX de "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_cq_spot() {
        let line = "DX de EA5WU-#:    7018.3  RW1M           CW    19 dB  18 WPM  CQ      2259Z";
        let spot = parse_spot(line).expect("Should parse successfully");

        assert_eq!(spot.spotter, "EA5WU-#");
        assert!((spot.frequency_khz - 7018.3).abs() < 0.01);
        assert_eq!(spot.dx_call, "RW1M");
        assert_eq!(spot.mode, Mode::Cw);
        assert_eq!(spot.snr_db, 19);
        assert_eq!(
            spot.speed,
            Speed {
                value: 18,
                unit: SpeedUnit::Wpm
            }
        );
        assert_eq!(spot.spot_type, SpotType::Cq);
        assert_eq!(spot.time, NaiveTime::from_hms_opt(22, 59, 0).unwrap());
    }

    #[test]
    fn test_parse_rtty_spot() {
        let line = "DX de KM3T-#:    14080.0  W1AW           RTTY  12 dB  45 BPS  CQ      1200Z";
        let spot = parse_spot(line).expect("Should parse RTTY");

        assert_eq!(spot.mode, Mode::Rtty);
        assert_eq!(spot.speed.value, 45);
        assert_eq!(spot.speed.unit, SpeedUnit::Bps);
    }

    #[test]
    fn test_parse_ncdxf_beacon_spot() {
        let line = "DX de KM3T-2-#:  14100.0  CS3B           CW    24 dB  22 WPM  NCDXF B 2259Z";
        let spot = parse_spot(line).expect("Should parse successfully");

        assert_eq!(spot.spotter, "KM3T-2-#");
        assert_eq!(spot.dx_call, "CS3B");
        assert_eq!(spot.spot_type, SpotType::NcdxfBeacon);
        assert_eq!(spot.time, NaiveTime::from_hms_opt(22, 59, 0).unwrap());
    }

    #[test]
    fn test_parse_beacon_and_dx_types() {
        let line = "DX de K9LC-#:    28169.9  VA3XCD/B       CW     9 dB  10 WPM  BEACON  2259Z";
        let spot = parse_spot(line).expect("Should parse successfully");
        assert_eq!(spot.dx_call, "VA3XCD/B");
        assert_eq!(spot.spot_type, SpotType::Beacon);

        let line = "DX de DK9IP-#:   7025.0  UA9MAT         CW    14 dB  26 WPM  DX      0801Z";
        let spot = parse_spot(line).expect("Should parse successfully");
        assert_eq!(spot.spot_type, SpotType::Dx);
    }

    #[test]
    fn test_looks_like_spot() {
        assert!(looks_like_spot(
            "DX de EA5WU-#:    7018.3  RW1M           CW    19 dB  18 WPM  CQ      2259Z"
        ));
        assert!(looks_like_spot(
            "  dx de EA5WU-#:    7018.3  RW1M           CW    19 dB  18 WPM  CQ      2259Z  "
        ));
        assert!(!looks_like_spot("Hello world"));
        assert!(!looks_like_spot(""));
        assert!(!looks_like_spot("DX de "));
        assert!(!looks_like_spot("Please enter your call: ÄÖÜ ÄÖÜ ÄÖÜ"));
    }

    #[test]
    fn test_case_insensitive_parsing() {
        let line = "dx de ea5wu-#:    7018.3  rw1m           cw    19 db  18 wpm  cq      2259z";
        let spot = parse_spot(line).expect("Should parse case-insensitively");
        assert_eq!(spot.mode, Mode::Cw);
    }

    #[test]
    fn test_negative_snr() {
        let line = "DX de TEST-#:    7018.3  W1AW           CW    -5 dB  20 WPM  CQ      1234Z";
        let spot = parse_spot(line).expect("Should parse negative SNR");
        assert_eq!(spot.snr_db, -5);
    }

    #[test]
    fn test_rejects_bad_time() {
        for line in [
            "DX de TEST-#:    7018.3  W1AW  CW  5 dB  20 WPM  CQ  2500Z",
            "DX de TEST-#:    7018.3  W1AW  CW  5 dB  20 WPM  CQ  123Z",
            "DX de TEST-#:    7018.3  W1AW  CW  5 dB  20 WPM  CQ  1234",
        ] {
            assert!(parse_spot(line).is_err(), "{line}");
        }
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_spot("").is_err());
        assert!(parse_spot("To ALL de SK0MMR: QRV").is_err());
        assert!(parse_spot("DX de TEST-#: abc W1AW CW 5 dB 20 WPM CQ 1234Z").is_err());
    }

    #[test]
    fn test_various_bands() {
        let test_cases = [
            ("DX de T-#: 1820.0 W1 CW 10 dB 20 WPM CQ 0000Z", Some("160m")),
            ("DX de T-#: 3525.0 W1 CW 10 dB 20 WPM CQ 0000Z", Some("80m")),
            ("DX de T-#: 7030.0 W1 CW 10 dB 20 WPM CQ 0000Z", Some("40m")),
            ("DX de T-#: 14025.0 W1 CW 10 dB 20 WPM CQ 0000Z", Some("20m")),
            ("DX de T-#: 21025.0 W1 CW 10 dB 20 WPM CQ 0000Z", Some("15m")),
            ("DX de T-#: 28025.0 W1 CW 10 dB 20 WPM CQ 0000Z", Some("10m")),
            ("DX de T-#: 70100.0 W1 CW 10 dB 20 WPM CQ 0000Z", Some("4m")),
            ("DX de T-#: 9000.0 W1 CW 10 dB 20 WPM CQ 0000Z", None),
        ];

        for (line, expected_band) in test_cases {
            let spot = parse_spot(line).unwrap_or_else(|_| panic!("Should parse: {}", line));
            assert_eq!(spot.band(), expected_band, "{line}");
        }
    }
}
