//! Callsign decoder.
//!
//! Splits a raw callsign into up to three slash-separated segments, works
//! out which segment is the operator's own call and which is a geographic
//! prefix, and attaches the country data for that prefix.
//!
//! # Examples
//!
//! ```text
//! DH1TW          homecall DH1TW, prefix DH
//! VP5/DH1TW      homecall DH1TW, prefix VP5
//! HC2/DH1TW/P    homecall DH1TW, prefix HC (portable in Ecuador)
//! DH1TW/MM       homecall DH1TW, maritime mobile, no prefix
//! RW3DQC/1/P     homecall RW3DQC, call area 1
//! ```

use tracing::{debug, warn};

use crate::cty::CountryDatabase;
use crate::patterns::{has_significant_run, match_call_shape, strip_ssid_suffix};
use crate::station::{Designator, InvalidReason, Station};

/// Decode one raw callsign.
///
/// Never fails: anything that cannot be decoded comes back with
/// `valid == false` and an [`InvalidReason`].
pub fn parse_callsign(raw: &str, db: &CountryDatabase) -> Station {
    let call = raw.trim().to_ascii_uppercase();

    let mut builder = StationBuilder::new(db);
    builder.decode(&call);
    let station = builder.finish(call);

    if let Some(reason) = station.invalid_reason {
        match reason {
            InvalidReason::UnknownCountry => {
                warn!("No country info for prefix {:?} of {}", station.prefix, station.call)
            }
            _ => debug!("Could not decode {:?}: {}", station.call, reason),
        }
    }

    station
}

/// Mutable state for a single decode; consumed by [`StationBuilder::finish`].
struct StationBuilder<'a> {
    db: &'a CountryDatabase,
    valid: bool,
    prefix: String,
    homecall: String,
    mm: bool,
    am: bool,
    beacon: bool,
    call_area: Option<String>,
    reason: Option<InvalidReason>,
}

impl<'a> StationBuilder<'a> {
    fn new(db: &'a CountryDatabase) -> Self {
        Self {
            db,
            valid: false,
            prefix: String::new(),
            homecall: String::new(),
            mm: false,
            am: false,
            beacon: false,
            call_area: None,
            reason: None,
        }
    }

    fn decode(&mut self, call: &str) {
        if !has_significant_run(call) {
            self.reason = Some(InvalidReason::TooShort);
            return;
        }

        let call = strip_ssid_suffix(call);
        let segments: Vec<&str> = call.split('/').collect();

        match segments.as_slice() {
            [single] => {
                self.check_call(single, single);
            }
            [first, second] => self.decode_two(first, second),
            [first, second, third] => self.decode_three(first, second, third),
            _ => {
                self.valid = false;
                self.reason = Some(InvalidReason::TooManySegments);
            }
        }
    }

    /// `CALL/APPENDIX`, `PREFIX/CALL` or `CALL/PREFIX`.
    fn decode_two(&mut self, first: &str, second: &str) {
        let designator = self.apply_designator(second);
        if !designator && second.len() == 1 && second.chars().all(|c| c.is_ascii_digit()) {
            self.call_area = Some(second.to_string());
        }

        if designator || self.call_area.is_some() {
            self.check_call(first, first);
            if self.mm || self.am {
                self.prefix.clear();
            }
            return;
        }

        let db = self.db;
        if self.check_call(first, second) == (true, true) {
            if self.check_call(second, first) == (true, true) {
                // Both readings work. Keep the reversed one unless the second
                // segment is itself a registered prefix (VP2E and friends).
                if let Some(prefix) = db.resolve(second)
                    && prefix == self.homecall
                {
                    self.prefix = second.to_string();
                    self.homecall = first.to_string();
                }
            } else {
                self.homecall = first.to_string();
                if let Some(prefix) = db.resolve(second) {
                    self.prefix = prefix.to_string();
                }
            }
        } else {
            self.check_call(second, first);
        }
    }

    /// `PREFIX/CALL/DESIGNATOR`, `CALL/PREFIX/DESIGNATOR` or `CALL/AREA/P`.
    fn decode_three(&mut self, first: &str, second: &str, third: &str) {
        // Only the flags matter; an unknown last segment is tolerated.
        self.apply_designator(third);

        let explicit_area =
            (third == "P" && second.parse::<i64>().is_ok()).then(|| second.to_string());

        // Portable lighthouse
        if (second == "P" && third == "LH") || (second == "LH" && third == "P") {
            self.check_call(first, first);
            return;
        }

        if self.mm || self.am {
            self.valid = false;
            self.reason = Some(InvalidReason::UnsupportedDesignator);
            return;
        }

        if self.check_call(second, first) == (true, true) {
            return;
        }

        if let (true, false) = self.check_call(first, second)
            && let Some(area) = explicit_area
        {
            // N7ZG/1/P
            self.call_area = Some(area);
            self.valid = true;
            self.homecall = first.to_string();
        }
    }

    /// Set the flag carried by a designator token, if it is one.
    fn apply_designator(&mut self, token: &str) -> bool {
        match Designator::from_token(token) {
            Some(designator) => {
                match designator {
                    Designator::MaritimeMobile => self.mm = true,
                    Designator::AeronauticalMobile => self.am = true,
                    Designator::Beacon => self.beacon = true,
                    _ => {}
                }
                true
            }
            None => false,
        }
    }

    /// Test `call` as a homecall and `prefix` as a country prefix.
    ///
    /// Whatever succeeds is recorded, so later checks overwrite earlier
    /// partial results. The station only becomes valid when both succeed
    /// in the same check.
    fn check_call(&mut self, call: &str, prefix: &str) -> (bool, bool) {
        let db = self.db;
        let shape = match_call_shape(call);
        let resolved = db.resolve(prefix);

        if shape.is_some() {
            self.homecall = call.to_string();
        }
        if let Some(resolved) = resolved {
            self.prefix = resolved.to_string();
        }

        if let (Some(shape), Some(_)) = (shape, resolved) {
            self.valid = true;
            if self.call_area.is_none() {
                self.call_area = shape.call_area.map(String::from);
            }
        }

        (shape.is_some(), resolved.is_some())
    }

    /// Attach country data and freeze the result.
    fn finish(mut self, call: String) -> Station {
        let db = self.db;
        let mut station = Station {
            call,
            mm: self.mm,
            am: self.am,
            beacon: self.beacon,
            ..Default::default()
        };

        if self.valid && !self.mm && !self.am {
            if self.prefix.is_empty() {
                self.invalidate(InvalidReason::NoPrefix);
            } else if let Some(alias) = db.alias(&self.prefix) {
                let country = db.alias_country(alias);
                station.country = country.name.clone();
                station.latitude = country.latitude;
                station.longitude = country.longitude;
                station.primary_prefix = country.primary_prefix.clone();
                station.continent = Some(country.continent);
                station.utc_offset = country.utc_offset;
                station.cqz = alias.cqz;
                station.ituz = alias.ituz;
            } else {
                self.invalidate(InvalidReason::UnknownCountry);
            }
        }

        if self.valid && self.homecall.is_empty() {
            self.invalidate(InvalidReason::NoHomecall);
        }

        if !self.valid && self.reason.is_none() {
            // The homecall is only set once some check accepted the call shape.
            self.reason = Some(if self.homecall.is_empty() {
                InvalidReason::NoHomecall
            } else {
                InvalidReason::NoPrefix
            });
        }

        station.valid = self.valid;
        station.prefix = self.prefix;
        station.homecall = self.homecall;
        station.call_area = self.call_area;
        station.invalid_reason = if self.valid { None } else { self.reason };
        station
    }

    fn invalidate(&mut self, reason: InvalidReason) {
        self.valid = false;
        self.reason = Some(reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::country::Continent;
    use proptest::prelude::*;
    use std::sync::OnceLock;

    fn db() -> &'static CountryDatabase {
        static DB: OnceLock<CountryDatabase> = OnceLock::new();
        DB.get_or_init(|| {
            include_str!("../data/cty.dat")
                .parse()
                .expect("fixture should load")
        })
    }

    fn parse(raw: &str) -> Station {
        parse_callsign(raw, db())
    }

    fn assert_valid(raw: &str) {
        let station = parse(raw);
        assert!(station.valid, "{raw} should be valid: {station:?}");
    }

    fn assert_invalid(raw: &str) {
        let station = parse(raw);
        assert!(!station.valid, "{raw} should be invalid: {station:?}");
        assert!(station.invalid_reason.is_some(), "{raw} has no reason");
    }

    #[test]
    fn test_all_properties_with_valid_call() {
        let s = parse("HC2/DH1TW/P");
        assert!(s.valid);
        assert_eq!(s.call, "HC2/DH1TW/P");
        assert_eq!(s.prefix, "HC");
        assert_eq!(s.primary_prefix, "HC");
        assert_eq!(s.homecall, "DH1TW");
        assert_eq!(s.country, "Ecuador");
        assert!((s.latitude - -1.4).abs() < 1e-6);
        assert!((s.longitude - 78.4).abs() < 1e-6);
        assert_eq!(s.cqz, 10);
        assert_eq!(s.ituz, 12);
        assert_eq!(s.continent, Some(Continent::SouthAmerica));
        assert!((s.utc_offset - 5.0).abs() < 1e-6);
        assert!(!s.mm);
        assert!(!s.am);
        assert!(!s.beacon);
        assert_eq!(s.invalid_reason, None);
    }

    #[test]
    fn test_input_is_normalized() {
        let s = parse("  hc2/dh1tw/p ");
        assert!(s.valid);
        assert_eq!(s.call, "HC2/DH1TW/P");
        assert_eq!(s.homecall, "DH1TW");
    }

    #[test]
    fn test_valid_call_prefixes() {
        let cases = [
            ("DH1T", "DH"),
            ("DH1TW/P", "DH"),
            ("DH1TW/VP5", "VP5"),
            ("VP5/DH1TW", "VP5"),
            ("VP5/DH1TW/P", "VP5"),
            ("MM/DH1TW/P", "MM"),
            ("DH1TW/QRP", "DH"),
            ("DH1TW/QRPP", "DH"),
            ("MM/DH1TW/QRP", "MM"),
            ("MM/DH1TW/QRPP", "MM"),
            ("MM/DH1TW/B", "MM"),
            ("MM/DH1TW/BCN", "MM"),
            ("EA1/DH1TW", "EA"),
            ("EA1/DH1TW/P", "EA"),
            ("DH1TW/EA1", "EA"),
            ("DH1TW/EA", "EA"),
            ("VP2E/AL1O/P", "VP2E"),
            ("VP2E/DL2001IRTA/P", "VP2E"),
            ("DH1TW/EA8/QRP", "EA8"),
            ("ER/KL1A", "ER"),
            ("DL4SDW/HI3", "HI"),
            ("SV9/M1PAH/HH", "SV9"),
            ("8J3XVIII", "8J"),
            ("3DA0TM", "3DA"),
            ("9A2HQ", "9A"),
            ("1A0KM", "1A"),
            ("RU27TT", "R"),
            ("UE90K", "UE9"),
            ("DL2000ALMK", "DL"),
            ("HF450NS", "HF"),
            ("GB558VUL", "G"),
            ("F/ON5OF", "F"),
            ("OX1A/OZ1ABC", "OX"),
            ("OX1A/OZ", "OZ"),
            ("OZ5V", "OZ"),
            ("OV9DV", "OV"),
            ("CQ59HQ", "CQ"),
            ("DB0SUE-10", "DB"),
            ("DK0WYC-2", "DK"),
            ("G0KTD/P", "G"),
            ("GW8IZR-#", "GW"),
            ("KM3T-2-#", "K"),
        ];

        for (raw, prefix) in cases {
            let s = parse(raw);
            assert!(s.valid, "{raw} should be valid: {s:?}");
            assert_eq!(s.prefix, prefix, "prefix of {raw}");
        }
    }

    #[test]
    fn test_invalid_calls() {
        for raw in [
            "DH",
            "DH1",
            "DH1TW/012",
            "01A/DH1TW",
            "01A/DH1TW/P",
            "01A/DH1TW/MM",
            "QSL",
            "QRV",
            "T0NTO",
            "T0ALL",
            "H1GHMUF",
            "C1BBI",
            "PU1MHZ/QAP",
            "DU7/PA0",
            "DIPLOMA",
            "CQAS",
            "IK2SAV/P1",
            "IKOFTA",
            "SP2/SP3",
            "CQ",
            "RADAR",
            "MUF/INFO",
            "RAVIDEO",
            "PIRATE",
            "XE1/H",
            "Z125VZ",
            "ZD6DYA",
            "F5BUU1",
            "0",
            "0123456789",
            "CD43000",
            "GN",
            "2320900",
            "ITT9APL",
            "MUF",
        ] {
            assert_invalid(raw);
        }

        assert_eq!(parse("ZD6DYA").prefix, "");
        assert_eq!(parse("GN").homecall, "");
        assert_eq!(parse("ARABS").homecall, "");
    }

    #[test]
    fn test_invalid_calls_with_special_characters() {
        for raw in ["DK()DK", "DK/DK", "'!$&/()@", "", "   "] {
            assert_invalid(raw);
        }
    }

    #[test]
    fn test_non_ascii_letters_are_not_case_mapped() {
        let s = parse("dh1tß");
        assert!(!s.valid, "{s:?}");
        assert_eq!(s.call, "DH1Tß");
        assert!(s.homecall.is_empty());
        assert_eq!(s.invalid_reason, Some(InvalidReason::NoHomecall));
    }

    #[test]
    fn test_invalid_reasons() {
        assert_eq!(parse("").invalid_reason, Some(InvalidReason::TooShort));
        assert_eq!(parse("DH").invalid_reason, Some(InvalidReason::TooShort));
        assert_eq!(parse("DK()DK").invalid_reason, Some(InvalidReason::TooShort));
        assert_eq!(parse("ARABS").invalid_reason, Some(InvalidReason::NoHomecall));
        assert_eq!(parse("SP2/SP3").invalid_reason, Some(InvalidReason::NoHomecall));
        assert_eq!(parse("ZD6DYA").invalid_reason, Some(InvalidReason::NoPrefix));
        assert_eq!(parse("T0NTO").invalid_reason, Some(InvalidReason::NoPrefix));
        // Call shape accepted first, prefix lookup failed afterwards
        let s = parse("DH1TW/");
        assert_eq!(s.homecall, "DH1TW");
        assert_eq!(s.invalid_reason, Some(InvalidReason::NoPrefix));
        assert_eq!(
            parse("VP2M/DH1TW/MM").invalid_reason,
            Some(InvalidReason::UnsupportedDesignator)
        );
        assert_eq!(
            parse("EA8/DH1TW/P/QRP").invalid_reason,
            Some(InvalidReason::TooManySegments)
        );
        assert_eq!(parse("DH1TW").invalid_reason, None);
    }

    #[test]
    fn test_lighthouse() {
        assert_valid("DH1TW/LH");
        assert_eq!(parse("DH1TW/LH").prefix, "DH");
        assert_valid("UR7GO/P/LH");
        assert_eq!(parse("UR7GO/P/LH").prefix, "UR");
        assert_valid("UR7GO/LH/P");
        assert_eq!(parse("UR7GO/LH/P").homecall, "UR7GO");
    }

    #[test]
    fn test_portable_and_mobile() {
        assert_valid("MM/DH1TW/P");
        assert_eq!(parse("MM/DH1TW/P").prefix, "MM");
        assert_eq!(parse("MM/DH1TW/P").country, "Scotland");
        assert_valid("VK3/DH1TW/M");
        assert_eq!(parse("VK3/DH1TW/M").prefix, "VK");
    }

    #[test]
    fn test_number_appendix() {
        let cases = [
            ("DH1TW/EA3", "EA"),
            ("YB9IR/3", "YB"),
            ("UA9MAT/1", "UA9"),
            ("W3LPL/5", "K"),
            ("UA9KRM/3", "UA9"),
            ("UR900CC/4", "UR"),
        ];
        for (raw, primary) in cases {
            assert_eq!(parse(raw).primary_prefix, primary, "{raw}");
        }
        assert_eq!(parse("W3LPL/5").call_area.as_deref(), Some("5"));
    }

    #[test]
    fn test_call_area() {
        assert_eq!(parse("DH1TW").call_area.as_deref(), Some("1"));
        assert_eq!(parse("3DA0TM").call_area.as_deref(), Some("0"));
        assert_eq!(parse("RU27TT").call_area.as_deref(), Some("7"));
        assert_eq!(parse("DL2000ALMK").call_area, None);
    }

    #[test]
    fn test_explicit_call_area_portable() {
        let s = parse("RW3DQC/1/P");
        assert!(s.valid);
        assert_eq!(s.homecall, "RW3DQC");
        assert_eq!(s.prefix, "R");
        assert_eq!(s.call_area.as_deref(), Some("1"));
        assert_eq!(s.primary_prefix, "UA");

        let s = parse("N7ZG/1/P");
        assert!(s.valid);
        assert_eq!(s.homecall, "N7ZG");
        assert_eq!(s.call_area.as_deref(), Some("1"));
        assert_eq!(s.country, "United States");
    }

    #[test]
    fn test_beacon_flag() {
        assert!(parse("DH1TW/BCN").beacon);
        assert_valid("DH1TW/BCN");
        assert!(parse("DH1TW/B").beacon);
        assert_valid("DH1TW/B");
        assert_valid("VP2M/DH1TW/BCN");
        assert!(parse("VP2M/DH1TW/BCN").beacon);
        assert!(!parse("VP2M/DH1TW").beacon);

        let s = parse("W0ERE/B");
        assert!(s.valid);
        assert!(s.beacon);
        assert_eq!(s.prefix, "W0");
        assert_eq!(s.primary_prefix, "K");
    }

    #[test]
    fn test_aeronautical_mobile() {
        assert!(parse("DH1TW/AM").am);
        assert_valid("DH1TW/AM");
        assert_eq!(parse("DH1TW/AM").prefix, "");
        assert!(parse("VP2M/DH1TW/AM").am);
        assert_invalid("VP2M/DH1TW/AM");
        assert_valid("VP2M/DH1TW");
        assert!(!parse("VP2M/DH1TW").am);
    }

    #[test]
    fn test_maritime_mobile() {
        let s = parse("DH1TW/MM");
        assert!(s.valid);
        assert!(s.mm);
        assert_eq!(s.prefix, "");
        assert_eq!(s.homecall, "DH1TW");
        assert_eq!(s.country, "");
        assert_eq!(s.continent, None);

        assert!(parse("VP2M/DH1TW/MM").mm);
        assert_invalid("VP2M/DH1TW/MM");

        let s = parse("R7GA/MM");
        assert!(s.valid);
        assert!(s.mm);
        assert_eq!(s.prefix, "");

        assert_eq!(parse("FT5WQ/MM").prefix, "");
        assert_valid("FT5WQ/MM");
    }

    #[test]
    fn test_two_segment_orientation() {
        // Prefix first
        let s = parse("VP2M/DH1TW");
        assert_eq!(s.homecall, "DH1TW");
        assert_eq!(s.prefix, "VP2M");
        assert_eq!(s.country, "Montserrat");

        // Both segments look like calls; the reversed reading stands.
        let s = parse("VP2E/AL1O");
        assert_eq!(s.homecall, "AL1O");
        assert_eq!(s.prefix, "VP2E");

        // The second segment is itself a registered prefix.
        let s = parse("AL1O/VP2E");
        assert!(s.valid);
        assert_eq!(s.homecall, "AL1O");
        assert_eq!(s.prefix, "VP2E");
        assert_eq!(s.country, "Anguilla");
    }

    #[test]
    fn test_zone_override_reaches_station() {
        let s = parse("VK6ABC");
        assert_eq!(s.prefix, "VK6");
        assert_eq!((s.cqz, s.ituz), (29, 58));
        assert_eq!(s.primary_prefix, "VK");

        let s = parse("VK2ABC");
        assert_eq!((s.cqz, s.ituz), (30, 59));
    }

    #[test]
    fn test_primary_prefix_with_slash() {
        let s = parse("FT5WQ");
        assert!(s.valid);
        assert_eq!(s.prefix, "FT5W");
        assert_eq!(s.primary_prefix, "FT/W");
        assert_eq!(s.country, "Crozet Island");
    }

    #[test]
    fn test_deterministic() {
        for raw in ["HC2/DH1TW/P", "VP2E/AL1O", "DH1TW/MM", "ZD6DYA", ""] {
            assert_eq!(parse(raw), parse(raw));
        }
    }

    proptest! {
        #[test]
        fn prop_parse_never_panics_and_is_consistent(raw in "[A-Za-z0-9/#() -]{0,16}") {
            let first = parse(&raw);
            let second = parse(&raw);
            prop_assert_eq!(&first, &second);

            prop_assert_eq!(first.valid, first.invalid_reason.is_none());
            if first.valid {
                prop_assert!(!first.homecall.is_empty());
                if !first.mm && !first.am {
                    prop_assert!(db().alias(&first.prefix).is_some());
                    prop_assert!(!first.country.is_empty());
                    prop_assert!(first.continent.is_some());
                }
            }
        }

        #[test]
        fn prop_alias_with_call_suffix_decodes(index in 0usize..200, area in 0u8..10, suffix in "[A-Z]{1,3}") {
            let aliases: Vec<_> = db()
                .aliases()
                .filter(|a| a.prefix.chars().all(|c| c.is_ascii_uppercase()) && a.prefix.len() <= 2)
                .map(|a| a.prefix.clone())
                .collect();
            let alias = &aliases[index % aliases.len()];
            let raw = format!("{alias}{area}{suffix}");

            let station = parse(&raw);
            prop_assert!(station.valid, "{} should be valid", raw);
            prop_assert!(raw.starts_with(&station.prefix));
        }
    }
}
