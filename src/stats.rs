//! Decode statistics.
//!
//! Counters for decoded callsigns and processed feed lines, plus a latency
//! histogram of individual decodes. Everything is internally synchronized so
//! one collector can be shared across threads.

use hdrhistogram::Histogram;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::country::Continent;
use crate::station::{InvalidReason, Station};

/// Upper bound of the latency histogram: one second, in nanoseconds.
const MAX_TRACKED_LATENCY_NS: u64 = 1_000_000_000;

/// Thread-safe statistics collector for callsign decoding.
#[derive(Debug)]
pub struct DecodeStats {
    /// Callsigns run through the decoder
    pub calls_decoded: AtomicU64,

    pub valid_calls: AtomicU64,

    pub invalid_calls: AtomicU64,

    /// Feed lines read
    pub lines_processed: AtomicU64,

    /// Lines that were not spots (filtered early)
    pub non_spot_lines: AtomicU64,

    /// Lines that looked like spots but failed to parse
    pub spot_parse_failures: AtomicU64,

    pub spots_decorated: AtomicU64,

    /// Spots with an undecodable call or unknown band
    pub decorate_failures: AtomicU64,

    /// Decode latency in nanoseconds
    latency_histogram: RwLock<Histogram<u64>>,

    invalid_by_reason: RwLock<HashMap<InvalidReason, u64>>,

    calls_by_continent: RwLock<HashMap<Continent, u64>>,

    calls_by_country: RwLock<HashMap<String, u64>>,

    start_time: Instant,
}

impl DecodeStats {
    pub fn new() -> Self {
        Self {
            calls_decoded: AtomicU64::new(0),
            valid_calls: AtomicU64::new(0),
            invalid_calls: AtomicU64::new(0),
            lines_processed: AtomicU64::new(0),
            non_spot_lines: AtomicU64::new(0),
            spot_parse_failures: AtomicU64::new(0),
            spots_decorated: AtomicU64::new(0),
            decorate_failures: AtomicU64::new(0),
            latency_histogram: RwLock::new(
                Histogram::new_with_bounds(1, MAX_TRACKED_LATENCY_NS, 3)
                    .expect("Failed to create latency histogram"),
            ),
            invalid_by_reason: RwLock::new(HashMap::new()),
            calls_by_continent: RwLock::new(HashMap::new()),
            calls_by_country: RwLock::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Record one decoded station and how long the decode took.
    pub fn record_station(&self, station: &Station, latency: Duration) {
        self.calls_decoded.fetch_add(1, Ordering::Relaxed);

        let nanos = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
        if let Ok(mut hist) = self.latency_histogram.write() {
            let _ = hist.record(nanos.clamp(1, MAX_TRACKED_LATENCY_NS));
        }

        if !station.valid {
            self.invalid_calls.fetch_add(1, Ordering::Relaxed);
            if let Some(reason) = station.invalid_reason
                && let Ok(mut map) = self.invalid_by_reason.write()
            {
                *map.entry(reason).or_insert(0) += 1;
            }
            return;
        }

        self.valid_calls.fetch_add(1, Ordering::Relaxed);

        if let Some(continent) = station.continent
            && let Ok(mut map) = self.calls_by_continent.write()
        {
            *map.entry(continent).or_insert(0) += 1;
        }

        if !station.country.is_empty()
            && let Ok(mut map) = self.calls_by_country.write()
        {
            *map.entry(station.country.clone()).or_insert(0) += 1;
        }
    }

    pub fn record_line(&self) {
        self.lines_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_non_spot(&self) {
        self.non_spot_lines.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_spot_parse_failure(&self) {
        self.spot_parse_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decorated(&self) {
        self.spots_decorated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decorate_failure(&self) {
        self.decorate_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Decodes per second since the collector was created.
    pub fn calls_per_second(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.calls_decoded.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Generate a summary report.
    pub fn summary(&self) -> StatsSummary {
        let latency_ns = self
            .latency_histogram
            .read()
            .ok()
            .filter(|h| h.len() > 0)
            .map(|h| HistogramPercentiles {
                p50: h.value_at_quantile(0.50),
                p90: h.value_at_quantile(0.90),
                p99: h.value_at_quantile(0.99),
                min: h.min(),
                max: h.max(),
                mean: h.mean(),
            });

        let invalid_by_reason = self
            .invalid_by_reason
            .read()
            .map(|m| m.iter().map(|(k, v)| (k.to_string(), *v)).collect())
            .unwrap_or_default();

        let calls_by_continent = self
            .calls_by_continent
            .read()
            .map(|m| m.iter().map(|(k, v)| (k.code().to_string(), *v)).collect())
            .unwrap_or_default();

        let top_countries = self
            .calls_by_country
            .read()
            .map(|m| {
                let mut vec: Vec<_> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
                vec.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
                vec.truncate(10);
                vec
            })
            .unwrap_or_default();

        StatsSummary {
            elapsed_secs: self.elapsed().as_secs_f64(),
            calls_decoded: self.calls_decoded.load(Ordering::Relaxed),
            valid_calls: self.valid_calls.load(Ordering::Relaxed),
            invalid_calls: self.invalid_calls.load(Ordering::Relaxed),
            lines_processed: self.lines_processed.load(Ordering::Relaxed),
            non_spot_lines: self.non_spot_lines.load(Ordering::Relaxed),
            spot_parse_failures: self.spot_parse_failures.load(Ordering::Relaxed),
            spots_decorated: self.spots_decorated.load(Ordering::Relaxed),
            decorate_failures: self.decorate_failures.load(Ordering::Relaxed),
            calls_per_second: self.calls_per_second(),
            latency_ns,
            invalid_by_reason,
            calls_by_continent,
            top_countries,
        }
    }
}

impl Default for DecodeStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Percentile values from a histogram.
#[derive(Debug, Clone, Serialize)]
pub struct HistogramPercentiles {
    pub p50: u64,
    pub p90: u64,
    pub p99: u64,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
}

/// Summary of collected statistics.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSummary {
    pub elapsed_secs: f64,
    pub calls_decoded: u64,
    pub valid_calls: u64,
    pub invalid_calls: u64,
    pub lines_processed: u64,
    pub non_spot_lines: u64,
    pub spot_parse_failures: u64,
    pub spots_decorated: u64,
    pub decorate_failures: u64,
    pub calls_per_second: f64,
    pub latency_ns: Option<HistogramPercentiles>,
    pub invalid_by_reason: HashMap<String, u64>,
    pub calls_by_continent: HashMap<String, u64>,
    pub top_countries: Vec<(String, u64)>,
}

impl StatsSummary {
    /// Share of decoded calls that were valid, in percent.
    pub fn valid_percent(&self) -> f64 {
        if self.calls_decoded > 0 {
            self.valid_calls as f64 / self.calls_decoded as f64 * 100.0
        } else {
            0.0
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "═══════════════════════════════════════════════════════")?;
        writeln!(f, "                CALLSIGN DECODE STATISTICS")?;
        writeln!(f, "═══════════════════════════════════════════════════════")?;
        writeln!(f)?;
        writeln!(f, "Runtime: {:.1}s", self.elapsed_secs)?;
        writeln!(f, "Calls decoded: {}", self.calls_decoded)?;
        writeln!(
            f,
            "Valid: {} ({:.1}%)",
            self.valid_calls,
            self.valid_percent()
        )?;
        writeln!(f, "Invalid: {}", self.invalid_calls)?;
        writeln!(f, "Rate: {:.1} calls/sec", self.calls_per_second)?;
        writeln!(f)?;

        if self.lines_processed > 0 {
            writeln!(f, "Feed lines: {}", self.lines_processed)?;
            writeln!(f, "Non-spot lines: {}", self.non_spot_lines)?;
            writeln!(f, "Spot parse failures: {}", self.spot_parse_failures)?;
            writeln!(f, "Spots decorated: {}", self.spots_decorated)?;
            writeln!(f, "Decorate failures: {}", self.decorate_failures)?;
            writeln!(f)?;
        }

        if let Some(ref p) = self.latency_ns {
            writeln!(f, "Decode Latency (ns):")?;
            writeln!(f, "  Min: {}, Max: {}, Mean: {:.1}", p.min, p.max, p.mean)?;
            writeln!(f, "  P50: {}, P90: {}, P99: {}", p.p50, p.p90, p.p99)?;
            writeln!(f)?;
        }

        if !self.invalid_by_reason.is_empty() {
            writeln!(f, "Invalid by Reason:")?;
            let mut reasons: Vec<_> = self.invalid_by_reason.iter().collect();
            reasons.sort_by(|a, b| b.1.cmp(a.1));
            for (reason, count) in reasons {
                writeln!(f, "  {}: {}", reason, count)?;
            }
            writeln!(f)?;
        }

        if !self.calls_by_continent.is_empty() {
            writeln!(f, "Calls by Continent:")?;
            let mut continents: Vec<_> = self.calls_by_continent.iter().collect();
            continents.sort_by(|a, b| b.1.cmp(a.1));
            for (continent, count) in continents {
                writeln!(f, "  {}: {}", continent, count)?;
            }
            writeln!(f)?;
        }

        if !self.top_countries.is_empty() {
            writeln!(f, "Top 10 Countries:")?;
            for (i, (country, count)) in self.top_countries.iter().enumerate() {
                writeln!(f, "  {}. {}: {}", i + 1, country, count)?;
            }
        }

        Ok(())
    }
}
