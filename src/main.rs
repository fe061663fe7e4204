//! rbn-callparser CLI - Decode amateur radio callsigns and RBN spots.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rbn_callparser::{
    callsign::parse_callsign,
    config::Config,
    cty::CountryDatabase,
    decorate::decorate_stations,
    filter::{StationFilter, any_filter_matches},
    parser::{looks_like_spot, parse_spot},
    station::Station,
    stats::DecodeStats,
};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// rbn-callparser - Decode callsigns into country, zone and continent data
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the cty.dat country file
    #[arg(long, env = "RBN_CTY", global = true)]
    cty: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode callsigns given as arguments, or one per line on stdin
    Lookup {
        calls: Vec<String>,

        /// Print one JSON object per station
        #[arg(long)]
        json: bool,

        /// Take station filters from this config file instead of the default one
        #[arg(long)]
        filter_config: Option<PathBuf>,

        /// Print decode statistics to stderr when done
        #[arg(long)]
        stats: bool,
    },

    /// Show which registered prefix a candidate resolves to
    Resolve {
        #[arg(required = true)]
        candidates: Vec<String>,
    },

    /// Decorate RBN spot lines with country data, one JSON record per line
    Decorate {
        /// Read spot lines from this file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let config = Config::load()?;
    config.validate()?;

    let cty_path = args.cty.clone().unwrap_or_else(|| config.cty_path.clone());
    let db = CountryDatabase::load(&cty_path)
        .with_context(|| format!("Failed to load country data from {}", cty_path.display()))?;

    match args.command {
        Command::Lookup {
            calls,
            json,
            filter_config,
            stats,
        } => {
            let filters = match filter_config {
                Some(path) => {
                    let filter_config = Config::load_from(&path)?;
                    filter_config.validate()?;
                    filter_config.filters
                }
                None => config.filters.clone(),
            };
            let options = LookupOptions {
                json: json || config.json,
                show_invalid: config.show_invalid,
                filters,
                print_stats: stats,
            };
            run_lookup(&db, calls, &options)
        }
        Command::Resolve { candidates } => run_resolve(&db, &candidates),
        Command::Decorate { input } => run_decorate(&db, input),
    }
}

struct LookupOptions {
    json: bool,
    show_invalid: bool,
    filters: Vec<StationFilter>,
    print_stats: bool,
}

fn run_lookup(db: &CountryDatabase, calls: Vec<String>, options: &LookupOptions) -> Result<()> {
    let stats = DecodeStats::new();
    let mut out = io::stdout().lock();

    if options.filters.is_empty() {
        debug!("No station filters configured");
    } else {
        info!("Applying {} station filter(s)", options.filters.len());
    }

    if calls.is_empty() {
        for line in io::stdin().lock().lines() {
            let line = line.context("Failed to read stdin")?;
            if line.trim().is_empty() {
                continue;
            }
            lookup_one(db, &line, options, &stats, &mut out)?;
        }
    } else {
        for call in &calls {
            lookup_one(db, call, options, &stats, &mut out)?;
        }
    }

    if options.print_stats {
        eprintln!("{}", stats.summary());
    }
    Ok(())
}

fn lookup_one(
    db: &CountryDatabase,
    raw: &str,
    options: &LookupOptions,
    stats: &DecodeStats,
    out: &mut impl Write,
) -> Result<()> {
    let start = Instant::now();
    let station = parse_callsign(raw, db);
    stats.record_station(&station, start.elapsed());

    if !station.valid && !options.show_invalid {
        return Ok(());
    }
    if !options.filters.is_empty() && !any_filter_matches(&options.filters, &station) {
        debug!("Filtered out {}", station.call);
        return Ok(());
    }

    print_station(out, &station, options.json)
}

fn print_station(out: &mut impl Write, station: &Station, json: bool) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string(station)?)?;
    } else {
        writeln!(out, "{}", station)?;
    }
    Ok(())
}

fn run_resolve(db: &CountryDatabase, candidates: &[String]) -> Result<()> {
    let mut out = io::stdout().lock();
    for candidate in candidates {
        match db.resolve_alias(candidate) {
            Some(alias) => {
                let country = db.alias_country(alias);
                writeln!(
                    out,
                    "{}: {} -> {} [{}] {} CQ {} ITU {}",
                    candidate,
                    alias.prefix,
                    country.name,
                    country.primary_prefix,
                    country.continent,
                    alias.cqz,
                    alias.ituz
                )?;
            }
            None => writeln!(out, "{}: no matching prefix", candidate)?,
        }
    }
    Ok(())
}

fn run_decorate(db: &CountryDatabase, input: Option<PathBuf>) -> Result<()> {
    let reader: Box<dyn BufRead> = match input {
        Some(path) => {
            let file = File::open(&path)
                .with_context(|| format!("Failed to open spot file: {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(io::stdin().lock()),
    };

    let stats = DecodeStats::new();
    let mut out = io::stdout().lock();

    for line in reader.lines() {
        let line = line.context("Failed to read spot line")?;
        process_line(db, &line, &stats, &mut out)?;
    }

    eprintln!("{}", stats.summary());
    Ok(())
}

/// Process a single line of RBN output.
fn process_line(
    db: &CountryDatabase,
    line: &str,
    stats: &DecodeStats,
    out: &mut impl Write,
) -> Result<()> {
    stats.record_line();

    // Quick filter for non-spot lines
    if !looks_like_spot(line) {
        stats.record_non_spot();
        debug!("Non-spot line: {}", line);
        return Ok(());
    }

    let spot = match parse_spot(line) {
        Ok(spot) => spot,
        Err(e) => {
            stats.record_spot_parse_failure();
            debug!("Parse error for '{}': {}", line, e);
            return Ok(());
        }
    };

    let de = timed_decode(db, &spot.spotter, stats);
    let dx = timed_decode(db, &spot.dx_call, stats);

    match decorate_stations(&spot, &de, &dx, Utc::now()) {
        Ok(decorated) => {
            stats.record_decorated();
            writeln!(out, "{}", serde_json::to_string(&decorated)?)?;
        }
        Err(e) => {
            stats.record_decorate_failure();
            debug!("{}", e);
        }
    }
    Ok(())
}

fn timed_decode(db: &CountryDatabase, call: &str, stats: &DecodeStats) -> Station {
    let start = Instant::now();
    let station = parse_callsign(call, db);
    stats.record_station(&station, start.elapsed());
    station
}
