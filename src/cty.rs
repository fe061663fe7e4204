//! Loader for the `cty.dat` country file and the prefix index built from it.
//!
//! # File Format
//!
//! Each entity is one definition line with nine colon-separated fields,
//! followed by one or more lines of comma-separated prefix aliases. The
//! alias group ends at the line whose last character is `;`:
//!
//! ```text
//! Ecuador:                  10:  12:  SA:   -1.40:    78.40:     5.0:  HC:
//!     HC,HD;
//! Australia:                30:  59:  OC:  -23.70:  -132.33:   -10.0:  VK:
//!     AX,VH,VI,VJ,VK,VL,VM,VN,VZ,VK6(29)[58];
//! ```
//!
//! An alias may override the entity's CQ zone with `(n)` and its ITU zone
//! with `[n]`.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::take_till,
    character::complete::{anychar, char, digit1},
    combinator::{map_res, value},
    multi::many0,
    sequence::delimited,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::country::{Continent, CountryRecord, PrefixAlias};

/// Number of colon-separated fields on a definition line.
const DEFINITION_FIELDS: usize = 9;

/// Errors that can occur while loading the country file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to open country file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read country data: {0}")]
    Read(#[from] io::Error),

    #[error("Malformed country data at line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("Country data contains no entities")]
    Empty,
}

/// Immutable country table and prefix index.
///
/// Built once at startup and then shared by reference; every lookup is
/// read-only so the database can be used from any number of threads.
#[derive(Debug, Clone, Default)]
pub struct CountryDatabase {
    /// All records in file order; `records[n - 1]` has sequence number `n`.
    records: Vec<CountryRecord>,

    /// Primary prefix to record index. Later duplicates replace earlier ones.
    by_primary: HashMap<String, usize>,

    /// Alias text to alias entry.
    aliases: HashMap<String, PrefixAlias>,
}

/// An alias token split into its prefix and optional zone overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AliasToken<'a> {
    prefix: &'a str,
    cqz: Option<u8>,
    ituz: Option<u8>,
}

#[derive(Debug, Clone, Copy)]
enum ZoneOverride {
    Cq(u8),
    Itu(u8),
    Other,
}

/// A definition whose alias group has not been terminated yet.
struct PendingCountry {
    record: CountryRecord,
    line: usize,
    aliases: Vec<(String, Option<u8>, Option<u8>)>,
}

fn cq_override(input: &str) -> IResult<&str, ZoneOverride> {
    map_res(delimited(char('('), digit1, char(')')), |d: &str| {
        d.parse::<u8>().map(ZoneOverride::Cq)
    })
    .parse(input)
}

fn itu_override(input: &str) -> IResult<&str, ZoneOverride> {
    map_res(delimited(char('['), digit1, char(']')), |d: &str| {
        d.parse::<u8>().map(ZoneOverride::Itu)
    })
    .parse(input)
}

/// Parse `PREFIX[(CQ)][[ITU]]`.
///
/// The prefix is everything before the first `(` or `[`. Anything in the
/// remainder that is not a zone override (cty.dat also carries `<lat/long>`,
/// `{CONT}` and `~offset~` markers) is skipped.
fn parse_alias_token(token: &str) -> AliasToken<'_> {
    let parsed: IResult<&str, (&str, Vec<ZoneOverride>)> = (
        take_till(|c: char| c == '(' || c == '['),
        many0(alt((cq_override, itu_override, value(ZoneOverride::Other, anychar)))),
    )
        .parse(token);

    let Ok((_, (prefix, overrides))) = parsed else {
        return AliasToken {
            prefix: token,
            cqz: None,
            ituz: None,
        };
    };

    let mut alias = AliasToken {
        prefix,
        cqz: None,
        ituz: None,
    };
    // First occurrence of each override wins.
    for o in overrides {
        match o {
            ZoneOverride::Cq(z) if alias.cqz.is_none() => alias.cqz = Some(z),
            ZoneOverride::Itu(z) if alias.ituz.is_none() => alias.ituz = Some(z),
            _ => {}
        }
    }
    alias
}

fn parse_field<T: FromStr>(value: &str, name: &str, line: usize) -> Result<T, LoadError> {
    value.trim().parse().map_err(|_| LoadError::Malformed {
        line,
        message: format!("invalid {}: {:?}", name, value.trim()),
    })
}

fn parse_definition(fields: &[&str], line: usize) -> Result<CountryRecord, LoadError> {
    let continent = Continent::from_str(fields[3])
        .map_err(|message| LoadError::Malformed { line, message })?;

    Ok(CountryRecord {
        name: fields[0].trim().to_string(),
        cqz: parse_field(fields[1], "CQ zone", line)?,
        ituz: parse_field(fields[2], "ITU zone", line)?,
        continent,
        latitude: parse_field(fields[4], "latitude", line)?,
        longitude: parse_field(fields[5], "longitude", line)?,
        utc_offset: parse_field(fields[6], "UTC offset", line)?,
        primary_prefix: fields[7].trim().to_string(),
        number: 0,
    })
}

impl CountryDatabase {
    /// Load the database from a `cty.dat` file on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let db = Self::from_reader(BufReader::new(file))?;
        info!(
            "Loaded {} countries and {} prefixes from {}",
            db.country_count(),
            db.alias_count(),
            path.display()
        );
        Ok(db)
    }

    /// Build the database from any buffered reader of `cty.dat` content.
    pub fn from_reader(reader: impl BufRead) -> Result<Self, LoadError> {
        let mut db = CountryDatabase::default();
        let mut pending: Option<PendingCountry> = None;

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line?;
            let line = line.trim_end();
            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split(':').collect();
            if fields.len() == DEFINITION_FIELDS {
                if let Some(open) = &pending {
                    return Err(LoadError::Malformed {
                        line: line_no,
                        message: format!(
                            "new entity starts before the prefix list of {:?} (line {}) ended",
                            open.record.name, open.line
                        ),
                    });
                }
                pending = Some(PendingCountry {
                    record: parse_definition(&fields, line_no)?,
                    line: line_no,
                    aliases: Vec::new(),
                });
                continue;
            }

            let Some(current) = pending.as_mut() else {
                return Err(LoadError::Malformed {
                    line: line_no,
                    message: "prefix list without an entity definition".to_string(),
                });
            };

            let (body, last) = match line.strip_suffix(';') {
                Some(body) => (body, true),
                None => (line, false),
            };

            for token in body.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                let alias = parse_alias_token(token);
                current
                    .aliases
                    .push((alias.prefix.to_string(), alias.cqz, alias.ituz));
            }

            if last && let Some(done) = pending.take() {
                db.register(done);
            }
        }

        if let Some(open) = pending {
            return Err(LoadError::Malformed {
                line: open.line,
                message: format!("prefix list of {:?} is not terminated", open.record.name),
            });
        }

        if db.records.is_empty() {
            return Err(LoadError::Empty);
        }

        Ok(db)
    }

    /// Assign the next sequence number and index a completed entity.
    fn register(&mut self, pending: PendingCountry) {
        let PendingCountry {
            mut record,
            aliases,
            ..
        } = pending;

        let index = self.records.len();
        record.number = index as u32 + 1;

        if let Some(previous) = self.by_primary.insert(record.primary_prefix.clone(), index) {
            debug!(
                "Primary prefix {} of {:?} replaces {:?}",
                record.primary_prefix, record.name, self.records[previous].name
            );
        }

        for (prefix, cqz, ituz) in aliases {
            let alias = PrefixAlias {
                prefix: prefix.clone(),
                cqz: cqz.unwrap_or(record.cqz),
                ituz: ituz.unwrap_or(record.ituz),
                country: index,
            };
            self.aliases.insert(prefix, alias);
        }

        self.records.push(record);
    }

    /// Find the registered alias for a candidate by right truncation.
    ///
    /// Whitespace is removed, then the candidate is tested as-is and with
    /// one trailing character dropped at a time until a registered alias is
    /// hit. `"VP2E"` is tried as `VP2E`, `VP2`, `VP`, `V`; interior
    /// substrings are never considered.
    pub fn resolve(&self, candidate: &str) -> Option<&str> {
        self.resolve_alias(candidate).map(|a| a.prefix.as_str())
    }

    /// Like [`resolve`](Self::resolve), returning the full alias entry.
    pub fn resolve_alias(&self, candidate: &str) -> Option<&PrefixAlias> {
        let mut probe: String = candidate.chars().filter(|c| !c.is_whitespace()).collect();
        while !probe.is_empty() {
            if let Some(alias) = self.aliases.get(probe.as_str()) {
                return Some(alias);
            }
            probe.pop();
        }
        None
    }

    /// Look up an alias by its exact text.
    pub fn alias(&self, prefix: &str) -> Option<&PrefixAlias> {
        self.aliases.get(prefix)
    }

    /// The entity an alias belongs to.
    pub fn alias_country(&self, alias: &PrefixAlias) -> &CountryRecord {
        &self.records[alias.country]
    }

    /// Look up an entity by primary prefix (e.g. "DL").
    pub fn country(&self, primary_prefix: &str) -> Option<&CountryRecord> {
        self.by_primary
            .get(primary_prefix)
            .map(|&index| &self.records[index])
    }

    /// Look up an entity by its sequence number in the file.
    pub fn country_by_number(&self, number: u32) -> Option<&CountryRecord> {
        let index = (number as usize).checked_sub(1)?;
        self.records.get(index)
    }

    /// All entities in file order.
    pub fn countries(&self) -> impl Iterator<Item = &CountryRecord> {
        self.records.iter()
    }

    /// All registered aliases, in no particular order.
    pub fn aliases(&self) -> impl Iterator<Item = &PrefixAlias> {
        self.aliases.values()
    }

    pub fn country_count(&self) -> usize {
        self.records.len()
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }
}

impl FromStr for CountryDatabase {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_reader(s.as_bytes())
    }
}
