//! Provides the CLI option parser
//!
//! Used to parse the argv/config file into a struct that the executable can
//! consume and use as configuration data. Every key is optional; a missing
//! config file means all defaults.

use clap::{App, Arg};
use std::error;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use time;
use toml;

const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");

/// Points kept per series unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 30;

/// Configuration errors
#[derive(Debug)]
pub enum Error {
    /// The config file could not be read.
    Io(io::Error),
    /// The config file is not valid TOML.
    Toml(toml::de::Error),
    /// A key held a value of the wrong type or out of range.
    Invalid {
        /// The offending key.
        key: &'static str,
        /// What was wrong with its value.
        reason: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref e) => write!(f, "could not read config file: {}", e),
            Error::Toml(ref e) => write!(f, "could not parse config file: {}", e),
            Error::Invalid { key, ref reason } => write!(f, "invalid {}: {}", key, reason),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref e) => Some(e),
            Error::Toml(ref e) => Some(e),
            Error::Invalid { .. } => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Error {
        Error::Toml(e)
    }
}

/// Configuration for the nodestats executable
#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    /// Points kept per series.
    pub capacity: usize,
    /// Period of the dashboard's connection check.
    pub tick_interval: Duration,
    /// Recorded backend messages to replay. Standard input when `None`.
    pub source_path: Option<PathBuf>,
    /// Delay between replayed lines.
    pub pace: Duration,
    /// Print the rendered dashboard after every batch.
    pub console: bool,
    /// Log verbosity, the number of `-v` flags.
    pub verbose: u64,
    /// Crate version, for the startup banner.
    pub version: String,
}

impl Default for Args {
    fn default() -> Args {
        Args {
            capacity: DEFAULT_CAPACITY,
            tick_interval: Duration::from_millis(time::DEFAULT_TICK),
            source_path: None,
            pace: Duration::from_millis(0),
            console: true,
            verbose: 0,
            version: VERSION.unwrap_or("unknown").to_string(),
        }
    }
}

/// Parse the command line
///
/// Reads `-C/--config` and counts `-v`. Without a config file every
/// setting takes its default.
pub fn parse_args() -> Result<Args, Error> {
    let args = App::new("nodestats")
        .version(VERSION.unwrap_or("unknown"))
        .about("bounded rolling metrics for a node dashboard")
        .arg(
            Arg::with_name("config-file")
                .long("config")
                .short("C")
                .value_name("config")
                .help("The config file to feed in.")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Turn on verbose output."),
        )
        .get_matches();

    let verb = args.occurrences_of("verbose");

    match args.value_of("config-file") {
        Some(filename) => parse_config_path(filename, verb),
        None => {
            let mut args = Args::default();
            args.verbose = verb;
            Ok(args)
        }
    }
}

/// Read and parse the config file at `path`.
pub fn parse_config_path<P>(path: P, verbosity: u64) -> Result<Args, Error>
where
    P: AsRef<Path>,
{
    let mut fp = File::open(path)?;
    let mut buffer = String::new();
    fp.read_to_string(&mut buffer)?;
    parse_config_file(&buffer, verbosity)
}

fn positive(value: &toml::Value, key: &'static str) -> Result<u64, Error> {
    match value.as_integer() {
        Some(i) if i > 0 => Ok(i as u64),
        Some(i) => Err(Error::Invalid {
            key: key,
            reason: format!("must be positive, got {}", i),
        }),
        None => Err(Error::Invalid {
            key: key,
            reason: "must be an integer".to_string(),
        }),
    }
}

/// Parse the nodestats configuration file
///
/// ```toml
/// capacity = 30
/// tick-interval-ms = 500
///
/// [source]
/// path = "recorded.jsonl"
/// pace-ms = 100
///
/// [console]
/// enabled = true
/// ```
pub fn parse_config_file(buffer: &str, verbosity: u64) -> Result<Args, Error> {
    let mut args = Args::default();
    let value: toml::Value = toml::from_str(buffer)?;

    args.verbose = verbosity;

    if let Some(c) = value.get("capacity") {
        args.capacity = positive(c, "capacity")? as usize;
    }

    if let Some(t) = value.get("tick-interval-ms") {
        args.tick_interval = Duration::from_millis(positive(t, "tick-interval-ms")?);
    }

    if let Some(source) = value.get("source") {
        if let Some(p) = source.get("path") {
            match p.as_str() {
                Some(s) => args.source_path = Some(Path::new(s).to_path_buf()),
                None => {
                    return Err(Error::Invalid {
                        key: "source.path",
                        reason: "must be a string".to_string(),
                    })
                }
            }
        }
        if let Some(p) = source.get("pace-ms") {
            match p.as_integer() {
                Some(ms) if ms >= 0 => args.pace = Duration::from_millis(ms as u64),
                _ => {
                    return Err(Error::Invalid {
                        key: "source.pace-ms",
                        reason: "must be a non-negative integer".to_string(),
                    })
                }
            }
        }
    }

    if let Some(console) = value.get("console") {
        if let Some(e) = console.get("enabled") {
            args.console = match e.as_bool() {
                Some(b) => b,
                None => {
                    return Err(Error::Invalid {
                        key: "console.enabled",
                        reason: "must be a boolean".to_string(),
                    })
                }
            };
        }
    }

    Ok(args)
}
