//! Number formatting for display.
//!
//! Everything here is a pure function of its input. In particular the byte
//! unit used for the database chart is chosen from the latest total on every
//! render and never stored.

use chrono::{LocalResult, TimeZone, Utc};
use std::fmt;

/// One mebibyte in bytes
pub const MB: f64 = 1024.0 * 1024.0;
/// One gibibyte in bytes
pub const GB: f64 = MB * 1024.0;

/// Display unit for byte counts
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ByteUnit {
    /// Mebibytes.
    MB,
    /// Gibibytes.
    GB,
}

impl ByteUnit {
    /// Pick the unit for a byte count
    ///
    /// Sizes strictly above one gibibyte are shown in GB, everything else
    /// in MB.
    ///
    /// # Examples
    ///
    /// ```
    /// use nodestats::format::{ByteUnit, GB};
    ///
    /// assert_eq!(ByteUnit::MB, ByteUnit::for_size(1_048_576.0));
    /// assert_eq!(ByteUnit::MB, ByteUnit::for_size(GB));
    /// assert_eq!(ByteUnit::GB, ByteUnit::for_size(2_147_483_648.0));
    /// ```
    pub fn for_size(bytes: f64) -> ByteUnit {
        if bytes > GB {
            ByteUnit::GB
        } else {
            ByteUnit::MB
        }
    }

    /// Bytes per unit.
    pub fn divisor(&self) -> f64 {
        match *self {
            ByteUnit::MB => MB,
            ByteUnit::GB => GB,
        }
    }

    /// Express `bytes` in this unit, e.g. `"1.500 MB"`.
    pub fn format(&self, bytes: f64) -> String {
        format!("{:.3} {}", bytes / self.divisor(), self)
    }
}

impl fmt::Display for ByteUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ByteUnit::MB => write!(f, "MB"),
            ByteUnit::GB => write!(f, "GB"),
        }
    }
}

/// Format a byte count in whichever unit suits it.
pub fn bytes(bytes: f64) -> String {
    ByteUnit::for_size(bytes).format(bytes)
}

/// Three decimal places.
pub fn fixed(value: f64) -> String {
    format!("{:.3}", value)
}

/// Three decimal places with a seconds suffix.
pub fn seconds(value: f64) -> String {
    format!("{:.3}s", value)
}

/// Unix seconds as HH:MM:SS in UTC.
pub fn clock(ts: i64) -> String {
    timestamp(ts, "%H:%M:%S")
}

/// Unix seconds as a full UTC date and time.
pub fn datetime(ts: i64) -> String {
    timestamp(ts, "%Y-%m-%d %H:%M:%S")
}

fn timestamp(ts: i64, fmt: &str) -> String {
    match Utc.timestamp_opt(ts, 0) {
        LocalResult::Single(dt) => dt.format(fmt).to_string(),
        _ => ts.to_string(),
    }
}
