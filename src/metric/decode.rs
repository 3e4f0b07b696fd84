//! Decoder for backend messages.
//!
//! Every message is a JSON object `{"type": <topic id>, "data": {...}}`.
//! The `data` object may carry a `ts` field in unix seconds; when absent the
//! sample is stamped on arrival. The cache topic is special: its `data` maps
//! each cache name to `{"size": n}` and so decodes to several samples.

use metric::{MetricSample, Payload, ServerMetrics, Topic};
use serde_json;
use std::error;
use std::fmt;

/// Errors from message decoding
#[derive(Debug)]
pub enum DecodeError {
    /// The message was not valid JSON or did not match its topic's shape.
    Json(serde_json::Error),
    /// The `type` field named no known topic.
    UnknownTopic(u8),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DecodeError::Json(ref e) => write!(f, "malformed message: {}", e),
            DecodeError::UnknownTopic(id) => write!(f, "unknown message type {}", id),
        }
    }
}

impl error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            DecodeError::Json(ref e) => Some(e),
            DecodeError::UnknownTopic(_) => None,
        }
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> DecodeError {
        DecodeError::Json(e)
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Deserialize)]
struct Stamp {
    #[serde(default)]
    ts: Option<i64>,
}

#[derive(Deserialize)]
struct TipSelWire {
    duration: f64,
}

#[derive(Deserialize)]
struct SpamWire {
    gtta: f64,
    pow: f64,
}

#[derive(Deserialize)]
struct AvgSpamWire {
    new: f64,
    avg: f64,
}

#[derive(Deserialize)]
struct QueueWire {
    size: f64,
}

#[derive(Deserialize)]
struct CacheWire {
    size: f64,
}

#[derive(Deserialize)]
struct RequestsWire {
    received: f64,
    sent: f64,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct DbSizeWire {
    tangle: f64,
    snapshot: f64,
    spent: f64,
}

#[derive(Deserialize)]
struct CleanupWire {
    start: i64,
    #[serde(default)]
    end: i64,
}

/// Decode a single wire message into zero or more samples
///
/// # Examples
///
/// ```
/// use nodestats::metric::{decode, Payload};
///
/// let samples = decode(r#"{"type": 2, "data": {"ts": 0, "gtta": 0.5, "pow": 1.2}}"#).unwrap();
/// assert_eq!(1, samples.len());
/// assert_eq!(Payload::Spam { gtta: 0.5, pow: 1.2 }, samples[0].payload);
///
/// assert!(decode(r#"{"type": 99, "data": {}}"#).is_err());
/// ```
pub fn decode(line: &str) -> Result<Vec<MetricSample>, DecodeError> {
    let envelope: Envelope = serde_json::from_str(line)?;
    let topic = match Topic::from_id(envelope.kind) {
        Some(t) => t,
        None => return Err(DecodeError::UnknownTopic(envelope.kind)),
    };
    let data = envelope.data;
    let stamp: Stamp = serde_json::from_value(data.clone()).unwrap_or(Stamp { ts: None });

    let payloads = match topic {
        Topic::TipSelection => {
            let w: TipSelWire = serde_json::from_value(data)?;
            vec![Payload::TipSelection { duration: w.duration }]
        }
        Topic::Spam => {
            let w: SpamWire = serde_json::from_value(data)?;
            vec![Payload::Spam {
                gtta: w.gtta,
                pow: w.pow,
            }]
        }
        Topic::AvgSpam => {
            let w: AvgSpamWire = serde_json::from_value(data)?;
            vec![Payload::AvgSpam {
                new: w.new,
                avg: w.avg,
            }]
        }
        Topic::RequestQueue => {
            let w: QueueWire = serde_json::from_value(data)?;
            vec![Payload::QueueSize { value: w.size }]
        }
        Topic::Server => {
            let w: ServerMetrics = serde_json::from_value(data)?;
            vec![Payload::Server(w)]
        }
        Topic::Caches => {
            let mut caches = Vec::new();
            if let serde_json::Value::Object(map) = data {
                for (name, entry) in map {
                    if name == "ts" {
                        continue;
                    }
                    let w: CacheWire = serde_json::from_value(entry)?;
                    caches.push(Payload::CacheSize {
                        name: name,
                        value: w.size,
                    });
                }
            }
            caches
        }
        Topic::Requests => {
            let w: RequestsWire = serde_json::from_value(data)?;
            vec![Payload::Requests {
                received: w.received,
                sent: w.sent,
            }]
        }
        Topic::DatabaseSize => {
            let w: DbSizeWire = serde_json::from_value(data)?;
            vec![Payload::DbSize {
                tangle: w.tangle,
                snapshot: w.snapshot,
                spent: w.spent,
            }]
        }
        Topic::DatabaseCleanup => {
            let w: CleanupWire = serde_json::from_value(data)?;
            vec![Payload::DatabaseCleanup {
                start: w.start,
                end: w.end,
            }]
        }
    };

    Ok(payloads
        .into_iter()
        .map(|p| {
            let sample = MetricSample::new(p);
            match stamp.ts {
                Some(ts) => sample.timestamp(ts),
                None => sample,
            }
        })
        .collect())
}
