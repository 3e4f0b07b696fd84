//! `metric` is a collection of the abstract datatypes that nodestats operates
//! over, plus the decoder for the backend's wire format.
//!
//! A `MetricSample` is one observation delivered by the node: a timestamp and
//! a `Payload` whose variant determines which series the store updates.

use chrono::Utc;
use format;

mod decode;

pub use self::decode::{decode, DecodeError};

/// Backend message kinds
///
/// Each topic is a stream the view asks the transport to deliver. The
/// numeric id is the `type` field of a wire message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Topic {
    /// Tip selection timing.
    TipSelection,
    /// Spammer GTTA and PoW timing.
    Spam,
    /// Spammer throughput.
    AvgSpam,
    /// Request queue length.
    RequestQueue,
    /// Server counters.
    Server,
    /// Cache sizes.
    Caches,
    /// Request rates.
    Requests,
    /// Database component sizes.
    DatabaseSize,
    /// Database garbage collection.
    DatabaseCleanup,
}

/// The topics the misc dashboard needs
pub const MISC_TOPICS: [Topic; 9] = [
    Topic::TipSelection,
    Topic::Spam,
    Topic::AvgSpam,
    Topic::RequestQueue,
    Topic::Server,
    Topic::Caches,
    Topic::Requests,
    Topic::DatabaseSize,
    Topic::DatabaseCleanup,
];

impl Topic {
    /// The wire `type` of this topic.
    pub fn id(&self) -> u8 {
        match *self {
            Topic::TipSelection => 1,
            Topic::Spam => 2,
            Topic::AvgSpam => 3,
            Topic::RequestQueue => 4,
            Topic::Server => 5,
            Topic::Caches => 6,
            Topic::Requests => 7,
            Topic::DatabaseSize => 8,
            Topic::DatabaseCleanup => 9,
        }
    }

    /// The topic with wire `type` `id`, if any.
    pub fn from_id(id: u8) -> Option<Topic> {
        MISC_TOPICS.iter().find(|t| t.id() == id).cloned()
    }
}

/// Node server counters, as reported once per interval
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ServerMetrics {
    /// All transactions received.
    pub all_txs: f64,
    /// Transactions not seen before.
    pub new_txs: f64,
    /// Transactions already known.
    pub known_txs: f64,
    /// Transactions failing validation.
    pub invalid_txs: f64,
    /// Transactions too old to be useful.
    pub stale_txs: f64,
    /// Random transaction requests.
    pub random_txs: f64,
    /// Transactions sent to peers.
    pub sent_txs: f64,
    /// Messages received.
    pub rec_msg: f64,
    /// Messages sent.
    pub sent_msg: f64,
    /// Sent packets dropped.
    pub dropped_sent_packets: f64,
}

impl ServerMetrics {
    /// Each counter paired with its series name.
    pub fn fields(&self) -> [(&'static str, f64); 10] {
        [
            ("server.all_txs", self.all_txs),
            ("server.new_txs", self.new_txs),
            ("server.known_txs", self.known_txs),
            ("server.invalid_txs", self.invalid_txs),
            ("server.stale_txs", self.stale_txs),
            ("server.random_txs", self.random_txs),
            ("server.sent_txs", self.sent_txs),
            ("server.rec_msg", self.rec_msg),
            ("server.sent_msg", self.sent_msg),
            ("server.dropped_sent_packets", self.dropped_sent_packets),
        ]
    }
}

/// What a sample observed
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Seconds spent selecting tips.
    TipSelection {
        /// Seconds.
        duration: f64,
    },
    /// Seconds the spammer spent in tip selection and proof of work.
    Spam {
        /// Seconds getting transactions to approve.
        gtta: f64,
        /// Seconds doing proof of work.
        pow: f64,
    },
    /// Newly spammed transactions and average spam TPS.
    AvgSpam {
        /// Transactions spammed this interval.
        new: f64,
        /// Average transactions per second.
        avg: f64,
    },
    /// Request queue length.
    QueueSize {
        /// Queued requests.
        value: f64,
    },
    /// Node server counters.
    Server(ServerMetrics),
    /// Size of one named cache.
    CacheSize {
        /// Cache name, e.g. `bundles`.
        name: String,
        /// Entries held.
        value: f64,
    },
    /// Requests handled per interval, in each direction.
    Requests {
        /// Requests received.
        received: f64,
        /// Requests sent.
        sent: f64,
    },
    /// Database component sizes, in bytes.
    DbSize {
        /// Tangle database bytes.
        tangle: f64,
        /// Snapshot database bytes.
        snapshot: f64,
        /// Spent addresses database bytes.
        spent: f64,
    },
    /// Database garbage collection. An `end` of zero means the cleanup is
    /// still in progress.
    DatabaseCleanup {
        /// Unix seconds the cleanup started.
        start: i64,
        /// Unix seconds the cleanup ended, zero while running.
        end: i64,
    },
}

/// One observation from the node
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    /// Unix seconds
    pub timestamp: i64,
    /// What was observed.
    pub payload: Payload,
}

impl MetricSample {
    /// Make a sample stamped with the current time
    ///
    /// # Examples
    ///
    /// ```
    /// use nodestats::metric::{MetricSample, Payload, Topic};
    ///
    /// let s = MetricSample::new(Payload::QueueSize { value: 12.0 }).timestamp(0);
    ///
    /// assert_eq!(s.topic(), Topic::RequestQueue);
    /// assert_eq!(s.label(), "00:00:00");
    /// ```
    pub fn new(payload: Payload) -> MetricSample {
        MetricSample {
            timestamp: Utc::now().timestamp(),
            payload: payload,
        }
    }

    /// Adjust the timestamp of the sample
    pub fn timestamp(mut self, timestamp: i64) -> MetricSample {
        self.timestamp = timestamp;
        self
    }

    /// The topic this sample is delivered under.
    pub fn topic(&self) -> Topic {
        match self.payload {
            Payload::TipSelection { .. } => Topic::TipSelection,
            Payload::Spam { .. } => Topic::Spam,
            Payload::AvgSpam { .. } => Topic::AvgSpam,
            Payload::QueueSize { .. } => Topic::RequestQueue,
            Payload::Server(_) => Topic::Server,
            Payload::CacheSize { .. } => Topic::Caches,
            Payload::Requests { .. } => Topic::Requests,
            Payload::DbSize { .. } => Topic::DatabaseSize,
            Payload::DatabaseCleanup { .. } => Topic::DatabaseCleanup,
        }
    }

    /// The x-axis label for this sample, HH:MM:SS in UTC.
    pub fn label(&self) -> String {
        format::clock(self.timestamp)
    }

    /// True if every numeric field is a finite number.
    pub fn is_finite(&self) -> bool {
        match self.payload {
            Payload::TipSelection { duration } => duration.is_finite(),
            Payload::Spam { gtta, pow } => gtta.is_finite() && pow.is_finite(),
            Payload::AvgSpam { new, avg } => new.is_finite() && avg.is_finite(),
            Payload::QueueSize { value } | Payload::CacheSize { value, .. } => {
                value.is_finite()
            }
            Payload::Server(ref m) => m.fields().iter().all(|&(_, v)| v.is_finite()),
            Payload::Requests { received, sent } => {
                received.is_finite() && sent.is_finite()
            }
            Payload::DbSize {
                tangle,
                snapshot,
                spent,
            } => tangle.is_finite() && snapshot.is_finite() && spent.is_finite(),
            Payload::DatabaseCleanup { .. } => true,
        }
    }
}
