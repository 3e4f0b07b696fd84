//! The metrics store.
//!
//! `MetricsStore` owns every series the dashboard shows. Samples are
//! dispatched by kind into one or more series, composite kinds also push
//! their derived totals, and a last-value cache gives O(1) access to the
//! newest reading of each series. Observers are told about changes once per
//! ingested batch.

use metric::{MetricSample, Payload, MISC_TOPICS};
use ring;
use series::{ChartData, ChartDef, Members, Point, Registry, Series};
use std::collections::BTreeMap;
use std::sync::{mpsc, Arc, Mutex, MutexGuard};
use subscription::{Handle, Observer, Registration, Subscribers, Transport};

/// Tip selection duration.
pub const TIP_SELECTION: ChartDef = ChartDef {
    name: "tip_selection",
    title: "Tip-Selection Performance",
    members: Members::Fixed(&[("tipsel.duration", "Duration")]),
};

/// Spammer GTTA, PoW and their total.
pub const SPAM: ChartDef = ChartDef {
    name: "spam",
    title: "Spammer Metrics",
    members: Members::Fixed(&[
        ("spam.gtta", "GTTA"),
        ("spam.pow", "PoW"),
        ("spam.total", "Total"),
    ]),
};

/// Spammer throughput.
pub const AVG_SPAM: ChartDef = ChartDef {
    name: "avg_spam",
    title: "Spammer Throughput",
    members: Members::Fixed(&[("spam.avg.new", "New TX"), ("spam.avg.tps", "Avg. TPS")]),
};

/// Request queue length.
pub const REQUEST_QUEUE: ChartDef = ChartDef {
    name: "request_queue",
    title: "Request Queue",
    members: Members::Fixed(&[("reqq.size", "Size")]),
};

/// Server transaction and message counters.
pub const SERVER: ChartDef = ChartDef {
    name: "server",
    title: "Server Metrics",
    members: Members::Fixed(&[
        ("server.all_txs", "All"),
        ("server.new_txs", "New"),
        ("server.known_txs", "Known"),
        ("server.invalid_txs", "Invalid"),
        ("server.stale_txs", "Stale"),
        ("server.random_txs", "Random"),
        ("server.sent_txs", "Sent"),
        ("server.rec_msg", "Received Messages"),
        ("server.sent_msg", "Sent Messages"),
        ("server.dropped_sent_packets", "Dropped Packets"),
    ]),
};

/// One line per cache seen so far.
pub const CACHES: ChartDef = ChartDef {
    name: "caches",
    title: "Cache Sizes",
    members: Members::Prefix("cache."),
};

/// Received requests above the axis, sent below.
pub const REQUESTS: ChartDef = ChartDef {
    name: "requests",
    title: "Requests",
    members: Members::Fixed(&[("requests.received", "Received"), ("requests.sent", "Sent")]),
};

/// Database component sizes and their total.
pub const DATABASE: ChartDef = ChartDef {
    name: "database",
    title: "Database",
    members: Members::Fixed(&[
        ("db.tangle", "Tangle"),
        ("db.snapshot", "Snapshot"),
        ("db.spent", "Spent"),
        ("db.total", "Total"),
    ]),
};

/// Every chart the store can build, in display order
pub const CHARTS: [ChartDef; 8] = [
    TIP_SELECTION,
    SPAM,
    AVG_SPAM,
    REQUEST_QUEUE,
    SERVER,
    CACHES,
    REQUESTS,
    DATABASE,
];

/// Database garbage collection state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanupState {
    /// A cleanup has started and not yet reported its end.
    pub running: bool,
    /// Unix seconds at which the most recent cleanup started.
    pub last_start: Option<i64>,
    /// Unix seconds at which the last finished cleanup ended.
    pub last_end: Option<i64>,
    /// Seconds the last finished cleanup took.
    pub last_duration: Option<i64>,
}

/// Readable copy of the store at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Every series, oldest point first.
    pub series: BTreeMap<String, Vec<Point>>,
    /// Newest value of every series.
    pub last: BTreeMap<String, f64>,
    /// Every chart in `CHARTS`, keyed by chart name.
    pub charts: BTreeMap<&'static str, ChartData>,
    /// Database garbage collection state.
    pub cleanup: CleanupState,
}

impl Snapshot {
    /// Newest value of the named series.
    pub fn last_value(&self, name: &str) -> Option<f64> {
        self.last.get(name).cloned()
    }

    /// The named chart.
    pub fn chart(&self, name: &str) -> Option<&ChartData> {
        self.charts.get(name)
    }

    /// Latest database size in bytes, summed over components.
    pub fn db_size_total(&self) -> Option<f64> {
        self.last_value("db.total")
    }
}

/// Bounded store of node metrics
pub struct MetricsStore {
    registry: Registry,
    last: BTreeMap<String, f64>,
    cleanup: CleanupState,
    subscribers: Subscribers,
    registration: Option<Registration>,
    ingested: u64,
    dropped: u64,
}

impl MetricsStore {
    /// Create a store whose series each hold `capacity` points
    ///
    /// # Examples
    ///
    /// ```
    /// use nodestats::metric::{MetricSample, Payload};
    /// use nodestats::store::MetricsStore;
    ///
    /// let mut store = MetricsStore::new(30).unwrap();
    /// store.ingest(MetricSample::new(Payload::Spam { gtta: 0.5, pow: 1.0 }));
    /// assert_eq!(Some(1.5), store.last_value("spam.total"));
    ///
    /// assert!(MetricsStore::new(0).is_err());
    /// ```
    pub fn new(capacity: usize) -> Result<MetricsStore, ring::Error> {
        Ok(MetricsStore {
            registry: Registry::new(capacity)?,
            last: BTreeMap::new(),
            cleanup: CleanupState::default(),
            subscribers: Subscribers::default(),
            registration: None,
            ingested: 0,
            dropped: 0,
        })
    }

    /// Attach the backend link used for topic registration.
    pub fn transport<T>(mut self, transport: T) -> MetricsStore
    where
        T: Transport + 'static,
    {
        self.registration = Some(Registration::new(transport, &MISC_TOPICS));
        self
    }

    /// Points each series holds.
    pub fn capacity(&self) -> usize {
        self.registry.capacity()
    }

    /// Apply one sample and notify observers if anything changed.
    pub fn ingest(&mut self, sample: MetricSample) -> bool {
        self.ingest_batch(Some(sample)) == 1
    }

    /// Apply every sample in order, then notify observers once
    ///
    /// Returns the number of samples applied. Observers are not notified for
    /// a batch that applied nothing.
    pub fn ingest_batch<I>(&mut self, samples: I) -> usize
    where
        I: IntoIterator<Item = MetricSample>,
    {
        let mut applied = 0;
        for sample in samples {
            if self.apply(sample) {
                applied += 1;
            }
        }
        if applied > 0 {
            trace!("batch applied {} samples, notifying {} observers",
                   applied,
                   self.subscribers.len());
            let snapshot = self.snapshot();
            self.subscribers.notify(&snapshot);
        }
        applied
    }

    fn apply(&mut self, sample: MetricSample) -> bool {
        if !sample.is_finite() {
            warn!("dropping {:?} sample with non-finite value", sample.topic());
            self.dropped += 1;
            return false;
        }
        let label = sample.label();
        match sample.payload {
            Payload::TipSelection { duration } => {
                self.record("tipsel.duration", &label, duration);
            }
            Payload::Spam { gtta, pow } => {
                self.record("spam.gtta", &label, gtta);
                self.record("spam.pow", &label, pow);
                self.record("spam.total", &label, gtta + pow);
            }
            Payload::AvgSpam { new, avg } => {
                self.record("spam.avg.new", &label, new);
                self.record("spam.avg.tps", &label, avg);
            }
            Payload::QueueSize { value } => {
                self.record("reqq.size", &label, value);
            }
            Payload::Server(ref metrics) => {
                for &(name, value) in metrics.fields().iter() {
                    self.record(name, &label, value);
                }
            }
            Payload::CacheSize { ref name, value } => {
                self.record(&format!("cache.{}", name), &label, value);
            }
            Payload::Requests { received, sent } => {
                self.record("requests.received", &label, received);
                self.record("requests.sent", &label, -sent.abs());
            }
            Payload::DbSize {
                tangle,
                snapshot,
                spent,
            } => {
                self.record("db.tangle", &label, tangle);
                self.record("db.snapshot", &label, snapshot);
                self.record("db.spent", &label, spent);
                self.record("db.total", &label, tangle + snapshot + spent);
            }
            Payload::DatabaseCleanup { start, end } => {
                self.cleanup.last_start = Some(start);
                if end == 0 {
                    debug!("database cleanup started at {}", start);
                    self.cleanup.running = true;
                } else {
                    let took = ::std::cmp::max(0, end.saturating_sub(start));
                    debug!("database cleanup finished at {}, took {}s", end, took);
                    self.cleanup.running = false;
                    self.cleanup.last_end = Some(end);
                    self.cleanup.last_duration = Some(took);
                }
            }
        }
        self.ingested += 1;
        true
    }

    fn record(&mut self, name: &str, label: &str, value: f64) {
        self.registry.update(name, label, value);
        self.last.insert(name.to_string(), value);
    }

    /// Newest value of the named series, `None` if it never received one.
    pub fn last_value(&self, name: &str) -> Option<f64> {
        self.last.get(name).cloned()
    }

    /// The named series, `None` if it never received a point.
    pub fn series(&self, name: &str) -> Option<&Series> {
        self.registry.get(name)
    }

    /// Build the named chart, `None` if no chart has that name.
    pub fn chart(&self, name: &str) -> Option<ChartData> {
        CHARTS
            .iter()
            .find(|def| def.name == name)
            .map(|def| self.registry.chart(def))
    }

    /// Database garbage collection state.
    pub fn cleanup(&self) -> &CleanupState {
        &self.cleanup
    }

    /// Latest database size in bytes, summed over components.
    pub fn db_size_total(&self) -> Option<f64> {
        self.last_value("db.total")
    }

    /// Samples applied since creation.
    pub fn ingested(&self) -> u64 {
        self.ingested
    }

    /// Samples rejected since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Copy out every series, last value, chart and the cleanup state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            series: self.registry.snapshot(),
            last: self.last.clone(),
            charts: CHARTS
                .iter()
                .map(|def| (def.name, self.registry.chart(def)))
                .collect(),
            cleanup: self.cleanup.clone(),
        }
    }

    /// Register an observer, notified after every batch that changed
    /// something.
    pub fn subscribe<O>(&mut self, observer: O) -> Handle
    where
        O: Observer + 'static,
    {
        self.subscribers.subscribe(observer)
    }

    /// Remove an observer. False if it was already removed.
    pub fn unsubscribe(&mut self, handle: Handle) -> bool {
        self.subscribers.unsubscribe(handle)
    }

    /// Number of live observers.
    pub fn observers(&self) -> usize {
        self.subscribers.len()
    }

    /// True if a transport is attached and reports its link up.
    pub fn connected(&self) -> bool {
        self.registration
            .as_ref()
            .map_or(false, |r| r.connected())
    }

    /// True if the backend holds our topics on the current connection.
    pub fn topics_registered(&self) -> bool {
        self.registration
            .as_ref()
            .map_or(false, |r| r.is_registered())
    }

    /// Ask the backend for the dashboard topics. No-op if already asked.
    pub fn register_topics(&mut self) -> bool {
        match self.registration {
            Some(ref mut r) => r.register(),
            None => {
                warn!("no transport attached, cannot register topics");
                false
            }
        }
    }

    /// Withdraw the dashboard topics. No-op if not registered.
    pub fn unregister_topics(&mut self) -> bool {
        match self.registration {
            Some(ref mut r) => r.unregister(),
            None => false,
        }
    }

    /// The link dropped; the backend no longer holds our topics.
    pub fn connection_lost(&mut self) {
        if let Some(ref mut r) = self.registration {
            r.reset();
        }
    }

    /// Withdraw topics and drop every observer.
    pub fn shutdown(&mut self) {
        self.unregister_topics();
        if !self.subscribers.is_empty() {
            debug!("dropping {} observers", self.subscribers.len());
        }
        self.subscribers.clear();
    }
}

impl Drop for MetricsStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A store shared between the ingestion worker and its views
pub type Shared = Arc<Mutex<MetricsStore>>;

/// Wrap a store for sharing.
pub fn shared(store: MetricsStore) -> Shared {
    Arc::new(Mutex::new(store))
}

/// Lock a shared store
///
/// Observers run only after a batch is fully applied, so a lock poisoned by
/// a panicking observer still guards a consistent store. The guard is
/// recovered.
pub fn lock(store: &Shared) -> MutexGuard<MetricsStore> {
    match store.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("recovering poisoned store lock");
            poisoned.into_inner()
        }
    }
}

/// Apply everything arriving on `recv` until every sender hangs up
///
/// Whatever is queued when the worker wakes is applied as one batch, so
/// observers see one notification per burst. Returns the number of samples
/// applied.
pub fn drain(store: &Shared, recv: mpsc::Receiver<Vec<MetricSample>>) -> usize {
    let mut total = 0;
    while let Ok(mut batch) = recv.recv() {
        while let Ok(more) = recv.try_recv() {
            batch.extend(more);
        }
        total += lock(store).ingest_batch(batch);
    }
    debug!("ingestion queue closed after {} samples", total);
    total
}

#[cfg(test)]
mod test {
    use super::*;
    use format::{ByteUnit, GB};
    use metric::ServerMetrics;
    use quickcheck::{QuickCheck, TestResult};
    use std::sync::{Arc, Mutex};
    use subscription::test::Recorder;

    fn at(ts: i64, payload: Payload) -> MetricSample {
        MetricSample::new(payload).timestamp(ts)
    }

    #[test]
    fn db_size_total_in_mb() {
        let mut store = MetricsStore::new(30).unwrap();
        store.ingest(at(0, Payload::DbSize {
            tangle: 1_048_576.0,
            snapshot: 0.0,
            spent: 0.0,
        }));
        assert_eq!(Some(1_048_576.0), store.last_value("db.total"));
        assert_eq!(Some(1_048_576.0), store.db_size_total());
        assert_eq!(ByteUnit::MB, ByteUnit::for_size(store.db_size_total().unwrap()));
    }

    #[test]
    fn db_size_total_in_gb() {
        let mut store = MetricsStore::new(30).unwrap();
        store.ingest(at(0, Payload::DbSize {
            tangle: 2_147_483_648.0,
            snapshot: 0.0,
            spent: 0.0,
        }));
        let total = store.db_size_total().unwrap();
        assert!(total > GB);
        assert_eq!(ByteUnit::GB, ByteUnit::for_size(total));
    }

    #[test]
    fn db_size_components_retained() {
        let mut store = MetricsStore::new(30).unwrap();
        assert_eq!(None, store.last_value("db.tangle"));
        store.ingest(at(0, Payload::DbSize {
            tangle: 0.0,
            snapshot: 10.0,
            spent: 5.0,
        }));
        assert_eq!(Some(0.0), store.last_value("db.tangle"));
        assert_eq!(Some(10.0), store.last_value("db.snapshot"));
        assert_eq!(Some(5.0), store.last_value("db.spent"));
        assert_eq!(Some(15.0), store.last_value("db.total"));
    }

    #[test]
    fn spam_derives_aligned_total() {
        let mut store = MetricsStore::new(30).unwrap();
        store.ingest(at(61, Payload::Spam { gtta: 0.5, pow: 1.2 }));

        let total = store.last_value("spam.total").unwrap();
        assert!((total - 1.7).abs() < 1e-9);
        assert_eq!(Some(0.5), store.last_value("spam.gtta"));
        assert_eq!(Some(1.2), store.last_value("spam.pow"));

        let label = |name: &str| store.series(name).unwrap().latest().unwrap().label.clone();
        assert_eq!("00:01:01", label("spam.gtta"));
        assert_eq!(label("spam.gtta"), label("spam.pow"));
        assert_eq!(label("spam.gtta"), label("spam.total"));

        let chart = store.chart("spam").unwrap();
        assert_eq!(vec!["00:01:01"], chart.labels);
        assert_eq!(3, chart.datasets.len());
        assert!(chart.datasets.iter().all(|d| d.data.len() == 1));
    }

    #[test]
    fn scalar_kinds_push_named_series() {
        let mut store = MetricsStore::new(30).unwrap();
        store.ingest_batch(vec![
            at(0, Payload::TipSelection { duration: 0.3 }),
            at(0, Payload::QueueSize { value: 12.0 }),
            at(0, Payload::CacheSize {
                name: "bundles".to_string(),
                value: 40.0,
            }),
            at(0, Payload::AvgSpam { new: 3.0, avg: 1.5 }),
            at(0, Payload::Server(ServerMetrics {
                all_txs: 9.0,
                ..Default::default()
            })),
        ]);
        assert_eq!(Some(0.3), store.last_value("tipsel.duration"));
        assert_eq!(Some(12.0), store.last_value("reqq.size"));
        assert_eq!(Some(40.0), store.last_value("cache.bundles"));
        assert_eq!(Some(1.5), store.last_value("spam.avg.tps"));
        assert_eq!(Some(9.0), store.last_value("server.all_txs"));
        assert_eq!(Some(0.0), store.last_value("server.stale_txs"));

        let caches = store.chart("caches").unwrap();
        assert_eq!("bundles", caches.datasets[0].label);
    }

    #[test]
    fn requests_sent_is_mirrored() {
        let mut store = MetricsStore::new(30).unwrap();
        store.ingest(at(0, Payload::Requests {
            received: 4.0,
            sent: 6.0,
        }));
        assert_eq!(Some(4.0), store.last_value("requests.received"));
        assert_eq!(Some(-6.0), store.last_value("requests.sent"));
    }

    #[test]
    fn cleanup_lifecycle() {
        let mut store = MetricsStore::new(30).unwrap();
        assert_eq!(&CleanupState::default(), store.cleanup());

        store.ingest(at(0, Payload::DatabaseCleanup { start: 100, end: 0 }));
        assert!(store.cleanup().running);
        assert_eq!(None, store.cleanup().last_duration);

        store.ingest(at(0, Payload::DatabaseCleanup {
            start: 100,
            end: 142,
        }));
        assert!(!store.cleanup().running);
        assert_eq!(Some(142), store.cleanup().last_end);
        assert_eq!(Some(42), store.cleanup().last_duration);
    }

    #[test]
    fn cleanup_with_extreme_timestamps() {
        let mut store = MetricsStore::new(30).unwrap();
        store.ingest(at(0, Payload::DatabaseCleanup {
            start: -10,
            end: ::std::i64::MAX,
        }));
        assert_eq!(Some(::std::i64::MAX), store.cleanup().last_duration);

        store.ingest(at(0, Payload::DatabaseCleanup {
            start: ::std::i64::MAX,
            end: ::std::i64::MIN + 1,
        }));
        assert_eq!(Some(0), store.cleanup().last_duration);
        assert!(!store.cleanup().running);
    }

    #[test]
    fn cache_appearing_late_stays_aligned() {
        let mut store = MetricsStore::new(30).unwrap();
        let cache = |ts: i64, name: &str, value: f64| {
            at(ts, Payload::CacheSize {
                name: name.to_string(),
                value: value,
            })
        };
        store.ingest(cache(0, "bundles", 1.0));
        store.ingest(cache(1, "bundles", 2.0));
        store.ingest_batch(vec![cache(2, "approvers", 7.0), cache(2, "bundles", 3.0)]);

        let chart = store.chart("caches").unwrap();
        assert_eq!(vec!["00:00:00", "00:00:01", "00:00:02"], chart.labels);
        for ds in &chart.datasets {
            assert_eq!(chart.labels.len(), ds.data.len());
        }
        assert_eq!(vec![None, None, Some(7.0)], chart.datasets[0].data);
        assert_eq!(vec![Some(1.0), Some(2.0), Some(3.0)], chart.datasets[1].data);
    }

    #[test]
    fn out_of_order_timestamps_kept_in_arrival_order() {
        let mut store = MetricsStore::new(30).unwrap();
        store.ingest(at(10, Payload::QueueSize { value: 1.0 }));
        store.ingest(at(5, Payload::QueueSize { value: 2.0 }));
        assert_eq!(vec!["00:00:10".to_string(), "00:00:05".to_string()],
                   store.series("reqq.size").unwrap().labels());
    }

    #[test]
    fn non_finite_sample_dropped() {
        let mut store = MetricsStore::new(30).unwrap();
        let hits = Arc::new(Mutex::new(0));
        let h = hits.clone();
        store.subscribe(move |_: &Snapshot| *h.lock().unwrap() += 1);

        assert!(!store.ingest(at(0, Payload::QueueSize { value: ::std::f64::NAN })));
        assert_eq!(None, store.last_value("reqq.size"));
        assert!(store.series("reqq.size").is_none());
        assert_eq!(1, store.dropped());
        assert_eq!(0, *hits.lock().unwrap());
    }

    #[test]
    fn one_notification_per_batch() {
        let mut store = MetricsStore::new(30).unwrap();
        let seen: Arc<Mutex<Vec<Option<f64>>>> = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        store.subscribe(move |snap: &Snapshot| {
            s.lock().unwrap().push(snap.last_value("reqq.size"))
        });

        let batch: Vec<MetricSample> = (0..10)
            .map(|i| at(i, Payload::QueueSize { value: i as f64 }))
            .collect();
        assert_eq!(10, store.ingest_batch(batch));
        assert_eq!(vec![Some(9.0)], *seen.lock().unwrap());

        assert_eq!(0, store.ingest_batch(Vec::new()));
        assert_eq!(1, seen.lock().unwrap().len());
    }

    #[test]
    fn unsubscribed_observer_not_notified() {
        let mut store = MetricsStore::new(30).unwrap();
        let hits = Arc::new(Mutex::new(0));
        let h = hits.clone();
        let handle = store.subscribe(move |_: &Snapshot| *h.lock().unwrap() += 1);
        store.ingest(at(0, Payload::QueueSize { value: 1.0 }));
        assert!(store.unsubscribe(handle));
        assert!(!store.unsubscribe(handle));
        store.ingest(at(1, Payload::QueueSize { value: 2.0 }));
        assert_eq!(1, *hits.lock().unwrap());
    }

    #[test]
    fn register_topics_idempotent() {
        let rec = Recorder::default();
        let mut store = MetricsStore::new(30).unwrap().transport(rec.clone());
        assert!(store.register_topics());
        assert!(!store.register_topics());
        assert_eq!(1, rec.subscribe_count());
        assert!(store.topics_registered());
    }

    #[test]
    fn unregister_topics_on_unregistered_store() {
        let rec = Recorder::default();
        let mut store = MetricsStore::new(30).unwrap().transport(rec.clone());
        assert!(!store.unregister_topics());
        assert_eq!(0, rec.unsubscribe_count());
        assert_eq!(0, rec.subscribe_count());
        assert!(!store.topics_registered());
    }

    #[test]
    fn no_transport_registers_nothing() {
        let mut store = MetricsStore::new(30).unwrap();
        assert!(!store.register_topics());
        assert!(!store.connected());
    }

    #[test]
    fn drop_withdraws_topics() {
        let rec = Recorder::default();
        {
            let mut store = MetricsStore::new(30).unwrap().transport(rec.clone());
            store.register_topics();
        }
        assert_eq!(1, rec.unsubscribe_count());
    }

    #[test]
    fn snapshot_contains_every_chart() {
        let store = MetricsStore::new(3).unwrap();
        let snap = store.snapshot();
        for def in CHARTS.iter() {
            assert!(snap.chart(def.name).is_some());
        }
        assert!(store.chart("nope").is_none());
    }

    #[test]
    fn drain_batches_queued_samples() {
        let store = shared(MetricsStore::new(30).unwrap());
        let notes = Arc::new(Mutex::new(0));
        let n = notes.clone();
        lock(&store).subscribe(move |_: &Snapshot| *n.lock().unwrap() += 1);

        let (snd, rcv) = mpsc::channel();
        for i in 0..4 {
            snd.send(vec![at(i, Payload::QueueSize { value: i as f64 })]).unwrap();
        }
        drop(snd);

        assert_eq!(4, drain(&store, rcv));
        assert_eq!(1, *notes.lock().unwrap());
        assert_eq!(4, lock(&store).series("reqq.size").unwrap().len());
    }

    #[test]
    fn bounded_under_random_ingestion() {
        fn inner(samples: Vec<MetricSample>) -> TestResult {
            let capacity = 5;
            let mut store = MetricsStore::new(capacity).unwrap();
            store.ingest_batch(samples.clone());
            for points in store.snapshot().series.values() {
                assert!(points.len() <= capacity);
            }
            assert_eq!(samples.len() as u64, store.ingested());
            TestResult::passed()
        }
        QuickCheck::new()
            .tests(200)
            .max_tests(2000)
            .quickcheck(inner as fn(Vec<MetricSample>) -> TestResult);
    }

    #[test]
    fn bursts_keep_most_recent() {
        fn inner(capacity: u8, burst: u16) -> TestResult {
            let capacity = (capacity % 30) as usize + 1;
            let pushes = (burst as usize) % (capacity * 10 + 1);
            let mut store = MetricsStore::new(capacity).unwrap();
            store.ingest_batch((0..pushes).map(|i| {
                MetricSample::new(Payload::QueueSize { value: i as f64 }).timestamp(i as i64)
            }));
            let values = store.series("reqq.size").map(|s| s.values()).unwrap_or_default();
            let expected: Vec<f64> = (pushes.saturating_sub(capacity)..pushes)
                .map(|i| i as f64)
                .collect();
            assert_eq!(expected, values);
            TestResult::passed()
        }
        QuickCheck::new()
            .tests(500)
            .max_tests(5000)
            .quickcheck(inner as fn(u8, u16) -> TestResult);
    }
}
