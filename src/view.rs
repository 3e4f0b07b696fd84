//! The misc dashboard view.
//!
//! Two halves. `render` is a pure function from a `Snapshot` to a
//! `RenderTree`, the cards a front end would draw. `MiscView` carries the
//! side effects: while started it ticks on a timer, registering the
//! dashboard's topics whenever the link is up and they are not yet
//! registered. Stopping, or dropping, the view withdraws them.

use format::{self, ByteUnit};
use series::ChartData;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use store::{self, Shared, Snapshot};
use time::Ticker;

/// How a chart's values read on its y-axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Axis {
    /// Values as they are.
    Plain,
    /// Mirrored charts plot some series below zero; show magnitudes.
    Magnitude,
    /// Byte counts in the given unit.
    Bytes(ByteUnit),
}

impl Axis {
    /// Format a value as this axis labels it.
    pub fn format(&self, value: f64) -> String {
        match *self {
            Axis::Plain => format::fixed(value),
            Axis::Magnitude => format::fixed(value.abs()),
            Axis::Bytes(unit) => unit.format(value),
        }
    }
}

/// A chart on a card
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    /// Labels and datasets.
    pub data: ChartData,
    /// How the y-axis reads.
    pub axis: Axis,
}

/// One titled panel of the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// Heading.
    pub title: String,
    /// Summary lines shown above the charts.
    pub notes: Vec<String>,
    /// Charts, top to bottom.
    pub charts: Vec<Chart>,
    /// Status marker, e.g. a running garbage collection.
    pub badge: Option<String>,
}

impl Card {
    fn new(title: &str) -> Card {
        Card {
            title: title.to_string(),
            notes: Vec::new(),
            charts: Vec::new(),
            badge: None,
        }
    }

    fn chart(mut self, snapshot: &Snapshot, name: &str, axis: Axis) -> Card {
        self.charts.push(Chart {
            data: snapshot.chart(name).cloned().unwrap_or_default(),
            axis: axis,
        });
        self
    }

    fn note<S>(mut self, note: S) -> Card
    where
        S: Into<String>,
    {
        self.notes.push(note.into());
        self
    }
}

/// Everything the dashboard shows, top to bottom
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTree {
    /// Page heading.
    pub title: String,
    /// Cards in display order.
    pub cards: Vec<Card>,
}

impl RenderTree {
    /// The card with the given title.
    pub fn card(&self, title: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.title == title)
    }
}

impl fmt::Display for RenderTree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "== {} ==", self.title)?;
        for card in &self.cards {
            writeln!(f, "[{}]", card.title)?;
            for note in &card.notes {
                writeln!(f, "  {}", note)?;
            }
            if let Some(ref badge) = card.badge {
                writeln!(f, "  ** {} **", badge)?;
            }
            for chart in &card.charts {
                for ds in &chart.data.datasets {
                    match ds.latest() {
                        Some(v) => writeln!(f,
                                            "    {}: {} ({} points)",
                                            ds.label,
                                            chart.axis.format(v),
                                            ds.points())?,
                        None => writeln!(f, "    {}: -", ds.label)?,
                    }
                }
            }
        }
        Ok(())
    }
}

/// Lay out the dashboard for `snapshot`.
pub fn render(snapshot: &Snapshot) -> RenderTree {
    let last = |name: &str| snapshot.last_value(name).unwrap_or(0.0);
    let mut cards = Vec::new();

    cards.push(Card::new("Tip-Selection Performance").chart(snapshot, "tip_selection", Axis::Plain));

    if snapshot.chart("spam").map_or(false, |c| !c.is_empty()) {
        let gtta = last("spam.gtta");
        let pow = last("spam.pow");
        let mut spam = Card::new("Spammer Metrics")
            .note(format!("GTTA: {}, PoW: {}, Total: {}",
                          format::seconds(gtta),
                          format::seconds(pow),
                          format::seconds(gtta + pow)))
            .chart(snapshot, "spam", Axis::Plain);
        if snapshot.chart("avg_spam").map_or(false, |c| !c.is_empty()) {
            spam = spam.note(format!("New TX: {}, Avg. TPS: {}",
                                     format::fixed(last("spam.avg.new")),
                                     format::fixed(last("spam.avg.tps"))))
                .chart(snapshot, "avg_spam", Axis::Plain);
        }
        cards.push(spam);
    }

    cards.push(Card::new("Request Queue").chart(snapshot, "request_queue", Axis::Plain));
    cards.push(Card::new("Server Metrics").chart(snapshot, "server", Axis::Plain));
    cards.push(Card::new("Cache Sizes")
        .note("The cache size shrinks whenever an eviction happens. Sizes are sampled \
               only every second, so a cache will not necessarily be seen at capacity.")
        .chart(snapshot, "caches", Axis::Plain));
    cards.push(Card::new("Requests").chart(snapshot, "requests", Axis::Magnitude));

    let total = snapshot.db_size_total().unwrap_or(0.0);
    let mut db = Card::new("Database");
    if snapshot.last_value("db.tangle").is_some() {
        db = db.note(format!("Size: {}", format::bytes(total)));
        let cleanup = &snapshot.cleanup;
        if let (Some(end), Some(took)) = (cleanup.last_end, cleanup.last_duration) {
            if took > 0 {
                db = db.note(format!("Last GC: {}. Took: {} seconds.",
                                     format::datetime(end),
                                     took));
            }
        }
        if cleanup.running {
            db.badge = Some("GC running".to_string());
        }
    }
    cards.push(db.chart(snapshot, "database", Axis::Bytes(ByteUnit::for_size(total))));

    RenderTree {
        title: "Misc".to_string(),
        cards: cards,
    }
}

/// One tick: register topics while the link is up, forget them once it
/// drops. `registered` mirrors the store afterwards.
fn tick(store: &Shared, registered: &AtomicBool) {
    let mut store = store::lock(store);
    if store.connected() {
        store.register_topics();
    } else if store.topics_registered() {
        store.connection_lost();
    }
    registered.store(store.topics_registered(), Ordering::SeqCst);
}

/// The stateful half of the dashboard
pub struct MiscView {
    store: Shared,
    interval: Duration,
    registered: Arc<AtomicBool>,
    ticker: Option<Ticker>,
}

impl MiscView {
    /// A stopped view over `store`, ticking every `interval` once started.
    pub fn new(store: Shared, interval: Duration) -> MiscView {
        MiscView {
            store: store,
            interval: interval,
            registered: Arc::new(AtomicBool::new(false)),
            ticker: None,
        }
    }

    /// Tick once now, then every interval until stopped
    ///
    /// Starting a started view does nothing.
    pub fn start(&mut self) -> io::Result<()> {
        if self.ticker.is_some() {
            return Ok(());
        }
        self.tick();
        let store = self.store.clone();
        let registered = self.registered.clone();
        self.ticker = Some(Ticker::spawn("misc-view", self.interval, move || {
            tick(&store, &registered)
        })?);
        debug!("misc view started, ticking every {:?}", self.interval);
        Ok(())
    }

    /// Stop ticking and withdraw the dashboard topics.
    pub fn stop(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.stop();
            debug!("misc view stopped");
        }
        self.registered.store(false, Ordering::SeqCst);
        store::lock(&self.store).unregister_topics();
    }

    /// Check the connection and (re)register topics if needed.
    pub fn tick(&self) {
        tick(&self.store, &self.registered)
    }

    /// True between `start` and `stop`.
    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// True if the last tick left the topics registered.
    pub fn topics_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }

    /// Render the store as it stands.
    pub fn render(&self) -> RenderTree {
        let snapshot = store::lock(&self.store).snapshot();
        render(&snapshot)
    }
}

impl Drop for MiscView {
    fn drop(&mut self) {
        self.stop()
    }
}
