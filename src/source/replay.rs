use metric::{self, MetricSample};
use source::{Link, Source};
use std::io::BufRead;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// `Replay` is a Source which reads recorded backend messages, one JSON
/// object per line, and forwards the samples the store has asked for.
///
/// The link is brought up when the replay starts and taken down at end of
/// input. Before the first line is read `Replay` waits up to `settle` for
/// topics to be registered; lines read while no topic is wanted are
/// discarded, as a backend would not have sent them.
pub struct Replay<R> {
    reader: R,
    link: Link,
    chan: mpsc::Sender<Vec<MetricSample>>,
    pace: Duration,
    settle: Duration,
    lines: u64,
    forwarded: u64,
    rejected: u64,
}

impl<R> Replay<R>
where
    R: BufRead,
{
    /// Replay `reader` over `link`, sending batches down `chan`.
    pub fn new(reader: R, link: Link, chan: mpsc::Sender<Vec<MetricSample>>) -> Replay<R> {
        Replay {
            reader: reader,
            link: link,
            chan: chan,
            pace: Duration::from_millis(0),
            settle: Duration::from_secs(2),
            lines: 0,
            forwarded: 0,
            rejected: 0,
        }
    }

    /// Sleep this long between lines.
    pub fn pace(mut self, pace: Duration) -> Replay<R> {
        self.pace = pace;
        self
    }

    /// Wait at most this long for topic registration.
    pub fn settle(mut self, settle: Duration) -> Replay<R> {
        self.settle = settle;
        self
    }

    /// Non-empty lines read.
    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Samples sent to the ingestion queue.
    pub fn forwarded(&self) -> u64 {
        self.forwarded
    }

    /// Lines that failed to decode.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    fn await_topics(&self) {
        let deadline = Instant::now() + self.settle;
        while !self.link.has_topics() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        if !self.link.has_topics() {
            warn!("no topics registered after {:?}, replaying anyway", self.settle);
        }
    }
}

impl<R> Source for Replay<R>
where
    R: BufRead,
{
    fn run(&mut self) {
        self.link.set_connected(true);
        self.await_topics();

        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    error!("replay read failed: {}", e);
                    break;
                }
            }
            if line.trim().is_empty() {
                continue;
            }
            self.lines += 1;
            match metric::decode(&line) {
                Ok(samples) => {
                    let batch: Vec<MetricSample> = samples
                        .into_iter()
                        .filter(|s| self.link.wants(s.topic()))
                        .collect();
                    if batch.is_empty() {
                        continue;
                    }
                    self.forwarded += batch.len() as u64;
                    if self.chan.send(batch).is_err() {
                        warn!("ingestion queue closed, stopping replay");
                        break;
                    }
                }
                Err(e) => {
                    warn!("dropping line {}: {}", self.lines, e);
                    self.rejected += 1;
                }
            }
            if self.pace > Duration::from_millis(0) {
                thread::sleep(self.pace);
            }
        }

        self.link.set_connected(false);
        info!("replay finished: {} lines, {} samples forwarded, {} rejected",
              self.lines,
              self.forwarded,
              self.rejected);
    }
}
