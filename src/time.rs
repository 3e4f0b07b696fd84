//! Recurring timers.
//!
//! A `Ticker` runs a closure on its own thread once per interval until it is
//! stopped or dropped. Stopping wakes the thread immediately rather than
//! waiting out the remainder of the interval.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// The tick period of the dashboard view.
pub const DEFAULT_TICK: u64 = 500;

/// A recurring timer thread
pub struct Ticker {
    stop: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Ticker {
    /// Spawn a thread calling `tick` every `interval`
    ///
    /// The first call happens one interval after spawning.
    pub fn spawn<F>(name: &str, interval: Duration, mut tick: F) -> io::Result<Ticker>
    where
        F: FnMut() + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let handle = thread::Builder::new().name(name.to_string()).spawn(move || {
            let mut next = Instant::now() + interval;
            while !flag.load(Ordering::Acquire) {
                let now = Instant::now();
                if now >= next {
                    tick();
                    next = now + interval;
                } else {
                    thread::park_timeout(next - now);
                }
            }
            trace!("ticker exiting");
        })?;
        Ok(Ticker {
            stop: stop,
            thread: Some(handle),
        })
    }

    /// True until stopped.
    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Stop the thread and wait for it. Safe to call more than once.
    pub fn stop(&mut self) {
        if let Some(handle) = self.thread.take() {
            self.stop.store(true, Ordering::Release);
            handle.thread().unpark();
            if handle.join().is_err() {
                error!("ticker thread panicked");
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop()
    }
}
