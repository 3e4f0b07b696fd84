//! Sources deliver metric samples into nodestats.
//!
//! A source owns the sending half of the ingestion queue and pushes every
//! batch of samples it decodes. What it forwards is governed by a `Link`,
//! the shared view of the backend connection that the store registers its
//! topics with.

use metric::Topic;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use subscription::Transport;

mod replay;

pub use self::replay::Replay;

/// Something that produces samples until its input is exhausted
pub trait Source {
    /// Produce samples until done.
    fn run(&mut self) -> ();
}

#[derive(Debug, Default)]
struct LinkState {
    connected: bool,
    session: u64,
    topics: HashSet<Topic>,
}

/// Connection state shared between a source and the store
///
/// The source side flips the connection up and down; the store side asks
/// for topics through the `Transport` impl. Dropping the connection forgets
/// every topic, as a backend would.
#[derive(Debug, Clone, Default)]
pub struct Link {
    state: Arc<Mutex<LinkState>>,
}

impl Link {
    fn state(&self) -> MutexGuard<LinkState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Bring the link up or down. Every up transition starts a new session.
    pub fn set_connected(&self, connected: bool) {
        let mut state = self.state();
        if state.connected != connected {
            info!("link {}", if connected { "up" } else { "down" });
            if connected {
                state.session += 1;
            }
        }
        state.connected = connected;
        if !connected {
            state.topics.clear();
        }
    }

    /// True while the link is up.
    pub fn is_connected(&self) -> bool {
        self.state().connected
    }

    /// True if samples of `topic` should be delivered.
    pub fn wants(&self, topic: Topic) -> bool {
        let state = self.state();
        state.connected && state.topics.contains(&topic)
    }

    /// True if any topic is subscribed.
    pub fn has_topics(&self) -> bool {
        !self.state().topics.is_empty()
    }
}

impl Transport for Link {
    fn connected(&self) -> bool {
        self.is_connected()
    }

    fn subscribe(&mut self, topics: &[Topic]) {
        let mut state = self.state();
        if !state.connected {
            warn!("subscribe on a down link ignored");
            return;
        }
        state.topics.extend(topics.iter().cloned());
    }

    fn unsubscribe(&mut self, topics: &[Topic]) {
        let mut state = self.state();
        for topic in topics {
            state.topics.remove(topic);
        }
    }

    fn session(&self) -> u64 {
        self.state().session
    }
}
