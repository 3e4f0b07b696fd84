//! Observer and topic bookkeeping.
//!
//! Two independent lifecycles live here. `Subscribers` tracks in-process
//! observers of the store, each identified by a `Handle`. `Registration`
//! tracks whether the backend has been asked to deliver the dashboard's
//! topics. Both are idempotent: repeating a subscribe or unsubscribe has no
//! further effect.

use metric::Topic;
use slab::Slab;
use store::Snapshot;

/// Something interested in store updates
///
/// Observers are notified once per ingested batch, after the whole batch
/// has been applied.
pub trait Observer: Send {
    /// Called with the store's state after a batch.
    fn notify(&mut self, snapshot: &Snapshot);
}

impl<F> Observer for F
where
    F: FnMut(&Snapshot) + Send,
{
    fn notify(&mut self, snapshot: &Snapshot) {
        self(snapshot)
    }
}

/// Identifies one subscription
///
/// Slots are reused after unsubscribe, so a handle also records the
/// generation it was issued in. A stale handle never matches a newer
/// observer in the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    key: usize,
    generation: u64,
}

/// The set of live observers
pub struct Subscribers {
    slots: Slab<(u64, Box<dyn Observer>)>,
    generation: u64,
}

impl Default for Subscribers {
    fn default() -> Subscribers {
        Subscribers {
            slots: Slab::new(),
            generation: 0,
        }
    }
}

impl Subscribers {
    /// Add an observer and return its handle.
    pub fn subscribe<O>(&mut self, observer: O) -> Handle
    where
        O: Observer + 'static,
    {
        self.generation += 1;
        let key = self.slots.insert((self.generation, Box::new(observer)));
        debug!("observer subscribed in slot {}", key);
        Handle {
            key: key,
            generation: self.generation,
        }
    }

    /// Remove the observer behind `handle`
    ///
    /// Returns false, and does nothing, if the handle was already
    /// unsubscribed.
    pub fn unsubscribe(&mut self, handle: Handle) -> bool {
        let live = match self.slots.get(handle.key) {
            Some(&(generation, _)) => generation == handle.generation,
            None => false,
        };
        if live {
            self.slots.remove(handle.key);
            debug!("observer unsubscribed from slot {}", handle.key);
        } else {
            trace!("ignoring unsubscribe of stale handle {:?}", handle);
        }
        live
    }

    /// True if `handle` names a live observer.
    pub fn is_subscribed(&self, handle: Handle) -> bool {
        match self.slots.get(handle.key) {
            Some(&(generation, _)) => generation == handle.generation,
            None => false,
        }
    }

    /// Hand `snapshot` to every observer.
    pub fn notify(&mut self, snapshot: &Snapshot) {
        for (_, slot) in self.slots.iter_mut() {
            slot.1.notify(snapshot);
        }
    }

    /// Number of live observers.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if there are no observers.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drop every observer.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

/// The link to the backend
///
/// Implementations forward topic (un)subscriptions to whatever delivers
/// samples and report whether that link is currently up.
pub trait Transport: Send {
    /// True while the link is up.
    fn connected(&self) -> bool;
    /// Ask for `topics` to be delivered.
    fn subscribe(&mut self, topics: &[Topic]);
    /// Stop delivery of `topics`.
    fn unsubscribe(&mut self, topics: &[Topic]);

    /// Identifies the current connection
    ///
    /// Links that forget subscriptions when they drop must return a new
    /// value after every reconnect, so a registration made on an earlier
    /// connection is known to be gone.
    fn session(&self) -> u64 {
        0
    }
}

/// Topic registration guarded by an explicit flag
pub struct Registration {
    transport: Box<dyn Transport>,
    topics: Vec<Topic>,
    registered: bool,
    session: u64,
}

impl Registration {
    /// Track registration of `topics` over `transport`.
    pub fn new<T>(transport: T, topics: &[Topic]) -> Registration
    where
        T: Transport + 'static,
    {
        Registration {
            transport: Box::new(transport),
            topics: topics.to_vec(),
            registered: false,
            session: 0,
        }
    }

    /// True while the transport's link is up.
    pub fn connected(&self) -> bool {
        self.transport.connected()
    }

    /// True if our topics were registered on the current connection.
    pub fn is_registered(&self) -> bool {
        self.registered && self.session == self.transport.session()
    }

    /// Ask the transport for our topics unless already registered.
    ///
    /// Returns true if a request was sent.
    pub fn register(&mut self) -> bool {
        if self.is_registered() {
            trace!("topics already registered");
            return false;
        }
        info!("registering {} topics", self.topics.len());
        self.transport.subscribe(&self.topics);
        self.registered = true;
        self.session = self.transport.session();
        true
    }

    /// Withdraw our topics if registered.
    ///
    /// Returns true if a request was sent.
    pub fn unregister(&mut self) -> bool {
        if !self.is_registered() {
            trace!("topics not registered, nothing to withdraw");
            self.registered = false;
            return false;
        }
        info!("unregistering {} topics", self.topics.len());
        self.transport.unsubscribe(&self.topics);
        self.registered = false;
        true
    }

    /// Forget the registration without telling the transport.
    ///
    /// Used when the link dropped and the backend has already forgotten us.
    pub fn reset(&mut self) {
        if self.registered {
            debug!("link lost, topic registration cleared");
        }
        self.registered = false;
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use metric::MISC_TOPICS;
    use std::sync::{Arc, Mutex};
    use store::MetricsStore;

    /// Transport double recording every request it receives.
    #[derive(Clone, Default)]
    pub struct Recorder {
        pub up: Arc<Mutex<bool>>,
        pub session: Arc<Mutex<u64>>,
        pub subscribes: Arc<Mutex<Vec<Vec<Topic>>>>,
        pub unsubscribes: Arc<Mutex<Vec<Vec<Topic>>>>,
    }

    impl Recorder {
        pub fn set_connected(&self, up: bool) {
            *self.up.lock().unwrap() = up;
        }

        /// Simulate a reconnect the owner of the registration missed.
        pub fn reconnect(&self) {
            *self.session.lock().unwrap() += 1;
        }

        pub fn subscribe_count(&self) -> usize {
            self.subscribes.lock().unwrap().len()
        }

        pub fn unsubscribe_count(&self) -> usize {
            self.unsubscribes.lock().unwrap().len()
        }
    }

    impl Transport for Recorder {
        fn connected(&self) -> bool {
            *self.up.lock().unwrap()
        }

        fn subscribe(&mut self, topics: &[Topic]) {
            self.subscribes.lock().unwrap().push(topics.to_vec());
        }

        fn unsubscribe(&mut self, topics: &[Topic]) {
            self.unsubscribes.lock().unwrap().push(topics.to_vec());
        }

        fn session(&self) -> u64 {
            *self.session.lock().unwrap()
        }
    }

    fn empty_snapshot() -> Snapshot {
        MetricsStore::new(4).unwrap().snapshot()
    }

    #[test]
    fn register_twice_subscribes_once() {
        let rec = Recorder::default();
        let mut reg = Registration::new(rec.clone(), &MISC_TOPICS);
        assert!(reg.register());
        assert!(!reg.register());
        assert_eq!(1, rec.subscribe_count());
        assert_eq!(MISC_TOPICS.to_vec(), rec.subscribes.lock().unwrap()[0]);
        assert!(reg.is_registered());
    }

    #[test]
    fn unregister_when_unregistered_is_noop() {
        let rec = Recorder::default();
        let mut reg = Registration::new(rec.clone(), &MISC_TOPICS);
        assert!(!reg.unregister());
        assert_eq!(0, rec.unsubscribe_count());
        assert_eq!(0, rec.subscribe_count());
        assert!(!reg.is_registered());
    }

    #[test]
    fn register_unregister_cycle() {
        let rec = Recorder::default();
        let mut reg = Registration::new(rec.clone(), &MISC_TOPICS);
        reg.register();
        reg.unregister();
        reg.unregister();
        reg.register();
        assert_eq!(2, rec.subscribe_count());
        assert_eq!(1, rec.unsubscribe_count());
    }

    #[test]
    fn reset_forgets_without_sending() {
        let rec = Recorder::default();
        let mut reg = Registration::new(rec.clone(), &MISC_TOPICS);
        reg.register();
        reg.reset();
        assert!(!reg.is_registered());
        assert_eq!(0, rec.unsubscribe_count());
        assert!(reg.register());
        assert_eq!(2, rec.subscribe_count());
    }

    #[test]
    fn missed_reconnect_invalidates_registration() {
        let rec = Recorder::default();
        let mut reg = Registration::new(rec.clone(), &MISC_TOPICS);
        assert!(reg.register());
        rec.reconnect();
        assert!(!reg.is_registered());
        assert!(!reg.unregister());
        assert_eq!(0, rec.unsubscribe_count());
        assert!(reg.register());
        assert!(!reg.register());
        assert_eq!(2, rec.subscribe_count());
    }

    #[test]
    fn connected_reflects_transport() {
        let rec = Recorder::default();
        let reg = Registration::new(rec.clone(), &MISC_TOPICS);
        assert!(!reg.connected());
        rec.set_connected(true);
        assert!(reg.connected());
    }

    #[test]
    fn notify_reaches_every_observer() {
        let hits = Arc::new(Mutex::new(0));
        let mut subs = Subscribers::default();
        for _ in 0..3 {
            let hits = hits.clone();
            subs.subscribe(move |_: &Snapshot| *hits.lock().unwrap() += 1);
        }
        subs.notify(&empty_snapshot());
        assert_eq!(3, *hits.lock().unwrap());
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let mut subs = Subscribers::default();
        let h = subs.subscribe(|_: &Snapshot| {});
        assert!(subs.is_subscribed(h));
        assert!(subs.unsubscribe(h));
        assert!(!subs.unsubscribe(h));
        assert!(subs.is_empty());
    }

    #[test]
    fn stale_handle_does_not_remove_new_observer() {
        let mut subs = Subscribers::default();
        let old = subs.subscribe(|_: &Snapshot| {});
        subs.unsubscribe(old);
        let new = subs.subscribe(|_: &Snapshot| {});
        assert!(!subs.unsubscribe(old));
        assert!(subs.is_subscribed(new));
        assert_eq!(1, subs.len());
    }

    #[test]
    fn clear_drops_all() {
        let mut subs = Subscribers::default();
        let a = subs.subscribe(|_: &Snapshot| {});
        subs.subscribe(|_: &Snapshot| {});
        subs.clear();
        assert!(subs.is_empty());
        assert!(!subs.is_subscribed(a));
    }
}
