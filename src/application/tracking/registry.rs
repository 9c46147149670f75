//! Session registry for topic-based fan-out.
//!
//! Keeps a bidirectional index of live sessions and the topics they joined,
//! plus each session's outbox.
//!
//! # Architecture
//!
//! ```text
//! sessions                          subscribers
//! ├── s-1 {bus:B1, all-buses}       ├── bus:B1    → {s-1, s-2}
//! ├── s-2 {bus:B1}                  ├── bus:B2    → {s-3}
//! └── s-3 {bus:B2}                  └── all-buses → {s-1}
//! ```
//!
//! An update for B1 reaches `subscribers[bus:B1] ∪ subscribers[all-buses]`
//! = {s-1, s-2}, each exactly once. Lookup cost is proportional to the
//! receive-set, never to the number of sessions.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use tokio::sync::{mpsc, RwLock};

use crate::domain::foundation::{AuthenticatedUser, BusId, SessionId, Timestamp};
use crate::domain::tracking::{BusLocationBroadcast, Topic, TrackingError, TrackingEvent};

/// Sending half of a session's event queue.
pub type Outbox = mpsc::Sender<TrackingEvent>;

/// Receiving half of a session's event queue, drained by the transport.
pub type Inbox = mpsc::Receiver<TrackingEvent>;

const DEFAULT_OUTBOX_CAPACITY: usize = 128;

/// One authenticated live connection.
///
/// Identity and role are fixed at connect time.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: SessionId,
    pub user: AuthenticatedUser,
    pub connected_at: Timestamp,
}

struct SessionEntry {
    session: Session,
    topics: HashSet<Topic>,
    outbox: Outbox,
    /// Newest bus state time queued per bus. Held across check-and-send so
    /// a snapshot never lands behind a newer broadcast.
    latest: Mutex<HashMap<BusId, Timestamp>>,
}

impl SessionEntry {
    fn deliver(&self, event: TrackingEvent) -> bool {
        let stamp = event.bus_stamp().map(|(bus_id, at)| (bus_id.clone(), at));
        let Some((bus_id, at)) = stamp else {
            return deliver(&self.session.id, &self.outbox, event);
        };

        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        if !deliver(&self.session.id, &self.outbox, event) {
            return false;
        }
        let newest = latest.entry(bus_id).or_insert(at);
        if *newest < at {
            *newest = at;
        }
        true
    }

    fn deliver_snapshot(&self, snapshot: BusLocationBroadcast) -> bool {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        if latest
            .get(&snapshot.bus_id)
            .is_some_and(|newest| snapshot.timestamp < *newest)
        {
            tracing::debug!(
                session_id = %self.session.id,
                bus_id = %snapshot.bus_id,
                "Skipping snapshot older than a delivered broadcast"
            );
            return false;
        }

        let (bus_id, at) = (snapshot.bus_id.clone(), snapshot.timestamp);
        if !deliver(&self.session.id, &self.outbox, TrackingEvent::BusLocation(snapshot)) {
            return false;
        }
        latest.insert(bus_id, at);
        true
    }
}

#[derive(Default)]
struct Index {
    sessions: HashMap<SessionId, SessionEntry>,
    subscribers: HashMap<Topic, HashSet<SessionId>>,
}

/// Tracks live sessions and their topic memberships.
///
/// # Thread Safety
///
/// Both directions of the index sit behind one `RwLock`, so a subscribe,
/// unsubscribe or removal is never observed half-applied by a fan-out.
/// Delivery happens under the read lock with `try_send`, which never waits.
/// The index holds the only `Outbox` of each session, so once `remove`
/// returns nothing can queue another event for that session.
pub struct SessionRegistry {
    index: RwLock<Index>,
    outbox_capacity: usize,
}

impl SessionRegistry {
    /// Create a registry whose sessions buffer up to `outbox_capacity`
    /// undelivered events before dropping new ones.
    pub fn new(outbox_capacity: usize) -> Self {
        Self {
            index: RwLock::new(Index::default()),
            outbox_capacity: outbox_capacity.max(1),
        }
    }

    /// Create with default capacity (128 events).
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_OUTBOX_CAPACITY)
    }

    /// Register a new session with no subscriptions.
    ///
    /// The session becomes visible to fan-out once this returns.
    pub async fn register(&self, user: AuthenticatedUser) -> (Session, Inbox) {
        let (outbox, inbox) = mpsc::channel(self.outbox_capacity);
        let session = Session {
            id: SessionId::new(),
            user,
            connected_at: Timestamp::now(),
        };

        self.index.write().await.sessions.insert(
            session.id,
            SessionEntry {
                session: session.clone(),
                topics: HashSet::new(),
                outbox,
                latest: Mutex::new(HashMap::new()),
            },
        );

        (session, inbox)
    }

    /// Look up a live session.
    pub async fn session(&self, session_id: &SessionId) -> Option<Session> {
        self.index
            .read()
            .await
            .sessions
            .get(session_id)
            .map(|entry| entry.session.clone())
    }

    /// Join a topic. Returns `false` if the session was already a member.
    pub async fn subscribe(
        &self,
        session_id: &SessionId,
        topic: Topic,
    ) -> Result<bool, TrackingError> {
        let mut index = self.index.write().await;
        let Index {
            sessions,
            subscribers,
        } = &mut *index;

        let entry = sessions
            .get_mut(session_id)
            .ok_or(TrackingError::SessionGone(*session_id))?;

        if !entry.topics.insert(topic.clone()) {
            return Ok(false);
        }
        subscribers.entry(topic).or_default().insert(*session_id);
        Ok(true)
    }

    /// Leave a topic. Returns `false` if the session was not a member.
    pub async fn unsubscribe(
        &self,
        session_id: &SessionId,
        topic: &Topic,
    ) -> Result<bool, TrackingError> {
        let mut index = self.index.write().await;
        let Index {
            sessions,
            subscribers,
        } = &mut *index;

        let entry = sessions
            .get_mut(session_id)
            .ok_or(TrackingError::SessionGone(*session_id))?;

        if !entry.topics.remove(topic) {
            return Ok(false);
        }
        detach(subscribers, topic, session_id);
        Ok(true)
    }

    /// Topics the session currently belongs to.
    pub async fn subscriptions(&self, session_id: &SessionId) -> Option<HashSet<Topic>> {
        self.index
            .read()
            .await
            .sessions
            .get(session_id)
            .map(|entry| entry.topics.clone())
    }

    /// Remove a session and every topic membership it holds.
    ///
    /// Dropping the entry closes the outbox, which ends the transport's
    /// delivery loop. Removing an unknown session is a no-op.
    pub async fn remove(&self, session_id: &SessionId) -> Option<Session> {
        let mut index = self.index.write().await;
        let entry = index.sessions.remove(session_id)?;

        for topic in &entry.topics {
            detach(&mut index.subscribers, topic, session_id);
        }

        Some(entry.session)
    }

    /// Send an event to one session. Returns whether it was queued.
    pub async fn send_to(&self, session_id: &SessionId, event: TrackingEvent) -> bool {
        let index = self.index.read().await;
        match index.sessions.get(session_id) {
            Some(entry) => entry.deliver(event),
            None => false,
        }
    }

    /// Send a subscribe-time snapshot to one session.
    ///
    /// Skipped when the session already holds a newer broadcast for the
    /// same bus, so a subscriber never ends on older state.
    pub async fn send_snapshot(
        &self,
        session_id: &SessionId,
        snapshot: BusLocationBroadcast,
    ) -> bool {
        let index = self.index.read().await;
        match index.sessions.get(session_id) {
            Some(entry) => entry.deliver_snapshot(snapshot),
            None => false,
        }
    }

    /// Deliver `event` once to every session subscribed to any of `topics`.
    ///
    /// Returns the number of sessions the event was queued for. Sessions
    /// whose outbox is full or closed are skipped.
    pub async fn fan_out(&self, topics: &[Topic], event: TrackingEvent) -> usize {
        let index = self.index.read().await;
        let mut seen = HashSet::new();
        let mut delivered = 0;

        for topic in topics {
            let Some(members) = index.subscribers.get(topic) else {
                continue;
            };
            for session_id in members {
                if !seen.insert(*session_id) {
                    continue;
                }
                let Some(entry) = index.sessions.get(session_id) else {
                    continue;
                };
                if entry.deliver(event.clone()) {
                    delivered += 1;
                }
            }
        }

        delivered
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.index.read().await.sessions.len()
    }

    /// Number of sessions subscribed to `topic`.
    pub async fn subscriber_count(&self, topic: &Topic) -> usize {
        self.index
            .read()
            .await
            .subscribers
            .get(topic)
            .map(HashSet::len)
            .unwrap_or(0)
    }

    /// Number of topics with at least one subscriber.
    pub async fn active_topic_count(&self) -> usize {
        self.index.read().await.subscribers.len()
    }

    /// Drop every session, closing all outboxes. Used at process shutdown.
    ///
    /// Returns how many sessions were dropped.
    pub async fn shutdown(&self) -> usize {
        let mut index = self.index.write().await;
        let dropped = index.sessions.len();
        index.sessions.clear();
        index.subscribers.clear();
        dropped
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Remove `session_id` from `topic`, dropping the topic once it is empty.
fn detach(
    subscribers: &mut HashMap<Topic, HashSet<SessionId>>,
    topic: &Topic,
    session_id: &SessionId,
) {
    if let Some(members) = subscribers.get_mut(topic) {
        members.remove(session_id);
        if members.is_empty() {
            subscribers.remove(topic);
        }
    }
}

fn deliver(session_id: &SessionId, outbox: &Outbox, event: TrackingEvent) -> bool {
    match outbox.try_send(event) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(event)) => {
            tracing::warn!(
                session_id = %session_id,
                event = event.name(),
                "Outbox full, dropping event for slow session"
            );
            false
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            tracing::trace!(session_id = %session_id, "Outbox closed, session gone");
            false
        }
    }
}
