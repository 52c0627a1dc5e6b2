use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::future::LocalBoxFuture;
use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, StreamExt};
use tokio::sync::{broadcast, mpsc};

use crate::cache::InviteCache;
use crate::config::TrackerConfig;
use crate::events::{EventBus, TrackerEvent};
use crate::loader::CacheLoader;
use crate::notification::Notification;
use crate::router::EventRouter;
use crate::session::Session;

/// Owns the invite cache and publishes tracker outcomes.
///
/// Notifications are fed either one at a time through [`handle`](Self::handle)
/// or as a stream through [`run`](Self::run), which keeps several member-join
/// fetches in flight at once. All work happens on the caller's task.
pub struct InviteTracker<S> {
    session: Arc<S>,
    cache: Arc<InviteCache>,
    loader: CacheLoader<S>,
    router: EventRouter<S>,
    bus: EventBus,
    initial_load_claimed: AtomicBool,
}

impl<S: Session> InviteTracker<S> {
    pub fn new(session: Arc<S>, config: TrackerConfig) -> Self {
        let cache = Arc::new(InviteCache::empty());
        let bus = EventBus::new(config.event_capacity);
        Self {
            loader: CacheLoader::new(session.clone(), cache.clone(), config.clone()),
            router: EventRouter::new(session.clone(), cache.clone(), config),
            session,
            cache,
            bus,
            initial_load_claimed: AtomicBool::new(false),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.bus.subscribe()
    }

    pub fn cache(&self) -> &InviteCache {
        &self.cache
    }

    /// Run the initial load now if the session is already established.
    /// Otherwise the load waits for the first `Ready` notification.
    pub async fn start(&self) {
        if self.session.is_ready() && self.claim_initial_load() {
            self.load_and_announce().await;
        }
    }

    /// Re-fetch one guild's invites into the cache.
    pub async fn load_guild(&self, guild_id: i64) -> usize {
        self.loader.load_guild(guild_id).await
    }

    /// Process one notification to completion.
    pub async fn handle(&self, notification: Notification) {
        if let Some(task) = self.dispatch(notification) {
            task.await;
        }
    }

    /// Drain `notifications` until the sender side closes. Cache mutations
    /// from invite create/delete apply in arrival order; member joins and the
    /// initial load progress concurrently and publish when their fetch
    /// resolves.
    pub async fn run(&self, mut notifications: mpsc::Receiver<Notification>) {
        let mut in_flight: FuturesUnordered<LocalBoxFuture<'_, ()>> = FuturesUnordered::new();
        if self.session.is_ready() && self.claim_initial_load() {
            in_flight.push(self.load_and_announce().boxed_local());
        }

        loop {
            tokio::select! {
                received = notifications.recv() => match received {
                    Some(notification) => {
                        if let Some(task) = self.dispatch(notification) {
                            in_flight.push(task);
                        }
                    }
                    None => break,
                },
                Some(()) = in_flight.next(), if !in_flight.is_empty() => {}
            }
        }

        while in_flight.next().await.is_some() {}
        tracing::debug!("notification stream closed");
    }

    /// Apply synchronous effects right away and hand back the asynchronous
    /// remainder, if any.
    fn dispatch(&self, notification: Notification) -> Option<LocalBoxFuture<'_, ()>> {
        match notification {
            Notification::Ready => {
                if self.claim_initial_load() {
                    Some(self.load_and_announce().boxed_local())
                } else {
                    None
                }
            }
            Notification::MemberAdd(member) => Some(
                async move {
                    if let Some(event) = self.router.member_add(member).await {
                        self.bus.publish(event);
                    }
                }
                .boxed_local(),
            ),
            Notification::InviteCreate(invite) => {
                if let Some(event) = self.router.invite_create(&invite) {
                    self.bus.publish(event);
                }
                None
            }
            Notification::InviteDelete(deleted) => {
                if let Some(event) = self.router.invite_delete(&deleted) {
                    self.bus.publish(event);
                }
                None
            }
        }
    }

    fn claim_initial_load(&self) -> bool {
        !self.initial_load_claimed.swap(true, Ordering::SeqCst)
    }

    async fn load_and_announce(&self) {
        match self.loader.load_all().await {
            Ok(_) => self.bus.publish(TrackerEvent::CacheReady {
                invites: self.cache.snapshot(),
            }),
            Err(e) => tracing::error!(error = %e, "failed to list guilds, invite cache not loaded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::events::JoinReason;
    use crate::test_support::{invite, invite_delete, member, FakeSession};

    fn drain(rx: &mut broadcast::Receiver<TrackerEvent>) -> Vec<TrackerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn start_loads_when_session_is_ready() {
        let session = Arc::new(FakeSession::ready().with_guild(1, true, vec![invite("a", 1, 1)]));
        let tracker = InviteTracker::new(session, TrackerConfig::default());
        let mut rx = tracker.subscribe();

        tracker.start().await;
        tracker.start().await;

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        match &events[0] {
            TrackerEvent::CacheReady { invites } => assert!(invites.contains_key("a")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn pending_session_waits_for_ready() {
        let session = Arc::new(FakeSession::pending().with_guild(1, true, vec![invite("a", 1, 1)]));
        let tracker = InviteTracker::new(session, TrackerConfig::default());
        let mut rx = tracker.subscribe();

        tracker.start().await;
        assert!(drain(&mut rx).is_empty());
        assert!(tracker.cache().is_empty());

        tracker.handle(Notification::Ready).await;
        tracker.handle(Notification::Ready).await;
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], TrackerEvent::CacheReady { .. }));
        assert_eq!(tracker.cache().len(), 1);
    }

    #[tokio::test]
    async fn cache_ready_fires_once_despite_failures() {
        let session = FakeSession::ready()
            .with_guild(1, true, vec![invite("a", 1, 1)])
            .with_guild(2, true, vec![invite("b", 1, 2)])
            .with_guild(3, true, vec![invite("c", 1, 3)]);
        session.fail_fetches(1);
        session.fail_fetches(3);
        let tracker = InviteTracker::new(Arc::new(session), TrackerConfig::default());
        let mut rx = tracker.subscribe();

        tracker.start().await;
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        match &events[0] {
            TrackerEvent::CacheReady { invites } => {
                assert_eq!(invites.len(), 1);
                assert!(invites.contains_key("b"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn run_processes_until_sender_closes() {
        let session = Arc::new(FakeSession::ready().with_guild(1, true, vec![invite("a", 0, 1)]));
        let tracker = InviteTracker::new(session, TrackerConfig::default());
        let mut rx = tracker.subscribe();

        let (tx, notifications) = mpsc::channel(16);
        tx.send(Notification::MemberAdd(member(1, true))).await.unwrap();
        tx.send(Notification::InviteCreate(invite("b", 0, 1))).await.unwrap();
        drop(tx);
        tracker.run(notifications).await;

        let events = drain(&mut rx);
        let names: Vec<_> = events.iter().map(TrackerEvent::name).collect();
        assert!(names.contains(&"cache_ready"));
        assert!(names.contains(&"invite_create"));
        assert!(events.iter().any(|e| matches!(
            e,
            TrackerEvent::MemberJoin { reason: JoinReason::Bot, .. }
        )));
        assert_eq!(tracker.cache().len(), 2);
    }

    #[tokio::test]
    async fn listing_failure_publishes_nothing_and_stays_claimed() {
        let session = Arc::new(FakeSession::ready().with_guild(1, true, vec![invite("a", 1, 1)]));
        session.fail_guild_listing(true);
        let tracker = InviteTracker::new(session.clone(), TrackerConfig::default());
        let mut rx = tracker.subscribe();

        tracker.start().await;
        assert!(drain(&mut rx).is_empty());
        assert!(tracker.cache().is_empty());
        assert_eq!(session.fetch_count(), 0);

        // the one-shot load is spent; later ready notifications do not retry
        session.fail_guild_listing(false);
        tracker.handle(Notification::Ready).await;
        tracker.start().await;
        assert!(drain(&mut rx).is_empty());
        assert!(tracker.cache().is_empty());

        assert_eq!(tracker.load_guild(1).await, 1);
        assert!(tracker.cache().contains("a"));
    }

    #[tokio::test]
    async fn delete_during_initial_load_is_not_undone() {
        let session = FakeSession::ready()
            .with_guild(1, true, vec![invite("A", 3, 1), invite("B", 1, 1)]);
        session.delay_fetches(Duration::from_millis(50));
        let tracker = InviteTracker::new(Arc::new(session), TrackerConfig::default());
        let mut rx = tracker.subscribe();

        let (tx, notifications) = mpsc::channel(4);
        let feed = async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            tx.send(Notification::InviteDelete(invite_delete("A", 1)))
                .await
                .unwrap();
        };
        tokio::join!(tracker.run(notifications), feed);

        let events = drain(&mut rx);
        let names: Vec<_> = events.iter().map(TrackerEvent::name).collect();
        assert_eq!(names, vec!["invite_delete", "cache_ready"]);
        match &events[1] {
            TrackerEvent::CacheReady { invites } => {
                assert!(!invites.contains_key("A"));
                assert!(invites.contains_key("B"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!tracker.cache().contains("A"));
        assert_eq!(tracker.cache().len(), 1);
    }
}
