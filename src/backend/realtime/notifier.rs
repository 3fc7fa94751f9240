/**
 * Streaming Notifier
 *
 * One session task per connected client. A session moves through
 * `Opening -> Active -> Closed` and, while active:
 *
 * - emits `ready` with the current local revision as soon as it starts
 * - relays every local commit from the revision publisher as a
 *   `store-update` tagged `local`; the subscription is taken when the
 *   connection opens, before `ready` reads the revision
 * - polls the change beacon on a fixed interval and emits a `store-update`
 *   tagged `marker-poll` when another process moved the marker past the
 *   last marker this session saw or announced itself
 * - emits `ping` on a fixed, longer interval to keep the transport open
 *
 * At most one beacon poll is in flight per connection. Poll ticks that
 * fire while a poll is still running are skipped, not queued.
 *
 * # Teardown
 *
 * The session closes when the client drops its `StreamConnection`, when
 * `ConnectionHandle::close` is called, or when the notifier shuts down.
 * Closing unsubscribes from the publisher, stops both timers and drops any
 * in-flight poll. Emits that race with the close are dropped silently.
 *
 * Events never carry data. Clients refetch through the read path.
 */
use futures_util::future::OptionFuture;
use futures_util::Stream;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch, Notify};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use uuid::Uuid;

use super::beacon::{BeaconPoller, ChangeBeacon};
use super::policy::{best_effort, TransportFailure};
use super::publisher::{RevisionPublisher, Subscription};
use crate::backend::store::{Store, StoreError};
use crate::shared::{RevisionEvent, StreamEvent, UpdateSource};

/// Default keep-alive interval
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);

/// Default beacon poll interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default number of events buffered per connection
pub const DEFAULT_EVENT_BUFFER: usize = 64;

type PollFuture = Pin<Box<dyn Future<Output = Result<u64, StoreError>> + Send>>;

/// Timer and buffer settings shared by every connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifierConfig {
    pub heartbeat_interval: Duration,
    pub poll_interval: Duration,
    pub event_buffer: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            poll_interval: DEFAULT_POLL_INTERVAL,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

/// Lifecycle of one stream connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Opening,
    Active,
    Closed,
}

struct SessionShared {
    id: Uuid,
    state: Mutex<ConnectionState>,
    close: Notify,
}

impl SessionShared {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: Mutex::new(ConnectionState::Opening),
            close: Notify::new(),
        }
    }

    fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_closed(&self) -> bool {
        self.state() == ConnectionState::Closed
    }

    /// Opening -> Active; false if the connection was closed first
    fn activate(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state == ConnectionState::Opening {
            *state = ConnectionState::Active;
            true
        } else {
            false
        }
    }

    /// Move to Closed; false if already closed
    fn mark_closed(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let was_open = *state != ConnectionState::Closed;
        *state = ConnectionState::Closed;
        was_open
    }
}

/// Control handle for one connection
#[derive(Clone)]
pub struct ConnectionHandle {
    shared: Arc<SessionShared>,
}

impl ConnectionHandle {
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Close the connection; idempotent
    pub fn close(&self) {
        if self.shared.mark_closed() {
            tracing::debug!("[Realtime] Stream {} close requested", self.shared.id);
        }
        // Stores a permit if the session is not waiting right now
        self.shared.close.notify_one();
    }
}

/// Client side of a stream connection: a stream of events
///
/// Dropping it closes the connection.
pub struct StreamConnection {
    events: mpsc::Receiver<StreamEvent>,
    handle: ConnectionHandle,
}

impl StreamConnection {
    pub fn handle(&self) -> ConnectionHandle {
        self.handle.clone()
    }

    pub fn id(&self) -> Uuid {
        self.handle.id()
    }

    /// Next event, or `None` once the session has shut down
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.events.recv().await
    }

    pub fn close(&self) {
        self.handle.close();
    }
}

impl Stream for StreamConnection {
    type Item = StreamEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().events.poll_recv(cx)
    }
}

impl Drop for StreamConnection {
    fn drop(&mut self) {
        self.handle.close();
    }
}

/// Opens stream connections and owns their shared settings
#[derive(Clone)]
pub struct StreamNotifier {
    publisher: RevisionPublisher,
    beacon: Arc<dyn ChangeBeacon>,
    config: NotifierConfig,
    shutdown: Arc<watch::Sender<bool>>,
    active: Arc<AtomicUsize>,
}

impl StreamNotifier {
    pub fn new(
        publisher: RevisionPublisher,
        beacon: Arc<dyn ChangeBeacon>,
        config: NotifierConfig,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            publisher,
            beacon,
            config,
            shutdown: Arc::new(shutdown),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Notifier fed by `store`'s publisher and polling `store`'s backend
    pub fn for_store(store: &Store, config: NotifierConfig) -> Self {
        let beacon: Arc<dyn ChangeBeacon> = Arc::new(store.backend());
        Self::new(store.publisher().clone(), beacon, config)
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    /// Connections whose session has not finished teardown
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Open a new connection and start its session task
    pub fn open(&self) -> StreamConnection {
        let (tx, rx) = mpsc::channel(self.config.event_buffer.max(1));
        let shared = Arc::new(SessionShared::new());
        self.active.fetch_add(1, Ordering::SeqCst);

        // Subscribed before `ready` is read, so no commit falls in between
        let (local_tx, local_rx) = mpsc::unbounded_channel::<RevisionEvent>();
        let subscription = self.publisher.subscribe(move |event| {
            let _ = local_tx.send(*event);
        });

        let session = Session {
            publisher: self.publisher.clone(),
            subscription,
            local_rx,
            beacon: Arc::clone(&self.beacon),
            config: self.config,
            emitter: Emitter {
                tx,
                shared: Arc::clone(&shared),
            },
            shutdown: self.shutdown.subscribe(),
            active: Arc::clone(&self.active),
        };
        tokio::spawn(run_session(session));

        tracing::info!("[Realtime] Stream {} opened", shared.id);
        StreamConnection {
            events: rx,
            handle: ConnectionHandle { shared },
        }
    }

    /// Close every open connection
    pub fn shutdown(&self) {
        tracing::info!(
            "[Realtime] Shutting down {} stream connections",
            self.active_connections()
        );
        self.shutdown.send_replace(true);
    }
}

struct Emitter {
    tx: mpsc::Sender<StreamEvent>,
    shared: Arc<SessionShared>,
}

impl Emitter {
    fn try_emit(&self, event: StreamEvent) -> Result<(), TransportFailure> {
        if self.shared.is_closed() {
            return Err(TransportFailure::Closed);
        }
        self.tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => TransportFailure::Backpressure,
            TrySendError::Closed(_) => TransportFailure::Closed,
        })
    }

    fn emit(&self, event: StreamEvent) {
        let name = event.name();
        best_effort(name, self.try_emit(event));
    }
}

struct Session {
    publisher: RevisionPublisher,
    subscription: Subscription,
    local_rx: mpsc::UnboundedReceiver<RevisionEvent>,
    beacon: Arc<dyn ChangeBeacon>,
    config: NotifierConfig,
    emitter: Emitter,
    shutdown: watch::Receiver<bool>,
    active: Arc<AtomicUsize>,
}

fn start_poll(beacon: &Arc<dyn ChangeBeacon>) -> PollFuture {
    let beacon = Arc::clone(beacon);
    Box::pin(async move { beacon.current_marker().await })
}

async fn run_session(session: Session) {
    let Session {
        publisher,
        subscription,
        mut local_rx,
        beacon,
        config,
        emitter,
        mut shutdown,
        active,
    } = session;
    let shared = Arc::clone(&emitter.shared);

    if shared.activate() {
        emitter.emit(StreamEvent::ready(publisher.current_revision()));

        let start = Instant::now();
        let mut heartbeat = interval_at(start + config.heartbeat_interval, config.heartbeat_interval);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut poll_timer = interval_at(start + config.poll_interval, config.poll_interval);
        poll_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut poller = BeaconPoller::new();
        // Baseline poll right away so changes after `ready` are not missed
        let mut in_flight: Option<PollFuture> = Some(start_poll(&beacon));

        loop {
            tokio::select! {
                biased;

                _ = shared.close.notified() => break,
                Ok(_) = shutdown.wait_for(|stop| *stop) => break,
                _ = emitter.tx.closed() => break,

                Some(event) = local_rx.recv() => {
                    // Our own commit; the next poll must not report it again
                    poller.advance_to(event.marker);
                    emitter.emit(StreamEvent::from_revision(&event));
                }
                Some(result) = OptionFuture::from(in_flight.as_mut()), if in_flight.is_some() => {
                    in_flight = None;
                    let failed = result.is_err();
                    if poller.observe(result) {
                        emitter.emit(StreamEvent::store_update(
                            publisher.current_revision(),
                            UpdateSource::MarkerPoll,
                        ));
                    } else if failed {
                        tracing::debug!("[Realtime] Stream {} beacon poll failed, retrying next interval", shared.id);
                    }
                }
                _ = heartbeat.tick() => {
                    emitter.emit(StreamEvent::ping(publisher.current_revision()));
                }
                _ = poll_timer.tick() => {
                    if in_flight.is_some() {
                        tracing::debug!("[Realtime] Stream {} poll still in flight, skipping tick", shared.id);
                    } else {
                        in_flight = Some(start_poll(&beacon));
                    }
                }
            }
        }

        subscription.unsubscribe();
        drop(in_flight);
    }
    drop(subscription);

    shared.mark_closed();
    active.fetch_sub(1, Ordering::SeqCst);
    tracing::info!("[Realtime] Stream {} closed", shared.id);
    drop(emitter);
}
