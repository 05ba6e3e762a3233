pub mod hub;
pub mod locks;
pub mod room;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig,
    dao::room_store::RoomStore,
    error::ServiceError,
    services::question_source::QuestionSource,
};

pub use self::hub::RoomHub;
pub use self::locks::RoomLocks;

pub type SharedState = Arc<AppState>;

/// Buffered events per room channel before slow subscribers start lagging.
const ROOM_CHANNEL_CAPACITY: usize = 32;

/// Central application state shared by every route, socket, and background
/// task.
pub struct AppState {
    room_store: RwLock<Option<Arc<dyn RoomStore>>>,
    hub: RoomHub,
    room_locks: RoomLocks,
    question_source: Arc<dyn QuestionSource>,
    config: Arc<AppConfig>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, question_source: Arc<dyn QuestionSource>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            room_store: RwLock::new(None),
            hub: RoomHub::new(ROOM_CHANNEL_CAPACITY),
            room_locks: RoomLocks::new(),
            question_source,
            config: Arc::new(config),
            degraded: degraded_tx,
        })
    }

    /// Obtain a handle to the current room store, if one is installed.
    pub async fn room_store(&self) -> Option<Arc<dyn RoomStore>> {
        let guard = self.room_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the room store or fail with the degraded-mode error.
    pub async fn require_room_store(&self) -> Result<Arc<dyn RoomStore>, ServiceError> {
        self.room_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new room store implementation and leave degraded mode.
    pub async fn install_room_store(&self, store: Arc<dyn RoomStore>) {
        {
            let mut guard = self.room_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current room store and enter degraded mode.
    pub async fn clear_room_store(&self) {
        {
            let mut guard = self.room_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }

    /// Fan-out hub carrying room-scoped broadcast events.
    pub fn hub(&self) -> &RoomHub {
        &self.hub
    }

    /// Per-room serialization locks guarding read-modify-write sequences.
    pub fn room_locks(&self) -> &RoomLocks {
        &self.room_locks
    }

    /// Generator used to produce a room's shared quiz.
    pub fn question_source(&self) -> Arc<dyn QuestionSource> {
        self.question_source.clone()
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
