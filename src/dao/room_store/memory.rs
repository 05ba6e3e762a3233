use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;

use crate::dao::{models::RoomEntity, room_store::RoomStore, storage::StorageResult};

/// In-process room store backed by a concurrent map.
///
/// Used for local runs without a database and as the fixture for service
/// tests. Semantics match the document stores: whole-document save and load
/// keyed by room code, no transactional isolation.
#[derive(Clone, Default)]
pub struct InMemoryRoomStore {
    rooms: Arc<DashMap<String, RoomEntity>>,
}

impl InMemoryRoomStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rooms currently held.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether the store holds no rooms.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl RoomStore for InMemoryRoomStore {
    fn save_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<()>> {
        let rooms = self.rooms.clone();
        Box::pin(async move {
            rooms.insert(room.code.clone(), room);
            Ok(())
        })
    }

    fn find_room(&self, code: String) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let rooms = self.rooms.clone();
        Box::pin(async move { Ok(rooms.get(&code).map(|entry| entry.value().clone())) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
