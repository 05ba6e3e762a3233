pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;

use crate::dao::models::RoomEntity;
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for quiz rooms.
///
/// One document per room, keyed by the unique room code, loaded and saved
/// whole. Serialization of concurrent read-modify-write sequences is the
/// caller's responsibility (see the per-room lock registry in `state`).
pub trait RoomStore: Send + Sync {
    fn save_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_room(&self, code: String) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
