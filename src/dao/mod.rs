/// Entities shared between the domain and the storage backends.
pub mod models;
/// Room store trait and its backends.
pub mod room_store;
/// Backend-agnostic storage errors.
pub mod storage;
