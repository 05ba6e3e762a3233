mod connection;
mod error;
mod models;
pub mod config;
pub mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoRoomStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        let message = err.to_string();
        match err {
            // Connectivity-level failures: the backend is effectively gone.
            MongoDaoError::InvalidUri { .. }
            | MongoDaoError::ClientConstruction { .. }
            | MongoDaoError::InitialPing { .. }
            | MongoDaoError::HealthPing { .. }
            | MongoDaoError::MissingEnvVar { .. } => StorageError::unavailable(message, err),
            // The backend answered but the request itself failed.
            MongoDaoError::EnsureIndex { .. }
            | MongoDaoError::SaveRoom { .. }
            | MongoDaoError::LoadRoom { .. } => StorageError::operation(message, err),
        }
    }
}
