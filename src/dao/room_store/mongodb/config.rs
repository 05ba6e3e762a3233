use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

const DEFAULT_DB: &str = "brainbuzz";
const URI_ENV: &str = "MONGO_URI";
const DB_ENV: &str = "MONGO_DB";

/// Connection settings for the MongoDB room store.
#[derive(Clone)]
pub struct MongoConfig {
    pub options: ClientOptions,
    pub database_name: String,
}

impl MongoConfig {
    /// Build a configuration from a connection URI, defaulting the database
    /// name when none is given.
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let options =
            ClientOptions::parse(uri)
                .await
                .map_err(|source| MongoDaoError::InvalidUri {
                    uri: uri.to_owned(),
                    source,
                })?;

        Ok(Self {
            options,
            database_name: db_name.unwrap_or(DEFAULT_DB).to_owned(),
        })
    }

    /// Build a configuration from `MONGO_URI` (required) and `MONGO_DB`
    /// (optional).
    pub async fn from_env() -> MongoResult<Self> {
        let uri =
            std::env::var(URI_ENV).map_err(|_| MongoDaoError::MissingEnvVar { var: URI_ENV })?;
        let db = std::env::var(DB_ENV).ok();
        Self::from_uri(&uri, db.as_deref()).await
    }
}
