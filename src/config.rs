use std::time::Duration;

use log::{error, info};
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::store::{MemoryRepository, MongoRepository, PollStore, StoreSettings};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // secrets
    jwt_secret: String,
}

impl Config {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
        }
    }

    /// Secret key used to verify identity JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the other fairings and control over error
/// messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Where polls are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Mongodb,
}

fn default_backend() -> StoreBackend {
    StoreBackend::Memory
}

fn default_db_name() -> String {
    "polls".to_string()
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_read_attempts() -> u32 {
    3
}

/// Configuration for poll storage.
#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    // non-secrets
    #[serde(default = "default_backend")]
    store_backend: StoreBackend,
    #[serde(default = "default_db_name")]
    db_name: String,
    #[serde(default = "default_timeout_ms")]
    store_timeout_ms: u64,
    #[serde(default = "default_read_attempts")]
    store_read_attempts: u32,
    // secrets
    #[serde(default)]
    db_uri: Option<String>,
}

impl StoreConfig {
    pub fn settings(&self) -> StoreSettings {
        StoreSettings {
            timeout: Duration::from_millis(self.store_timeout_ms),
            read_attempts: self.store_read_attempts,
        }
    }
}

/// A fairing that loads the storage config, connects to the configured
/// backend, and places a [`PollStore`] into managed state.
///
/// If a `PollStore` is already managed, it is left alone.
pub struct StoreFairing;

#[rocket::async_trait]
impl Fairing for StoreFairing {
    fn info(&self) -> Info {
        Info {
            name: "Poll store",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        if rocket.state::<PollStore>().is_some() {
            return Ok(rocket);
        }

        // Load the config.
        let config = match rocket.figment().extract::<StoreConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load store config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        let store = match config.store_backend {
            StoreBackend::Memory => {
                info!("Using in-memory poll store; polls will not survive a restart");
                PollStore::new(MemoryRepository::new(), config.settings())
            }
            StoreBackend::Mongodb => {
                let Some(db_uri) = config.db_uri.as_deref() else {
                    error!("`db_uri` must be set when `store_backend` is \"mongodb\"");
                    return Err(rocket);
                };
                info!("Loaded database config, connecting...");
                match MongoRepository::connect(db_uri, &config.db_name).await {
                    Ok(repository) => {
                        info!("...database connection online!");
                        PollStore::new(repository, config.settings())
                    }
                    Err(e) => {
                        error!("Failed to connect to database: {e}");
                        return Err(rocket);
                    }
                }
            }
        };

        // Manage the state.
        rocket = rocket.manage(store);
        Ok(rocket)
    }
}

#[cfg(test)]
mod tests {
    use rocket::figment::{providers::Serialized, Figment};

    use super::*;

    #[test]
    fn store_defaults() {
        let config: StoreConfig = Figment::new().extract().unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.db_name, "polls");
        assert_eq!(config.db_uri, None);
        assert_eq!(
            config.settings(),
            StoreSettings {
                timeout: Duration::from_millis(2000),
                read_attempts: 3,
            }
        );
    }

    #[test]
    fn store_overrides() {
        let config: StoreConfig = Figment::new()
            .merge(Serialized::default("store_backend", "mongodb"))
            .merge(Serialized::default("db_uri", "mongodb://db:27017"))
            .merge(Serialized::default("store_timeout_ms", 250))
            .extract()
            .unwrap();
        assert_eq!(config.store_backend, StoreBackend::Mongodb);
        assert_eq!(config.db_uri.as_deref(), Some("mongodb://db:27017"));
        assert_eq!(config.settings().timeout, Duration::from_millis(250));
    }

    #[test]
    fn jwt_secret_is_required() {
        assert!(Figment::new().extract::<Config>().is_err());
        let config: Config = Figment::new()
            .merge(Serialized::default("jwt_secret", "s3cret"))
            .extract()
            .unwrap();
        assert_eq!(config.jwt_secret(), b"s3cret");
    }
}
