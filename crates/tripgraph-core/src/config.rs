//! Compiled-in settings for the load. There are no flags and no environment overrides.

use std::fmt;
use std::path::PathBuf;

use crate::retry::RetryPolicy;

pub const SOURCE_PATH: &str = "/cse511/yellow_tripdata_2022-03.parquet";
pub const STORE_URI: &str = "neo4j://localhost:7687";
pub const STORE_USER: &str = "neo4j";
pub const STORE_PASSWORD: &str = "project1phase1";

#[derive(Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            uri: STORE_URI.to_string(),
            user: STORE_USER.to_string(),
            password: STORE_PASSWORD.to_string(),
        }
    }
}

impl fmt::Debug for StoreSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSettings")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    pub source_path: PathBuf,
    pub store: StoreSettings,
    pub retry: RetryPolicy,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from(SOURCE_PATH),
            store: StoreSettings::default(),
            retry: RetryPolicy::default(),
        }
    }
}
