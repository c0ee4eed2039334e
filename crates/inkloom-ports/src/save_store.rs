//! Save/load port (spec.md §4.8).

use async_trait::async_trait;
use inkloom_domain::SavePayload;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("no save found for slot {0}")]
    NotFound(String),
    #[error("save payload is corrupt: {0}")]
    Corrupt(String),
    #[error("save schema version {found} is incompatible with runtime version {current}")]
    IncompatibleVersion { found: u32, current: u32 },
    #[error("save store io error: {0}")]
    Io(String),
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SaveStorePort: Send + Sync {
    async fn save(&self, slot: &str, payload: &SavePayload) -> Result<(), SaveError>;
    async fn load(&self, slot: &str) -> Result<SavePayload, SaveError>;
    async fn list_slots(&self) -> Result<Vec<String>, SaveError>;
    async fn delete(&self, slot: &str) -> Result<(), SaveError>;
}
