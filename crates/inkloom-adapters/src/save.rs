//! File-backed save store, one JSON file per slot. Writes go to a
//! temp file in the same directory and are renamed into place so a
//! crash mid-write never leaves a half-written save behind — the same
//! atomic write-then-rename idiom the teacher's file storage adapter
//! builds on top of `tokio::fs`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use inkloom_domain::SavePayload;
use inkloom_ports::{SaveError, SaveStorePort};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

pub struct FileSaveStore {
    root: PathBuf,
}

impl FileSaveStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.root.join(format!("{slot}.json"))
    }
}

#[async_trait]
impl SaveStorePort for FileSaveStore {
    async fn save(&self, slot: &str, payload: &SavePayload) -> Result<(), SaveError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| SaveError::Io(e.to_string()))?;

        let json = serde_json::to_vec_pretty(payload)
            .map_err(|e| SaveError::Corrupt(e.to_string()))?;

        let tmp_path = self.root.join(format!(".{}.tmp", Uuid::new_v4()));
        let mut tmp = fs::File::create(&tmp_path)
            .await
            .map_err(|e| SaveError::Io(e.to_string()))?;
        tmp.write_all(&json)
            .await
            .map_err(|e| SaveError::Io(e.to_string()))?;
        tmp.sync_all().await.map_err(|e| {
            tracing::warn!(slot, error = %e, "fsync of save temp file failed");
            SaveError::Io(e.to_string())
        })?;
        drop(tmp);

        fs::rename(&tmp_path, self.slot_path(slot))
            .await
            .map_err(|e| SaveError::Io(e.to_string()))?;
        Ok(())
    }

    /// Returns the raw payload regardless of `schema_version` — version
    /// compatibility is a policy decision for the caller (spec.md §4.8's
    /// `onIncompatible`), not something the storage layer should veto.
    /// See `inkloom_engine::save_load::load_save`.
    async fn load(&self, slot: &str) -> Result<SavePayload, SaveError> {
        let path = self.slot_path(slot);
        if !path.exists() {
            return Err(SaveError::NotFound(slot.to_string()));
        }
        let bytes = fs::read(&path).await.map_err(|e| SaveError::Io(e.to_string()))?;
        let payload: SavePayload =
            serde_json::from_slice(&bytes).map_err(|e| SaveError::Corrupt(e.to_string()))?;
        Ok(payload)
    }

    async fn list_slots(&self) -> Result<Vec<String>, SaveError> {
        if !Path::new(&self.root).exists() {
            return Ok(Vec::new());
        }
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| SaveError::Io(e.to_string()))?;
        let mut slots = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SaveError::Io(e.to_string()))?
        {
            if let Some(name) = entry.path().file_stem().and_then(|s| s.to_str()) {
                if entry.path().extension().and_then(|e| e.to_str()) == Some("json") {
                    slots.push(name.to_string());
                }
            }
        }
        slots.sort();
        Ok(slots)
    }

    async fn delete(&self, slot: &str) -> Result<(), SaveError> {
        let path = self.slot_path(slot);
        if !path.exists() {
            return Err(SaveError::NotFound(slot.to_string()));
        }
        fs::remove_file(&path).await.map_err(|e| SaveError::Io(e.to_string()))
    }
}
