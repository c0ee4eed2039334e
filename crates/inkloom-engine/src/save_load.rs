//! Save/Load coordination (spec.md §4.8): wraps a bare `SaveStorePort`
//! with the `loadSave(id, {expected_schema_version, onIncompatible})`
//! contract. The port itself only knows how to read/write a slot raw;
//! deciding what to *do* about a `schema_version` mismatch (accept the
//! stale save, migrate it, or roll back) is a policy call the caller
//! supplies, so it lives here rather than in the adapter.

use inkloom_domain::SavePayload;
use inkloom_ports::{SaveError, SaveStorePort};

/// What `load_save` did with a loaded save, so the orchestrator can
/// react (e.g. fire `on_rollback` per spec.md §4.8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Schema version matched; no policy was consulted.
    Compatible(SavePayload),
    /// `onIncompatible` chose to accept the mismatched payload as-is.
    Accepted(SavePayload),
    /// `onIncompatible` chose to migrate; the migrated payload is
    /// returned, already re-validated against `expected_schema_version`.
    Migrated(SavePayload),
    /// `onIncompatible` chose to roll back; no payload is usable and
    /// the caller must restore the pre-branch checkpoint instead.
    RolledBack,
}

impl LoadOutcome {
    pub fn payload(&self) -> Option<&SavePayload> {
        match self {
            LoadOutcome::Compatible(p) | LoadOutcome::Accepted(p) | LoadOutcome::Migrated(p) => Some(p),
            LoadOutcome::RolledBack => None,
        }
    }
}

/// `onIncompatible`'s decision, plus (for `Migrate`) the migrated
/// payload it is the caller's responsibility to produce.
pub enum IncompatibleDecision {
    Accept,
    Migrate(SavePayload),
    Rollback,
}

/// Load `slot` from `store`, consulting `on_incompatible` whenever the
/// stored `schema_version` doesn't match `expected_schema_version`
/// (spec.md §4.8, §3: "loader refuses lower-or-differing majors without
/// migration").
pub async fn load_save(
    store: &dyn SaveStorePort,
    slot: &str,
    expected_schema_version: u32,
    on_incompatible: impl FnOnce(u32, u32) -> IncompatibleDecision,
) -> Result<LoadOutcome, SaveError> {
    let payload = store.load(slot).await?;

    if payload.is_compatible(expected_schema_version) {
        return Ok(LoadOutcome::Compatible(payload));
    }

    match on_incompatible(payload.schema_version, expected_schema_version) {
        IncompatibleDecision::Accept => Ok(LoadOutcome::Accepted(payload)),
        IncompatibleDecision::Migrate(migrated) => {
            if migrated.is_compatible(expected_schema_version) {
                Ok(LoadOutcome::Migrated(migrated))
            } else {
                Err(SaveError::IncompatibleVersion {
                    found: migrated.schema_version,
                    current: expected_schema_version,
                })
            }
        }
        IncompatibleDecision::Rollback => Ok(LoadOutcome::RolledBack),
    }
}
