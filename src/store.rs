//! Canonical marker collection and its persisted snapshot.
//!
//! The store hydrates exactly once when opened: the persisted snapshot if it is
//! readable and well formed, otherwise the default collection. After that the
//! in-memory collection is only replaced by [`MarkerStore::append`], which writes
//! the full collection back under a single key (last write wins).

use crate::model::{InvalidCollection, Marker, MarkerCollection};
use crate::storage::{LocalStorage, StorageError};
use anyhow::{Context, Result};
use std::path::Path;

pub const DEFAULT_STORAGE_KEY: &str = "markers";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("persisted markers are not valid JSON")]
    MalformedPersistedData(#[source] serde_json::Error),
    #[error("persisted markers are invalid")]
    InvalidPersistedData(#[source] InvalidCollection),
    #[error("marker refused")]
    InvalidMarker(#[source] InvalidCollection),
    #[error("local storage is unavailable")]
    StorageUnavailable(#[source] StorageError),
    #[error("could not encode markers")]
    Encode(#[source] serde_json::Error),
    #[error("could not save markers, changes are kept for this session only")]
    PersistenceWriteFailure(#[source] StorageError),
}

/// Built-in seed used when nothing usable is persisted.
pub fn default_markers() -> MarkerCollection {
    let markers = vec![
        Marker::new("Аквапарк \"H2O\"", 47.262937, 39.720160),
        Marker::new("Дворец Спорта", 47.2279755, 39.69648834425441),
        Marker::new("ЦУМ", 47.219958, 39.708148),
        Marker::new("Драм театр им. М. Горького", 47.228472, 39.744741),
        Marker::new("Пригородный автовокзал", 47.241706, 39.763789),
    ];
    MarkerCollection::from_trusted(markers)
}

/// Read a seed collection in the storage format from a file.
pub fn load_seed_file(path: &Path) -> Result<MarkerCollection> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read seed file {}", path.display()))?;
    let collection = decode(&raw).with_context(|| format!("parse seed file {}", path.display()))?;
    Ok(collection)
}

fn decode(raw: &str) -> Result<MarkerCollection, StoreError> {
    let markers: Vec<Marker> =
        serde_json::from_str(raw).map_err(StoreError::MalformedPersistedData)?;
    MarkerCollection::from_markers(markers).map_err(StoreError::InvalidPersistedData)
}

pub struct MarkerStore<S> {
    storage: S,
    key: String,
    defaults: MarkerCollection,
    current: MarkerCollection,
}

impl<S: LocalStorage> MarkerStore<S> {
    /// Open the store and hydrate the current collection.
    pub fn open(storage: S, key: impl Into<String>, defaults: MarkerCollection) -> Self {
        let mut store = Self {
            storage,
            key: key.into(),
            current: defaults.clone(),
            defaults,
        };
        store.current = store.load();
        tracing::info!(
            key = %store.key,
            markers = store.current.len(),
            "marker store hydrated"
        );
        store
    }

    /// Read the persisted snapshot without falling back.
    ///
    /// `Ok(None)` means nothing was ever persisted under the key.
    pub fn try_load(&self) -> Result<Option<MarkerCollection>, StoreError> {
        let raw = self
            .storage
            .get(&self.key)
            .map_err(StoreError::StorageUnavailable)?;
        raw.map(|raw| decode(&raw)).transpose()
    }

    /// Persisted snapshot, or the defaults if it is absent, malformed or unreadable.
    pub fn load(&self) -> MarkerCollection {
        match self.try_load() {
            Ok(Some(collection)) => collection,
            Ok(None) => {
                tracing::debug!(key = %self.key, "no persisted markers, using defaults");
                self.defaults.clone()
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %format_chain(&e), "falling back to default markers");
                self.defaults.clone()
            }
        }
    }

    /// Overwrite the snapshot with the full `collection`.
    pub fn persist(&mut self, collection: &MarkerCollection) -> Result<(), StoreError> {
        let json = serde_json::to_string(collection).map_err(StoreError::Encode)?;
        self.storage
            .set(&self.key, &json)
            .map_err(StoreError::PersistenceWriteFailure)?;
        tracing::debug!(key = %self.key, markers = collection.len(), "markers persisted");
        Ok(())
    }

    /// Append `marker` and persist the resulting collection.
    ///
    /// A malformed marker is refused and nothing changes. Otherwise the in-memory
    /// collection is replaced even when the write fails; that error only reports
    /// that the change will not survive a restart.
    pub fn append(&mut self, marker: Marker) -> Result<(), StoreError> {
        let next = self
            .current
            .appended(marker)
            .map_err(StoreError::InvalidMarker)?;
        let persisted = self.persist(&next);
        self.current = next;
        if let Err(e) = &persisted {
            tracing::warn!(key = %self.key, error = %format_chain(e), "marker kept in memory only");
        }
        persisted
    }

    pub fn collection(&self) -> &MarkerCollection {
        &self.current
    }

    #[cfg(test)]
    pub fn storage(&self) -> &S {
        &self.storage
    }
}

/// `error: cause: cause` rendering for log fields and notices.
pub fn format_chain(e: &dyn std::error::Error) -> String {
    let mut out = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        out.push_str(": ");
        out.push_str(&s.to_string());
        source = s.source();
    }
    out
}
