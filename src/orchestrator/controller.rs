//! View lifecycle controller.
//!
//! Owns the marker store and the map for one view: mount hydrates-then-renders,
//! submissions append-then-resync, unmount releases the map.

use super::submission::{process_submission, ProcessedSubmission};
use crate::map::{
    MapBackend, MapError, MapHandle, MapState, MapSyncController, MapWidget, SurfaceId,
};
use crate::model::{MarkerCollection, Submission};
use crate::storage::LocalStorage;
use crate::store::MarkerStore;
use crate::validate::CoordinatePolicy;

/// Commands emitted by UI layers.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum UiCommand {
    OpenForm,
    CloseForm,
    Submit(Submission),
}

enum MapSlot<W: MapWidget> {
    Uninitialized,
    Active(MapHandle<W>),
    TornDown,
}

pub(crate) struct ViewController<S: LocalStorage, B: MapBackend> {
    store: MarkerStore<S>,
    maps: MapSyncController,
    backend: B,
    map: MapSlot<B::Widget>,
    policy: CoordinatePolicy,
    form_open: bool,
}

impl<S: LocalStorage, B: MapBackend> ViewController<S, B> {
    /// `store` must already be hydrated; the map is created by [`Self::mount`].
    pub fn new(
        store: MarkerStore<S>,
        maps: MapSyncController,
        backend: B,
        policy: CoordinatePolicy,
    ) -> Self {
        Self {
            store,
            maps,
            backend,
            map: MapSlot::Uninitialized,
            policy,
            form_open: false,
        }
    }

    /// Create the map on `surface` and render the current collection.
    pub fn mount(&mut self, surface: SurfaceId) -> Result<(), MapError> {
        if let MapSlot::Active(_) = self.map {
            return Ok(());
        }
        let mut handle = self.maps.initialize(&mut self.backend, surface)?;
        self.maps.sync(&mut handle, self.store.collection())?;
        self.map = MapSlot::Active(handle);
        Ok(())
    }

    /// Release the map. Further syncs are no-ops until the next mount.
    pub fn unmount(&mut self) {
        if let MapSlot::Active(handle) = std::mem::replace(&mut self.map, MapSlot::TornDown) {
            self.maps.teardown(handle);
        }
    }

    pub fn map_state(&self) -> MapState {
        match self.map {
            MapSlot::Uninitialized => MapState::Uninitialized,
            MapSlot::Active(_) => MapState::Active,
            MapSlot::TornDown => MapState::TornDown,
        }
    }

    pub fn map(&self) -> Option<&MapHandle<B::Widget>> {
        match &self.map {
            MapSlot::Active(h) => Some(h),
            _ => None,
        }
    }

    pub fn map_mut(&mut self) -> Option<&mut MapHandle<B::Widget>> {
        match &mut self.map {
            MapSlot::Active(h) => Some(h),
            _ => None,
        }
    }

    pub fn markers(&self) -> &MarkerCollection {
        self.store.collection()
    }

    pub fn form_open(&self) -> bool {
        self.form_open
    }

    /// Re-render the map if the collection changed since the last sync.
    pub fn refresh(&mut self) -> Result<bool, MapError> {
        match &mut self.map {
            MapSlot::Active(handle) => self.maps.sync_if_stale(handle, self.store.collection()),
            _ => Ok(false),
        }
    }

    /// Apply a UI command. Returns the processed submission for `Submit`.
    pub fn handle(&mut self, cmd: UiCommand) -> Option<ProcessedSubmission> {
        match cmd {
            UiCommand::OpenForm => {
                self.form_open = true;
                None
            }
            UiCommand::CloseForm => {
                self.form_open = false;
                None
            }
            UiCommand::Submit(submission) => Some(self.submit(&submission)),
        }
    }

    fn submit(&mut self, submission: &Submission) -> ProcessedSubmission {
        let processed = process_submission(&mut self.store, self.policy, submission);
        if processed.accepted() {
            self.form_open = false;
            if let Err(e) = self.refresh() {
                tracing::warn!(error = %e, "map sync after submission failed");
            }
        }
        processed
    }
}
