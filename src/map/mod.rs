//! Keeps a map widget's rendered markers in step with the marker collection.
//!
//! The widget itself is an external collaborator reached through [`MapBackend`]
//! and [`MapWidget`]. A widget is acquired by [`MapSyncController::initialize`]
//! and owned by a [`MapHandle`], which releases it exactly once: explicitly via
//! [`MapSyncController::teardown`] or implicitly when the handle is dropped.

#[cfg(feature = "tui")]
pub mod canvas;

use crate::model::{Coordinates, MapView, MarkerCollection, MarkerIcon, TileLayer};

/// Display region a map is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub &'static str);

impl std::fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Identity of one created widget; a new one is minted on every `create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(pub u64);

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("map could not be created on surface {0}")]
    Create(SurfaceId),
    #[error("marker {popup:?} at ({at}) could not be placed")]
    Placement { at: Coordinates, popup: String },
}

/// Factory for map widgets.
pub trait MapBackend {
    type Widget: MapWidget;

    fn create(
        &mut self,
        surface: SurfaceId,
        view: MapView,
        tiles: &TileLayer,
    ) -> Result<Self::Widget, MapError>;
}

/// A live map widget.
pub trait MapWidget {
    fn instance(&self) -> InstanceId;
    fn place_marker(
        &mut self,
        at: Coordinates,
        icon: MarkerIcon,
        popup: &str,
    ) -> Result<(), MapError>;
    fn clear_markers(&mut self);
    /// Free the widget's resources. Called exactly once per widget.
    fn release(&mut self);
}

/// Lifecycle of the map owned by a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapState {
    Uninitialized,
    Active,
    TornDown,
}

/// Owning handle to an active widget.
#[derive(Debug)]
pub struct MapHandle<W: MapWidget> {
    widget: Option<W>,
    surface: SurfaceId,
    synced_revision: Option<u64>,
    rendered: usize,
}

impl<W: MapWidget> MapHandle<W> {
    pub fn instance(&self) -> Option<InstanceId> {
        self.widget.as_ref().map(MapWidget::instance)
    }

    /// Number of markers placed by the last sync.
    pub fn rendered(&self) -> usize {
        self.rendered
    }

    pub fn synced_revision(&self) -> Option<u64> {
        self.synced_revision
    }

    pub fn widget(&self) -> Option<&W> {
        self.widget.as_ref()
    }

    pub fn widget_mut(&mut self) -> Option<&mut W> {
        self.widget.as_mut()
    }

    fn release(&mut self) {
        if let Some(mut w) = self.widget.take() {
            w.release();
            tracing::debug!(surface = %self.surface, instance = w.instance().0, "map released");
        }
    }
}

impl<W: MapWidget> Drop for MapHandle<W> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Fixed presentation shared by every sync: viewpoint, tiles and icon.
#[derive(Debug, Clone)]
pub struct MapSyncController {
    view: MapView,
    tiles: TileLayer,
    icon: MarkerIcon,
}

impl MapSyncController {
    pub fn new(view: MapView, tiles: TileLayer, icon: MarkerIcon) -> Self {
        Self { view, tiles, icon }
    }

    /// Create a widget on `surface` at the default viewpoint with one tile layer.
    pub fn initialize<B: MapBackend>(
        &self,
        backend: &mut B,
        surface: SurfaceId,
    ) -> Result<MapHandle<B::Widget>, MapError> {
        let widget = backend.create(surface, self.view, &self.tiles)?;
        tracing::debug!(surface = %surface, instance = widget.instance().0, "map initialized");
        Ok(MapHandle {
            widget: Some(widget),
            surface,
            synced_revision: None,
            rendered: 0,
        })
    }

    /// Replace every rendered marker with one per collection entry.
    pub fn sync<W: MapWidget>(
        &self,
        handle: &mut MapHandle<W>,
        collection: &MarkerCollection,
    ) -> Result<(), MapError> {
        let Some(widget) = handle.widget.as_mut() else {
            return Ok(());
        };
        widget.clear_markers();
        handle.rendered = 0;
        handle.synced_revision = None;
        for marker in collection {
            widget.place_marker(marker.coordinates, self.icon, &marker.name)?;
            handle.rendered += 1;
        }
        handle.synced_revision = Some(collection.revision());
        tracing::debug!(
            instance = widget.instance().0,
            markers = handle.rendered,
            revision = collection.revision(),
            "map synced"
        );
        Ok(())
    }

    /// Sync only if `collection` is a different value than the last one synced.
    pub fn sync_if_stale<W: MapWidget>(
        &self,
        handle: &mut MapHandle<W>,
        collection: &MarkerCollection,
    ) -> Result<bool, MapError> {
        if handle.synced_revision == Some(collection.revision()) {
            return Ok(false);
        }
        self.sync(handle, collection)?;
        Ok(true)
    }

    /// Release the widget. Consumes the handle so it cannot be synced again.
    pub fn teardown<W: MapWidget>(&self, mut handle: MapHandle<W>) {
        handle.release();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Everything the fake collaborator was asked to do, shared with the test.
    #[derive(Debug, Default)]
    pub struct Journal {
        pub created: Vec<(SurfaceId, InstanceId, MapView, String)>,
        pub released: Vec<InstanceId>,
        pub rendered: Vec<(InstanceId, Vec<(Coordinates, String)>)>,
    }

    impl Journal {
        pub fn markers_of(&self, id: InstanceId) -> &[(Coordinates, String)] {
            self.rendered
                .iter()
                .rev()
                .find(|(i, _)| *i == id)
                .map(|(_, m)| m.as_slice())
                .unwrap_or(&[])
        }
    }

    #[derive(Debug, Default)]
    pub struct FakeBackend {
        pub journal: Rc<RefCell<Journal>>,
        next: u64,
    }

    #[derive(Debug)]
    pub struct FakeWidget {
        id: InstanceId,
        journal: Rc<RefCell<Journal>>,
        markers: Vec<(Coordinates, String)>,
        released: bool,
    }

    impl FakeWidget {
        fn publish(&self) {
            let mut j = self.journal.borrow_mut();
            j.rendered.push((self.id, self.markers.clone()));
        }
    }

    impl MapBackend for FakeBackend {
        type Widget = FakeWidget;

        fn create(
            &mut self,
            surface: SurfaceId,
            view: MapView,
            tiles: &TileLayer,
        ) -> Result<FakeWidget, MapError> {
            self.next += 1;
            let id = InstanceId(self.next);
            self.journal
                .borrow_mut()
                .created
                .push((surface, id, view, tiles.url_template.clone()));
            Ok(FakeWidget {
                id,
                journal: Rc::clone(&self.journal),
                markers: Vec::new(),
                released: false,
            })
        }
    }

    impl MapWidget for FakeWidget {
        fn instance(&self) -> InstanceId {
            self.id
        }

        fn place_marker(
            &mut self,
            at: Coordinates,
            _icon: MarkerIcon,
            popup: &str,
        ) -> Result<(), MapError> {
            assert!(!self.released, "placing on a released map");
            self.markers.push((at, popup.to_string()));
            self.publish();
            Ok(())
        }

        fn clear_markers(&mut self) {
            assert!(!self.released, "clearing a released map");
            self.markers.clear();
            self.publish();
        }

        fn release(&mut self) {
            assert!(!self.released, "map released twice");
            self.released = true;
            self.journal.borrow_mut().released.push(self.id);
        }
    }
}
