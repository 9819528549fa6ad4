//! In-memory map backend that records every call.
//!
//! Used by tests and the CLI to observe overlay and camera behaviour without
//! a rendering library. The backend and all widgets it creates share one
//! record, so assertions can be made after the widget has been handed to
//! [`MapSync`](super::MapSync).

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use super::error::MapError;
use super::widget::{
    Animation, CircleStyle, LatLng, LayerHandle, MapBackend, MapWidget, MarkerSpec, TileLayerSpec,
};

/// What a live layer is.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    Tile { url_template: String },
    Marker { position: LatLng, title: String },
    Circle { center: LatLng, radius_m: f64 },
}

/// A recorded camera operation.
#[derive(Debug, Clone, PartialEq)]
pub enum CameraOp {
    SetView { position: LatLng, zoom: u8 },
    PanTo { position: LatLng },
    ZoomIn,
    ZoomOut,
}

#[derive(Debug, Default)]
struct MapRecord {
    containers: HashSet<String>,
    failures_remaining: usize,
    create_attempts: usize,
    next_handle: u64,
    layers: BTreeMap<LayerHandle, LayerKind>,
    removed: Vec<LayerHandle>,
    camera: Vec<CameraOp>,
    invalidations: usize,
    map_removed: bool,
}

/// Recording [`MapBackend`].
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    record: Arc<Mutex<MapRecord>>,
}

impl RecordingBackend {
    /// Backend with no containers: every create fails until one is added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend with one existing container.
    pub fn with_container(container_id: &str) -> Self {
        let backend = Self::new();
        backend.add_container(container_id);
        backend
    }

    /// Make a container appear, as when the view finishes laying out.
    pub fn add_container(&self, container_id: &str) {
        self.record.lock().containers.insert(container_id.to_string());
    }

    /// Fail the next `count` create attempts regardless of containers.
    pub fn fail_next_creates(&self, count: usize) {
        self.record.lock().failures_remaining = count;
    }

    pub fn create_attempts(&self) -> usize {
        self.record.lock().create_attempts
    }

    /// All layers currently on the map, in creation order.
    pub fn live_layers(&self) -> Vec<(LayerHandle, LayerKind)> {
        self.record
            .lock()
            .layers
            .iter()
            .map(|(h, k)| (*h, k.clone()))
            .collect()
    }

    pub fn markers(&self) -> Vec<(LayerHandle, LayerKind)> {
        self.filter_layers(|k| matches!(k, LayerKind::Marker { .. }))
    }

    pub fn circles(&self) -> Vec<(LayerHandle, LayerKind)> {
        self.filter_layers(|k| matches!(k, LayerKind::Circle { .. }))
    }

    pub fn tile_layers(&self) -> Vec<(LayerHandle, LayerKind)> {
        self.filter_layers(|k| matches!(k, LayerKind::Tile { .. }))
    }

    fn filter_layers(&self, pred: impl Fn(&LayerKind) -> bool) -> Vec<(LayerHandle, LayerKind)> {
        self.live_layers()
            .into_iter()
            .filter(|(_, k)| pred(k))
            .collect()
    }

    pub fn removed_layers(&self) -> Vec<LayerHandle> {
        self.record.lock().removed.clone()
    }

    pub fn camera_ops(&self) -> Vec<CameraOp> {
        self.record.lock().camera.clone()
    }

    pub fn invalidations(&self) -> usize {
        self.record.lock().invalidations
    }

    /// True once the map has been released.
    pub fn is_map_removed(&self) -> bool {
        self.record.lock().map_removed
    }
}

impl MapBackend for RecordingBackend {
    fn create_map(
        &self,
        container_id: &str,
        center: LatLng,
        zoom: u8,
    ) -> Result<Box<dyn MapWidget>, MapError> {
        let mut record = self.record.lock();
        record.create_attempts += 1;

        if record.failures_remaining > 0 {
            record.failures_remaining -= 1;
            return Err(MapError::ContainerNotFound(container_id.to_string()));
        }
        if !record.containers.contains(container_id) {
            return Err(MapError::ContainerNotFound(container_id.to_string()));
        }

        record.map_removed = false;
        record.camera.push(CameraOp::SetView {
            position: center,
            zoom,
        });

        Ok(Box::new(RecordingWidget {
            record: Arc::clone(&self.record),
        }))
    }
}

struct RecordingWidget {
    record: Arc<Mutex<MapRecord>>,
}

impl RecordingWidget {
    fn add(&mut self, kind: LayerKind) -> LayerHandle {
        let mut record = self.record.lock();
        record.next_handle += 1;
        let handle = LayerHandle(record.next_handle);
        record.layers.insert(handle, kind);
        handle
    }
}

impl MapWidget for RecordingWidget {
    fn add_tile_layer(&mut self, spec: &TileLayerSpec) -> LayerHandle {
        self.add(LayerKind::Tile {
            url_template: spec.url_template.clone(),
        })
    }

    fn add_marker(&mut self, position: LatLng, marker: &MarkerSpec) -> LayerHandle {
        self.add(LayerKind::Marker {
            position,
            title: marker.title.clone(),
        })
    }

    fn add_circle(&mut self, position: LatLng, radius_m: f64, _style: &CircleStyle) -> LayerHandle {
        self.add(LayerKind::Circle {
            center: position,
            radius_m,
        })
    }

    fn remove_layer(&mut self, handle: LayerHandle) {
        let mut record = self.record.lock();
        if record.layers.remove(&handle).is_some() {
            record.removed.push(handle);
        }
    }

    fn set_view(&mut self, position: LatLng, zoom: u8, _animation: Animation) {
        self.record
            .lock()
            .camera
            .push(CameraOp::SetView { position, zoom });
    }

    fn pan_to(&mut self, position: LatLng, _animation: Animation) {
        self.record.lock().camera.push(CameraOp::PanTo { position });
    }

    fn zoom_in(&mut self) {
        self.record.lock().camera.push(CameraOp::ZoomIn);
    }

    fn zoom_out(&mut self) {
        self.record.lock().camera.push(CameraOp::ZoomOut);
    }

    fn invalidate_size(&mut self) {
        self.record.lock().invalidations += 1;
    }

    fn remove(&mut self) {
        let mut record = self.record.lock();
        record.layers.clear();
        record.map_removed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_container() {
        let backend = RecordingBackend::new();
        let result = backend.create_map("map", LatLng::new(0.0, 0.0), 13);
        assert!(matches!(result, Err(MapError::ContainerNotFound(id)) if id == "map"));

        backend.add_container("map");
        assert!(backend.create_map("map", LatLng::new(0.0, 0.0), 13).is_ok());
        assert_eq!(backend.create_attempts(), 2);
    }

    #[test]
    fn test_scripted_failures() {
        let backend = RecordingBackend::with_container("map");
        backend.fail_next_creates(1);
        assert!(backend.create_map("map", LatLng::new(0.0, 0.0), 13).is_err());
        assert!(backend.create_map("map", LatLng::new(0.0, 0.0), 13).is_ok());
    }

    #[test]
    fn test_layers_are_tracked() {
        let backend = RecordingBackend::with_container("map");
        let mut widget = backend
            .create_map("map", LatLng::new(0.0, 0.0), 13)
            .unwrap();

        let circle = widget.add_circle(
            LatLng::new(1.0, 2.0),
            5.0,
            &crate::map::layers::accuracy_circle_style(),
        );
        assert_eq!(backend.circles().len(), 1);

        widget.remove_layer(circle);
        widget.remove_layer(circle);
        assert!(backend.circles().is_empty());
        assert_eq!(backend.removed_layers(), vec![circle]);
    }
}
