//! Map lifecycle, overlays and camera policy.
//!
//! # State Machine
//!
//! ```text
//!                 init ok
//! Uninitialized ──────────► Ready ──dispose──► Disposed
//!      │  ▲                   │                   ▲
//!      └──┘ init failed       └─ init: no-op      │
//!      └──────────────────dispose─────────────────┘
//! ```
//!
//! While `Ready`, the map carries exactly one base tile layer and either no
//! overlays or exactly one marker + accuracy circle pair. A redraw removes
//! the previous pair before adding the next one.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::error::MapError;
use super::layers::{accuracy_circle_style, position_marker, BaseLayer};
use super::widget::{Animation, LatLng, LayerHandle, MapBackend, MapWidget};
use crate::sample::PositionSample;

/// Configuration for [`MapSync`].
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    /// Container element the map is created in.
    pub container_id: String,
    /// Camera centre before the first fix.
    pub initial_center: LatLng,
    pub initial_zoom: u8,
    /// Zoom used when centring on a fix.
    pub focus_zoom: u8,
    /// Camera animation duration.
    pub animation: Duration,
    /// Delay before the single init retry.
    pub init_retry_delay: Duration,
    /// Delay before re-measuring the container after init.
    pub resize_delay: Duration,
    /// How many rendered fixes recentre the camera before it switches to panning.
    pub recenter_fix_count: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            container_id: "map".to_string(),
            initial_center: LatLng::new(-23.5505, -46.6333),
            initial_zoom: 13,
            focus_zoom: 16,
            animation: Duration::from_secs(1),
            init_retry_delay: Duration::from_millis(500),
            resize_delay: Duration::from_millis(500),
            recenter_fix_count: 1,
        }
    }
}

impl MapConfig {
    pub fn with_container_id(mut self, container_id: impl Into<String>) -> Self {
        self.container_id = container_id.into();
        self
    }

    pub fn with_recenter_fix_count(mut self, count: u32) -> Self {
        self.recenter_fix_count = count;
        self
    }

    pub fn with_init_retry_delay(mut self, delay: Duration) -> Self {
        self.init_retry_delay = delay;
        self
    }

    fn camera_animation(&self) -> Animation {
        Animation::smooth(self.animation)
    }
}

/// Lifecycle state of the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapStatus {
    Uninitialized,
    Ready,
    Disposed,
}

impl MapStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MapStatus::Uninitialized => "Uninitialized",
            MapStatus::Ready => "Ready",
            MapStatus::Disposed => "Disposed",
        }
    }
}

impl fmt::Display for MapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the camera followed the most recent fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    /// Recentred and zoomed onto the fix.
    CenteredOnFirstFix,
    /// Panned to the fix at the current zoom.
    Panning,
}

/// Camera move performed by a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMove {
    Recenter,
    Pan,
}

/// The marker and accuracy circle for one fix. Never exists half-built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayPair {
    pub marker: LayerHandle,
    pub circle: LayerHandle,
}

/// Observable map state owned by [`MapSync`].
#[derive(Debug, Clone, PartialEq)]
pub struct MapViewState {
    pub base_layer: BaseLayer,
    pub overlay: Option<OverlayPair>,
    pub last_render_at: Option<Instant>,
    pub camera_mode: Option<CameraMode>,
    pub renders: u64,
}

impl Default for MapViewState {
    fn default() -> Self {
        Self {
            base_layer: BaseLayer::Standard,
            overlay: None,
            last_render_at: None,
            camera_mode: None,
            renders: 0,
        }
    }
}

/// Owns the map widget and everything drawn on it.
pub struct MapSync {
    backend: Arc<dyn MapBackend>,
    config: MapConfig,
    status: MapStatus,
    widget: Option<Box<dyn MapWidget>>,
    base_handles: Vec<LayerHandle>,
    view: MapViewState,
}

impl fmt::Debug for MapSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapSync")
            .field("config", &self.config)
            .field("status", &self.status)
            .field("view", &self.view)
            .finish_non_exhaustive()
    }
}

impl MapSync {
    pub fn new(backend: Arc<dyn MapBackend>, config: MapConfig) -> Self {
        Self {
            backend,
            config,
            status: MapStatus::Uninitialized,
            widget: None,
            base_handles: Vec::new(),
            view: MapViewState::default(),
        }
    }

    pub fn status(&self) -> MapStatus {
        self.status
    }

    pub fn view(&self) -> &MapViewState {
        &self.view
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Create the map in the configured container.
    ///
    /// No-op when already `Ready`. On failure the state stays
    /// `Uninitialized` so the caller may retry.
    pub fn init(&mut self) -> Result<(), MapError> {
        match self.status {
            MapStatus::Ready => return Ok(()),
            MapStatus::Disposed => return Err(MapError::Disposed),
            MapStatus::Uninitialized => {}
        }

        let mut widget = self
            .backend
            .create_map(
                &self.config.container_id,
                self.config.initial_center,
                self.config.initial_zoom,
            )
            .map_err(|e| {
                tracing::warn!(container = %self.config.container_id, error = %e, "Map init failed");
                e
            })?;

        self.base_handles = vec![widget.add_tile_layer(&self.view.base_layer.tile_spec())];
        self.widget = Some(widget);
        self.status = MapStatus::Ready;

        tracing::info!(
            container = %self.config.container_id,
            base_layer = %self.view.base_layer,
            "Map initialised"
        );
        Ok(())
    }

    fn widget_mut(&mut self) -> Result<&mut Box<dyn MapWidget>, MapError> {
        ready_widget(self.status, &mut self.widget)
    }

    /// Draw `sample`, replacing the previous overlay pair, and move the camera.
    ///
    /// The first `recenter_fix_count` renders recentre on the fix; later
    /// renders pan.
    pub fn render(&mut self, sample: &PositionSample) -> Result<CameraMove, MapError> {
        let recenter = self.view.renders < u64::from(self.config.recenter_fix_count);
        let focus_zoom = self.config.focus_zoom;
        let animation = self.config.camera_animation();
        let widget = ready_widget(self.status, &mut self.widget)?;

        if let Some(pair) = self.view.overlay.take() {
            widget.remove_layer(pair.marker);
            widget.remove_layer(pair.circle);
        }

        let position = LatLng::from(sample.lat_lon());
        let marker = widget.add_marker(position, &position_marker(sample));
        let circle = widget.add_circle(position, sample.accuracy(), &accuracy_circle_style());

        let camera = if recenter {
            widget.set_view(position, focus_zoom, animation);
            CameraMove::Recenter
        } else {
            widget.pan_to(position, animation);
            CameraMove::Pan
        };
        widget.invalidate_size();

        self.view.overlay = Some(OverlayPair { marker, circle });
        self.view.renders += 1;
        self.view.last_render_at = Some(Instant::now());
        self.view.camera_mode = Some(match camera {
            CameraMove::Recenter => CameraMode::CenteredOnFirstFix,
            CameraMove::Pan => CameraMode::Panning,
        });

        tracing::debug!(
            position = %position,
            accuracy_m = sample.accuracy(),
            camera = ?camera,
            renders = self.view.renders,
            "Map rendered"
        );
        Ok(camera)
    }

    /// Swap the base tile layer.
    ///
    /// Removes every current base layer before adding the requested one.
    /// Before init the choice is remembered and applied by `init`.
    pub fn set_base_layer(&mut self, kind: BaseLayer) -> Result<(), MapError> {
        if self.status == MapStatus::Disposed {
            return Err(MapError::Disposed);
        }
        self.view.base_layer = kind;

        let widget = ready_widget(self.status, &mut self.widget)?;
        for handle in self.base_handles.drain(..) {
            widget.remove_layer(handle);
        }
        let handle = widget.add_tile_layer(&kind.tile_spec());
        self.base_handles.push(handle);

        tracing::debug!(base_layer = %kind, "Base layer switched");
        Ok(())
    }

    /// Recentre on `sample` at the focus zoom.
    pub fn center_on(&mut self, sample: &PositionSample) -> Result<(), MapError> {
        let zoom = self.config.focus_zoom;
        let animation = self.config.camera_animation();
        self.widget_mut()?
            .set_view(LatLng::from(sample.lat_lon()), zoom, animation);
        Ok(())
    }

    pub fn zoom_in(&mut self) -> Result<(), MapError> {
        self.widget_mut()?.zoom_in();
        Ok(())
    }

    pub fn zoom_out(&mut self) -> Result<(), MapError> {
        self.widget_mut()?.zoom_out();
        Ok(())
    }

    /// Re-measure the container.
    pub fn refresh_layout(&mut self) -> Result<(), MapError> {
        self.widget_mut()?.invalidate_size();
        Ok(())
    }

    /// Release the map. Idempotent.
    pub fn dispose(&mut self) {
        if self.status == MapStatus::Disposed {
            return;
        }
        if let Some(mut widget) = self.widget.take() {
            widget.remove();
        }
        self.view.overlay = None;
        self.base_handles.clear();
        self.status = MapStatus::Disposed;
        tracing::info!("Map disposed");
    }
}

fn ready_widget(
    status: MapStatus,
    widget: &mut Option<Box<dyn MapWidget>>,
) -> Result<&mut Box<dyn MapWidget>, MapError> {
    match status {
        MapStatus::Uninitialized => Err(MapError::NotReady),
        MapStatus::Disposed => Err(MapError::Disposed),
        MapStatus::Ready => widget.as_mut().ok_or(MapError::NotReady),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::recording::{CameraOp, LayerKind, RecordingBackend};

    fn ready_map() -> (RecordingBackend, MapSync) {
        let backend = RecordingBackend::with_container("map");
        let mut map = MapSync::new(Arc::new(backend.clone()), MapConfig::default());
        map.init().unwrap();
        (backend, map)
    }

    fn sample(lat: f64, lon: f64, accuracy: f64) -> PositionSample {
        PositionSample::new(lat, lon, accuracy, 0).unwrap()
    }

    #[test]
    fn test_init_failure_stays_uninitialized() {
        let backend = RecordingBackend::new();
        let mut map = MapSync::new(Arc::new(backend.clone()), MapConfig::default());

        assert_eq!(
            map.init(),
            Err(MapError::ContainerNotFound("map".to_string()))
        );
        assert_eq!(map.status(), MapStatus::Uninitialized);

        backend.add_container("map");
        assert!(map.init().is_ok());
        assert_eq!(map.status(), MapStatus::Ready);
        assert_eq!(backend.tile_layers().len(), 1);
    }

    #[test]
    fn test_init_is_idempotent() {
        let (backend, mut map) = ready_map();
        map.init().unwrap();
        assert_eq!(backend.create_attempts(), 1);
        assert_eq!(backend.tile_layers().len(), 1);
    }

    #[test]
    fn test_render_before_init_fails() {
        let backend = RecordingBackend::with_container("map");
        let mut map = MapSync::new(Arc::new(backend), MapConfig::default());
        assert_eq!(
            map.render(&sample(1.0, 2.0, 3.0)),
            Err(MapError::NotReady)
        );
        assert_eq!(map.view().renders, 0);
    }

    #[test]
    fn test_render_keeps_single_overlay_pair() {
        let (backend, mut map) = ready_map();

        map.render(&sample(10.0, 20.0, 5.0)).unwrap();
        let first = map.view().overlay.unwrap();
        map.render(&sample(10.001, 20.001, 7.0)).unwrap();
        let second = map.view().overlay.unwrap();

        assert_eq!(backend.markers().len(), 1);
        assert_eq!(backend.circles().len(), 1);
        assert_ne!(first, second);
        assert!(backend.removed_layers().contains(&first.marker));
        assert!(backend.removed_layers().contains(&first.circle));

        let circles = backend.circles();
        assert!(matches!(
            &circles[0].1,
            LayerKind::Circle { radius_m, .. } if *radius_m == 7.0
        ));
    }

    #[test]
    fn test_camera_recenters_then_pans() {
        let (backend, mut map) = ready_map();

        assert_eq!(map.render(&sample(10.0, 20.0, 5.0)), Ok(CameraMove::Recenter));
        assert_eq!(map.view().camera_mode, Some(CameraMode::CenteredOnFirstFix));
        assert_eq!(map.render(&sample(10.001, 20.001, 5.0)), Ok(CameraMove::Pan));
        assert_eq!(map.view().camera_mode, Some(CameraMode::Panning));

        let ops = backend.camera_ops();
        assert_eq!(
            ops[ops.len() - 2],
            CameraOp::SetView {
                position: LatLng::new(10.0, 20.0),
                zoom: 16
            }
        );
        assert_eq!(
            ops[ops.len() - 1],
            CameraOp::PanTo {
                position: LatLng::new(10.001, 20.001)
            }
        );
    }

    #[test]
    fn test_recenter_count_is_configurable() {
        let backend = RecordingBackend::with_container("map");
        let config = MapConfig::default().with_recenter_fix_count(2);
        let mut map = MapSync::new(Arc::new(backend), config);
        map.init().unwrap();

        assert_eq!(map.render(&sample(1.0, 1.0, 1.0)), Ok(CameraMove::Recenter));
        assert_eq!(map.render(&sample(1.0, 1.0, 1.0)), Ok(CameraMove::Recenter));
        assert_eq!(map.render(&sample(1.0, 1.0, 1.0)), Ok(CameraMove::Pan));
    }

    #[test]
    fn test_set_base_layer_replaces_tiles() {
        let (backend, mut map) = ready_map();

        map.set_base_layer(BaseLayer::Satellite).unwrap();
        let tiles = backend.tile_layers();
        assert_eq!(tiles.len(), 1);
        assert!(matches!(
            &tiles[0].1,
            LayerKind::Tile { url_template } if url_template.contains("lyrs=s")
        ));
        assert_eq!(map.view().base_layer, BaseLayer::Satellite);
    }

    #[test]
    fn test_base_layer_choice_before_init_is_applied() {
        let backend = RecordingBackend::with_container("map");
        let mut map = MapSync::new(Arc::new(backend.clone()), MapConfig::default());

        assert_eq!(map.set_base_layer(BaseLayer::Satellite), Err(MapError::NotReady));
        map.init().unwrap();

        let tiles = backend.tile_layers();
        assert_eq!(tiles.len(), 1);
        assert!(matches!(
            &tiles[0].1,
            LayerKind::Tile { url_template } if url_template.contains("google")
        ));
    }

    #[test]
    fn test_dispose_blocks_further_use() {
        let (backend, mut map) = ready_map();
        map.render(&sample(1.0, 2.0, 3.0)).unwrap();

        map.dispose();
        map.dispose();

        assert!(backend.is_map_removed());
        assert_eq!(map.status(), MapStatus::Disposed);
        assert_eq!(map.render(&sample(1.0, 2.0, 3.0)), Err(MapError::Disposed));
        assert_eq!(map.set_base_layer(BaseLayer::Satellite), Err(MapError::Disposed));
        assert_eq!(map.init(), Err(MapError::Disposed));
        assert!(map.view().overlay.is_none());
    }

    #[test]
    fn test_zoom_and_center() {
        let (backend, mut map) = ready_map();
        map.zoom_in().unwrap();
        map.zoom_out().unwrap();
        map.center_on(&sample(5.0, 6.0, 1.0)).unwrap();

        let ops = backend.camera_ops();
        let expected = vec![
            CameraOp::ZoomIn,
            CameraOp::ZoomOut,
            CameraOp::SetView {
                position: LatLng::new(5.0, 6.0),
                zoom: 16,
            },
        ];
        assert_eq!(ops[ops.len() - 3..].to_vec(), expected);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn fix_strategy() -> impl Strategy<Value = PositionSample> {
            (-90.0..=90.0_f64, -180.0..=180.0_f64, 0.0..5000.0_f64)
                .prop_map(|(lat, lon, acc)| PositionSample::new(lat, lon, acc, 0).unwrap())
        }

        proptest! {
            #[test]
            fn test_single_overlay_pair(fixes in prop::collection::vec(fix_strategy(), 1..20)) {
                let (backend, mut map) = ready_map();
                let mut previous: Vec<OverlayPair> = Vec::new();

                for fix in &fixes {
                    map.render(fix).unwrap();
                    let pair = map.view().overlay.unwrap();

                    prop_assert_eq!(backend.markers().len(), 1);
                    prop_assert_eq!(backend.circles().len(), 1);
                    prop_assert_eq!(backend.markers()[0].0, pair.marker);
                    prop_assert_eq!(backend.circles()[0].0, pair.circle);
                    for old in &previous {
                        prop_assert!(old.marker != pair.marker && old.circle != pair.circle);
                    }
                    previous.push(pair);
                }

                let last = fixes[fixes.len() - 1];
                let is_last_circle = matches!(
                    &backend.circles()[0].1,
                    LayerKind::Circle { radius_m, center }
                        if *radius_m == last.accuracy()
                            && *center == LatLng::from(last.lat_lon())
                );
                prop_assert!(is_last_circle);
                prop_assert_eq!(map.view().renders, fixes.len() as u64);
            }
        }
    }
}
