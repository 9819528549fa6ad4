//! Map widget abstraction.
//!
//! The rendering library is an external capability. [`MapBackend`] creates a
//! map inside a container and hands back a [`MapWidget`], which is the only
//! way overlays and the camera are touched. Tile fetching and projection are
//! the backend's business.

use std::fmt;
use std::time::Duration;

use super::error::MapError;

/// A geographic position in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lon: f64,
}

impl LatLng {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl From<(f64, f64)> for LatLng {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lon)
    }
}

/// Backend-assigned layer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerHandle(pub u64);

/// A base tile layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayerSpec {
    /// URL template with `{s}`, `{x}`, `{y}`, `{z}` placeholders.
    pub url_template: String,
    pub max_zoom: u8,
    pub subdomains: Vec<String>,
    pub attribution: Option<String>,
}

/// Custom HTML marker icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerIcon {
    pub class_name: String,
    pub html: String,
    pub size: (u32, u32),
    /// Pixel offset of the point that sits on the position.
    pub anchor: (i32, i32),
    pub popup_anchor: (i32, i32),
}

/// Marker with icon, hover title and popup body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSpec {
    pub icon: MarkerIcon,
    pub title: String,
    pub popup: String,
}

/// Stroke and fill of a circle overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct CircleStyle {
    pub color: String,
    pub fill_color: String,
    pub fill_opacity: f64,
    pub weight: u32,
}

/// Camera animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Animation {
    pub animate: bool,
    pub duration: Duration,
}

impl Animation {
    pub fn smooth(duration: Duration) -> Self {
        Self {
            animate: true,
            duration,
        }
    }

    pub fn none() -> Self {
        Self {
            animate: false,
            duration: Duration::ZERO,
        }
    }
}

/// Creates maps inside containers.
pub trait MapBackend: Send + Sync {
    /// Create a map in `container_id`, centred on `center` at `zoom`.
    ///
    /// Fails with [`MapError::ContainerNotFound`] when the container does not
    /// exist yet.
    fn create_map(
        &self,
        container_id: &str,
        center: LatLng,
        zoom: u8,
    ) -> Result<Box<dyn MapWidget>, MapError>;
}

/// A live map instance.
pub trait MapWidget: Send {
    fn add_tile_layer(&mut self, spec: &TileLayerSpec) -> LayerHandle;
    fn add_marker(&mut self, position: LatLng, marker: &MarkerSpec) -> LayerHandle;
    fn add_circle(&mut self, position: LatLng, radius_m: f64, style: &CircleStyle) -> LayerHandle;
    /// Removing an unknown handle is a no-op.
    fn remove_layer(&mut self, handle: LayerHandle);
    fn set_view(&mut self, position: LatLng, zoom: u8, animation: Animation);
    fn pan_to(&mut self, position: LatLng, animation: Animation);
    fn zoom_in(&mut self);
    fn zoom_out(&mut self);
    /// Re-measure the container after a layout change.
    fn invalidate_size(&mut self);
    /// Release the map and everything on it.
    fn remove(&mut self);
}
