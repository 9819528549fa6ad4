//! Map synchronisation.
//!
//! [`MapSync`] owns the map widget exclusively: lifecycle, the position
//! overlay pair, the camera and the base layer. Nothing else touches the
//! widget.
//!
//! # Architecture
//!
//! ```text
//! TrackingSessionController ──► MapSync ──► Box<dyn MapWidget>
//!                                  │              ▲
//!                                  └── MapBackend ┘ (create_map)
//! ```

mod error;
mod layers;
mod recording;
mod sync;
mod widget;

pub use error::MapError;
pub use layers::{accuracy_circle_style, car_icon, position_marker, BaseLayer};
pub use recording::{CameraOp, LayerKind, RecordingBackend};
pub use sync::{CameraMode, CameraMove, MapConfig, MapStatus, MapSync, MapViewState, OverlayPair};
pub use widget::{
    Animation, CircleStyle, LatLng, LayerHandle, MapBackend, MapWidget, MarkerIcon, MarkerSpec,
    TileLayerSpec,
};
