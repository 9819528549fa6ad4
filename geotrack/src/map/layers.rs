//! Base layers and overlay styling.

use std::fmt;

use super::widget::{CircleStyle, MarkerIcon, MarkerSpec, TileLayerSpec};
use crate::format::{format_accuracy, format_coordinate};
use crate::sample::PositionSample;

const OSM_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
const OSM_ATTRIBUTION: &str = "© OpenStreetMap contributors";
const SATELLITE_TILE_URL: &str = "https://{s}.google.com/vt/lyrs=s&x={x}&y={y}&z={z}";
const SATELLITE_SUBDOMAINS: [&str; 4] = ["mt0", "mt1", "mt2", "mt3"];

/// Accuracy circle colour.
const ACCURACY_COLOR: &str = "#4285F4";

/// Background tile set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaseLayer {
    /// OpenStreetMap street map.
    #[default]
    Standard,
    /// Satellite imagery.
    Satellite,
}

impl BaseLayer {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseLayer::Standard => "standard",
            BaseLayer::Satellite => "satellite",
        }
    }

    /// The other layer.
    pub fn toggled(&self) -> Self {
        match self {
            BaseLayer::Standard => BaseLayer::Satellite,
            BaseLayer::Satellite => BaseLayer::Standard,
        }
    }

    pub fn tile_spec(&self) -> TileLayerSpec {
        match self {
            BaseLayer::Standard => TileLayerSpec {
                url_template: OSM_TILE_URL.to_string(),
                max_zoom: 19,
                subdomains: vec!["a".to_string(), "b".to_string(), "c".to_string()],
                attribution: Some(OSM_ATTRIBUTION.to_string()),
            },
            BaseLayer::Satellite => TileLayerSpec {
                url_template: SATELLITE_TILE_URL.to_string(),
                max_zoom: 20,
                subdomains: SATELLITE_SUBDOMAINS.iter().map(|s| s.to_string()).collect(),
                attribution: None,
            },
        }
    }
}

impl fmt::Display for BaseLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Car icon anchored at its bottom centre.
pub fn car_icon() -> MarkerIcon {
    MarkerIcon {
        class_name: "car-marker-container".to_string(),
        html: r#"<div class="car-marker"></div>"#.to_string(),
        size: (30, 30),
        anchor: (15, 30),
        popup_anchor: (0, -30),
    }
}

/// Marker for the user's position with a coordinate popup.
pub fn position_marker(sample: &PositionSample) -> MarkerSpec {
    MarkerSpec {
        icon: car_icon(),
        title: "Your location".to_string(),
        popup: format!(
            "Your location\nLat: {}\nLng: {}\nAccuracy: {}",
            format_coordinate(sample.latitude()),
            format_coordinate(sample.longitude()),
            format_accuracy(sample.accuracy()),
        ),
    }
}

pub fn accuracy_circle_style() -> CircleStyle {
    CircleStyle {
        color: ACCURACY_COLOR.to_string(),
        fill_color: ACCURACY_COLOR.to_string(),
        fill_opacity: 0.1,
        weight: 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        assert_eq!(BaseLayer::default(), BaseLayer::Standard);
        assert_eq!(BaseLayer::Standard.toggled(), BaseLayer::Satellite);
        assert_eq!(BaseLayer::Satellite.toggled(), BaseLayer::Standard);
    }

    #[test]
    fn test_tile_specs() {
        let standard = BaseLayer::Standard.tile_spec();
        assert!(standard.url_template.contains("openstreetmap"));
        assert_eq!(standard.max_zoom, 19);
        assert!(standard.attribution.is_some());

        let satellite = BaseLayer::Satellite.tile_spec();
        assert_eq!(satellite.max_zoom, 20);
        assert_eq!(satellite.subdomains, vec!["mt0", "mt1", "mt2", "mt3"]);
    }

    #[test]
    fn test_position_marker_popup() {
        let sample = PositionSample::new(10.0, 20.0, 5.0, 0).unwrap();
        let marker = position_marker(&sample);
        assert!(marker.popup.contains("Lat: 10.000000"));
        assert!(marker.popup.contains("Accuracy: 5.0m"));
        assert_eq!(marker.icon.anchor, (15, 30));
    }
}
