//! Map widget that narrates its operations on the terminal.

use console::style;
use geotrack::map::{
    Animation, CircleStyle, LatLng, LayerHandle, MapBackend, MapError, MapWidget, MarkerSpec,
    TileLayerSpec,
};

/// [`MapBackend`] whose maps print what they draw.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMapBackend {
    /// Print every operation, not just camera moves.
    pub verbose: bool,
}

impl MapBackend for ConsoleMapBackend {
    fn create_map(
        &self,
        container_id: &str,
        center: LatLng,
        zoom: u8,
    ) -> Result<Box<dyn MapWidget>, MapError> {
        println!(
            "{} map '{}' at {} zoom {}",
            style("[map]").cyan(),
            container_id,
            center,
            zoom
        );
        Ok(Box::new(ConsoleMap {
            verbose: self.verbose,
            zoom,
            next_handle: 0,
        }))
    }
}

struct ConsoleMap {
    verbose: bool,
    zoom: u8,
    next_handle: u64,
}

impl ConsoleMap {
    fn next(&mut self) -> LayerHandle {
        self.next_handle += 1;
        LayerHandle(self.next_handle)
    }

    fn detail(&self, message: String) {
        tracing::debug!(target: "geotrack::console_map", "{}", message);
        if self.verbose {
            println!("{} {}", style("[map]").dim(), style(message).dim());
        }
    }
}

impl MapWidget for ConsoleMap {
    fn add_tile_layer(&mut self, spec: &TileLayerSpec) -> LayerHandle {
        let handle = self.next();
        println!("{} tiles {}", style("[map]").cyan(), spec.url_template);
        handle
    }

    fn add_marker(&mut self, position: LatLng, marker: &MarkerSpec) -> LayerHandle {
        let handle = self.next();
        self.detail(format!("+ marker #{} '{}' at {}", handle.0, marker.title, position));
        handle
    }

    fn add_circle(&mut self, position: LatLng, radius_m: f64, style: &CircleStyle) -> LayerHandle {
        let handle = self.next();
        self.detail(format!(
            "+ circle #{} r={:.1}m {} at {}",
            handle.0, radius_m, style.color, position
        ));
        handle
    }

    fn remove_layer(&mut self, handle: LayerHandle) {
        self.detail(format!("- layer #{}", handle.0));
    }

    fn set_view(&mut self, position: LatLng, zoom: u8, _animation: Animation) {
        self.zoom = zoom;
        println!(
            "{} centre on {} zoom {}",
            style("[map]").green(),
            position,
            zoom
        );
    }

    fn pan_to(&mut self, position: LatLng, _animation: Animation) {
        println!("{} pan to {}", style("[map]").green(), position);
    }

    fn zoom_in(&mut self) {
        self.zoom = self.zoom.saturating_add(1);
        self.detail(format!("zoom {}", self.zoom));
    }

    fn zoom_out(&mut self) {
        self.zoom = self.zoom.saturating_sub(1);
        self.detail(format!("zoom {}", self.zoom));
    }

    fn invalidate_size(&mut self) {
        self.detail("resize".to_string());
    }

    fn remove(&mut self) {
        println!("{} removed", style("[map]").cyan());
    }
}
