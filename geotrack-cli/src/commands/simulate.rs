//! `simulate` command: a tracking session fed by a synthetic circular route.

use std::f64::consts::PI;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::Args;
use console::style;
use geotrack::format::{
    format_accuracy, format_coordinate, format_heading, format_speed, format_timestamp,
};
use geotrack::geocode::{GeocodeError, NominatimGeocoder, ReverseGeocoder};
use geotrack::location::SimulatedProvider;
use geotrack::map::LatLng;
use geotrack::throttle::{NeverThrottle, SampleThrottle};
use geotrack::{
    BoxFuture, RawPosition, TrackerConfig, TrackerDeps, TrackingSessionController,
    UpdateThrottler, ViewState,
};

use crate::console_map::ConsoleMapBackend;
use crate::error::CliError;

/// Metres per degree of latitude.
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Arguments for `geotrack simulate`.
#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Number of fixes to emit
    #[arg(long, default_value_t = 10)]
    pub fixes: u32,

    /// Time between fixes, in milliseconds
    #[arg(long, default_value_t = 500)]
    pub interval_ms: u64,

    /// Route centre latitude (defaults to the map's initial centre)
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Route centre longitude (defaults to the map's initial centre)
    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Route radius in metres
    #[arg(long, default_value_t = 150.0)]
    pub radius_m: f64,

    /// Reported fix accuracy in metres
    #[arg(long, default_value_t = 8.0)]
    pub accuracy_m: f64,

    /// Start on satellite tiles
    #[arg(long)]
    pub satellite: bool,

    /// Skip reverse geocoding (no network access)
    #[arg(long)]
    pub offline: bool,

    /// Print every map operation
    #[arg(long)]
    pub show_layers: bool,

    /// Redraw on every fix instead of at most once per render interval
    #[arg(long)]
    pub no_throttle: bool,
}

/// Geocoder used with `--offline`.
struct OfflineGeocoder;

impl ReverseGeocoder for OfflineGeocoder {
    fn lookup(&self, _latitude: f64, _longitude: f64) -> BoxFuture<'_, Result<String, GeocodeError>> {
        Box::pin(async { Err(GeocodeError::Http("offline".to_string())) })
    }
}

/// Run the simulation to completion.
pub fn run(args: SimulateArgs, config: TrackerConfig) -> Result<(), CliError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))?;
    runtime.block_on(simulate(args, config))
}

async fn simulate(args: SimulateArgs, config: TrackerConfig) -> Result<(), CliError> {
    let geocoder: Arc<dyn ReverseGeocoder> = if args.offline {
        Arc::new(OfflineGeocoder)
    } else {
        let geocoder = NominatimGeocoder::from_config(config.geocode.clone())
            .map_err(|e| CliError::Config(e.to_string()))?;
        Arc::new(geocoder)
    };

    let provider = Arc::new(SimulatedProvider::granted());
    let backend = ConsoleMapBackend {
        verbose: args.show_layers,
    };
    let deps = TrackerDeps::new(provider.clone(), Arc::new(backend), geocoder);

    let center = LatLng::new(
        args.lat.unwrap_or(config.map.initial_center.lat),
        args.lon.unwrap_or(config.map.initial_center.lon),
    );
    let throttle = redraw_throttle(args.no_throttle, &config);
    let controller = TrackingSessionController::with_throttle(config, deps, throttle);

    if args.satellite {
        controller.toggle_map_style();
    }
    if let Err(e) = controller.attach_map() {
        tracing::warn!(error = %e, "Continuing without map");
    }
    controller.start_tracking().await?;

    let route = CircularRoute::new(center, args.radius_m, args.fixes.max(1), args.interval_ms);
    let interval = Duration::from_millis(args.interval_ms);
    for step in 0..args.fixes {
        provider.push_fix(route.fix(step, args.accuracy_m, now_ms()));
        tokio::time::sleep(interval).await;
        print_progress(step + 1, &controller.snapshot());
    }

    // Give in-flight lookups a moment to land
    tokio::time::sleep(Duration::from_millis(500)).await;
    controller.stop_tracking();

    let view = controller.snapshot();
    print_summary(&view);
    if let Some(url) = controller.open_in_maps() {
        println!("  {:<10} {}", "Open:", style(url).underlined());
    }

    controller.teardown();
    Ok(())
}

fn redraw_throttle(disabled: bool, config: &TrackerConfig) -> Box<dyn SampleThrottle> {
    if disabled {
        Box::new(NeverThrottle::default())
    } else {
        Box::new(UpdateThrottler::with_interval(config.session.min_render_interval))
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Evenly spaced fixes around a circle, travelled clockwise from north.
#[derive(Debug, Clone, Copy)]
struct CircularRoute {
    center: LatLng,
    radius_m: f64,
    steps: u32,
    speed_mps: f64,
}

impl CircularRoute {
    fn new(center: LatLng, radius_m: f64, steps: u32, interval_ms: u64) -> Self {
        let lap_secs = f64::from(steps) * interval_ms as f64 / 1000.0;
        let speed_mps = if lap_secs > 0.0 {
            2.0 * PI * radius_m / lap_secs
        } else {
            0.0
        };
        Self {
            center,
            radius_m,
            steps,
            speed_mps,
        }
    }

    fn fix(&self, step: u32, accuracy_m: f64, timestamp: u64) -> RawPosition {
        let bearing = 2.0 * PI * f64::from(step) / f64::from(self.steps);
        let d_lat = self.radius_m * bearing.cos() / METERS_PER_DEGREE;
        let d_lon = self.radius_m * bearing.sin()
            / (METERS_PER_DEGREE * self.center.lat.to_radians().cos().max(1e-6));
        let heading = (bearing.to_degrees() + 90.0).rem_euclid(360.0);

        RawPosition::new(
            (self.center.lat + d_lat).clamp(-90.0, 90.0),
            (self.center.lon + d_lon + 180.0).rem_euclid(360.0) - 180.0,
            accuracy_m,
            timestamp,
        )
        .with_motion(Some(self.speed_mps), Some(heading))
    }
}

fn print_progress(step: u32, view: &ViewState) {
    let position = view
        .last_sample
        .map(|s| {
            format!(
                "{}, {}",
                format_coordinate(s.latitude()),
                format_coordinate(s.longitude())
            )
        })
        .unwrap_or_else(|| "-".to_string());
    let tracking = if view.is_tracking {
        style("tracking").green()
    } else {
        style("idle").yellow()
    };
    println!(
        "{} #{:<3} {} {} {}",
        style("[fix]").bold(),
        step,
        tracking,
        position,
        style(&view.address).dim()
    );
}

fn print_summary(view: &ViewState) {
    println!();
    println!("{}", style("Session summary").bold());
    println!("{}", style("===============").bold());

    if let Some(sample) = view.last_sample {
        println!("  {:<10} {}", "Latitude:", format_coordinate(sample.latitude()));
        println!("  {:<10} {}", "Longitude:", format_coordinate(sample.longitude()));
        println!("  {:<10} {}", "Accuracy:", format_accuracy(sample.accuracy()));
        println!("  {:<10} {}", "Speed:", format_speed(sample.speed()));
        println!("  {:<10} {}", "Heading:", format_heading(sample.heading()));
        println!("  {:<10} {}", "Updated:", format_timestamp(sample.timestamp()));
    } else {
        println!("  No location received");
    }

    let address = if view.address.is_empty() {
        "(unresolved)"
    } else {
        view.address.as_str()
    };
    println!("  {:<10} {}", "Address:", address);
    println!(
        "  {:<10} {} (avg accuracy {})",
        "Fixes:",
        view.sample_count,
        format_accuracy(view.running_average_accuracy)
    );
    println!(
        "  {:<10} {} ({})",
        "Map:",
        view.map_status,
        if view.is_satellite() { "satellite" } else { "standard" }
    );
    if view.has_error() {
        println!("  {:<10} {}", "Status:", style(&view.status).red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geotrack::PositionSample;

    #[test]
    fn test_route_starts_north_of_centre() {
        let route = CircularRoute::new(LatLng::new(0.0, 0.0), 111.32, 4, 1000);
        let fix = PositionSample::try_from(route.fix(0, 5.0, 0)).unwrap();

        assert!((fix.latitude() - 0.001).abs() < 1e-9);
        assert!(fix.longitude().abs() < 1e-9);
        assert_eq!(fix.heading(), Some(90.0));
    }

    #[test]
    fn test_route_fixes_are_valid_samples() {
        let route = CircularRoute::new(LatLng::new(89.9999, 179.9999), 500.0, 8, 500);
        for step in 0..8 {
            assert!(PositionSample::try_from(route.fix(step, 5.0, 0)).is_ok());
        }
    }

    #[test]
    fn test_route_speed() {
        let route = CircularRoute::new(LatLng::new(0.0, 0.0), 100.0, 10, 1000);
        assert!((route.speed_mps - 2.0 * PI * 100.0 / 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_redraw_throttle_selection() {
        let config = TrackerConfig::default();
        let t0 = tokio::time::Instant::now();

        let mut throttled = redraw_throttle(false, &config);
        assert!(throttled.try_accept(t0).is_accepted());
        assert!(!throttled.try_accept(t0).is_accepted());

        let mut unthrottled = redraw_throttle(true, &config);
        assert!(unthrottled.try_accept(t0).is_accepted());
        assert!(unthrottled.try_accept(t0).is_accepted());
    }

    #[tokio::test]
    async fn test_offline_geocoder_fails_quietly() {
        assert!(OfflineGeocoder.lookup(1.0, 2.0).await.is_err());
    }
}
