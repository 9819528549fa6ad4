//! Device position acquisition.
//!
//! [`LocationSource`] wraps a [`GeolocationProvider`] with two modes:
//! a single-shot [`LocationSource::get_once`] and a continuous
//! [`LocationSource::watch`] delivering a cancellable [`PositionStream`].
//!
//! # Example
//!
//! ```ignore
//! use geotrack::location::{LocationOptions, LocationSource, WatchEvent};
//!
//! let source = LocationSource::new(provider);
//! let mut watch = source.watch(LocationOptions::watch()).await?;
//!
//! while let Some(event) = watch.stream.next_event().await {
//!     match event {
//!         WatchEvent::Fix(sample) => println!("{:?}", sample.lat_lon()),
//!         WatchEvent::Error(e) => eprintln!("{}", e),
//!     }
//! }
//!
//! source.stop_watch(&watch.handle);
//! ```

mod error;
mod options;
mod provider;
mod simulated;
mod source;

pub use error::{LocationError, PositionError};
pub use options::LocationOptions;
pub use provider::{GeolocationProvider, PositionSink, WatchId};
pub use simulated::SimulatedProvider;
pub use source::{
    LocationSource, PositionStream, PositionWatch, WatchEvent, WatchHandle, ONE_SHOT_GRACE,
};
