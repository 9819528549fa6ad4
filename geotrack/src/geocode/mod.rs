//! Reverse geocoding.
//!
//! Address resolution is cosmetic: callers fire a lookup and apply the
//! result if and when it arrives. Failures are logged and otherwise ignored.

mod error;
mod http;
mod nominatim;

pub use error::GeocodeError;
pub use http::{AsyncHttpClient, MockHttpClient, ReqwestClient};
pub use nominatim::{
    parse_address, short_address, GeocodeConfig, NominatimGeocoder, ReverseGeocoder,
    ADDRESS_SEGMENTS, DEFAULT_ENDPOINT,
};
