//! Weather Module
//!
//! Current-conditions lookup for the accepted site coordinates.
//!
//! ## Submodules
//! - **`client`**: The `WeatherProvider` seam and its OpenWeatherMap implementation.
//! - **`state`**: The per-session weather slice, refreshed whenever a location is accepted.
//! - **`types`**: The report shape plus the raw upstream payload.

pub mod client;
pub mod state;
pub mod types;
