//! Solar Site Assistant Library
//!
//! Backend for a solar-panel site form: location autocomplete, current weather for the
//! chosen site, and tilt/azimuth recommendations from pluggable optimizers.
//! It serves as the foundation for the binary executable (`main.rs`).
//!
//! ## Architecture Modules
//! - **`geocoding`**: The debounced, cancelable location query stream and the geocoder client.
//! - **`weather`**: Current-conditions client and the per-session weather slice.
//! - **`prediction`**: The `Optimizer` seam with generative, simulated and backend strategies.
//! - **`session`**: Per-form sessions owning the state slices, and the HTTP handlers.
//! - **`config`**: Settings from environment and command line; wiring of upstream services.

pub mod config;
pub mod geocoding;
pub mod prediction;
pub mod session;
pub mod weather;
