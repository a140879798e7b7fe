//! Location Search Module
//!
//! Turns the free-text location field of a site form into a list of geocoding
//! candidates, and lets the user accept one of them as the site coordinates.
//!
//! ## Overview
//! Every keystroke is pushed into a `QueryStream`. The stream waits for the input to
//! settle, then asks a `SuggestionLookup` (normally the Nominatim client) for matches.
//! Only one lookup is ever in flight per stream: a newer keystroke cancels the older
//! request, and a canceled request can never write its results back.
//!
//! ## Submodules
//! - **`query`**: The debounced, cancelable query stream (state machine + timer task).
//! - **`client`**: The `SuggestionLookup` seam and its Nominatim HTTP implementation.
//! - **`types`**: Suggestions, accepted locations, snapshots and lookup errors.

pub mod client;
pub mod query;
pub mod types;
