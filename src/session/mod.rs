//! Session Module
//!
//! One session per open site form. A session owns three independent state slices:
//! the location query stream, the weather for the accepted site, and the latest prediction.
//! Each slice is updated through its own narrow operations; nothing shares a monolithic record.
//!
//! ## Submodules
//! - **`registry`**: Shared upstream services plus the live sessions (`DashMap`).
//! - **`handlers`**: Axum HTTP handlers exposing the sessions as a JSON API.
//! - **`types`**: Session identifiers and request/response DTOs.

pub mod handlers;
pub mod registry;
pub mod types;

#[cfg(test)]
mod tests;
