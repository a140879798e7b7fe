//! Prediction Module
//!
//! Produces tilt/azimuth recommendations and energy estimates for a site.
//!
//! ## Overview
//! There is no in-house solar model. A recommendation comes from one of three
//! interchangeable strategies, all behind the `Optimizer` trait:
//! 1. **Generative**: asks a generative-language API for the optimal angles and a rationale.
//! 2. **Simulated**: produces placeholder numbers locally (demo mode, no network).
//! 3. **Backend**: forwards the site and weather to a remote prediction service.
//!
//! None of them is authoritative. The `OptimizerRegistry` holds whichever are configured
//! and picks the default unless a request names another one.
//!
//! ## Submodules
//! - **`optimizer`**: The `Optimizer` trait and the strategy registry.
//! - **`generative`**, **`simulated`**, **`backend`**: The three strategies.
//! - **`state`**: The per-session prediction slice.
//! - **`types`**: Site parameters and report shapes.

pub mod backend;
pub mod generative;
pub mod optimizer;
pub mod simulated;
pub mod state;
pub mod types;
