//! Display-side data derived from the session.
//!
//! ## Submodules
//!
//! - [`plot`]: Chart points and marker annotations rebuilt from notifications
//!
//! ## Data Flow
//!
//! ```text
//! Notification::Sample / Marker / Reset
//!        │
//!        ▼
//! PlotData::push_sample() / push_marker() / clear()
//!        │
//!        └──▶ ui::chart (line chart with "#n" markers)
//! ```

pub mod plot;

pub use plot::PlotData;
