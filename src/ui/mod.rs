//! Terminal UI rendering using ratatui.
//!
//! ## Submodules
//!
//! - [`chart`]: Live line chart of samples with event markers
//! - [`common`]: Shared components (header, status bar, alarm banner, help overlay)
//! - [`dialog`]: Reset confirmation prompt
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │                                      │
//! │ Chart (chart::render)                │
//! │                                      │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    Overlays rendered on top:
//!    - common::render_alarm_banner
//!    - dialog::render_confirm_reset
//!    - common::render_help
//! ```

pub mod chart;
pub mod common;
pub mod dialog;
pub mod theme;

pub use theme::Theme;
