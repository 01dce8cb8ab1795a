//! Chart Terminal - interactive price charts for a desktop investment terminal
//!
//! This crate provides:
//!
//! - A scrollable, zoomable chart viewport over an ordered bar series
//! - EMA/SMA overlays sliced to the visible window
//! - Trendline annotations that survive scroll, zoom, resize and data refresh
//! - An input state machine that emits a toolkit-independent draw plan
//! - Settings, logging, datafeeds and a background refresh worker
//! - An egui chart widget (with `gui` feature)
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use chart_terminal::chart::{InputEvent, InteractionController};
//! use chart_terminal::terminal::{BarRequest, SyntheticDatafeed, Timeframe, fetch_bars};
//!
//! #[tokio::main]
//! async fn main() {
//!     let feed = SyntheticDatafeed::default();
//!     let bars = fetch_bars(&feed, &BarRequest::new("AAPL", Timeframe::M30)).await;
//!
//!     let mut chart = InteractionController::default();
//!     if chart.replace_series(bars).is_ok() {
//!         chart.handle_event(InputEvent::Resize { width: 1200.0, height: 700.0 });
//!         let _plan = chart.draw_plan();
//!     }
//! }
//! ```

pub mod chart;
pub mod terminal;

// Re-export commonly used types
pub use chart::{
    Bar, Indicator, InputEvent, InteractionController, InvalidSeriesError, OutputEvent, SeriesBuffer, ToolKind,
    ToolSelection, Viewport,
};
pub use terminal::{ChartConfig, ChartType, Settings, Timeframe};

#[cfg(feature = "gui")]
pub use chart::ChartWidget;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
