//! Interactive chart viewport and annotation engine.
//!
//! This module provides:
//! - `SeriesBuffer` - Ordered bar storage with ingestion checks
//! - `Viewport` - Scroll/zoom window and the data/screen transform
//! - `Indicator` - EMA/SMA overlays computed over the full series
//! - `AnnotationStore` - Trendlines in resolution-independent coordinates
//! - `InteractionController` - Input state machine producing a `DrawPlan`
//! - `ChartWidget` - egui render surface (with `gui` feature)
//!
//! # Example
//!
//! ```ignore
//! use chart_terminal::chart::{InputEvent, InteractionController};
//!
//! let mut chart = InteractionController::default();
//! chart.replace_series(bars)?;
//! chart.handle_event(InputEvent::Wheel { notches: 1.0 });
//! let plan = chart.draw_plan();
//! ```

mod annotation;
mod base;
mod controller;
mod indicator;
mod item;
mod plan;
pub(crate) mod series;
mod viewport;

#[cfg(feature = "gui")]
mod widget;

pub use annotation::{Annotation, AnnotationId, AnnotationStore, DragReference, Handle, Hit, NormalizedPoint};
pub use base::*;
pub use controller::{
    CursorShape, InputEvent, InteractionController, InteractionState, KeyCommand, OutputEvent, PanReference,
    PointerButton, ToolKind, ToolSelection,
};
pub use indicator::{compute_ema, compute_sma, Indicator, IndicatorSeries, EMA_PRESETS, SMA_PRESET};
pub use item::{draw_overlay, item_for, CandleItem, ChartItem, LineItem, OhlcItem};
pub use plan::{DrawPlan, Layer, LineStyle, Primitive, TextAnchor};
pub use series::{validate_bars, Bar, InvalidSeriesError, SeriesBuffer};
pub use viewport::{DataPoint, PlotRect, PriceRange, ScreenPoint, Transform, Viewport};

#[cfg(feature = "gui")]
pub use widget::ChartWidget;
