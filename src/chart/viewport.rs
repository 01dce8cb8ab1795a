//! Visible window state and the data/screen coordinate transform.
//!
//! Two coordinate spaces are involved:
//!
//! - **Data space** ([`DataPoint`]): absolute bar index (fractional) and price
//! - **Screen space** ([`ScreenPoint`]): pixels from the top-left corner of the
//!   render surface, y growing downward
//!
//! [`Viewport`] owns the window (`visible_count`, `scroll_offset`,
//! `vertical_offset`) and hands out a [`Transform`] frozen for one frame.

use std::ops::Range;

use super::base::{MARGIN_BOTTOM, MARGIN_LEFT, MARGIN_RIGHT, MARGIN_TOP, MAX_VISIBLE, MIN_VISIBLE, DEFAULT_VISIBLE};
use super::series::SeriesBuffer;

/// Default render surface size until the first resize event arrives.
const DEFAULT_SURFACE: (f32, f32) = (800.0, 500.0);

/// Pixel position on the render surface.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(self, other: ScreenPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Shortest distance to the segment `a`-`b`.
    pub fn distance_to_segment(self, a: ScreenPoint, b: ScreenPoint) -> f32 {
        let (abx, aby) = (b.x - a.x, b.y - a.y);
        let length_sq = abx * abx + aby * aby;
        if length_sq <= f32::EPSILON {
            return self.distance_to(a);
        }

        let t = (((self.x - a.x) * abx + (self.y - a.y) * aby) / length_sq).clamp(0.0, 1.0);
        self.distance_to(ScreenPoint::new(a.x + t * abx, a.y + t * aby))
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Position in data space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DataPoint {
    /// Absolute bar index, fractional between bar centers.
    pub index: f64,
    pub price: f64,
}

impl DataPoint {
    pub const fn new(index: f64, price: f64) -> Self {
        Self { index, price }
    }
}

/// Plot area inside the render surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl PlotRect {
    /// Plot area of a surface once the axis margins are taken out.
    pub fn from_surface(width: f32, height: f32) -> Self {
        Self {
            left: MARGIN_LEFT,
            top: MARGIN_TOP,
            width: (width - MARGIN_LEFT - MARGIN_RIGHT).max(0.0),
            height: (height - MARGIN_TOP - MARGIN_BOTTOM).max(0.0),
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width < 1.0 || self.height < 1.0
    }

    /// Strict containment; the border itself belongs to the axes.
    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.x > self.left && point.x < self.right() && point.y > self.top && point.y < self.bottom()
    }
}

/// Price span mapped onto the plot height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    /// A flat range is widened to one price unit to keep the transform finite.
    pub fn new(min: f64, max: f64) -> Self {
        if max > min {
            Self { min, max }
        } else {
            Self { min, max: min + 1.0 }
        }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Scrollable, zoomable window over the bar series
#[derive(Debug, Clone)]
pub struct Viewport {
    /// Window width the user asked for, always within `[MIN_VISIBLE, MAX_VISIBLE]`
    requested_count: usize,
    /// Length of the series the window is laid over
    series_len: usize,
    /// Bars back from the newest bar
    scroll_offset: usize,
    /// Vertical pan in pixels
    vertical_offset: f32,
    /// Sub-bar remainder of fractional wheel input
    zoom_carry: f64,
    surface: (f32, f32),
    plot: PlotRect,
    locked_range: Option<PriceRange>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self {
            requested_count: DEFAULT_VISIBLE,
            series_len: 0,
            scroll_offset: 0,
            vertical_offset: 0.0,
            zoom_carry: 0.0,
            surface: DEFAULT_SURFACE,
            plot: PlotRect::from_surface(DEFAULT_SURFACE.0, DEFAULT_SURFACE.1),
            locked_range: None,
        }
    }

    /// Resize the render surface.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.surface = (width.max(0.0), height.max(0.0));
        self.plot = PlotRect::from_surface(self.surface.0, self.surface.1);
    }

    pub fn surface(&self) -> (f32, f32) {
        self.surface
    }

    pub fn plot(&self) -> PlotRect {
        self.plot
    }

    /// Follow a change of the series length, keeping the window in bounds.
    pub fn set_series_len(&mut self, len: usize) {
        self.series_len = len;
        self.clamp_scroll();
    }

    pub fn series_len(&self) -> usize {
        self.series_len
    }

    /// Number of bars in the window.
    pub fn visible_count(&self) -> usize {
        self.requested_count.min(self.series_len)
    }

    pub fn requested_count(&self) -> usize {
        self.requested_count
    }

    /// Set the window width, clamped to `[MIN_VISIBLE, MAX_VISIBLE]` and to the series length.
    pub fn set_visible_count(&mut self, count: usize) {
        self.requested_count = count.clamp(MIN_VISIBLE, MAX_VISIBLE);
        self.clamp_scroll();
    }

    /// Zoom by wheel notches; positive notches show fewer bars.
    ///
    /// Fractional input accumulates until it amounts to a whole bar.
    /// Returns true when the number of visible bars changed.
    pub fn zoom_by(&mut self, notches: f32, zoom_speed: i64) -> bool {
        let bars = notches as f64 * zoom_speed as f64 + self.zoom_carry;
        let whole = bars.trunc();
        self.zoom_carry = bars - whole;
        if whole == 0.0 {
            return false;
        }

        let before = self.visible_count();
        let count = (before as i64 - whole as i64).max(0) as usize;
        self.set_visible_count(count);

        let changed = self.visible_count() != before;
        if !changed {
            // Pinned at a limit, do not bank input against it
            self.zoom_carry = 0.0;
        }
        tracing::debug!(notches, visible_count = self.visible_count(), "viewport zoomed");
        changed
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn max_scroll(&self) -> usize {
        self.series_len.saturating_sub(self.visible_count())
    }

    /// Move the window; positive deltas go back in history.
    pub fn scroll_by(&mut self, delta_bars: i64) {
        let offset = (self.scroll_offset as i64).saturating_add(delta_bars);
        self.scroll_offset = offset.clamp(0, self.max_scroll() as i64) as usize;
    }

    pub fn scroll_to_newest(&mut self) {
        self.scroll_offset = 0;
    }

    pub fn scroll_to_oldest(&mut self) {
        self.scroll_offset = self.max_scroll();
    }

    fn clamp_scroll(&mut self) {
        self.scroll_offset = self.scroll_offset.min(self.max_scroll());
    }

    pub fn vertical_offset(&self) -> f32 {
        self.vertical_offset
    }

    /// Accumulate vertical pan. Unbounded.
    pub fn pan_vertically_by(&mut self, delta_pixels: f32) {
        self.vertical_offset += delta_pixels;
    }

    pub fn reset_vertical_offset(&mut self) {
        self.vertical_offset = 0.0;
    }

    /// Bar range currently shown; empty when the series is empty.
    pub fn visible_slice(&self) -> Range<usize> {
        let end = self.series_len - self.scroll_offset;
        end.saturating_sub(self.visible_count())..end
    }

    /// Price range of the visible slice, or the locked range while one is held.
    pub fn price_range(&self, series: &SeriesBuffer) -> Option<PriceRange> {
        if let Some(locked) = self.locked_range {
            return Some(locked);
        }
        let slice = self.visible_slice();
        series
            .price_range(slice.start, slice.end)
            .map(|(min, max)| PriceRange::new(min, max))
    }

    /// Freeze the current price range so the vertical scale holds still.
    pub fn lock_price_range(&mut self, series: &SeriesBuffer) {
        if self.locked_range.is_none() {
            self.locked_range = self.price_range(series);
        }
    }

    pub fn unlock_price_range(&mut self) {
        self.locked_range = None;
    }

    pub fn is_price_range_locked(&self) -> bool {
        self.locked_range.is_some()
    }

    /// Transform for the current frame, `None` when there is nothing to show.
    pub fn transform(&self, series: &SeriesBuffer) -> Option<Transform> {
        if self.plot.is_empty() {
            return None;
        }
        let slice = self.visible_slice();
        if slice.is_empty() {
            return None;
        }
        Some(Transform {
            plot: self.plot,
            start: slice.start,
            count: slice.len(),
            range: self.price_range(series)?,
            vertical_offset: self.vertical_offset,
        })
    }

    pub fn data_to_screen(&self, series: &SeriesBuffer, bar_index: f64, price: f64) -> Option<ScreenPoint> {
        self.transform(series).map(|t| t.data_to_screen(bar_index, price))
    }

    pub fn screen_to_data(&self, series: &SeriesBuffer, point: ScreenPoint) -> Option<DataPoint> {
        self.transform(series).map(|t| t.screen_to_data(point))
    }
}

/// Affine mapping between data space and screen space for one frame.
///
/// Bar `i` is centered at `left + (i - start + 0.5) * bar_width`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub plot: PlotRect,
    /// Absolute index of the first visible bar
    pub start: usize,
    /// Number of visible bars
    pub count: usize,
    pub range: PriceRange,
    pub vertical_offset: f32,
}

impl Transform {
    pub fn bar_width(&self) -> f64 {
        self.plot.width as f64 / self.count as f64
    }

    pub fn visible_range(&self) -> Range<usize> {
        self.start..self.start + self.count
    }

    pub fn index_to_x(&self, index: f64) -> f32 {
        (self.plot.left as f64 + (index - self.start as f64 + 0.5) * self.bar_width()) as f32
    }

    pub fn x_to_index(&self, x: f32) -> f64 {
        self.start as f64 + (x as f64 - self.plot.left as f64) / self.bar_width() - 0.5
    }

    pub fn price_to_y(&self, price: f64) -> f32 {
        let normalized = (price - self.range.min) / self.range.span();
        (self.plot.bottom() as f64 - normalized * self.plot.height as f64 + self.vertical_offset as f64) as f32
    }

    pub fn y_to_price(&self, y: f32) -> f64 {
        let from_bottom = self.plot.bottom() as f64 + self.vertical_offset as f64 - y as f64;
        self.range.min + from_bottom / self.plot.height as f64 * self.range.span()
    }

    pub fn data_to_screen(&self, bar_index: f64, price: f64) -> ScreenPoint {
        ScreenPoint::new(self.index_to_x(bar_index), self.price_to_y(price))
    }

    pub fn screen_to_data(&self, point: ScreenPoint) -> DataPoint {
        DataPoint::new(self.x_to_index(point.x), self.y_to_price(point.y))
    }

    /// Visible bar whose slot contains `x`.
    pub fn bar_at(&self, x: f32) -> Option<usize> {
        let slot = ((x as f64 - self.plot.left as f64) / self.bar_width()).floor();
        if slot < 0.0 || slot >= self.count as f64 {
            return None;
        }
        Some(self.start + slot as usize)
    }
}
