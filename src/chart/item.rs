//! Chart items that turn bars and overlays into plan primitives.

use super::base::{format_price, BAR_BODY_RATIO, DOWN_COLOR, OVERLAY_WIDTH, PEN_WIDTH, UP_COLOR};
use super::indicator::IndicatorSeries;
use super::plan::{DrawPlan, Layer, Primitive};
use super::series::{Bar, SeriesBuffer};
use super::viewport::{ScreenPoint, Transform};
use crate::terminal::ChartType;

/// Trait for chart items that can be drawn
pub trait ChartItem {
    /// Describe the visible bars into the series layer
    fn draw(&self, plan: &mut DrawPlan, series: &SeriesBuffer, transform: &Transform);

    /// Get info text for a specific bar index
    fn info_text(&self, series: &SeriesBuffer, index: usize) -> String {
        series.at(index).map(ohlc_text).unwrap_or_default()
    }
}

/// Item drawing the given chart type.
pub fn item_for(chart_type: ChartType) -> Box<dyn ChartItem> {
    match chart_type {
        ChartType::Candlestick => Box::new(CandleItem),
        ChartType::Ohlc => Box::new(OhlcItem),
        ChartType::Line => Box::new(LineItem),
    }
}

fn ohlc_text(bar: &Bar) -> String {
    format!(
        "{}  O {}  H {}  L {}  C {}",
        bar.timestamp.format("%Y-%m-%d %H:%M"),
        format_price(bar.open, 2),
        format_price(bar.high, 2),
        format_price(bar.low, 2),
        format_price(bar.close, 2),
    )
}

fn bar_color(bar: &Bar) -> [u8; 4] {
    if bar.is_up() {
        UP_COLOR
    } else {
        DOWN_COLOR
    }
}

/// Candlestick chart item
pub struct CandleItem;

impl ChartItem for CandleItem {
    fn draw(&self, plan: &mut DrawPlan, series: &SeriesBuffer, transform: &Transform) {
        let body_width = (transform.bar_width() as f32 * BAR_BODY_RATIO).max(1.0);

        for index in transform.visible_range() {
            let Some(bar) = series.at(index) else { continue };
            let x = transform.index_to_x(index as f64);
            let color = bar_color(bar);

            // Wick
            plan.push(
                Layer::Series,
                Primitive::line(
                    ScreenPoint::new(x, transform.price_to_y(bar.high)),
                    ScreenPoint::new(x, transform.price_to_y(bar.low)),
                    color,
                    PEN_WIDTH,
                ),
            );

            let open_y = transform.price_to_y(bar.open);
            let close_y = transform.price_to_y(bar.close);
            if (open_y - close_y).abs() < 1.0 {
                // Doji
                plan.push(
                    Layer::Series,
                    Primitive::line(
                        ScreenPoint::new(x - body_width * 0.5, open_y),
                        ScreenPoint::new(x + body_width * 0.5, open_y),
                        color,
                        PEN_WIDTH,
                    ),
                );
            } else {
                plan.push(
                    Layer::Series,
                    Primitive::FilledRect {
                        min: ScreenPoint::new(x - body_width * 0.5, open_y.min(close_y)),
                        max: ScreenPoint::new(x + body_width * 0.5, open_y.max(close_y)),
                        color,
                    },
                );
            }
        }
    }
}

/// OHLC bar chart item: high-low stem with open tick left and close tick right.
pub struct OhlcItem;

impl ChartItem for OhlcItem {
    fn draw(&self, plan: &mut DrawPlan, series: &SeriesBuffer, transform: &Transform) {
        let tick = (transform.bar_width() as f32 * BAR_BODY_RATIO * 0.5).max(1.0);

        for index in transform.visible_range() {
            let Some(bar) = series.at(index) else { continue };
            let x = transform.index_to_x(index as f64);
            let color = bar_color(bar);
            let open_y = transform.price_to_y(bar.open);
            let close_y = transform.price_to_y(bar.close);

            plan.push(
                Layer::Series,
                Primitive::line(
                    ScreenPoint::new(x, transform.price_to_y(bar.high)),
                    ScreenPoint::new(x, transform.price_to_y(bar.low)),
                    color,
                    PEN_WIDTH,
                ),
            );
            plan.push(
                Layer::Series,
                Primitive::line(ScreenPoint::new(x - tick, open_y), ScreenPoint::new(x, open_y), color, PEN_WIDTH),
            );
            plan.push(
                Layer::Series,
                Primitive::line(ScreenPoint::new(x, close_y), ScreenPoint::new(x + tick, close_y), color, PEN_WIDTH),
            );
        }
    }
}

/// Close-price line chart item
pub struct LineItem;

impl ChartItem for LineItem {
    fn draw(&self, plan: &mut DrawPlan, series: &SeriesBuffer, transform: &Transform) {
        let points: Vec<ScreenPoint> = transform
            .visible_range()
            .filter_map(|index| series.at(index).map(|bar| transform.data_to_screen(index as f64, bar.close)))
            .collect();

        if points.len() >= 2 {
            plan.push(Layer::Series, Primitive::Polyline { points, color: UP_COLOR, width: OVERLAY_WIDTH });
        }
    }
}

/// Describe the visible part of an overlay as a polyline.
pub fn draw_overlay(plan: &mut DrawPlan, overlay: &IndicatorSeries, transform: &Transform) {
    let points: Vec<ScreenPoint> = overlay
        .visible(transform.visible_range())
        .into_iter()
        .map(|(index, value)| transform.data_to_screen(index as f64, value))
        .collect();

    if points.len() >= 2 {
        plan.push(
            Layer::Overlays,
            Primitive::Polyline { points, color: overlay.indicator.color(), width: OVERLAY_WIDTH },
        );
    }
}
