//! Declarative frame description handed to the render surface.
//!
//! The chart core never paints. It fills a [`DrawPlan`] with toolkit-free
//! primitives, layer by layer, and the render surface replays them in
//! [`Layer`] order.

use chrono::{DateTime, Utc};

use super::base::{
    calculate_axis_ticks, format_price, Rgba, AXIS_TEXT_COLOR, BACKGROUND_COLOR, CURSOR_COLOR, EMPTY_TEXT_COLOR,
    FONT_SIZE, GRID_COLOR, LABEL_TEXT_COLOR, PEN_WIDTH, PRICE_LABEL_HEIGHT,
    PRICE_LABEL_WIDTH, PRICE_TICKS, TIME_LABELS, TIME_LABEL_HEIGHT, TIME_LABEL_WIDTH,
};
use super::series::SeriesBuffer;
use super::viewport::{PlotRect, ScreenPoint, Transform};

/// Stroke pattern for lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// Which point of a text box `Primitive::Text::pos` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    LeftCenter,
    Center,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Line {
        from: ScreenPoint,
        to: ScreenPoint,
        color: Rgba,
        width: f32,
        style: LineStyle,
    },
    Polyline {
        points: Vec<ScreenPoint>,
        color: Rgba,
        width: f32,
    },
    FilledRect {
        min: ScreenPoint,
        max: ScreenPoint,
        color: Rgba,
    },
    Rect {
        min: ScreenPoint,
        max: ScreenPoint,
        color: Rgba,
        width: f32,
    },
    Text {
        pos: ScreenPoint,
        text: String,
        color: Rgba,
        size: f32,
        anchor: TextAnchor,
    },
    /// Drag handle drawn on a selected annotation endpoint
    Handle {
        center: ScreenPoint,
        radius: f32,
        color: Rgba,
    },
}

impl Primitive {
    pub fn line(from: ScreenPoint, to: ScreenPoint, color: Rgba, width: f32) -> Self {
        Primitive::Line { from, to, color, width, style: LineStyle::Solid }
    }

    pub fn styled_line(from: ScreenPoint, to: ScreenPoint, color: Rgba, width: f32, style: LineStyle) -> Self {
        Primitive::Line { from, to, color, width, style }
    }

    pub fn text(pos: ScreenPoint, text: impl Into<String>, color: Rgba, anchor: TextAnchor) -> Self {
        Primitive::Text { pos, text: text.into(), color, size: FONT_SIZE, anchor }
    }
}

/// Paint order of the plan, back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Grid,
    Axes,
    Series,
    Overlays,
    Annotations,
    Crosshair,
}

impl Layer {
    pub const ALL: [Layer; 6] = [
        Layer::Grid,
        Layer::Axes,
        Layer::Series,
        Layer::Overlays,
        Layer::Annotations,
        Layer::Crosshair,
    ];
}

/// Everything the render surface needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawPlan {
    pub width: f32,
    pub height: f32,
    pub background: Rgba,
    pub plot: PlotRect,
    layers: [Vec<Primitive>; 6],
}

impl DrawPlan {
    pub fn new(width: f32, height: f32, plot: PlotRect) -> Self {
        Self {
            width,
            height,
            background: BACKGROUND_COLOR,
            plot,
            layers: Default::default(),
        }
    }

    pub fn push(&mut self, layer: Layer, primitive: Primitive) {
        self.layers[layer as usize].push(primitive);
    }

    pub fn layer(&self, layer: Layer) -> &[Primitive] {
        &self.layers[layer as usize]
    }

    /// All primitives in paint order.
    pub fn primitives(&self) -> impl Iterator<Item = &Primitive> {
        self.layers.iter().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(Vec::is_empty)
    }

    pub fn len(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }
}

/// Price grid, price labels and time labels for the visible window.
pub fn push_grid_and_axes(plan: &mut DrawPlan, transform: &Transform, series: &SeriesBuffer, intraday: bool) {
    let plot = transform.plot;
    let label_x = plot.right() + 4.0;

    for tick in calculate_axis_ticks(transform.range.min, transform.range.max, PRICE_TICKS) {
        let y = transform.price_to_y(tick);
        if y < plot.top || y > plot.bottom() {
            continue;
        }
        plan.push(
            Layer::Grid,
            Primitive::line(ScreenPoint::new(plot.left, y), ScreenPoint::new(plot.right(), y), GRID_COLOR, PEN_WIDTH),
        );
        plan.push(
            Layer::Axes,
            Primitive::text(ScreenPoint::new(label_x, y), format_price(tick, 2), AXIS_TEXT_COLOR, TextAnchor::LeftCenter),
        );
    }

    let step = (transform.count / TIME_LABELS).max(1);
    let label_y = plot.bottom() + TIME_LABEL_HEIGHT * 0.5 + 2.0;
    for index in transform.visible_range().step_by(step) {
        let Some(bar) = series.at(index) else { continue };
        let x = transform.index_to_x(index as f64);
        plan.push(
            Layer::Grid,
            Primitive::styled_line(
                ScreenPoint::new(x, plot.top),
                ScreenPoint::new(x, plot.bottom()),
                GRID_COLOR,
                PEN_WIDTH,
                LineStyle::Dotted,
            ),
        );
        plan.push(
            Layer::Axes,
            Primitive::text(ScreenPoint::new(x, label_y), axis_time_label(bar.timestamp, intraday), AXIS_TEXT_COLOR, TextAnchor::Center),
        );
    }

    plan.push(
        Layer::Axes,
        Primitive::Rect {
            min: ScreenPoint::new(plot.left, plot.top),
            max: ScreenPoint::new(plot.right(), plot.bottom()),
            color: GRID_COLOR,
            width: PEN_WIDTH,
        },
    );
}

/// Filled label on the price axis at the close of the newest visible bar.
pub fn push_last_price_marker(plan: &mut DrawPlan, transform: &Transform, series: &SeriesBuffer, color: Rgba) {
    let Some(index) = transform.visible_range().last() else { return };
    let Some(bar) = series.at(index) else { return };

    let y = transform.price_to_y(bar.close);
    let plot = transform.plot;
    if y < plot.top || y > plot.bottom() {
        return;
    }
    push_axis_label(plan, Layer::Axes, plot, y, format_price(bar.close, 2), color);
}

/// Crosshair lines and the two floating labels.
pub fn push_crosshair(plan: &mut DrawPlan, transform: &Transform, series: &SeriesBuffer, pointer: ScreenPoint) {
    let plot = transform.plot;
    if !plot.contains(pointer) {
        return;
    }

    let range = transform.visible_range();
    let index = (transform.x_to_index(pointer.x).round().max(0.0) as usize).clamp(range.start, range.end - 1);
    let x = transform.index_to_x(index as f64);

    plan.push(
        Layer::Crosshair,
        Primitive::line(ScreenPoint::new(x, plot.top), ScreenPoint::new(x, plot.bottom()), CURSOR_COLOR, PEN_WIDTH),
    );
    plan.push(
        Layer::Crosshair,
        Primitive::line(
            ScreenPoint::new(plot.left, pointer.y),
            ScreenPoint::new(plot.right(), pointer.y),
            CURSOR_COLOR,
            PEN_WIDTH,
        ),
    );

    let price = transform.y_to_price(pointer.y);
    push_axis_label(plan, Layer::Crosshair, plot, pointer.y, format_price(price, 2), CURSOR_COLOR);

    if let Some(bar) = series.at(index) {
        let half = TIME_LABEL_WIDTH * 0.5;
        let center_x = x.clamp(plot.left + half, (plot.right() - half).max(plot.left + half));
        let min = ScreenPoint::new(center_x - half, plot.bottom());
        let max = ScreenPoint::new(center_x + half, plot.bottom() + TIME_LABEL_HEIGHT);
        plan.push(Layer::Crosshair, Primitive::FilledRect { min, max, color: CURSOR_COLOR });
        plan.push(
            Layer::Crosshair,
            Primitive::text(
                ScreenPoint::new(center_x, plot.bottom() + TIME_LABEL_HEIGHT * 0.5),
                crosshair_time_label(bar.timestamp),
                LABEL_TEXT_COLOR,
                TextAnchor::Center,
            ),
        );
    }
}

/// Placeholder shown when there is nothing to chart.
pub fn push_empty_message(plan: &mut DrawPlan) {
    let plot = plan.plot;
    let center = ScreenPoint::new(plot.left + plot.width * 0.5, plot.top + plot.height * 0.5);
    plan.push(Layer::Axes, Primitive::text(center, "No data", EMPTY_TEXT_COLOR, TextAnchor::Center));
}

fn push_axis_label(plan: &mut DrawPlan, layer: Layer, plot: PlotRect, y: f32, text: String, color: Rgba) {
    let min = ScreenPoint::new(plot.right() + 1.0, y - PRICE_LABEL_HEIGHT * 0.5);
    let max = ScreenPoint::new(plot.right() + 1.0 + PRICE_LABEL_WIDTH, y + PRICE_LABEL_HEIGHT * 0.5);
    plan.push(layer, Primitive::FilledRect { min, max, color });
    plan.push(
        layer,
        Primitive::text(ScreenPoint::new(plot.right() + 4.0, y), text, LABEL_TEXT_COLOR, TextAnchor::LeftCenter),
    );
}

/// X-axis label: clock time for intraday charts, day and month otherwise.
pub fn axis_time_label(timestamp: DateTime<Utc>, intraday: bool) -> String {
    if intraday {
        timestamp.format("%H:%M").to_string()
    } else {
        timestamp.format("%d %b").to_string()
    }
}

pub fn crosshair_time_label(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%d %b %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::series::tests::make_bars;
    use crate::chart::viewport::Viewport;
    use chrono::TimeZone;

    fn setup() -> (SeriesBuffer, Viewport) {
        let mut series = SeriesBuffer::new();
        series.replace(make_bars(400, |i| 100.0 + (i % 30) as f64)).unwrap();
        let mut viewport = Viewport::new();
        viewport.resize(1000.0, 600.0);
        viewport.set_series_len(series.len());
        (series, viewport)
    }

    #[test]
    fn test_time_labels() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
        assert_eq!(axis_time_label(ts, true), "14:30");
        assert_eq!(axis_time_label(ts, false), "05 Mar");
        assert_eq!(crosshair_time_label(ts), "05 Mar 14:30");
    }

    #[test]
    fn test_grid_and_axes() {
        let (series, viewport) = setup();
        let transform = viewport.transform(&series).unwrap();
        let mut plan = DrawPlan::new(1000.0, 600.0, viewport.plot());
        push_grid_and_axes(&mut plan, &transform, &series, true);

        let price_labels = plan
            .layer(Layer::Axes)
            .iter()
            .filter(|p| matches!(p, Primitive::Text { anchor: TextAnchor::LeftCenter, .. }))
            .count();
        let time_labels = plan
            .layer(Layer::Axes)
            .iter()
            .filter(|p| matches!(p, Primitive::Text { anchor: TextAnchor::Center, .. }))
            .count();

        assert!(price_labels >= 2);
        assert!((TIME_LABELS..=TIME_LABELS + 1).contains(&time_labels));
        assert!(!plan.layer(Layer::Grid).is_empty());
    }

    #[test]
    fn test_crosshair_only_inside_plot() {
        let (series, viewport) = setup();
        let transform = viewport.transform(&series).unwrap();
        let mut plan = DrawPlan::new(1000.0, 600.0, viewport.plot());

        push_crosshair(&mut plan, &transform, &series, ScreenPoint::new(2.0, 2.0));
        assert!(plan.layer(Layer::Crosshair).is_empty());

        push_crosshair(&mut plan, &transform, &series, ScreenPoint::new(400.0, 300.0));
        let texts: Vec<_> = plan
            .layer(Layer::Crosshair)
            .iter()
            .filter_map(|p| match p {
                Primitive::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(texts.len(), 2);
    }

    #[test]
    fn test_last_price_marker() {
        let (series, viewport) = setup();
        let transform = viewport.transform(&series).unwrap();
        let mut plan = DrawPlan::new(1000.0, 600.0, viewport.plot());
        push_last_price_marker(&mut plan, &transform, &series, AXIS_TEXT_COLOR);

        let close = series.last().unwrap().close;
        assert!(plan.layer(Layer::Axes).iter().any(|p| matches!(
            p,
            Primitive::Text { text, .. } if *text == format_price(close, 2)
        )));
    }

    #[test]
    fn test_primitives_follow_layer_order() {
        let plot = PlotRect::from_surface(800.0, 500.0);
        let mut plan = DrawPlan::new(800.0, 500.0, plot);
        let p = ScreenPoint::default();
        plan.push(Layer::Crosshair, Primitive::line(p, p, CURSOR_COLOR, 1.0));
        plan.push(Layer::Grid, Primitive::line(p, p, GRID_COLOR, 1.0));

        let colors: Vec<_> = plan
            .primitives()
            .map(|p| match p {
                Primitive::Line { color, .. } => *color,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(colors, vec![GRID_COLOR, CURSOR_COLOR]);
        assert_eq!(plan.len(), 2);
    }
}
