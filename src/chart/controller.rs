//! Interaction state machine of the chart.
//!
//! [`InteractionController`] owns the series, viewport, annotations and
//! the active overlay. The render surface forwards [`InputEvent`]s, drains
//! [`OutputEvent`]s with [`InteractionController::take_events`] and paints
//! the [`DrawPlan`] returned by [`InteractionController::draw_plan`].

use std::fmt;

use super::annotation::{AnnotationId, AnnotationStore, DragReference, Handle, NormalizedPoint};
use super::base::{
    ANNOTATION_COLOR, ANNOTATION_WIDTH, AXIS_TEXT_COLOR, DOWN_COLOR, HANDLE_RADIUS, HIT_TOLERANCE, SELECTED_COLOR,
    UP_COLOR,
};
use super::indicator::{Indicator, IndicatorSeries};
use super::item::{draw_overlay, item_for};
use super::plan::{
    push_crosshair, push_empty_message, push_grid_and_axes, push_last_price_marker, DrawPlan, Layer, LineStyle,
    Primitive, TextAnchor,
};
use super::series::{Bar, InvalidSeriesError, SeriesBuffer};
use super::viewport::{DataPoint, ScreenPoint, Transform, Viewport};
use crate::terminal::{ChartConfig, ChartType, Timeframe};

/// Kinds of drawing tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Trendline,
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolKind::Trendline => write!(f, "Trendline"),
        }
    }
}

/// Drawing tool chosen on the toolbar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolSelection {
    #[default]
    None,
    Tool(ToolKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// Keyboard commands forwarded by the render surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    Escape,
    Delete,
}

/// Raw input forwarded by the render surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { pos: ScreenPoint, button: PointerButton },
    PointerMove { pos: ScreenPoint },
    PointerUp { pos: ScreenPoint, button: PointerButton },
    PointerLeave,
    /// Positive notches scroll up and zoom in
    Wheel { notches: f32 },
    Resize { width: f32, height: f32 },
    Key(KeyCommand),
}

/// Cursor shapes the controller may ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorShape {
    Arrow,
    ClosedHand,
}

/// Notifications for the surrounding UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEvent {
    /// The tool was deactivated; its toolbar button should un-highlight
    ToolFinished(ToolKind),
    CursorChanged(CursorShape),
}

/// Pointer position of the previous pan step and the sub-bar remainder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanReference {
    pub last: ScreenPoint,
    pub carry: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionState {
    Idle,
    PanningViewport(PanReference),
    CreatingAnnotation {
        tool: ToolKind,
        start: DataPoint,
    },
    DraggingAnnotationEndpoint {
        id: AnnotationId,
        handle: Handle,
        reference: DragReference,
    },
}

impl InteractionState {
    pub fn is_dragging(&self) -> bool {
        matches!(
            self,
            InteractionState::PanningViewport(_) | InteractionState::DraggingAnnotationEndpoint { .. }
        )
    }
}

/// Top-level chart state machine
pub struct InteractionController {
    series: SeriesBuffer,
    viewport: Viewport,
    annotations: AnnotationStore,
    indicator: Indicator,
    overlay: Option<IndicatorSeries>,
    chart_type: ChartType,
    timeframe: Timeframe,
    tool: ToolSelection,
    state: InteractionState,
    pointer: Option<ScreenPoint>,
    zoom_speed: i64,
    scroll_speed: f64,
    events: Vec<OutputEvent>,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(&ChartConfig::default())
    }
}

impl InteractionController {
    pub fn new(config: &ChartConfig) -> Self {
        let mut viewport = Viewport::new();
        viewport.set_visible_count(config.visible_count);

        Self {
            series: SeriesBuffer::new(),
            viewport,
            annotations: AnnotationStore::new(),
            indicator: config.indicator,
            overlay: None,
            chart_type: config.chart_type,
            timeframe: config.timeframe,
            tool: ToolSelection::None,
            state: InteractionState::Idle,
            pointer: None,
            zoom_speed: config.zoom_speed,
            scroll_speed: config.scroll_speed,
            events: Vec::new(),
        }
    }

    pub fn series(&self) -> &SeriesBuffer {
        &self.series
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn annotations(&self) -> &AnnotationStore {
        &self.annotations
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn tool(&self) -> ToolSelection {
        self.tool
    }

    pub fn indicator(&self) -> Indicator {
        self.indicator
    }

    pub fn overlay(&self) -> Option<&IndicatorSeries> {
        self.overlay.as_ref()
    }

    pub fn chart_type(&self) -> ChartType {
        self.chart_type
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// Current frame transform, `None` while there is nothing to show.
    pub fn transform(&self) -> Option<Transform> {
        self.viewport.transform(&self.series)
    }

    /// Install a freshly fetched series.
    ///
    /// On success the newest bars come into view, a locked price range is
    /// released and the overlay is recomputed. A rejected series leaves the
    /// chart untouched.
    pub fn replace_series(&mut self, bars: Vec<Bar>) -> Result<(), InvalidSeriesError> {
        if let Err(e) = self.series.replace(bars) {
            tracing::warn!(error = %e, "rejected bar series");
            return Err(e);
        }

        self.viewport.set_series_len(self.series.len());
        self.viewport.scroll_to_newest();
        self.viewport.unlock_price_range();
        self.recompute_overlay();
        tracing::info!(bars = self.series.len(), "series replaced");
        Ok(())
    }

    /// Extend the series with newer bars, keeping the scroll position.
    pub fn append_bars(&mut self, bars: Vec<Bar>) -> Result<usize, InvalidSeriesError> {
        let appended = self.series.append(bars)?;
        if appended > 0 {
            self.viewport.set_series_len(self.series.len());
            self.recompute_overlay();
            tracing::debug!(appended, bars = self.series.len(), "series extended");
        }
        Ok(appended)
    }

    /// Select the overlay; it replaces any previous one.
    pub fn set_indicator(&mut self, indicator: Indicator) {
        self.indicator = indicator;
        self.recompute_overlay();
    }

    pub fn set_chart_type(&mut self, chart_type: ChartType) {
        self.chart_type = chart_type;
    }

    pub fn set_timeframe(&mut self, timeframe: Timeframe) {
        self.timeframe = timeframe;
    }

    /// Activate or clear a drawing tool. A creation in progress is dropped.
    pub fn set_tool(&mut self, tool: ToolSelection) {
        if matches!(self.state, InteractionState::CreatingAnnotation { .. }) {
            self.state = InteractionState::Idle;
        }
        self.tool = tool;
    }

    pub fn clear_annotations(&mut self) {
        self.annotations.clear();
    }

    /// Drain the notifications produced since the last call.
    pub fn take_events(&mut self) -> Vec<OutputEvent> {
        std::mem::take(&mut self.events)
    }

    fn recompute_overlay(&mut self) {
        self.overlay = self.indicator.compute(&self.series);
        if self.overlay.is_none() && self.indicator != Indicator::None {
            tracing::debug!(indicator = %self.indicator, bars = self.series.len(), "overlay unavailable");
        }
    }

    fn set_state(&mut self, state: InteractionState) {
        if std::mem::discriminant(&self.state) != std::mem::discriminant(&state) {
            tracing::debug!(from = ?self.state, to = ?state, "interaction state changed");
        }
        self.state = state;
    }

    /// Process one input event. Returns true when the chart needs a redraw.
    pub fn handle_event(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::PointerDown { pos, button } => {
                self.pointer = Some(pos);
                match button {
                    PointerButton::Primary => self.on_primary_down(pos),
                    PointerButton::Secondary => self.on_secondary_down(pos),
                }
            }
            InputEvent::PointerMove { pos } => {
                self.pointer = Some(pos);
                self.on_pointer_move(pos);
                true
            }
            InputEvent::PointerUp { .. } => self.on_pointer_up(),
            InputEvent::PointerLeave => {
                self.pointer = None;
                true
            }
            InputEvent::Wheel { notches } => self.on_wheel(notches),
            InputEvent::Resize { width, height } => {
                self.viewport.resize(width, height);
                true
            }
            InputEvent::Key(key) => self.on_key(key),
        }
    }

    fn on_primary_down(&mut self, pos: ScreenPoint) -> bool {
        let Some(transform) = self.transform() else { return false };
        let len = self.series.len();

        match self.state {
            InteractionState::CreatingAnnotation { tool, start } => {
                if !transform.plot.contains(pos) {
                    return false;
                }
                let end = transform.screen_to_data(pos);
                let start_y = transform.price_to_y(start.price);
                if start.index.round() == end.index.round() && (start_y - pos.y).abs() < 1.0 {
                    tracing::debug!("zero-length trendline discarded");
                    self.set_state(InteractionState::Idle);
                    return true;
                }

                let id = self
                    .annotations
                    .add(NormalizedPoint::from_data(start, len), NormalizedPoint::from_data(end, len));
                self.annotations.select(Some(id));
                self.set_state(InteractionState::Idle);
                self.tool = ToolSelection::None;
                self.events.push(OutputEvent::ToolFinished(tool));
                tracing::info!(tool = %tool, id = id.value(), "annotation created");
                true
            }
            InteractionState::Idle => {
                if let ToolSelection::Tool(tool) = self.tool {
                    if !transform.plot.contains(pos) {
                        return false;
                    }
                    self.annotations.select(None);
                    self.set_state(InteractionState::CreatingAnnotation {
                        tool,
                        start: transform.screen_to_data(pos),
                    });
                    return true;
                }

                if let Some(hit) = self.annotations.find_near(pos, HIT_TOLERANCE, &transform, len) {
                    let Some(annotation) = self.annotations.get(hit.id) else { return false };
                    let reference = DragReference::capture(pos, annotation, &transform, len);
                    self.annotations.select(Some(hit.id));
                    self.viewport.lock_price_range(&self.series);
                    self.set_state(InteractionState::DraggingAnnotationEndpoint {
                        id: hit.id,
                        handle: hit.handle,
                        reference,
                    });
                    return true;
                }

                self.annotations.select(None);
                if transform.plot.contains(pos) {
                    self.set_state(InteractionState::PanningViewport(PanReference { last: pos, carry: 0.0 }));
                    self.events.push(OutputEvent::CursorChanged(CursorShape::ClosedHand));
                }
                true
            }
            InteractionState::PanningViewport(_) | InteractionState::DraggingAnnotationEndpoint { .. } => false,
        }
    }

    fn on_secondary_down(&mut self, pos: ScreenPoint) -> bool {
        if self.state != InteractionState::Idle {
            return false;
        }
        let Some(transform) = self.transform() else { return false };

        match self.annotations.find_near(pos, HIT_TOLERANCE, &transform, self.series.len()) {
            Some(hit) => {
                self.annotations.remove(hit.id);
                tracing::info!(id = hit.id.value(), "annotation deleted");
                true
            }
            None => false,
        }
    }

    fn on_pointer_move(&mut self, pos: ScreenPoint) {
        match self.state {
            InteractionState::PanningViewport(reference) => {
                let dx = pos.x - reference.last.x;
                let dy = pos.y - reference.last.y;

                let bars = dx as f64 * self.scroll_speed + reference.carry;
                let whole = bars.trunc();
                if whole != 0.0 {
                    self.viewport.scroll_by(whole as i64);
                }
                self.viewport.pan_vertically_by(dy);
                self.state = InteractionState::PanningViewport(PanReference {
                    last: pos,
                    carry: bars - whole,
                });
            }
            InteractionState::DraggingAnnotationEndpoint { id, handle, reference } => {
                if let Some(transform) = self.transform() {
                    let len = self.series.len();
                    self.annotations.update_endpoint(id, handle, pos, &reference, &transform, len);
                }
            }
            InteractionState::Idle | InteractionState::CreatingAnnotation { .. } => {}
        }
    }

    fn on_pointer_up(&mut self) -> bool {
        match self.state {
            InteractionState::PanningViewport(_) => {
                self.set_state(InteractionState::Idle);
                self.events.push(OutputEvent::CursorChanged(CursorShape::Arrow));
                true
            }
            InteractionState::DraggingAnnotationEndpoint { .. } => {
                self.set_state(InteractionState::Idle);
                self.viewport.unlock_price_range();
                true
            }
            InteractionState::Idle | InteractionState::CreatingAnnotation { .. } => false,
        }
    }

    fn on_wheel(&mut self, notches: f32) -> bool {
        if self.state.is_dragging() || self.series.is_empty() || notches == 0.0 {
            return false;
        }
        self.viewport.zoom_by(notches, self.zoom_speed)
    }

    fn on_key(&mut self, key: KeyCommand) -> bool {
        if self.state.is_dragging() {
            return false;
        }

        match key {
            KeyCommand::Left => self.viewport.scroll_by(1),
            KeyCommand::Right => self.viewport.scroll_by(-1),
            KeyCommand::Up => return self.on_wheel(1.0),
            KeyCommand::Down => return self.on_wheel(-1.0),
            KeyCommand::Home => self.viewport.scroll_to_oldest(),
            KeyCommand::End => {
                self.viewport.scroll_to_newest();
                self.viewport.reset_vertical_offset();
            }
            KeyCommand::Escape => {
                let ToolSelection::Tool(tool) = self.tool else { return false };
                self.set_tool(ToolSelection::None);
                self.events.push(OutputEvent::ToolFinished(tool));
            }
            KeyCommand::Delete => {
                let Some(id) = self.annotations.remove_selected() else { return false };
                tracing::info!(id = id.value(), "annotation deleted");
            }
        }
        true
    }

    /// Describe the current frame.
    pub fn draw_plan(&self) -> DrawPlan {
        let (width, height) = self.viewport.surface();
        let mut plan = DrawPlan::new(width, height, self.viewport.plot());

        let Some(transform) = self.transform() else {
            push_empty_message(&mut plan);
            return plan;
        };

        push_grid_and_axes(&mut plan, &transform, &self.series, self.timeframe.is_intraday());

        let item = item_for(self.chart_type);
        item.draw(&mut plan, &self.series, &transform);

        if let Some(overlay) = &self.overlay {
            draw_overlay(&mut plan, overlay, &transform);
        }

        let last = transform.visible_range().end - 1;
        let marker_color = match self.series.at(last) {
            Some(bar) if !bar.is_up() => DOWN_COLOR,
            _ => UP_COLOR,
        };
        push_last_price_marker(&mut plan, &transform, &self.series, marker_color);

        self.push_annotations(&mut plan, &transform);

        // Info line for the hovered bar, or the newest visible one
        let hovered = self
            .pointer
            .filter(|p| transform.plot.contains(*p))
            .and_then(|p| transform.bar_at(p.x))
            .unwrap_or(last);
        let mut info = item.info_text(&self.series, hovered);
        if let Some(value) = self.overlay.as_ref().and_then(|o| o.value_at(hovered)) {
            info.push_str(&format!("  {} {:.2}", self.indicator, value));
        }
        plan.push(
            Layer::Axes,
            Primitive::text(
                ScreenPoint::new(transform.plot.left + 4.0, transform.plot.top - 12.0),
                info,
                AXIS_TEXT_COLOR,
                TextAnchor::LeftCenter,
            ),
        );

        if let Some(pointer) = self.pointer {
            if !self.state.is_dragging() {
                push_crosshair(&mut plan, &transform, &self.series, pointer);
            }
        }

        plan
    }

    fn push_annotations(&self, plan: &mut DrawPlan, transform: &Transform) {
        let len = self.series.len();
        let selected = self.annotations.selected();

        for annotation in self.annotations.iter() {
            let (start, end) = annotation.to_screen(transform, len);
            let is_selected = selected == Some(annotation.id);
            let color = if is_selected { SELECTED_COLOR } else { ANNOTATION_COLOR };

            plan.push(Layer::Annotations, Primitive::line(start, end, color, ANNOTATION_WIDTH));
            if is_selected {
                for center in [start, end] {
                    plan.push(Layer::Annotations, Primitive::Handle { center, radius: HANDLE_RADIUS, color });
                }
            }
        }

        if let (InteractionState::CreatingAnnotation { start, .. }, Some(pointer)) = (self.state, self.pointer) {
            let anchor = transform.data_to_screen(start.index, start.price);
            plan.push(
                Layer::Annotations,
                Primitive::styled_line(anchor, pointer, ANNOTATION_COLOR, ANNOTATION_WIDTH, LineStyle::Dashed),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::series::tests::make_bars;

    const WIDTH: f32 = 1000.0;
    const HEIGHT: f32 = 600.0;

    fn controller(len: usize) -> InteractionController {
        let mut controller = InteractionController::default();
        controller.handle_event(InputEvent::Resize { width: WIDTH, height: HEIGHT });
        controller
            .replace_series(make_bars(len, |i| 100.0 + (i % 100) as f64 * 0.6))
            .unwrap();
        controller
    }

    fn screen(controller: &InteractionController, index: f64, price: f64) -> ScreenPoint {
        controller.transform().unwrap().data_to_screen(index, price)
    }

    fn click(controller: &mut InteractionController, pos: ScreenPoint) {
        controller.handle_event(InputEvent::PointerDown { pos, button: PointerButton::Primary });
        controller.handle_event(InputEvent::PointerUp { pos, button: PointerButton::Primary });
    }

    fn draw_trendline(controller: &mut InteractionController) -> AnnotationId {
        controller.set_tool(ToolSelection::Tool(ToolKind::Trendline));
        let a = screen(controller, 900.0, 150.0);
        let b = screen(controller, 950.0, 155.0);
        click(controller, a);
        click(controller, b);
        controller.annotations().iter().last().unwrap().id
    }

    #[test]
    fn test_thousand_bar_scenario() {
        let mut controller = controller(1000);
        assert_eq!(controller.viewport().visible_slice(), 850..1000);

        assert!(controller.handle_event(InputEvent::Wheel { notches: 3.0 }));
        assert_eq!(controller.viewport().visible_count(), 100);
        assert_eq!(controller.viewport().visible_slice(), 900..1000);
    }

    #[test]
    fn test_smooth_wheel_zooms() {
        let mut controller = controller(1000);
        for _ in 0..64 {
            controller.handle_event(InputEvent::Wheel { notches: 0.03125 });
        }
        assert_eq!(controller.viewport().visible_count(), 110);

        assert!(controller.handle_event(InputEvent::Wheel { notches: 1.0 }));
        assert_eq!(controller.viewport().visible_count(), 100);
        // Already at the floor, nothing to redraw
        assert!(!controller.handle_event(InputEvent::Wheel { notches: 1.0 }));
        assert!(!controller.handle_event(InputEvent::Key(KeyCommand::Up)));
    }

    #[test]
    fn test_create_trendline() {
        let mut controller = controller(1000);
        let id = draw_trendline(&mut controller);

        let annotation = controller.annotations().get(id).unwrap();
        assert_eq!(annotation.start.x, 0.9);
        assert_eq!(annotation.end.x, 0.95);
        assert!((annotation.start.price - 150.0).abs() < 1e-3);
        assert!((annotation.end.price - 155.0).abs() < 1e-3);

        assert_eq!(controller.tool(), ToolSelection::None);
        assert_eq!(*controller.state(), InteractionState::Idle);
        assert_eq!(controller.annotations().selected(), Some(id));
        assert_eq!(controller.take_events(), vec![OutputEvent::ToolFinished(ToolKind::Trendline)]);
        assert!(controller.take_events().is_empty());
    }

    #[test]
    fn test_trendline_survives_growth() {
        let mut controller = controller(1000);
        let id = draw_trendline(&mut controller);

        let all = make_bars(1100, |i| 100.0 + (i % 100) as f64 * 0.6);
        assert_eq!(controller.append_bars(all[1000..].to_vec()).unwrap(), 100);

        let annotation = controller.annotations().get(id).unwrap();
        assert_eq!(annotation.start.bar_index(controller.series().len()), 990);
        assert!((annotation.start.price - 150.0).abs() < 1e-3);
    }

    #[test]
    fn test_degenerate_second_click_cancels() {
        let mut controller = controller(1000);
        controller.set_tool(ToolSelection::Tool(ToolKind::Trendline));
        let a = screen(&controller, 920.0, 140.0);

        click(&mut controller, a);
        assert!(matches!(controller.state(), InteractionState::CreatingAnnotation { .. }));
        click(&mut controller, a);

        assert!(controller.annotations().is_empty());
        assert_eq!(*controller.state(), InteractionState::Idle);
        assert_eq!(controller.tool(), ToolSelection::Tool(ToolKind::Trendline));
        assert!(controller.take_events().is_empty());
    }

    #[test]
    fn test_creation_preview_is_dashed() {
        let mut controller = controller(1000);
        controller.set_tool(ToolSelection::Tool(ToolKind::Trendline));
        let anchor = screen(&controller, 900.0, 140.0);
        click(&mut controller, anchor);
        controller.handle_event(InputEvent::PointerMove { pos: screen(&controller, 930.0, 145.0) });

        let plan = controller.draw_plan();
        assert!(plan.layer(Layer::Annotations).iter().any(|p| matches!(
            p,
            Primitive::Line { style: LineStyle::Dashed, .. }
        )));
    }

    #[test]
    fn test_escape_cancels_tool() {
        let mut controller = controller(1000);
        controller.set_tool(ToolSelection::Tool(ToolKind::Trendline));
        let anchor = screen(&controller, 900.0, 140.0);
        click(&mut controller, anchor);

        assert!(controller.handle_event(InputEvent::Key(KeyCommand::Escape)));
        assert_eq!(*controller.state(), InteractionState::Idle);
        assert_eq!(controller.tool(), ToolSelection::None);
        assert_eq!(controller.take_events(), vec![OutputEvent::ToolFinished(ToolKind::Trendline)]);
        assert!(!controller.handle_event(InputEvent::Key(KeyCommand::Escape)));
    }

    #[test]
    fn test_drag_endpoint_locks_range() {
        let mut controller = controller(1000);
        let id = draw_trendline(&mut controller);
        let start = screen(&controller, 900.0, 150.0);

        controller.handle_event(InputEvent::PointerDown { pos: start, button: PointerButton::Primary });
        assert!(matches!(
            controller.state(),
            InteractionState::DraggingAnnotationEndpoint { handle: Handle::Start, .. }
        ));
        assert!(controller.viewport().is_price_range_locked());

        let target = screen(&controller, 880.0, 130.0);
        controller.handle_event(InputEvent::PointerMove { pos: target });
        // No crosshair while dragging
        assert!(controller.draw_plan().layer(Layer::Crosshair).is_empty());

        controller.handle_event(InputEvent::PointerUp { pos: target, button: PointerButton::Primary });
        assert_eq!(*controller.state(), InteractionState::Idle);
        assert!(!controller.viewport().is_price_range_locked());

        let annotation = controller.annotations().get(id).unwrap();
        assert_eq!(annotation.start.bar_index(1000), 880);
        assert!((annotation.start.price - 130.0).abs() < 1e-3);
        assert_eq!(annotation.end.x, 0.95);
    }

    #[test]
    fn test_wheel_ignored_while_dragging() {
        let mut controller = controller(1000);
        draw_trendline(&mut controller);
        let start = screen(&controller, 900.0, 150.0);

        controller.handle_event(InputEvent::PointerDown { pos: start, button: PointerButton::Primary });
        assert!(!controller.handle_event(InputEvent::Wheel { notches: 2.0 }));
        assert_eq!(controller.viewport().visible_count(), 150);
    }

    #[test]
    fn test_pan_scrolls_with_carry() {
        let mut controller = controller(1000);
        let origin = ScreenPoint::new(300.0, 300.0);

        controller.handle_event(InputEvent::PointerDown { pos: origin, button: PointerButton::Primary });
        assert!(matches!(controller.state(), InteractionState::PanningViewport(_)));
        assert_eq!(controller.take_events(), vec![OutputEvent::CursorChanged(CursorShape::ClosedHand)]);

        // Dragging right goes back in history
        controller.handle_event(InputEvent::PointerMove { pos: origin.offset(20.0, 0.0) });
        assert_eq!(controller.viewport().scroll_offset(), 10);

        // Slow one pixel steps still add up
        for step in 1..=4 {
            controller.handle_event(InputEvent::PointerMove { pos: origin.offset(20.0 + step as f32, 0.0) });
        }
        assert_eq!(controller.viewport().scroll_offset(), 12);

        controller.handle_event(InputEvent::PointerMove { pos: origin.offset(24.0, 30.0) });
        assert_eq!(controller.viewport().vertical_offset(), 30.0);

        controller.handle_event(InputEvent::PointerUp { pos: origin, button: PointerButton::Primary });
        assert_eq!(*controller.state(), InteractionState::Idle);
        assert_eq!(controller.take_events(), vec![OutputEvent::CursorChanged(CursorShape::Arrow)]);
    }

    #[test]
    fn test_right_click_deletes() {
        let mut controller = controller(1000);
        draw_trendline(&mut controller);
        let end = screen(&controller, 950.0, 155.0);

        assert!(!controller.handle_event(InputEvent::PointerDown {
            pos: end.offset(0.0, 200.0),
            button: PointerButton::Secondary,
        }));
        assert_eq!(controller.annotations().len(), 1);

        assert!(controller.handle_event(InputEvent::PointerDown { pos: end, button: PointerButton::Secondary }));
        assert!(controller.annotations().is_empty());
        assert_eq!(*controller.state(), InteractionState::Idle);
    }

    #[test]
    fn test_delete_key_removes_selection() {
        let mut controller = controller(1000);
        draw_trendline(&mut controller);

        assert!(controller.handle_event(InputEvent::Key(KeyCommand::Delete)));
        assert!(controller.annotations().is_empty());
        assert!(!controller.handle_event(InputEvent::Key(KeyCommand::Delete)));
    }

    #[test]
    fn test_click_on_empty_space_clears_selection() {
        let mut controller = controller(1000);
        draw_trendline(&mut controller);
        assert!(controller.annotations().selected().is_some());

        click(&mut controller, ScreenPoint::new(100.0, 100.0));
        assert_eq!(controller.annotations().selected(), None);
    }

    #[test]
    fn test_keyboard_navigation() {
        let mut controller = controller(1000);

        controller.handle_event(InputEvent::Key(KeyCommand::Left));
        assert_eq!(controller.viewport().scroll_offset(), 1);
        controller.handle_event(InputEvent::Key(KeyCommand::Right));
        assert_eq!(controller.viewport().scroll_offset(), 0);

        controller.handle_event(InputEvent::Key(KeyCommand::Home));
        assert_eq!(controller.viewport().visible_slice(), 0..150);

        controller.handle_event(InputEvent::Key(KeyCommand::Down));
        assert_eq!(controller.viewport().visible_count(), 170);
        controller.handle_event(InputEvent::Key(KeyCommand::Up));
        assert_eq!(controller.viewport().visible_count(), 150);

        controller.handle_event(InputEvent::Key(KeyCommand::End));
        assert_eq!(controller.viewport().visible_slice(), 850..1000);
    }

    #[test]
    fn test_replace_resets_view() {
        let mut controller = controller(1000);
        controller.handle_event(InputEvent::Key(KeyCommand::Home));
        controller.viewport.lock_price_range(&controller.series);

        controller
            .replace_series(make_bars(600, |i| 50.0 + i as f64 * 0.01))
            .unwrap();
        assert_eq!(controller.viewport().scroll_offset(), 0);
        assert!(!controller.viewport().is_price_range_locked());
        assert_eq!(controller.overlay().unwrap().values().len(), 600);
    }

    #[test]
    fn test_rejected_series_keeps_chart() {
        let mut controller = controller(1000);
        let mut bars = make_bars(10, |_| 1.0);
        bars.swap(2, 3);

        assert!(controller.replace_series(bars).is_err());
        assert_eq!(controller.series().len(), 1000);
    }

    #[test]
    fn test_indicator_switch() {
        let mut controller = controller(1000);
        assert_eq!(controller.overlay().map(|o| o.indicator), Some(Indicator::Ema(25)));

        controller.set_indicator(Indicator::Sma(20));
        assert_eq!(controller.overlay().unwrap().offset(), 19);

        controller.set_indicator(Indicator::None);
        assert!(controller.overlay().is_none());
        assert!(controller.draw_plan().layer(Layer::Overlays).is_empty());
    }

    #[test]
    fn test_crosshair_follows_pointer() {
        let mut controller = controller(1000);
        controller.handle_event(InputEvent::PointerMove { pos: ScreenPoint::new(400.0, 300.0) });
        assert!(!controller.draw_plan().layer(Layer::Crosshair).is_empty());

        controller.handle_event(InputEvent::PointerLeave);
        assert!(controller.draw_plan().layer(Layer::Crosshair).is_empty());
    }

    #[test]
    fn test_empty_chart_is_inert() {
        let mut controller = InteractionController::default();
        controller.handle_event(InputEvent::Resize { width: WIDTH, height: HEIGHT });

        assert!(!controller.handle_event(InputEvent::Wheel { notches: 1.0 }));
        assert!(!controller.handle_event(InputEvent::PointerDown {
            pos: ScreenPoint::new(300.0, 300.0),
            button: PointerButton::Primary,
        }));
        assert_eq!(*controller.state(), InteractionState::Idle);

        let plan = controller.draw_plan();
        assert!(plan.primitives().any(|p| matches!(p, Primitive::Text { text, .. } if text == "No data")));
    }

    #[test]
    fn test_selected_annotation_has_handles() {
        let mut controller = controller(1000);
        draw_trendline(&mut controller);

        let handles = controller
            .draw_plan()
            .layer(Layer::Annotations)
            .iter()
            .filter(|p| matches!(p, Primitive::Handle { .. }))
            .count();
        assert_eq!(handles, 2);
    }
}
