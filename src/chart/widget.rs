//! egui render surface for the chart.
//!
//! Forwards egui input to the [`InteractionController`] and paints the
//! resulting [`DrawPlan`] with the egui painter.

use egui::{
    Align2, Color32, CursorIcon, Event, FontId, Id, Key, MouseWheelUnit, Painter, PointerButton as EguiButton, Pos2, Rect,
    Response, Sense, Shape, Stroke, StrokeKind, Ui, Vec2,
};

use super::base::Rgba;
use super::controller::{
    CursorShape, InputEvent, InteractionController, KeyCommand, OutputEvent, PointerButton,
    ToolKind, ToolSelection,
};
use super::indicator::Indicator;
use super::plan::{DrawPlan, LineStyle, Primitive, TextAnchor};
use super::viewport::ScreenPoint;
use crate::terminal::{BarRequest, ChartConfig, ChartType, Timeframe};

/// Pixels of a smooth-scroll delta that count as one wheel notch
const POINTS_PER_NOTCH: f32 = 50.0;

fn to_color(rgba: Rgba) -> Color32 {
    Color32::from_rgba_unmultiplied(rgba[0], rgba[1], rgba[2], rgba[3])
}

/// Chart keys apply while the chart has focus, or while it is hovered and
/// no other widget (such as the symbol box) holds keyboard focus.
fn accepts_keys(focused: Option<Id>, chart: Id, hovered: bool) -> bool {
    match focused {
        Some(id) => id == chart,
        None => hovered,
    }
}

fn to_align(anchor: TextAnchor) -> Align2 {
    match anchor {
        TextAnchor::LeftCenter => Align2::LEFT_CENTER,
        TextAnchor::Center => Align2::CENTER_CENTER,
    }
}

/// Chart panel with toolbar
pub struct ChartWidget {
    controller: InteractionController,
    symbol: String,
    symbol_input: String,
    surface: Vec2,
    grabbing: bool,
    pointer_inside: bool,
    reload_requested: bool,
}

impl ChartWidget {
    pub fn new(config: &ChartConfig) -> Self {
        Self {
            controller: InteractionController::new(config),
            symbol: config.symbol.clone(),
            symbol_input: config.symbol.clone(),
            surface: Vec2::ZERO,
            grabbing: false,
            pointer_inside: false,
            reload_requested: true,
        }
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut InteractionController {
        &mut self.controller
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Query for the symbol and timeframe on screen
    pub fn request(&self) -> BarRequest {
        BarRequest::new(self.symbol.clone(), self.controller.timeframe())
    }

    /// Query to issue after the user switched symbol or timeframe.
    pub fn take_reload_request(&mut self) -> Option<BarRequest> {
        if std::mem::take(&mut self.reload_requested) {
            Some(self.request())
        } else {
            None
        }
    }

    /// Current toolbar selection as configuration
    pub fn config(&self, base: &ChartConfig) -> ChartConfig {
        ChartConfig {
            symbol: self.symbol.clone(),
            timeframe: self.controller.timeframe(),
            chart_type: self.controller.chart_type(),
            indicator: self.controller.indicator(),
            visible_count: self.controller.viewport().requested_count(),
            ..base.clone()
        }
    }

    /// Show the chart widget
    pub fn show(&mut self, ui: &mut Ui) -> Response {
        egui::TopBottomPanel::top("chart_toolbar").show_inside(ui, |ui| {
            self.show_toolbar(ui);
        });

        let available_size = ui.available_size();
        let (response, painter) = ui.allocate_painter(available_size, Sense::click_and_drag());

        if response.clicked() {
            response.request_focus();
        }

        let rect = response.rect;
        let mut changed = self.handle_input(ui, &response, rect);
        changed |= self.handle_output();

        if self.grabbing {
            ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
        } else if self.controller.tool() != ToolSelection::None && response.hovered() {
            ui.ctx().set_cursor_icon(CursorIcon::Crosshair);
        }

        self.paint(&painter, rect, &self.controller.draw_plan());

        if changed {
            ui.ctx().request_repaint();
        }
        response
    }

    fn show_toolbar(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.label("Symbol:");
            let edit = ui.add(egui::TextEdit::singleline(&mut self.symbol_input).desired_width(70.0));
            if edit.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) {
                let symbol = self.symbol_input.trim().to_uppercase();
                if !symbol.is_empty() && symbol != self.symbol {
                    tracing::info!(symbol = %symbol, "symbol changed");
                    self.symbol = symbol;
                    self.reload_requested = true;
                }
                self.symbol_input = self.symbol.clone();
            }

            ui.separator();

            let mut timeframe = self.controller.timeframe();
            egui::ComboBox::from_id_salt("chart_timeframe")
                .selected_text(timeframe.value())
                .show_ui(ui, |ui| {
                    for tf in Timeframe::all() {
                        ui.selectable_value(&mut timeframe, tf, tf.value());
                    }
                });
            if timeframe != self.controller.timeframe() {
                self.controller.set_timeframe(timeframe);
                self.reload_requested = true;
            }

            let mut chart_type = self.controller.chart_type();
            egui::ComboBox::from_id_salt("chart_type")
                .selected_text(chart_type.value())
                .show_ui(ui, |ui| {
                    for ct in ChartType::all() {
                        ui.selectable_value(&mut chart_type, ct, ct.value());
                    }
                });
            if chart_type != self.controller.chart_type() {
                self.controller.set_chart_type(chart_type);
            }

            let mut indicator = self.controller.indicator();
            egui::ComboBox::from_id_salt("chart_indicator")
                .selected_text(indicator.to_string())
                .show_ui(ui, |ui| {
                    for preset in Indicator::presets() {
                        ui.selectable_value(&mut indicator, preset, preset.to_string());
                    }
                });
            if indicator != self.controller.indicator() {
                self.controller.set_indicator(indicator);
            }

            ui.separator();

            let tool = ToolSelection::Tool(ToolKind::Trendline);
            let active = self.controller.tool() == tool;
            if ui.selectable_label(active, ToolKind::Trendline.to_string()).clicked() {
                self.controller.set_tool(if active { ToolSelection::None } else { tool });
            }

            if ui.button("Clear drawings").clicked() {
                self.controller.clear_annotations();
            }

            if let Some(bar) = self.controller.series().last() {
                ui.separator();
                ui.label(format!("{} {} {:.2}", self.symbol, self.controller.timeframe(), bar.close));
            }
        });
    }

    fn handle_input(&mut self, ui: &Ui, response: &Response, rect: Rect) -> bool {
        let mut changed = false;

        if rect.size() != self.surface {
            self.surface = rect.size();
            changed |= self.controller.handle_event(InputEvent::Resize {
                width: rect.width(),
                height: rect.height(),
            });
        }

        let local = |pos: Pos2| ScreenPoint::new(pos.x - rect.min.x, pos.y - rect.min.y);
        let dragging = self.controller.state().is_dragging();
        let hovered = response.hovered() || dragging;

        let events = ui.input(|i| i.events.clone());
        for event in events {
            let input = match event {
                Event::PointerButton { pos, button, pressed, .. } => {
                    let button = match button {
                        EguiButton::Primary => PointerButton::Primary,
                        EguiButton::Secondary => PointerButton::Secondary,
                        _ => continue,
                    };
                    if pressed && rect.contains(pos) {
                        InputEvent::PointerDown { pos: local(pos), button }
                    } else if !pressed {
                        InputEvent::PointerUp { pos: local(pos), button }
                    } else {
                        continue;
                    }
                }
                Event::PointerMoved(pos) if rect.contains(pos) || dragging => {
                    self.pointer_inside = true;
                    InputEvent::PointerMove { pos: local(pos) }
                }
                Event::PointerMoved(_) | Event::PointerGone if self.pointer_inside => {
                    self.pointer_inside = false;
                    InputEvent::PointerLeave
                }
                Event::MouseWheel { unit, delta, .. } if hovered => {
                    let notches = match unit {
                        MouseWheelUnit::Point => delta.y / POINTS_PER_NOTCH,
                        MouseWheelUnit::Line => delta.y,
                        MouseWheelUnit::Page => delta.y * 3.0,
                    };
                    InputEvent::Wheel { notches }
                }
                _ => continue,
            };
            changed |= self.controller.handle_event(input);
        }

        let focused = ui.memory(|m| m.focused());
        if accepts_keys(focused, response.id, response.hovered()) {
            let keys = [
                (Key::ArrowLeft, KeyCommand::Left),
                (Key::ArrowRight, KeyCommand::Right),
                (Key::ArrowUp, KeyCommand::Up),
                (Key::ArrowDown, KeyCommand::Down),
                (Key::Home, KeyCommand::Home),
                (Key::End, KeyCommand::End),
                (Key::Escape, KeyCommand::Escape),
                (Key::Delete, KeyCommand::Delete),
            ];
            for (key, command) in keys {
                if ui.input(|i| i.key_pressed(key)) {
                    changed |= self.controller.handle_event(InputEvent::Key(command));
                }
            }
        }

        changed
    }

    fn handle_output(&mut self) -> bool {
        let events = self.controller.take_events();
        for event in &events {
            match event {
                OutputEvent::CursorChanged(shape) => self.grabbing = *shape == CursorShape::ClosedHand,
                OutputEvent::ToolFinished(tool) => tracing::debug!(tool = %tool, "tool finished"),
            }
        }
        !events.is_empty()
    }

    fn paint(&self, painter: &Painter, rect: Rect, plan: &DrawPlan) {
        let origin = rect.min.to_vec2();
        let pos = |p: ScreenPoint| Pos2::new(p.x, p.y) + origin;

        painter.rect_filled(rect, 0.0, to_color(plan.background));

        for primitive in plan.primitives() {
            match primitive {
                Primitive::Line { from, to, color, width, style } => {
                    let stroke = Stroke::new(*width, to_color(*color));
                    let points = [pos(*from), pos(*to)];
                    match style {
                        LineStyle::Solid => {
                            painter.line_segment(points, stroke);
                        }
                        LineStyle::Dashed => {
                            painter.extend(Shape::dashed_line(&points, stroke, 6.0, 4.0));
                        }
                        LineStyle::Dotted => {
                            painter.extend(Shape::dashed_line(&points, stroke, 1.0, 3.0));
                        }
                    }
                }
                Primitive::Polyline { points, color, width } => {
                    let points: Vec<Pos2> = points.iter().map(|p| pos(*p)).collect();
                    painter.add(Shape::line(points, Stroke::new(*width, to_color(*color))));
                }
                Primitive::FilledRect { min, max, color } => {
                    painter.rect_filled(Rect::from_two_pos(pos(*min), pos(*max)), 2.0, to_color(*color));
                }
                Primitive::Rect { min, max, color, width } => {
                    painter.rect_stroke(
                        Rect::from_two_pos(pos(*min), pos(*max)),
                        0.0,
                        Stroke::new(*width, to_color(*color)),
                        StrokeKind::Inside,
                    );
                }
                Primitive::Text { pos: at, text, color, size, anchor } => {
                    painter.text(pos(*at), to_align(*anchor), text, FontId::proportional(*size + 3.0), to_color(*color));
                }
                Primitive::Handle { center, radius, color } => {
                    painter.circle_filled(pos(*center), *radius, to_color(*color));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_skip_focused_text_edit() {
        let chart = Id::new("chart");
        let symbol_box = Id::new("symbol");

        assert!(accepts_keys(None, chart, true));
        assert!(!accepts_keys(None, chart, false));
        assert!(accepts_keys(Some(chart), chart, false));
        assert!(!accepts_keys(Some(symbol_box), chart, true));
    }

    #[test]
    fn test_color_conversion() {
        assert_eq!(to_color([34, 34, 34, 255]), Color32::from_rgb(34, 34, 34));
        assert_eq!(to_align(TextAnchor::Center), Align2::CENTER_CENTER);
    }
}
