//! Force-directed canvas. Per frame: advance the simulation if it is still
//! hot, project world positions through pan/zoom, then paint edges under
//! nodes under labels. Input handling pins dragged nodes into the simulation
//! rather than moving them directly.

use eframe::egui::{
    Align2, Color32, CursorIcon, FontId, PointerButton, Pos2, Rect, Response, Sense, Stroke, Ui,
    vec2,
};

use super::{ViewModel, highlight, render_utils};
use crate::util::format_bytes;

const MIN_ZOOM: f32 = 0.2;
const MAX_ZOOM: f32 = 6.0;

impl ViewModel {
    pub(super) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) =
            ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        render_utils::draw_background(&painter, rect, self.pan, self.zoom);
        self.handle_zoom(ui, rect, &response);
        self.handle_pan(&response);

        if !self.force.is_settled() {
            self.force.tick();
            ui.ctx().request_repaint();
            painter.text(
                rect.left_bottom() + vec2(10.0, -10.0),
                Align2::LEFT_BOTTOM,
                format!("simulating  α {:.3}", self.force.alpha()),
                FontId::monospace(10.0),
                Color32::from_rgb(0x6b, 0x72, 0x80),
            );
        }

        let zoom_scale = self.zoom.powf(0.4);
        let (pan, zoom) = (self.pan, self.zoom);
        let positions: Vec<Pos2> = self
            .force
            .positions()
            .iter()
            .map(|&world| render_utils::world_to_screen(rect, pan, zoom, world))
            .collect();
        let radii: Vec<f32> = self
            .node_radii
            .iter()
            .map(|radius| (radius * zoom_scale).clamp(2.0, 40.0))
            .collect();

        let hovered = self.hovered_node(rect, &response, &positions, &radii);
        if hovered.is_some() {
            ui.ctx().set_cursor_icon(CursorIcon::PointingHand);
        }
        self.handle_node_drag(rect, &response, hovered);
        self.handle_clicks(&response, hovered);

        let search_set = highlight::search_matches(&self.tree, &self.search);
        let dep_set = highlight::dependency_matches(&self.tree, &self.resolved_deps);
        let selected_index = self
            .selection
            .selected_id()
            .and_then(|id| self.tree.index_of(id));

        let edge_stroke = Stroke::new(
            (1.0 * zoom_scale).clamp(0.5, 2.5),
            render_utils::EDGE_COLOR,
        );
        for &(parent, child) in &self.tree.edges {
            let a = positions[parent];
            let b = positions[child];
            if render_utils::circle_visible(rect, a, radii[parent])
                || render_utils::circle_visible(rect, b, radii[child])
            {
                painter.line_segment([a, b], edge_stroke);
            }
        }

        for (index, node) in self.tree.nodes.iter().enumerate() {
            let flags = render_utils::NodeFlags {
                is_selected: selected_index == Some(index),
                is_search_match: search_set.contains(&index),
                is_dependency: dep_set.contains(&index),
            };
            let highlighted = flags.is_selected || flags.is_search_match || flags.is_dependency;
            let radius = if highlighted {
                radii[index] + 3.0
            } else {
                radii[index]
            };

            let position = positions[index];
            if !render_utils::circle_visible(rect, position, radius) {
                continue;
            }

            painter.circle(
                position,
                radius,
                render_utils::node_color(node, &flags),
                Stroke::new(1.5, Color32::from_rgba_unmultiplied(255, 255, 255, 200)),
            );

            let show_label =
                self.zoom > 1.2 || radius > 12.0 || highlighted || hovered == Some(index);
            if show_label {
                painter.text(
                    position + vec2(0.0, -radius - 3.0),
                    Align2::CENTER_BOTTOM,
                    &node.name,
                    FontId::proportional(11.0),
                    Color32::from_rgb(0xe5, 0xe7, 0xeb),
                );
            }
        }

        if let Some(index) = hovered {
            let node = &self.tree.nodes[index];
            let caption = match node.size {
                Some(size) => format!("{}  ({})", node.id, format_bytes(size)),
                None => node.id.clone(),
            };
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                caption,
                FontId::monospace(12.0),
                Color32::from_rgb(0xd1, 0xd5, 0xdb),
            );
        }
    }

    /// Scroll zooms toward the pointer so the world point under the cursor
    /// stays put. Disabled while the view is locked.
    pub(super) fn handle_zoom(&mut self, ui: &Ui, rect: Rect, response: &Response) {
        if !self.zoom_enabled || !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll == 0.0 {
            return;
        }
        let Some(pointer) = response.hover_pos() else {
            return;
        };

        let old_zoom = self.zoom;
        let new_zoom = (old_zoom * (scroll * 0.002).exp()).clamp(MIN_ZOOM, MAX_ZOOM);
        if new_zoom == old_zoom {
            return;
        }

        let world = render_utils::screen_to_world(rect, self.pan, old_zoom, pointer);
        self.zoom = new_zoom;
        self.pan = pointer - rect.center() - world * new_zoom;
    }

    /// Secondary- or middle-button drag pans; primary drag is reserved for
    /// node pinning in the graph view.
    pub(super) fn handle_pan(&mut self, response: &Response) {
        if !self.zoom_enabled {
            return;
        }
        if response.dragged_by(PointerButton::Secondary)
            || response.dragged_by(PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    fn hovered_node(
        &self,
        rect: Rect,
        response: &Response,
        positions: &[Pos2],
        radii: &[f32],
    ) -> Option<usize> {
        let pointer = response.hover_pos()?;

        let mut best: Option<(usize, f32)> = None;
        for index in 0..positions.len() {
            if !render_utils::circle_visible(rect, positions[index], radii[index]) {
                continue;
            }
            let distance = positions[index].distance(pointer);
            if distance <= radii[index] + 4.0
                && best.is_none_or(|(_, best_distance)| distance < best_distance)
            {
                best = Some((index, distance));
            }
        }
        best.map(|(index, _)| index)
    }

    fn handle_node_drag(&mut self, rect: Rect, response: &Response, hovered: Option<usize>) {
        if response.drag_started_by(PointerButton::Primary)
            && let Some(index) = hovered
        {
            self.dragged = Some(index);
            self.force.drag_start(index);
        }

        if let Some(index) = self.dragged {
            if response.dragged_by(PointerButton::Primary) {
                if let Some(pointer) = response.hover_pos() {
                    let world = render_utils::screen_to_world(rect, self.pan, self.zoom, pointer);
                    self.force.drag_move(index, world);
                }
                response.ctx.request_repaint();
            }
            if response.drag_stopped_by(PointerButton::Primary) {
                self.force.drag_end(index);
                self.dragged = None;
            }
        }
    }

    pub(super) fn handle_clicks(&mut self, response: &Response, hovered: Option<usize>) {
        if response.clicked_by(PointerButton::Primary)
            && let Some(index) = hovered
        {
            self.select_node(index);
        }
        if response.clicked_by(PointerButton::Secondary) {
            self.clear_selection();
        }
    }
}
