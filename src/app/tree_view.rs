//! Layered hierarchical canvas. Positions are pure functions of the tree and
//! the canvas width, cached until the width changes; nothing here is
//! animated, so only pan and zoom move the picture.

use eframe::egui::{
    Align2, Color32, CursorIcon, FontId, PointerButton, Pos2, Sense, Stroke, Ui,
    epaint::CubicBezierShape, vec2,
};

use super::{ViewModel, highlight, render_utils};
use crate::hierarchy::NodeKind;
use crate::layout::layered_layout;

const ROW_HEIGHT: f32 = 64.0;

impl ViewModel {
    pub(super) fn draw_tree(&mut self, ui: &mut Ui) {
        let (rect, response) =
            ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        render_utils::draw_background(&painter, rect, self.pan, self.zoom);
        self.handle_zoom(ui, rect, &response);
        self.handle_pan(&response);
        // Primary drag also pans here; the layered layout has no node pinning.
        if self.zoom_enabled && response.dragged_by(PointerButton::Primary) {
            self.pan += response.drag_delta();
        }

        let width = rect.width();
        let rebuild = match &self.tree_frame {
            Some((cached_width, _)) => (cached_width - width).abs() > 1.0,
            None => true,
        };
        if rebuild {
            let layout = layered_layout(&self.tree, width, ROW_HEIGHT);
            let max_depth = self
                .tree
                .nodes
                .iter()
                .map(|node| node.depth)
                .max()
                .unwrap_or(0);
            // Recenter layout coordinates so pan zero shows the tree middle.
            let offset = vec2(width * 0.5, max_depth as f32 * ROW_HEIGHT * 0.5);
            let world = layout.into_iter().map(|pos| pos - offset).collect();
            self.tree_frame = Some((width, world));
        }
        let Some((_, world)) = &self.tree_frame else {
            return;
        };

        let zoom_scale = self.zoom.powf(0.4);
        let (pan, zoom) = (self.pan, self.zoom);
        let positions: Vec<Pos2> = world
            .iter()
            .map(|&pos| render_utils::world_to_screen(rect, pan, zoom, pos))
            .collect();
        let radii: Vec<f32> = self
            .tree
            .nodes
            .iter()
            .map(|node| {
                let base = if node.kind == NodeKind::Root { 8.0 } else { 5.0 };
                (base * zoom_scale).clamp(2.0, 20.0)
            })
            .collect();

        let hovered = {
            let mut best: Option<(usize, f32)> = None;
            if let Some(pointer) = response.hover_pos() {
                for (index, position) in positions.iter().enumerate() {
                    let distance = position.distance(pointer);
                    if distance <= radii[index] + 4.0
                        && best.is_none_or(|(_, best_distance)| distance < best_distance)
                    {
                        best = Some((index, distance));
                    }
                }
            }
            best.map(|(index, _)| index)
        };
        if hovered.is_some() {
            ui.ctx().set_cursor_icon(CursorIcon::PointingHand);
        }
        self.handle_clicks(&response, hovered);

        let search_set = highlight::search_matches(&self.tree, &self.search);
        let dep_set = highlight::dependency_matches(&self.tree, &self.resolved_deps);
        let selected_index = self
            .selection
            .selected_id()
            .and_then(|id| self.tree.index_of(id));

        let link_stroke = Stroke::new(
            (1.5 * zoom_scale).clamp(0.5, 3.0),
            Color32::from_rgba_unmultiplied(0xa1, 0xa1, 0xaa, 180),
        );
        for &(parent, child) in &self.tree.edges {
            let start = positions[parent];
            let end = positions[child];
            if !render_utils::circle_visible(rect, start, ROW_HEIGHT * zoom)
                && !render_utils::circle_visible(rect, end, ROW_HEIGHT * zoom)
            {
                continue;
            }
            let mid_y = (start.y + end.y) * 0.5;
            painter.add(CubicBezierShape::from_points_stroke(
                [
                    start,
                    Pos2::new(start.x, mid_y),
                    Pos2::new(end.x, mid_y),
                    end,
                ],
                false,
                Color32::TRANSPARENT,
                link_stroke,
            ));
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
            if !render_utils::circle_visible(rect, position, radius + 120.0) {
                continue;
            }

            painter.circle(
                position,
                radius,
                render_utils::node_color(node, &flags),
                Stroke::new(1.5, Color32::from_rgba_unmultiplied(255, 255, 255, 200)),
            );

            let show_label = self.zoom > 0.8 || highlighted || hovered == Some(index);
            if show_label {
                // Leaves hang below their row; label them to the right so
                // sibling labels do not pile on top of each other.
                let (anchor, offset) = if node.children.is_empty() {
                    (Align2::LEFT_CENTER, vec2(radius + 6.0, 0.0))
                } else {
                    (Align2::RIGHT_CENTER, vec2(-radius - 6.0, 0.0))
                };
                painter.text(
                    position + offset,
                    anchor,
                    &node.name,
                    FontId::proportional(11.0),
                    Color32::from_rgb(0xe5, 0xe7, 0xeb),
                );
            }
        }

        if let Some(index) = hovered {
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                &self.tree.nodes[index].id,
                FontId::monospace(12.0),
                Color32::from_rgb(0xd1, 0xd5, 0xdb),
            );
        }
    }
}
