use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use crate::hierarchy::{NodeKind, TreeNode};
use crate::github::ChangeStatus;

pub(super) const ROOT_COLOR: Color32 = Color32::from_rgb(0x4f, 0x46, 0xe5);
pub(super) const TREE_COLOR: Color32 = Color32::from_rgb(0xf5, 0x9e, 0x0b);
pub(super) const BLOB_COLOR: Color32 = Color32::from_rgb(0x10, 0xb9, 0x81);
pub(super) const SEARCH_COLOR: Color32 = Color32::from_rgb(0xef, 0x44, 0x44);
pub(super) const DEP_COLOR: Color32 = Color32::from_rgb(0x34, 0xd3, 0x99);
pub(super) const SELECTED_COLOR: Color32 = Color32::from_rgb(0x8b, 0x5c, 0xf6);
pub(super) const EDGE_COLOR: Color32 = Color32::from_rgba_premultiplied(0x9c, 0xa3, 0xaf, 0x99);

pub(super) struct NodeFlags {
    pub is_selected: bool,
    pub is_search_match: bool,
    pub is_dependency: bool,
}

/// Color precedence mirrors the highlight ladder: structural kind, then
/// change status, then dependency, then search match, then selection on top.
pub(super) fn node_color(node: &TreeNode, flags: &NodeFlags) -> Color32 {
    let mut color = match node.kind {
        NodeKind::Root => ROOT_COLOR,
        NodeKind::Tree => TREE_COLOR,
        NodeKind::Blob => BLOB_COLOR,
    };

    if let Some(status) = node.status {
        color = match status {
            ChangeStatus::Added => Color32::from_rgb(0x22, 0xc5, 0x5e),
            ChangeStatus::Modified => Color32::from_rgb(0xea, 0xb3, 0x08),
            ChangeStatus::Removed => Color32::from_rgb(0x7f, 0x1d, 0x1d),
        };
    }
    if flags.is_dependency {
        color = DEP_COLOR;
    }
    if flags.is_search_match {
        color = SEARCH_COLOR;
    }
    if flags.is_selected {
        color = SELECTED_COLOR;
    }

    color
}

/// Blob radii follow a square-root scale of file size mapped onto 4..15;
/// directories are fixed at 7 and the root at 10.
pub(super) fn node_radius(node: &TreeNode, max_blob_size: u64) -> f32 {
    match node.kind {
        NodeKind::Root => 10.0,
        NodeKind::Tree => 7.0,
        NodeKind::Blob => {
            let size = node.size.unwrap_or(0) as f32;
            let max = (max_blob_size.max(1)) as f32;
            4.0 + (size / max).sqrt() * 11.0
        }
    }
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;

    let mut x = origin.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment(
            [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment(
            [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}
