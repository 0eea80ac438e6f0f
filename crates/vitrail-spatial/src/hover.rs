use glam::{Quat, Vec3};

use vitrail_core::{LayerId, Rect, Vec2};

/// The clickable anchor under the cursor, resolved to surface pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct AnchorHit {
    pub layer: LayerId,
    pub index: usize,
    /// Anchor rectangle in surface pixels, unscrolled.
    pub rect: Rect,
    pub on_click: Option<String>,
    pub on_press: Option<String>,
    pub on_release: Option<String>,
}

/// Bookkeeping for an active press-and-hold on a scrollable layer.
/// Coordinates are in world units along the surface axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragAnchor {
    pub layer: LayerId,
    pub start_coord: Vec2,
    pub start_scroll_top: f32,
    /// Refreshed on every drag update; the fallback release coordinate when
    /// tracking is lost mid-drag.
    pub last_coord: Vec2,
}

/// Per-controller intersection state. `drag` is `Some` only between a press
/// over a scrollable layer and the matching release (or tracking loss).
#[derive(Clone, Debug, Default)]
pub struct HoverState {
    pub intersection: Option<Vec3>,
    pub scroll_layer: Option<LayerId>,
    pub anchor: Option<AnchorHit>,
    pub value: f32,
    pub drag: Option<DragAnchor>,
}

impl HoverState {
    /// Reset everything derived from this frame's ray. Drag bookkeeping is
    /// owned by the drag state machine and survives a cleared hover.
    pub fn clear_hover(&mut self) {
        self.intersection = None;
        self.scroll_layer = None;
        self.anchor = None;
        self.value = 0.0;
    }
}

/// Pose for the wireframe box drawn around the hovered anchor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxPose {
    pub position: Vec3,
    pub rotation: Quat,
    pub size: Vec3,
}

/// Visual feedback markers; one independent set per controller.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HoverMarkers {
    /// Exact ray intersection point.
    pub dot: Option<Vec3>,
    /// Bounds of the hovered anchor.
    pub box_pose: Option<BoxPose>,
}
