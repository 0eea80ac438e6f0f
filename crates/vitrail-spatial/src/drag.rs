use vitrail_core::{LayerId, PageStack, SurfaceMetrics, SurfacePose};

use crate::hover::{DragAnchor, HoverState};
use crate::tester::surface_coord;

/// A pending scroll write. The caller applies it through
/// [`vitrail_core::Layer::scroll_to`], which clamps to
/// `[0, max(scroll_height - h, 0)]` — the state machine itself never needs
/// to know the layer's bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollUpdate {
    pub layer: LayerId,
    pub scroll_top: f32,
}

/// Per-controller scroll gesture: `Idle -> Dragging -> Idle`. The state
/// itself lives in [`HoverState::drag`]; these transitions mutate it.
pub struct ScrollDrag;

impl ScrollDrag {
    /// `Idle -> Dragging`, if the hover has a scroll target under the ray.
    /// Records the layer, the press coordinate, and the scroll offset at
    /// press time.
    pub fn press(
        hover: &mut HoverState,
        pose: &SurfacePose,
        m: &SurfaceMetrics,
        stack: &PageStack,
    ) {
        let (Some(point), Some(layer_id)) = (hover.intersection, hover.scroll_layer) else {
            return;
        };
        let Some(layer) = stack.layer(layer_id) else {
            log::warn!("press on vanished layer {layer_id:?}");
            return;
        };
        let coord = surface_coord(pose, m, point);
        hover.drag = Some(DragAnchor {
            layer: layer_id,
            start_coord: coord,
            start_scroll_top: layer.scroll_top(),
            last_coord: coord,
        });
    }

    /// Recompute the scroll target from the current intersection. Falls back
    /// to the last known coordinate when the ray has left the surface, so a
    /// drag never jumps. `None` while idle.
    pub fn update(
        hover: &mut HoverState,
        pose: &SurfacePose,
        m: &SurfaceMetrics,
    ) -> Option<ScrollUpdate> {
        let point = hover.intersection;
        let drag = hover.drag.as_mut()?;
        if let Some(point) = point {
            drag.last_coord = surface_coord(pose, m, point);
        }
        Some(scroll_for(drag, m))
    }

    /// `Dragging -> Idle` on release: one final update at the release
    /// coordinate, then the drag fields clear.
    pub fn release(
        hover: &mut HoverState,
        pose: &SurfacePose,
        m: &SurfaceMetrics,
    ) -> Option<ScrollUpdate> {
        let update = Self::update(hover, pose, m);
        hover.drag = None;
        update
    }

    /// Tracking lost mid-drag: treat it as a release at the last known
    /// coordinate rather than leaving the gesture dangling.
    pub fn cancel(hover: &mut HoverState, m: &SurfaceMetrics) -> Option<ScrollUpdate> {
        let drag = hover.drag.take()?;
        log::debug!("drag cancelled at last known coordinate");
        Some(scroll_for(&drag, m))
    }
}

fn scroll_for(drag: &DragAnchor, m: &SurfaceMetrics) -> ScrollUpdate {
    let delta_px = (drag.last_coord.y - drag.start_coord.y) * m.px_per_world_y();
    ScrollUpdate {
        layer: drag.layer,
        scroll_top: drag.start_scroll_top - delta_px,
    }
}
