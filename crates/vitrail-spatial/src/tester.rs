use glam::{Quat, Vec3};

use vitrail_core::{PageStack, Rect, SurfaceMetrics, SurfacePose, Vec2};

use crate::hover::{AnchorHit, BoxPose, HoverMarkers, HoverState};
use crate::target::BoxTarget;

/// Controller ray length in world units.
pub const MAX_REACH: f32 = 15.0;

/// One tracked controller for one frame. Absence of a pose means "not
/// tracked"; the interaction pass handles that case.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControllerPose {
    pub position: Vec3,
    pub orientation: Quat,
}

/// Map a surface pixel to a world point. `z` offsets along the surface
/// normal in world units. Pixel (0, 0) is the quad's top-left corner.
pub fn surface_point(pose: &SurfacePose, m: &SurfaceMetrics, x: f32, y: f32, z: f32) -> Vec3 {
    let local = Vec3::new(
        -m.world_width / 2.0 + (x / m.width) * m.world_width,
        m.world_height / 2.0 - (y / m.height) * m.world_height,
        z,
    );
    pose.position + pose.rotation * local
}

/// The mesh-coordinate getter: project a world point back onto the surface,
/// returning world-unit distances from the top-left corner along the local
/// X and Y edges. Clamped to the surface extent.
pub fn surface_coord(pose: &SurfacePose, m: &SurfaceMetrics, p: Vec3) -> Vec2 {
    let origin = surface_point(pose, m, 0.0, 0.0, 0.0);
    let x_end = surface_point(pose, m, m.width, 0.0, 0.0);
    let y_end = surface_point(pose, m, 0.0, m.height, 0.0);
    Vec2::new(
        origin.distance(closest_on_segment(origin, x_end, p)),
        origin.distance(closest_on_segment(origin, y_end, p)),
    )
}

fn closest_on_segment(a: Vec3, b: Vec3, p: Vec3) -> Vec3 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= f32::EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    a + ab * t
}

/// Extrude a surface-pixel rectangle into a pickable volume. `scroll_px`
/// shifts the rectangle up by the owning layer's current scroll offset.
fn rect_target(pose: &SurfacePose, m: &SurfaceMetrics, rect: &Rect, scroll_px: f32) -> BoxTarget {
    let half_w = m.world_width / 2.0;
    let half_h = m.world_height / 2.0;
    let lo = Vec3::new(
        -half_w + (rect.x / m.width) * m.world_width,
        half_h - ((rect.bottom() - scroll_px) / m.height) * m.world_height,
        -m.world_depth,
    );
    let hi = Vec3::new(
        -half_w + (rect.right() / m.width) * m.world_width,
        half_h - ((rect.y - scroll_px) / m.height) * m.world_height,
        m.world_depth,
    );
    BoxTarget::from_corners(pose.position, pose.rotation, pose.scale, lo, hi)
}

/// Resolve what one controller is pointing at.
///
/// Priority is declaration order throughout: the first scrollable layer
/// whose volume the ray enters becomes the scroll target, and when anchors
/// overlap, the first declared anchor wins (layer order, then anchor order
/// within the layer). The tie-break is part of the contract — repeated calls
/// with identical inputs resolve identically.
///
/// A degenerate surface pose (zero or non-finite scale) short-circuits to
/// "no hit" instead of dividing by zero.
pub fn hit_test(
    pose: &SurfacePose,
    m: &SurfaceMetrics,
    stack: &PageStack,
    controller: &ControllerPose,
    hover: &mut HoverState,
    markers: &mut HoverMarkers,
) {
    if pose.is_degenerate() {
        hover.clear_hover();
        *markers = HoverMarkers::default();
        return;
    }

    let ray_start = controller.position;
    let ray_end = ray_start + controller.orientation * Vec3::NEG_Z * MAX_REACH;

    let panel = BoxTarget::new(
        pose.position,
        pose.rotation,
        pose.scale,
        Vec3::new(m.world_width, m.world_height, 0.0),
    );
    let Some(point) = panel.intersect_segment(ray_start, ray_end) else {
        hover.clear_hover();
        *markers = HoverMarkers::default();
        return;
    };

    hover.intersection = Some(point);
    markers.dot = Some(point);

    hover.scroll_layer = None;
    for (offset, layer) in stack.visible_layers() {
        if !layer.scrollable {
            continue;
        }
        let rect = layer.rect(offset, m);
        if rect_target(pose, m, &rect, 0.0)
            .intersect_segment(ray_start, ray_end)
            .is_some()
        {
            hover.scroll_layer = Some(layer.id());
            break;
        }
    }

    hover.anchor = None;
    hover.value = 0.0;
    markers.box_pose = None;
    'layers: for (offset, layer) in stack.visible_layers() {
        for (index, anchor) in layer.anchors.iter().enumerate() {
            let rect = layer.anchor_rect(anchor, offset, m);
            let target = rect_target(pose, m, &rect, layer.scroll_top());
            if target.intersect_segment(ray_start, ray_end).is_none() {
                continue;
            }

            // Slider fraction: horizontal distance into the anchor at its
            // vertical center, clamped 0..1 by the segment projection.
            let cy = rect.center_y();
            let left = surface_point(pose, m, rect.x, cy, 0.0);
            let right = surface_point(pose, m, rect.right(), cy, 0.0);
            let width = left.distance(right);
            hover.value = if width <= f32::EPSILON {
                0.0
            } else {
                left.distance(closest_on_segment(left, right, point)) / width
            };

            hover.anchor = Some(AnchorHit {
                layer: layer.id(),
                index,
                rect,
                on_click: anchor.on_click.clone(),
                on_press: anchor.on_press.clone(),
                on_release: anchor.on_release.clone(),
            });
            markers.box_pose = Some(BoxPose {
                position: target.center(),
                rotation: target.rotation(),
                size: target.size().max(Vec3::splat(0.001)),
            });
            break 'layers;
        }
    }
}
