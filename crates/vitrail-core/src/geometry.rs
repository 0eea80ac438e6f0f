use glam::{Quat, Vec3};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Build from edge coordinates, collapsing inverted inputs to zero size.
    pub fn from_edges(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            x: left,
            y: top,
            w: (right - left).max(0.0),
            h: (bottom - top).max(0.0),
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.h / 2.0
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }
}

/// Pixel and world dimensions of one composited panel surface.
///
/// `width`/`height` are the layout resolution the rasterizer renders at;
/// `world_width`/`world_height` are the quad's extent in scene units.
/// `world_depth` is the half-thickness used when extruding layer rectangles
/// into pickable volumes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceMetrics {
    pub width: f32,
    pub height: f32,
    pub world_width: f32,
    pub world_height: f32,
    pub world_depth: f32,
}

impl SurfaceMetrics {
    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// Pixels per world unit along X.
    pub fn px_per_world_x(&self) -> f32 {
        self.width / self.world_width
    }

    /// Pixels per world unit along Y.
    pub fn px_per_world_y(&self) -> f32 {
        self.height / self.world_height
    }
}

/// World placement of a panel surface in the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfacePose {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl SurfacePose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            scale: Vec3::ONE,
        }
    }

    /// A pose that cannot be hit-tested: zero or non-finite scale would turn
    /// the pixel projection into a division by zero.
    pub fn is_degenerate(&self) -> bool {
        !self.position.is_finite()
            || !self.rotation.is_finite()
            || !self.scale.is_finite()
            || self.scale.x.abs() < f32::EPSILON
            || self.scale.y.abs() < f32::EPSILON
    }
}
