use glam::{Quat, Vec3};

/// An oriented box in world space: two local-space corners around a posed
/// origin. Built fresh each frame from a layer or anchor rectangle and
/// tested against the controller's ray segment.
#[derive(Clone, Copy, Debug)]
pub struct BoxTarget {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    lo: Vec3,
    hi: Vec3,
}

impl BoxTarget {
    /// A box centered on the pose.
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3, size: Vec3) -> Self {
        Self::from_corners(position, rotation, scale, -size / 2.0, size / 2.0)
    }

    /// A box spanning two arbitrary local-space corners.
    pub fn from_corners(position: Vec3, rotation: Quat, scale: Vec3, a: Vec3, b: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
            lo: a.min(b),
            hi: a.max(b),
        }
    }

    pub fn center(&self) -> Vec3 {
        self.position + self.rotation * ((self.lo + self.hi) / 2.0 * self.scale)
    }

    pub fn size(&self) -> Vec3 {
        (self.hi - self.lo) * self.scale
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Clip the segment `a -> b` against the box. Returns the entry point in
    /// world space, or `a` itself when the segment starts inside. Zero-extent
    /// axes (a flat panel) behave as a plane crossing.
    pub fn intersect_segment(&self, a: Vec3, b: Vec3) -> Option<Vec3> {
        if !self.scale.is_finite()
            || self.scale.x.abs() < f32::EPSILON
            || self.scale.y.abs() < f32::EPSILON
            || self.scale.z.abs() < f32::EPSILON
        {
            return None;
        }
        let inv = self.rotation.conjugate();
        let la = inv * (a - self.position) / self.scale;
        let lb = inv * (b - self.position) / self.scale;
        let d = lb - la;

        let mut t0 = 0.0f32;
        let mut t1 = 1.0f32;
        for i in 0..3 {
            let (s, e) = (la[i], d[i]);
            let (lo, hi) = (self.lo[i], self.hi[i]);
            if e.abs() < 1e-9 {
                if s < lo || s > hi {
                    return None;
                }
            } else {
                let (ta, tb) = {
                    let ta = (lo - s) / e;
                    let tb = (hi - s) / e;
                    if ta <= tb { (ta, tb) } else { (tb, ta) }
                };
                t0 = t0.max(ta);
                t1 = t1.min(tb);
                if t0 > t1 {
                    return None;
                }
            }
        }

        let hit = la + d * t0;
        Some(self.position + self.rotation * (hit * self.scale))
    }
}
