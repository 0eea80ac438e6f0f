//! The rasterizer boundary.
//!
//! Vitrail delegates markup layout entirely: the collaborator receives a
//! markup string and a target size and eventually produces a bitmap of the
//! full content (which may be taller than the visible window) together with
//! the clickable-region rectangles it found. Any off-screen renderer works
//! behind this contract — a software layout engine, a GPU pass, or a headless
//! browser.

use crate::error::RasterError;
use crate::layer::{Anchor, Bitmap};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JobId(pub u64);

/// A finished rasterization: the content bitmap, the measured total content
/// height in pixels, and the anchors in unscrolled content coordinates.
#[derive(Clone, Debug)]
pub struct RasterFrame {
    pub bitmap: Bitmap,
    pub content_height: u32,
    pub anchors: Vec<Anchor>,
}

#[derive(Clone, Debug)]
pub enum RasterStatus {
    Pending,
    Ready(RasterFrame),
    Failed(RasterError),
}

/// Asynchronous markup-to-bitmap renderer.
///
/// `submit` must not block. `poll` is called once per frame per outstanding
/// job; after it returns `Ready` or `Failed` the job id may be forgotten by
/// the implementation. Failures are not retried here — the owning page
/// completes its update with a failed outcome and keeps its previous layers.
pub trait Rasterizer {
    fn submit(&self, markup: &str, width: u32, height: u32) -> JobId;
    fn poll(&self, job: JobId) -> RasterStatus;
}
