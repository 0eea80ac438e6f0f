use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;
use web_time::Duration;

use crate::geometry::{Rect, SurfaceMetrics, Vec2};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// RGBA8 pixels plus a process-unique id. The id lets the compositor detect
/// content changes without hashing pixel data: a re-rasterized layer gets a
/// fresh bitmap and therefore a fresh id.
#[derive(Clone, Debug)]
pub struct Bitmap {
    id: u64,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), (width as usize) * (height as usize) * 4);
        Self {
            id: next_id(),
            width,
            height,
            pixels,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// A clickable rectangle within a layer's content, in unscrolled content
/// coordinates. Projection into the surface subtracts the layer's current
/// scroll offset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Anchor {
    pub rect: Rect,
    pub on_click: Option<String>,
    pub on_press: Option<String>,
    pub on_release: Option<String>,
}

impl Anchor {
    pub fn click(rect: Rect, action: impl Into<String>) -> Self {
        Self {
            rect,
            on_click: Some(action.into()),
            on_press: None,
            on_release: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

/// Normalized placement of a layer on its surface, in texture-space units
/// (pixel values divided by the surface dimensions, plus the owning page's
/// transition offset). This is exactly what the compositing shader consumes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LayerPosition {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub scroll_top: f32,
    pub scroll_height: f32,
}

/// Declarative input to a page render. Markup specs go through the
/// rasterizer; image specs resolve immediately, one sibling layer per frame
/// of the cycle.
#[derive(Clone, Debug)]
pub enum LayerSpec {
    Markup {
        source: String,
        x: f32,
        y: f32,
        /// Defaults to the full surface when `None`.
        w: Option<f32>,
        h: Option<f32>,
        scrollable: bool,
    },
    Image {
        frames: Vec<Bitmap>,
        x: f32,
        y: f32,
        w: Option<f32>,
        h: Option<f32>,
        frame_duration: Duration,
        pixelated: bool,
    },
}

impl LayerSpec {
    pub fn markup(source: impl Into<String>) -> Self {
        LayerSpec::Markup {
            source: source.into(),
            x: 0.0,
            y: 0.0,
            w: None,
            h: None,
            scrollable: false,
        }
    }

    pub fn scrollable_markup(source: impl Into<String>) -> Self {
        LayerSpec::Markup {
            source: source.into(),
            x: 0.0,
            y: 0.0,
            w: None,
            h: None,
            scrollable: true,
        }
    }
}

/// One rasterized rectangle of UI content.
///
/// The bitmap covers the full scrollable content (`w` x `scroll_height`
/// pixels); `h` is the visible window. Anchors stay in content coordinates
/// at all times.
#[derive(Clone, Debug)]
pub struct Layer {
    id: LayerId,
    pub bitmap: Rc<Bitmap>,
    pub anchors: SmallVec<[Anchor; 4]>,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub scroll_height: f32,
    pub scrollable: bool,
    scroll_top: f32,
    pub frame_count: u32,
    pub frame_index: u32,
    pub frame_duration: Duration,
    pub pixelated: bool,
}

impl Layer {
    pub fn new(bitmap: Rc<Bitmap>, x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            id: LayerId(next_id()),
            bitmap,
            anchors: SmallVec::new(),
            x,
            y,
            w,
            h,
            scroll_height: h,
            scrollable: false,
            scroll_top: 0.0,
            frame_count: 1,
            frame_index: 0,
            frame_duration: Duration::ZERO,
            pixelated: false,
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn scroll_top(&self) -> f32 {
        self.scroll_top
    }

    pub fn max_scroll(&self) -> f32 {
        (self.scroll_height - self.h).max(0.0)
    }

    /// Clamped write; the invariant `0 <= scroll_top <= max_scroll` holds at
    /// all times, whatever delta a drag produces.
    pub fn scroll_to(&mut self, top: f32) {
        self.scroll_top = top.clamp(0.0, self.max_scroll());
    }

    /// Whether this layer should be shown at `world_time`. A static layer is
    /// always valid; a frame of an animation cycle is valid only during its
    /// slice of the cycle.
    pub fn is_valid_at(&self, world_time: Duration) -> bool {
        if self.frame_count <= 1 {
            return true;
        }
        if self.frame_duration.is_zero() {
            return self.frame_index == 0;
        }
        let current =
            (world_time.as_millis() / self.frame_duration.as_millis()) % self.frame_count as u128;
        current == self.frame_index as u128
    }

    /// Normalized placement, including the owning page's transition offset.
    pub fn position(&self, page_offset: Vec2, m: &SurfaceMetrics) -> LayerPosition {
        LayerPosition {
            x: page_offset.x + self.x / m.width,
            y: page_offset.y + self.y / m.height,
            w: self.w / m.width,
            h: self.h / m.height,
            scroll_top: self.scroll_top / m.height,
            scroll_height: self.scroll_height / m.height,
        }
    }

    /// The layer's rectangle in surface pixels, clamped to the surface.
    pub fn rect(&self, page_offset: Vec2, m: &SurfaceMetrics) -> Rect {
        let p = self.position(page_offset, m);
        Rect::from_edges(
            (p.x * m.width).clamp(0.0, m.width),
            (p.y * m.height).clamp(0.0, m.height),
            ((p.x + p.w) * m.width).clamp(0.0, m.width),
            ((p.y + p.h) * m.height).clamp(0.0, m.height),
        )
    }

    /// One anchor's rectangle in surface pixels, clamped to the layer's own
    /// extent. Scroll offset is not applied here; hit testing subtracts it
    /// when extruding the pickable volume.
    pub fn anchor_rect(&self, anchor: &Anchor, page_offset: Vec2, m: &SurfaceMetrics) -> Rect {
        let p = self.position(page_offset, m);
        let left = p.x * m.width;
        let top = p.y * m.height;
        let right = (p.x + p.w) * m.width;
        let bottom = (p.y + p.h) * m.height;
        Rect::from_edges(
            (left + anchor.rect.x).clamp(0.0, right),
            (top + anchor.rect.y).clamp(0.0, bottom),
            (left + anchor.rect.right()).clamp(0.0, right),
            (top + anchor.rect.bottom()).clamp(0.0, bottom),
        )
    }
}
