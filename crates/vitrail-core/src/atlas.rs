use std::rc::Rc;

use web_time::Duration;

use crate::error::AtlasError;
use crate::geometry::SurfaceMetrics;
use crate::layer::{Bitmap, LayerId, LayerPosition};
use crate::stack::PageStack;

/// Texture slots per composited surface. One quad, one draw call, up to this
/// many independently scrolled layers.
pub const MAX_TEXTURES: usize = 16;

/// Per-slot parameters consumed by the compositing shader: everything is
/// normalized to the surface (pixels divided by surface dimensions).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SlotUniform {
    pub active: bool,
    pub position: [f32; 2],
    pub size: [f32; 2],
    pub scroll_offset: f32,
    pub scroll_height: f32,
    pub pixelated: bool,
}

#[derive(Default)]
struct Slot {
    layer: Option<LayerId>,
    bitmap: Option<Rc<Bitmap>>,
    uploaded: Option<u64>,
    uniform: SlotUniform,
}

/// A bitmap the render backend still has to copy to the GPU.
#[derive(Clone)]
pub struct SlotUpload {
    pub slot: usize,
    pub bitmap: Rc<Bitmap>,
}

/// CPU side of the compositor: maps the stack's visible layers onto texture
/// slots in declaration order and keeps the per-slot uniforms current.
///
/// Slots remember the last bitmap id they handed to the GPU, so a layer is
/// re-uploaded only when its content actually changed. A layer that is merely
/// invalid this frame (an off-phase animation frame) keeps its slot and
/// texture; only its active flag drops.
pub struct TextureAtlas {
    slots: [Slot; MAX_TEXTURES],
}

impl Default for TextureAtlas {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureAtlas {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| Slot::default()),
        }
    }

    /// Re-derive every slot from the stack's visible layer list.
    ///
    /// More than [`MAX_TEXTURES`] visible layers is a capacity error: the
    /// first `MAX_TEXTURES` in declaration order stay mapped, the surplus is
    /// rejected for the frame, and the error is returned so the caller can
    /// surface it. Never a silent drop.
    pub fn refresh(
        &mut self,
        stack: &PageStack,
        metrics: &SurfaceMetrics,
        world_time: Duration,
    ) -> Result<(), AtlasError> {
        let mut visible = stack.visible_layers();
        for slot in &mut self.slots {
            match visible.next() {
                Some((page_offset, layer)) => {
                    if slot.layer != Some(layer.id()) {
                        slot.layer = Some(layer.id());
                        slot.uploaded = None;
                    }
                    slot.bitmap = Some(layer.bitmap.clone());
                    let LayerPosition {
                        x,
                        y,
                        w,
                        h,
                        scroll_top,
                        scroll_height,
                    } = layer.position(page_offset, metrics);
                    slot.uniform = SlotUniform {
                        active: layer.is_valid_at(world_time),
                        position: [x, y],
                        size: [w, h],
                        scroll_offset: scroll_top,
                        scroll_height,
                        pixelated: layer.pixelated,
                    };
                }
                None => {
                    slot.layer = None;
                    slot.bitmap = None;
                    slot.uploaded = None;
                    slot.uniform = SlotUniform::default();
                }
            }
        }

        let surplus = visible.count();
        if surplus > 0 {
            let err = AtlasError::CapacityExceeded {
                visible: MAX_TEXTURES + surplus,
                max: MAX_TEXTURES,
            };
            log::error!("{err}");
            return Err(err);
        }
        Ok(())
    }

    pub fn uniforms(&self) -> [SlotUniform; MAX_TEXTURES] {
        std::array::from_fn(|i| self.slots[i].uniform)
    }

    /// Slots whose bitmap changed since the last `mark_uploaded`.
    pub fn pending_uploads(&self) -> Vec<SlotUpload> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| {
                let bitmap = slot.bitmap.as_ref()?;
                (slot.uploaded != Some(bitmap.id())).then(|| SlotUpload {
                    slot: i,
                    bitmap: bitmap.clone(),
                })
            })
            .collect()
    }

    pub fn mark_uploaded(&mut self, slot: usize, bitmap_id: u64) {
        if let Some(s) = self.slots.get_mut(slot) {
            s.uploaded = Some(bitmap_id);
        }
    }
}
