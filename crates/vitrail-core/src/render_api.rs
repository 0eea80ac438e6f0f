use crate::atlas::TextureAtlas;

/// GPU boundary for the compositor. The core fills the atlas; a backend
/// uploads changed bitmaps, mirrors the slot uniforms, and draws the quad.
pub trait CompositorBackend {
    fn configure_surface(&mut self, width: u32, height: u32);
    /// `view_proj` is the quad's model-view-projection matrix, column-major.
    fn composite(&mut self, atlas: &mut TextureAtlas, view_proj: [[f32; 4]; 4]);
}
