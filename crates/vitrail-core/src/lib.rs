//! # Layers, Pages, and the Panel Frame Loop
//!
//! Vitrail presents document-described UI content on a quad floating in a 3D
//! scene. The model is deliberately small:
//!
//! - `Layer` — one rasterized rectangle of content (bitmap + pixel placement +
//!   optional scroll window + clickable anchors).
//! - `Page` — an ordered set of Layers produced by a view function from a data
//!   snapshot.
//! - `PageStack` — push/pop/replace of Pages with slide transitions.
//! - `TextureAtlas` — maps the visible Layers onto a fixed number of texture
//!   slots and produces the per-slot uniforms the compositing shader consumes.
//! - `Ui` — owner-instantiated driver tying the above together once per frame.
//!
//! ## Rendering model
//!
//! Vitrail never lays out text or markup itself. A [`raster::Rasterizer`]
//! collaborator turns `(markup, width, height)` into a bitmap plus a list of
//! clickable-region rectangles. Rasterization is the only asynchronous
//! operation in the crate: a page update fans out one request per markup
//! layer, polls them once per frame, and swaps the complete layer list in one
//! step when every request has finished. A newer update supersedes an older
//! in-flight one wholesale, so a page never shows layers from two different
//! snapshots.
//!
//! ## Frame loop
//!
//! Everything else is synchronous and driven from a single per-frame call:
//!
//! ```rust
//! use std::rc::Rc;
//! use vitrail_core::*;
//! use web_time::{Duration, Instant};
//!
//! # struct NullRaster;
//! # impl raster::Rasterizer for NullRaster {
//! #     fn submit(&self, _: &str, _: u32, _: u32) -> raster::JobId { raster::JobId(0) }
//! #     fn poll(&self, _: raster::JobId) -> raster::RasterStatus { raster::RasterStatus::Pending }
//! # }
//! let mut ui = Ui::new(UiConfig::default(), Rc::new(NullRaster));
//! let now = Instant::now();
//! ui.frame(now, Duration::ZERO).ok();
//! ```
//!
//! Time is always passed in: `now` for transitions and raster timeouts,
//! `world_time` for layer frame animation. Nothing in the crate reads the
//! wall clock on its own, which keeps every code path deterministic under
//! test and makes a suspended render loop pause transitions without drift.
//!
//! ## What lives elsewhere
//!
//! Controller-ray hit testing and scroll dragging live in `vitrail-spatial`;
//! the GPU side of compositing lives in `vitrail-render-wgpu` behind the
//! [`render_api::CompositorBackend`] trait.

pub mod animation;
pub mod atlas;
pub mod error;
pub mod events;
pub mod geometry;
pub mod layer;
pub mod page;
pub mod raster;
pub mod render_api;
pub mod stack;
pub mod tests;
pub mod ui;

pub use animation::*;
pub use atlas::*;
pub use error::*;
pub use events::*;
pub use geometry::*;
pub use layer::*;
pub use page::*;
pub use render_api::*;
pub use stack::*;
pub use ui::*;
