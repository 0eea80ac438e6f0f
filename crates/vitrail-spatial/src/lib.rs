//! # Pointing at panels
//!
//! A panel is a quad in the scene; its content is a 2D pixel layout. This
//! crate closes the gap between the two: it casts each controller's forward
//! ray against the quad, maps the 3D intersection back to surface pixels,
//! resolves which layer and clickable anchor sit under the cursor, and turns
//! press-drag-release gestures into scroll-offset writes.
//!
//! Everything here is per-controller and per-frame. [`Interaction`] owns one
//! [`HoverState`] and one set of [`HoverMarkers`] per hand, drains the
//! bounded input-event queue exactly once per frame, and emits
//! [`vitrail_core::ActionEvent`]s for the command router. Two hands never
//! share mutable hit-testing state.
//!
//! Priority rules are deliberately boring: the first scrollable layer hit
//! (declaration order) becomes the scroll target, and the first declared
//! anchor wins when anchors overlap. Determinism beats cleverness — a hover
//! that flickers between two anchors frame-to-frame is worse than a fixed,
//! documented order.

pub mod drag;
pub mod hover;
pub mod interaction;
pub mod target;
pub mod tester;

pub use drag::*;
pub use hover::*;
pub use interaction::*;
pub use target::*;
pub use tester::*;
