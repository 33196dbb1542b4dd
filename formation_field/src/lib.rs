//! # formation_field
//!
//! Stateless layout math for the particle swarm.  Each formation is a pure
//! function from particle parameters (index, anchor, elapsed time) to a
//! target position; the choreography layer owns all mutable state and calls
//! in here every frame.
//!
//! ## Formations
//!
//! * [`tree`] — spiral-cone silhouette with a rigid time-based swirl.
//! * [`scatter`] — spherical-shell sampling plus constant-velocity drift with
//!   an elastic boundary bounce.
//! * [`text`] — glyph rasterization sampled into a shuffled point cloud on
//!   the z = 0 plane.
//!
//! ## Feature flags
//!
//! * (default) — text uses the built-in scaled bitmap font; no font asset.
//! * `truetype` — text can rasterize through `rusttype` with caller-provided
//!   font bytes.

pub mod font;
pub mod scatter;
pub mod text;
pub mod tree;

pub use scatter::ScatterConfig;
pub use text::{TextLayout, TextStyle};
pub use tree::TreeConfig;
