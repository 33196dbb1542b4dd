//! # swarm_choreo
//!
//! The mutable heart of the experience.  [`InteractionController`] is the
//! only place formation transitions originate: it debounces classified
//! gestures (camera first, hover fallback) into explicit change events.
//! [`Choreographer`] owns the particle arena and consumes those events —
//! transition side effects run exactly once, then every frame it assigns a
//! target transform per particle for the active formation and eases each
//! transform a fixed fraction of the way there.
//!
//! Frame order is strict and single-threaded:
//!
//! ```text
//! GestureSignal → resolve() → apply() → update() → renderer
//! ```
//!
//! Photo insertion arrives from outside the frame loop but lands as an
//! atomic arena append — iteration never sees a half-built particle.

pub mod choreographer;
pub mod controller;
pub mod particle;

pub use choreographer::{ChoreoConfig, Choreographer, FocusConfig, Smoothing};
pub use controller::{Formation, FormationChange, InteractionController, Vocabulary};
pub use particle::{Appearance, AppearanceId, Particle, ParticleKind, ParticleStore};
