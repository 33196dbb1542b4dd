//! Spherical scatter: shell sampling, constant drift, boundary bounce.
//!
//! The sampler is radius- and polar-angle-uniform, *not* area-uniform — the
//! mild pole clustering is part of the intended look and is kept as-is.  The
//! bounce likewise negates the whole velocity vector rather than reflecting
//! about the surface normal, sending particles back through the sphere.

use glam::Vec3;
use rand::Rng;
use std::f32::consts::{PI, TAU};

// ════════════════════════════════════════════════════════════════════════════
// ScatterConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug)]
pub struct ScatterConfig {
    /// Shell radius range positions are sampled from.
    pub radius_min: f32,
    pub radius_max: f32,
    /// Per-axis drift speed bound; each axis samples uniform in [-v, v].
    pub drift_max: f32,
    /// Per-axis spin bound; each axis samples uniform in [0, s].
    pub spin_max: f32,
    /// Drifting anchors bounce when they leave this origin-centered sphere.
    pub boundary_radius: f32,
    /// Radial push-out applied to idle anchors while one particle is focused.
    pub background_distance: f32,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        ScatterConfig {
            radius_min: 4.0,
            radius_max: 9.0,
            drift_max: 0.012,
            spin_max: 0.01,
            boundary_radius: 10.0,
            background_distance: 1.6,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Sampling
// ════════════════════════════════════════════════════════════════════════════

/// Sample a scatter anchor position on the configured shell.
pub fn sample_position<R: Rng + ?Sized>(cfg: &ScatterConfig, rng: &mut R) -> Vec3 {
    let radius = rng.gen_range(cfg.radius_min..=cfg.radius_max);
    let azimuth = rng.gen_range(0.0..TAU);
    let polar = rng.gen_range(0.0..PI);
    let (sin_p, cos_p) = polar.sin_cos();
    let (sin_a, cos_a) = azimuth.sin_cos();
    Vec3::new(radius * sin_p * cos_a, radius * cos_p, radius * sin_p * sin_a)
}

/// Sample a constant drift velocity, each axis uniform in [-drift, drift].
pub fn sample_drift<R: Rng + ?Sized>(cfg: &ScatterConfig, rng: &mut R) -> Vec3 {
    let d = cfg.drift_max;
    Vec3::new(
        rng.gen_range(-d..=d),
        rng.gen_range(-d..=d),
        rng.gen_range(-d..=d),
    )
}

/// Sample a constant spin, each axis uniform in [0, spin].
pub fn sample_spin<R: Rng + ?Sized>(cfg: &ScatterConfig, rng: &mut R) -> Vec3 {
    let s = cfg.spin_max;
    Vec3::new(
        rng.gen_range(0.0..=s),
        rng.gen_range(0.0..=s),
        rng.gen_range(0.0..=s),
    )
}

// ════════════════════════════════════════════════════════════════════════════
// Per-frame drift
// ════════════════════════════════════════════════════════════════════════════

/// Advance a drifting anchor one step, bouncing at the boundary sphere.
///
/// The bounce negates the full velocity vector, so the anchor retraces its
/// path back through the sphere interior.
pub fn step_drift(base: &mut Vec3, velocity: &mut Vec3, boundary_radius: f32) {
    *base += *velocity;
    if base.length() > boundary_radius {
        *velocity = -*velocity;
    }
}

/// The pushed-out position an idle anchor takes while another particle holds
/// focus.
pub fn background_position(base: Vec3, distance: f32) -> Vec3 {
    base * distance
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
