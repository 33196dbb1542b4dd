//! Spiral-cone tree layout.
//!
//! Every particle owns a fixed coordinate on a conical spiral, assigned once
//! at creation from its index; the whole cone then swirls rigidly about the
//! vertical axis as time passes.

use glam::Vec3;

// ════════════════════════════════════════════════════════════════════════════
// TreeConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug)]
pub struct TreeConfig {
    /// Height of the cone base (t = 0).
    pub height_min: f32,
    /// Height of the apex (t = 1).
    pub height_max: f32,
    /// Radius at the base; shrinks linearly to 0 at the apex.
    pub max_radius: f32,
    /// Total winding angle in radians across the full index range; large
    /// values wrap the spiral many times around the cone.
    pub spiral_density: f32,
    /// Rigid swirl speed about the vertical axis, radians per second.
    pub rotation_speed: f32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig {
            height_min: -4.0,
            height_max: 4.0,
            max_radius: 3.2,
            spiral_density: 42.0,
            rotation_speed: 0.25,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Layout functions
// ════════════════════════════════════════════════════════════════════════════

/// The fixed spiral-cone coordinate for particle `index` of `count`.
pub fn spiral_cone(index: usize, count: usize, cfg: &TreeConfig) -> Vec3 {
    let t = index as f32 / count.max(1) as f32;
    let y = cfg.height_min + (cfg.height_max - cfg.height_min) * t;
    let radius = cfg.max_radius * (1.0 - t);
    let angle = t * cfg.spiral_density;
    Vec3::new(radius * angle.cos(), y, radius * angle.sin())
}

/// Rotate a spiral coordinate rigidly about the vertical axis for the given
/// elapsed time.  Height is untouched, so the silhouette is preserved.
pub fn swirl(p: Vec3, elapsed: f32, cfg: &TreeConfig) -> Vec3 {
    let a = elapsed * cfg.rotation_speed;
    let (sin, cos) = a.sin_cos();
    Vec3::new(p.x * cos - p.z * sin, p.y, p.x * sin + p.z * cos)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
