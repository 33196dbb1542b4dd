//! Per-frame particle choreography.
//!
//! The choreographer owns the arena and mirrors the controller's formation
//! state.  Transition side effects (appearance save/restore, focus pick,
//! text-layout rebuild) run exactly once per change event; after that, every
//! frame assigns a target transform per particle and eases the current
//! transform a fixed fraction of the remaining distance toward it.
//!
//! The easing is deliberately a fixed fraction per frame — not time-scaled,
//! not critically damped.  The scatter spin is equally deliberate in
//! bypassing it: spin accumulates directly on the current rotation, so
//! scattered particles tumble without bound while every other formation
//! eases rotation back to rest.

use std::sync::Arc;

use glam::Vec3;
use image::{Rgba, RgbaImage};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use formation_field::{scatter, tree, ScatterConfig, TextLayout, TextStyle, TreeConfig};

use crate::controller::{Formation, FormationChange};
use crate::particle::{Particle, ParticleKind, ParticleStore};

// ════════════════════════════════════════════════════════════════════════════
// Configuration
// ════════════════════════════════════════════════════════════════════════════

/// Fraction of the remaining distance each transform channel covers per
/// frame.
#[derive(Clone, Copy, Debug)]
pub struct Smoothing {
    pub position: f32,
    pub rotation: f32,
    pub scale: f32,
}

impl Default for Smoothing {
    fn default() -> Self {
        Smoothing {
            position: 0.08,
            rotation: 0.10,
            scale: 0.10,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FocusConfig {
    /// Where the focused photo settles.
    pub point: Vec3,
    pub scale: Vec3,
    /// Scale for everything else while one particle holds focus.
    pub background_scale: Vec3,
}

impl Default for FocusConfig {
    fn default() -> Self {
        FocusConfig {
            point: Vec3::new(0.0, 0.0, 6.0),
            scale: Vec3::splat(2.5),
            background_scale: Vec3::splat(0.6),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ChoreoConfig {
    /// Ordinary (non-photo) population size.
    pub decoration_count: usize,
    /// Every Nth decoration is a candy cane; 0 disables them.
    pub candy_cane_every: usize,
    /// Seed the arena with a placeholder photo so focus works before any
    /// upload; it is destroyed when the first real photo arrives.
    pub default_photo: bool,
    /// Share of eligible particles that form the glyph; the rest float
    /// behind the text for depth.
    pub text_share: f32,
    pub text_particle_scale: Vec3,
    pub tree: TreeConfig,
    pub scatter: ScatterConfig,
    pub text_style: TextStyle,
    pub focus: FocusConfig,
    pub smoothing: Smoothing,
}

impl Default for ChoreoConfig {
    fn default() -> Self {
        ChoreoConfig {
            decoration_count: 320,
            candy_cane_every: 4,
            default_photo: true,
            text_share: 0.9,
            text_particle_scale: Vec3::splat(0.5),
            tree: TreeConfig::default(),
            scatter: ScatterConfig::default(),
            text_style: TextStyle::default(),
            focus: FocusConfig::default(),
            smoothing: Smoothing::default(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Choreographer
// ════════════════════════════════════════════════════════════════════════════

pub struct Choreographer {
    cfg: ChoreoConfig,
    store: ParticleStore,
    formation: Formation,
    text: String,
    /// Cached glyph targets; rebuilt only on text entry or text change.
    layout: TextLayout,
    /// Eligible (non-photo) arena indices in stable order; the first
    /// `text_budget` of them form the glyph.
    text_slots: Vec<usize>,
    text_budget: usize,
    focus: Option<usize>,
    rng: StdRng,
}

impl Choreographer {
    pub fn new(cfg: ChoreoConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut store = ParticleStore::new();

        let total = cfg.decoration_count + usize::from(cfg.default_photo);
        for i in 0..cfg.decoration_count {
            let kind = if cfg.candy_cane_every != 0 && i % cfg.candy_cane_every == 0 {
                ParticleKind::CandyCane
            } else {
                ParticleKind::Decoration
            };
            store.push(spawn(kind, i, total, &cfg, &mut rng));
        }
        if cfg.default_photo {
            let mut p = spawn(ParticleKind::Photo, cfg.decoration_count, total, &cfg, &mut rng);
            p.photo = Some(Arc::new(placeholder_pixels()));
            store.push_placeholder(p);
        }
        info!("arena populated: {} particles", store.len());

        Choreographer {
            cfg,
            store,
            formation: Formation::Tree,
            text: String::new(),
            layout: TextLayout::default(),
            text_slots: Vec::new(),
            text_budget: 0,
            focus: None,
            rng,
        }
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn formation(&self) -> Formation {
        self.formation
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn focus(&self) -> Option<usize> {
        self.focus
    }

    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    pub fn particles(&self) -> &[Particle] {
        self.store.particles()
    }

    pub fn text_budget(&self) -> usize {
        self.text_budget
    }

    // ── transitions ───────────────────────────────────────────────────────

    /// Consume one change event.  Re-applying the current state is a no-op,
    /// so entry side effects run exactly once per real transition.
    pub fn apply(&mut self, change: &FormationChange) {
        let entering_text = change.formation == Formation::Text
            && (self.formation != Formation::Text || change.text != self.text);
        if change.formation == self.formation && !entering_text {
            return;
        }
        debug!(
            "formation {:?} → {:?} (text {:?})",
            self.formation, change.formation, change.text
        );

        // Exit actions.
        if self.formation == Formation::Text && change.formation != Formation::Text {
            for p in self.store.iter_mut() {
                p.appearance.restore();
            }
        }
        if self.formation == Formation::Focus && change.formation != Formation::Focus {
            self.focus = None;
        }

        // Entry actions.
        match change.formation {
            Formation::Focus => {
                let photos = self.store.photos();
                self.focus = if photos.is_empty() {
                    info!("focus requested with no photos; everything stays in the background");
                    None
                } else {
                    Some(photos[self.rng.gen_range(0..photos.len())])
                };
            }
            Formation::Text => {
                self.text = change.text.clone();
                self.rebuild_text_layout();
            }
            Formation::Tree | Formation::Scatter => {}
        }

        self.formation = change.formation;
        self.text = change.text.clone();
    }

    fn rebuild_text_layout(&mut self) {
        self.text_slots = self.store.eligible_indices();
        self.text_budget = ((self.text_slots.len() as f32 * self.cfg.text_share).floor()
            as usize)
            .min(self.text_slots.len());
        self.layout = TextLayout::rasterize(&self.text, &self.cfg.text_style, &mut self.rng);
        if self.layout.is_empty() {
            info!("text {:?} rasterized to no pixels; slots will float", self.text);
        }
        for &idx in self.text_slots.iter().take(self.text_budget) {
            self.store.get_mut(idx).appearance.highlight();
        }
    }

    // ── per-frame choreography ────────────────────────────────────────────

    /// Assign targets for the active formation, then ease every transform.
    /// `elapsed` is seconds since start (drives the tree swirl); `camera` is
    /// the render camera position (drives the focus billboard).
    pub fn update(&mut self, elapsed: f32, camera: Vec3) {
        match self.formation {
            Formation::Tree => self.assign_tree(elapsed),
            Formation::Scatter => self.assign_scatter(),
            Formation::Focus => self.assign_focus(),
            Formation::Text => self.assign_text(),
        }

        let s = self.cfg.smoothing;
        for p in self.store.iter_mut() {
            p.position += (p.target_position - p.position) * s.position;
            p.rotation += (p.target_rotation - p.rotation) * s.rotation;
            p.scale += (p.target_scale - p.scale) * s.scale;
        }

        // The focused photo snaps to face the camera exactly — after the
        // easing pass, so the orientation is never a frame behind.
        if self.formation == Formation::Focus {
            if let Some(i) = self.focus {
                face_camera(self.store.get_mut(i), camera);
            }
        }
    }

    fn assign_tree(&mut self, elapsed: f32) {
        let cfg = self.cfg.tree;
        for p in self.store.iter_mut() {
            p.target_position = tree::swirl(p.tree_position, elapsed, &cfg);
            p.target_rotation = Vec3::ZERO;
            p.target_scale = Vec3::ONE;
        }
    }

    fn assign_scatter(&mut self) {
        let boundary = self.cfg.scatter.boundary_radius;
        for p in self.store.iter_mut() {
            scatter::step_drift(&mut p.base_position, &mut p.velocity, boundary);
            p.target_position = p.base_position;
            p.target_scale = Vec3::ONE;
            // Direct increment: scatter tumbling accumulates without bound
            // and never goes through the lerp.
            p.rotation += p.spin;
            p.target_rotation = p.rotation;
        }
    }

    fn assign_focus(&mut self) {
        let focus = self.focus;
        let fcfg = self.cfg.focus;
        let distance = self.cfg.scatter.background_distance;
        for (i, p) in self.store.iter_mut().enumerate() {
            if focus == Some(i) {
                p.target_position = fcfg.point;
                p.target_scale = fcfg.scale;
            } else {
                p.target_position = scatter::background_position(p.base_position, distance);
                p.target_rotation = Vec3::ZERO;
                p.target_scale = fcfg.background_scale;
            }
        }
    }

    fn assign_text(&mut self) {
        // Slot index per arena index; usize::MAX marks floaters.
        let mut slot_of = vec![usize::MAX; self.store.len()];
        for (k, &idx) in self.text_slots.iter().take(self.text_budget).enumerate() {
            slot_of[idx] = k;
        }

        let boundary = self.cfg.scatter.boundary_radius;
        let text_scale = self.cfg.text_particle_scale;
        for (i, p) in self.store.iter_mut().enumerate() {
            let target = if slot_of[i] != usize::MAX {
                self.layout.point(slot_of[i])
            } else {
                None
            };
            match target {
                Some(point) => {
                    p.target_position = point;
                    p.target_rotation = Vec3::ZERO;
                    p.target_scale = text_scale;
                }
                // Photos, the reserved share, and — when the layout is
                // empty — everyone: keep drifting behind the glyph.
                None => {
                    scatter::step_drift(&mut p.base_position, &mut p.velocity, boundary);
                    p.target_position = p.base_position;
                    p.target_rotation = Vec3::ZERO;
                    p.target_scale = Vec3::ONE;
                    if p.kind != ParticleKind::Photo {
                        p.appearance.restore();
                    }
                }
            }
        }
    }

    // ── photo insertion ───────────────────────────────────────────────────

    /// Insert a freshly decoded photo as a new particle.
    ///
    /// Runs on the frame thread; the arena append is atomic from the frame
    /// loop's point of view.  A surviving placeholder is destroyed first,
    /// with focus and text-slot indices fixed up for the shift.
    pub fn add_photo(&mut self, pixels: RgbaImage) {
        if let Some(removed) = self.store.remove_placeholder() {
            info!("placeholder photo replaced by first upload");
            self.focus = match self.focus {
                Some(f) if f == removed => None,
                Some(f) if f > removed => Some(f - 1),
                other => other,
            };
            for s in &mut self.text_slots {
                if *s > removed {
                    *s -= 1;
                }
            }
        }

        // Tree coordinate from the middle 80% of the spiral, clear of the
        // crowded apex and base.
        let count = self.store.len() + 1;
        let lo = count / 10;
        let hi = (count * 9 / 10).max(lo + 1);
        let spiral_index = self.rng.gen_range(lo..hi);

        let mut p = spawn(ParticleKind::Photo, spiral_index, count, &self.cfg, &mut self.rng);
        p.photo = Some(Arc::new(pixels));
        let idx = self.store.push(p);
        debug!(
            "photo particle added at index {} ({} photos total)",
            idx,
            self.store.photos().len()
        );
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Spawning helpers
// ════════════════════════════════════════════════════════════════════════════

fn spawn(
    kind: ParticleKind,
    spiral_index: usize,
    total: usize,
    cfg: &ChoreoConfig,
    rng: &mut StdRng,
) -> Particle {
    Particle::at_anchor(
        kind,
        scatter::sample_position(&cfg.scatter, rng),
        tree::spiral_cone(spiral_index, total, &cfg.tree),
        scatter::sample_drift(&cfg.scatter, rng),
        scatter::sample_spin(&cfg.scatter, rng),
        kind.default_appearance(),
    )
}

/// Exact camera-facing orientation, bypassing the lerp.
fn face_camera(p: &mut Particle, camera: Vec3) {
    let dir = camera - p.position;
    let len = dir.length();
    if len < 1e-6 {
        return;
    }
    let yaw = dir.x.atan2(dir.z);
    let pitch = (-dir.y / len).asin();
    p.rotation = Vec3::new(pitch, yaw, 0.0);
    p.target_rotation = p.rotation;
}

/// Neutral checkerboard shown in the photo slot until a real upload lands.
fn placeholder_pixels() -> RgbaImage {
    RgbaImage::from_fn(64, 64, |x, y| {
        if x < 2 || y < 2 || x >= 62 || y >= 62 {
            Rgba([90, 90, 100, 255])
        } else if (x / 8 + y / 8) % 2 == 0 {
            Rgba([200, 200, 210, 255])
        } else {
            Rgba([160, 160, 175, 255])
        }
    })
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn small_cfg(default_photo: bool) -> ChoreoConfig {
        ChoreoConfig {
            decoration_count: 20,
            candy_cane_every: 4,
            default_photo,
            ..ChoreoConfig::default()
        }
    }

    fn change(formation: Formation, text: &str) -> FormationChange {
        FormationChange {
            formation,
            text: text.to_string(),
        }
    }

    fn real_photo() -> RgbaImage {
        RgbaImage::new(4, 4)
    }

    #[test]
    fn population_matches_config() {
        let c = Choreographer::new(small_cfg(true), 1);
        assert_eq!(c.particles().len(), 21);
        assert_eq!(c.store().photos().len(), 1);
        assert!(c.store().has_placeholder());
        assert_eq!(c.formation(), Formation::Tree);
    }

    #[test]
    fn tree_targets_are_swirled_spiral_coordinates() {
        let mut c = Choreographer::new(small_cfg(false), 2);
        c.update(0.0, Vec3::new(0.0, 0.0, 10.0));
        for p in c.particles() {
            assert!(p.target_position.distance(p.tree_position) < 1e-5);
        }
    }

    #[test]
    fn smoothing_converges_on_the_target() {
        let mut c = Choreographer::new(small_cfg(false), 3);
        for _ in 0..400 {
            c.update(0.0, Vec3::new(0.0, 0.0, 10.0));
        }
        for p in c.particles() {
            assert!(p.position.distance(p.tree_position) < 1e-2);
            assert!(p.scale.distance(Vec3::ONE) < 1e-3);
        }
    }

    #[test]
    fn focus_selection_is_a_member_of_the_photo_set() {
        let mut c = Choreographer::new(small_cfg(true), 4);
        c.add_photo(real_photo());
        c.add_photo(real_photo());
        c.apply(&change(Formation::Focus, ""));
        let f = c.focus().expect("a photo should be selected");
        assert!(c.store().photos().contains(&f));
    }

    #[test]
    fn focus_with_no_photos_selects_nothing() {
        let mut c = Choreographer::new(small_cfg(false), 5);
        c.apply(&change(Formation::Focus, ""));
        assert!(c.focus().is_none());
        c.update(0.0, Vec3::new(0.0, 0.0, 10.0));
        for p in c.particles() {
            assert_eq!(p.target_scale, FocusConfig::default().background_scale);
        }
    }

    #[test]
    fn focus_reentry_draws_from_the_full_set() {
        let mut c = Choreographer::new(small_cfg(false), 6);
        for _ in 0..4 {
            c.add_photo(real_photo());
        }
        let mut seen = std::collections::HashSet::new();
        for _ in 0..30 {
            c.apply(&change(Formation::Focus, ""));
            seen.insert(c.focus().unwrap());
            c.apply(&change(Formation::Scatter, ""));
            assert!(c.focus().is_none(), "selection must not survive exit");
        }
        assert!(seen.len() > 1, "selection never varied across re-entries");
    }

    #[test]
    fn reapplying_the_held_state_keeps_the_selection() {
        let mut c = Choreographer::new(small_cfg(true), 7);
        c.apply(&change(Formation::Focus, ""));
        let first = c.focus();
        c.apply(&change(Formation::Focus, ""));
        assert_eq!(c.focus(), first);
    }

    #[test]
    fn focused_photo_faces_the_camera_exactly() {
        let mut c = Choreographer::new(small_cfg(true), 8);
        c.apply(&change(Formation::Focus, ""));
        let camera = Vec3::new(0.0, 2.0, 12.0);
        c.update(0.0, camera);
        let p = &c.particles()[c.focus().unwrap()];
        let dir = camera - p.position;
        assert!((p.rotation.y - dir.x.atan2(dir.z)).abs() < 1e-5);
        assert_eq!(p.rotation, p.target_rotation);
    }

    #[test]
    fn text_budget_reserves_a_tenth_of_eligible_particles() {
        let mut c = Choreographer::new(small_cfg(true), 9);
        c.apply(&change(Formation::Text, "2"));
        // 20 eligible (the photo is excluded), 90% of 20 = 18.
        assert_eq!(c.text_budget(), 18);

        let highlighted = c
            .particles()
            .iter()
            .filter(|p| p.appearance.is_highlighted())
            .count();
        assert_eq!(highlighted, 18);
        for &i in c.store().photos() {
            assert!(!c.particles()[i].appearance.is_highlighted());
        }
    }

    #[test]
    fn leaving_text_restores_every_appearance() {
        let mut c = Choreographer::new(small_cfg(true), 10);
        c.apply(&change(Formation::Text, "2"));
        c.update(0.0, Vec3::new(0.0, 0.0, 10.0));
        c.apply(&change(Formation::Tree, "2"));
        assert!(c.particles().iter().all(|p| !p.appearance.is_highlighted()));
    }

    #[test]
    fn empty_text_floats_everything() {
        let mut c = Choreographer::new(small_cfg(false), 11);
        c.apply(&change(Formation::Text, ""));
        c.update(0.0, Vec3::new(0.0, 0.0, 10.0));
        for p in c.particles() {
            // Floating: target tracks the drifting anchor, full scale.
            assert_eq!(p.target_position, p.base_position);
            assert_eq!(p.target_scale, Vec3::ONE);
            assert!(!p.appearance.is_highlighted());
        }
    }

    #[test]
    fn glyph_targets_sit_on_the_text_plane() {
        let mut c = Choreographer::new(small_cfg(false), 12);
        c.apply(&change(Formation::Text, "2"));
        c.update(0.0, Vec3::new(0.0, 0.0, 10.0));
        let budget = c.text_budget();
        let mut on_plane = 0;
        for p in c.particles() {
            if p.target_position.z == 0.0 && p.target_scale == Vec3::splat(0.5) {
                on_plane += 1;
            }
        }
        assert_eq!(on_plane, budget);
    }

    #[test]
    fn scatter_spin_accumulates_without_bound() {
        let mut c = Choreographer::new(small_cfg(false), 13);
        c.apply(&change(Formation::Scatter, ""));
        c.update(0.0, Vec3::ZERO);
        let early: Vec<Vec3> = c.particles().iter().map(|p| p.rotation).collect();
        for _ in 0..50 {
            c.update(0.0, Vec3::ZERO);
        }
        // Spin components are sampled in [0, max], so rotation only grows.
        let grew = c
            .particles()
            .iter()
            .zip(&early)
            .filter(|(p, e)| p.rotation.length() > e.length() + 1e-4)
            .count();
        assert!(grew > 0, "no particle accumulated rotation");
    }

    #[test]
    fn add_photo_replaces_the_placeholder_net_zero() {
        let mut c = Choreographer::new(small_cfg(true), 14);
        let before = c.particles().len();
        c.add_photo(real_photo());
        assert_eq!(c.particles().len(), before);
        assert_eq!(c.store().photos().len(), 1);
        assert!(!c.store().has_placeholder());

        // Subsequent photos append.
        c.add_photo(real_photo());
        assert_eq!(c.particles().len(), before + 1);
        assert_eq!(c.store().photos().len(), 2);
    }

    #[test]
    fn add_photo_without_placeholder_grows_both_collections() {
        let mut c = Choreographer::new(small_cfg(false), 15);
        let before = c.particles().len();
        c.add_photo(real_photo());
        assert_eq!(c.particles().len(), before + 1);
        assert_eq!(c.store().photos().len(), 1);
    }

    #[test]
    fn placeholder_removal_clears_a_focus_on_it() {
        let mut c = Choreographer::new(small_cfg(true), 16);
        c.apply(&change(Formation::Focus, ""));
        assert!(c.focus().is_some());
        c.add_photo(real_photo());
        // The focused placeholder is gone; no dangling index survives.
        assert!(c.focus().is_none());
    }

    #[test]
    fn new_photo_tree_position_avoids_apex_and_base() {
        let mut c = Choreographer::new(small_cfg(false), 17);
        for _ in 0..10 {
            c.add_photo(real_photo());
        }
        let cfg = TreeConfig::default();
        for &i in c.store().photos() {
            let y = c.particles()[i].tree_position.y;
            assert!(y > cfg.height_min && y < cfg.height_max);
        }
    }
}
