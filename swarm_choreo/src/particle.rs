//! Particle data model and the arena that owns every particle.
//!
//! The arena is an append-only `Vec` with stable indices; the photo subset
//! and the focus selection are plain indices into it, never separate
//! ownership.  The single exception to "append-only" is the startup
//! placeholder photo, which is removed once the first real photo arrives —
//! that removal is the only index-shifting operation and performs explicit
//! fix-up of the photo list.

use std::sync::Arc;

use glam::Vec3;
use image::RgbaImage;

// ════════════════════════════════════════════════════════════════════════════
// ParticleKind / Appearance
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticleKind {
    Decoration,
    CandyCane,
    Photo,
}

impl ParticleKind {
    /// The renderer material each kind starts with.
    pub fn default_appearance(self) -> AppearanceId {
        match self {
            ParticleKind::Decoration => 0,
            ParticleKind::CandyCane => 1,
            ParticleKind::Photo => 2,
        }
    }
}

/// Renderer-side material handle.  The choreography layer never dereferences
/// it; it only saves and restores it around the text highlight.
pub type AppearanceId = u32;

/// Current appearance, modeled so the original handle travels with the
/// highlighted state — there is no separate "did we save it" flag to forget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Appearance {
    Normal(AppearanceId),
    Highlighted { saved: AppearanceId },
}

impl Appearance {
    /// Swap to the shared highlight, remembering the original.  Idempotent.
    pub fn highlight(&mut self) {
        if let Appearance::Normal(id) = *self {
            *self = Appearance::Highlighted { saved: id };
        }
    }

    /// Restore the saved original.  Idempotent.
    pub fn restore(&mut self) {
        if let Appearance::Highlighted { saved } = *self {
            *self = Appearance::Normal(saved);
        }
    }

    pub fn is_highlighted(&self) -> bool {
        matches!(self, Appearance::Highlighted { .. })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Particle
// ════════════════════════════════════════════════════════════════════════════

/// One visual item.  The current transform is mutated only by the
/// choreographer's smoothing pass; everything else is assignment targets and
/// per-particle constants.
#[derive(Clone, Debug)]
pub struct Particle {
    pub kind: ParticleKind,

    // ── current transform (smoothed) ─────────────────────────────────────
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,

    // ── per-frame goal ───────────────────────────────────────────────────
    pub target_position: Vec3,
    pub target_rotation: Vec3,
    pub target_scale: Vec3,

    // ── constants assigned at creation ───────────────────────────────────
    /// Drifting anchor used by scatter and by idle particles elsewhere.
    pub base_position: Vec3,
    /// Fixed spiral-cone coordinate; only the tree formation reads it.
    pub tree_position: Vec3,
    /// Constant drift, negated on boundary bounce.
    pub velocity: Vec3,
    /// Constant rotation increment applied while scattered.
    pub spin: Vec3,

    pub appearance: Appearance,
    /// Decoded pixels; photos only.  Shared with the renderer, released when
    /// the particle is destroyed.
    pub photo: Option<Arc<RgbaImage>>,
}

impl Particle {
    /// A particle at rest on its drifting anchor.
    pub fn at_anchor(
        kind: ParticleKind,
        base_position: Vec3,
        tree_position: Vec3,
        velocity: Vec3,
        spin: Vec3,
        appearance_id: AppearanceId,
    ) -> Self {
        Particle {
            kind,
            position: base_position,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            target_position: base_position,
            target_rotation: Vec3::ZERO,
            target_scale: Vec3::ONE,
            base_position,
            tree_position,
            velocity,
            spin,
            appearance: Appearance::Normal(appearance_id),
            photo: None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ParticleStore
// ════════════════════════════════════════════════════════════════════════════

/// The arena.  Photos are tracked twice: in the main list like everything
/// else, and in a secondary index list used for focus selection.
#[derive(Debug, Default)]
pub struct ParticleStore {
    particles: Vec<Particle>,
    photos: Vec<usize>,
    placeholder: Option<usize>,
}

impl ParticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fully-constructed particle; returns its arena index.
    /// Photos are registered in the photo list as part of the same call, so
    /// no observer ever sees one collection updated without the other.
    pub fn push(&mut self, particle: Particle) -> usize {
        let idx = self.particles.len();
        if particle.kind == ParticleKind::Photo {
            self.photos.push(idx);
        }
        self.particles.push(particle);
        idx
    }

    /// Append the startup placeholder photo.
    pub fn push_placeholder(&mut self, particle: Particle) -> usize {
        debug_assert_eq!(particle.kind, ParticleKind::Photo);
        let idx = self.push(particle);
        self.placeholder = Some(idx);
        idx
    }

    /// Destroy the placeholder, if still present, dropping its pixels and
    /// fixing up the photo index list.  Returns the removed arena index so
    /// the caller can fix its own references.
    pub fn remove_placeholder(&mut self) -> Option<usize> {
        let removed = self.placeholder.take()?;
        self.particles.remove(removed);
        self.photos.retain(|&i| i != removed);
        for i in &mut self.photos {
            if *i > removed {
                *i -= 1;
            }
        }
        Some(removed)
    }

    pub fn has_placeholder(&self) -> bool {
        self.placeholder.is_some()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn get(&self, idx: usize) -> &Particle {
        &self.particles[idx]
    }

    pub fn get_mut(&mut self, idx: usize) -> &mut Particle {
        &mut self.particles[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Particle> {
        self.particles.iter_mut()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Arena indices of photo particles, in insertion order.
    pub fn photos(&self) -> &[usize] {
        &self.photos
    }

    /// Arena indices of non-photo particles, in stable arena order.  Text
    /// slots are assigned from this explicit partition rather than from raw
    /// index arithmetic, so photo insertion order can never skew the glyph.
    pub fn eligible_indices(&self) -> Vec<usize> {
        self.particles
            .iter()
            .enumerate()
            .filter(|(_, p)| p.kind != ParticleKind::Photo)
            .map(|(i, _)| i)
            .collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn bare(kind: ParticleKind) -> Particle {
        Particle::at_anchor(kind, Vec3::ZERO, Vec3::ZERO, Vec3::ZERO, Vec3::ZERO, 0)
    }

    fn photo() -> Particle {
        let mut p = bare(ParticleKind::Photo);
        p.photo = Some(Arc::new(RgbaImage::new(2, 2)));
        p
    }

    #[test]
    fn push_registers_photos_in_both_collections() {
        let mut store = ParticleStore::new();
        store.push(bare(ParticleKind::Decoration));
        let idx = store.push(photo());
        assert_eq!(store.len(), 2);
        assert_eq!(store.photos(), &[idx]);
    }

    #[test]
    fn placeholder_removal_fixes_photo_indices() {
        let mut store = ParticleStore::new();
        store.push(bare(ParticleKind::Decoration));
        let ph = store.push_placeholder(photo());
        let later = store.push(photo());
        assert_eq!(store.photos(), &[ph, later]);

        let removed = store.remove_placeholder().unwrap();
        assert_eq!(removed, ph);
        assert_eq!(store.len(), 2);
        // The later photo shifted down by one.
        assert_eq!(store.photos(), &[later - 1]);
        assert!(!store.has_placeholder());
        // Second removal is a no-op.
        assert!(store.remove_placeholder().is_none());
    }

    #[test]
    fn eligible_partition_excludes_photos_in_stable_order() {
        let mut store = ParticleStore::new();
        store.push(bare(ParticleKind::Decoration));
        store.push(photo());
        store.push(bare(ParticleKind::CandyCane));
        store.push(bare(ParticleKind::Decoration));
        assert_eq!(store.eligible_indices(), vec![0, 2, 3]);
    }

    #[test]
    fn appearance_save_restore_round_trip() {
        let mut a = Appearance::Normal(7);
        a.highlight();
        assert!(a.is_highlighted());
        // A second highlight must not clobber the saved original.
        a.highlight();
        a.restore();
        assert_eq!(a, Appearance::Normal(7));
        // Restoring a normal appearance is a no-op.
        a.restore();
        assert_eq!(a, Appearance::Normal(7));
    }
}
