//! The interaction state machine — the only origin of formation changes.
//!
//! Camera gestures always win; the hover channel (a pointer/keyboard
//! substitute with the same vocabulary) governs only while the camera
//! reports `None`.  A change event fires on *change* of the effective
//! gesture, never while one is held, so entry logic downstream runs exactly
//! once per transition.

use std::collections::HashMap;

use hand_signal::Gesture;
use log::debug;

// ════════════════════════════════════════════════════════════════════════════
// Formation / FormationChange
// ════════════════════════════════════════════════════════════════════════════

/// The active global layout mode for all particles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Formation {
    Tree,
    Scatter,
    Focus,
    Text,
}

/// An explicit transition event, produced here and consumed once by the
/// choreographer — no per-frame "did it change" polling anywhere else.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormationChange {
    pub formation: Formation,
    /// Auxiliary text; meaningful only when `formation` is [`Formation::Text`].
    pub text: String,
}

// ════════════════════════════════════════════════════════════════════════════
// Vocabulary
// ════════════════════════════════════════════════════════════════════════════

/// The gesture → text table for the text formation.  Gestures without an
/// entry resolve to the empty string (which rasterizes to an empty layout).
#[derive(Clone, Debug)]
pub struct Vocabulary {
    map: HashMap<Gesture, String>,
}

impl Vocabulary {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Gesture, S)>,
        S: Into<String>,
    {
        Vocabulary {
            map: entries.into_iter().map(|(g, s)| (g, s.into())).collect(),
        }
    }

    pub fn text_for(&self, gesture: Gesture) -> String {
        self.map.get(&gesture).cloned().unwrap_or_default()
    }
}

impl Default for Vocabulary {
    /// Finger counts spell themselves out.
    fn default() -> Self {
        Vocabulary::new([
            (Gesture::One, "1"),
            (Gesture::Two, "2"),
            (Gesture::Three, "3"),
            (Gesture::Four, "4"),
            (Gesture::Five, "5"),
        ])
    }
}

// ════════════════════════════════════════════════════════════════════════════
// InteractionController
// ════════════════════════════════════════════════════════════════════════════

pub struct InteractionController {
    formation: Formation,
    text: String,
    last_effective: Gesture,
    vocabulary: Vocabulary,
}

impl InteractionController {
    pub fn new(vocabulary: Vocabulary) -> Self {
        InteractionController {
            formation: Formation::Tree,
            text: String::new(),
            last_effective: Gesture::None,
            vocabulary,
        }
    }

    pub fn formation(&self) -> Formation {
        self.formation
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Resolve one frame of input into at most one transition event.
    ///
    /// * Effective gesture = camera if not `None`, else hover if present.
    /// * `None` retains the previous formation and text.
    /// * A held gesture (no change since last frame) never re-triggers.
    pub fn resolve(
        &mut self,
        camera: Gesture,
        hover: Option<Gesture>,
    ) -> Option<FormationChange> {
        let effective = if camera != Gesture::None {
            camera
        } else {
            hover.unwrap_or(Gesture::None)
        };

        if effective == self.last_effective {
            return None;
        }
        self.last_effective = effective;

        let (formation, text) = match effective {
            Gesture::Pinch => (Formation::Focus, self.text.clone()),
            Gesture::Fist => (Formation::Tree, self.text.clone()),
            Gesture::Open => (Formation::Scatter, self.text.clone()),
            Gesture::One
            | Gesture::Two
            | Gesture::Three
            | Gesture::Four
            | Gesture::Five => (Formation::Text, self.vocabulary.text_for(effective)),
            Gesture::None => return None,
        };

        debug!(
            "gesture {:?} → formation {:?} (text {:?})",
            effective, formation, text
        );
        self.formation = formation;
        self.text = text.clone();
        Some(FormationChange { formation, text })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
