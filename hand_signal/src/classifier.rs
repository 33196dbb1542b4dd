//! Per-frame gesture classification.
//!
//! One [`HandFrame`] in, one [`GestureSignal`] out.  No state is kept between
//! frames — debouncing and change detection belong to the interaction layer,
//! which only reacts to *changes* of the classified gesture.

use glam::Vec2;

use crate::landmark::{index, planar_distance, HandFrame};

// ════════════════════════════════════════════════════════════════════════════
// Gesture / GestureSignal
// ════════════════════════════════════════════════════════════════════════════

/// A discrete hand gesture.
///
/// `One` and `Five` are part of the vocabulary for the hover substitute
/// channel; the camera classifier itself resolves a single extended finger to
/// `None` and five to `Open`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Gesture {
    Pinch,
    Fist,
    Open,
    One,
    Two,
    Three,
    Four,
    Five,
    /// No hand detected, or nothing matched.
    None,
}

/// Classification result for one frame: the gesture plus the raw palm-center
/// position (normalized camera space), used downstream for rotation control.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureSignal {
    pub gesture: Gesture,
    pub position: Vec2,
}

impl GestureSignal {
    /// The signal a collaborator must synthesize for a frame with no hand:
    /// `None` at the screen center.  Publishing the last known position
    /// instead would freeze rotation at wherever the hand vanished.
    pub fn neutral() -> Self {
        GestureSignal {
            gesture: Gesture::None,
            position: Vec2::new(0.5, 0.5),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureConfig
// ════════════════════════════════════════════════════════════════════════════

/// Distance thresholds in normalized camera space.
#[derive(Clone, Copy, Debug)]
pub struct GestureConfig {
    /// Thumb-tip ↔ index-tip distance below which the frame is a pinch.
    pub pinch_threshold: f32,
    /// Mean wrist → fingertip spread below which a zero-count hand is a fist.
    pub fist_threshold: f32,
    /// Mean wrist → fingertip spread above which the hand is open.
    pub open_threshold: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        GestureConfig {
            pinch_threshold: 0.06,
            fist_threshold: 0.22,
            open_threshold: 0.38,
        }
    }
}

/// A fingertip counts as extended when it sits this much farther from the
/// wrist than its middle joint does.  The ratio (rather than an absolute
/// distance) keeps the count stable as the hand approaches the camera.
const EXTENSION_RATIO: f32 = 1.2;

// ════════════════════════════════════════════════════════════════════════════
// classify
// ════════════════════════════════════════════════════════════════════════════

/// Classify one frame.  Deterministic: identical frames yield identical
/// signals.
pub fn classify(frame: &HandFrame, cfg: &GestureConfig) -> GestureSignal {
    let wrist = frame.point(index::WRIST);

    let pinch_distance = planar_distance(
        frame.point(index::THUMB_TIP),
        frame.point(index::INDEX_TIP),
    );

    // Mean spread from wrist to the four non-thumb fingertips.
    let tips = [
        index::INDEX_TIP,
        index::MIDDLE_TIP,
        index::RING_TIP,
        index::PINKY_TIP,
    ];
    let spread = tips
        .iter()
        .map(|&t| planar_distance(wrist, frame.point(t)))
        .sum::<f32>()
        / tips.len() as f32;

    let extended = extended_finger_count(frame);

    // First match wins.
    let gesture = if pinch_distance < cfg.pinch_threshold {
        Gesture::Pinch
    } else if extended == 0 && spread < cfg.fist_threshold {
        Gesture::Fist
    } else if extended == 2 {
        Gesture::Two
    } else if extended == 3 {
        Gesture::Three
    } else if extended == 4 {
        Gesture::Four
    } else if spread > cfg.open_threshold || extended >= 5 {
        Gesture::Open
    } else {
        Gesture::None
    };

    GestureSignal {
        gesture,
        position: frame.palm_center().xy(),
    }
}

/// Count extended fingers (0–5).
///
/// The thumb can't be measured against the wrist (it barely moves away from
/// it when curled), so it is measured against the pinky base instead: curled,
/// the tip tucks across the palm toward that corner.
fn extended_finger_count(frame: &HandFrame) -> usize {
    let wrist = frame.point(index::WRIST);
    let pinky_base = frame.point(index::PINKY_MCP);

    let thumb_tip = planar_distance(frame.point(index::THUMB_TIP), pinky_base);
    let thumb_joint = planar_distance(frame.point(index::THUMB_IP), pinky_base);
    let mut count = usize::from(thumb_tip > thumb_joint);

    let fingers = [
        (index::INDEX_TIP, index::INDEX_PIP),
        (index::MIDDLE_TIP, index::MIDDLE_PIP),
        (index::RING_TIP, index::RING_PIP),
        (index::PINKY_TIP, index::PINKY_PIP),
    ];
    for (tip, pip) in fingers {
        let tip_dist = planar_distance(wrist, frame.point(tip));
        let pip_dist = planar_distance(wrist, frame.point(pip));
        if tip_dist > EXTENSION_RATIO * pip_dist {
            count += 1;
        }
    }
    count
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{Landmark, LANDMARK_COUNT};

    /// A hand skeleton at a fixed pose; individual tests bend the digits.
    ///
    /// Wrist bottom-center, knuckle row above it, y grows downward as in
    /// camera space.
    fn skeleton() -> [Landmark; LANDMARK_COUNT] {
        let mut p = [Landmark::default(); LANDMARK_COUNT];
        p[index::WRIST] = Landmark::new(0.50, 0.90, 0.0);
        p[index::THUMB_CMC] = Landmark::new(0.42, 0.86, 0.0);
        p[index::THUMB_MCP] = Landmark::new(0.40, 0.82, 0.0);
        p[index::THUMB_IP] = Landmark::new(0.38, 0.78, 0.0);
        p[index::INDEX_MCP] = Landmark::new(0.42, 0.74, 0.0);
        p[index::INDEX_PIP] = Landmark::new(0.44, 0.71, 0.0);
        p[index::INDEX_DIP] = Landmark::new(0.43, 0.68, 0.0);
        p[index::MIDDLE_MCP] = Landmark::new(0.50, 0.68, 0.0);
        p[index::MIDDLE_PIP] = Landmark::new(0.48, 0.70, 0.0);
        p[index::MIDDLE_DIP] = Landmark::new(0.48, 0.66, 0.0);
        p[index::RING_MCP] = Landmark::new(0.56, 0.74, 0.0);
        p[index::RING_PIP] = Landmark::new(0.56, 0.70, 0.0);
        p[index::RING_DIP] = Landmark::new(0.56, 0.66, 0.0);
        p[index::PINKY_MCP] = Landmark::new(0.68, 0.78, 0.0);
        p[index::PINKY_PIP] = Landmark::new(0.62, 0.72, 0.0);
        p[index::PINKY_DIP] = Landmark::new(0.62, 0.68, 0.0);
        p
    }

    const EXTENDED_TIPS: [(usize, f32, f32); 4] = [
        (index::INDEX_TIP, 0.34, 0.40),
        (index::MIDDLE_TIP, 0.44, 0.38),
        (index::RING_TIP, 0.54, 0.38),
        (index::PINKY_TIP, 0.64, 0.42),
    ];
    const CURLED_TIPS: [(usize, f32, f32); 4] = [
        (index::INDEX_TIP, 0.42, 0.76),
        (index::MIDDLE_TIP, 0.48, 0.76),
        (index::RING_TIP, 0.56, 0.76),
        (index::PINKY_TIP, 0.62, 0.76),
    ];
    /// Tucked across the palm: closer to the pinky base than the thumb joint.
    const THUMB_CURLED: (f32, f32) = (0.52, 0.78);
    /// Swung wide of the palm: farther from the pinky base than the joint.
    const THUMB_EXTENDED: (f32, f32) = (0.26, 0.70);

    fn frame(thumb: (f32, f32), extended_fingers: usize) -> HandFrame {
        let mut p = skeleton();
        p[index::THUMB_TIP] = Landmark::new(thumb.0, thumb.1, 0.0);
        for (i, &(idx, x, y)) in EXTENDED_TIPS.iter().enumerate() {
            if i < extended_fingers {
                p[idx] = Landmark::new(x, y, 0.0);
            } else {
                let (cidx, cx, cy) = CURLED_TIPS[i];
                debug_assert_eq!(cidx, idx);
                p[idx] = Landmark::new(cx, cy, 0.0);
            }
        }
        HandFrame::new(p)
    }

    fn gesture_of(f: &HandFrame) -> Gesture {
        classify(f, &GestureConfig::default()).gesture
    }

    #[test]
    fn open_hand_classifies_open() {
        assert_eq!(gesture_of(&frame(THUMB_EXTENDED, 4)), Gesture::Open);
    }

    #[test]
    fn fist_classifies_fist() {
        assert_eq!(gesture_of(&frame(THUMB_CURLED, 0)), Gesture::Fist);
    }

    #[test]
    fn pinch_beats_everything() {
        // Open pose, but thumb tip touching index tip.
        let mut p = skeleton();
        for &(idx, x, y) in &EXTENDED_TIPS {
            p[idx] = Landmark::new(x, y, 0.0);
        }
        p[index::INDEX_TIP] = Landmark::new(0.40, 0.45, 0.0);
        p[index::THUMB_TIP] = Landmark::new(0.40, 0.45, 0.0);
        assert_eq!(gesture_of(&HandFrame::new(p)), Gesture::Pinch);
    }

    #[test]
    fn finger_counts_map_to_numeric_gestures() {
        assert_eq!(gesture_of(&frame(THUMB_CURLED, 2)), Gesture::Two);
        assert_eq!(gesture_of(&frame(THUMB_CURLED, 3)), Gesture::Three);
        assert_eq!(gesture_of(&frame(THUMB_CURLED, 4)), Gesture::Four);
    }

    #[test]
    fn single_finger_falls_through_to_none() {
        // One pointing finger: not a fist (count != 0), not numeric, spread
        // too small for open.
        assert_eq!(gesture_of(&frame(THUMB_CURLED, 1)), Gesture::None);
    }

    #[test]
    fn classification_is_idempotent() {
        let f = frame(THUMB_EXTENDED, 4);
        let a = classify(&f, &GestureConfig::default());
        let b = classify(&f, &GestureConfig::default());
        assert_eq!(a, b);
    }

    #[test]
    fn signal_carries_palm_center() {
        let f = frame(THUMB_CURLED, 0);
        let sig = classify(&f, &GestureConfig::default());
        assert_eq!(sig.position, Vec2::new(0.50, 0.68));
    }

    #[test]
    fn neutral_signal_is_centered_none() {
        let n = GestureSignal::neutral();
        assert_eq!(n.gesture, Gesture::None);
        assert_eq!(n.position, Vec2::new(0.5, 0.5));
    }
}
