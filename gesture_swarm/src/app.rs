//! Top-level application state and the frame loop.
//!
//! `AppState` owns the interaction controller, the choreographer, and the
//! orbit camera.  Each frame, strictly in order: drain the newest gesture
//! signal, resolve it against the hover channel, apply any formation change,
//! choreograph and smooth the particles, hand the arena to the visualizer.

use std::path::PathBuf;
use std::time::Instant;

use glam::Vec3;
use image::RgbaImage;
use log::info;

use hand_signal::{Gesture, GestureConfig, GestureSignal};
use swarm_choreo::{ChoreoConfig, Choreographer, Formation, InteractionController, Vocabulary};

use crate::error::AppError;
use crate::input::{latest_signal, spawn_signal_source, ClassifierSource, PhotoLoader};
use crate::visualizer::Visualizer;

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application.
pub struct AppConfig {
    pub gestures: GestureConfig,
    pub choreo: ChoreoConfig,
    pub vocabulary: Vocabulary,
    pub orbit: OrbitConfig,
    pub seed: u64,
    /// Photos queued for the upload key, decoded in order.
    pub photo_paths: Vec<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            gestures: GestureConfig::default(),
            choreo: ChoreoConfig::default(),
            vocabulary: Vocabulary::default(),
            orbit: OrbitConfig::default(),
            seed: 2026,
            photo_paths: Vec::new(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// OrbitCamera — hand position steers the view
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug)]
pub struct OrbitConfig {
    pub radius: f32,
    pub height: f32,
    /// Full azimuth sweep in radians as the hand crosses the frame.
    pub span: f32,
    /// Fraction of the remaining angle covered per frame.
    pub smoothing: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        OrbitConfig {
            radius: 14.0,
            height: 2.0,
            span: std::f32::consts::PI,
            smoothing: 0.05,
        }
    }
}

pub struct OrbitCamera {
    cfg: OrbitConfig,
    azimuth: f32,
    target_azimuth: f32,
}

impl OrbitCamera {
    pub fn new(cfg: OrbitConfig) -> Self {
        OrbitCamera {
            cfg,
            azimuth: 0.0,
            target_azimuth: 0.0,
        }
    }

    /// Steer toward the normalized hand position; 0.5 is dead center.
    pub fn steer(&mut self, hand_x: f32) {
        self.target_azimuth = (hand_x - 0.5) * self.cfg.span;
    }

    pub fn tick(&mut self) {
        self.azimuth += (self.target_azimuth - self.azimuth) * self.cfg.smoothing;
    }

    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    pub fn position(&self) -> Vec3 {
        let (sin, cos) = self.azimuth.sin_cos();
        Vec3::new(self.cfg.radius * sin, self.cfg.height, self.cfg.radius * cos)
    }

    pub fn config(&self) -> OrbitConfig {
        self.cfg
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    controller: InteractionController,
    choreo: Choreographer,
    camera: OrbitCamera,
    last_signal: GestureSignal,
    pub status: String,
}

impl AppState {
    pub fn new(cfg: &AppConfig) -> Self {
        AppState {
            controller: InteractionController::new(cfg.vocabulary.clone()),
            choreo: Choreographer::new(cfg.choreo.clone(), cfg.seed),
            camera: OrbitCamera::new(cfg.orbit),
            last_signal: GestureSignal::neutral(),
            status: "ready - F tree  O scatter  P focus  1-5 text  U photo".to_string(),
        }
    }

    /// Feed one frame of input.  `fresh` is the newest camera signal if one
    /// was published since the last frame; the previous signal stays in
    /// effect otherwise.
    pub fn handle_input(&mut self, fresh: Option<GestureSignal>, hover: Option<Gesture>) {
        if let Some(signal) = fresh {
            self.last_signal = signal;
        }

        if let Some(change) = self.controller.resolve(self.last_signal.gesture, hover) {
            self.status = match change.formation {
                Formation::Tree => "tree".to_string(),
                Formation::Scatter => "scatter".to_string(),
                Formation::Focus => "focus".to_string(),
                Formation::Text => format!("text: {}", change.text),
            };
            self.choreo.apply(&change);
        }

        self.camera.steer(self.last_signal.position.x);
    }

    /// Advance one frame of choreography.
    pub fn frame(&mut self, elapsed: f32) {
        self.camera.tick();
        self.choreo.update(elapsed, self.camera.position());
    }

    pub fn add_photo(&mut self, pixels: RgbaImage) {
        self.choreo.add_photo(pixels);
        self.status = format!("photo added: {} in the set", self.choreo.store().photos().len());
    }

    pub fn choreo(&self) -> &Choreographer {
        &self.choreo
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application at ~60 fps until the window closes.
///
/// The camera channel is wired to an idle classifier source — it publishes
/// neutral signals at camera rate until a real tracker feed replaces it, so
/// the hover keyboard vocabulary governs.  Replace
/// [`ClassifierSource::idle`] with a source wrapping a live `HandFrame`
/// feed to drive everything from a camera.
pub fn run(cfg: AppConfig) -> Result<(), AppError> {
    let signal_rx = spawn_signal_source(ClassifierSource::idle(cfg.gestures));
    let loader = PhotoLoader::spawn();
    let mut queued_photos = cfg.photo_paths.clone().into_iter();

    let mut vis = Visualizer::new()?;
    let mut app = AppState::new(&cfg);
    let started = Instant::now();

    info!("frame loop starting");
    while vis.is_open() {
        let input = vis.poll_input();
        if input.quit {
            break;
        }

        if input.add_photo {
            match queued_photos.next() {
                Some(path) => loader.request(path),
                None => app.status = "no photos queued - pass paths on the command line".into(),
            }
        }
        // Decoded photos land between frames as atomic appends.
        for pixels in loader.drain() {
            app.add_photo(pixels);
        }

        app.handle_input(latest_signal(&signal_rx), input.hover);
        app.frame(started.elapsed().as_secs_f32());

        vis.render(&app);
    }

    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn small_app() -> AppState {
        let cfg = AppConfig {
            choreo: ChoreoConfig {
                decoration_count: 20,
                ..ChoreoConfig::default()
            },
            ..AppConfig::default()
        };
        AppState::new(&cfg)
    }

    fn signal(gesture: Gesture, x: f32) -> GestureSignal {
        GestureSignal {
            gesture,
            position: glam::Vec2::new(x, 0.5),
        }
    }

    #[test]
    fn hover_governs_while_the_camera_is_silent() {
        let mut app = small_app();
        app.handle_input(None, Some(Gesture::Open));
        assert_eq!(app.choreo().formation(), Formation::Scatter);
    }

    #[test]
    fn camera_signal_overrides_hover() {
        let mut app = small_app();
        app.handle_input(Some(signal(Gesture::Pinch, 0.5)), Some(Gesture::Open));
        assert_eq!(app.choreo().formation(), Formation::Focus);
    }

    #[test]
    fn stalled_camera_keeps_the_last_signal_in_effect() {
        let mut app = small_app();
        app.handle_input(Some(signal(Gesture::Fist, 0.2)), None);
        // No new publication this frame; the held fist still governs and
        // the hover channel stays overridden.
        app.handle_input(None, Some(Gesture::Open));
        assert_eq!(app.choreo().formation(), Formation::Tree);
    }

    #[test]
    fn numeric_hover_enters_text_with_vocabulary_word() {
        let mut app = small_app();
        app.handle_input(None, Some(Gesture::Two));
        assert_eq!(app.choreo().formation(), Formation::Text);
        assert_eq!(app.choreo().text(), "2");
        assert_eq!(app.status, "text: 2");
    }

    #[test]
    fn hand_position_steers_the_orbit() {
        let mut app = small_app();
        app.handle_input(Some(signal(Gesture::Open, 1.0)), None);
        for _ in 0..200 {
            app.frame(0.0);
        }
        let half_span = OrbitConfig::default().span / 2.0;
        assert!((app.camera().azimuth() - half_span).abs() < 1e-2);
    }

    #[test]
    fn neutral_position_centers_the_orbit() {
        let mut app = small_app();
        app.handle_input(Some(GestureSignal::neutral()), None);
        for _ in 0..50 {
            app.frame(0.0);
        }
        assert!(app.camera().azimuth().abs() < 1e-3);
    }

    #[test]
    fn photos_append_through_the_app_surface() {
        let mut app = small_app();
        let photos_before = app.choreo().store().photos().len();
        app.add_photo(RgbaImage::new(4, 4));
        // The startup placeholder is replaced, so the photo count holds at
        // one real photo.
        assert_eq!(app.choreo().store().photos().len(), photos_before);
        assert!(!app.choreo().store().has_placeholder());
    }
}
