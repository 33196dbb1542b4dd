//! Software-projected visualizer using `minifb`.
//!
//! Point-sprite rendering only: the arena's smoothed transforms are
//! projected through the orbit camera, painter-sorted, and splatted into a
//! framebuffer.  Photos draw their own pixels; everything else is a colored
//! sprite.  A status bar and key legend sit at the bottom.

use std::sync::Arc;

use glam::Vec3;
use image::RgbaImage;
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use rand::rngs::StdRng;
use rand::SeedableRng;

use formation_field::{font, scatter, ScatterConfig};
use hand_signal::Gesture;
use swarm_choreo::{Particle, ParticleKind};

use crate::app::AppState;
use crate::error::AppError;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W: usize = 1024;
pub const WIN_H: usize = 768;
const STATUS_Y: usize = WIN_H - 40;
const FOCAL_PX: f32 = 700.0;
const NEAR_PLANE: f32 = 0.5;

const BG_COLOR: u32 = 0xFF10101E;
const STATUS_BG: u32 = 0xFF0F3460;
const DUST_COLOR: u32 = 0xFF34344A;
const HIGHLIGHT_COLOR: u32 = 0xFFFFD700;
const DECOR_COLORS: [u32; 2] = [0xFF2E8B57, 0xFF3FA86B];
const CANDY_RED: u32 = 0xFFD94048;
const CANDY_WHITE: u32 = 0xFFF2F2F2;

const DUST_COUNT: usize = 240;

// ════════════════════════════════════════════════════════════════════════════
// InputState
// ════════════════════════════════════════════════════════════════════════════

/// One frame of window input.
#[derive(Debug, Default)]
pub struct InputState {
    pub quit: bool,
    pub add_photo: bool,
    /// Held hover gesture; the substitute channel while the camera is idle.
    pub hover: Option<Gesture>,
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf: Vec<u32>,
    /// Static far-field dust, for depth cueing.
    dust: Vec<Vec3>,
}

impl Visualizer {
    pub fn new() -> Result<Self, AppError> {
        let mut window = Window::new(
            "Gesture Swarm",
            WIN_W,
            WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| AppError::Window(e.to_string()))?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        let mut rng = StdRng::seed_from_u64(42);
        let far_field = ScatterConfig {
            radius_min: 14.0,
            radius_max: 24.0,
            ..ScatterConfig::default()
        };
        let dust = (0..DUST_COUNT)
            .map(|_| scatter::sample_position(&far_field, &mut rng))
            .collect();

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            dust,
        })
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Poll keyboard input for this frame.
    pub fn poll_input(&mut self) -> InputState {
        if !self.window.is_open() {
            return InputState {
                quit: true,
                ..InputState::default()
            };
        }

        let quit = self.window.is_key_pressed(Key::Q, KeyRepeat::No);
        let add_photo = self.window.is_key_pressed(Key::U, KeyRepeat::No);

        // Hover gestures hold while the key is down; first match wins.
        let bindings = [
            (Key::P, Gesture::Pinch),
            (Key::F, Gesture::Fist),
            (Key::O, Gesture::Open),
            (Key::Key1, Gesture::One),
            (Key::Key2, Gesture::Two),
            (Key::Key3, Gesture::Three),
            (Key::Key4, Gesture::Four),
            (Key::Key5, Gesture::Five),
        ];
        let hover = bindings
            .iter()
            .find(|(k, _)| self.window.is_key_down(*k))
            .map(|&(_, g)| g);

        InputState {
            quit,
            add_photo,
            hover,
        }
    }

    // ── rendering ─────────────────────────────────────────────────────────

    pub fn render(&mut self, app: &AppState) {
        self.buf.fill(BG_COLOR);

        let camera = Projection::new(app);

        // Far-field dust first; it never occludes anything interesting.
        for i in 0..self.dust.len() {
            let d = self.dust[i];
            if let Some((sx, sy, _)) = camera.project(d) {
                self.set_pixel(sx as usize, sy as usize, DUST_COLOR);
            }
        }

        // Project, painter-sort far → near, splat.
        let mut sprites: Vec<Sprite> = app
            .choreo()
            .particles()
            .iter()
            .enumerate()
            .filter_map(|(i, p)| Sprite::project(i, p, &camera))
            .collect();
        sprites.sort_by(|a, b| b.depth.total_cmp(&a.depth));
        for s in &sprites {
            self.draw_sprite(s);
        }

        // ── Status bar ────────────────────────────────────────────────────
        self.fill_rect(0, STATUS_Y, WIN_W, WIN_H - STATUS_Y, STATUS_BG);
        self.draw_label(&app.status, 10, STATUS_Y + 8, 0xFFEEEEEE);
        self.draw_label(
            "f=tree o=scatter p=focus 1-5=text u=photo q=quit",
            10,
            WIN_H - 14,
            0xFF8888AA,
        );

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    fn draw_sprite(&mut self, s: &Sprite) {
        let half = (s.size / 2) as isize;
        let x0 = s.x - half;
        let y0 = s.y - half;
        match &s.fill {
            Fill::Solid(color) => {
                self.fill_rect_clipped(x0, y0, s.size, s.size, *color);
            }
            Fill::Candy => {
                self.fill_rect_clipped(x0, y0, s.size, s.size, CANDY_RED);
                // A white band across the middle reads as the stripe.
                if s.size >= 5 {
                    let band = s.size / 3;
                    self.fill_rect_clipped(x0, y0 + band as isize, s.size, band, CANDY_WHITE);
                }
            }
            Fill::Photo(pixels) => {
                self.blit_photo(pixels, x0, y0, s.size);
            }
        }
    }

    /// Nearest-neighbor blit of a decoded photo into a screen square.
    fn blit_photo(&mut self, pixels: &RgbaImage, x0: isize, y0: isize, size: usize) {
        let (pw, ph) = pixels.dimensions();
        for dy in 0..size {
            for dx in 0..size {
                let (x, y) = (x0 + dx as isize, y0 + dy as isize);
                if x < 0 || y < 0 || x as usize >= WIN_W || y as usize >= WIN_H {
                    continue;
                }
                let px = (dx as u32 * pw) / size as u32;
                let py = (dy as u32 * ph) / size as u32;
                let p = pixels.get_pixel(px.min(pw - 1), py.min(ph - 1));
                let color =
                    0xFF000000 | (u32::from(p[0]) << 16) | (u32::from(p[1]) << 8) | u32::from(p[2]);
                self.buf[y as usize * WIN_W + x as usize] = color;
            }
        }
    }

    // ── primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(WIN_H) {
            for col in x..(x + w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn fill_rect_clipped(&mut self, x: isize, y: isize, w: usize, h: usize, color: u32) {
        for row in y.max(0)..(y + h as isize).min(WIN_H as isize) {
            for col in x.max(0)..(x + w as isize).min(WIN_W as isize) {
                self.buf[row as usize * WIN_W + col as usize] = color;
            }
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    /// Tiny bitmap-font label; characters without a glyph leave a gap.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            if let Some(rows) = font::glyph(ch) {
                for (row, &bits) in rows.iter().enumerate() {
                    for col in 0..font::GLYPH_W {
                        if bits & (1 << (font::GLYPH_W - 1 - col)) != 0 {
                            self.set_pixel(cx + col, y + row, color);
                        }
                    }
                }
            }
            cx += font::ADVANCE;
            if cx + font::ADVANCE > WIN_W {
                break;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Projection
// ════════════════════════════════════════════════════════════════════════════

/// The orbit camera's view transform: derotate the azimuth, translate to the
/// canonical camera seat, pitch down toward the origin, perspective-divide.
struct Projection {
    azimuth: f32,
    seat: Vec3,
    pitch_sin: f32,
    pitch_cos: f32,
}

impl Projection {
    fn new(app: &AppState) -> Self {
        let cfg = app.camera().config();
        let pitch = cfg.height.atan2(cfg.radius);
        Projection {
            azimuth: app.camera().azimuth(),
            seat: Vec3::new(0.0, cfg.height, cfg.radius),
            pitch_sin: pitch.sin(),
            pitch_cos: pitch.cos(),
        }
    }

    /// Screen position and view depth, or `None` behind the near plane.
    fn project(&self, p: Vec3) -> Option<(f32, f32, f32)> {
        let (sin, cos) = self.azimuth.sin_cos();
        let q = Vec3::new(p.x * cos - p.z * sin, p.y, p.x * sin + p.z * cos) - self.seat;
        let vy = q.y * self.pitch_cos - q.z * self.pitch_sin;
        let vz = q.y * self.pitch_sin + q.z * self.pitch_cos;

        let depth = -vz;
        if depth < NEAR_PLANE {
            return None;
        }
        let sx = WIN_W as f32 / 2.0 + q.x * FOCAL_PX / depth;
        let sy = WIN_H as f32 / 2.0 - vy * FOCAL_PX / depth;
        if sx < -200.0 || sx > WIN_W as f32 + 200.0 || sy < -200.0 || sy > WIN_H as f32 + 200.0 {
            return None;
        }
        Some((sx, sy, depth))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Sprite
// ════════════════════════════════════════════════════════════════════════════

enum Fill {
    Solid(u32),
    Candy,
    Photo(Arc<RgbaImage>),
}

struct Sprite {
    x: isize,
    y: isize,
    size: usize,
    depth: f32,
    fill: Fill,
}

impl Sprite {
    fn project(index: usize, p: &Particle, camera: &Projection) -> Option<Sprite> {
        let (sx, sy, depth) = camera.project(p.position)?;

        let world_size = match p.kind {
            ParticleKind::Decoration => 0.22,
            ParticleKind::CandyCane => 0.26,
            ParticleKind::Photo => 0.9,
        };
        let size = (world_size * p.scale.x * FOCAL_PX / depth).clamp(1.0, 200.0) as usize;

        let fill = if p.appearance.is_highlighted() {
            Fill::Solid(HIGHLIGHT_COLOR)
        } else {
            match p.kind {
                ParticleKind::Decoration => Fill::Solid(DECOR_COLORS[index % 2]),
                ParticleKind::CandyCane => Fill::Candy,
                ParticleKind::Photo => match &p.photo {
                    Some(pixels) => Fill::Photo(Arc::clone(pixels)),
                    None => Fill::Solid(0xFFB0B0C0),
                },
            }
        };

        Some(Sprite {
            x: sx as isize,
            y: sy as isize,
            size: size.max(1),
            depth,
            fill,
        })
    }
}
