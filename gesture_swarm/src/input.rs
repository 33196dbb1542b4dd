//! Asynchronous input producers — gesture signals and photo uploads.
//!
//! Both run on their own threads and publish over `mpsc` channels that the
//! frame loop drains without blocking.  The gesture channel is read
//! last-value-wins: the loop always acts on the newest published signal and
//! simply keeps the previous one when the producer stalls.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use image::RgbaImage;
use log::warn;

use hand_signal::{classify, GestureConfig, GestureSignal, HandFrame};

use crate::error::AppError;

// ════════════════════════════════════════════════════════════════════════════
// SignalSource trait — unified interface for camera and replay feeds
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`GestureSignal`]s over a channel.
pub trait SignalSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<GestureSignal>);
}

/// Spawn a signal source on its own thread and return the receiving end.
pub fn spawn_signal_source<S: SignalSource>(source: S) -> Receiver<GestureSignal> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

/// Drain the channel and keep only the newest signal.
///
/// Returns `None` when nothing new was published since the last drain — the
/// caller keeps acting on its previous signal.
pub fn latest_signal(rx: &Receiver<GestureSignal>) -> Option<GestureSignal> {
    let mut latest = None;
    while let Ok(signal) = rx.try_recv() {
        latest = Some(signal);
    }
    latest
}

// ════════════════════════════════════════════════════════════════════════════
// ClassifierSource — classify any HandFrame feed
// ════════════════════════════════════════════════════════════════════════════

/// Adapts a stream of hand frames — a camera/ML collaborator, a recorded
/// session, a test vector — into classified signals.
///
/// A `None` frame (no hand detected) publishes the neutral centered signal
/// rather than the previous value, so rotation control never freezes on a
/// stale position.  The source stops publishing as soon as the feed ends or
/// the consumer goes away.
pub struct ClassifierSource<I> {
    pub frames: I,
    pub config: GestureConfig,
    /// Pause between frames; zero for replay-as-fast-as-possible.
    pub frame_interval: Duration,
}

impl ClassifierSource<std::iter::Repeat<Option<HandFrame>>> {
    /// A camera collaborator that never sees a hand: publishes the neutral
    /// signal at camera rate.  Stands in until a real tracker is wired up,
    /// leaving the hover channel in charge.
    pub fn idle(config: GestureConfig) -> Self {
        ClassifierSource {
            frames: std::iter::repeat(None),
            config,
            frame_interval: Duration::from_millis(33),
        }
    }
}

impl<I> SignalSource for ClassifierSource<I>
where
    I: Iterator<Item = Option<HandFrame>> + Send + 'static,
{
    fn run(self: Box<Self>, tx: Sender<GestureSignal>) {
        let ClassifierSource {
            frames,
            config,
            frame_interval,
        } = *self;

        for frame in frames {
            let signal = frame
                .map(|f| classify(&f, &config))
                .unwrap_or_else(GestureSignal::neutral);
            if tx.send(signal).is_err() {
                return;
            }
            if !frame_interval.is_zero() {
                thread::sleep(frame_interval);
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PhotoLoader — decode uploads off the frame thread
// ════════════════════════════════════════════════════════════════════════════

/// Handle to the photo-decoding thread.
///
/// Requests go in as paths; fully decoded images come back over a channel
/// the frame loop drains between frames, so the arena append is atomic.
/// Decode failures are logged and skipped — no partial particle is created.
pub struct PhotoLoader {
    path_tx: Sender<PathBuf>,
    image_rx: Receiver<RgbaImage>,
}

impl PhotoLoader {
    pub fn spawn() -> Self {
        let (path_tx, path_rx) = mpsc::channel::<PathBuf>();
        let (image_tx, image_rx) = mpsc::channel();

        thread::spawn(move || {
            for path in path_rx {
                match load_photo(&path) {
                    Ok(img) => {
                        if image_tx.send(img).is_err() {
                            return;
                        }
                    }
                    Err(e) => warn!("photo skipped: {}", e),
                }
            }
        });

        PhotoLoader { path_tx, image_rx }
    }

    pub fn request(&self, path: PathBuf) {
        let _ = self.path_tx.send(path);
    }

    /// Drain decoded photos (non-blocking).
    pub fn drain(&self) -> Vec<RgbaImage> {
        let mut out = Vec::new();
        while let Ok(img) = self.image_rx.try_recv() {
            out.push(img);
        }
        out
    }
}

fn load_photo(path: &Path) -> Result<RgbaImage, AppError> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|source| AppError::Photo {
            path: path.to_path_buf(),
            source,
        })
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
