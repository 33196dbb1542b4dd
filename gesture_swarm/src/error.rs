//! Application-level errors.
//!
//! Only resource failures live here (window creation, photo decode); input
//! absence — no hand, empty text, empty photo set — is modeled as values
//! downstream and never surfaces as an error.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("window: {0}")]
    Window(String),

    #[error("photo {}: {source}", .path.display())]
    Photo {
        path: PathBuf,
        source: image::ImageError,
    },
}
