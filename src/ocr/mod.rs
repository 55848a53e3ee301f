pub mod demo;
pub mod tesseract;
pub mod upstream;
pub mod variants;
#[cfg(feature = "vision")]
pub mod vision;

use std::path::PathBuf;

use crate::error::RecognizerError;

/// One rendering of the page handed to a recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageVariant {
    pub label: String,
    pub path: PathBuf,
}

impl ImageVariant {
    pub fn new(label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
        }
    }
}

/// A text recognition backend.
///
/// Calls take `&mut self`, so one instance is never driven by two requests at
/// once. Backends with setup cost acquire it on the first `recognize` call and
/// release it in `shutdown`, which the owning pipeline calls on drop.
pub trait Recognizer {
    fn name(&self) -> &str;

    fn recognize(&mut self, variant: &ImageVariant) -> Result<String, RecognizerError>;

    /// Tool version string recorded in run manifests.
    fn version(&self) -> Option<String> {
        None
    }

    fn shutdown(&mut self) {}
}
