use std::process::Command;

use tracing::{debug, info};

use crate::error::RecognizerError;
use crate::ocr::{ImageVariant, Recognizer};
use crate::util::probe_tool;

const PROGRAM: &str = "tesseract";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Unprobed,
    Ready,
    Missing,
}

/// Shells out to the `tesseract` binary, one process per variant.
#[derive(Debug)]
pub struct TesseractRecognizer {
    lang: String,
    state: EngineState,
    version: Option<String>,
}

impl TesseractRecognizer {
    pub fn new(lang: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            state: EngineState::Unprobed,
            version: None,
        }
    }

    fn ensure_ready(&mut self) -> Result<(), RecognizerError> {
        if self.state == EngineState::Unprobed {
            self.state = match probe_tool(PROGRAM) {
                Some(probe) => {
                    self.version = probe.version;
                    info!(lang = %self.lang, version = ?self.version, "tesseract engine ready");
                    EngineState::Ready
                }
                None => EngineState::Missing,
            };
        }

        match self.state {
            EngineState::Ready => Ok(()),
            _ => Err(RecognizerError::Unavailable(format!(
                "{PROGRAM} is not installed or not on PATH"
            ))),
        }
    }
}

impl Recognizer for TesseractRecognizer {
    fn name(&self) -> &str {
        PROGRAM
    }

    fn recognize(&mut self, variant: &ImageVariant) -> Result<String, RecognizerError> {
        self.ensure_ready()?;

        let output = Command::new(PROGRAM)
            .arg(&variant.path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.lang)
            .arg("--oem")
            .arg("1")
            .arg("--psm")
            .arg("3")
            .arg("-c")
            .arg("preserve_interword_spaces=1")
            .output()
            .map_err(|err| {
                RecognizerError::call(
                    &variant.label,
                    format!("failed to execute {PROGRAM} for {}: {err}", variant.path.display()),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecognizerError::call(
                &variant.label,
                format!("{PROGRAM} returned non-zero exit status: {}", stderr.trim()),
            ));
        }

        let text = String::from_utf8_lossy(&output.stdout)
            .replace('\u{0000}', "")
            .trim()
            .to_string();
        debug!(variant = %variant.label, chars = text.chars().count(), "tesseract finished");
        Ok(text)
    }

    fn version(&self) -> Option<String> {
        self.version.clone()
    }

    fn shutdown(&mut self) {
        if self.state == EngineState::Ready {
            debug!("releasing tesseract engine");
        }
        self.state = EngineState::Unprobed;
    }
}
