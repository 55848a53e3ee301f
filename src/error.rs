use thiserror::Error;

/// Failure reported by a recognition backend for a single image variant.
#[derive(Error, Debug)]
pub enum RecognizerError {
    /// The call for one variant failed; the candidate is skipped.
    #[error("recognition failed for variant '{variant}': {message}")]
    Call { variant: String, message: String },
    /// The backend cannot run at all (binary missing, no credentials).
    #[error("recognizer unavailable: {0}")]
    Unavailable(String),
    /// Anything else the backend did not expect.
    #[error("recognizer backend error: {0}")]
    Backend(String),
}

impl RecognizerError {
    pub fn call(variant: &str, message: impl Into<String>) -> Self {
        Self::Call {
            variant: variant.to_string(),
            message: message.into(),
        }
    }

    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::Call { .. })
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(
        "no readable text detected in any of {attempted} image variant(s) ({failed} failed). \
         Please try better lighting, a higher resolution, clearer text or a different angle"
    )]
    NoTextDetected { attempted: usize, failed: usize },
    #[error(transparent)]
    Recognizer(#[from] RecognizerError),
    #[error("upstream model returned malformed structured output ({reason}): {raw}")]
    MalformedUpstream { reason: String, raw: String },
}
