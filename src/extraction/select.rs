use tracing::{debug, info, warn};

use crate::error::{PipelineError, RecognizerError};
use crate::extraction::confidence::ConfidenceScorer;

/// The winning recognition among all attempted candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub text: String,
    pub score: f64,
    pub index: usize,
    pub attempted: usize,
    pub failed: usize,
    pub early_exit: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct CandidateSelector {
    scorer: ConfidenceScorer,
    early_exit_score: f64,
}

impl CandidateSelector {
    pub fn new(scorer: ConfidenceScorer, early_exit_score: f64) -> Self {
        Self {
            scorer,
            early_exit_score,
        }
    }

    pub fn scorer(&self) -> &ConfidenceScorer {
        &self.scorer
    }

    /// Recognizes candidates in order and keeps the best scoring text.
    ///
    /// Stops as soon as one candidate scores above the early-exit threshold.
    /// Per-candidate call failures are skipped; any other recognizer error is
    /// returned only when no candidate produced usable text.
    pub fn select_best<C, R, P>(
        &self,
        candidates: &[C],
        mut recognize: R,
        mut on_attempt: P,
    ) -> Result<Selection, PipelineError>
    where
        R: FnMut(&C) -> Result<String, RecognizerError>,
        P: FnMut(usize, usize),
    {
        let mut best: Option<(usize, String, f64)> = None;
        let mut attempted = 0usize;
        let mut failed = 0usize;
        let mut early_exit = false;
        let mut unexpected: Option<RecognizerError> = None;

        for (index, candidate) in candidates.iter().enumerate() {
            on_attempt(index, candidates.len());
            attempted += 1;

            let text = match recognize(candidate) {
                Ok(text) => text,
                Err(error) => {
                    failed += 1;
                    warn!(candidate = index + 1, error = %error, "skipping candidate");
                    if !error.is_skippable() && unexpected.is_none() {
                        unexpected = Some(error);
                    }
                    continue;
                }
            };

            if text.trim().is_empty() {
                debug!(candidate = index + 1, "candidate produced no text");
                continue;
            }

            let score = self.scorer.score(&text);
            debug!(candidate = index + 1, score, chars = text.chars().count(), "scored candidate");

            let improves = best
                .as_ref()
                .map(|(_, _, best_score)| score > *best_score)
                .unwrap_or(true);
            if improves {
                best = Some((index, text, score));
            }

            if score > self.early_exit_score {
                early_exit = index + 1 < candidates.len();
                break;
            }
        }

        let min_usable = self.scorer.profile().min_usable_score;
        let usable = best.filter(|(_, _, score)| *score > min_usable);

        match (usable, unexpected) {
            (Some((index, text, score)), unexpected) => {
                if let Some(error) = unexpected {
                    warn!(error = %error, "recognizer reported an unexpected error on another candidate");
                }
                info!(
                    candidate = index + 1,
                    score,
                    attempted,
                    failed,
                    early_exit,
                    "selected best recognition"
                );
                Ok(Selection {
                    text,
                    score,
                    index,
                    attempted,
                    failed,
                    early_exit,
                })
            }
            (None, Some(error)) => Err(PipelineError::Recognizer(error)),
            (None, None) => Err(PipelineError::NoTextDetected { attempted, failed }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::cli::ProfileKind;
    use crate::config::ScoringProfile;

    const RICH: &str = "प्राथमिकी संख्या 123/2024। थाना कोतवाली पुलिस स्टेशन। अभियुक्त राम कुमार। धारा 323 लागू।";
    const MODEST: &str = "कुछ पाठ पढ़ा गया";

    fn selector() -> CandidateSelector {
        CandidateSelector::new(
            ConfidenceScorer::new(ScoringProfile::preset(ProfileKind::Enhanced)),
            0.8,
        )
    }

    #[test]
    fn stops_after_a_high_confidence_candidate() {
        let calls = Cell::new(0usize);
        let candidates = [RICH, MODEST, MODEST];

        let selection = selector()
            .select_best(
                &candidates,
                |text| {
                    calls.set(calls.get() + 1);
                    Ok(text.to_string())
                },
                |_, _| {},
            )
            .unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(selection.index, 0);
        assert_eq!(selection.attempted, 1);
        assert!(selection.early_exit);
        assert!(selection.score > 0.8);
    }

    #[test]
    fn keeps_the_highest_scoring_candidate() {
        let candidates = ["ab", MODEST, "a#"];
        let selection = selector()
            .select_best(&candidates, |text| Ok(text.to_string()), |_, _| {})
            .unwrap();

        assert_eq!(selection.index, 1);
        assert_eq!(selection.text, MODEST);
        assert_eq!(selection.attempted, 3);
        assert!(!selection.early_exit);
    }

    #[test]
    fn skips_failed_calls_and_continues() {
        let candidates = ["broken", MODEST];
        let selection = selector()
            .select_best(
                &candidates,
                |text| {
                    if *text == "broken" {
                        Err(RecognizerError::call("source", "timed out"))
                    } else {
                        Ok(text.to_string())
                    }
                },
                |_, _| {},
            )
            .unwrap();

        assert_eq!(selection.index, 1);
        assert_eq!(selection.failed, 1);
    }

    #[test]
    fn blank_and_noisy_candidates_report_no_text() {
        let candidates = ["   \n", "xx##??"];
        let error = selector()
            .select_best(&candidates, |text| Ok(text.to_string()), |_, _| {})
            .unwrap_err();

        assert!(matches!(
            error,
            PipelineError::NoTextDetected {
                attempted: 2,
                failed: 0
            }
        ));
    }

    #[test]
    fn all_call_failures_fold_into_no_text_detected() {
        let candidates = ["a", "b"];
        let error = selector()
            .select_best(
                &candidates,
                |text: &&str| Err(RecognizerError::call(text, "crashed")),
                |_, _| {},
            )
            .unwrap_err();

        assert!(matches!(
            error,
            PipelineError::NoTextDetected {
                attempted: 2,
                failed: 2
            }
        ));
    }

    #[test]
    fn unexpected_errors_propagate_when_nothing_is_usable() {
        let candidates = ["a", "b"];
        let error = selector()
            .select_best(
                &candidates,
                |_: &&str| Err(RecognizerError::Unavailable("tesseract not installed".to_string())),
                |_, _| {},
            )
            .unwrap_err();

        assert!(matches!(
            error,
            PipelineError::Recognizer(RecognizerError::Unavailable(_))
        ));
    }

    #[test]
    fn reports_every_attempt_in_order() {
        let mut seen = Vec::new();
        let candidates = ["ab", "cd", "ef"];
        selector()
            .select_best(
                &candidates,
                |text| Ok(text.to_string()),
                |index, total| seen.push((index, total)),
            )
            .unwrap();

        assert_eq!(seen, vec![(0, 3), (1, 3), (2, 3)]);
    }
}
