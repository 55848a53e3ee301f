//! Single entry point tying recognition, normalization and extraction together.

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::ProcessingMode;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::extraction::confidence::ConfidenceScorer;
use crate::extraction::entities::EntityExtractor;
use crate::extraction::fields::FieldExtractor;
use crate::extraction::layout::{Glossary, segment_layout};
use crate::extraction::normalize::Normalizer;
use crate::extraction::select::{CandidateSelector, Selection};
use crate::model::{Entities, ProcessOutput, SelectionSummary, StructuredRecord};
use crate::ocr::upstream::parse_upstream_record;
use crate::ocr::{ImageVariant, Recognizer};

const RAW_TEXT_LABEL: &str = "raw_text";

/// What the caller hands in for one processing request.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// Ordered renderings of the same page; the source image comes first.
    Variants(Vec<ImageVariant>),
    /// Text that was already recognized elsewhere.
    RawText(String),
}

#[derive(Debug, Clone)]
pub struct ProcessReport {
    pub output: ProcessOutput,
    pub selection: SelectionSummary,
    pub warnings: Vec<String>,
}

pub type ProgressSink<'a> = &'a mut dyn FnMut(u8, &str);

/// Forwards checkpoints to the caller, never letting the percentage go back.
struct ProgressTracker<'a> {
    sink: Option<ProgressSink<'a>>,
    last: u8,
}

impl<'a> ProgressTracker<'a> {
    fn new(sink: Option<ProgressSink<'a>>) -> Self {
        Self { sink, last: 0 }
    }

    fn report(&mut self, percent: u8, step: &str) {
        let percent = percent.clamp(self.last, 100);
        self.last = percent;
        debug!(percent, step, "progress");
        if let Some(sink) = self.sink.as_deref_mut() {
            sink(percent, step);
        }
    }
}

/// Owns the recognizer for its whole lifetime and releases it on drop.
pub struct Pipeline<R: Recognizer> {
    recognizer: R,
    normalizer: Normalizer,
    selector: CandidateSelector,
    fields: FieldExtractor,
    entities: EntityExtractor,
    glossary: Glossary,
}

impl<R: Recognizer> Pipeline<R> {
    pub fn new(recognizer: R, config: &PipelineConfig) -> Result<Self> {
        config.validate()?;
        let scorer = ConfidenceScorer::new(config.scoring_profile());
        Ok(Self {
            recognizer,
            normalizer: Normalizer::new(config.strict_cleanup)?,
            selector: CandidateSelector::new(scorer, config.early_exit_score),
            fields: FieldExtractor::new()?,
            entities: EntityExtractor::new()?,
            glossary: Glossary::new()?,
        })
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    pub fn recognizer_mut(&mut self) -> &mut R {
        &mut self.recognizer
    }

    pub fn process_document(
        &mut self,
        source: DocumentSource,
        mode: ProcessingMode,
        progress: Option<ProgressSink<'_>>,
    ) -> Result<ProcessReport, PipelineError> {
        let mut tracker = ProgressTracker::new(progress);
        tracker.report(0, "Starting document processing");

        let (selection, labels) = match source {
            DocumentSource::RawText(text) if mode == ProcessingMode::Cleaning => {
                tracker.report(15, "Reading supplied text");
                (self.accept_raw_text(text)?, vec![RAW_TEXT_LABEL.to_string()])
            }
            DocumentSource::RawText(text) => {
                tracker.report(15, "Reading supplied text");
                let candidates = [text];
                let selection = self.selector.select_best(
                    &candidates,
                    |text| Ok(text.clone()),
                    |_, _| tracker.report(25, "Scoring supplied text"),
                )?;
                (selection, vec![RAW_TEXT_LABEL.to_string()])
            }
            DocumentSource::Variants(variants) => {
                tracker.report(
                    15,
                    &format!("Preparing {} image variant(s)", variants.len()),
                );
                info!(
                    recognizer = self.recognizer.name(),
                    variants = variants.len(),
                    "recognizing document"
                );
                let recognizer = &mut self.recognizer;
                let selection = self.selector.select_best(
                    &variants,
                    |variant| recognizer.recognize(variant),
                    |index, total| {
                        let percent = 25 + (50 * index / total.max(1)) as u8;
                        tracker.report(
                            percent,
                            &format!("Processing variant {}/{}", index + 1, total),
                        );
                    },
                )?;
                let labels = variants.into_iter().map(|variant| variant.label).collect();
                (selection, labels)
            }
        };

        tracker.report(80, "Post-processing and cleaning text");
        let normalized = self.normalizer.normalize(&selection.text);

        tracker.report(95, "Extracting legal structure");
        let mut warnings = Vec::new();
        if selection.failed > 0 {
            warnings.push(format!(
                "{} of {} attempted variant(s) failed recognition",
                selection.failed, selection.attempted
            ));
        }

        let output = match mode {
            ProcessingMode::Structured => {
                let structured_data = self.fields.extract_structured(&normalized);
                if structured_data.police_station.is_none()
                    && structured_data.incident_timing.is_none()
                    && structured_data.people_involved.accused.is_none()
                    && structured_data.people_involved.victim.is_none()
                {
                    warnings.push("none of the core FIR fields were found".to_string());
                }
                ProcessOutput::Structured(Box::new(StructuredRecord {
                    entities: self.entities.extract(&normalized),
                    clean_hindi_text: normalized,
                    structured_data,
                    ocr_confidence: Some(selection.score),
                    variants_processed: Some(labels.len()),
                    raw_ocr_text: Some(selection.text.clone()),
                }))
            }
            ProcessingMode::Plain | ProcessingMode::Cleaning => ProcessOutput::Text(normalized),
            ProcessingMode::Layout => ProcessOutput::Layout(segment_layout(&normalized)),
            ProcessingMode::Entities => ProcessOutput::Entities(self.entities.extract(&normalized)),
            ProcessingMode::Gloss => ProcessOutput::Gloss(self.glossary.annotate(&normalized)),
        };

        tracker.report(100, "Complete");
        info!(
            mode = mode.as_str(),
            confidence = selection.score,
            attempted = selection.attempted,
            "document processed"
        );

        Ok(ProcessReport {
            selection: SelectionSummary {
                variants_processed: labels.len(),
                attempted: selection.attempted,
                failed: selection.failed,
                selected_variant: labels.get(selection.index).cloned(),
                confidence: selection.score,
                early_exit: selection.early_exit,
            },
            output,
            warnings,
        })
    }

    /// Validates structured JSON returned by an upstream model and tops up its
    /// entity lists with what the local extractor finds in the clean text.
    pub fn accept_upstream(&self, raw: &str) -> Result<StructuredRecord, PipelineError> {
        let mut record = parse_upstream_record(raw)?;
        record.clean_hindi_text = self.normalizer.normalize(&record.clean_hindi_text);
        let local = self.entities.extract(&record.clean_hindi_text);
        merge_entities(&mut record.entities, local);
        record.ocr_confidence = Some(self.selector.scorer().score(&record.clean_hindi_text));
        record.variants_processed = Some(1);
        record.raw_ocr_text = Some(raw.to_string());
        Ok(record)
    }

    /// Cleaning mode re-normalizes supplied text as-is; only empty text fails.
    fn accept_raw_text(&self, text: String) -> Result<Selection, PipelineError> {
        if text.trim().is_empty() {
            return Err(PipelineError::NoTextDetected {
                attempted: 1,
                failed: 0,
            });
        }
        Ok(Selection {
            score: self.selector.scorer().score(&text),
            text,
            index: 0,
            attempted: 1,
            failed: 0,
            early_exit: false,
        })
    }
}

impl<R: Recognizer> Drop for Pipeline<R> {
    fn drop(&mut self) {
        self.recognizer.shutdown();
    }
}

fn merge_entities(into: &mut Entities, from: Entities) {
    into.persons.extend(from.persons);
    into.locations.extend(from.locations);
    into.dates.extend(from.dates);
    into.legal_sections.extend(from.legal_sections);
}
