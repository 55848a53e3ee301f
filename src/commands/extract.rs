use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::{Backend, ExtractArgs, ProcessingMode};
use crate::commands::report::{ReportHeader, write_json_stdout, write_text_stdout};
use crate::config::PipelineConfig;
use crate::extraction::{DocumentSource, Pipeline};
use crate::model::{ExtractionManifest, ProcessOutput, SelectionSummary, SourceEntry};
use crate::ocr::Recognizer;
use crate::ocr::demo::DemoRecognizer;
use crate::ocr::tesseract::TesseractRecognizer;
use crate::ocr::variants::prepare_variants;
use crate::util::{
    now_utc_string, read_text_file, sha256_file, sha256_text, utc_compact_string,
    write_json_pretty,
};

const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone)]
enum InputSource {
    Image(PathBuf),
    Text(PathBuf),
}

impl InputSource {
    fn path(&self) -> &Path {
        match self {
            InputSource::Image(path) | InputSource::Text(path) => path,
        }
    }
}

#[derive(Debug)]
struct RunOutcome {
    output: ProcessOutput,
    selection: Option<SelectionSummary>,
    warnings: Vec<String>,
    recognizer_version: Option<String>,
}

pub fn run(args: ExtractArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let config = resolve_config(&args)?;
    let input = resolve_input(&args)?;
    info!(
        run_id = %run_id,
        input = %input.path().display(),
        backend = args.backend.as_str(),
        mode = args.mode.as_str(),
        profile = config.profile_kind.as_str(),
        "starting extraction"
    );

    let result = match args.backend {
        Backend::Tesseract => execute(
            TesseractRecognizer::new(config.ocr_lang.clone()),
            &args,
            &config,
            &input,
        ),
        Backend::Demo => execute(DemoRecognizer::new(), &args, &config, &input),
        Backend::Vision => run_vision(&args, &config, &input),
    };

    let mut manifest = ExtractionManifest {
        manifest_version: MANIFEST_VERSION,
        run_id: run_id.clone(),
        started_at,
        updated_at: now_utc_string(),
        status: "completed".to_string(),
        command: "extract".to_string(),
        backend: args.backend.as_str().to_string(),
        mode: args.mode.as_str().to_string(),
        profile: config.profile_kind.as_str().to_string(),
        recognizer_version: None,
        source: Some(SourceEntry {
            path: input.path().display().to_string(),
            sha256: sha256_file(input.path())?,
        }),
        text_sha256: None,
        selection: None,
        failure_reason: None,
        warnings: Vec::new(),
    };

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => {
            if let Some(manifest_path) = &args.manifest_path {
                manifest.status = "failed".to_string();
                manifest.failure_reason = Some(format!("{err:#}"));
                write_json_pretty(manifest_path, &manifest)?;
            }
            return Err(err);
        }
    };

    for warning in &outcome.warnings {
        warn!("{warning}");
    }

    if let Some(output_path) = &args.output {
        write_json_pretty(output_path, &outcome.output)?;
        info!(path = %output_path.display(), "wrote extraction output");
    }

    if let Some(manifest_path) = &args.manifest_path {
        manifest.recognizer_version = outcome.recognizer_version.clone();
        manifest.text_sha256 = primary_text(&outcome.output).map(sha256_text);
        manifest.selection = outcome.selection.clone();
        manifest.warnings = outcome.warnings.clone();
        write_json_pretty(manifest_path, &manifest)?;
        info!(path = %manifest_path.display(), "wrote run manifest");
    }

    if args.json {
        write_json_stdout(&outcome.output)?;
    } else {
        let header = ReportHeader {
            run_id: &run_id,
            backend: args.backend.as_str(),
            mode: args.mode.as_str(),
            profile: config.profile_kind.as_str(),
        };
        write_text_stdout(
            &header,
            &outcome.output,
            outcome.selection.as_ref(),
            &outcome.warnings,
        )?;
    }

    Ok(())
}

fn resolve_config(args: &ExtractArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(profile) = args.profile {
        config.profile_kind = profile;
        config.profile = None;
    }
    if args.strict_cleanup {
        config.strict_cleanup = true;
    }
    if let Some(score) = args.early_exit_score {
        config.early_exit_score = score;
    }
    if let Some(lang) = &args.ocr_lang {
        config.ocr_lang = lang.clone();
    }
    if args.no_variants {
        config.variant_filters.clear();
    }

    config.validate().context("invalid extraction settings")?;
    Ok(config)
}

fn resolve_input(args: &ExtractArgs) -> Result<InputSource> {
    let input = match (&args.image, &args.text_file) {
        (Some(image), None) => InputSource::Image(image.clone()),
        (None, Some(text_file)) => InputSource::Text(text_file.clone()),
        (Some(_), Some(_)) => bail!("pass either --image or --text-file, not both"),
        (None, None) => bail!("one of --image or --text-file is required"),
    };
    if !input.path().exists() {
        bail!("input not found: {}", input.path().display());
    }
    if args.pdf_page == 0 {
        bail!("--pdf-page starts at 1");
    }
    Ok(input)
}

fn execute<R: Recognizer>(
    recognizer: R,
    args: &ExtractArgs,
    config: &PipelineConfig,
    input: &InputSource,
) -> Result<RunOutcome> {
    let mut pipeline = Pipeline::new(recognizer, config)?;
    let mut warnings = Vec::new();

    // Keeps the scratch directory alive until recognition is done.
    let mut prepared = None;
    let source = match input {
        InputSource::Text(path) => DocumentSource::RawText(read_text_file(path)?),
        InputSource::Image(path) => {
            let variants = prepare_variants(path, &config.variant_filters, args.pdf_page)?;
            warnings.extend(variants.warnings.iter().cloned());
            let source = DocumentSource::Variants(variants.variants.clone());
            prepared = Some(variants);
            source
        }
    };

    let mut on_progress = |percent: u8, step: &str| info!(percent, "{step}");
    let report = pipeline.process_document(source, args.mode, Some(&mut on_progress))?;
    drop(prepared);

    warnings.extend(report.warnings);
    Ok(RunOutcome {
        output: report.output,
        selection: Some(report.selection),
        warnings,
        recognizer_version: pipeline.recognizer().version(),
    })
}

#[cfg(feature = "vision")]
fn run_vision(
    args: &ExtractArgs,
    config: &PipelineConfig,
    input: &InputSource,
) -> Result<RunOutcome> {
    use crate::ocr::vision::VisionRecognizer;

    let recognizer = VisionRecognizer::from_env(args.vision_model.clone());
    let InputSource::Image(path) = input else {
        return execute(recognizer, args, config, input);
    };
    if args.mode != ProcessingMode::Structured {
        return execute(recognizer, args, config, input);
    }

    // The model returns the whole record; only the unprocessed page is sent.
    let mut pipeline = Pipeline::new(recognizer, config)?;
    let prepared = prepare_variants(path, &[], args.pdf_page)?;
    let Some(variant) = prepared.variants.first() else {
        bail!("no page image prepared for {}", path.display());
    };
    let raw = pipeline.recognizer_mut().extract_structured(variant)?;
    let record = pipeline.accept_upstream(&raw)?;

    let selection = SelectionSummary {
        variants_processed: 1,
        attempted: 1,
        failed: 0,
        selected_variant: Some(variant.label.clone()),
        confidence: record.ocr_confidence.unwrap_or_default(),
        early_exit: false,
    };
    Ok(RunOutcome {
        output: ProcessOutput::Structured(Box::new(record)),
        selection: Some(selection),
        warnings: prepared.warnings.clone(),
        recognizer_version: pipeline.recognizer().version(),
    })
}

#[cfg(not(feature = "vision"))]
fn run_vision(
    _args: &ExtractArgs,
    _config: &PipelineConfig,
    _input: &InputSource,
) -> Result<RunOutcome> {
    bail!("the vision backend requires building firscan with the `vision` feature")
}

fn primary_text(output: &ProcessOutput) -> Option<&str> {
    match output {
        ProcessOutput::Structured(record) => Some(&record.clean_hindi_text),
        ProcessOutput::Text(text) => Some(text),
        ProcessOutput::Gloss(gloss) => Some(&gloss.hindi_text),
        ProcessOutput::Layout(_) | ProcessOutput::Entities(_) => None,
    }
}
