use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(
    name = "firscan",
    version,
    about = "Structured metadata extraction for scanned Hindi/English FIRs and affidavits"
)]
pub struct Cli {
    /// Log per-candidate scores and recognizer details (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Extract(ExtractArgs),
    Score(ScoreArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Scanned document image (or PDF, rasterized with pdftoppm).
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Already recognized raw text; bypasses the recognizer.
    #[arg(long)]
    pub text_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ProcessingMode::Structured)]
    pub mode: ProcessingMode,

    #[arg(long, value_enum, default_value_t = Backend::Tesseract)]
    pub backend: Backend,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub profile: Option<ProfileKind>,

    #[arg(long, default_value_t = false)]
    pub strict_cleanup: bool,

    #[arg(long)]
    pub early_exit_score: Option<f64>,

    #[arg(long)]
    pub ocr_lang: Option<String>,

    /// Only recognize the unprocessed source image.
    #[arg(long, default_value_t = false)]
    pub no_variants: bool,

    #[arg(long, default_value_t = 1)]
    pub pdf_page: usize,

    #[arg(long, default_value = "gemini-3-flash-preview")]
    pub vision_model: String,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    #[arg(long = "text-file", required = true)]
    pub text_files: Vec<PathBuf>,

    #[arg(long, value_enum, default_value_t = ProfileKind::Enhanced)]
    pub profile: ProfileKind,

    #[arg(long, default_value_t = 0.8)]
    pub early_exit_score: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ProcessingMode {
    Structured,
    Plain,
    Cleaning,
    Layout,
    Entities,
    Gloss,
}

impl ProcessingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::Plain => "plain",
            Self::Cleaning => "cleaning",
            Self::Layout => "layout",
            Self::Entities => "entities",
            Self::Gloss => "gloss",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Backend {
    Tesseract,
    Vision,
    Demo,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tesseract => "tesseract",
            Self::Vision => "vision",
            Self::Demo => "demo",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    Enhanced,
    Standard,
    Basic,
}

impl ProfileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enhanced => "enhanced",
            Self::Standard => "standard",
            Self::Basic => "basic",
        }
    }
}
