use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::cli::ProfileKind;

/// Parameters of the additive confidence heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "PartialProfile")]
pub struct ScoringProfile {
    pub floor: f64,
    /// Multiplier on the punctuation-noise penalty (and its cap).
    pub noise_weight: f64,
    pub ceiling: f64,
    /// A candidate must score strictly above this to count as readable text.
    pub min_usable_score: f64,
}

impl ScoringProfile {
    pub fn preset(kind: ProfileKind) -> Self {
        match kind {
            ProfileKind::Enhanced => Self {
                floor: 0.1,
                noise_weight: 1.0,
                ceiling: 1.0,
                min_usable_score: 0.1,
            },
            ProfileKind::Standard => Self {
                floor: 0.3,
                noise_weight: 1.0,
                ceiling: 0.95,
                min_usable_score: 0.3,
            },
            ProfileKind::Basic => Self {
                floor: 0.5,
                noise_weight: 0.5,
                ceiling: 0.95,
                min_usable_score: 0.5,
            },
        }
    }
}

impl Default for ScoringProfile {
    fn default() -> Self {
        Self::preset(ProfileKind::Enhanced)
    }
}

/// Profile as written in a config file. Missing values come from the
/// enhanced preset, except `min_usable_score`, which follows `floor`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialProfile {
    floor: Option<f64>,
    noise_weight: Option<f64>,
    ceiling: Option<f64>,
    min_usable_score: Option<f64>,
}

impl From<PartialProfile> for ScoringProfile {
    fn from(partial: PartialProfile) -> Self {
        let base = Self::default();
        let floor = partial.floor.unwrap_or(base.floor);
        Self {
            floor,
            noise_weight: partial.noise_weight.unwrap_or(base.noise_weight),
            ceiling: partial.ceiling.unwrap_or(base.ceiling),
            min_usable_score: partial.min_usable_score.unwrap_or(floor),
        }
    }
}

/// One ImageMagick rendering of the source image, e.g. a contrast boost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantFilter {
    pub label: String,
    pub args: Vec<String>,
}

impl VariantFilter {
    fn new(label: &str, args: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }
}

pub fn default_variant_filters() -> Vec<VariantFilter> {
    vec![
        VariantFilter::new("enhanced", &["-brightness-contrast", "10x20"]),
        VariantFilter::new(
            "high_contrast",
            &[
                "-colorspace",
                "Gray",
                "-brightness-contrast",
                "20x50",
                "-normalize",
            ],
        ),
        VariantFilter::new(
            "inverted",
            &["-colorspace", "Gray", "-negate", "-brightness-contrast", "0x30"],
        ),
        VariantFilter::new(
            "threshold",
            &["-colorspace", "Gray", "-brightness-contrast", "30x80"],
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub profile_kind: ProfileKind,
    /// Overrides the preset selected by `profile_kind` when present.
    pub profile: Option<ScoringProfile>,
    pub early_exit_score: f64,
    pub strict_cleanup: bool,
    pub ocr_lang: String,
    pub variant_filters: Vec<VariantFilter>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            profile_kind: ProfileKind::Enhanced,
            profile: None,
            early_exit_score: 0.8,
            strict_cleanup: false,
            ocr_lang: "hin+eng".to_string(),
            variant_filters: default_variant_filters(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let config: PipelineConfig = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid pipeline config {}", path.display()))?;
        Ok(config)
    }

    pub fn scoring_profile(&self) -> ScoringProfile {
        self.profile
            .unwrap_or_else(|| ScoringProfile::preset(self.profile_kind))
    }

    pub fn validate(&self) -> Result<()> {
        let profile = self.scoring_profile();
        if !(0.0..=1.0).contains(&profile.floor) || !(0.0..=1.0).contains(&profile.ceiling) {
            bail!("profile floor and ceiling must lie within [0, 1]");
        }
        if profile.floor > profile.ceiling {
            bail!(
                "profile floor {} exceeds ceiling {}",
                profile.floor,
                profile.ceiling
            );
        }
        if profile.noise_weight < 0.0 {
            bail!("noise_weight must not be negative");
        }
        if !(0.0..=1.0).contains(&self.early_exit_score) {
            bail!("early_exit_score must lie within [0, 1]");
        }
        if self.ocr_lang.trim().is_empty() {
            bail!("ocr_lang must not be empty");
        }
        for filter in &self.variant_filters {
            if filter.label.trim().is_empty() {
                bail!("variant filter labels must not be empty");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "profile_kind": "basic", "strict_cleanup": true }"#).unwrap();

        assert_eq!(config.profile_kind, ProfileKind::Basic);
        assert!(config.strict_cleanup);
        assert_eq!(config.early_exit_score, 0.8);
        assert_eq!(config.variant_filters.len(), 4);
        assert_eq!(config.scoring_profile().floor, 0.5);
    }

    #[test]
    fn explicit_profile_overrides_preset() {
        let config: PipelineConfig = serde_json::from_str(
            r#"{ "profile": { "floor": 0.2, "noise_weight": 2.0 } }"#,
        )
        .unwrap();

        let profile = config.scoring_profile();
        assert_eq!(profile.floor, 0.2);
        assert_eq!(profile.noise_weight, 2.0);
        assert_eq!(profile.ceiling, 1.0);
    }

    #[test]
    fn partial_profile_usable_threshold_follows_its_floor() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "profile": { "floor": 0.5 } }"#).unwrap();
        let profile = config.scoring_profile();
        assert_eq!(profile.min_usable_score, 0.5);

        let config: PipelineConfig = serde_json::from_str(
            r#"{ "profile": { "floor": 0.5, "min_usable_score": 0.7 } }"#,
        )
        .unwrap();
        assert_eq!(config.scoring_profile().min_usable_score, 0.7);
    }

    #[test]
    fn validate_rejects_inverted_bounds() {
        let config = PipelineConfig {
            profile: Some(ScoringProfile {
                floor: 0.9,
                noise_weight: 1.0,
                ceiling: 0.5,
                min_usable_score: 0.9,
            }),
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reads_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        fs::write(&path, r#"{ "ocr_lang": "hin", "variant_filters": [] }"#).unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.ocr_lang, "hin");
        assert!(config.variant_filters.is_empty());
    }
}
