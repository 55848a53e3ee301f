//! Alternate renderings of the source page for the candidate selector.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::config::VariantFilter;
use crate::ocr::ImageVariant;
use crate::util::tool_installed;

pub const SOURCE_LABEL: &str = "source";

/// Variant images plus the scratch directory that holds them.
///
/// Generated files are removed when this value is dropped.
#[derive(Debug)]
pub struct PreparedVariants {
    pub variants: Vec<ImageVariant>,
    pub warnings: Vec<String>,
    scratch: TempDir,
}

pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|value| value.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("pdf"))
}

/// Builds the ordered candidate list: the unprocessed page first, then one
/// ImageMagick rendering per configured filter.
///
/// Filters that cannot be applied are skipped with a warning, so the list
/// always holds at least the source page.
pub fn prepare_variants(
    source: &Path,
    filters: &[VariantFilter],
    pdf_page: usize,
) -> Result<PreparedVariants> {
    if !source.exists() {
        bail!("input image not found: {}", source.display());
    }

    let scratch = tempfile::Builder::new()
        .prefix("firscan_variants_")
        .tempdir()
        .context("failed to create scratch directory for image variants")?;

    let base = if is_pdf(source) {
        rasterize_pdf_page(source, pdf_page, scratch.path())?
    } else {
        source.to_path_buf()
    };

    let mut prepared = PreparedVariants {
        variants: vec![ImageVariant::new(SOURCE_LABEL, &base)],
        warnings: Vec::new(),
        scratch,
    };
    if filters.is_empty() {
        return Ok(prepared);
    }

    let Some(program) = image_tool() else {
        let message =
            "ImageMagick (magick/convert) is unavailable; recognizing the source image only"
                .to_string();
        warn!("{message}");
        prepared.warnings.push(message);
        return Ok(prepared);
    };

    for (index, filter) in filters.iter().enumerate() {
        let output_path = prepared
            .scratch
            .path()
            .join(format!("{:02}_{}.png", index + 1, safe_label(&filter.label)));
        match render_variant(program, &base, filter, &output_path) {
            Ok(()) => {
                debug!(variant = %filter.label, path = %output_path.display(), "rendered variant");
                prepared
                    .variants
                    .push(ImageVariant::new(filter.label.clone(), output_path));
            }
            Err(err) => {
                let message = format!("skipped image variant '{}': {err:#}", filter.label);
                warn!("{message}");
                prepared.warnings.push(message);
            }
        }
    }

    Ok(prepared)
}

fn image_tool() -> Option<&'static str> {
    ["magick", "convert"]
        .into_iter()
        .find(|program| tool_installed(program))
}

fn render_variant(
    program: &str,
    base: &Path,
    filter: &VariantFilter,
    output_path: &Path,
) -> Result<()> {
    let output = Command::new(program)
        .arg(base)
        .args(&filter.args)
        .arg(output_path)
        .output()
        .with_context(|| format!("failed to execute {program} for {}", base.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{program} returned non-zero exit status: {}", stderr.trim());
    }
    if !output_path.exists() {
        bail!("{program} did not produce {}", output_path.display());
    }
    Ok(())
}

fn rasterize_pdf_page(pdf_path: &Path, page_number: usize, scratch: &Path) -> Result<PathBuf> {
    if !tool_installed("pdftoppm") {
        bail!(
            "pdftoppm is required to read {} but is not installed",
            pdf_path.display()
        );
    }

    let output_root = scratch.join(format!("page_{page_number}"));
    let png_path = output_root.with_extension("png");

    let output = Command::new("pdftoppm")
        .arg("-f")
        .arg(page_number.to_string())
        .arg("-l")
        .arg(page_number.to_string())
        .arg("-r")
        .arg("300")
        .arg("-singlefile")
        .arg("-png")
        .arg(pdf_path)
        .arg(&output_root)
        .output()
        .with_context(|| format!("failed to execute pdftoppm for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftoppm returned non-zero exit status for {} page {}: {}",
            pdf_path.display(),
            page_number,
            stderr.trim()
        );
    }

    if !png_path.exists() {
        bail!(
            "pdftoppm did not produce expected image for {} page {}",
            pdf_path.display(),
            page_number
        );
    }

    Ok(png_path)
}

fn safe_label(label: &str) -> String {
    label
        .chars()
        .map(|character| {
            if character.is_ascii_alphanumeric() {
                character
            } else {
                '_'
            }
        })
        .collect()
}
