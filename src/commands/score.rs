use std::io::{self, Write};

use anyhow::Result;
use tracing::info;

use crate::cli::ScoreArgs;
use crate::config::ScoringProfile;
use crate::error::PipelineError;
use crate::extraction::{CandidateSelector, ConfidenceScorer, legal_keyword_count};
use crate::util::read_text_file;

#[derive(Debug, Clone, PartialEq)]
struct ScoredText {
    label: String,
    score: f64,
    keywords: usize,
    usable: bool,
}

/// Scores each text file and reports which one the selector would keep.
pub fn run(args: ScoreArgs) -> Result<()> {
    let profile = ScoringProfile::preset(args.profile);
    let scorer = ConfidenceScorer::new(profile);

    let mut texts = Vec::with_capacity(args.text_files.len());
    for path in &args.text_files {
        texts.push((path.display().to_string(), read_text_file(path)?));
    }
    info!(files = texts.len(), profile = args.profile.as_str(), "scoring text files");

    let scored = texts
        .iter()
        .map(|(label, text)| score_text(&scorer, label, text))
        .collect::<Vec<ScoredText>>();

    let selector = CandidateSelector::new(scorer, args.early_exit_score);
    let choice = selector.select_best(&texts, |(_, text)| Ok(text.clone()), |_, _| {});

    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(
        output,
        "Profile: {} floor={} noise_weight={} ceiling={} early_exit={}",
        args.profile.as_str(),
        profile.floor,
        profile.noise_weight,
        profile.ceiling,
        args.early_exit_score
    )?;
    for entry in &scored {
        writeln!(
            output,
            "{:.3}\tkeywords={}\tusable={}\t{}",
            entry.score, entry.keywords, entry.usable, entry.label
        )?;
    }
    match choice {
        Ok(selection) => writeln!(
            output,
            "Selected: {} (score={:.3} attempted={} early_exit={})",
            texts[selection.index].0, selection.score, selection.attempted, selection.early_exit
        )?,
        Err(PipelineError::NoTextDetected { attempted, .. }) => {
            writeln!(output, "Selected: none of {attempted} text(s) is usable")?
        }
        Err(err) => return Err(err.into()),
    }
    output.flush()?;
    Ok(())
}

fn score_text(scorer: &ConfidenceScorer, label: &str, text: &str) -> ScoredText {
    let score = scorer.score(text);
    ScoredText {
        label: label.to_string(),
        score,
        keywords: legal_keyword_count(text),
        usable: !text.trim().is_empty() && score > scorer.profile().min_usable_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ProfileKind;

    #[test]
    fn noise_is_not_usable_under_any_profile() {
        for kind in [ProfileKind::Enhanced, ProfileKind::Standard, ProfileKind::Basic] {
            let scorer = ConfidenceScorer::new(ScoringProfile::preset(kind));
            let scored = score_text(&scorer, "noise.txt", "xx##??");
            assert!(!scored.usable, "{kind:?} accepted noise");
            assert_eq!(scored.keywords, 0);
        }
    }

    #[test]
    fn labelled_record_is_usable() {
        let scorer = ConfidenceScorer::new(ScoringProfile::preset(ProfileKind::Standard));
        let scored = score_text(&scorer, "fir.txt", "थाना: कोतवाली\nअभियुक्त: राम कुमार");
        assert!(scored.usable);
        assert_eq!(scored.keywords, 2);
    }

    #[test]
    fn run_accepts_multiple_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.txt");
        let bad = dir.path().join("bad.txt");
        std::fs::write(&good, "थाना: कोतवाली, दिल्ली").unwrap();
        std::fs::write(&bad, "##").unwrap();

        run(ScoreArgs {
            text_files: vec![bad, good],
            profile: ProfileKind::Enhanced,
            early_exit_score: 0.8,
        })
        .unwrap();
    }
}
