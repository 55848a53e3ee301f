use crate::config::ScoringProfile;
use crate::extraction::normalize::is_sentence_terminator;

const DEVANAGARI_BLOCK: std::ops::RangeInclusive<char> = '\u{0900}'..='\u{097F}';

/// Each entry is one keyword; alternates are spellings of the same term.
const LEGAL_KEYWORDS: &[&[&str]] = &[
    &["प्राथमिकी"],
    &["थाना"],
    &["अभियुक्त"],
    &["पी\u{0921}\u{093C}ित", "पी\u{095C}ित"],
    &["धारा"],
    &["पुलिस"],
    &["fir"],
    &["police"],
    &["station"],
    &["accused"],
    &["victim"],
    &["section"],
];

const KEYWORD_WEIGHT: f64 = 0.05;
const SENTENCE_MIN_CHARS: usize = 10;

/// Scores how much a block of recognized text looks like a real legal record.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceScorer {
    profile: ScoringProfile,
}

impl ConfidenceScorer {
    pub fn new(profile: ScoringProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> ScoringProfile {
        self.profile
    }

    pub fn score(&self, text: &str) -> f64 {
        let counts = CharacterCounts::of(text);

        let mut confidence = self.profile.floor;
        confidence += (counts.devanagari as f64 / 50.0).min(0.4);
        confidence += (counts.latin as f64 / 100.0).min(0.2);
        confidence += (counts.digits as f64 / 20.0).min(0.1);
        confidence -= (counts.noise as f64 / 50.0 * self.profile.noise_weight)
            .min(0.3 * self.profile.noise_weight);
        confidence += legal_keyword_count(text) as f64 * KEYWORD_WEIGHT;
        confidence += (sentence_count(text) as f64 / 10.0).min(0.1);

        confidence.clamp(0.0, self.profile.ceiling.min(1.0))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CharacterCounts {
    devanagari: usize,
    latin: usize,
    digits: usize,
    noise: usize,
}

impl CharacterCounts {
    fn of(text: &str) -> Self {
        let mut counts = Self::default();
        for character in text.chars() {
            if DEVANAGARI_BLOCK.contains(&character) {
                counts.devanagari += 1;
            } else if character.is_ascii_alphabetic() {
                counts.latin += 1;
            } else if character.is_ascii_digit() {
                counts.digits += 1;
            } else if character != '_' && !character.is_whitespace() {
                counts.noise += 1;
            }
        }
        counts
    }
}

pub fn legal_keyword_count(text: &str) -> usize {
    let lowered = text.to_lowercase();
    LEGAL_KEYWORDS
        .iter()
        .filter(|spellings| spellings.iter().any(|keyword| lowered.contains(keyword)))
        .count()
}

fn sentence_count(text: &str) -> usize {
    text.split(is_sentence_terminator)
        .filter(|sentence| sentence.trim().chars().count() > SENTENCE_MIN_CHARS)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ProfileKind;

    fn scorer(kind: ProfileKind) -> ConfidenceScorer {
        ConfidenceScorer::new(ScoringProfile::preset(kind))
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn noise_only_text_scores_below_floor() {
        let score = scorer(ProfileKind::Enhanced).score("xx##??");
        assert_close(score, 0.1 + 0.02 - 0.08);
    }

    #[test]
    fn danda_counts_as_devanagari_not_noise() {
        let counts = CharacterCounts::of("क।॥,");
        assert_eq!(counts.devanagari, 3);
        assert_eq!(counts.noise, 1);
    }

    #[test]
    fn keywords_match_case_insensitively_and_once_each() {
        assert_eq!(legal_keyword_count("FIR fir Police STATION"), 3);
        assert_eq!(legal_keyword_count("पीड़ित पीड़ित"), 1);
        assert_eq!(legal_keyword_count("nothing here"), 0);
    }

    #[test]
    fn adding_keywords_never_lowers_the_score() {
        let scorer = scorer(ProfileKind::Enhanced);
        let base = "घटना की सूचना मिली";
        let mut text = base.to_string();
        let mut previous = scorer.score(&text);

        for keyword in [" थाना", " पुलिस", " धारा", " अभियुक्त", " police", " victim"] {
            text.push_str(keyword);
            let current = scorer.score(&text);
            assert!(current >= previous, "{text:?} scored {current} < {previous}");
            previous = current;
        }
        assert!(previous > scorer.score(base));
    }

    #[test]
    fn score_is_clamped_to_profile_ceiling() {
        let rich = "प्राथमिकी संख्या 123/2024 थाना कोतवाली पुलिस स्टेशन। अभियुक्त राम कुमार पर धारा 323 लगी। \
                    FIR registered at Police Station against the accused for victim under Section 379.";
        assert_close(scorer(ProfileKind::Enhanced).score(rich), 1.0);
        assert_close(scorer(ProfileKind::Standard).score(rich), 0.95);
    }

    #[test]
    fn empty_text_scores_floor() {
        assert_close(scorer(ProfileKind::Enhanced).score(""), 0.1);
        assert_close(scorer(ProfileKind::Basic).score(""), 0.5);
    }

    #[test]
    fn basic_profile_halves_noise_penalty() {
        let noise = "################################################################";
        assert_close(scorer(ProfileKind::Enhanced).score(noise), 0.0);
        // the unterminated run still counts as one long sentence
        assert_close(scorer(ProfileKind::Basic).score(noise), 0.5 - 0.15 + 0.1);
    }
}
