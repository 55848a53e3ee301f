//! Rule-based cleanup of raw recognized text.
//!
//! The output is line-normalized: no blank lines, no whitespace runs, one
//! line per sentence and every date token on its own line. Running the
//! normalizer on its own output is a no-op.

use anyhow::{Context, Result};
use regex::Regex;

pub const DATE_TOKEN_PATTERN: &str = r"[0-9]{1,2}[/.\-][0-9]{1,2}[/.\-][0-9]{2,4}";

const DEVANAGARI_DIGITS: std::ops::RangeInclusive<char> = '\u{0966}'..='\u{096F}';

#[derive(Debug, Clone)]
pub struct Normalizer {
    strict_cleanup: bool,
    date_token: Regex,
}

impl Normalizer {
    pub fn new(strict_cleanup: bool) -> Result<Self> {
        Ok(Self {
            strict_cleanup,
            date_token: Regex::new(DATE_TOKEN_PATTERN)
                .context("failed to compile date token regex")?,
        })
    }

    pub fn normalize(&self, raw: &str) -> String {
        let raw = raw.replace('\u{0000}', "");
        let text = if self.strict_cleanup {
            apply_strict_cleanup(&raw)
        } else {
            raw
        };

        let text = collapse_whitespace(&text);
        let text = break_after_terminators(&text);
        let text = self.date_token.replace_all(&text, "\n$0\n");
        // Isolation can leave a dot that no longer sits between digits.
        let text = break_after_terminators(&text);
        tidy_lines(&text)
    }
}

pub fn is_sentence_terminator(character: char) -> bool {
    matches!(character, '।' | '॥' | '.' | '!' | '?')
}

/// Backend-specific corrections for common Devanagari misrecognitions.
fn apply_strict_cleanup(text: &str) -> String {
    let substituted = text
        .chars()
        .filter(|character| !matches!(character, '`' | '\''))
        .map(|character| if character == '|' { 'ी' } else { character })
        .collect::<Vec<char>>();

    let mut joined = String::with_capacity(text.len());
    let mut index = 0usize;
    while index < substituted.len() {
        let character = substituted[index];
        if character.is_whitespace() {
            let run_end = substituted[index..]
                .iter()
                .position(|next| !next.is_whitespace())
                .map(|offset| index + offset)
                .unwrap_or(substituted.len());
            let between_digits = index > 0
                && DEVANAGARI_DIGITS.contains(&substituted[index - 1])
                && substituted
                    .get(run_end)
                    .map(|next| DEVANAGARI_DIGITS.contains(next))
                    .unwrap_or(false);
            if !between_digits {
                joined.extend(&substituted[index..run_end]);
            }
            index = run_end;
            continue;
        }

        joined.push(character);
        index += 1;
    }

    joined
}

/// A run that contains a line break becomes one `\n`, any other run one space.
fn collapse_whitespace(text: &str) -> String {
    let mut collapsed = String::with_capacity(text.len());
    let mut pending: Option<char> = None;

    for character in text.chars() {
        if character.is_whitespace() {
            let breaks_line = matches!(character, '\n' | '\r' | '\u{000B}' | '\u{000C}');
            pending = match pending {
                Some('\n') => Some('\n'),
                _ if breaks_line => Some('\n'),
                _ => Some(' '),
            };
            continue;
        }

        if let Some(separator) = pending.take() {
            collapsed.push(separator);
        }
        collapsed.push(character);
    }

    if let Some(separator) = pending {
        collapsed.push(separator);
    }

    collapsed
}

fn break_after_terminators(text: &str) -> String {
    let characters = text.chars().collect::<Vec<char>>();
    let mut output = String::with_capacity(text.len() + 16);
    let mut index = 0usize;

    while index < characters.len() {
        let character = characters[index];
        output.push(character);
        index += 1;

        if !terminates_at(&characters, index - 1) {
            continue;
        }
        if characters
            .get(index)
            .map(|next| is_sentence_terminator(*next))
            .unwrap_or(false)
        {
            continue;
        }

        output.push('\n');
        while characters
            .get(index)
            .map(|next| next.is_whitespace())
            .unwrap_or(false)
        {
            index += 1;
        }
    }

    output
}

fn terminates_at(characters: &[char], index: usize) -> bool {
    let character = characters[index];
    if !is_sentence_terminator(character) {
        return false;
    }
    if character != '.' || index == 0 {
        return true;
    }

    let digit_before = characters[index - 1].is_ascii_digit();
    let digit_after = characters
        .get(index + 1)
        .map(|next| next.is_ascii_digit())
        .unwrap_or(false);
    !(digit_before && digit_after)
}

fn tidy_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<&str>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(raw: &str) -> String {
        Normalizer::new(false).unwrap().normalize(raw)
    }

    #[test]
    fn collapses_spaces_and_keeps_line_structure() {
        assert_eq!(
            normalize("  थाना:   कोतवाली,\t दिल्ली \n\n\n दिनांक: 15 जनवरी 2024  "),
            "थाना: कोतवाली, दिल्ली\nदिनांक: 15 जनवरी 2024"
        );
    }

    #[test]
    fn breaks_lines_after_danda_and_latin_terminators() {
        assert_eq!(
            normalize("मारपीट की गई। अभियुक्त फरार है॥ He fled! Why? Done."),
            "मारपीट की गई।\nअभियुक्त फरार है॥\nHe fled!\nWhy?\nDone."
        );
    }

    #[test]
    fn keeps_terminator_runs_together() {
        assert_eq!(normalize("रुको... क्या?! ठीक"), "रुको...\nक्या?!\nठीक");
    }

    #[test]
    fn isolates_date_tokens_onto_their_own_line() {
        assert_eq!(
            normalize("घटना दिनांक12/03/2024 को हुई"),
            "घटना दिनांक\n12/03/2024\nको हुई"
        );
    }

    #[test]
    fn dotted_dates_survive_terminator_rule() {
        assert_eq!(
            normalize("दिनांक 15.01.2024 को रात्रि"),
            "दिनांक\n15.01.2024\nको रात्रि"
        );
    }

    #[test]
    fn dot_left_behind_by_date_isolation_ends_its_line() {
        assert_eq!(normalize("12/03/2024.5"), "12/03/2024\n.\n5");
    }

    #[test]
    fn is_idempotent_on_assorted_inputs() {
        let normalizer = Normalizer::new(false).unwrap();
        let strict = Normalizer::new(true).unwrap();
        let inputs = [
            "",
            "   \n\t  ",
            "थाना: कोतवाली, दिल्ली\nदिनांक: 15 जनवरी 2024\nअभियुक्त: राम कुमार",
            "वाक्य एक। वाक्य दो॥वाक्य तीन. Four! five?",
            "on12/03/2024at 5-6-24 and 1/2/20245 and 12.03.2024.",
            "P.S. Kotwali ... ?? !! ।।",
            "२ ० २ ४ | ` ' test",
            "x.1 3.14 ends with dot.",
            "12/03/2024.5",
            "दिनांक 1.2.2024.7 को",
        ];

        for input in inputs {
            for candidate in [&normalizer, &strict] {
                let once = candidate.normalize(input);
                let twice = candidate.normalize(&once);
                assert_eq!(once, twice, "not idempotent for {input:?}");
            }
        }
    }

    #[test]
    fn output_has_no_blank_lines_or_whitespace_runs() {
        let output = normalize("a  b\n\n\nc .  d\t\te  12/03/2024  ");
        assert!(!output.contains("  "));
        assert!(!output.contains("\n\n"));
        assert!(output.lines().all(|line| line == line.trim() && !line.is_empty()));
    }

    #[test]
    fn strict_cleanup_fixes_common_misreads() {
        let strict = Normalizer::new(true).unwrap();
        assert_eq!(strict.normalize("प|ड़ित `राम' १ २ ३"), "पीड़ित राम १२३");
        assert_eq!(normalize("प|ड़ित"), "प|ड़ित");
    }
}
