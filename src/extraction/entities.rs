//! Whole-document scan for repeated entity patterns.
//!
//! Dates and section citations are pattern-backed. Persons and locations are
//! best effort: only values of explicitly colon-labelled lines are reported.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use regex::Regex;

use crate::extraction::fields::VICTIM_LABEL;
use crate::extraction::normalize::DATE_TOKEN_PATTERN;
use crate::model::Entities;

const HINDI_MONTHS: &str = "जनवरी|फ़रवरी|फरवरी|मार्च|अप्रैल|मई|जून|जुलाई|अगस्त|सितंबर|सितम्बर|अक्टूबर|अक्तूबर|नवंबर|नवम्बर|दिसंबर|दिसम्बर";
const SECTION_LIST: &str =
    r"([0-9]+[A-Za-z]?(?:[ \t]*(?:,|/|और|तथा|एवं|&|and)[ \t]*[0-9]+[A-Za-z]?)*)";

#[derive(Debug, Clone)]
pub struct EntityExtractor {
    numeric_date: Regex,
    month_date: Regex,
    hindi_section: Regex,
    english_section: Regex,
    section_number: Regex,
    person_line: Regex,
    location_line: Regex,
}

impl EntityExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            numeric_date: Regex::new(DATE_TOKEN_PATTERN)
                .context("failed to compile numeric date regex")?,
            month_date: Regex::new(&format!(
                r"(?i)[0-9]{{1,2}}[ \t]+(?:{HINDI_MONTHS}|jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?[ \t]+[0-9]{{4}}"
            ))
            .context("failed to compile month date regex")?,
            hindi_section: Regex::new(&format!(r"धारा[: \t]*{SECTION_LIST}"))
                .context("failed to compile section citation regex")?,
            english_section: Regex::new(&format!(r"(?i)\bsections?\b[: \t]*{SECTION_LIST}"))
                .context("failed to compile english section citation regex")?,
            section_number: Regex::new(r"[0-9]+[A-Za-z]?")
                .context("failed to compile section number regex")?,
            person_line: Regex::new(&format!(
                r"(?im)^(?:अभियुक्त|आरोपी|{VICTIM_LABEL}ा?|शिकायतकर्ता|accused|victim|complainant)(?:[ \t]*का[ \t]*नाम)?[ \t]*:[ \t]*([^\n]+)$"
            ))
            .context("failed to compile person line regex")?,
            location_line: Regex::new(r"(?im)^(?:थाना|स्थान|location|police[ \t]+station)[ \t]*:[ \t]*([^\n]+)$")
                .context("failed to compile location line regex")?,
        })
    }

    pub fn extract(&self, text: &str) -> Entities {
        let mut dates = BTreeSet::new();
        for regex in [&self.numeric_date, &self.month_date] {
            dates.extend(regex.find_iter(text).map(|found| found.as_str().trim().to_string()));
        }

        let mut legal_sections = BTreeSet::new();
        self.collect_sections(&self.hindi_section, "धारा", text, &mut legal_sections);
        self.collect_sections(&self.english_section, "Section", text, &mut legal_sections);

        Entities {
            persons: labelled_values(&self.person_line, text),
            locations: labelled_values(&self.location_line, text),
            dates,
            legal_sections,
        }
    }

    fn collect_sections(
        &self,
        citation: &Regex,
        label: &str,
        text: &str,
        sections: &mut BTreeSet<String>,
    ) {
        for captures in citation.captures_iter(text) {
            let Some(list) = captures.get(1) else {
                continue;
            };
            for number in self.section_number.find_iter(list.as_str()) {
                sections.insert(format!("{label} {}", number.as_str()));
            }
        }
    }
}

fn labelled_values(line: &Regex, text: &str) -> BTreeSet<String> {
    line.captures_iter(text)
        .filter_map(|captures| captures.get(1))
        .flat_map(|value| split_names(value.as_str()))
        .collect()
}

/// Splits `राम कुमार (पिता: श्याम लाल), दिल्ली` into its comma parts, dropping
/// parenthesized qualifiers and anything containing digits.
fn split_names(value: &str) -> Vec<String> {
    let without_qualifiers = strip_parenthesized(value);
    without_qualifiers
        .split([',', ';'])
        .map(str::trim)
        .filter(|part| part.chars().count() >= 2)
        .filter(|part| !part.chars().any(|character| character.is_ascii_digit()))
        .map(|part| part.to_string())
        .collect()
}

fn strip_parenthesized(value: &str) -> String {
    let mut depth = 0usize;
    let mut output = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => output.push(character),
            _ => {}
        }
    }
    output
}
