use anyhow::{Context, Result};
use regex::Regex;

use crate::model::{GlossDocument, LayoutDocument, OrderedFields};

const HEADER_LINES: usize = 3;
const FOOTER_LINES: usize = 2;

/// Splits a normalized document into header, body and footer by position.
///
/// Footer lines are never taken from the header, so short documents have
/// an empty body and possibly an empty footer.
pub fn segment_layout(text: &str) -> LayoutDocument {
    let lines = text.lines().collect::<Vec<&str>>();
    let header_end = lines.len().min(HEADER_LINES);
    let footer_start = lines.len().saturating_sub(FOOTER_LINES).max(header_end);

    LayoutDocument {
        header: lines[..header_end].join("\n"),
        body: lines[header_end..footer_start].join("\n"),
        footer: lines[footer_start..].join("\n"),
        total_lines: lines.len(),
    }
}

const GLOSSARY: &[(&str, &str)] = &[
    ("प्राथमिकी", "FIR"),
    ("थाना", "Police Station"),
    ("अभियुक्त", "Accused"),
    ("पीड़ित", "Victim"),
    ("दिनांक", "Date"),
    ("समय", "Time"),
    ("धारा", "Section"),
    ("पुलिस", "Police"),
    ("अधिकारी", "Officer"),
];

/// Annotates known legal terms with their English gloss, once per word.
#[derive(Debug, Clone)]
pub struct Glossary {
    term: Regex,
}

impl Glossary {
    pub fn new() -> Result<Self> {
        let alternatives = GLOSSARY
            .iter()
            .map(|(hindi, _)| regex::escape(&canonical_term(hindi)))
            .collect::<Vec<String>>()
            .join("|");
        Ok(Self {
            term: Regex::new(&format!(r"({alternatives})(\w*)"))
                .context("failed to compile glossary regex")?,
        })
    }

    pub fn annotate(&self, text: &str) -> GlossDocument {
        let canonical = canonical_term(text);
        let mut translations = OrderedFields::new();

        let translated = self
            .term
            .replace_all(&canonical, |captures: &regex::Captures| {
                let term = &captures[1];
                let word = &captures[0];
                match english_for(term) {
                    Some((hindi, english)) => {
                        translations.insert(hindi, english);
                        format!("{word} ({english})")
                    }
                    None => word.to_string(),
                }
            })
            .into_owned();

        let mut ordered = OrderedFields::new();
        for (hindi, english) in GLOSSARY {
            if translations.get(hindi).is_some() {
                ordered.insert(*hindi, *english);
            }
        }

        GlossDocument {
            hindi_text: text.to_string(),
            translated_text: translated,
            translations: ordered,
        }
    }
}

fn english_for(term: &str) -> Option<(&'static str, &'static str)> {
    GLOSSARY
        .iter()
        .find(|(hindi, _)| canonical_term(hindi) == term)
        .copied()
}

/// Folds the precomposed nukta letter ड़ (U+095C) into its two-codepoint form.
fn canonical_term(term: &str) -> String {
    term.replace('\u{095C}', "\u{0921}\u{093C}")
}
