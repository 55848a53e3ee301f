//! Label-driven extraction of named FIR fields.
//!
//! Every field owns an ordered fallback chain of patterns. The first pattern
//! whose match yields at least two characters wins.

use anyhow::{Context, Result};
use regex::Regex;

use crate::extraction::normalize::DATE_TOKEN_PATTERN;
use crate::model::{OrderedFields, PeopleInvolved, StructuredData};

pub const MIN_FIELD_CHARS: usize = 2;

/// `पीड़ित` in both composed (nukta letter) and decomposed forms.
pub const VICTIM_LABEL: &str = r"पी(?:\x{0921}\x{093C}|\x{095C})ित";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    Group(usize),
    Whole,
}

#[derive(Debug, Clone)]
pub struct FieldPattern {
    regex: Regex,
    capture: Capture,
}

impl FieldPattern {
    pub fn group(pattern: &str) -> Result<Self> {
        Ok(Self {
            regex: Regex::new(pattern)
                .with_context(|| format!("failed to compile field regex: {pattern}"))?,
            capture: Capture::Group(1),
        })
    }

    pub fn whole(pattern: &str) -> Result<Self> {
        Ok(Self {
            regex: Regex::new(pattern)
                .with_context(|| format!("failed to compile field regex: {pattern}"))?,
            capture: Capture::Whole,
        })
    }

    fn resolve(&self, text: &str) -> Option<String> {
        let captures = self.regex.captures(text)?;
        let matched = match self.capture {
            Capture::Group(index) => captures.get(index),
            Capture::Whole => captures.get(0),
        }?;

        let value = matched.as_str().trim();
        if value.chars().count() >= MIN_FIELD_CHARS {
            Some(value.to_string())
        } else {
            None
        }
    }
}

/// Tries each pattern in order; `None` when no pattern yields a usable value.
pub fn extract_field(text: &str, patterns: &[FieldPattern]) -> Option<String> {
    patterns.iter().find_map(|pattern| pattern.resolve(text))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    PoliceStation,
    IncidentTiming,
    Accused,
    Victim,
    FirNumber,
    IpcSections,
    Officer,
    Location,
}

impl FieldKind {
    /// Fields reported under `additional_fields`, in output order.
    pub const ADDITIONAL: [FieldKind; 4] = [
        FieldKind::FirNumber,
        FieldKind::IpcSections,
        FieldKind::Officer,
        FieldKind::Location,
    ];

    pub fn display_key(self) -> &'static str {
        match self {
            FieldKind::PoliceStation => "Police Station",
            FieldKind::IncidentTiming => "Incident Timing",
            FieldKind::Accused => "Accused",
            FieldKind::Victim => "Victim",
            FieldKind::FirNumber => "FIR Number",
            FieldKind::IpcSections => "IPC Sections",
            FieldKind::Officer => "Investigating Officer",
            FieldKind::Location => "Location",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldExtractor {
    police_station: Vec<FieldPattern>,
    incident_timing: Vec<FieldPattern>,
    accused: Vec<FieldPattern>,
    victim: Vec<FieldPattern>,
    fir_number: Vec<FieldPattern>,
    ipc_sections: Vec<FieldPattern>,
    officer: Vec<FieldPattern>,
    location: Vec<FieldPattern>,
}

impl FieldExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            police_station: vec![
                FieldPattern::group(r"थाना[:\s]*([^\n]+)")?,
                FieldPattern::group(r"(?i)\bpolice\s*station[:\s]*([^\n]+)")?,
                FieldPattern::group(r"स्टेशन[:\s]*([^\n]+)")?,
                FieldPattern::group(r"(?i)\bP\.?\s*S\b\.?[:\s]+([^\n]+)")?,
            ],
            incident_timing: vec![
                FieldPattern::group(r"दिनांक[:\s]*([^\n]+)")?,
                FieldPattern::group(r"समय[:\s]*([^\n]+)")?,
                FieldPattern::group(r"(?i)\bdate\b[:\s]*([^\n]+)")?,
                FieldPattern::group(r"(?i)\btime\b[:\s]*([^\n]+)")?,
                FieldPattern::whole(&format!("{DATE_TOKEN_PATTERN}[^\\n]*"))?,
            ],
            accused: vec![
                FieldPattern::group(r"अभियुक्त(?:\s*का\s*नाम)?[:\s]*([^\n]+)")?,
                FieldPattern::group(r"(?i)\baccused\b[:\s]*([^\n]+)")?,
                FieldPattern::group(r"आरोपी(?:\s*का\s*नाम)?[:\s]*([^\n]+)")?,
                FieldPattern::group(r"नाम[:\s]*([^\n]+)")?,
            ],
            victim: vec![
                FieldPattern::group(&format!(
                    r"{VICTIM_LABEL}(?:\s*का\s*नाम)?[:\s]*([^\n]+)"
                ))?,
                FieldPattern::group(r"(?i)\bvictim\b[:\s]*([^\n]+)")?,
                FieldPattern::group(r"शिकायतकर्ता(?:\s*का\s*नाम)?[:\s]*([^\n]+)")?,
                FieldPattern::group(r"(?i)\bcomplainant\b[:\s]*([^\n]+)")?,
            ],
            fir_number: vec![
                FieldPattern::group(r"प्राथमिकी\s*संख्या[:\s]*([^\n]+)")?,
                FieldPattern::group(r"(?i)\bFIR\s*No\b\.?[:\s]*([^\n]+)")?,
                FieldPattern::group(r"केस\s*नंबर[:\s]*([^\n]+)")?,
                FieldPattern::group(r"(?m)(?:^|[^0-9/])([0-9]+/[0-9]{4})(?:$|[^0-9/])")?,
            ],
            ipc_sections: vec![
                FieldPattern::group(r"धारा[:\s]*([^\n]+)")?,
                FieldPattern::group(r"(?i)\bsection\b[:\s]*([^\n]+)")?,
                FieldPattern::group(r"(?i)(?:आईपीसी|\bIPC\b)[:\s]*([^\n]+)")?,
            ],
            officer: vec![
                FieldPattern::group(r"पुलिस\s*अधिकारी[:\s]*([^\n]+)")?,
                FieldPattern::group(r"(?i)\binvestigating\s*officer\b[:\s]*([^\n]+)")?,
                FieldPattern::group(r"अन्वेषण\s*अधिकारी[:\s]*([^\n]+)")?,
                FieldPattern::group(r"\bIO\b\s*:\s*([^\n]+)")?,
            ],
            location: vec![
                FieldPattern::group(r"स्थान[:\s]*([^\n]+)")?,
                FieldPattern::group(r"(?i)\blocation\b[:\s]*([^\n]+)")?,
                FieldPattern::group(r"पता[:\s]*([^\n]+)")?,
            ],
        })
    }

    pub fn patterns(&self, kind: FieldKind) -> &[FieldPattern] {
        match kind {
            FieldKind::PoliceStation => &self.police_station,
            FieldKind::IncidentTiming => &self.incident_timing,
            FieldKind::Accused => &self.accused,
            FieldKind::Victim => &self.victim,
            FieldKind::FirNumber => &self.fir_number,
            FieldKind::IpcSections => &self.ipc_sections,
            FieldKind::Officer => &self.officer,
            FieldKind::Location => &self.location,
        }
    }

    pub fn extract(&self, text: &str, kind: FieldKind) -> Option<String> {
        extract_field(text, self.patterns(kind))
    }

    pub fn extract_structured(&self, text: &str) -> StructuredData {
        let mut additional_fields = OrderedFields::new();
        for kind in FieldKind::ADDITIONAL {
            if let Some(value) = self.extract(text, kind) {
                additional_fields.insert(kind.display_key(), value);
            }
        }

        StructuredData {
            police_station: self.extract(text, FieldKind::PoliceStation),
            incident_timing: self.extract(text, FieldKind::IncidentTiming),
            people_involved: PeopleInvolved {
                accused: self.extract(text, FieldKind::Accused),
                victim: self.extract(text, FieldKind::Victim),
            },
            additional_fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> FieldExtractor {
        FieldExtractor::new().unwrap()
    }

    #[test]
    fn extracts_labelled_hindi_record() {
        let text = "थाना: कोतवाली, दिल्ली\nदिनांक: 15 जनवरी 2024\nअभियुक्त: राम कुमार\nपीड़ित: सुनीता देवी\nप्राथमिकी संख्या: 123/2024\nधारा: 323, 379";
        let data = extractor().extract_structured(text);

        assert_eq!(data.police_station.as_deref(), Some("कोतवाली, दिल्ली"));
        assert_eq!(data.incident_timing.as_deref(), Some("15 जनवरी 2024"));
        assert_eq!(data.people_involved.accused.as_deref(), Some("राम कुमार"));
        assert_eq!(data.people_involved.victim.as_deref(), Some("सुनीता देवी"));
        assert_eq!(
            data.additional_fields.iter().collect::<Vec<_>>(),
            vec![("FIR Number", "123/2024"), ("IPC Sections", "323, 379")]
        );
    }

    #[test]
    fn falls_back_to_later_patterns() {
        let extractor = extractor();
        assert_eq!(
            extractor.extract("Police Station: Civil Lines", FieldKind::PoliceStation),
            Some("Civil Lines".to_string())
        );
        assert_eq!(
            extractor.extract("Accused: Amit Verma", FieldKind::Accused),
            Some("Amit Verma".to_string())
        );
        assert_eq!(
            extractor.extract("शिकायतकर्ता: अनिता गुप्ता", FieldKind::Victim),
            Some("अनिता गुप्ता".to_string())
        );
    }

    #[test]
    fn too_short_values_fall_through_to_the_next_pattern() {
        let text = "थाना: क\nस्टेशन: सदर बाजार";
        assert_eq!(
            extractor().extract(text, FieldKind::PoliceStation),
            Some("सदर बाजार".to_string())
        );
    }

    #[test]
    fn unmatched_fields_resolve_to_none() {
        let data = extractor().extract_structured("कोई लेबल नहीं");
        assert_eq!(data.police_station, None);
        assert_eq!(data.incident_timing, None);
        assert_eq!(data.people_involved, PeopleInvolved::default());
        assert!(data.additional_fields.is_empty());
    }

    #[test]
    fn bare_date_line_is_the_last_timing_fallback() {
        assert_eq!(
            extractor().extract("घटना\n12/03/2024\nको हुई", FieldKind::IncidentTiming),
            Some("12/03/2024".to_string())
        );
    }

    #[test]
    fn bare_case_number_ignores_dates() {
        let extractor = extractor();
        assert_eq!(extractor.extract("12/03/2024", FieldKind::FirNumber), None);
        assert_eq!(
            extractor.extract("केस 45/2023 दर्ज", FieldKind::FirNumber),
            Some("45/2023".to_string())
        );
    }

    #[test]
    fn police_station_abbreviation_survives_sentence_breaks() {
        assert_eq!(
            extractor().extract("P.\nS.\nKotwali", FieldKind::PoliceStation),
            Some("Kotwali".to_string())
        );
        assert_eq!(extractor().extract("steps taken", FieldKind::PoliceStation), None);
    }

    #[test]
    fn additional_fields_follow_fixed_order() {
        let text = "स्थान: करोल बाग\nपुलिस अधिकारी: अजय शर्मा\nFIR No: 77/2024";
        let data = extractor().extract_structured(text);
        assert_eq!(
            data.additional_fields.keys().collect::<Vec<_>>(),
            vec!["FIR Number", "Investigating Officer", "Location"]
        );
    }

    #[test]
    fn io_label_requires_a_colon() {
        let extractor = extractor();
        assert_eq!(extractor.extract("location scenario", FieldKind::Officer), None);
        assert_eq!(
            extractor.extract("IO: SI Ajay", FieldKind::Officer),
            Some("SI Ajay".to_string())
        );
    }

    #[test]
    fn extraction_is_deterministic_across_calls() {
        let extractor = extractor();
        let text = "थाना: सदर\nधारा: 356";
        let first = extractor.extract_structured(text);
        extractor.extract_structured("अभियुक्त: कोई और");
        assert_eq!(first, extractor.extract_structured(text));
    }
}
