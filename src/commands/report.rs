use std::collections::BTreeSet;
use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::model::{Entities, ProcessOutput, SelectionSummary, StructuredRecord};

/// Run-level facts printed above the document.
#[derive(Debug, Clone)]
pub struct ReportHeader<'a> {
    pub run_id: &'a str,
    pub backend: &'a str,
    pub mode: &'a str,
    pub profile: &'a str,
}

pub fn write_json_stdout<T: Serialize>(value: &T) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, value)
        .context("failed to serialize extraction json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

pub fn write_text_stdout(
    header: &ReportHeader<'_>,
    output: &ProcessOutput,
    selection: Option<&SelectionSummary>,
    warnings: &[String],
) -> Result<()> {
    let mut stdout = io::BufWriter::new(io::stdout().lock());
    render_report(&mut stdout, header, output, selection, warnings)?;
    stdout.flush()?;
    Ok(())
}

pub fn render_report<W: Write>(
    out: &mut W,
    header: &ReportHeader<'_>,
    output: &ProcessOutput,
    selection: Option<&SelectionSummary>,
    warnings: &[String],
) -> io::Result<()> {
    writeln!(out, "Run: {}", header.run_id)?;
    writeln!(
        out,
        "Backend: {} mode={} profile={}",
        header.backend, header.mode, header.profile
    )?;
    if let Some(selection) = selection {
        writeln!(
            out,
            "Selection: variant={} confidence={:.3} attempted={}/{} failed={} early_exit={}",
            selection.selected_variant.as_deref().unwrap_or("(none)"),
            selection.confidence,
            selection.attempted,
            selection.variants_processed,
            selection.failed,
            selection.early_exit
        )?;
    }

    match output {
        ProcessOutput::Structured(record) => render_structured(out, record)?,
        ProcessOutput::Text(text) => {
            writeln!(out, "Text:")?;
            writeln!(out, "{text}")?;
        }
        ProcessOutput::Layout(layout) => {
            writeln!(out, "Lines: {}", layout.total_lines)?;
            for (label, section) in [
                ("Header", &layout.header),
                ("Body", &layout.body),
                ("Footer", &layout.footer),
            ] {
                writeln!(out, "{label}:")?;
                for line in section.lines() {
                    writeln!(out, "\t{line}")?;
                }
            }
        }
        ProcessOutput::Entities(entities) => render_entities(out, entities)?,
        ProcessOutput::Gloss(gloss) => {
            writeln!(out, "Glossary terms: {}", gloss.translations.len())?;
            for (hindi, english) in gloss.translations.iter() {
                writeln!(out, "\t{hindi} = {english}")?;
            }
            writeln!(out, "Annotated text:")?;
            writeln!(out, "{}", gloss.translated_text)?;
        }
    }

    if !warnings.is_empty() {
        writeln!(out, "Warnings: {}", warnings.len())?;
        for warning in warnings {
            writeln!(out, "\t{warning}")?;
        }
    }
    Ok(())
}

fn render_structured<W: Write>(out: &mut W, record: &StructuredRecord) -> io::Result<()> {
    let data = &record.structured_data;
    let people = &data.people_involved;
    for (label, value) in [
        ("Police station", &data.police_station),
        ("Incident timing", &data.incident_timing),
        ("Accused", &people.accused),
        ("Victim", &people.victim),
    ] {
        writeln!(out, "{label}: {}", display_field(value))?;
    }

    if !data.additional_fields.is_empty() {
        writeln!(out, "Additional fields:")?;
        for (key, value) in data.additional_fields.iter() {
            writeln!(out, "\t{key}: {value}")?;
        }
    }

    render_entities(out, &record.entities)?;
    writeln!(out, "Clean text:")?;
    writeln!(out, "{}", record.clean_hindi_text)
}

fn render_entities<W: Write>(out: &mut W, entities: &Entities) -> io::Result<()> {
    writeln!(
        out,
        "Entities: persons={} locations={} dates={} legal_sections={}",
        entities.persons.len(),
        entities.locations.len(),
        entities.dates.len(),
        entities.legal_sections.len()
    )?;
    for (label, values) in [
        ("persons", &entities.persons),
        ("locations", &entities.locations),
        ("dates", &entities.dates),
        ("legal_sections", &entities.legal_sections),
    ] {
        if !values.is_empty() {
            writeln!(out, "\t{label}: {}", join_set(values))?;
        }
    }
    Ok(())
}

fn display_field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(crate::model::NULL_SENTINEL)
}

fn join_set(values: &BTreeSet<String>) -> String {
    values.iter().cloned().collect::<Vec<String>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OrderedFields, PeopleInvolved, StructuredData};

    fn header() -> ReportHeader<'static> {
        ReportHeader {
            run_id: "run-20240115T000000Z",
            backend: "demo",
            mode: "structured",
            profile: "enhanced",
        }
    }

    #[test]
    fn structured_report_shows_sentinels_and_fields() {
        let mut additional_fields = OrderedFields::new();
        additional_fields.insert("FIR Number", "123/2024");
        let record = StructuredRecord {
            clean_hindi_text: "थाना: कोतवाली".to_string(),
            structured_data: StructuredData {
                police_station: Some("कोतवाली".to_string()),
                incident_timing: None,
                people_involved: PeopleInvolved::default(),
                additional_fields,
            },
            entities: Entities::default(),
            ocr_confidence: Some(0.9),
            variants_processed: Some(1),
            raw_ocr_text: None,
        };
        let selection = SelectionSummary {
            variants_processed: 5,
            attempted: 1,
            failed: 0,
            selected_variant: Some("source".to_string()),
            confidence: 0.9,
            early_exit: true,
        };

        let mut buffer = Vec::new();
        render_report(
            &mut buffer,
            &header(),
            &ProcessOutput::Structured(Box::new(record)),
            Some(&selection),
            &["1 of 5 attempted variant(s) failed recognition".to_string()],
        )
        .unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.contains("Selection: variant=source confidence=0.900 attempted=1/5"));
        assert!(text.contains("Police station: कोतवाली\n"));
        assert!(text.contains("Incident timing: Null\n"));
        assert!(text.contains("\tFIR Number: 123/2024\n"));
        assert!(text.contains("Warnings: 1\n"));
    }

    #[test]
    fn text_report_prints_document_verbatim() {
        let mut buffer = Vec::new();
        render_report(
            &mut buffer,
            &header(),
            &ProcessOutput::Text("पहली पंक्ति\nदूसरी".to_string()),
            None,
            &[],
        )
        .unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.ends_with("Text:\nपहली पंक्ति\nदूसरी\n"));
        assert!(!text.contains("Selection:"));
        assert!(!text.contains("Warnings"));
    }
}
