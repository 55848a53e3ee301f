use std::collections::BTreeSet;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Rendered in place of any field that was not found.
pub const NULL_SENTINEL: &str = "Null";

/// `None` serializes as the `"Null"` sentinel; `"Null"`, JSON null and blank
/// strings all deserialize back to `None`.
pub mod sentinel {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::NULL_SENTINEL;

    pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value.as_deref().unwrap_or(NULL_SENTINEL))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|value| normalize_field(&value)))
    }

    pub fn normalize_field(value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NULL_SENTINEL) {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// String map that keeps insertion order on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderedFields(Vec<(String, String)>);

impl OrderedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the value of an existing key in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(entry) = self.0.iter_mut().find(|(existing, _)| *existing == key) {
            entry.1 = value;
        } else {
            self.0.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    #[cfg(test)]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for OrderedFields {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for OrderedFields {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedFieldsVisitor;

        impl<'de> Visitor<'de> for OrderedFieldsVisitor {
            type Value = OrderedFields;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of string fields")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut fields = OrderedFields::new();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    fields.insert(key, value);
                }
                Ok(fields)
            }
        }

        deserializer.deserialize_map(OrderedFieldsVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PeopleInvolved {
    #[serde(with = "sentinel", default)]
    pub accused: Option<String>,
    #[serde(with = "sentinel", default)]
    pub victim: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StructuredData {
    #[serde(with = "sentinel", default)]
    pub police_station: Option<String>,
    #[serde(with = "sentinel", default)]
    pub incident_timing: Option<String>,
    pub people_involved: PeopleInvolved,
    #[serde(default)]
    pub additional_fields: OrderedFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Entities {
    pub persons: BTreeSet<String>,
    pub locations: BTreeSet<String>,
    pub dates: BTreeSet<String>,
    pub legal_sections: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredRecord {
    pub clean_hindi_text: String,
    pub structured_data: StructuredData,
    #[serde(default)]
    pub entities: Entities,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ocr_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub variants_processed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub raw_ocr_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutDocument {
    pub header: String,
    pub body: String,
    pub footer: String,
    pub total_lines: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlossDocument {
    pub hindi_text: String,
    pub translated_text: String,
    pub translations: OrderedFields,
}

/// Result of one processing request; the JSON shape depends on the mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProcessOutput {
    Structured(Box<StructuredRecord>),
    Text(String),
    Layout(LayoutDocument),
    Entities(Entities),
    Gloss(GlossDocument),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionSummary {
    pub variants_processed: usize,
    pub attempted: usize,
    pub failed: usize,
    pub selected_variant: Option<String>,
    pub confidence: f64,
    pub early_exit: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceEntry {
    pub path: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub updated_at: String,
    pub status: String,
    pub command: String,
    pub backend: String,
    pub mode: String,
    pub profile: String,
    pub recognizer_version: Option<String>,
    pub source: Option<SourceEntry>,
    pub text_sha256: Option<String>,
    pub selection: Option<SelectionSummary>,
    pub failure_reason: Option<String>,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> StructuredRecord {
        let mut additional_fields = OrderedFields::new();
        additional_fields.insert("IPC Sections", "323, 379");
        additional_fields.insert("FIR Number", "123/2024");

        StructuredRecord {
            clean_hindi_text: "थाना: कोतवाली".to_string(),
            structured_data: StructuredData {
                police_station: Some("कोतवाली".to_string()),
                incident_timing: None,
                people_involved: PeopleInvolved::default(),
                additional_fields,
            },
            entities: Entities::default(),
            ocr_confidence: None,
            variants_processed: None,
            raw_ocr_text: None,
        }
    }

    #[test]
    fn missing_fields_serialize_as_null_sentinel() {
        let value = serde_json::to_value(sample_record()).unwrap();
        let data = &value["structured_data"];

        assert_eq!(data["police_station"], "कोतवाली");
        assert_eq!(data["incident_timing"], "Null");
        assert_eq!(data["people_involved"]["accused"], "Null");
        assert_eq!(data["people_involved"]["victim"], "Null");
        assert!(value.get("ocr_confidence").is_none());
    }

    #[test]
    fn additional_fields_keep_insertion_order() {
        let json = serde_json::to_string(&sample_record()).unwrap();
        let ipc = json.find("IPC Sections").unwrap();
        let fir = json.find("FIR Number").unwrap();
        assert!(ipc < fir);
    }

    #[test]
    fn sentinel_and_blank_values_deserialize_to_none() {
        let people: PeopleInvolved =
            serde_json::from_str(r#"{ "accused": "Null", "victim": "  " }"#).unwrap();
        assert_eq!(people, PeopleInvolved::default());

        let people: PeopleInvolved =
            serde_json::from_str(r#"{ "accused": null, "victim": " सुनीता देवी " }"#).unwrap();
        assert_eq!(people.accused, None);
        assert_eq!(people.victim.as_deref(), Some("सुनीता देवी"));
    }

    #[test]
    fn ordered_fields_insert_replaces_existing_key() {
        let mut fields = OrderedFields::new();
        fields.insert("Location", "करोल बाग");
        fields.insert("FIR Number", "1/2024");
        fields.insert("Location", "दिल्ली");

        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("Location"), Some("दिल्ली"));
        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["Location", "FIR Number"]);
    }
}
