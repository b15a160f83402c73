//! # BEL JSON Documents
//!
//! Decoding of one import unit:
//!
//! ```text
//! [
//!   {"document": {"name": .., "version": .., "authors": "a, b", ...}},
//!   {"definitions": [{"namespace": {"keyword": "HGNC", ...}}, {"annotation": {...}}]},
//!   {"statements_and_sets": [{"sets": [...]}, {"statement": [...]}, ...]}
//! ]
//! ```
//!
//! Records are decoded one by one. A record that cannot be decoded becomes
//! [`Record::Invalid`] so the reducer can report it and carry on with the
//! rest of the document.

use crate::term::Term;
use crate::types::{BelGraphError, Citation, RelationType};
use serde_json::Value;
use std::collections::BTreeSet;

// =============================================================================
// DOCUMENT
// =============================================================================

/// A decoded BEL JSON document.
#[derive(Debug, Clone)]
pub struct BelDocument {
    pub header: DocumentHeader,
    pub records: Vec<Record>,
}

/// Document metadata and declared definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentHeader {
    pub name: String,
    pub version: String,
    pub description: String,
    pub authors: Vec<String>,
    pub keywords: Vec<String>,
    pub namespaces: Vec<String>,
    pub annotations: Vec<String>,
}

/// One entry of `statements_and_sets`.
#[derive(Debug, Clone)]
pub enum Record {
    Sets(Vec<SetRecord>),
    Statement(Statement),
    /// A record that could not be decoded, with its raw JSON for diagnostics.
    Invalid { error: BelGraphError, raw: String },
}

/// One context update inside a `sets` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetRecord {
    Citation(Citation),
    /// Raw evidence text; line continuations are collapsed by the reducer.
    Evidence(String),
    Set {
        keyword: String,
        values: BTreeSet<String>,
    },
    Unset(Vec<String>),
    /// A set key outside the BEL vocabulary.
    Unknown(String),
}

/// A `subject relation object` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub subject: Term,
    pub relation: RelationType,
    pub object: Term,
}

impl BelDocument {
    /// `true` for JSON that carries no document at all (`null`, `[]`, `{}`).
    #[must_use]
    pub fn is_empty_json(value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::Array(items) => items.is_empty(),
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Decode a document from raw bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, BelGraphError> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| BelGraphError::DeserializationError(e.to_string()))?;
        Self::from_json(&value)
    }

    /// Decode a document from parsed JSON.
    pub fn from_json(value: &Value) -> Result<Self, BelGraphError> {
        let parts = value.as_array().ok_or_else(|| {
            BelGraphError::MalformedDocument("expected a list of document parts".to_string())
        })?;

        let part = |key: &str| parts.iter().find_map(|p| p.get(key));

        let mut header = part("document")
            .map(parse_header)
            .unwrap_or_default();
        if let Some(definitions) = part("definitions") {
            parse_definitions(definitions, &mut header);
        }

        let records = part("statements_and_sets")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                BelGraphError::MalformedDocument("missing statements_and_sets".to_string())
            })?
            .iter()
            .map(parse_record)
            .collect();

        Ok(Self { header, records })
    }

    /// Number of statement records, valid or not.
    #[must_use]
    pub fn statement_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| !matches!(r, Record::Sets(_)))
            .count()
    }
}

// =============================================================================
// HEADER
// =============================================================================

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// A comma separated string or a list of strings.
fn text_list(value: Option<&Value>, separator: char) -> Vec<String> {
    match value {
        Some(Value::String(s)) => s
            .split(separator)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_header(document: &Value) -> DocumentHeader {
    DocumentHeader {
        name: text(document.get("name")),
        version: text(document.get("version")),
        description: text(document.get("description")),
        authors: text_list(document.get("authors"), ','),
        keywords: text_list(document.get("keywords"), ','),
        ..DocumentHeader::default()
    }
}

fn parse_definitions(definitions: &Value, header: &mut DocumentHeader) {
    let Some(entries) = definitions.as_array() else {
        return;
    };
    for entry in entries {
        if let Some(keyword) = entry.get("namespace").and_then(|d| d.get("keyword")) {
            header.namespaces.push(text(Some(keyword)));
        } else if let Some(keyword) = entry.get("annotation").and_then(|d| d.get("keyword")) {
            header.annotations.push(text(Some(keyword)));
        }
    }
}

// =============================================================================
// RECORDS
// =============================================================================

fn invalid(error: BelGraphError, raw: &Value) -> Record {
    Record::Invalid {
        error,
        raw: raw.to_string(),
    }
}

fn parse_record(raw: &Value) -> Record {
    if let Some(sets) = raw.get("sets") {
        return match sets.as_array() {
            Some(entries) => Record::Sets(entries.iter().flat_map(parse_set).collect()),
            None => invalid(
                BelGraphError::MalformedStatement("sets record is not a list".to_string()),
                raw,
            ),
        };
    }
    if let Some(statement) = raw.get("statement") {
        return match parse_statement(statement) {
            Ok(statement) => Record::Statement(statement),
            Err(error) => invalid(error, raw),
        };
    }
    invalid(
        BelGraphError::MalformedStatement("record is neither sets nor statement".to_string()),
        raw,
    )
}

fn parse_citation(value: &Value) -> Citation {
    Citation {
        kind: text(value.get("type")),
        reference: text(value.get("ref")),
        title: text(value.get("title")),
        pub_date: text(value.get("pub_date")),
        authors: text_list(value.get("author_list"), '|'),
        comment: text(value.get("comment")),
    }
}

fn parse_set(entry: &Value) -> Vec<SetRecord> {
    let Some(map) = entry.as_object() else {
        return vec![SetRecord::Unknown(entry.to_string())];
    };
    map.iter()
        .flat_map(|(key, value)| match key.as_str() {
            "citation" => vec![SetRecord::Citation(parse_citation(value))],
            "evidence" => vec![SetRecord::Evidence(
                value.as_str().unwrap_or_default().to_string(),
            )],
            "set" => value
                .as_object()
                .into_iter()
                .flatten()
                .map(|(keyword, entries)| SetRecord::Set {
                    keyword: keyword.clone(),
                    values: match entries {
                        Value::String(single) => BTreeSet::from([single.clone()]),
                        other => text_list(Some(other), ',').into_iter().collect(),
                    },
                })
                .collect(),
            "unset" => vec![SetRecord::Unset(match value {
                Value::String(single) => vec![single.clone()],
                other => text_list(Some(other), ','),
            })],
            other => vec![SetRecord::Unknown(other.to_string())],
        })
        .collect()
}

fn parse_statement(data: &Value) -> Result<Statement, BelGraphError> {
    let parts = data
        .as_array()
        .ok_or_else(|| BelGraphError::MalformedStatement("statement is not a list".to_string()))?;

    let subject = parts
        .first()
        .and_then(|p| p.get("subject"))
        .ok_or_else(|| BelGraphError::MalformedStatement("missing subject".to_string()))?;

    let object = parts.get(2).and_then(|p| p.get("object")).ok_or_else(|| {
        BelGraphError::MalformedStatement("missing object (nested statements are not supported)".to_string())
    })?;

    let relation_name = parts
        .get(1)
        .and_then(|p| p.get("relation"))
        .and_then(Value::as_str)
        .ok_or_else(|| BelGraphError::MalformedStatement("missing relation".to_string()))?;
    let relation = RelationType::from_name(relation_name)
        .ok_or_else(|| BelGraphError::UnknownRelation(relation_name.to_string()))?;

    Ok(Statement {
        subject: Term::from_json(subject)?,
        relation,
        object: Term::from_json(object)?,
    })
}
