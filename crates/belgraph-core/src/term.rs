//! # BEL Terms
//!
//! Typed representation of a parsed BEL function call.
//!
//! BEL JSON encodes a term as `[header, params]`, where `header` is
//! `{"function": {"type": ..., "name": ...}}` and `params` is a mixed list of:
//! - `{"namespace": .., "name": ..}` literals
//! - field dictionaries (pmod, fragment, variant, molecular activity...)
//! - nested terms, or lists of nested terms
//! - raw strings
//!
//! The JSON is decoded once into [`Term`]; everything downstream pattern
//! matches on [`Arg`] instead of probing JSON shapes.
//!
//! ## Canonical string
//!
//! [`Term::canonical`] renders the deterministic identity of a term, e.g.
//! `p(HGNC:"TP53",pmod(Ph,Ser,15))`. Parameter order is kept exactly as given.

use crate::primitives::{MAX_TERM_DEPTH, pmod_abbreviation};
use crate::types::{BelGraphError, FunctionClass};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

// =============================================================================
// TERM TREE
// =============================================================================

/// A BEL function call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub function: FunctionClass,
    pub args: Vec<Arg>,
}

/// One parameter of a function call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// `NAMESPACE:"NAME"`
    Literal { namespace: String, name: String },
    /// Modifier fields in input order. `None` marks an empty value.
    Fields(Vec<(String, Option<String>)>),
    Term(Term),
    Terms(Vec<Term>),
    Raw(String),
}

impl Arg {
    #[must_use]
    pub fn literal(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Literal {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl Term {
    #[must_use]
    pub fn new(function: FunctionClass, args: Vec<Arg>) -> Self {
        Self { function, args }
    }

    /// Decode a term from its BEL JSON form.
    pub fn from_json(value: &Value) -> Result<Self, BelGraphError> {
        parse_term(value, 0)
    }

    /// The canonical string of this term.
    #[must_use]
    pub fn canonical(&self) -> String {
        let params: Vec<String> = self
            .args
            .iter()
            .map(|arg| render_arg(arg, self.function))
            .collect();
        format!("{}({})", self.function.short(), params.join(","))
    }

    /// Nested terms in parameter order.
    pub fn children(&self) -> impl Iterator<Item = &Term> + '_ {
        self.args.iter().flat_map(|arg| match arg {
            Arg::Term(term) => std::slice::from_ref(term).iter(),
            Arg::Terms(terms) => terms.iter(),
            _ => std::slice::Iter::default(),
        })
    }

    /// Literal and field parameters flattened into one property map.
    ///
    /// Later parameters overwrite earlier ones with the same key.
    #[must_use]
    pub fn properties(&self) -> BTreeMap<String, String> {
        let mut properties = BTreeMap::new();
        for arg in &self.args {
            match arg {
                Arg::Literal { namespace, name } => {
                    properties.insert("namespace".to_string(), namespace.clone());
                    properties.insert("name".to_string(), name.clone());
                }
                Arg::Fields(fields) => {
                    for (key, value) in fields {
                        if let Some(value) = value {
                            properties.insert(key.clone(), value.clone());
                        }
                    }
                }
                Arg::Term(_) | Arg::Terms(_) | Arg::Raw(_) => {}
            }
        }
        properties
    }
}

// =============================================================================
// RENDERING
// =============================================================================

fn field<'a>(fields: &'a [(String, Option<String>)], key: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(k, _)| k == key)
        .and_then(|(_, v)| v.as_deref())
}

fn quoted_values(fields: &[(String, Option<String>)]) -> String {
    fields
        .iter()
        .filter_map(|(_, v)| v.as_deref())
        .map(|v| format!("\"{v}\""))
        .collect::<Vec<_>>()
        .join(",")
}

fn render_arg(arg: &Arg, parent: FunctionClass) -> String {
    match arg {
        Arg::Literal { namespace, name } => format!("{namespace}:\"{name}\""),
        Arg::Term(term) => term.canonical(),
        Arg::Terms(terms) => terms
            .iter()
            .map(Term::canonical)
            .collect::<Vec<_>>()
            .join(","),
        Arg::Raw(raw) => raw.clone(),
        Arg::Fields(fields) => render_fields(fields, parent),
    }
}

fn render_fields(fields: &[(String, Option<String>)], parent: FunctionClass) -> String {
    let namespaced = field(fields, "namespace")
        .map(|ns| format!("{ns}:\"{}\"", field(fields, "name").unwrap_or_default()));

    match parent {
        FunctionClass::Activity => {
            let inner = namespaced
                .unwrap_or_else(|| field(fields, "default").unwrap_or_default().to_string());
            format!("ma({inner})")
        }
        FunctionClass::Pmod => {
            let first = namespaced.unwrap_or_else(|| {
                pmod_abbreviation(field(fields, "type").unwrap_or_default()).to_string()
            });
            [
                Some(first.as_str()),
                field(fields, "amino_acid"),
                field(fields, "position"),
            ]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(",")
        }
        _ => quoted_values(fields),
    }
}

// =============================================================================
// JSON DECODING
// =============================================================================

fn function_name(header: &Value) -> Option<&str> {
    header.get("function")?.get("name")?.as_str()
}

fn is_term(value: &Value) -> bool {
    value
        .as_array()
        .and_then(|items| items.first())
        .is_some_and(|head| head.get("function").is_some())
}

/// JSON scalar as an optional string; falsy values become `None`.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("True".to_string()),
        Value::Number(n) => {
            if n.as_i64() == Some(0) || n.as_u64() == Some(0) {
                None
            } else {
                Some(n.to_string())
            }
        }
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

fn is_literal(map: &Map<String, Value>) -> bool {
    map.len() == 2 && map.contains_key("namespace") && map.contains_key("name")
}

fn parse_term(value: &Value, depth: usize) -> Result<Term, BelGraphError> {
    if depth > MAX_TERM_DEPTH {
        return Err(BelGraphError::InvalidTerm(format!(
            "nesting deeper than {MAX_TERM_DEPTH} levels"
        )));
    }

    let items = value
        .as_array()
        .ok_or_else(|| BelGraphError::InvalidTerm(format!("expected [header, params], got {value}")))?;
    let header = items
        .first()
        .ok_or_else(|| BelGraphError::InvalidTerm("empty term".to_string()))?;
    let name = function_name(header)
        .ok_or_else(|| BelGraphError::InvalidTerm(format!("missing function header in {header}")))?;
    let function =
        FunctionClass::from_name(name).ok_or_else(|| BelGraphError::UnknownFunction(name.to_string()))?;

    let mut args = Vec::new();
    for params in items.iter().skip(1) {
        let params = params
            .as_array()
            .ok_or_else(|| BelGraphError::InvalidTerm(format!("parameters of {name} are not a list")))?;
        for param in params {
            if let Some(arg) = parse_arg(param, depth)? {
                args.push(arg);
            }
        }
    }

    Ok(Term { function, args })
}

fn parse_arg(value: &Value, depth: usize) -> Result<Option<Arg>, BelGraphError> {
    let arg = match value {
        Value::Null => return Ok(None),
        Value::Object(map) if map.contains_key("function") => {
            return Err(BelGraphError::InvalidTerm(
                "function header in parameter position".to_string(),
            ));
        }
        Value::Object(map) if is_literal(map) => Arg::Literal {
            namespace: scalar(&map["namespace"]).unwrap_or_default(),
            name: scalar(&map["name"]).unwrap_or_default(),
        },
        Value::Object(map) => Arg::Fields(
            map.iter()
                .map(|(key, value)| (key.clone(), scalar(value)))
                .collect(),
        ),
        Value::Array(items) if items.is_empty() => return Ok(None),
        Value::Array(_) if is_term(value) => Arg::Term(parse_term(value, depth + 1)?),
        Value::Array(items) => Arg::Terms(
            items
                .iter()
                .map(|item| parse_term(item, depth + 1))
                .collect::<Result<_, _>>()?,
        ),
        Value::String(raw) => Arg::Raw(raw.clone()),
        Value::Bool(_) | Value::Number(_) => Arg::Raw(value.to_string()),
    };
    Ok(Some(arg))
}
