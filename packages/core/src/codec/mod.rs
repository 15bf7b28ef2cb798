//! Wire codec: JSON-LD and XML documents ⇄ internal item values.
//!
//! [`decode`] produces a [`RawPackage`]: the package header and one
//! [`RawItem`] per top-level item, all in internal shape but not yet
//! validated. [`encode`] is the inverse and takes the same structure, so a
//! validated package exports by building a `RawPackage` from its items.
//!
//! The two formats share everything after the first tree-building step:
//! key renaming, reference unwrapping and field normalisation live in
//! `normalize`, the rename tables in `vocabulary`.

pub(crate) mod jsonld;
pub(crate) mod normalize;
pub mod vocabulary;
pub(crate) mod xml;

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::status::StatusCode;
use crate::types::ItemKind;

/// A supported wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    JsonLd,
    Xml,
}

impl Format {
    /// Guess the format from the first significant character of a document.
    pub fn sniff(document: &str) -> Option<Self> {
        match document.trim_start_matches('\u{feff}').trim_start().chars().next() {
            Some('{') | Some('[') => Some(Format::JsonLd),
            Some('<') => Some(Format::Xml),
            _ => None,
        }
    }

    /// Format implied by a file extension, e.g. `"jsonld"`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jsonld" | "json" => Some(Format::JsonLd),
            "xml" => Some(Format::Xml),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::JsonLd => write!(f, "jsonld"),
            Format::Xml => write!(f, "xml"),
        }
    }
}

impl std::str::FromStr for Format {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jsonld" | "json-ld" | "json" => Ok(Format::JsonLd),
            "xml" => Ok(Format::Xml),
            other => Err(format!(
                "unknown format {other:?}; expected one of: jsonld, xml"
            )),
        }
    }
}

/// Codec configuration.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `PIG_ONTOLOGY_PREFIX` | `o` | Prefix given to bare class identifiers |
/// | `PIG_DATA_PREFIX` | `d` | Prefix given to bare individual identifiers |
/// | `PIG_DEFAULT_LANGUAGE` | `en` | Language assumed for untagged string values |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecOptions {
    pub ontology_prefix: String,
    pub data_prefix: String,
    pub default_language: String,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            ontology_prefix: "o".into(),
            data_prefix: "d".into(),
            default_language: "en".into(),
        }
    }
}

impl CodecOptions {
    /// Populate options from environment variables, applying defaults where absent.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ontology_prefix: env_or("PIG_ONTOLOGY_PREFIX", defaults.ontology_prefix),
            data_prefix: env_or("PIG_DATA_PREFIX", defaults.data_prefix),
            default_language: env_or("PIG_DEFAULT_LANGUAGE", defaults.default_language),
        }
    }
}

fn env_or(name: &str, default: String) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
}

/// One top-level item as decoded, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawItem {
    /// Kind resolved from the declared item type; `None` if unknown or absent.
    pub kind: Option<ItemKind>,
    /// The item type exactly as the document declared it.
    pub declared: Option<String>,
    /// Internal-shaped value, including `itemType` when declared.
    pub value: Value,
}

impl RawItem {
    pub fn new(value: Value) -> Self {
        let declared = value
            .get("itemType")
            .and_then(Value::as_str)
            .map(str::to_string);
        let kind = declared.as_deref().and_then(ItemKind::from_tag);
        Self {
            kind,
            declared,
            value,
        }
    }

    /// The item's `id`, if it has a string one.
    pub fn id(&self) -> Option<&str> {
        self.value.get("id").and_then(Value::as_str)
    }
}

/// A decoded document: namespaces, header fields, and items in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPackage {
    /// Prefix → namespace IRI.
    pub context: BTreeMap<String, String>,
    /// Internal-shaped header fields (`id`, `title`, `modified`, …).
    pub header: Map<String, Value>,
    pub items: Vec<RawItem>,
}

/// Errors raised while reading or writing a document.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document is not valid XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("unexpected document structure: {0}")]
    Structure(String),
}

impl CodecError {
    pub fn status(&self) -> StatusCode {
        StatusCode::ParseFailure
    }
}

/// Decode a whole document into its raw package.
pub fn decode(
    document: &str,
    format: Format,
    options: &CodecOptions,
) -> Result<RawPackage, CodecError> {
    let package = match format {
        Format::JsonLd => jsonld::decode(document, options)?,
        Format::Xml => xml::decode(document, options)?,
    };
    tracing::debug!(%format, items = package.items.len(), "decoded document");
    Ok(package)
}

/// Encode a package into a document.
pub fn encode(package: &RawPackage, format: Format) -> Result<String, CodecError> {
    match format {
        Format::JsonLd => jsonld::encode(package),
        Format::Xml => xml::encode(package),
    }
}

/// Encode a single internal item value as a stand-alone fragment of `format`.
pub fn encode_item(item: &Value, format: Format) -> Result<String, CodecError> {
    match format {
        Format::JsonLd => jsonld::encode_item(item),
        Format::Xml => xml::encode_item(item),
    }
}

/// Namespaces written into an encoded document: the standard ones, then the
/// package's own, which win on conflict.
pub(crate) fn merged_context(context: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut merged: BTreeMap<String, String> = vocabulary::STANDARD_NAMESPACES
        .iter()
        .map(|(p, iri)| (p.to_string(), iri.to_string()))
        .collect();
    merged.extend(context.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

// --- tests ---

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sniff_formats() {
        assert_eq!(Format::sniff("  {\"@graph\": []}"), Some(Format::JsonLd));
        assert_eq!(Format::sniff("<?xml version=\"1.0\"?>"), Some(Format::Xml));
        assert_eq!(Format::sniff("hello"), None);
        assert_eq!(Format::sniff(""), None);
    }

    #[test]
    fn format_from_str_and_extension() {
        assert_eq!("JSON-LD".parse::<Format>(), Ok(Format::JsonLd));
        assert_eq!("xml".parse::<Format>(), Ok(Format::Xml));
        assert!("yaml".parse::<Format>().is_err());
        assert_eq!(Format::from_extension("jsonld"), Some(Format::JsonLd));
        assert_eq!(Format::from_extension("txt"), None);
    }

    #[test]
    fn raw_item_resolves_kind() {
        let item = RawItem::new(json!({ "itemType": "pig:Entity", "id": "o:Pump" }));
        assert_eq!(item.kind, Some(ItemKind::EntityClass));
        assert_eq!(item.id(), Some("o:Pump"));

        let unknown = RawItem::new(json!({ "itemType": "pig:Gadget" }));
        assert_eq!(unknown.kind, None);
        assert_eq!(unknown.declared.as_deref(), Some("pig:Gadget"));
    }

    #[test]
    fn package_context_overrides_standard() {
        let mut context = BTreeMap::new();
        context.insert("o".to_string(), "https://example.org/o#".to_string());
        context.insert("pig".to_string(), "urn:pig".to_string());
        let merged = merged_context(&context);
        assert_eq!(merged["pig"], "urn:pig");
        assert_eq!(merged["o"], "https://example.org/o#");
        assert!(merged.contains_key("dcterms"));
    }

    #[test]
    fn parse_errors_have_parse_status() {
        let err = decode("{ not json", Format::JsonLd, &CodecOptions::default()).unwrap_err();
        assert_eq!(err.status(), StatusCode::ParseFailure);
    }
}
