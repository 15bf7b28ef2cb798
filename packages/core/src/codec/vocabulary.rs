//! Static field-name tables shared by both wire formats.
//!
//! Every internal field has one JSON-LD name and, unless the XML form is
//! structural (element name, text content, restriction facet), one XML name.
//! Keys not in the table pass through renaming unchanged; on JSON-LD
//! individuals those are the configurable property and link keys.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::types::ItemKind;

/// How a field is carried in XML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum XmlForm {
    Attribute(&'static str),
    Child(&'static str),
    /// Element name, text content, or a restriction facet; handled by the XML codec.
    Structural,
}

#[derive(Debug)]
pub(crate) struct Term {
    pub internal: &'static str,
    pub jsonld: &'static str,
    pub xml: XmlForm,
}

const fn term(internal: &'static str, jsonld: &'static str, xml: XmlForm) -> Term {
    Term {
        internal,
        jsonld,
        xml,
    }
}

use XmlForm::{Attribute, Child, Structural};

/// The canonical rename table. Order is the field order used when encoding.
pub(crate) static TERMS: &[Term] = &[
    term("id", "@id", Attribute("id")),
    term("itemType", "pig:itemType", Structural),
    term("hasClass", "pig:hasClass", Attribute("hasClass")),
    term("specializes", "pig:specializes", Attribute("specializes")),
    term("idRef", "pig:idRef", Attribute("idRef")),
    term("lang", "@language", Attribute("xml:lang")),
    term("value", "@value", Structural),
    term("title", "dcterms:title", Child("dcterms:title")),
    term("description", "dcterms:description", Child("dcterms:description")),
    term("icon", "pig:icon", Child("pig:icon")),
    term("eligibleProperty", "pig:eligibleProperty", Child("pig:eligibleProperty")),
    term("eligibleEndpoint", "pig:eligibleEndpoint", Child("pig:eligibleEndpoint")),
    term("eligibleSourceLink", "pig:eligibleSourceLink", Child("pig:eligibleSourceLink")),
    term("eligibleTargetLink", "pig:eligibleTargetLink", Child("pig:eligibleTargetLink")),
    term("composedProperty", "pig:composedProperty", Child("pig:composedProperty")),
    term("datatype", "sh:datatype", Structural),
    term("minCount", "sh:minCount", Structural),
    term("maxCount", "sh:maxCount", Structural),
    term("maxLength", "sh:maxLength", Structural),
    term("pattern", "sh:pattern", Structural),
    term("minInclusive", "sh:minInclusive", Structural),
    term("maxInclusive", "sh:maxInclusive", Structural),
    term("revision", "pig:revision", Child("pig:revision")),
    term("priorRevision", "pig:priorRevision", Child("pig:priorRevision")),
    term("modified", "dcterms:modified", Child("dcterms:modified")),
    term("creator", "dcterms:creator", Child("dcterms:creator")),
    term("hasProperty", "pig:hasProperty", Structural),
    term("hasSourceLink", "pig:hasSourceLink", Structural),
    term("hasTargetLink", "pig:hasTargetLink", Structural),
];

/// Wire vocabulary a document is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Vocabulary {
    JsonLd,
    Xml,
}

static FROM_JSONLD: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| TERMS.iter().map(|t| (t.jsonld, t.internal)).collect());

static FROM_XML: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    TERMS
        .iter()
        .filter_map(|t| match t.xml {
            Attribute(name) | Child(name) => Some((name, t.internal)),
            Structural => None,
        })
        .collect()
});

static BY_INTERNAL: LazyLock<HashMap<&'static str, &'static Term>> =
    LazyLock::new(|| TERMS.iter().map(|t| (t.internal, t)).collect());

/// Wire name → internal name; `None` for keys outside the table.
pub(crate) fn to_internal(vocabulary: Vocabulary, key: &str) -> Option<&'static str> {
    match vocabulary {
        Vocabulary::JsonLd => FROM_JSONLD.get(key).copied(),
        Vocabulary::Xml => FROM_XML.get(key).copied(),
    }
}

/// Internal name → JSON-LD name; `None` for keys outside the table.
pub(crate) fn to_jsonld(internal: &str) -> Option<&'static str> {
    BY_INTERNAL.get(internal).map(|t| t.jsonld)
}

pub(crate) fn xml_form(internal: &str) -> Option<XmlForm> {
    BY_INTERNAL.get(internal).map(|t| t.xml)
}

/// Fixed structural keys of an item; anything else on an individual is a
/// configurable property or link.
pub(crate) fn is_structural(internal: &str) -> bool {
    BY_INTERNAL.contains_key(internal)
}

/// Multi-language text fields.
pub(crate) const TEXT_FIELDS: &[&str] = &["title", "description"];

/// Text fields whose values may carry XHTML markup, kept verbatim.
pub(crate) const RICH_TEXT_FIELDS: &[&str] = &["description"];

/// Fields that reference a class and get the ontology prefix when bare.
pub(crate) const CLASS_REFERENCE_FIELDS: &[&str] = &[
    "hasClass",
    "specializes",
    "eligibleProperty",
    "eligibleEndpoint",
    "eligibleSourceLink",
    "eligibleTargetLink",
    "composedProperty",
];

pub(crate) const INTEGER_FIELDS: &[&str] = &["minCount", "maxCount", "maxLength"];

pub(crate) const NUMBER_FIELDS: &[&str] = &["minInclusive", "maxInclusive"];

/// Fields that are arrays however many XML child elements carry them.
const ALWAYS_ARRAY: &[&str] = &[
    "eligibleProperty",
    "eligibleEndpoint",
    "composedProperty",
    "priorRevision",
    "hasProperty",
    "hasSourceLink",
    "hasTargetLink",
];

/// Whether `field` is array-valued on an item of kind `parent`.
///
/// `eligibleTargetLink` is a list on entity classes and a single reference on
/// relationship classes.
pub(crate) fn is_array_field(field: &str, parent: Option<ItemKind>) -> bool {
    if field == "eligibleTargetLink" {
        return parent == Some(ItemKind::EntityClass);
    }
    ALWAYS_ARRAY.contains(&field)
}

/// Standard namespaces written into every encoded document's context.
pub(crate) const STANDARD_NAMESPACES: &[(&str, &str)] = &[
    ("pig", "https://product-information-graph.org/v0.2/metamodel#"),
    ("dcterms", "http://purl.org/dc/terms/"),
    ("sh", "http://www.w3.org/ns/shacl#"),
    ("xs", "http://www.w3.org/2001/XMLSchema#"),
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
];

/// `prefix:local`, where `local` does not start with `/`.
static TERM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_.-]*:[A-Za-z0-9_][A-Za-z0-9_.#/-]*$")
        .expect("invalid term regex")
});

/// `scheme://authority...`
static URI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://[^\s]+$").expect("invalid URI regex")
});

/// A local name without prefix, e.g. `Pump`.
static BARE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.-]*$").expect("invalid name regex"));

/// Namespaced term or absolute URI.
pub fn is_identifier(s: &str) -> bool {
    TERM_RE.is_match(s) || URI_RE.is_match(s)
}

pub(crate) fn is_bare_name(s: &str) -> bool {
    BARE_NAME_RE.is_match(s)
}
