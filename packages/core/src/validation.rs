use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::status::StatusCode;
use crate::types::{
    Datatype, ItemData, ItemKind, LanguageText, LinkClass, PropertyClass, RelationshipInstance,
};

/// Errors returned when a single item fails validation.
///
/// These are data errors: the item stays inert but nothing else is affected.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ItemError {
    #[error("item kind could not be determined (itemType {0:?})")]
    UnknownKind(Option<String>),

    #[error("{kind} does not conform to its schema: {diagnostics}")]
    Schema { kind: ItemKind, diagnostics: String },

    #[error("{kind} could not be read: {reason}")]
    Malformed { kind: ItemKind, reason: String },

    #[error("{field} is immutable once set: {was:?} cannot become {now:?}")]
    Immutable {
        field: &'static str,
        was: String,
        now: Option<String>,
    },

    #[error("{field}[{index}]: {reason}")]
    Text {
        field: &'static str,
        index: usize,
        reason: String,
    },

    #[error("class {id:?} must carry exactly one of hasClass or specializes")]
    ClassOrigin { id: String },

    #[error("root class {id:?} must have hasClass {expected:?}, got {found:?}")]
    RootClass {
        id: String,
        expected: &'static str,
        found: String,
    },

    #[error("{kind} {id:?} must not specialize another item")]
    SpecializesNotAllowed { kind: ItemKind, id: String },

    #[error("{id:?}: minCount {min} exceeds maxCount {max}")]
    CountRange { id: String, min: u32, max: u32 },

    #[error("{id:?}: minInclusive {min} exceeds maxInclusive {max}")]
    InclusiveRange { id: String, min: f64, max: f64 },

    #[error("{id:?}: pattern {pattern:?} is not a valid regular expression")]
    InvalidPattern { id: String, pattern: String },

    #[error("{id:?}: facet {facet} does not apply to datatype {datatype}")]
    FacetMismatch {
        id: String,
        facet: &'static str,
        datatype: String,
    },

    #[error("{id:?}: {field} lists {entry:?} more than once")]
    DuplicateEntry {
        id: String,
        field: &'static str,
        entry: String,
    },

    #[error("{id:?}: modified must be an ISO 8601 date-time or date, got {value:?}")]
    InvalidTimestamp { id: String, value: String },

    #[error("{id:?}: priorRevision must not contain the current revision {revision:?}")]
    PriorRevision { id: String, revision: String },

    #[error("relationship {id:?} needs at least one {role} link")]
    MissingLink { id: String, role: &'static str },
}

impl ItemError {
    pub fn status(&self) -> StatusCode {
        match self {
            ItemError::UnknownKind(_) => StatusCode::UnknownItemKind,
            ItemError::Schema { .. } => StatusCode::SchemaViolation,
            ItemError::Malformed { .. } => StatusCode::MalformedItem,
            ItemError::Immutable { .. } => StatusCode::ImmutableField,
            ItemError::Text { .. } => StatusCode::InvalidText,
            _ => StatusCode::SemanticViolation,
        }
    }
}

/// Check the shape of a multi-language text attribute.
///
/// Zero entries is valid. A single entry may omit `lang`. With two or more
/// entries every one of them needs a non-empty `lang`.
pub fn validate_text(field: &'static str, entries: &[LanguageText]) -> Result<(), ItemError> {
    let text_error = |index: usize, reason: String| ItemError::Text {
        field,
        index,
        reason,
    };
    for (i, entry) in entries.iter().enumerate() {
        match entry.lang.as_deref() {
            None if entries.len() > 1 => {
                return Err(text_error(
                    i,
                    format!(
                        "entry has no language tag; all {} entries need one",
                        entries.len()
                    ),
                ))
            }
            None => {}
            Some("") => return Err(text_error(i, "language tag must not be empty".into())),
            Some(lang) if !LANGUAGE_RE.is_match(lang) => {
                return Err(text_error(i, format!("{lang:?} is not a language tag")))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Kind-specific semantic checks. Reference existence is not checked here;
/// that needs the whole graph and belongs to [`checker`](crate::checker).
pub fn validate_data(data: &ItemData) -> Result<(), ItemError> {
    if let Some(identifiable) = data.identifiable() {
        validate_text("title", &identifiable.title)?;
        validate_text("description", &identifiable.description)?;
    }

    let kind = data.kind();
    if kind.is_class() {
        validate_class_origin(data)?;
    }

    match data {
        ItemData::PropertyClass(p) => validate_property_class(p),
        ItemData::LinkClass(l) => validate_link_class(l),
        ItemData::EntityClass(e) => {
            let id = &e.identifiable.id;
            no_duplicates(id, "eligibleProperty", e.element.eligible_property.as_deref())?;
            no_duplicates(id, "eligibleTargetLink", e.eligible_target_link.as_deref())
        }
        ItemData::RelationshipClass(r) => no_duplicates(
            &r.identifiable.id,
            "eligibleProperty",
            r.element.eligible_property.as_deref(),
        ),
        ItemData::EntityInstance(_) => validate_individual(data),
        ItemData::RelationshipInstance(r) => {
            validate_individual(data)?;
            validate_relationship_links(r)
        }
        ItemData::PropertyValue(_) | ItemData::SourceLinkValue(_) | ItemData::TargetLinkValue(_) => {
            Ok(())
        }
    }
}

// --- helpers -----------------------------------------------------------------

fn validate_class_origin(data: &ItemData) -> Result<(), ItemError> {
    let Some(identifiable) = data.identifiable() else {
        return Ok(());
    };
    let id = identifiable.id.clone();
    match (data.has_class(), identifiable.specializes.as_deref()) {
        (Some(_), Some(_)) | (None, None) => Err(ItemError::ClassOrigin { id }),
        (Some(root), None) if root != data.kind().tag() => Err(ItemError::RootClass {
            id,
            expected: data.kind().tag(),
            found: root.to_string(),
        }),
        _ => Ok(()),
    }
}

fn validate_property_class(p: &PropertyClass) -> Result<(), ItemError> {
    let id = &p.identifiable.id;

    let datatype = p.datatype();
    if let Some(Datatype::Other(term)) = &datatype {
        tracing::warn!(property = %id, datatype = %term, "unsupported datatype, treating values as opaque strings");
    }

    if let (Some(min), Some(max)) = (p.min_count, p.max_count) {
        if min > max {
            return Err(ItemError::CountRange { id: id.clone(), min, max });
        }
    }
    if let (Some(min), Some(max)) = (p.min_inclusive, p.max_inclusive) {
        if min > max {
            return Err(ItemError::InclusiveRange { id: id.clone(), min, max });
        }
    }
    if let Some(pattern) = &p.pattern {
        if Regex::new(pattern).is_err() {
            return Err(ItemError::InvalidPattern {
                id: id.clone(),
                pattern: pattern.clone(),
            });
        }
    }

    // Facets are only checked against an explicitly declared datatype; an
    // inherited one is resolved by the consistency checker.
    if let Some(datatype) = &datatype {
        let term = p.datatype.clone().unwrap_or_default();
        let string_like = matches!(datatype, Datatype::String | Datatype::Other(_));
        let mismatch = |facet| ItemError::FacetMismatch {
            id: id.clone(),
            facet,
            datatype: term.clone(),
        };
        if !string_like && p.max_length.is_some() {
            return Err(mismatch("maxLength"));
        }
        if !string_like && p.pattern.is_some() {
            return Err(mismatch("pattern"));
        }
        if !datatype.is_numeric() && p.min_inclusive.is_some() {
            return Err(mismatch("minInclusive"));
        }
        if !datatype.is_numeric() && p.max_inclusive.is_some() {
            return Err(mismatch("maxInclusive"));
        }
    }

    no_duplicates(id, "composedProperty", p.composed_property.as_deref())
}

fn validate_link_class(l: &LinkClass) -> Result<(), ItemError> {
    no_duplicates(&l.identifiable.id, "eligibleEndpoint", l.eligible_endpoint.as_deref())
}

fn validate_individual(data: &ItemData) -> Result<(), ItemError> {
    let (Some(identifiable), Some(an_element)) = (data.identifiable(), data.an_element()) else {
        return Ok(());
    };
    let id = &identifiable.id;

    if identifiable.specializes.is_some() {
        return Err(ItemError::SpecializesNotAllowed {
            kind: data.kind(),
            id: id.clone(),
        });
    }

    if let Some(modified) = &an_element.modified {
        if !is_timestamp(modified) {
            return Err(ItemError::InvalidTimestamp {
                id: id.clone(),
                value: modified.clone(),
            });
        }
    }

    if let Some(revision) = &an_element.revision {
        if an_element.prior_revision.contains(revision) {
            return Err(ItemError::PriorRevision {
                id: id.clone(),
                revision: revision.clone(),
            });
        }
    }

    Ok(())
}

fn validate_relationship_links(r: &RelationshipInstance) -> Result<(), ItemError> {
    let id = &r.identifiable.id;
    if r.has_source_link.is_empty() {
        return Err(ItemError::MissingLink { id: id.clone(), role: "source" });
    }
    if r.has_target_link.is_empty() {
        return Err(ItemError::MissingLink { id: id.clone(), role: "target" });
    }
    Ok(())
}

fn no_duplicates(id: &str, field: &'static str, list: Option<&[String]>) -> Result<(), ItemError> {
    let mut seen = HashSet::new();
    for entry in list.unwrap_or_default() {
        if !seen.insert(entry.as_str()) {
            return Err(ItemError::DuplicateEntry {
                id: id.to_string(),
                field,
                entry: entry.clone(),
            });
        }
    }
    Ok(())
}

/// RFC 3339 date-time, a zone-less `YYYY-MM-DDThh:mm:ss`, or a plain date.
pub(crate) fn is_timestamp(s: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(s).is_ok()
        || chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Simplified BCP 47: `en`, `de-CH`, `zh-Hant-TW`.
static LANGUAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z]{1,8}(-[A-Za-z0-9]{1,8})*$").expect("invalid language regex")
});

// --- tests -------------------------------------------------------------------
