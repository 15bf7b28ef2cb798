//! Core data types of the Product Information Graph.
//!
//! This module defines the closed set of item kinds ([`ItemKind`]), the
//! attribute groups shared between them ([`Identifiable`], [`Element`],
//! [`AnElement`]), and one plain struct per kind. All structs serialise to and
//! from the *internal* representation: camelCase field names, bare identifier
//! strings, and multi-language text as an array of [`LanguageText`]. The wire
//! formats are produced from this shape by [`codec`](crate::codec).

use std::fmt;

use serde::{Deserialize, Serialize};

/// `maxCount` value that stands for "no upper bound" (`maxOccurs="unbounded"`).
pub const UNBOUNDED: u32 = u32::MAX;

/// The kind of a graph item.
///
/// Serialises as its namespaced wire tag (e.g. `"pig:Property"`). The kind of
/// an item is fixed when the item is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemKind {
    /// Defines a property: datatype and occurrence bounds.
    #[serde(rename = "pig:Property")]
    PropertyClass,
    /// Defines a link role and its eligible endpoints.
    #[serde(rename = "pig:Link")]
    LinkClass,
    /// Defines a node type.
    #[serde(rename = "pig:Entity")]
    EntityClass,
    /// Defines an edge type.
    #[serde(rename = "pig:Relationship")]
    RelationshipClass,
    /// A node of the graph.
    #[serde(rename = "pig:anEntity")]
    EntityInstance,
    /// An edge of the graph.
    #[serde(rename = "pig:aRelationship")]
    RelationshipInstance,
    /// A property value embedded in an individual.
    #[serde(rename = "pig:aProperty")]
    PropertyValue,
    /// A source link embedded in a relationship individual.
    #[serde(rename = "pig:aSourceLink")]
    SourceLinkValue,
    /// A target link embedded in an individual.
    #[serde(rename = "pig:aTargetLink")]
    TargetLinkValue,
    /// The top-level container.
    #[serde(rename = "pig:aPackage")]
    Package,
}

impl ItemKind {
    pub const ALL: [ItemKind; 10] = [
        ItemKind::PropertyClass,
        ItemKind::LinkClass,
        ItemKind::EntityClass,
        ItemKind::RelationshipClass,
        ItemKind::EntityInstance,
        ItemKind::RelationshipInstance,
        ItemKind::PropertyValue,
        ItemKind::SourceLinkValue,
        ItemKind::TargetLinkValue,
        ItemKind::Package,
    ];

    /// The namespaced wire tag, e.g. `"pig:Entity"`.
    pub fn tag(self) -> &'static str {
        match self {
            ItemKind::PropertyClass => "pig:Property",
            ItemKind::LinkClass => "pig:Link",
            ItemKind::EntityClass => "pig:Entity",
            ItemKind::RelationshipClass => "pig:Relationship",
            ItemKind::EntityInstance => "pig:anEntity",
            ItemKind::RelationshipInstance => "pig:aRelationship",
            ItemKind::PropertyValue => "pig:aProperty",
            ItemKind::SourceLinkValue => "pig:aSourceLink",
            ItemKind::TargetLinkValue => "pig:aTargetLink",
            ItemKind::Package => "pig:aPackage",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        ItemKind::ALL.into_iter().find(|k| k.tag() == tag)
    }

    /// File stem of the structural schema registered for this kind.
    pub fn schema_name(self) -> &'static str {
        match self {
            ItemKind::PropertyClass => "property-class",
            ItemKind::LinkClass => "link-class",
            ItemKind::EntityClass => "entity-class",
            ItemKind::RelationshipClass => "relationship-class",
            ItemKind::EntityInstance => "entity-instance",
            ItemKind::RelationshipInstance => "relationship-instance",
            ItemKind::PropertyValue => "property-value",
            ItemKind::SourceLinkValue => "source-link-value",
            ItemKind::TargetLinkValue => "target-link-value",
            ItemKind::Package => "package",
        }
    }

    pub fn is_class(self) -> bool {
        matches!(
            self,
            ItemKind::PropertyClass
                | ItemKind::LinkClass
                | ItemKind::EntityClass
                | ItemKind::RelationshipClass
        )
    }

    pub fn is_individual(self) -> bool {
        matches!(self, ItemKind::EntityInstance | ItemKind::RelationshipInstance)
    }

    pub fn is_fragment(self) -> bool {
        matches!(
            self,
            ItemKind::PropertyValue | ItemKind::SourceLinkValue | ItemKind::TargetLinkValue
        )
    }

    /// The class kind an individual or fragment of this kind must reference
    /// through `hasClass`. `None` for classes and the package.
    pub fn class_kind(self) -> Option<ItemKind> {
        match self {
            ItemKind::EntityInstance => Some(ItemKind::EntityClass),
            ItemKind::RelationshipInstance => Some(ItemKind::RelationshipClass),
            ItemKind::PropertyValue => Some(ItemKind::PropertyClass),
            ItemKind::SourceLinkValue | ItemKind::TargetLinkValue => Some(ItemKind::LinkClass),
            _ => None,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Parses an [`ItemKind`] from its wire tag.
impl std::str::FromStr for ItemKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemKind::from_tag(s).ok_or_else(|| {
            format!(
                "unknown item kind {:?}; expected one of: {}",
                s,
                ItemKind::ALL.map(ItemKind::tag).join(", ")
            )
        })
    }
}

/// The datatypes a [`PropertyClass`] may declare.
///
/// Anything outside the supported set is kept as [`Datatype::Other`] and
/// treated as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Datatype {
    String,
    Boolean,
    Integer,
    Double,
    Decimal,
    Float,
    DateTime,
    Date,
    AnyUri,
    Duration,
    Other(String),
}

impl Datatype {
    pub fn from_term(term: &str) -> Self {
        match term {
            "xs:string" => Datatype::String,
            "xs:boolean" => Datatype::Boolean,
            "xs:integer" => Datatype::Integer,
            "xs:double" => Datatype::Double,
            "xs:decimal" => Datatype::Decimal,
            "xs:float" => Datatype::Float,
            "xs:dateTime" => Datatype::DateTime,
            "xs:date" => Datatype::Date,
            "xs:anyURI" => Datatype::AnyUri,
            "xs:duration" => Datatype::Duration,
            other => Datatype::Other(other.to_string()),
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Datatype::Other(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Datatype::Integer | Datatype::Double | Datatype::Decimal | Datatype::Float
        )
    }
}

/// One entry of a multi-language text attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageText {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl LanguageText {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            lang: None,
        }
    }

    pub fn with_lang(value: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            lang: Some(lang.into()),
        }
    }
}

/// Pick the entry for `lang`, falling back to the untagged entry and then to
/// the first entry.
pub fn preferred_text<'a>(entries: &'a [LanguageText], lang: &str) -> Option<&'a str> {
    entries
        .iter()
        .find(|t| t.lang.as_deref() == Some(lang))
        .or_else(|| entries.iter().find(|t| t.lang.is_none()))
        .or_else(|| entries.first())
        .map(|t| t.value.as_str())
}

/// Attributes shared by every identified item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifiable {
    /// Namespaced term (`prefix:local`) or absolute URI. Immutable once set.
    pub id: String,

    /// Parent item of the same kind. Immutable once set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specializes: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub title: Vec<LanguageText>,

    /// Rich text; may carry XHTML markup, kept verbatim.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<LanguageText>,
}

impl Identifiable {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// Attributes shared by entity and relationship classes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// `None` = any property class allowed; `Some(vec![])` = none allowed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligible_property: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Attributes shared by individuals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prior_revision: Vec<String>,

    /// ISO 8601 date-time or date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub has_property: Vec<PropertyValue>,
}

/// `pig:Property`: the definition of a property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyClass {
    #[serde(flatten)]
    pub identifiable: Identifiable,

    /// Present only on root classes, where it equals `pig:Property`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_class: Option<String>,

    /// Datatype term, e.g. `xs:string`. Inherited along `specializes` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_count: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_inclusive: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_inclusive: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composed_property: Option<Vec<String>>,
}

impl PropertyClass {
    pub fn datatype(&self) -> Option<Datatype> {
        self.datatype.as_deref().map(Datatype::from_term)
    }
}

/// `pig:Link`: the definition of a link role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkClass {
    #[serde(flatten)]
    pub identifiable: Identifiable,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_class: Option<String>,

    /// Classes a link of this kind may point at. `None` = unconstrained.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligible_endpoint: Option<Vec<String>>,
}

/// `pig:Entity`: the definition of a node type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityClass {
    #[serde(flatten)]
    pub identifiable: Identifiable,

    #[serde(flatten)]
    pub element: Element,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_class: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligible_target_link: Option<Vec<String>>,
}

/// `pig:Relationship`: the definition of an edge type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipClass {
    #[serde(flatten)]
    pub identifiable: Identifiable,

    #[serde(flatten)]
    pub element: Element,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_class: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligible_source_link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligible_target_link: Option<String>,
}

/// `pig:anEntity`: a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityInstance {
    #[serde(flatten)]
    pub identifiable: Identifiable,

    #[serde(flatten)]
    pub an_element: AnElement,

    pub has_class: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub has_target_link: Vec<LinkValue>,
}

/// `pig:aRelationship`: an edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipInstance {
    #[serde(flatten)]
    pub identifiable: Identifiable,

    #[serde(flatten)]
    pub an_element: AnElement,

    pub has_class: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub has_source_link: Vec<LinkValue>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub has_target_link: Vec<LinkValue>,
}

/// `pig:aProperty`: a property value embedded in an individual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyValue {
    pub has_class: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

/// `pig:aSourceLink` / `pig:aTargetLink`: a link embedded in an individual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkValue {
    pub has_class: String,
    pub id_ref: String,
}

/// The validated payload of an item, one variant per graph kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemData {
    PropertyClass(PropertyClass),
    LinkClass(LinkClass),
    EntityClass(EntityClass),
    RelationshipClass(RelationshipClass),
    EntityInstance(EntityInstance),
    RelationshipInstance(RelationshipInstance),
    PropertyValue(PropertyValue),
    SourceLinkValue(LinkValue),
    TargetLinkValue(LinkValue),
}

impl ItemData {
    pub fn kind(&self) -> ItemKind {
        match self {
            ItemData::PropertyClass(_) => ItemKind::PropertyClass,
            ItemData::LinkClass(_) => ItemKind::LinkClass,
            ItemData::EntityClass(_) => ItemKind::EntityClass,
            ItemData::RelationshipClass(_) => ItemKind::RelationshipClass,
            ItemData::EntityInstance(_) => ItemKind::EntityInstance,
            ItemData::RelationshipInstance(_) => ItemKind::RelationshipInstance,
            ItemData::PropertyValue(_) => ItemKind::PropertyValue,
            ItemData::SourceLinkValue(_) => ItemKind::SourceLinkValue,
            ItemData::TargetLinkValue(_) => ItemKind::TargetLinkValue,
        }
    }

    /// Deserialise the internal representation into the variant for `kind`.
    pub fn from_value(kind: ItemKind, value: serde_json::Value) -> serde_json::Result<Self> {
        use serde_json::from_value;
        Ok(match kind {
            ItemKind::PropertyClass => ItemData::PropertyClass(from_value(value)?),
            ItemKind::LinkClass => ItemData::LinkClass(from_value(value)?),
            ItemKind::EntityClass => ItemData::EntityClass(from_value(value)?),
            ItemKind::RelationshipClass => ItemData::RelationshipClass(from_value(value)?),
            ItemKind::EntityInstance => ItemData::EntityInstance(from_value(value)?),
            ItemKind::RelationshipInstance => ItemData::RelationshipInstance(from_value(value)?),
            ItemKind::PropertyValue => ItemData::PropertyValue(from_value(value)?),
            ItemKind::SourceLinkValue => ItemData::SourceLinkValue(from_value(value)?),
            ItemKind::TargetLinkValue => ItemData::TargetLinkValue(from_value(value)?),
            ItemKind::Package => {
                return Err(serde::de::Error::custom(
                    "a package header is not a graph item",
                ))
            }
        })
    }

    /// Serialise into the internal representation, including `itemType`.
    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        let mut value = match self {
            ItemData::PropertyClass(d) => serde_json::to_value(d)?,
            ItemData::LinkClass(d) => serde_json::to_value(d)?,
            ItemData::EntityClass(d) => serde_json::to_value(d)?,
            ItemData::RelationshipClass(d) => serde_json::to_value(d)?,
            ItemData::EntityInstance(d) => serde_json::to_value(d)?,
            ItemData::RelationshipInstance(d) => serde_json::to_value(d)?,
            ItemData::PropertyValue(d) => serde_json::to_value(d)?,
            ItemData::SourceLinkValue(d) | ItemData::TargetLinkValue(d) => {
                serde_json::to_value(d)?
            }
        };
        if let Some(map) = value.as_object_mut() {
            map.insert("itemType".into(), self.kind().tag().into());
        }
        Ok(value)
    }

    pub fn identifiable(&self) -> Option<&Identifiable> {
        match self {
            ItemData::PropertyClass(d) => Some(&d.identifiable),
            ItemData::LinkClass(d) => Some(&d.identifiable),
            ItemData::EntityClass(d) => Some(&d.identifiable),
            ItemData::RelationshipClass(d) => Some(&d.identifiable),
            ItemData::EntityInstance(d) => Some(&d.identifiable),
            ItemData::RelationshipInstance(d) => Some(&d.identifiable),
            ItemData::PropertyValue(_)
            | ItemData::SourceLinkValue(_)
            | ItemData::TargetLinkValue(_) => None,
        }
    }

    pub fn has_class(&self) -> Option<&str> {
        match self {
            ItemData::PropertyClass(d) => d.has_class.as_deref(),
            ItemData::LinkClass(d) => d.has_class.as_deref(),
            ItemData::EntityClass(d) => d.has_class.as_deref(),
            ItemData::RelationshipClass(d) => d.has_class.as_deref(),
            ItemData::EntityInstance(d) => Some(&d.has_class),
            ItemData::RelationshipInstance(d) => Some(&d.has_class),
            ItemData::PropertyValue(d) => Some(&d.has_class),
            ItemData::SourceLinkValue(d) | ItemData::TargetLinkValue(d) => Some(&d.has_class),
        }
    }

    pub fn element(&self) -> Option<&Element> {
        match self {
            ItemData::EntityClass(d) => Some(&d.element),
            ItemData::RelationshipClass(d) => Some(&d.element),
            _ => None,
        }
    }

    pub fn an_element(&self) -> Option<&AnElement> {
        match self {
            ItemData::EntityInstance(d) => Some(&d.an_element),
            ItemData::RelationshipInstance(d) => Some(&d.an_element),
            _ => None,
        }
    }

    /// Embedded property values; empty for anything but individuals.
    pub fn properties(&self) -> &[PropertyValue] {
        self.an_element()
            .map(|e| e.has_property.as_slice())
            .unwrap_or_default()
    }

    pub fn source_links(&self) -> &[LinkValue] {
        match self {
            ItemData::RelationshipInstance(d) => &d.has_source_link,
            _ => &[],
        }
    }

    pub fn target_links(&self) -> &[LinkValue] {
        match self {
            ItemData::EntityInstance(d) => &d.has_target_link,
            ItemData::RelationshipInstance(d) => &d.has_target_link,
            _ => &[],
        }
    }
}

/// Metadata header of a package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub title: Vec<LanguageText>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<LanguageText>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_tags_roundtrip() {
        for kind in ItemKind::ALL {
            assert_eq!(ItemKind::from_tag(kind.tag()), Some(kind));
            assert_eq!(kind.tag().parse::<ItemKind>(), Ok(kind));
            assert_eq!(serde_json::to_value(kind).unwrap(), json!(kind.tag()));
        }
        assert!("pig:Nothing".parse::<ItemKind>().is_err());
    }

    #[test]
    fn kind_groups_are_disjoint() {
        for kind in ItemKind::ALL {
            let groups = [kind.is_class(), kind.is_individual(), kind.is_fragment()];
            let count = groups.iter().filter(|g| **g).count();
            if kind == ItemKind::Package {
                assert_eq!(count, 0);
            } else {
                assert_eq!(count, 1, "{kind}");
            }
        }
    }

    #[test]
    fn class_kind_for_individuals_and_fragments() {
        assert_eq!(ItemKind::EntityInstance.class_kind(), Some(ItemKind::EntityClass));
        assert_eq!(ItemKind::TargetLinkValue.class_kind(), Some(ItemKind::LinkClass));
        assert_eq!(ItemKind::PropertyValue.class_kind(), Some(ItemKind::PropertyClass));
        assert_eq!(ItemKind::EntityClass.class_kind(), None);
    }

    #[test]
    fn datatype_terms() {
        assert_eq!(Datatype::from_term("xs:string"), Datatype::String);
        assert!(Datatype::from_term("xs:double").is_numeric());
        let other = Datatype::from_term("xs:hexBinary");
        assert!(!other.is_supported());
    }

    #[test]
    fn entity_instance_from_internal_value() {
        let value = json!({
            "itemType": "pig:anEntity",
            "id": "d:pump-1",
            "hasClass": "o:Pump",
            "title": [{ "value": "Pump 1" }],
            "modified": "2025-03-01T10:00:00Z",
            "hasProperty": [{ "hasClass": "o:Weight", "value": "100.5" }],
            "hasTargetLink": [{ "hasClass": "o:partOf", "idRef": "d:plant" }]
        });
        let data = ItemData::from_value(ItemKind::EntityInstance, value.clone()).unwrap();
        assert_eq!(data.has_class(), Some("o:Pump"));
        assert_eq!(data.properties().len(), 1);
        assert_eq!(data.target_links()[0].id_ref, "d:plant");
        assert_eq!(data.to_value().unwrap(), value);
    }

    #[test]
    fn preferred_text_falls_back() {
        let entries = vec![
            LanguageText::with_lang("Gewicht", "de"),
            LanguageText::with_lang("Weight", "en"),
        ];
        assert_eq!(preferred_text(&entries, "en"), Some("Weight"));
        assert_eq!(preferred_text(&entries, "fr"), Some("Gewicht"));
        assert_eq!(preferred_text(&[], "en"), None);
    }
}
