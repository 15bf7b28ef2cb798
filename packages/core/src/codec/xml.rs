//! XML documents.
//!
//! ```xml
//! <pig:aPackage xmlns:pig="…" xmlns:o="…" id="d:package-1">
//!   <dcterms:title xml:lang="en">Pumps</dcterms:title>
//!   <pig:graph>
//!     <pig:Property id="o:Weight" hasClass="pig:Property">
//!       <xs:simpleType>
//!         <xs:restriction base="xs:double" minOccurs="0" maxOccurs="1"/>
//!       </xs:simpleType>
//!     </pig:Property>
//!     <pig:anEntity id="d:pump-1" hasClass="o:Pump">
//!       <pig:aProperty hasClass="o:Weight">100.5</pig:aProperty>
//!     </pig:anEntity>
//!   </pig:graph>
//! </pig:aPackage>
//! ```
//!
//! Decoding first builds an [`XmlElement`] tree, then maps each item element
//! onto the internal shape; whether a field is a list is decided by the
//! always-array table, not by how many child elements happen to be present.

use std::collections::BTreeMap;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::{Map, Value};

use super::normalize::{normalize_item, scalar_text};
use super::vocabulary::{
    self, is_array_field, Vocabulary, XmlForm, CLASS_REFERENCE_FIELDS, RICH_TEXT_FIELDS,
    TERMS, TEXT_FIELDS,
};
use super::{merged_context, CodecError, CodecOptions, RawItem, RawPackage};
use crate::types::{ItemKind, UNBOUNDED};

const ROOT: &str = "pig:aPackage";
const GRAPH: &str = "pig:graph";
const SIMPLE_TYPE: &str = "xs:simpleType";
const RESTRICTION: &str = "xs:restriction";

/// Restriction facet element ↔ internal field.
const FACETS: &[(&str, &str)] = &[
    ("xs:maxLength", "maxLength"),
    ("xs:pattern", "pattern"),
    ("xs:minInclusive", "minInclusive"),
    ("xs:maxInclusive", "maxInclusive"),
];

/// Fragment element ↔ list field on the embedding individual.
const FRAGMENTS: &[(&str, &str)] = &[
    ("pig:aProperty", "hasProperty"),
    ("pig:aSourceLink", "hasSourceLink"),
    ("pig:aTargetLink", "hasTargetLink"),
];

/// A parsed element: qualified name, attributes in document order, child
/// elements, and concatenated text. Rich-text elements keep their raw inner
/// markup in `text` and have no children.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    pub text: String,
}

impl XmlElement {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, CodecError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            ..Self::default()
        })
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.children.is_empty() && self.text.is_empty()
    }
}

fn is_rich_text(name: &str) -> bool {
    vocabulary::to_internal(Vocabulary::Xml, name).is_some_and(|f| RICH_TEXT_FIELDS.contains(&f))
}

/// True if `text` is a well-formed XML fragment: balanced elements and
/// only declared entity references.
pub(crate) fn is_markup(text: &str) -> bool {
    let wrapped = format!("<r>{text}</r>");
    let mut reader = Reader::from_str(&wrapped);
    let mut depth = 0usize;
    loop {
        match reader.read_event() {
            Err(_) => return false,
            Ok(Event::Start(start)) => {
                if !attributes_are_valid(&start) {
                    return false;
                }
                depth += 1;
            }
            Ok(Event::Empty(start)) => {
                if !attributes_are_valid(&start) {
                    return false;
                }
            }
            Ok(Event::End(_)) => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            Ok(Event::Text(t)) => {
                if t.unescape().is_err() {
                    return false;
                }
            }
            Ok(Event::Eof) => return depth == 0,
            Ok(_) => {}
        }
    }
}

fn attributes_are_valid(start: &BytesStart<'_>) -> bool {
    start
        .attributes()
        .all(|attr| attr.is_ok_and(|attr| attr.unescape_value().is_ok()))
}

/// Rich text as stored: `text` itself if it is already markup, otherwise
/// `text` with `&`, `<` and `>` escaped.
pub(crate) fn as_markup(text: &str) -> String {
    if is_markup(text) {
        text.to_string()
    } else {
        quick_xml::escape::partial_escape(text).into_owned()
    }
}

/// Parse a document into its root element.
pub(crate) fn parse(document: &str) -> Result<XmlElement, CodecError> {
    let mut reader = Reader::from_str(document);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, el: XmlElement) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(el),
            None => *root = Some(el),
        }
    }

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let mut el = XmlElement::from_start(&start)?;
                if is_rich_text(&el.name) {
                    let end = start.to_end().into_owned();
                    el.text = reader.read_text(end.name())?.into_owned();
                    attach(&mut stack, &mut root, el);
                } else {
                    stack.push(el);
                }
            }
            Event::Empty(start) => {
                let el = XmlElement::from_start(&start)?;
                attach(&mut stack, &mut root, el);
            }
            Event::End(_) => {
                let Some(mut el) = stack.pop() else {
                    return Err(CodecError::Structure("unbalanced end tag".into()));
                };
                // Leaf text is kept verbatim. Whitespace-only text is indentation.
                if !el.children.is_empty() || el.text.trim().is_empty() {
                    el.text.clear();
                }
                attach(&mut stack, &mut root, el);
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_) => {}
        }
    }

    if !stack.is_empty() {
        return Err(CodecError::Structure("document ends inside an element".into()));
    }
    root.ok_or_else(|| CodecError::Structure("document has no root element".into()))
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

pub(crate) fn decode(document: &str, options: &CodecOptions) -> Result<RawPackage, CodecError> {
    let root = parse(document)?;
    if root.name != ROOT {
        return Err(CodecError::Structure(format!(
            "root element must be {ROOT}, found {}",
            root.name
        )));
    }

    let mut context = BTreeMap::new();
    let mut header = Map::new();
    for (key, value) in &root.attributes {
        match key.strip_prefix("xmlns:") {
            Some(prefix) => {
                context.insert(prefix.to_string(), value.clone());
            }
            None if key == "xmlns" => {}
            None => {
                header.insert(internal_name(key), Value::String(value.clone()));
            }
        }
    }

    let mut items = Vec::new();
    for child in root.children {
        if child.name == GRAPH {
            items.extend(child.children.iter().map(|el| decode_item(el, options)));
        } else {
            add_child_field(&mut header, &child, Some(ItemKind::Package));
        }
    }
    let header = normalize_item(header, Some(ItemKind::Package), options);

    Ok(RawPackage {
        context,
        header,
        items,
    })
}

fn internal_name(xml: &str) -> String {
    vocabulary::to_internal(Vocabulary::Xml, xml)
        .map(str::to_string)
        .unwrap_or_else(|| xml.to_string())
}

fn decode_item(el: &XmlElement, options: &CodecOptions) -> RawItem {
    let kind = ItemKind::from_tag(&el.name);
    let mut map = Map::new();
    map.insert("itemType".into(), Value::String(el.name.clone()));
    read_attributes(el, &mut map);
    if kind == Some(ItemKind::PropertyValue) {
        map.insert("value".into(), Value::String(el.text.clone()));
    }

    for child in &el.children {
        if child.name == SIMPLE_TYPE {
            read_restriction(child, &mut map);
        } else if let Some((_, field)) = FRAGMENTS.iter().find(|(name, _)| *name == child.name) {
            let fragment = fragment_value(child);
            match map
                .entry(field.to_string())
                .or_insert_with(|| Value::Array(Vec::new()))
            {
                Value::Array(list) => list.push(fragment),
                other => *other = Value::Array(vec![other.take(), fragment]),
            }
        } else {
            add_child_field(&mut map, child, kind);
        }
    }

    RawItem::new(Value::Object(normalize_item(map, kind, options)))
}

fn read_attributes(el: &XmlElement, map: &mut Map<String, Value>) {
    for (key, value) in &el.attributes {
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        map.insert(internal_name(key), Value::String(value.clone()));
    }
}

fn fragment_value(el: &XmlElement) -> Value {
    let mut map = Map::new();
    read_attributes(el, &mut map);
    if el.name == ItemKind::PropertyValue.tag() {
        map.insert("value".into(), Value::String(el.text.clone()));
    }
    Value::Object(map)
}

fn add_child_field(map: &mut Map<String, Value>, child: &XmlElement, parent: Option<ItemKind>) {
    let field = internal_name(&child.name);
    let is_text = TEXT_FIELDS.contains(&field.as_str());

    let value = if is_text {
        let mut entry = Map::new();
        entry.insert("value".into(), Value::String(child.text.clone()));
        if let Some(lang) = child.attr("xml:lang") {
            entry.insert("lang".into(), Value::String(lang.to_string()));
        }
        Value::Object(entry)
    } else if let Some(id) = child.attr("id") {
        Value::String(id.to_string())
    } else if child.is_empty() {
        // `<pig:eligibleProperty/>` marks a present but empty list.
        Value::Null
    } else {
        Value::String(child.text.clone())
    };

    if is_text || is_array_field(&field, parent) {
        let slot = map
            .entry(field)
            .or_insert_with(|| Value::Array(Vec::new()));
        if let (Value::Array(list), false) = (slot, value.is_null()) {
            list.push(value);
        }
        return;
    }
    if value.is_null() {
        return;
    }
    match map.get_mut(&field) {
        Some(Value::Array(list)) => list.push(value),
        Some(existing) => *existing = Value::Array(vec![existing.take(), value]),
        None => {
            map.insert(field, value);
        }
    }
}

fn read_restriction(simple_type: &XmlElement, map: &mut Map<String, Value>) {
    read_occurs(simple_type, map);
    for restriction in &simple_type.children {
        if restriction.name != RESTRICTION {
            tracing::warn!(element = %restriction.name, "dropping unknown simpleType child");
            continue;
        }
        if let Some(base) = restriction.attr("base") {
            map.insert("datatype".into(), Value::String(base.to_string()));
        }
        read_occurs(restriction, map);
        for facet in &restriction.children {
            match FACETS.iter().find(|(name, _)| *name == facet.name) {
                Some((_, field)) => {
                    let value = facet.attr("value").unwrap_or(&facet.text);
                    map.insert(field.to_string(), Value::String(value.to_string()));
                }
                None => tracing::warn!(facet = %facet.name, "dropping unknown restriction facet"),
            }
        }
    }
}

fn read_occurs(el: &XmlElement, map: &mut Map<String, Value>) {
    if let Some(min) = el.attr("minOccurs") {
        map.insert("minCount".into(), Value::String(min.to_string()));
    }
    if let Some(max) = el.attr("maxOccurs") {
        map.insert("maxCount".into(), Value::String(max.to_string()));
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

type XmlWriter = Writer<Vec<u8>>;

pub(crate) fn encode(package: &RawPackage) -> Result<String, CodecError> {
    let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new(ROOT);
    for (prefix, iri) in merged_context(&package.context) {
        root.push_attribute((format!("xmlns:{prefix}").as_str(), iri.as_str()));
    }
    push_attributes(&mut root, &package.header);
    w.write_event(Event::Start(root))?;

    write_children(&mut w, &package.header)?;
    w.write_event(Event::Start(BytesStart::new(GRAPH)))?;
    for item in &package.items {
        write_item(&mut w, &item.value)?;
    }
    w.write_event(Event::End(BytesEnd::new(GRAPH)))?;
    w.write_event(Event::End(BytesEnd::new(ROOT)))?;

    into_string(w)
}

pub(crate) fn encode_item(item: &Value) -> Result<String, CodecError> {
    let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);
    write_item(&mut w, item)?;
    into_string(w)
}

fn into_string(w: XmlWriter) -> Result<String, CodecError> {
    String::from_utf8(w.into_inner()).map_err(|e| CodecError::Structure(e.to_string()))
}

fn write_item(w: &mut XmlWriter, item: &Value) -> Result<(), CodecError> {
    let Value::Object(map) = item else {
        return Err(CodecError::Structure("an item must be an object".into()));
    };
    let Some(tag) = map.get("itemType").and_then(Value::as_str) else {
        return Err(CodecError::Structure("an item must declare its itemType".into()));
    };

    let mut start = BytesStart::new(tag);
    push_attributes(&mut start, map);

    let has_body = map.keys().any(|k| {
        matches!(
            vocabulary::xml_form(k),
            Some(XmlForm::Child(_)) | Some(XmlForm::Structural)
        ) && k != "itemType"
    });
    if !has_body {
        w.write_event(Event::Empty(start))?;
        return Ok(());
    }

    w.write_event(Event::Start(start))?;
    if tag == ItemKind::PropertyValue.tag() {
        if let Some(value) = map.get("value").and_then(scalar_text) {
            w.write_event(Event::Text(BytesText::new(&value)))?;
        }
    }
    write_children(w, map)?;
    write_restriction(w, map)?;
    write_fragments(w, map)?;
    w.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn push_attributes(start: &mut BytesStart<'_>, map: &Map<String, Value>) {
    for term in TERMS {
        if let XmlForm::Attribute(name) = term.xml {
            if let Some(value) = map.get(term.internal).and_then(scalar_text) {
                start.push_attribute((name, value.as_str()));
            }
        }
    }
}

fn write_children(w: &mut XmlWriter, map: &Map<String, Value>) -> Result<(), CodecError> {
    for term in TERMS {
        let XmlForm::Child(name) = term.xml else {
            continue;
        };
        let Some(value) = map.get(term.internal) else {
            continue;
        };
        if TEXT_FIELDS.contains(&term.internal) {
            write_text_entries(w, name, term.internal, value)?;
            continue;
        }
        match value {
            Value::Array(items) if items.is_empty() => {
                w.write_event(Event::Empty(BytesStart::new(name)))?;
            }
            Value::Array(items) => {
                for item in items {
                    write_field(w, name, term.internal, item)?;
                }
            }
            single => write_field(w, name, term.internal, single)?,
        }
    }
    Ok(())
}

fn write_text_entries(
    w: &mut XmlWriter,
    name: &str,
    field: &str,
    value: &Value,
) -> Result<(), CodecError> {
    let Value::Array(entries) = value else {
        return Ok(());
    };
    for entry in entries {
        let mut start = BytesStart::new(name);
        if let Some(lang) = entry.get("lang").and_then(Value::as_str) {
            start.push_attribute(("xml:lang", lang));
        }
        let text = entry.get("value").and_then(scalar_text).unwrap_or_default();
        w.write_event(Event::Start(start))?;
        let body = if RICH_TEXT_FIELDS.contains(&field) && is_markup(&text) {
            BytesText::from_escaped(text.as_str())
        } else {
            BytesText::new(&text)
        };
        w.write_event(Event::Text(body))?;
        w.write_event(Event::End(BytesEnd::new(name)))?;
    }
    Ok(())
}

fn write_field(w: &mut XmlWriter, name: &str, field: &str, value: &Value) -> Result<(), CodecError> {
    let Some(text) = scalar_text(value) else {
        return Ok(());
    };
    if CLASS_REFERENCE_FIELDS.contains(&field) {
        let mut start = BytesStart::new(name);
        start.push_attribute(("id", text.as_str()));
        w.write_event(Event::Empty(start))?;
    } else {
        w.write_event(Event::Start(BytesStart::new(name)))?;
        w.write_event(Event::Text(BytesText::new(&text)))?;
        w.write_event(Event::End(BytesEnd::new(name)))?;
    }
    Ok(())
}

fn write_restriction(w: &mut XmlWriter, map: &Map<String, Value>) -> Result<(), CodecError> {
    let has_facets = FACETS.iter().any(|(_, field)| map.contains_key(*field));
    let has_restriction =
        has_facets || ["datatype", "minCount", "maxCount"].iter().any(|f| map.contains_key(*f));
    if !has_restriction {
        return Ok(());
    }

    let mut restriction = BytesStart::new(RESTRICTION);
    if let Some(base) = map.get("datatype").and_then(scalar_text) {
        restriction.push_attribute(("base", base.as_str()));
    }
    if let Some(min) = map.get("minCount").and_then(scalar_text) {
        restriction.push_attribute(("minOccurs", min.as_str()));
    }
    if let Some(max) = map.get("maxCount") {
        let max = match max.as_u64() {
            Some(n) if n == u64::from(UNBOUNDED) => "unbounded".to_string(),
            _ => scalar_text(max).unwrap_or_default(),
        };
        restriction.push_attribute(("maxOccurs", max.as_str()));
    }

    w.write_event(Event::Start(BytesStart::new(SIMPLE_TYPE)))?;
    if has_facets {
        w.write_event(Event::Start(restriction))?;
        for (name, field) in FACETS {
            if let Some(value) = map.get(*field).and_then(scalar_text) {
                let mut facet = BytesStart::new(*name);
                facet.push_attribute(("value", value.as_str()));
                w.write_event(Event::Empty(facet))?;
            }
        }
        w.write_event(Event::End(BytesEnd::new(RESTRICTION)))?;
    } else {
        w.write_event(Event::Empty(restriction))?;
    }
    w.write_event(Event::End(BytesEnd::new(SIMPLE_TYPE)))?;
    Ok(())
}

fn write_fragments(w: &mut XmlWriter, map: &Map<String, Value>) -> Result<(), CodecError> {
    for (name, field) in FRAGMENTS {
        let Some(Value::Array(fragments)) = map.get(*field) else {
            continue;
        };
        for fragment in fragments {
            let Value::Object(fragment) = fragment else {
                continue;
            };
            let mut start = BytesStart::new(*name);
            push_attributes(&mut start, fragment);
            match fragment.get("value").and_then(scalar_text) {
                Some(value) if *field == "hasProperty" => {
                    w.write_event(Event::Start(start))?;
                    w.write_event(Event::Text(BytesText::new(&value)))?;
                    w.write_event(Event::End(BytesEnd::new(*name)))?;
                }
                _ => w.write_event(Event::Empty(start))?,
            }
        }
    }
    Ok(())
}

// --- tests ---

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<pig:aPackage xmlns:pig="https://product-information-graph.org/v0.2/metamodel#"
              xmlns:o="https://example.org/ontology#" id="d:package-1">
  <dcterms:title xml:lang="en">Pumps</dcterms:title>
  <pig:graph>
    <pig:Property id="o:Weight" hasClass="pig:Property">
      <dcterms:title xml:lang="en">Weight</dcterms:title>
      <dcterms:title xml:lang="de">Gewicht</dcterms:title>
      <xs:simpleType>
        <xs:restriction base="xs:double" minOccurs="0" maxOccurs="unbounded">
          <xs:minInclusive value="0"/>
          <xs:whiteSpace value="collapse"/>
        </xs:restriction>
      </xs:simpleType>
    </pig:Property>
    <pig:Entity id="o:Pump" hasClass="pig:Entity">
      <dcterms:description><p>A <b>pump</b> &amp; motor.</p></dcterms:description>
      <pig:eligibleProperty id="o:Weight"/>
      <pig:eligibleTargetLink id="o:partOf"/>
    </pig:Entity>
    <pig:Relationship id="o:Feeds" hasClass="pig:Relationship">
      <pig:eligibleSourceLink id="o:from"/>
      <pig:eligibleTargetLink id="o:to"/>
    </pig:Relationship>
    <pig:anEntity id="pump-1" hasClass="o:Pump">
      <dcterms:modified>2025-03-01T10:00:00+00:00</dcterms:modified>
      <pig:aProperty hasClass="o:Weight">100.5</pig:aProperty>
      <pig:aTargetLink hasClass="o:partOf" idRef="d:plant"/>
    </pig:anEntity>
  </pig:graph>
</pig:aPackage>"#;

    fn decoded() -> RawPackage {
        decode(DOCUMENT, &CodecOptions::default()).unwrap()
    }

    #[test]
    fn namespaces_and_header() {
        let package = decoded();
        assert_eq!(package.context["o"], "https://example.org/ontology#");
        assert_eq!(package.header["id"], json!("d:package-1"));
        assert_eq!(package.header["title"], json!([{ "value": "Pumps", "lang": "en" }]));
        assert_eq!(package.items.len(), 4);
    }

    #[test]
    fn restriction_unwraps_into_fields() {
        let package = decoded();
        assert_eq!(
            package.items[0].value,
            json!({
                "itemType": "pig:Property",
                "id": "o:Weight",
                "hasClass": "pig:Property",
                "title": [
                    { "value": "Weight", "lang": "en" },
                    { "value": "Gewicht", "lang": "de" }
                ],
                "datatype": "xs:double",
                "minCount": 0,
                "maxCount": UNBOUNDED,
                "minInclusive": 0.0
            })
        );
    }

    #[test]
    fn target_link_arity_follows_parent_kind() {
        let package = decoded();
        assert_eq!(package.items[1].value["eligibleTargetLink"], json!(["o:partOf"]));
        assert_eq!(package.items[1].value["eligibleProperty"], json!(["o:Weight"]));
        assert_eq!(package.items[2].value["eligibleTargetLink"], json!("o:to"));
        assert_eq!(package.items[2].value["eligibleSourceLink"], json!("o:from"));
    }

    #[test]
    fn description_markup_is_kept_verbatim() {
        let package = decoded();
        assert_eq!(
            package.items[1].value["description"],
            json!([{ "value": "<p>A <b>pump</b> &amp; motor.</p>" }])
        );
    }

    #[test]
    fn individual_fragments_and_prefixing() {
        let package = decoded();
        let pump = &package.items[3].value;
        assert_eq!(pump["id"], json!("d:pump-1"));
        assert_eq!(pump["modified"], json!("2025-03-01T10:00:00Z"));
        assert_eq!(pump["hasProperty"], json!([{ "hasClass": "o:Weight", "value": "100.5" }]));
        assert_eq!(
            pump["hasTargetLink"],
            json!([{ "hasClass": "o:partOf", "idRef": "d:plant" }])
        );
    }

    #[test]
    fn wrong_root_is_rejected() {
        let err = decode("<pig:Other/>", &CodecOptions::default()).unwrap_err();
        assert!(matches!(err, CodecError::Structure(_)));
        let err = decode("<pig:aPackage><pig:graph>", &CodecOptions::default()).unwrap_err();
        assert!(matches!(err, CodecError::Structure(_) | CodecError::Xml(_)));
    }

    #[test]
    fn empty_allow_list_survives_encoding() {
        let item = json!({
            "itemType": "pig:Entity",
            "id": "o:Sealed",
            "hasClass": "pig:Entity",
            "eligibleProperty": []
        });
        let package = RawPackage {
            items: vec![RawItem::new(item.clone())],
            ..RawPackage::default()
        };
        let document = encode(&package).unwrap();
        assert!(document.contains("<pig:eligibleProperty/>"), "{document}");
        let back = decode(&document, &CodecOptions::default()).unwrap();
        assert_eq!(back.items[0].value, item);
    }

    #[test]
    fn encode_then_decode_preserves_items() {
        let package = decoded();
        let document = encode(&package).unwrap();
        let back = decode(&document, &CodecOptions::default()).unwrap();
        assert_eq!(back.items, package.items);
        assert_eq!(back.header, package.header);
    }

    #[test]
    fn markup_check() {
        assert!(is_markup("<p>A <b>pump</b> &amp; motor.</p>"));
        assert!(is_markup("plain text > 5"));
        assert!(!is_markup("Pump & motor"));
        assert!(!is_markup("p < 5 bar"));
        assert!(!is_markup("<p>unclosed"));
        assert!(!is_markup("stray</p>"));
        assert_eq!(as_markup("Pump & motor, p < 5 bar"), "Pump &amp; motor, p &lt; 5 bar");
        assert_eq!(as_markup("<p>ok</p>"), "<p>ok</p>");
    }

    #[test]
    fn plain_description_is_escaped_on_encode() {
        let item = json!({
            "itemType": "pig:Entity",
            "id": "o:Pump",
            "description": [{ "value": "Pump & motor" }]
        });
        let xml = encode_item(&item).unwrap();
        assert!(xml.contains("<dcterms:description>Pump &amp; motor</dcterms:description>"), "{xml}");
    }

    #[test]
    fn leaf_text_keeps_surrounding_whitespace() {
        let root = parse("<a>\n  <b> 100 </b>\n  <c>   </c>\n</a>").unwrap();
        assert_eq!(root.text, "");
        assert_eq!(root.children[0].text, " 100 ");
        assert_eq!(root.children[1].text, "");
    }

    #[test]
    fn single_item_encoding() {
        let link = json!({ "itemType": "pig:aTargetLink", "hasClass": "o:partOf", "idRef": "d:plant" });
        let xml = encode_item(&link).unwrap();
        assert_eq!(xml, r#"<pig:aTargetLink hasClass="o:partOf" idRef="d:plant"/>"#);
    }
}
