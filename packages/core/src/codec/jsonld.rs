//! JSON-LD documents.
//!
//! A document is an object with `@context`, package header fields, and an
//! `@graph` array of items. On individuals, every key that is not a fixed
//! structural key but looks like an identifier is a configurable property or
//! link keyed by its class.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::normalize::{
    normalize_item, scalar_text, walk, KeyRenamer, ReferenceUnwrapper, ReferenceWrapper,
};
use super::vocabulary::{self, is_identifier, Vocabulary, TEXT_FIELDS};
use super::{merged_context, CodecError, CodecOptions, RawItem, RawPackage};
use crate::types::ItemKind;

const FRAGMENT_FIELDS: &[&str] = &["hasProperty", "hasSourceLink", "hasTargetLink"];

pub(crate) fn decode(document: &str, options: &CodecOptions) -> Result<RawPackage, CodecError> {
    let root: Value = serde_json::from_str(document)?;
    let Value::Object(mut root) = root else {
        return Err(CodecError::Structure(
            "a JSON-LD package must be an object".into(),
        ));
    };

    let context = match root.remove("@context") {
        Some(Value::Object(ctx)) => read_context(ctx),
        Some(Value::Null) | None => BTreeMap::new(),
        Some(_) => {
            tracing::warn!("ignoring @context that is not an object");
            BTreeMap::new()
        }
    };

    let graph = match root.remove("@graph") {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => Vec::new(),
        Some(single @ Value::Object(_)) => vec![single],
        Some(_) => return Err(CodecError::Structure("@graph must be an array".into())),
    };

    let header = match walk(&mut KeyRenamer::ToInternal(Vocabulary::JsonLd), Value::Object(root)) {
        Value::Object(map) => normalize_item(map, Some(ItemKind::Package), options),
        _ => Map::new(),
    };

    let items = graph
        .into_iter()
        .map(|item| decode_item(item, options))
        .collect();

    Ok(RawPackage {
        context,
        header,
        items,
    })
}

fn read_context(ctx: Map<String, Value>) -> BTreeMap<String, String> {
    ctx.into_iter()
        .filter_map(|(prefix, iri)| match iri {
            Value::String(iri) => Some((prefix, iri)),
            _ => {
                tracing::debug!(%prefix, "skipping non-namespace context entry");
                None
            }
        })
        .collect()
}

fn decode_item(item: Value, options: &CodecOptions) -> RawItem {
    let mut map = match walk(&mut KeyRenamer::ToInternal(Vocabulary::JsonLd), item) {
        Value::Object(map) => map,
        // Not an object: keep it as is so item construction reports it.
        other => return RawItem::new(other),
    };

    let kind = map
        .get("itemType")
        .cloned()
        .map(|v| walk(&mut ReferenceUnwrapper, v))
        .and_then(|v| v.as_str().and_then(ItemKind::from_tag));

    if kind.is_some_and(ItemKind::is_individual) {
        extract_configurable(&mut map);
    }

    RawItem::new(Value::Object(normalize_item(map, kind, options)))
}

/// Move identifier-keyed entries into `hasProperty` / `hasSourceLink` /
/// `hasTargetLink`.
fn extract_configurable(map: &mut Map<String, Value>) {
    let keys: Vec<String> = map
        .keys()
        .filter(|k| !vocabulary::is_structural(k) && is_identifier(k))
        .cloned()
        .collect();

    for class in keys {
        let Some(value) = map.remove(&class) else {
            continue;
        };
        let entries = match value {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => vec![other],
        };
        for entry in entries {
            let (field, fragment) = match configurable_fragment(&class, entry) {
                Some(f) => f,
                None => continue,
            };
            let slot = map
                .entry(field)
                .or_insert_with(|| Value::Array(Vec::new()));
            match slot {
                Value::Array(list) => list.push(fragment),
                other => *other = Value::Array(vec![other.take(), fragment]),
            }
        }
    }
}

fn configurable_fragment(class: &str, entry: Value) -> Option<(&'static str, Value)> {
    let mut fragment = Map::new();
    fragment.insert("hasClass".into(), Value::String(class.to_string()));
    match entry {
        Value::Null => return None,
        Value::Object(mut obj) if obj.contains_key("id") => {
            let target = walk(&mut ReferenceUnwrapper, obj.remove("id").unwrap_or_default());
            let declared = obj
                .remove("itemType")
                .map(|v| walk(&mut ReferenceUnwrapper, v));
            let field = match declared.as_ref().and_then(Value::as_str) {
                Some(tag) if tag == ItemKind::SourceLinkValue.tag() => "hasSourceLink",
                _ => "hasTargetLink",
            };
            fragment.insert("idRef".into(), target);
            return Some((field, Value::Object(fragment)));
        }
        Value::Object(obj) => {
            let value = obj.get("value").and_then(scalar_text).unwrap_or_default();
            fragment.insert("value".into(), Value::String(value));
            if let Some(lang) = obj.get("lang").and_then(Value::as_str) {
                fragment.insert("lang".into(), Value::String(lang.to_string()));
            }
        }
        scalar => {
            let value = scalar_text(&scalar).unwrap_or_default();
            fragment.insert("value".into(), Value::String(value));
        }
    }
    Some(("hasProperty", Value::Object(fragment)))
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

pub(crate) fn encode(package: &RawPackage) -> Result<String, CodecError> {
    let mut root = Map::new();
    let context: Map<String, Value> = merged_context(&package.context)
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();
    root.insert("@context".into(), Value::Object(context));

    let mut header = package.header.clone();
    header
        .entry("itemType")
        .or_insert_with(|| Value::String(ItemKind::Package.tag().into()));
    if let Value::Object(header) = to_wire(header) {
        root.extend(header);
    }

    let graph: Vec<Value> = package
        .items
        .iter()
        .map(|item| encode_value(&item.value))
        .collect();
    root.insert("@graph".into(), Value::Array(graph));

    Ok(serde_json::to_string_pretty(&Value::Object(root))?)
}

pub(crate) fn encode_item(item: &Value) -> Result<String, CodecError> {
    Ok(serde_json::to_string_pretty(&encode_value(item))?)
}

fn encode_value(item: &Value) -> Value {
    let Value::Object(map) = item else {
        return item.clone();
    };
    let mut map = map.clone();
    let individual = map
        .get("itemType")
        .and_then(Value::as_str)
        .and_then(ItemKind::from_tag)
        .is_some_and(ItemKind::is_individual);
    if individual {
        attach_configurable(&mut map);
    }
    to_wire(map)
}

/// Wrap references and rename to JSON-LD keys.
fn to_wire(map: Map<String, Value>) -> Value {
    let wrapped: Map<String, Value> = map
        .into_iter()
        .map(|(k, v)| {
            let v = if k == "id" || TEXT_FIELDS.contains(&k.as_str()) || !vocabulary::is_structural(&k) {
                v
            } else {
                walk(&mut ReferenceWrapper, v)
            };
            (k, v)
        })
        .collect();
    walk(&mut KeyRenamer::ToJsonLd, Value::Object(wrapped))
}

/// Inverse of [`extract_configurable`]: regroup fragments under their class
/// id, in first-appearance order.
fn attach_configurable(map: &mut Map<String, Value>) {
    let mut groups: Vec<(String, Vec<Value>)> = Vec::new();
    for field in FRAGMENT_FIELDS {
        let Some(Value::Array(fragments)) = map.remove(*field) else {
            continue;
        };
        for fragment in fragments {
            let Some(class) = fragment
                .get("hasClass")
                .and_then(Value::as_str)
                .map(str::to_string)
            else {
                continue;
            };
            let entry = configurable_entry(field, &fragment);
            match groups.iter_mut().find(|(c, _)| *c == class) {
                Some((_, list)) => list.push(entry),
                None => groups.push((class, vec![entry])),
            }
        }
    }
    for (class, entries) in groups {
        map.insert(class, Value::Array(entries));
    }
}

fn configurable_entry(field: &str, fragment: &Value) -> Value {
    let mut entry = Map::new();
    match field {
        "hasProperty" => {
            entry.insert("@value".into(), fragment.get("value").cloned().unwrap_or_default());
            if let Some(lang) = fragment.get("lang") {
                entry.insert("@language".into(), lang.clone());
            }
        }
        _ => {
            let tag = if field == "hasSourceLink" {
                ItemKind::SourceLinkValue.tag()
            } else {
                ItemKind::TargetLinkValue.tag()
            };
            entry.insert("@id".into(), fragment.get("idRef").cloned().unwrap_or_default());
            let mut item_type = Map::new();
            item_type.insert("@id".into(), Value::String(tag.into()));
            entry.insert("pig:itemType".into(), Value::Object(item_type));
        }
    }
    Value::Object(entry)
}

// --- tests ---
