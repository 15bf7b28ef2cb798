//! Format-independent rewriting of the intermediate tree.
//!
//! Both decoders first turn their document into a [`serde_json::Value`] tree
//! with internal field names; everything after that point is shared and lives
//! here. Rewrites are expressed as [`Visitor`]s with one method per node kind
//! (object, array, scalar), so every kind of node is handled explicitly.

use chrono::SecondsFormat;
use serde_json::{Map, Number, Value};

use super::vocabulary::{
    self, is_bare_name, is_identifier, Vocabulary, CLASS_REFERENCE_FIELDS, INTEGER_FIELDS,
    NUMBER_FIELDS, RICH_TEXT_FIELDS, TEXT_FIELDS,
};
use super::xml::as_markup;
use super::CodecOptions;
use crate::types::{ItemKind, UNBOUNDED};

/// A rewrite over the intermediate tree. Default methods walk children and
/// rebuild the node unchanged.
pub(crate) trait Visitor {
    fn visit_object(&mut self, map: Map<String, Value>) -> Value {
        Value::Object(walk_entries(self, map))
    }

    fn visit_array(&mut self, items: Vec<Value>) -> Value {
        Value::Array(items.into_iter().map(|v| walk(self, v)).collect())
    }

    fn visit_scalar(&mut self, value: Value) -> Value {
        value
    }
}

pub(crate) fn walk<V: Visitor + ?Sized>(visitor: &mut V, value: Value) -> Value {
    match value {
        Value::Object(map) => visitor.visit_object(map),
        Value::Array(items) => visitor.visit_array(items),
        scalar @ (Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)) => {
            visitor.visit_scalar(scalar)
        }
    }
}

pub(crate) fn walk_entries<V: Visitor + ?Sized>(
    visitor: &mut V,
    map: Map<String, Value>,
) -> Map<String, Value> {
    map.into_iter().map(|(k, v)| (k, walk(visitor, v))).collect()
}

// ---------------------------------------------------------------------------
// Visitors
// ---------------------------------------------------------------------------

/// Renames object keys between a wire vocabulary and internal names.
/// Keys outside the table are left alone.
pub(crate) enum KeyRenamer {
    ToInternal(Vocabulary),
    ToJsonLd,
}

impl Visitor for KeyRenamer {
    fn visit_object(&mut self, map: Map<String, Value>) -> Value {
        let mut out = Map::with_capacity(map.len());
        for (key, value) in map {
            let renamed = match self {
                KeyRenamer::ToInternal(vocabulary) => vocabulary::to_internal(*vocabulary, &key),
                KeyRenamer::ToJsonLd => vocabulary::to_jsonld(&key),
            };
            let value = walk(self, value);
            out.insert(renamed.map(str::to_string).unwrap_or(key), value);
        }
        Value::Object(out)
    }
}

/// Replaces `{ "id": X }` wrappers by the bare identifier `X`.
pub(crate) struct ReferenceUnwrapper;

impl Visitor for ReferenceUnwrapper {
    fn visit_object(&mut self, map: Map<String, Value>) -> Value {
        let map = walk_entries(self, map);
        if map.len() == 1 {
            if let Some(Value::String(id)) = map.get("id") {
                return Value::String(id.clone());
            }
        }
        Value::Object(map)
    }
}

/// Wraps every identifier-shaped string into `{ "id": X }`.
pub(crate) struct ReferenceWrapper;

impl Visitor for ReferenceWrapper {
    fn visit_scalar(&mut self, value: Value) -> Value {
        match value {
            Value::String(s) if is_identifier(&s) => {
                let mut wrapped = Map::new();
                wrapped.insert("id".into(), Value::String(s));
                Value::Object(wrapped)
            }
            other => other,
        }
    }
}

// ---------------------------------------------------------------------------
// Field normalisation
// ---------------------------------------------------------------------------

/// Bring a decoded item (internal names, references still possibly wrapped)
/// into canonical internal shape.
pub(crate) fn normalize_item(
    map: Map<String, Value>,
    kind: Option<ItemKind>,
    options: &CodecOptions,
) -> Map<String, Value> {
    let mut out = Map::with_capacity(map.len());
    for (key, value) in map {
        if !vocabulary::is_structural(&key) {
            tracing::warn!(field = %key, "dropping unknown field");
            continue;
        }
        let value = if TEXT_FIELDS.contains(&key.as_str()) {
            let mut entries = normalize_text(value);
            if entries.is_empty() {
                continue;
            }
            if RICH_TEXT_FIELDS.contains(&key.as_str()) {
                entries.iter_mut().for_each(escape_plain_text);
            }
            Value::Array(entries)
        } else {
            let value = walk(&mut ReferenceUnwrapper, value);
            normalize_field(&key, value, kind, options)
        };
        if !value.is_null() {
            out.insert(key, value);
        }
    }
    out
}

fn normalize_field(
    key: &str,
    value: Value,
    kind: Option<ItemKind>,
    options: &CodecOptions,
) -> Value {
    match key {
        "hasProperty" | "hasSourceLink" | "hasTargetLink" => {
            map_items(value, |v| normalize_fragment(v, options))
        }
        "id" => {
            let prefix = match kind {
                Some(k) if k.is_class() => &options.ontology_prefix,
                _ => &options.data_prefix,
            };
            map_strings(unwrap_literal(value), |s| prefixed(s, prefix, key))
        }
        "idRef" => map_strings(unwrap_literal(value), |s| {
            prefixed(s, &options.data_prefix, key)
        }),
        "modified" => map_strings(unwrap_literal(value), canonical_timestamp),
        _ if CLASS_REFERENCE_FIELDS.contains(&key) => map_strings(unwrap_literal(value), |s| {
            prefixed(s, &options.ontology_prefix, key)
        }),
        _ if INTEGER_FIELDS.contains(&key) => integer_value(unwrap_literal(value)),
        _ if NUMBER_FIELDS.contains(&key) => number_value(unwrap_literal(value)),
        _ => unwrap_literal(value),
    }
}

fn normalize_fragment(value: Value, options: &CodecOptions) -> Value {
    let Value::Object(map) = value else {
        return value;
    };
    let mut out = Map::with_capacity(map.len());
    for (key, value) in map {
        let value = match key.as_str() {
            "itemType" => continue,
            "hasClass" => map_strings(unwrap_literal(value), |s| {
                prefixed(s, &options.ontology_prefix, "hasClass")
            }),
            "idRef" => map_strings(unwrap_literal(value), |s| {
                prefixed(s, &options.data_prefix, "idRef")
            }),
            "value" => match scalar_text(&value) {
                Some(text) => Value::String(text),
                None => value,
            },
            _ => value,
        };
        out.insert(key, value);
    }
    Value::Object(out)
}

/// Collapse absent / string / object / array into `[{value, lang?}]`.
pub(crate) fn normalize_text(value: Value) -> Vec<Value> {
    match value {
        Value::Null => vec![],
        Value::Array(items) => items.into_iter().flat_map(normalize_text).collect(),
        Value::Object(map) => {
            let text = map.get("value").and_then(scalar_text).unwrap_or_default();
            let lang = map.get("lang").and_then(Value::as_str).map(str::to_string);
            vec![text_entry(text, lang)]
        }
        scalar @ (Value::Bool(_) | Value::Number(_) | Value::String(_)) => {
            vec![text_entry(scalar_text(&scalar).unwrap_or_default(), None)]
        }
    }
}

/// Rich text is held as markup; plain text with a bare `&` or `<` is escaped.
fn escape_plain_text(entry: &mut Value) {
    if let Some(Value::String(text)) = entry.get_mut("value") {
        let markup = as_markup(text);
        if markup != *text {
            tracing::debug!("escaping rich text that is not markup");
            *text = markup;
        }
    }
}

pub(crate) fn text_entry(value: String, lang: Option<String>) -> Value {
    let mut entry = Map::new();
    entry.insert("value".into(), Value::String(value));
    if let Some(lang) = lang {
        entry.insert("lang".into(), Value::String(lang));
    }
    Value::Object(entry)
}

/// `{ "value": X, "@type": T }` → `X`, element-wise for arrays.
fn unwrap_literal(value: Value) -> Value {
    match value {
        Value::Object(mut map)
            if map.contains_key("value")
                && map.keys().all(|k| matches!(k.as_str(), "value" | "lang" | "@type")) =>
        {
            map.remove("value").unwrap_or(Value::Null)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(unwrap_literal).collect()),
        other => other,
    }
}

pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn map_strings(value: Value, f: impl Fn(&str) -> String) -> Value {
    match value {
        Value::String(s) => Value::String(f(&s)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|v| match v {
                    Value::String(s) => Value::String(f(&s)),
                    other => other,
                })
                .collect(),
        ),
        other => other,
    }
}

fn map_items(value: Value, f: impl Fn(Value) -> Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(f).collect()),
        other => Value::Array(vec![f(other)]),
    }
}

fn integer_value(value: Value) -> Value {
    match &value {
        Value::String(s) if s.trim() == "unbounded" => Value::Number(UNBOUNDED.into()),
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map(|n| Value::Number(n.into()))
            .unwrap_or(value),
        _ => value,
    }
}

fn number_value(value: Value) -> Value {
    match &value {
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(value),
        _ => value,
    }
}

fn prefixed(s: &str, prefix: &str, field: &str) -> String {
    if is_bare_name(s) {
        tracing::info!(field, identifier = s, prefix, "prefixing bare identifier");
        format!("{prefix}:{s}")
    } else {
        s.to_string()
    }
}

/// Re-emit RFC 3339 timestamps in one canonical form; leave anything else.
pub(crate) fn canonical_timestamp(s: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        .unwrap_or_else(|_| s.to_string())
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(value: Value) -> Value {
        Value::Array(normalize_text(value))
    }

    #[test]
    fn text_shapes_collapse_to_canonical_array() {
        assert_eq!(text(json!(null)), json!([]));
        assert_eq!(text(json!("Pump")), json!([{ "value": "Pump" }]));
        assert_eq!(
            text(json!({ "value": "Pumpe", "lang": "de" })),
            json!([{ "value": "Pumpe", "lang": "de" }])
        );
        assert_eq!(
            text(json!(["Pump", { "value": "Pumpe", "lang": "de" }])),
            json!([{ "value": "Pump" }, { "value": "Pumpe", "lang": "de" }])
        );
    }

    #[test]
    fn text_normalization_is_idempotent() {
        let canonical = json!([
            { "value": "Weight", "lang": "en" },
            { "value": "Gewicht", "lang": "de" }
        ]);
        assert_eq!(text(canonical.clone()), canonical);
        assert_eq!(text(text(json!("x"))), json!([{ "value": "x" }]));
    }

    #[test]
    fn renamer_maps_jsonld_keys() {
        let value = json!({
            "@id": "o:Weight",
            "pig:itemType": { "@id": "pig:Property" },
            "dcterms:title": [{ "@value": "Weight", "@language": "en" }],
            "o:Custom": 1
        });
        let renamed = walk(&mut KeyRenamer::ToInternal(Vocabulary::JsonLd), value);
        assert_eq!(
            renamed,
            json!({
                "id": "o:Weight",
                "itemType": { "id": "pig:Property" },
                "title": [{ "value": "Weight", "lang": "en" }],
                "o:Custom": 1
            })
        );
        let back = walk(&mut KeyRenamer::ToJsonLd, renamed);
        assert_eq!(back["pig:itemType"], json!({ "@id": "pig:Property" }));
    }

    #[test]
    fn unwrapper_and_wrapper() {
        let wrapped = json!(["o:A", { "id": "o:B" }]);
        assert_eq!(walk(&mut ReferenceUnwrapper, wrapped), json!(["o:A", "o:B"]));

        let not_a_wrapper = json!({ "id": "o:A", "value": "x" });
        assert_eq!(walk(&mut ReferenceUnwrapper, not_a_wrapper.clone()), not_a_wrapper);

        assert_eq!(
            walk(&mut ReferenceWrapper, json!(["o:A", "plain", 3])),
            json!([{ "id": "o:A" }, "plain", 3])
        );
    }

    #[test]
    fn normalize_prefixes_parses_and_drops() {
        let options = CodecOptions::default();
        let map = json!({
            "id": "Weight",
            "itemType": { "id": "pig:Property" },
            "hasClass": { "id": "pig:Property" },
            "minCount": "1",
            "maxCount": "unbounded",
            "minInclusive": { "value": "0.5", "@type": "xs:double" },
            "title": "Weight",
            "colour": "red"
        });
        let Value::Object(map) = map else { unreachable!() };
        let out = normalize_item(map, Some(ItemKind::PropertyClass), &options);
        assert_eq!(
            Value::Object(out),
            json!({
                "id": "o:Weight",
                "itemType": "pig:Property",
                "hasClass": "pig:Property",
                "minCount": 1,
                "maxCount": UNBOUNDED,
                "minInclusive": 0.5,
                "title": [{ "value": "Weight" }]
            })
        );
    }

    #[test]
    fn individual_ids_get_data_prefix() {
        let options = CodecOptions::default();
        let Value::Object(map) = json!({
            "id": "pump-1",
            "hasClass": "Pump",
            "modified": "2025-03-01T10:00:00+00:00",
            "hasTargetLink": { "hasClass": "partOf", "idRef": "plant" }
        }) else {
            unreachable!()
        };
        let out = Value::Object(normalize_item(map, Some(ItemKind::EntityInstance), &options));
        assert_eq!(out["id"], json!("d:pump-1"));
        assert_eq!(out["hasClass"], json!("o:Pump"));
        assert_eq!(out["modified"], json!("2025-03-01T10:00:00Z"));
        assert_eq!(
            out["hasTargetLink"],
            json!([{ "hasClass": "o:partOf", "idRef": "d:plant" }])
        );
    }

    #[test]
    fn plain_description_is_escaped_into_markup() {
        let Value::Object(map) = json!({
            "id": "o:Pump",
            "title": "Pump & motor",
            "description": [
                "Pump & motor, p < 5 bar",
                { "value": "<p>A <b>pump</b> &amp; motor.</p>", "lang": "en" }
            ]
        }) else {
            unreachable!()
        };
        let options = CodecOptions::default();
        let out = Value::Object(normalize_item(map, Some(ItemKind::EntityClass), &options));
        assert_eq!(out["title"], json!([{ "value": "Pump & motor" }]));
        assert_eq!(
            out["description"],
            json!([
                { "value": "Pump &amp; motor, p &lt; 5 bar" },
                { "value": "<p>A <b>pump</b> &amp; motor.</p>", "lang": "en" }
            ])
        );
    }

    #[test]
    fn canonical_timestamp_is_idempotent() {
        let once = canonical_timestamp("2025-03-01T12:00:00.500+01:00");
        assert_eq!(once, "2025-03-01T12:00:00.500+01:00");
        assert_eq!(canonical_timestamp(&once), once);
        assert_eq!(canonical_timestamp("2025-03-01"), "2025-03-01");
    }
}
