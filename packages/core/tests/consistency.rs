//! Import-level behaviour of item validation and the consistency checker.

use pig::{
    CheckKind, CheckSet, CompiledSchemas, Format, ImportOptions, ImportReport, Item, ItemError,
    ItemKind, Package, StatusCode,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn import_with(graph: Value, options: &ImportOptions) -> (Package, ImportReport) {
    let document = json!({
        "@context": { "o": "https://example.org/ontology#", "d": "https://example.org/data#" },
        "@id": "d:package-1",
        "@graph": graph
    })
    .to_string();
    let schemas = CompiledSchemas::embedded().unwrap();
    Package::import(&document, Format::JsonLd, &schemas, options).unwrap()
}

fn import(graph: Value) -> (Package, ImportReport) {
    import_with(graph, &ImportOptions::default())
}

fn entity_class(id: &str) -> Value {
    json!({
        "@id": id,
        "pig:itemType": { "@id": "pig:Entity" },
        "pig:hasClass": { "@id": "pig:Entity" }
    })
}

fn property_class(id: &str, datatype: &str, min: u32, max: u32) -> Value {
    json!({
        "@id": id,
        "pig:itemType": { "@id": "pig:Property" },
        "pig:hasClass": { "@id": "pig:Property" },
        "sh:datatype": { "@id": datatype },
        "sh:minCount": min,
        "sh:maxCount": max
    })
}

fn entity(id: &str, class: &str, properties: Value) -> Value {
    let mut item = json!({
        "@id": id,
        "pig:itemType": { "@id": "pig:anEntity" },
        "pig:hasClass": { "@id": class }
    });
    if let (Some(map), Value::Object(properties)) = (item.as_object_mut(), properties) {
        map.extend(properties);
    }
    item
}

// ---------------------------------------------------------------------------
// Item failures
// ---------------------------------------------------------------------------

#[test]
fn degraded_package_reports_partial_instantiation() {
    let (package, report) = import(json!([
        entity_class("o:Pump"),
        entity_class("o:Tank"),
        property_class("o:Weight", "xs:double", 0, 1),
        // schema violation: the id is not an identifier
        { "@id": "not an id", "pig:itemType": { "@id": "pig:Entity" }, "pig:hasClass": { "@id": "pig:Entity" } },
        entity("d:pump-1", "o:Pump", json!({}))
    ]));
    assert_eq!(report.summary(), "4 of 5 items instantiated");
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 3);
    assert_eq!(report.failures[0].error.status(), StatusCode::SchemaViolation);
    assert_eq!(report.consistency, Ok(()));
    assert!(!report.is_clean());
    assert_eq!(report.status(), StatusCode::SchemaViolation);

    assert_eq!(package.items().len(), 5);
    assert_eq!(package.valid_items().count(), 4);
    assert!(!package.items()[3].is_valid());
}

#[test]
fn identity_is_immutable_once_set() {
    let schemas = CompiledSchemas::embedded().unwrap();
    let mut item = Item::from_value(
        ItemKind::EntityClass,
        json!({ "id": "o:Pump", "hasClass": "pig:Entity" }),
        &schemas,
    )
    .unwrap();

    // Same id: content may change.
    item.set(
        json!({ "id": "o:Pump", "hasClass": "pig:Entity", "icon": "pump.svg" }),
        &schemas,
    )
    .unwrap();
    assert_eq!(item.id(), Some("o:Pump"));

    let err = item
        .set(json!({ "id": "o:Tank", "hasClass": "pig:Entity" }), &schemas)
        .unwrap_err();
    assert_eq!(
        err,
        ItemError::Immutable {
            field: "id",
            was: "o:Pump".into(),
            now: Some("o:Tank".into()),
        }
    );
    assert_eq!(err.status(), StatusCode::ImmutableField);
    assert!(!item.is_valid());
    assert_eq!(item.id(), None);
    assert_eq!(item.fixed_id(), Some("o:Pump"));
}

#[test]
fn specializes_is_immutable_once_set() {
    let schemas = CompiledSchemas::embedded().unwrap();
    let mut item = Item::from_value(
        ItemKind::EntityClass,
        json!({ "id": "o:CentrifugalPump", "specializes": "o:Pump" }),
        &schemas,
    )
    .unwrap();
    let err = item
        .set(json!({ "id": "o:CentrifugalPump", "specializes": "o:Tank" }), &schemas)
        .unwrap_err();
    assert!(matches!(err, ItemError::Immutable { field: "specializes", .. }));
}

#[test]
#[should_panic(expected = "item kind is fixed")]
fn kind_cannot_change() {
    let schemas = CompiledSchemas::embedded().unwrap();
    let mut item = Item::new(ItemKind::EntityClass);
    let _ = item.set(
        json!({ "itemType": "pig:Property", "id": "o:Weight", "hasClass": "pig:Property" }),
        &schemas,
    );
}

// ---------------------------------------------------------------------------
// Consistency
// ---------------------------------------------------------------------------

#[test]
fn duplicate_identifiers_are_reported() {
    let (_, report) = import(json!([entity_class("o:Pump"), entity_class("o:Pump")]));
    let violation = report.consistency.unwrap_err();
    assert_eq!(violation.check, CheckKind::DuplicateIds);
    assert_eq!(violation.item, "o:Pump");
    assert_eq!(violation.status(), StatusCode::DuplicateIdentifier);
}

#[test]
fn specialization_cycle_is_reported_with_path() {
    let class = |id: &str, parent: &str| {
        json!({
            "@id": id,
            "pig:itemType": { "@id": "pig:Entity" },
            "pig:specializes": { "@id": parent }
        })
    };
    let (_, report) = import(json!([
        class("o:A", "o:B"),
        class("o:B", "o:C"),
        class("o:C", "o:A")
    ]));
    let violation = report.consistency.unwrap_err();
    assert_eq!(violation.check, CheckKind::SpecializationCycles);
    assert_eq!(violation.status(), StatusCode::SpecializationCycle);
    assert!(
        violation.reason.contains("o:A -> o:B -> o:C -> o:A"),
        "{}",
        violation.reason
    );
}

#[test]
fn string_cardinality_counts_each_language() {
    let classes = || {
        vec![
            entity_class("o:Pump"),
            property_class("o:Name", "xs:string", 2, 3),
        ]
    };

    let mut graph = classes();
    graph.push(entity(
        "d:pump-1",
        "o:Pump",
        json!({ "o:Name": [
            { "@value": "Pump", "@language": "en" },
            { "@value": "Water pump", "@language": "en" },
            { "@value": "Pumpe", "@language": "de" }
        ]}),
    ));
    let (_, report) = import(Value::Array(graph));
    let violation = report.consistency.unwrap_err();
    assert_eq!(violation.check, CheckKind::Cardinality);
    assert_eq!(violation.field.as_deref(), Some("o:Name"));
    assert!(violation.reason.contains("language de"), "{}", violation.reason);
    assert_eq!(violation.status(), StatusCode::CardinalityViolation);

    // Untagged values fall into the default-language bucket.
    let mut graph = classes();
    graph.push(entity(
        "d:pump-1",
        "o:Pump",
        json!({ "o:Name": [
            { "@value": "Pump", "@language": "en" },
            { "@value": "Water pump" }
        ]}),
    ));
    let (_, report) = import(Value::Array(graph));
    assert_eq!(report.consistency, Ok(()));
}

#[test]
fn non_string_cardinality_counts_occurrences() {
    let (_, report) = import(json!([
        entity_class("o:Pump"),
        property_class("o:Weight", "xs:double", 0, 1),
        entity("d:pump-1", "o:Pump", json!({ "o:Weight": [{ "@value": "1" }, { "@value": "2" }] }))
    ]));
    let violation = report.consistency.unwrap_err();
    assert_eq!(violation.check, CheckKind::Cardinality);
    assert!(
        violation.reason.contains("too many occurrences"),
        "{}",
        violation.reason
    );
}

#[test]
fn link_to_ineligible_endpoint() {
    let (_, report) = import(json!([
        entity_class("o:Pump"),
        entity_class("o:Plant"),
        {
            "@id": "o:partOf",
            "pig:itemType": { "@id": "pig:Link" },
            "pig:hasClass": { "@id": "pig:Link" },
            "pig:eligibleEndpoint": [{ "@id": "o:Plant" }]
        },
        entity("d:pump-2", "o:Pump", json!({})),
        entity("d:pump-1", "o:Pump", json!({ "o:partOf": { "@id": "d:pump-2" } }))
    ]));
    let violation = report.consistency.unwrap_err();
    assert_eq!(violation.check, CheckKind::LinkTargets);
    assert_eq!(violation.item, "d:pump-1");
    assert_eq!(violation.status(), StatusCode::NotEligible);
}

#[test]
fn value_must_parse_as_datatype() {
    let graph = json!([
        entity_class("o:Pump"),
        property_class("o:Weight", "xs:double", 0, 1),
        entity("d:pump-1", "o:Pump", json!({ "o:Weight": [{ "@value": "heavy" }] }))
    ]);
    let (_, report) = import(graph.clone());
    let violation = report.consistency.unwrap_err();
    assert_eq!(violation.check, CheckKind::ValueConstraints);
    assert_eq!(violation.status(), StatusCode::ValueConstraint);

    let options = ImportOptions {
        checks: CheckSet::all().without(CheckKind::ValueConstraints),
        ..ImportOptions::default()
    };
    let (_, report) = import_with(graph, &options);
    assert_eq!(report.consistency, Ok(()));
}

#[test]
fn checks_run_only_over_valid_items() {
    // The broken class is left out of the graph, so the individual's class
    // reference no longer resolves.
    let (_, report) = import(json!([
        { "@id": "o:Pump", "pig:itemType": { "@id": "pig:Entity" } },
        entity("d:pump-1", "o:Pump", json!({}))
    ]));
    assert_eq!(report.summary(), "1 of 2 items instantiated");
    assert_eq!(
        report.failures[0].error,
        ItemError::ClassOrigin { id: "o:Pump".into() }
    );
    let violation = report.consistency.unwrap_err();
    assert_eq!(violation.check, CheckKind::ClassReferences);
    assert_eq!(violation.status(), StatusCode::MissingReference);
}
