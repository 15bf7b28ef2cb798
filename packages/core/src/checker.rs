//! Whole-graph consistency checks.
//!
//! Item-level validation cannot see other items; everything that needs the
//! whole package (reference resolution, specialization cycles, cardinality
//! accounting, eligibility) runs here, over the items that passed item-level
//! validation.
//!
//! [`check`] runs the requested [`CheckKind`]s in their declared order and
//! stops at the first [`Violation`]. Callers that want to see past a
//! violation re-run with a narrower [`CheckSet`].

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::graph::GraphIndex;
use crate::status::StatusCode;
use crate::types::{Datatype, ItemData, ItemKind, LinkValue, PropertyValue};

/// One kind of consistency check. Declaration order is execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CheckKind {
    /// No identifier is used by two items.
    DuplicateIds,
    /// Every `hasClass` and `specializes` resolves to a class of the right kind.
    ClassReferences,
    /// No `specializes` chain returns to where it started.
    SpecializationCycles,
    /// Property occurrences respect `minCount` / `maxCount`.
    Cardinality,
    /// Every link resolves to an item whose class is an eligible endpoint.
    LinkTargets,
    /// Property values are allowed by the individual's class.
    EligibleProperties,
    /// Links are allowed by the individual's class.
    EligibleLinks,
    /// Property values parse as their datatype and respect its facets.
    ValueConstraints,
}

impl CheckKind {
    pub const ALL: [CheckKind; 8] = [
        CheckKind::DuplicateIds,
        CheckKind::ClassReferences,
        CheckKind::SpecializationCycles,
        CheckKind::Cardinality,
        CheckKind::LinkTargets,
        CheckKind::EligibleProperties,
        CheckKind::EligibleLinks,
        CheckKind::ValueConstraints,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CheckKind::DuplicateIds => "duplicate-ids",
            CheckKind::ClassReferences => "class-references",
            CheckKind::SpecializationCycles => "specialization-cycles",
            CheckKind::Cardinality => "cardinality",
            CheckKind::LinkTargets => "link-targets",
            CheckKind::EligibleProperties => "eligible-properties",
            CheckKind::EligibleLinks => "eligible-links",
            CheckKind::ValueConstraints => "value-constraints",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for CheckKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CheckKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| {
                format!(
                    "unknown check {:?}; expected one of: {}",
                    s,
                    CheckKind::ALL.map(CheckKind::name).join(", ")
                )
            })
    }
}

/// The checks requested for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckSet(BTreeSet<CheckKind>);

impl CheckSet {
    pub fn all() -> Self {
        Self(CheckKind::ALL.into_iter().collect())
    }

    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    pub fn only(kinds: impl IntoIterator<Item = CheckKind>) -> Self {
        Self(kinds.into_iter().collect())
    }

    pub fn without(mut self, kind: CheckKind) -> Self {
        self.0.remove(&kind);
        self
    }

    pub fn contains(&self, kind: CheckKind) -> bool {
        self.0.contains(&kind)
    }

    /// Requested checks in execution order.
    pub fn iter(&self) -> impl Iterator<Item = CheckKind> + '_ {
        self.0.iter().copied()
    }
}

impl Default for CheckSet {
    fn default() -> Self {
        Self::all()
    }
}

/// The first inconsistency found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{check}: {item}{}: {reason}", .field.as_ref().map(|f| format!(" [{f}]")).unwrap_or_default())]
pub struct Violation {
    pub check: CheckKind,
    /// Id of the offending item.
    pub item: String,
    /// The class or field the violation is about, when there is one.
    pub field: Option<String>,
    pub reason: String,
    pub status: StatusCode,
}

impl Violation {
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// Run the requested checks over `index`, stopping at the first violation.
///
/// `default_language` is the language assumed for untagged string values
/// when they are bucketed for cardinality.
pub fn check(
    index: &GraphIndex<'_>,
    requested: &CheckSet,
    default_language: &str,
) -> Result<(), Violation> {
    let checker = Checker {
        index,
        default_language,
    };
    for kind in requested.iter() {
        tracing::debug!(check = %kind, items = index.len(), "running consistency check");
        match kind {
            CheckKind::DuplicateIds => checker.duplicate_ids()?,
            CheckKind::ClassReferences => checker.class_references()?,
            CheckKind::SpecializationCycles => checker.specialization_cycles()?,
            CheckKind::Cardinality => checker.cardinality()?,
            CheckKind::LinkTargets => checker.link_targets()?,
            CheckKind::EligibleProperties => checker.eligible_properties()?,
            CheckKind::EligibleLinks => checker.eligible_links()?,
            CheckKind::ValueConstraints => checker.value_constraints()?,
        }
    }
    Ok(())
}

struct Checker<'i, 'a> {
    index: &'i GraphIndex<'a>,
    default_language: &'i str,
}

impl<'a> Checker<'_, 'a> {
    fn individuals(&self) -> impl Iterator<Item = (&'a str, &'a ItemData)> + '_ {
        self.index
            .items()
            .filter(|d| d.kind().is_individual())
            .filter_map(|d| d.identifiable().map(|i| (i.id.as_str(), d)))
    }

    // --- DuplicateIds ---

    fn duplicate_ids(&self) -> Result<(), Violation> {
        match self.index.duplicates().first() {
            Some(dup) => Err(violation(
                CheckKind::DuplicateIds,
                &dup.id,
                None,
                format!("identifier is used by items {} and {}", dup.first, dup.second),
                StatusCode::DuplicateIdentifier,
            )),
            None => Ok(()),
        }
    }

    // --- ClassReferences ---

    fn class_references(&self) -> Result<(), Violation> {
        for data in self.index.items() {
            let kind = data.kind();
            let id = item_id(data);
            if kind.is_class() {
                if let Some(parent) = data.identifiable().and_then(|i| i.specializes.as_deref()) {
                    self.expect_class(CheckKind::ClassReferences, id, "specializes", parent, kind)?;
                }
                continue;
            }
            if let (Some(class), Some(expected)) = (data.has_class(), kind.class_kind()) {
                self.expect_class(CheckKind::ClassReferences, id, "hasClass", class, expected)?;
            }
            for p in data.properties() {
                self.expect_class(
                    CheckKind::ClassReferences,
                    id,
                    &p.has_class,
                    &p.has_class,
                    ItemKind::PropertyClass,
                )?;
            }
            for link in data.source_links().iter().chain(data.target_links()) {
                self.expect_class(
                    CheckKind::ClassReferences,
                    id,
                    &link.has_class,
                    &link.has_class,
                    ItemKind::LinkClass,
                )?;
            }
        }
        Ok(())
    }

    fn expect_class(
        &self,
        check: CheckKind,
        item: &str,
        field: &str,
        reference: &str,
        expected: ItemKind,
    ) -> Result<(), Violation> {
        match self.index.get(reference) {
            None => Err(violation(
                check,
                item,
                Some(field),
                format!("{reference} does not resolve"),
                StatusCode::MissingReference,
            )),
            Some(target) if target.kind() != expected => Err(violation(
                check,
                item,
                Some(field),
                format!("{reference} is a {}, expected a {expected}", target.kind()),
                StatusCode::KindMismatch,
            )),
            Some(_) => Ok(()),
        }
    }

    // --- SpecializationCycles ---

    fn specialization_cycles(&self) -> Result<(), Violation> {
        for data in self.index.items() {
            let Some(ident) = data.identifiable() else {
                continue;
            };
            if ident.specializes.is_none() {
                continue;
            }
            if let Some(path) = self.index.specialization_cycle(&ident.id) {
                return Err(violation(
                    CheckKind::SpecializationCycles,
                    &ident.id,
                    Some("specializes"),
                    format!("specialization cycle: {}", path.join(" -> ")),
                    StatusCode::SpecializationCycle,
                ));
            }
        }
        Ok(())
    }

    // --- Cardinality ---

    fn cardinality(&self) -> Result<(), Violation> {
        for (id, data) in self.individuals() {
            let groups = group_by_class(data.properties());
            for (class, values) in &groups {
                if self.index.property_class(class).is_none() {
                    continue;
                }
                let (min, max) = self.bounds(class);
                if self.is_string(class) {
                    for (lang, count) in self.language_buckets(values) {
                        if count < min {
                            return Err(cardinality(id, class, format!(
                                "too few values for language {lang} ({count} < minCount {min})"
                            )));
                        }
                        if count > max {
                            return Err(cardinality(id, class, format!(
                                "too many values for language {lang} ({count} > maxCount {max})"
                            )));
                        }
                    }
                } else {
                    let count = values.len() as u64;
                    if count < u64::from(min) {
                        return Err(cardinality(id, class, format!(
                            "too few occurrences ({count} < minCount {min})"
                        )));
                    }
                    if count > u64::from(max) {
                        return Err(cardinality(id, class, format!(
                            "too many occurrences ({count} > maxCount {max})"
                        )));
                    }
                }
            }

            for required in self.eligible_properties_of(data).unwrap_or_default() {
                if groups.iter().any(|(c, _)| self.index.is_a(c, required)) {
                    continue;
                }
                if self.index.property_class(required).is_none() {
                    continue;
                }
                let (min, _) = self.bounds(required);
                if min > 0 {
                    let reason = if self.is_string(required) {
                        format!(
                            "too few values for language {} (0 < minCount {min})",
                            self.default_language
                        )
                    } else {
                        format!("too few occurrences (0 < minCount {min})")
                    };
                    return Err(cardinality(id, required, reason));
                }
            }
        }
        Ok(())
    }

    /// `(minCount, maxCount)` with defaults 0 and 1, inherited when absent.
    fn bounds(&self, class: &str) -> (u32, u32) {
        let min = self.index.inherited(class, |d| match d {
            ItemData::PropertyClass(p) => p.min_count,
            _ => None,
        });
        let max = self.index.inherited(class, |d| match d {
            ItemData::PropertyClass(p) => p.max_count,
            _ => None,
        });
        (min.unwrap_or(0), max.unwrap_or(1))
    }

    fn datatype(&self, class: &str) -> Option<Datatype> {
        self.index.inherited(class, |d| match d {
            ItemData::PropertyClass(p) => p.datatype(),
            _ => None,
        })
    }

    /// Undeclared datatypes count as strings.
    fn is_string(&self, class: &str) -> bool {
        matches!(self.datatype(class), None | Some(Datatype::String))
    }

    fn language_buckets(&self, values: &[&PropertyValue]) -> Vec<(String, u32)> {
        let mut buckets: Vec<(String, u32)> = Vec::new();
        for v in values {
            let lang = v.lang.as_deref().unwrap_or(self.default_language);
            match buckets.iter_mut().find(|(l, _)| l == lang) {
                Some((_, n)) => *n += 1,
                None => buckets.push((lang.to_string(), 1)),
            }
        }
        buckets
    }

    /// Union of `eligibleProperty` along the individual's class lineage;
    /// `None` when no class in the lineage restricts properties.
    fn eligible_properties_of(&self, data: &ItemData) -> Option<Vec<&'a str>> {
        let class = data.has_class()?;
        let mut allowed: Option<Vec<&'a str>> = None;
        for id in self.index.lineage(class) {
            let Some(list) = self
                .index
                .get(id)
                .and_then(ItemData::element)
                .and_then(|e| e.eligible_property.as_ref())
            else {
                continue;
            };
            let entry = allowed.get_or_insert_with(Vec::new);
            for p in list {
                if !entry.contains(&p.as_str()) {
                    entry.push(p);
                }
            }
        }
        allowed
    }

    // --- LinkTargets ---

    fn link_targets(&self) -> Result<(), Violation> {
        for data in self.index.items() {
            let id = item_id(data);
            for link in links_of(data) {
                let Some(target) = self.index.get(&link.id_ref) else {
                    return Err(violation(
                        CheckKind::LinkTargets,
                        id,
                        Some(&link.has_class),
                        format!("link target {} does not resolve", link.id_ref),
                        StatusCode::MissingReference,
                    ));
                };
                let endpoints = self.index.inherited(&link.has_class, |d| match d {
                    ItemData::LinkClass(l) => l.eligible_endpoint.clone(),
                    _ => None,
                });
                let Some(endpoints) = endpoints else {
                    continue;
                };
                let target_class = match target.kind() {
                    k if k.is_class() => item_id(target),
                    _ => target.has_class().unwrap_or_default(),
                };
                let lineage = self.index.lineage(target_class);
                let eligible = endpoints
                    .iter()
                    .any(|e| e == target_class || lineage.contains(&e.as_str()));
                if !eligible {
                    return Err(violation(
                        CheckKind::LinkTargets,
                        id,
                        Some(&link.has_class),
                        format!(
                            "target {} of class {target_class} is not an eligible endpoint",
                            link.id_ref
                        ),
                        StatusCode::NotEligible,
                    ));
                }
            }
        }
        Ok(())
    }

    // --- EligibleProperties ---

    fn eligible_properties(&self) -> Result<(), Violation> {
        for (id, data) in self.individuals() {
            let Some(allowed) = self.eligible_properties_of(data) else {
                continue;
            };
            for p in data.properties() {
                if !allowed.iter().any(|a| self.index.is_a(&p.has_class, a)) {
                    return Err(violation(
                        CheckKind::EligibleProperties,
                        id,
                        Some(&p.has_class),
                        format!(
                            "property {} is not eligible for class {}",
                            p.has_class,
                            data.has_class().unwrap_or_default()
                        ),
                        StatusCode::NotEligible,
                    ));
                }
            }
        }
        Ok(())
    }

    // --- EligibleLinks ---

    fn eligible_links(&self) -> Result<(), Violation> {
        for (id, data) in self.individuals() {
            let class = data.has_class().unwrap_or_default();
            match data {
                ItemData::EntityInstance(e) => {
                    let allowed = self.entity_target_links(class);
                    if let Some(allowed) = allowed {
                        self.links_allowed(id, class, "target", &e.has_target_link, &allowed)?;
                    }
                }
                ItemData::RelationshipInstance(r) => {
                    let source = self.index.inherited(class, |d| match d {
                        ItemData::RelationshipClass(c) => c.eligible_source_link.clone(),
                        _ => None,
                    });
                    let target = self.index.inherited(class, |d| match d {
                        ItemData::RelationshipClass(c) => c.eligible_target_link.clone(),
                        _ => None,
                    });
                    if let Some(source) = source {
                        self.links_allowed(id, class, "source", &r.has_source_link, &[source])?;
                    }
                    if let Some(target) = target {
                        self.links_allowed(id, class, "target", &r.has_target_link, &[target])?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn entity_target_links(&self, class: &str) -> Option<Vec<String>> {
        let mut allowed: Option<Vec<String>> = None;
        for id in self.index.lineage(class) {
            if let Some(ItemData::EntityClass(e)) = self.index.get(id) {
                if let Some(list) = &e.eligible_target_link {
                    allowed.get_or_insert_with(Vec::new).extend(list.iter().cloned());
                }
            }
        }
        allowed
    }

    fn links_allowed(
        &self,
        id: &str,
        class: &str,
        role: &str,
        links: &[LinkValue],
        allowed: &[String],
    ) -> Result<(), Violation> {
        for link in links {
            if !allowed.iter().any(|a| self.index.is_a(&link.has_class, a)) {
                return Err(violation(
                    CheckKind::EligibleLinks,
                    id,
                    Some(&link.has_class),
                    format!("{role} link {} is not eligible for class {class}", link.has_class),
                    StatusCode::NotEligible,
                ));
            }
        }
        Ok(())
    }

    // --- ValueConstraints ---

    fn value_constraints(&self) -> Result<(), Violation> {
        for data in self.index.items() {
            let id = item_id(data);
            let values: Vec<&PropertyValue> = match data {
                ItemData::PropertyValue(p) => vec![p],
                other => other.properties().iter().collect(),
            };
            for value in values {
                if let Err(reason) = self.check_value(value) {
                    return Err(violation(
                        CheckKind::ValueConstraints,
                        id,
                        Some(&value.has_class),
                        reason,
                        StatusCode::ValueConstraint,
                    ));
                }
            }
        }
        Ok(())
    }

    fn check_value(&self, value: &PropertyValue) -> Result<(), String> {
        let class = value.has_class.as_str();
        if self.index.property_class(class).is_none() {
            return Ok(());
        }
        let text = value.value.as_str();
        let datatype = self.datatype(class).unwrap_or(Datatype::String);
        if !parses_as(&datatype, text) {
            return Err(format!("{text:?} is not a valid {datatype:?} value"));
        }

        let facet = |f: fn(&crate::types::PropertyClass) -> Option<_>| {
            self.index.inherited(class, |d| match d {
                ItemData::PropertyClass(p) => f(p),
                _ => None,
            })
        };
        if let Some(max_length) = facet(|p| p.max_length.map(f64::from)) {
            let length = text.chars().count();
            if length as f64 > max_length {
                return Err(format!("{length} characters exceed maxLength {max_length}"));
            }
        }
        if let Some(pattern) = self.index.inherited(class, |d| match d {
            ItemData::PropertyClass(p) => p.pattern.clone(),
            _ => None,
        }) {
            if let Ok(re) = Regex::new(&format!("^(?:{pattern})$")) {
                if !re.is_match(text) {
                    return Err(format!("{text:?} does not match pattern {pattern:?}"));
                }
            }
        }
        if datatype.is_numeric() {
            let number: f64 = text.trim().parse().unwrap_or(f64::NAN);
            if let Some(min) = facet(|p| p.min_inclusive) {
                if number < min {
                    return Err(format!("{text} is below minInclusive {min}"));
                }
            }
            if let Some(max) = facet(|p| p.max_inclusive) {
                if number > max {
                    return Err(format!("{text} is above maxInclusive {max}"));
                }
            }
        }
        Ok(())
    }
}

// --- helpers -----------------------------------------------------------------

fn violation(
    check: CheckKind,
    item: &str,
    field: Option<&str>,
    reason: String,
    status: StatusCode,
) -> Violation {
    Violation {
        check,
        item: item.to_string(),
        field: field.map(str::to_string),
        reason,
        status,
    }
}

fn cardinality(item: &str, class: &str, reason: String) -> Violation {
    violation(
        CheckKind::Cardinality,
        item,
        Some(class),
        reason,
        StatusCode::CardinalityViolation,
    )
}

/// The id to report for an item; fragments at top level have none.
fn item_id(data: &ItemData) -> &str {
    data.identifiable()
        .map(|i| i.id.as_str())
        .unwrap_or_else(|| data.kind().tag())
}

fn links_of(data: &ItemData) -> Vec<&LinkValue> {
    match data {
        ItemData::SourceLinkValue(l) | ItemData::TargetLinkValue(l) => vec![l],
        other => other
            .source_links()
            .iter()
            .chain(other.target_links())
            .collect(),
    }
}

/// Fragments grouped by `hasClass`, in first-appearance order.
fn group_by_class(values: &[PropertyValue]) -> Vec<(&str, Vec<&PropertyValue>)> {
    let mut groups: Vec<(&str, Vec<&PropertyValue>)> = Vec::new();
    for v in values {
        match groups.iter_mut().find(|(c, _)| *c == v.has_class) {
            Some((_, list)) => list.push(v),
            None => groups.push((&v.has_class, vec![v])),
        }
    }
    groups
}

static DECIMAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").expect("invalid decimal regex")
});

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?P(\d+Y)?(\d+M)?(\d+D)?(T(\d+H)?(\d+M)?(\d+(\.\d+)?S)?)?$")
        .expect("invalid duration regex")
});

fn parses_as(datatype: &Datatype, text: &str) -> bool {
    let text = text.trim();
    match datatype {
        Datatype::String | Datatype::Other(_) => true,
        Datatype::Boolean => matches!(text, "true" | "false" | "1" | "0"),
        Datatype::Integer => text.parse::<i128>().is_ok(),
        Datatype::Decimal => DECIMAL_RE.is_match(text),
        Datatype::Double | Datatype::Float => {
            matches!(text, "INF" | "-INF" | "NaN") || text.parse::<f64>().is_ok()
        }
        Datatype::DateTime => {
            chrono::DateTime::parse_from_rfc3339(text).is_ok()
                || chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        }
        Datatype::Date => chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok(),
        Datatype::AnyUri => !text.is_empty() && !text.chars().any(char::is_whitespace),
        Datatype::Duration => {
            DURATION_RE.is_match(text) && text.len() > 1 && !text.ends_with('P') && !text.ends_with('T')
        }
    }
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        EntityClass, EntityInstance, Element, Identifiable, LinkClass, PropertyClass, AnElement,
    };

    fn property(id: &str, datatype: &str, min: u32, max: u32) -> ItemData {
        ItemData::PropertyClass(PropertyClass {
            identifiable: Identifiable::new(id),
            has_class: Some("pig:Property".into()),
            datatype: Some(datatype.into()),
            min_count: Some(min),
            max_count: Some(max),
            ..PropertyClass::default()
        })
    }

    fn entity_class(id: &str, eligible: Option<Vec<&str>>) -> ItemData {
        ItemData::EntityClass(EntityClass {
            identifiable: Identifiable::new(id),
            has_class: Some("pig:Entity".into()),
            element: Element {
                eligible_property: eligible.map(|v| v.into_iter().map(String::from).collect()),
                icon: None,
            },
            ..EntityClass::default()
        })
    }

    fn entity(id: &str, class: &str, props: Vec<(&str, &str, Option<&str>)>) -> ItemData {
        ItemData::EntityInstance(EntityInstance {
            identifiable: Identifiable::new(id),
            an_element: AnElement {
                has_property: props
                    .into_iter()
                    .map(|(c, v, l)| PropertyValue {
                        has_class: c.into(),
                        value: v.into(),
                        lang: l.map(String::from),
                    })
                    .collect(),
                ..AnElement::default()
            },
            has_class: class.into(),
            ..EntityInstance::default()
        })
    }

    fn run(items: &[ItemData], kinds: &[CheckKind]) -> Result<(), Violation> {
        let index = GraphIndex::new(items);
        check(&index, &CheckSet::only(kinds.iter().copied()), "en")
    }

    #[test]
    fn check_set_operations() {
        let set = CheckSet::all().without(CheckKind::Cardinality);
        assert!(!set.contains(CheckKind::Cardinality));
        assert_eq!(set.iter().next(), Some(CheckKind::DuplicateIds));
        assert_eq!("link-targets".parse::<CheckKind>(), Ok(CheckKind::LinkTargets));
        assert!("everything".parse::<CheckKind>().is_err());
    }

    #[test]
    fn duplicate_ids_detected() {
        let items = vec![entity_class("o:Pump", None), property("o:Pump", "xs:string", 0, 1)];
        let err = run(&items, &[CheckKind::DuplicateIds]).unwrap_err();
        assert_eq!(err.item, "o:Pump");
        assert_eq!(err.status(), StatusCode::DuplicateIdentifier);
    }

    #[test]
    fn class_reference_must_resolve_with_right_kind() {
        let items = vec![entity("d:p1", "o:Pump", vec![])];
        let err = run(&items, &[CheckKind::ClassReferences]).unwrap_err();
        assert_eq!(err.status(), StatusCode::MissingReference);

        let items = vec![
            property("o:Pump", "xs:string", 0, 1),
            entity("d:p1", "o:Pump", vec![]),
        ];
        let err = run(&items, &[CheckKind::ClassReferences]).unwrap_err();
        assert_eq!(err.status(), StatusCode::KindMismatch);
    }

    #[test]
    fn string_cardinality_is_per_language() {
        let items = vec![
            property("o:Name", "xs:string", 0, 2),
            entity_class("o:Pump", None),
            entity(
                "d:p1",
                "o:Pump",
                vec![
                    ("o:Name", "Pump", None),
                    ("o:Name", "Pumpe", Some("de")),
                    ("o:Name", "Pompe", Some("fr")),
                ],
            ),
        ];
        assert_eq!(run(&items, &[CheckKind::Cardinality]), Ok(()));
    }

    #[test]
    fn non_string_cardinality_counts_total() {
        let items = vec![
            property("o:Weight", "xs:double", 0, 1),
            entity_class("o:Pump", None),
            entity("d:p1", "o:Pump", vec![("o:Weight", "1", None), ("o:Weight", "2", None)]),
        ];
        let err = run(&items, &[CheckKind::Cardinality]).unwrap_err();
        assert!(err.reason.starts_with("too many occurrences"), "{err}");
        assert_eq!(err.field.as_deref(), Some("o:Weight"));
    }

    #[test]
    fn missing_required_property_reported() {
        let items = vec![
            property("o:Serial", "xs:string", 1, 1),
            entity_class("o:Pump", Some(vec!["o:Serial"])),
            entity("d:p1", "o:Pump", vec![]),
        ];
        let err = run(&items, &[CheckKind::Cardinality]).unwrap_err();
        assert_eq!(err.reason, "too few values for language en (0 < minCount 1)");
        assert_eq!(err.field.as_deref(), Some("o:Serial"));

        let items = vec![
            property("o:Weight", "xs:double", 1, 1),
            entity_class("o:Pump", Some(vec!["o:Weight"])),
            entity("d:p1", "o:Pump", vec![]),
        ];
        let err = run(&items, &[CheckKind::Cardinality]).unwrap_err();
        assert_eq!(err.reason, "too few occurrences (0 < minCount 1)");
    }

    #[test]
    fn cycles_reported_with_path() {
        let class = |id: &str, parent: &str| {
            ItemData::EntityClass(EntityClass {
                identifiable: Identifiable {
                    specializes: Some(parent.into()),
                    ..Identifiable::new(id)
                },
                ..EntityClass::default()
            })
        };
        let items = vec![class("o:A", "o:B"), class("o:B", "o:A")];
        let err = run(&items, &[CheckKind::SpecializationCycles]).unwrap_err();
        assert_eq!(err.reason, "specialization cycle: o:A -> o:B -> o:A");
        assert_eq!(err.status(), StatusCode::SpecializationCycle);
    }

    #[test]
    fn link_endpoints_follow_specialization() {
        let link = ItemData::LinkClass(LinkClass {
            identifiable: Identifiable::new("o:partOf"),
            has_class: Some("pig:Link".into()),
            eligible_endpoint: Some(vec!["o:Plant".into()]),
        });
        let sub = ItemData::EntityClass(EntityClass {
            identifiable: Identifiable {
                specializes: Some("o:Plant".into()),
                ..Identifiable::new("o:ChemicalPlant")
            },
            ..EntityClass::default()
        });
        let mut pump = entity("d:p1", "o:Pump", vec![]);
        if let ItemData::EntityInstance(e) = &mut pump {
            e.has_target_link.push(LinkValue {
                has_class: "o:partOf".into(),
                id_ref: "d:site".into(),
            });
        }
        let mut items = vec![
            link,
            entity_class("o:Plant", None),
            sub,
            entity_class("o:Pump", None),
            pump,
            entity("d:site", "o:ChemicalPlant", vec![]),
        ];
        assert_eq!(run(&items, &[CheckKind::LinkTargets]), Ok(()));

        items[5] = entity("d:site", "o:Pump", vec![]);
        let err = run(&items, &[CheckKind::LinkTargets]).unwrap_err();
        assert_eq!(err.status(), StatusCode::NotEligible);

        items.pop();
        let err = run(&items, &[CheckKind::LinkTargets]).unwrap_err();
        assert_eq!(err.status(), StatusCode::MissingReference);
    }

    #[test]
    fn eligible_properties_enforced() {
        let items = vec![
            property("o:Weight", "xs:double", 0, 1),
            property("o:Colour", "xs:string", 0, 1),
            entity_class("o:Pump", Some(vec!["o:Weight"])),
            entity("d:p1", "o:Pump", vec![("o:Colour", "red", None)]),
        ];
        let err = run(&items, &[CheckKind::EligibleProperties]).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("o:Colour"));
    }

    #[test]
    fn value_constraints() {
        let mut weight = property("o:Weight", "xs:double", 0, 1);
        if let ItemData::PropertyClass(p) = &mut weight {
            p.min_inclusive = Some(0.0);
        }
        let items = vec![
            weight.clone(),
            entity_class("o:Pump", None),
            entity("d:p1", "o:Pump", vec![("o:Weight", "heavy", None)]),
        ];
        assert!(run(&items, &[CheckKind::ValueConstraints]).is_err());

        let items = vec![
            weight,
            entity_class("o:Pump", None),
            entity("d:p1", "o:Pump", vec![("o:Weight", "-1", None)]),
        ];
        let err = run(&items, &[CheckKind::ValueConstraints]).unwrap_err();
        assert!(err.reason.contains("minInclusive"), "{err}");
    }

    #[test]
    fn datatype_parsing() {
        assert!(parses_as(&Datatype::Boolean, "true"));
        assert!(!parses_as(&Datatype::Integer, "1.5"));
        assert!(parses_as(&Datatype::Decimal, "-1.50"));
        assert!(parses_as(&Datatype::Date, "2025-03-01"));
        assert!(parses_as(&Datatype::DateTime, "2025-03-01T10:00:00Z"));
        assert!(parses_as(&Datatype::Duration, "P1DT2H"));
        assert!(!parses_as(&Datatype::Duration, "P"));
        assert!(!parses_as(&Datatype::AnyUri, "not a uri"));
    }

    #[test]
    fn violation_display() {
        let v = Violation {
            check: CheckKind::Cardinality,
            item: "d:p1".into(),
            field: Some("o:Name".into()),
            reason: "too many values for language de".into(),
            status: StatusCode::CardinalityViolation,
        };
        assert_eq!(v.to_string(), "cardinality: d:p1 [o:Name]: too many values for language de");
    }
}
