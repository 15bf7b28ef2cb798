//! Human-readable text rendering of items and [`Package`]s.
//!
//! The output is stable plain text for terminals and logs. It is not a wire
//! format; only JSON-LD and XML are.
//!
//! Rich text (`description`) is stored verbatim, markup included. Sanitation
//! happens here, at render time: [`sanitize_markup`] removes active content,
//! and the plain-text renderers additionally strip the remaining tags.

use std::sync::LazyLock;

use regex::Regex;

use crate::package::Package;
use crate::types::{preferred_text, ItemData, ItemKind, UNBOUNDED};

/// Render a single item as indented plain text.
///
/// ```text
/// [pig:anEntity] d:pump-1  "Pump 1"
/// class: o:Pump  modified: 2025-03-01T10:00:00Z
///
/// Properties:
///   o:Weight  100.5
///   o:Name  Pumpe (de)
///
/// Links:
///   o:partOf  → d:plant
/// ```
pub fn render_item(data: &ItemData, lang: &str) -> String {
    let mut out = String::new();

    // header line
    let kind = data.kind();
    match data.identifiable() {
        Some(ident) => {
            out.push_str(&format!("[{kind}] {}", ident.id));
            if let Some(title) = preferred_text(&ident.title, lang) {
                out.push_str(&format!("  \"{title}\""));
            }
        }
        None => out.push_str(&format!("[{kind}]")),
    }
    out.push('\n');

    // origin
    let mut origin = Vec::new();
    if let Some(parent) = data.identifiable().and_then(|i| i.specializes.as_deref()) {
        origin.push(format!("specializes: {parent}"));
    } else if let Some(class) = data.has_class().filter(|c| *c != kind.tag()) {
        origin.push(format!("class: {class}"));
    }
    if let Some(modified) = data.an_element().and_then(|e| e.modified.as_deref()) {
        origin.push(format!("modified: {modified}"));
    }
    if !origin.is_empty() {
        out.push_str(&origin.join("  "));
        out.push('\n');
    }

    if let Some(description) = data.identifiable().map(|i| i.description.as_slice()) {
        if let Some(text) = preferred_text(description, lang) {
            out.push('\n');
            out.push_str(&wrap_content(&plain_text(text), 80));
            out.push('\n');
        }
    }

    match data {
        ItemData::PropertyClass(p) => {
            let datatype = p.datatype.as_deref().unwrap_or("(inherited)");
            out.push_str(&format!(
                "\ndatatype: {datatype}  occurs: {}\n",
                occurs(p.min_count, p.max_count)
            ));
        }
        ItemData::LinkClass(l) => {
            if let Some(endpoints) = &l.eligible_endpoint {
                out.push_str(&format!("\nEligible endpoints: {}\n", list(endpoints)));
            }
        }
        ItemData::EntityClass(e) => {
            if let Some(props) = &e.element.eligible_property {
                out.push_str(&format!("\nEligible properties: {}\n", list(props)));
            }
            if let Some(links) = &e.eligible_target_link {
                out.push_str(&format!("Eligible target links: {}\n", list(links)));
            }
        }
        ItemData::RelationshipClass(r) => {
            if let Some(props) = &r.element.eligible_property {
                out.push_str(&format!("\nEligible properties: {}\n", list(props)));
            }
            if let Some(source) = &r.eligible_source_link {
                out.push_str(&format!("Source link: {source}\n"));
            }
            if let Some(target) = &r.eligible_target_link {
                out.push_str(&format!("Target link: {target}\n"));
            }
        }
        ItemData::PropertyValue(p) => {
            out.push_str(&format!("  {}  {}\n", p.has_class, value_text(&p.value, p.lang.as_deref())));
        }
        ItemData::SourceLinkValue(l) | ItemData::TargetLinkValue(l) => {
            out.push_str(&format!("  {}  → {}\n", l.has_class, l.id_ref));
        }
        ItemData::EntityInstance(_) | ItemData::RelationshipInstance(_) => {}
    }

    // embedded fragments
    if !data.properties().is_empty() {
        out.push_str("\nProperties:\n");
        for p in data.properties() {
            out.push_str(&format!("  {}  {}\n", p.has_class, value_text(&p.value, p.lang.as_deref())));
        }
    }
    let sources = data.source_links();
    let targets = data.target_links();
    if !sources.is_empty() || !targets.is_empty() {
        out.push_str("\nLinks:\n");
        for l in sources {
            out.push_str(&format!("  {}  ← {}\n", l.has_class, l.id_ref));
        }
        for l in targets {
            out.push_str(&format!("  {}  → {}\n", l.has_class, l.id_ref));
        }
    }

    out
}

/// Render a whole [`Package`] as a summary grouped by kind.
///
/// ```text
/// PIG Package d:package-1  "Pumps"  3 items
/// ─────────────────────────────────────────
///
/// PROPERTY CLASSES (1)
///   o:Weight  "Weight"  xs:double [0..1]
///
/// ENTITY CLASSES (1)
///   o:Pump  "Pump"
///
/// ENTITIES (1)
///   d:pump-1  "Pump 1"  (o:Pump)
/// ```
pub fn render_package(package: &Package, lang: &str) -> String {
    let header = package.header();
    let total = package.items().len();
    let mut title = String::from("PIG Package");
    if let Some(id) = &header.id {
        title.push_str(&format!(" {id}"));
    }
    if let Some(t) = preferred_text(&header.title, lang) {
        title.push_str(&format!("  \"{t}\""));
    }
    title.push_str(&format!("  {} item{}", total, if total == 1 { "" } else { "s" }));
    let rule = "─".repeat(title.chars().count());
    let mut out = format!("{title}\n{rule}\n");

    let groups = [
        (ItemKind::PropertyClass, "PROPERTY CLASSES"),
        (ItemKind::LinkClass, "LINK CLASSES"),
        (ItemKind::EntityClass, "ENTITY CLASSES"),
        (ItemKind::RelationshipClass, "RELATIONSHIP CLASSES"),
        (ItemKind::EntityInstance, "ENTITIES"),
        (ItemKind::RelationshipInstance, "RELATIONSHIPS"),
        (ItemKind::PropertyValue, "PROPERTY VALUES"),
        (ItemKind::SourceLinkValue, "SOURCE LINKS"),
        (ItemKind::TargetLinkValue, "TARGET LINKS"),
    ];

    for (kind, label) in &groups {
        let items: Vec<&ItemData> = package.valid_items().filter(|d| d.kind() == *kind).collect();
        if items.is_empty() {
            continue;
        }
        out.push('\n');
        out.push_str(&format!("{} ({})\n", label, items.len()));
        for data in items {
            out.push_str(&format!("  {}\n", summary_line(data, lang)));
        }
    }

    let invalid: Vec<_> = package.items().iter().filter(|i| !i.is_valid()).collect();
    if !invalid.is_empty() {
        out.push('\n');
        out.push_str(&format!("INVALID ({})\n", invalid.len()));
        for item in invalid {
            out.push_str(&format!(
                "  {}  [{}]\n",
                item.fixed_id().unwrap_or("(no id)"),
                item.kind()
            ));
        }
    }

    out
}

/// Remove active content from XHTML: `script`, `style`, `iframe`, `object`
/// and `embed` elements, `on*` event attributes, and `javascript:` URLs.
/// Other markup is kept.
pub fn sanitize_markup(markup: &str) -> String {
    let mut out = markup.to_string();
    for re in ACTIVE_BLOCK_RES.iter() {
        out = re.replace_all(&out, "").into_owned();
    }
    out = ACTIVE_TAG_RE.replace_all(&out, "").into_owned();
    out = EVENT_ATTR_RE.replace_all(&out, "").into_owned();
    JS_URL_RE.replace_all(&out, "$attr=\"#\"").into_owned()
}

/// Sanitized markup reduced to its text content.
pub fn plain_text(markup: &str) -> String {
    let sanitized = sanitize_markup(markup);
    let stripped = TAG_RE.replace_all(&sanitized, " ");
    let text = stripped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// --- helpers -----------------------------------------------------------------

const ACTIVE_ELEMENTS: [&str; 5] = ["script", "style", "iframe", "object", "embed"];

static ACTIVE_BLOCK_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ACTIVE_ELEMENTS
        .iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>"))
                .expect("invalid active element regex")
        })
        .collect()
});

static ACTIVE_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(script|style|iframe|object|embed)\b[^>]*>")
        .expect("invalid active tag regex")
});

static EVENT_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s+on[a-z]+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#)
        .expect("invalid event attribute regex")
});

static JS_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?P<attr>href|src)\s*=\s*("\s*javascript:[^"]*"|'\s*javascript:[^']*'|javascript:[^\s>]*)"#)
        .expect("invalid javascript url regex")
});

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("invalid tag regex"));

fn summary_line(data: &ItemData, lang: &str) -> String {
    let mut line = match data.identifiable() {
        Some(ident) => {
            let mut s = ident.id.clone();
            if let Some(t) = preferred_text(&ident.title, lang) {
                s.push_str(&format!("  \"{}\"", truncate(t, 60)));
            }
            s
        }
        None => String::new(),
    };
    match data {
        ItemData::PropertyClass(p) => {
            if let Some(datatype) = &p.datatype {
                line.push_str(&format!("  {datatype}"));
            }
            line.push_str(&format!(" [{}]", occurs(p.min_count, p.max_count)));
        }
        ItemData::EntityInstance(_) | ItemData::RelationshipInstance(_) => {
            if let Some(class) = data.has_class() {
                line.push_str(&format!("  ({class})"));
            }
        }
        ItemData::PropertyValue(p) => {
            line.push_str(&format!("{}  {}", p.has_class, value_text(&p.value, p.lang.as_deref())));
        }
        ItemData::SourceLinkValue(l) | ItemData::TargetLinkValue(l) => {
            line.push_str(&format!("{}  → {}", l.has_class, l.id_ref));
        }
        _ => {
            if let Some(parent) = data.identifiable().and_then(|i| i.specializes.as_deref()) {
                line.push_str(&format!("  < {parent}"));
            }
        }
    }
    line
}

fn occurs(min: Option<u32>, max: Option<u32>) -> String {
    let min = min.unwrap_or(0);
    match max.unwrap_or(1) {
        UNBOUNDED => format!("{min}..*"),
        max => format!("{min}..{max}"),
    }
}

fn value_text(value: &str, lang: Option<&str>) -> String {
    match lang {
        Some(lang) => format!("{} ({lang})", truncate(value, 60)),
        None => truncate(value, 60),
    }
}

fn list(ids: &[String]) -> String {
    if ids.is_empty() {
        "(none)".to_string()
    } else {
        ids.join(", ")
    }
}

fn wrap_content(content: &str, width: usize) -> String {
    if content.chars().count() <= width {
        return content.to_string();
    }
    let mut result = String::new();
    let mut line_len = 0usize;
    for word in content.split_whitespace() {
        let len = word.chars().count();
        if line_len > 0 && line_len + len + 1 > width {
            result.push('\n');
            line_len = 0;
        } else if line_len > 0 {
            result.push(' ');
            line_len += 1;
        }
        result.push_str(word);
        line_len += len;
    }
    result
}

fn truncate(s: &str, max: usize) -> String {
    let s = s.trim();
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

// --- tests -------------------------------------------------------------------
