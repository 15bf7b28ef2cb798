//! The package: a metadata header plus an ordered list of top-level items.
//!
//! [`Package::import`] is the whole pipeline: decode the document, build and
//! validate every item, then run the consistency checker over the items that
//! passed. One bad item never aborts the import; it is recorded in the
//! [`ImportReport`] and left out of the graph.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::checker::{self, CheckSet, Violation};
use crate::codec::{self, CodecError, CodecOptions, Format, RawItem, RawPackage};
use crate::graph::GraphIndex;
use crate::item::Item;
use crate::schema::{SchemaCache, SchemaError, SchemaValidator};
use crate::status::StatusCode;
use crate::types::{ItemData, ItemKind, PackageHeader};
use crate::validation::{validate_text, ItemError};

/// Options for [`Package::import`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOptions {
    pub codec: CodecOptions,
    /// Consistency checks to run after item validation.
    pub checks: CheckSet,
}

impl ImportOptions {
    pub fn from_env() -> Self {
        Self {
            codec: CodecOptions::from_env(),
            checks: CheckSet::all(),
        }
    }
}

/// One top-level item that could not be instantiated.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFailure {
    /// Position of the item in the document.
    pub index: usize,
    pub id: Option<String>,
    pub error: ItemError,
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "item {} ({}): [{}] {}",
            self.index,
            self.id.as_deref().unwrap_or("no id"),
            self.error.status(),
            self.error
        )
    }
}

/// Outcome of an import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub total: usize,
    pub instantiated: usize,
    pub failures: Vec<ItemFailure>,
    pub consistency: Result<(), Violation>,
}

impl ImportReport {
    /// E.g. `"4 of 5 items instantiated"`.
    pub fn summary(&self) -> String {
        format!("{} of {} items instantiated", self.instantiated, self.total)
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.consistency.is_ok()
    }

    /// The consistency violation if there is one, else the first item failure.
    pub fn status(&self) -> StatusCode {
        match (&self.consistency, self.failures.first()) {
            (Err(v), _) => v.status(),
            (Ok(()), Some(failure)) => failure.error.status(),
            (Ok(()), None) => StatusCode::Ok,
        }
    }
}

/// Errors that abort an import as a whole.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("package header is invalid: {0}")]
    Header(ItemError),
}

impl PackageError {
    pub fn status(&self) -> StatusCode {
        match self {
            PackageError::Codec(e) => e.status(),
            PackageError::Schema(e) => e.status(),
            PackageError::Header(e) => e.status(),
        }
    }
}

/// A package owns its items, valid or not, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Package {
    header: PackageHeader,
    context: BTreeMap<String, String>,
    items: Vec<Item>,
}

impl Package {
    pub fn new(header: PackageHeader) -> Self {
        Self {
            header,
            ..Self::default()
        }
    }

    /// Decode, validate, and check a document.
    pub fn import(
        document: &str,
        format: Format,
        schemas: &dyn SchemaValidator,
        options: &ImportOptions,
    ) -> Result<(Self, ImportReport), PackageError> {
        let raw = codec::decode(document, format, &options.codec)?;
        Self::from_raw(raw, schemas, options)
    }

    /// [`Package::import`] with schemas taken from `cache`, loading them on
    /// first use.
    pub async fn import_cached(
        document: &str,
        format: Format,
        cache: &SchemaCache,
        options: &ImportOptions,
    ) -> Result<(Self, ImportReport), PackageError> {
        let schemas = cache.get().await?;
        Self::import(document, format, schemas.as_ref(), options)
    }

    /// Validate an already decoded package.
    pub fn from_raw(
        raw: RawPackage,
        schemas: &dyn SchemaValidator,
        options: &ImportOptions,
    ) -> Result<(Self, ImportReport), PackageError> {
        let header = read_header(raw.header, schemas).map_err(PackageError::Header)?;
        let mut package = Self {
            header,
            context: raw.context,
            items: Vec::with_capacity(raw.items.len()),
        };

        let total = raw.items.len();
        let mut failures = Vec::new();
        for (index, raw_item) in raw.items.into_iter().enumerate() {
            let id = raw_item.id().map(str::to_string);
            match instantiate(raw_item, schemas) {
                Ok(item) => package.items.push(item),
                Err((item, error)) => {
                    tracing::debug!(index, id = ?id, %error, "item failed validation");
                    failures.push(ItemFailure { index, id, error });
                    if let Some(item) = item {
                        package.items.push(item);
                    }
                }
            }
        }

        let consistency = package.check(&options.checks, &options.codec.default_language);
        let report = ImportReport {
            total,
            instantiated: total - failures.len(),
            failures,
            consistency,
        };
        tracing::info!(
            total = report.total,
            instantiated = report.instantiated,
            consistent = report.consistency.is_ok(),
            "{}",
            report.summary()
        );
        Ok((package, report))
    }

    /// Encode the valid items, with header and namespaces, as `format`.
    pub fn export(&self, format: Format) -> Result<String, CodecError> {
        codec::encode(&self.to_raw()?, format)
    }

    pub fn to_raw(&self) -> Result<RawPackage, CodecError> {
        let header = match serde_json::to_value(&self.header)? {
            Value::Object(map) => map,
            _ => Default::default(),
        };
        let items = self
            .valid_items()
            .map(|data| data.to_value().map(RawItem::new))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RawPackage {
            context: self.context.clone(),
            header,
            items,
        })
    }

    /// Run consistency checks over the valid items.
    pub fn check(&self, requested: &CheckSet, default_language: &str) -> Result<(), Violation> {
        checker::check(&self.index(), requested, default_language)
    }

    /// A lookup index over the valid items.
    pub fn index(&self) -> GraphIndex<'_> {
        GraphIndex::new(self.valid_items())
    }

    /// Add an item built from an internal value. The item is kept even when
    /// invalid, and the error is returned.
    pub fn add(
        &mut self,
        kind: ItemKind,
        value: Value,
        schemas: &dyn SchemaValidator,
    ) -> Result<(), ItemError> {
        let mut item = Item::new(kind);
        let result = item.set(value, schemas);
        self.items.push(item);
        result
    }

    pub fn header(&self) -> &PackageHeader {
        &self.header
    }

    pub fn context(&self) -> &BTreeMap<String, String> {
        &self.context
    }

    /// Every item, valid or not, in document order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [Item] {
        &mut self.items
    }

    pub fn valid_items(&self) -> impl Iterator<Item = &ItemData> {
        self.items.iter().filter_map(Item::data)
    }

    /// The first valid item with `id`.
    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id() == Some(id))
    }
}

// --- helpers -----------------------------------------------------------------

fn read_header(
    mut header: serde_json::Map<String, Value>,
    schemas: &dyn SchemaValidator,
) -> Result<PackageHeader, ItemError> {
    let kind = ItemKind::Package;
    header
        .entry("itemType")
        .or_insert_with(|| Value::String(kind.tag().into()));
    let value = Value::Object(header);
    let outcome = schemas.validate(kind, &value);
    if !outcome.valid {
        return Err(ItemError::Schema {
            kind,
            diagnostics: outcome.diagnostics,
        });
    }
    let header: PackageHeader = serde_json::from_value(value).map_err(|e| ItemError::Malformed {
        kind,
        reason: e.to_string(),
    })?;
    validate_text("title", &header.title)?;
    validate_text("description", &header.description)?;
    Ok(header)
}

/// Build one item; on failure, the invalid item (if its kind was known) comes
/// back with the error.
fn instantiate(
    raw: RawItem,
    schemas: &dyn SchemaValidator,
) -> Result<Item, (Option<Item>, ItemError)> {
    let Some(kind) = raw.kind else {
        return Err((None, ItemError::UnknownKind(raw.declared)));
    };
    let mut item = Item::new(kind);
    match item.set(raw.value, schemas) {
        Ok(()) => Ok(item),
        Err(e) => Err((Some(item), e)),
    }
}

// --- tests -------------------------------------------------------------------
