//! Structural-schema validation of internal item values.
//!
//! The item model only needs the synchronous [`SchemaValidator`] capability.
//! Where the schema documents come from is behind [`SchemaLoader`]:
//!
//! | Loader | Source |
//! |--------|--------|
//! | [`EmbeddedSchemas`] | JSON Schema documents compiled into this crate |
//! | [`DirectorySchemas`] | `<dir>/<kind>.json` on the local filesystem |
//!
//! Loading is the only asynchronous step of an import. [`SchemaCache`] loads
//! and compiles every schema once and hands out the same
//! [`Arc<CompiledSchemas>`] for as long as the cache lives; callers keep one
//! cache per process.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::status::StatusCode;
use crate::types::ItemKind;

/// Result of checking one value against the schema of its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaOutcome {
    pub valid: bool,
    /// Empty when valid; otherwise one `path: message` line per problem.
    pub diagnostics: String,
}

impl SchemaOutcome {
    pub fn pass() -> Self {
        Self {
            valid: true,
            diagnostics: String::new(),
        }
    }

    pub fn fail(diagnostics: impl Into<String>) -> Self {
        Self {
            valid: false,
            diagnostics: diagnostics.into(),
        }
    }
}

/// The structural check the item model depends on.
pub trait SchemaValidator {
    fn validate(&self, kind: ItemKind, value: &Value) -> SchemaOutcome;
}

/// Errors raised while loading or compiling schema documents.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to load schema for {kind}: {reason}")]
    Load { kind: ItemKind, reason: String },

    #[error("schema for {kind} is not valid JSON: {source}")]
    Parse {
        kind: ItemKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("schema for {kind} does not compile: {reason}")]
    Compile { kind: ItemKind, reason: String },
}

impl SchemaError {
    pub fn status(&self) -> StatusCode {
        StatusCode::SchemaLoad
    }
}

/// Fetches the schema document for one item kind.
#[async_trait]
pub trait SchemaLoader: Send + Sync {
    async fn load(&self, kind: ItemKind) -> Result<Value, SchemaError>;
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

/// The schema documents shipped with this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedSchemas;

impl EmbeddedSchemas {
    pub fn source(kind: ItemKind) -> &'static str {
        match kind {
            ItemKind::PropertyClass => include_str!("../schemas/property-class.json"),
            ItemKind::LinkClass => include_str!("../schemas/link-class.json"),
            ItemKind::EntityClass => include_str!("../schemas/entity-class.json"),
            ItemKind::RelationshipClass => include_str!("../schemas/relationship-class.json"),
            ItemKind::EntityInstance => include_str!("../schemas/entity-instance.json"),
            ItemKind::RelationshipInstance => include_str!("../schemas/relationship-instance.json"),
            ItemKind::PropertyValue => include_str!("../schemas/property-value.json"),
            ItemKind::SourceLinkValue => include_str!("../schemas/source-link-value.json"),
            ItemKind::TargetLinkValue => include_str!("../schemas/target-link-value.json"),
            ItemKind::Package => include_str!("../schemas/package.json"),
        }
    }

    fn parse(kind: ItemKind) -> Result<Value, SchemaError> {
        serde_json::from_str(Self::source(kind)).map_err(|source| SchemaError::Parse { kind, source })
    }
}

#[async_trait]
impl SchemaLoader for EmbeddedSchemas {
    async fn load(&self, kind: ItemKind) -> Result<Value, SchemaError> {
        Self::parse(kind)
    }
}

/// Reads `<dir>/<schema-name>.json`, e.g. `schemas/entity-class.json`.
#[derive(Debug, Clone)]
pub struct DirectorySchemas {
    dir: PathBuf,
}

impl DirectorySchemas {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, kind: ItemKind) -> PathBuf {
        self.dir.join(format!("{}.json", kind.schema_name()))
    }
}

#[async_trait]
impl SchemaLoader for DirectorySchemas {
    async fn load(&self, kind: ItemKind) -> Result<Value, SchemaError> {
        let path = self.path_for(kind);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| SchemaError::Load {
                kind,
                reason: format!("{}: {e}", path.display()),
            })?;
        serde_json::from_str(&text).map_err(|source| SchemaError::Parse { kind, source })
    }
}

// ---------------------------------------------------------------------------
// CompiledSchemas
// ---------------------------------------------------------------------------

/// One compiled JSON Schema validator per item kind.
pub struct CompiledSchemas {
    validators: HashMap<ItemKind, jsonschema::Validator>,
}

impl std::fmt::Debug for CompiledSchemas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledSchemas")
            .field("kinds", &self.validators.len())
            .finish()
    }
}

impl CompiledSchemas {
    /// Load and compile the schema of every kind through `loader`.
    pub async fn load(loader: &dyn SchemaLoader) -> Result<Self, SchemaError> {
        let mut documents = Vec::with_capacity(ItemKind::ALL.len());
        for kind in ItemKind::ALL {
            documents.push((kind, loader.load(kind).await?));
        }
        Self::compile(documents)
    }

    /// Compile the embedded schemas without going through a runtime.
    pub fn embedded() -> Result<Self, SchemaError> {
        let documents = ItemKind::ALL
            .into_iter()
            .map(|kind| EmbeddedSchemas::parse(kind).map(|doc| (kind, doc)))
            .collect::<Result<Vec<_>, _>>()?;
        Self::compile(documents)
    }

    fn compile(documents: Vec<(ItemKind, Value)>) -> Result<Self, SchemaError> {
        let mut validators = HashMap::with_capacity(documents.len());
        for (kind, document) in documents {
            let validator = jsonschema::validator_for(&document).map_err(|e| {
                SchemaError::Compile {
                    kind,
                    reason: e.to_string(),
                }
            })?;
            validators.insert(kind, validator);
        }
        tracing::debug!(kinds = validators.len(), "compiled item schemas");
        Ok(Self { validators })
    }
}

impl SchemaValidator for CompiledSchemas {
    fn validate(&self, kind: ItemKind, value: &Value) -> SchemaOutcome {
        let Some(validator) = self.validators.get(&kind) else {
            return SchemaOutcome::fail(format!("no schema registered for {kind}"));
        };
        let errors: Vec<String> = validator
            .iter_errors(value)
            .map(|e| format!("{}: {}", e.instance_path, e))
            .collect();
        if errors.is_empty() {
            SchemaOutcome::pass()
        } else {
            SchemaOutcome::fail(errors.join("; "))
        }
    }
}

// ---------------------------------------------------------------------------
// SchemaCache
// ---------------------------------------------------------------------------

/// Loads schemas on first use and returns the same compiled set afterwards.
pub struct SchemaCache {
    loader: Box<dyn SchemaLoader>,
    compiled: OnceCell<Arc<CompiledSchemas>>,
}

impl SchemaCache {
    pub fn new(loader: impl SchemaLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            compiled: OnceCell::new(),
        }
    }

    /// The compiled schemas, loading them if this is the first call.
    ///
    /// A failed load is not cached; the next call retries.
    pub async fn get(&self) -> Result<Arc<CompiledSchemas>, SchemaError> {
        self.compiled
            .get_or_try_init(|| async {
                tracing::info!("loading item schemas");
                CompiledSchemas::load(self.loader.as_ref()).await.map(Arc::new)
            })
            .await
            .cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.compiled.initialized()
    }
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLoader {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SchemaLoader for CountingLoader {
        async fn load(&self, kind: ItemKind) -> Result<Value, SchemaError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            EmbeddedSchemas.load(kind).await
        }
    }

    #[test]
    fn embedded_schemas_compile() {
        let schemas = CompiledSchemas::embedded().unwrap();
        assert_eq!(schemas.validators.len(), ItemKind::ALL.len());
    }

    #[test]
    fn valid_entity_class_passes() {
        let schemas = CompiledSchemas::embedded().unwrap();
        let value = json!({
            "itemType": "pig:Entity",
            "id": "o:Pump",
            "hasClass": "pig:Entity",
            "title": [{ "value": "Pump", "lang": "en" }],
            "eligibleProperty": ["o:Weight"]
        });
        assert_eq!(schemas.validate(ItemKind::EntityClass, &value), SchemaOutcome::pass());
    }

    #[test]
    fn unknown_field_and_bad_id_fail_with_diagnostics() {
        let schemas = CompiledSchemas::embedded().unwrap();
        let value = json!({
            "itemType": "pig:Entity",
            "id": "not an id",
            "colour": "red"
        });
        let outcome = schemas.validate(ItemKind::EntityClass, &value);
        assert!(!outcome.valid);
        assert!(outcome.diagnostics.contains("/id"), "{}", outcome.diagnostics);
    }

    #[test]
    fn wrong_item_type_fails() {
        let schemas = CompiledSchemas::embedded().unwrap();
        let value = json!({ "itemType": "pig:Link", "id": "o:Pump" });
        assert!(!schemas.validate(ItemKind::EntityClass, &value).valid);
    }

    #[tokio::test]
    async fn cache_loads_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = SchemaCache::new(CountingLoader {
            calls: Arc::clone(&calls),
        });
        assert!(!cache.is_loaded());
        let first = cache.get().await.unwrap();
        let second = cache.get().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), ItemKind::ALL.len());
        assert!(cache.is_loaded());
    }

    #[tokio::test]
    async fn directory_loader_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        for kind in ItemKind::ALL {
            let path = dir.path().join(format!("{}.json", kind.schema_name()));
            std::fs::write(path, EmbeddedSchemas::source(kind)).unwrap();
        }
        let cache = SchemaCache::new(DirectorySchemas::new(dir.path()));
        let schemas = cache.get().await.unwrap();
        let value = json!({ "itemType": "pig:aPackage" });
        assert!(schemas.validate(ItemKind::Package, &value).valid);
    }

    #[tokio::test]
    async fn directory_loader_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loader = DirectorySchemas::new(dir.path());
        let err = loader.load(ItemKind::LinkClass).await.unwrap_err();
        assert!(matches!(err, SchemaError::Load { kind: ItemKind::LinkClass, .. }));
    }
}
