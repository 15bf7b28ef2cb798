use serde_json::Value;

use crate::schema::SchemaValidator;
use crate::types::{ItemData, ItemKind, LanguageText};
use crate::validation::{validate_data, ItemError};

/// A graph item of a fixed kind.
///
/// The kind is chosen at construction and never changes. Content is replaced
/// through [`Item::set`], which validates the new value and either stores it
/// or leaves the item invalid. An invalid item answers every getter with
/// `None`; it still remembers the identity it had, so later updates cannot
/// change `id` or `specializes` once set.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    kind: ItemKind,
    fixed_id: Option<String>,
    fixed_specializes: Option<String>,
    data: Option<ItemData>,
}

impl Item {
    /// An empty (invalid) item of `kind`.
    pub fn new(kind: ItemKind) -> Self {
        Self {
            kind,
            fixed_id: None,
            fixed_specializes: None,
            data: None,
        }
    }

    /// Build and validate an item in one step.
    pub fn from_value(
        kind: ItemKind,
        value: Value,
        schemas: &dyn SchemaValidator,
    ) -> Result<Self, ItemError> {
        let mut item = Self::new(kind);
        item.set(value, schemas)?;
        Ok(item)
    }

    /// Replace the item's content with `value` (internal shape).
    ///
    /// # Panics
    ///
    /// If `value` declares an `itemType` other than this item's kind.
    pub fn set(&mut self, value: Value, schemas: &dyn SchemaValidator) -> Result<(), ItemError> {
        let result = self.validate(value, schemas);
        match result {
            Ok(data) => {
                if let Some(ident) = data.identifiable() {
                    self.fixed_id.get_or_insert_with(|| ident.id.clone());
                    if let Some(parent) = &ident.specializes {
                        self.fixed_specializes.get_or_insert_with(|| parent.clone());
                    }
                }
                self.data = Some(data);
                Ok(())
            }
            Err(e) => {
                self.data = None;
                Err(e)
            }
        }
    }

    fn validate(&self, mut value: Value, schemas: &dyn SchemaValidator) -> Result<ItemData, ItemError> {
        let Some(map) = value.as_object_mut() else {
            return Err(ItemError::Malformed {
                kind: self.kind,
                reason: "expected an object".into(),
            });
        };
        match map.get("itemType") {
            Some(Value::String(declared)) if declared != self.kind.tag() => {
                panic!("item kind is fixed: {} cannot become {declared}", self.kind)
            }
            Some(Value::String(_)) => {}
            Some(other) => panic!("item kind is fixed: {} cannot become {other}", self.kind),
            None => {
                map.insert("itemType".into(), Value::String(self.kind.tag().into()));
            }
        }

        let outcome = schemas.validate(self.kind, &value);
        if !outcome.valid {
            return Err(ItemError::Schema {
                kind: self.kind,
                diagnostics: outcome.diagnostics,
            });
        }

        self.check_immutable("id", self.fixed_id.as_deref(), value.get("id"))?;
        self.check_immutable(
            "specializes",
            self.fixed_specializes.as_deref(),
            value.get("specializes"),
        )?;

        let data = ItemData::from_value(self.kind, value).map_err(|e| ItemError::Malformed {
            kind: self.kind,
            reason: e.to_string(),
        })?;
        validate_data(&data)?;
        Ok(data)
    }

    fn check_immutable(
        &self,
        field: &'static str,
        fixed: Option<&str>,
        now: Option<&Value>,
    ) -> Result<(), ItemError> {
        let Some(was) = fixed else {
            return Ok(());
        };
        let now = now.and_then(Value::as_str);
        if now == Some(was) {
            return Ok(());
        }
        Err(ItemError::Immutable {
            field,
            was: was.to_string(),
            now: now.map(str::to_string),
        })
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn is_valid(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&ItemData> {
        self.data.as_ref()
    }

    pub fn id(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(ItemData::identifiable)
            .map(|i| i.id.as_str())
    }

    pub fn specializes(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(ItemData::identifiable)
            .and_then(|i| i.specializes.as_deref())
    }

    pub fn has_class(&self) -> Option<&str> {
        self.data.as_ref().and_then(ItemData::has_class)
    }

    pub fn title(&self) -> Option<&[LanguageText]> {
        self.data
            .as_ref()
            .and_then(ItemData::identifiable)
            .map(|i| i.title.as_slice())
    }

    /// The identifier the item was first given, even while invalid.
    pub fn fixed_id(&self) -> Option<&str> {
        self.fixed_id.as_deref()
    }

    /// Internal representation, `None` while invalid.
    pub fn to_value(&self) -> Option<Value> {
        self.data.as_ref().and_then(|d| d.to_value().ok())
    }
}

// --- tests ---
