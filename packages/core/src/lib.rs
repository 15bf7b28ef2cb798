//! Core library of the Product Information Graph (PIG).
//!
//! This crate provides the item model, the JSON-LD and XML wire codec,
//! structural-schema validation, and the whole-graph consistency checker that
//! make up a PIG implementation. It is the foundation for the `pig` CLI.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`types`] | Item kinds, attribute groups, and one struct per kind |
//! | [`item`] | [`Item`]: a validated item of fixed kind with immutable identity |
//! | [`validation`] | Per-item text and semantic checks via [`validate_data`] |
//! | [`schema`] | JSON Schema validation, schema loaders, and [`SchemaCache`] |
//! | [`codec`] | JSON-LD / XML documents ⇄ internal item values |
//! | [`package`] | [`Package`] import/export and the [`ImportReport`] |
//! | [`graph`] | [`GraphIndex`]: id/kind lookups and specialization chains |
//! | [`checker`] | Whole-graph [`check`] with selectable [`CheckKind`]s |
//! | [`render`] | Human-readable text rendering of items and packages |
//! | [`status`] | Numeric [`StatusCode`]s shared by every error |
//!
//! # Quick start
//!
//! ```rust,ignore
//! use pig::{CompiledSchemas, Format, ImportOptions, Package};
//!
//! let schemas = CompiledSchemas::embedded()?;
//! let document = std::fs::read_to_string("pumps.jsonld")?;
//! let (package, report) =
//!     Package::import(&document, Format::JsonLd, &schemas, &ImportOptions::default())?;
//!
//! println!("{}", report.summary()); // "5 of 5 items instantiated"
//! let xml = package.export(Format::Xml)?;
//! ```

pub mod checker;
pub mod codec;
pub mod graph;
pub mod item;
pub mod package;
pub mod render;
pub mod schema;
pub mod status;
pub mod types;
pub mod validation;

pub use checker::{check, CheckKind, CheckSet, Violation};
pub use codec::{CodecError, CodecOptions, Format, RawItem, RawPackage};
pub use graph::GraphIndex;
pub use item::Item;
pub use package::{ImportOptions, ImportReport, ItemFailure, Package, PackageError};
pub use schema::{
    CompiledSchemas, DirectorySchemas, EmbeddedSchemas, SchemaCache, SchemaError, SchemaLoader,
    SchemaOutcome, SchemaValidator,
};
pub use status::StatusCode;
pub use types::{ItemData, ItemKind, LanguageText, PackageHeader};
pub use validation::{validate_data, ItemError};
