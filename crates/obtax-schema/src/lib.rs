//! # obtax-schema — Taxonomy Resolution & Compilation
//!
//! Turns an Orange Button taxonomy document into statically typed field
//! schemas that a persistence layer and a presentation layer can both
//! consume without re-implementing any resolution logic.
//!
//! ## Pipeline
//!
//! - [`store`] loads the document once and answers lookups by name.
//! - [`classify`] decides whether a schema is an Element, Object or Array
//!   and, for Elements, which primitive superclass it inherits.
//! - [`item_type`] resolves item types (plain, enumerated, unit-bearing)
//!   and narrows them through item-type groups.
//! - [`element`] compiles an Element into its ordered facet descriptors.
//! - [`object`] compiles Objects recursively, memoising by
//!   `(name, overrides)`.
//! - [`usage`] derives which Objects embed a schema in an Array property.
//! - [`registry`] compiles a whole document once at start-up.
//!
//! ## Collaborator Interfaces
//!
//! - Persistence: [`FieldDescriptor::column_name`],
//!   [`CompiledObject::columns`], and value checking through
//!   [`FieldDescriptor::check`].
//! - Presentation: [`render_element`] / [`render_object`] with a
//!   [`PendingEdits`] injection point.
//!
//! ## Crate Policy
//!
//! - Depends only on `obtax-core` internally.
//! - The loaded document is never mutated; all compilation is a pure
//!   function of it and the caller's overrides.
//! - Structural taxonomy errors are returned, never defaulted.

pub mod classify;
pub mod element;
pub mod field;
pub mod item_type;
pub mod object;
pub mod presentation;
pub mod registry;
pub mod store;
pub mod usage;

pub use classify::{SchemaClassifier, SchemaDefinition, SchemaKind, SuperclassCategory};
pub use element::{CompiledElement, ElementCompiler, ValueOverrides};
pub use field::{
    Choice, Constraints, Facet, FacetValue, FieldDefault, FieldDescriptor, ValueKind,
    DECIMAL_MAX_DIGITS, DECIMAL_PLACES, STR_LEN,
};
pub use item_type::{grouped_values, ItemType, ItemTypeGroup, ItemTypeResolver, ItemTypeValue};
pub use object::{ArrayUsage, CompiledObject, NestedObject, ObjectCompiler, ObjectOverrides, PropertyElement};
pub use presentation::{render_element, render_object, MemoryRecord, PendingEdits, RecordSource};
pub use registry::CompiledRegistry;
pub use store::{TaxonomyDocument, TaxonomyStore};
pub use usage::{usages_of, UsageIndex, UsageRelation};
