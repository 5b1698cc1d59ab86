//! # Compiled Registry
//!
//! Compiles every Element and Object of a store once and keeps them by name,
//! together with the document-wide [`UsageIndex`]. Consumers resolve a schema
//! name to its compiled form here rather than recompiling or reflecting.
//!
//! Registry entries are compiled without overrides. Per-usage overrides live
//! on the owning Object's entry (its Element properties) or are requested
//! from an [`ObjectCompiler`] directly.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use obtax_core::{ProductKind, TaxonomyError};

use crate::classify::{SchemaDefinition, SchemaKind};
use crate::element::{CompiledElement, ValueOverrides};
use crate::object::{CompiledObject, ObjectCompiler, ObjectOverrides};
use crate::store::TaxonomyStore;
use crate::usage::UsageIndex;

/// Name → compiled schema for one taxonomy document.
#[derive(Debug, Clone, Default)]
pub struct CompiledRegistry {
    elements: BTreeMap<String, Arc<CompiledElement>>,
    objects: BTreeMap<String, Arc<CompiledObject>>,
    /// Array schema name → item schema name.
    arrays: BTreeMap<String, String>,
    usages: UsageIndex,
}

impl CompiledRegistry {
    /// Compile the whole store.
    ///
    /// # Errors
    ///
    /// The first structural error met. A taxonomy that does not fully
    /// compile yields no registry.
    pub fn build(store: &TaxonomyStore) -> Result<Self, TaxonomyError> {
        let compiler = ObjectCompiler::new(store);
        let mut registry = Self::default();

        for (name, defn) in store.schemas() {
            match defn {
                SchemaDefinition::Element(_) => {
                    let compiled = compiler.compile_element(name, &ValueOverrides::default())?;
                    registry.elements.insert(name.to_string(), compiled);
                }
                SchemaDefinition::Object(_) => {
                    let compiled = compiler.compile(name, &ObjectOverrides::new())?;
                    registry.objects.insert(name.to_string(), compiled);
                }
                SchemaDefinition::Array(a) => {
                    registry.arrays.insert(name.to_string(), a.items.clone());
                }
                SchemaDefinition::Unrecognized { reason } => {
                    return Err(TaxonomyError::MalformedSchema {
                        name: name.to_string(),
                        reason: reason.clone(),
                    });
                }
            }
        }
        registry.usages = UsageIndex::build(store);

        tracing::debug!(
            elements = registry.elements.len(),
            objects = registry.objects.len(),
            arrays = registry.arrays.len(),
            "compiled taxonomy registry"
        );
        Ok(registry)
    }

    pub fn kind_of(&self, name: &str) -> Option<SchemaKind> {
        if self.elements.contains_key(name) {
            Some(SchemaKind::Element)
        } else if self.objects.contains_key(name) {
            Some(SchemaKind::Object)
        } else if self.arrays.contains_key(name) {
            Some(SchemaKind::Array)
        } else {
            None
        }
    }

    pub fn element(&self, name: &str) -> Result<&Arc<CompiledElement>, TaxonomyError> {
        self.elements.get(name).ok_or_else(|| match self.kind_of(name) {
            Some(_) => TaxonomyError::NotAnElement(name.to_string()),
            None => TaxonomyError::UnknownSchema(name.to_string()),
        })
    }

    pub fn object(&self, name: &str) -> Result<&Arc<CompiledObject>, TaxonomyError> {
        self.objects.get(name).ok_or_else(|| match self.kind_of(name) {
            Some(_) => TaxonomyError::NotAnObject(name.to_string()),
            None => TaxonomyError::UnknownSchema(name.to_string()),
        })
    }

    /// The compiled Object a Product of `kind` is stored as.
    pub fn product(&self, kind: ProductKind) -> Result<&Arc<CompiledObject>, TaxonomyError> {
        self.object(kind.schema_name())
    }

    /// Item schema of a named Array schema.
    pub fn array_items(&self, name: &str) -> Option<&str> {
        self.arrays.get(name).map(String::as_str)
    }

    pub fn elements(&self) -> impl Iterator<Item = &Arc<CompiledElement>> {
        self.elements.values()
    }

    pub fn objects(&self) -> impl Iterator<Item = &Arc<CompiledObject>> {
        self.objects.values()
    }

    pub fn usages(&self) -> &UsageIndex {
        &self.usages
    }

    /// Objects embedding `target` in an Array property.
    pub fn usages_of(&self, target: &str) -> BTreeSet<&str> {
        self.usages.owners_of(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> TaxonomyStore {
        TaxonomyStore::from_value(&json!({
            "schemas": {
                "ProdCode": {"allOf": [
                    {"$ref": "#/components/schemas/TaxonomyElementString"},
                    {"x-ob-item-type": "String"}
                ]},
                "Product": {"type": "object", "properties": {
                    "ProdCode": {},
                    "Packages": {"$ref": "#/components/schemas/Packages"}
                }},
                "ProdBattery": {"allOf": [
                    {"$ref": "#/components/schemas/Product"},
                    {"type": "object", "properties": {}}
                ]},
                "Packages": {"type": "array", "items": {"$ref": "#/components/schemas/Package"}},
                "Package": {"type": "object", "properties": {"ProdCode": {}}}
            },
            "item-types": {"String": {"description": ""}}
        }))
        .unwrap()
    }

    #[test]
    fn builds_every_schema() {
        let r = CompiledRegistry::build(&store()).unwrap();
        assert_eq!(r.kind_of("ProdCode"), Some(SchemaKind::Element));
        assert_eq!(r.kind_of("Product"), Some(SchemaKind::Object));
        assert_eq!(r.kind_of("Packages"), Some(SchemaKind::Array));
        assert_eq!(r.kind_of("Nope"), None);
        assert_eq!(r.array_items("Packages"), Some("Package"));
        assert_eq!(r.elements().count(), 1);
        assert_eq!(r.objects().count(), 3);
    }

    #[test]
    fn shares_compiled_elements() {
        let r = CompiledRegistry::build(&store()).unwrap();
        let top = r.element("ProdCode").unwrap();
        let owned = &r.object("Package").unwrap().elements[0].element;
        assert!(Arc::ptr_eq(top, owned));
    }

    #[test]
    fn lookups_report_the_right_error() {
        let r = CompiledRegistry::build(&store()).unwrap();
        assert!(matches!(r.element("Product"), Err(TaxonomyError::NotAnElement(_))));
        assert!(matches!(r.object("ProdCode"), Err(TaxonomyError::NotAnObject(_))));
        assert!(matches!(r.object("Nope"), Err(TaxonomyError::UnknownSchema(_))));
    }

    #[test]
    fn products_resolve_by_kind() {
        let r = CompiledRegistry::build(&store()).unwrap();
        assert_eq!(r.product(ProductKind::Generic).unwrap().name, "Product");
        let battery = r.product(ProductKind::Battery).unwrap();
        assert_eq!(battery.parent.as_deref(), Some("Product"));
        assert!(matches!(
            r.product(ProductKind::Inverter),
            Err(TaxonomyError::UnknownSchema(_))
        ));
    }

    #[test]
    fn carries_the_usage_index() {
        let r = CompiledRegistry::build(&store()).unwrap();
        assert_eq!(r.usages_of("Package"), BTreeSet::from(["Product"]));
        assert!(r.usages_of("Product").is_empty());
    }

    #[test]
    fn malformed_schemas_fail_the_build() {
        let s = TaxonomyStore::from_value(&json!({
            "schemas": {"Broken": {"type": "array"}}
        }))
        .unwrap();
        assert!(matches!(
            CompiledRegistry::build(&s),
            Err(TaxonomyError::MalformedSchema { .. })
        ));
    }
}
