//! # Object Compilation
//!
//! Compiles an Object into its owned Elements, owned sub-Objects and Array
//! usages. Properties are visited in name order. Element properties pick up
//! the caller's per-property [`ValueOverrides`]; nested Objects always
//! compile with no overrides; Arrays are recorded as `(property, item)` and
//! not expanded.
//!
//! ## Memoisation
//!
//! The same Element or Object is typically reachable from many owners.
//! [`ObjectCompiler`] keeps every compiled result behind an `Arc`, keyed by
//! `(name, overrides)`, so each distinct pair is compiled once per compiler.
//! The caches use `parking_lot::RwLock`; the compiler can be shared by
//! reference across threads.
//!
//! ## Cycles
//!
//! Object-to-Object composition is expected to be acyclic. Revisiting a name
//! already on the current compilation path fails with `CyclicSchema`
//! carrying the offending path.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use obtax_core::TaxonomyError;

use crate::classify::{PropertyTarget, SchemaClassifier, SchemaKind};
use crate::element::{CompiledElement, ElementCompiler, ValueOverrides};
use crate::field::FieldDescriptor;
use crate::store::TaxonomyStore;

/// Per-property Value overrides for one Object, keyed by property name.
pub type ObjectOverrides = BTreeMap<String, ValueOverrides>;

/// An Element owned by an Object through one property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyElement {
    pub property: String,
    pub element: Arc<CompiledElement>,
}

/// A single-valued nested Object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedObject {
    pub property: String,
    pub object: Arc<CompiledObject>,
}

/// An Array property: the Object owns many `items`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArrayUsage {
    pub property: String,
    pub items: String,
}

/// A compiled Object. Each list is ordered by property name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledObject {
    pub name: String,
    /// Object this one structurally extends. Its properties are not repeated here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub description: String,
    pub elements: Vec<PropertyElement>,
    pub objects: Vec<NestedObject>,
    pub arrays: Vec<ArrayUsage>,
}

impl CompiledObject {
    pub fn element(&self, property: &str) -> Option<&CompiledElement> {
        self.elements
            .iter()
            .find(|e| e.property == property)
            .map(|e| e.element.as_ref())
    }

    pub fn object(&self, property: &str) -> Option<&CompiledObject> {
        self.objects
            .iter()
            .find(|o| o.property == property)
            .map(|o| o.object.as_ref())
    }

    pub fn array(&self, property: &str) -> Option<&ArrayUsage> {
        self.arrays.iter().find(|a| a.property == property)
    }

    /// Storage columns of the directly owned Elements, in property order
    /// then facet order. Nested Objects carry their own columns.
    pub fn columns(&self) -> Vec<&FieldDescriptor> {
        self.elements
            .iter()
            .flat_map(|e| e.element.facets.iter())
            .collect()
    }
}

type ElementKey = (String, ValueOverrides);
type ObjectKey = (String, ObjectOverrides);

/// Memoising compiler for the Objects and Elements of one store.
#[derive(Debug)]
pub struct ObjectCompiler<'a> {
    classifier: SchemaClassifier<'a>,
    elements: ElementCompiler<'a>,
    element_cache: RwLock<HashMap<ElementKey, Arc<CompiledElement>>>,
    object_cache: RwLock<HashMap<ObjectKey, Arc<CompiledObject>>>,
}

impl<'a> ObjectCompiler<'a> {
    pub fn new(store: &'a TaxonomyStore) -> Self {
        Self {
            classifier: SchemaClassifier::new(store),
            elements: ElementCompiler::new(store),
            element_cache: RwLock::new(HashMap::new()),
            object_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Compile an Object.
    ///
    /// # Errors
    ///
    /// Any structural error met while compiling the Object or anything it
    /// owns, including `NotAnObject` and `CyclicSchema`.
    pub fn compile(
        &self,
        name: &str,
        overrides: &ObjectOverrides,
    ) -> Result<Arc<CompiledObject>, TaxonomyError> {
        let mut path = Vec::new();
        self.compile_object(name, overrides, &mut path)
    }

    /// Compile an Element through the shared cache.
    pub fn compile_element(
        &self,
        name: &str,
        overrides: &ValueOverrides,
    ) -> Result<Arc<CompiledElement>, TaxonomyError> {
        let key = (name.to_string(), overrides.clone());
        if let Some(hit) = self.element_cache.read().get(&key) {
            tracing::trace!(element = %name, "element cache hit");
            return Ok(Arc::clone(hit));
        }
        let compiled = Arc::new(self.elements.compile(name, overrides)?);
        let mut cache = self.element_cache.write();
        Ok(Arc::clone(cache.entry(key).or_insert(compiled)))
    }

    /// Number of distinct `(name, overrides)` pairs compiled so far.
    pub fn cached(&self) -> (usize, usize) {
        (self.element_cache.read().len(), self.object_cache.read().len())
    }

    fn compile_object(
        &self,
        name: &str,
        overrides: &ObjectOverrides,
        path: &mut Vec<String>,
    ) -> Result<Arc<CompiledObject>, TaxonomyError> {
        if let Some(start) = path.iter().position(|n| n == name) {
            let mut cycle = path[start..].to_vec();
            cycle.push(name.to_string());
            return Err(TaxonomyError::CyclicSchema { cycle });
        }

        let key = (name.to_string(), overrides.clone());
        if let Some(hit) = self.object_cache.read().get(&key) {
            tracing::trace!(object = %name, "object cache hit");
            return Ok(Arc::clone(hit));
        }

        let defn = self.classifier.object(name)?;
        if let Some(parent) = &defn.parent {
            self.classifier.object(parent)?;
        }

        path.push(name.to_string());
        let mut elements = Vec::new();
        let mut objects = Vec::new();
        let mut arrays = Vec::new();

        for prop in &defn.properties {
            let target = match &prop.target {
                PropertyTarget::Array { items } => {
                    arrays.push(ArrayUsage {
                        property: prop.name.clone(),
                        items: items.clone(),
                    });
                    continue;
                }
                PropertyTarget::Schema(target) => target,
            };
            match self.classifier.classify(target)? {
                SchemaKind::Element => {
                    let value = overrides.get(&prop.name).cloned().unwrap_or_default();
                    elements.push(PropertyElement {
                        property: prop.name.clone(),
                        element: self.compile_element(target, &value)?,
                    });
                }
                SchemaKind::Object => {
                    objects.push(NestedObject {
                        property: prop.name.clone(),
                        object: self.compile_object(target, &ObjectOverrides::new(), path)?,
                    });
                }
                SchemaKind::Array => {
                    if let Some(items) = self.classifier.array_item_of(prop) {
                        arrays.push(ArrayUsage {
                            property: prop.name.clone(),
                            items: items.to_string(),
                        });
                    }
                }
            }
        }
        path.pop();

        let compiled = Arc::new(CompiledObject {
            name: name.to_string(),
            parent: defn.parent.clone(),
            description: defn.description.clone(),
            elements,
            objects,
            arrays,
        });
        let mut cache = self.object_cache.write();
        Ok(Arc::clone(cache.entry(key).or_insert(compiled)))
    }
}
