//! # Taxonomy Store
//!
//! Loads the taxonomy document once and exposes read-only lookup of schema
//! definitions, item types and item-type groups by name.
//!
//! ## Document Layouts
//!
//! Two layouts of the same content are accepted:
//!
//! - flat: top-level `schemas`, `item-types`, `item-type-groups`;
//! - OpenAPI: `components.schemas`, `x-ob-item-types`, `x-ob-item-type-groups`.
//!
//! The four primitive superclass schemas (`TaxonomyElementBoolean`, ...) are
//! not loaded as schemas; Elements only reference them by name.
//!
//! Files ending in `.yaml`/`.yml` are parsed as YAML and converted to the
//! JSON value model first; everything else is parsed as JSON.
//!
//! ## Thread Safety
//!
//! `TaxonomyStore` has no interior mutability. Once constructed it can be
//! shared (`&TaxonomyStore` or `Arc<TaxonomyStore>`) across any number of
//! concurrent compilations.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use obtax_core::TaxonomyError;
use serde_json::Value;

use crate::classify::{SchemaDefinition, SuperclassCategory, SUPERCLASS_PREFIX};

const INLINE_SOURCE: &str = "<inline>";

/// The parsed content of a taxonomy document. Never mutated after load.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyDocument {
    schemas: BTreeMap<String, SchemaDefinition>,
    item_types: BTreeMap<String, Value>,
    item_type_groups: BTreeMap<String, Value>,
}

impl TaxonomyDocument {
    /// Parse a document from its JSON value.
    pub fn from_value(root: &Value) -> Result<Self, TaxonomyError> {
        let root = root
            .as_object()
            .ok_or_else(|| load_error(INLINE_SOURCE, "document root is not an object"))?;

        let schemas = root
            .get("schemas")
            .or_else(|| root.get("components").and_then(|c| c.get("schemas")))
            .ok_or_else(|| load_error(INLINE_SOURCE, "document has no schemas map"))?;
        let schemas = named_map(schemas, "schemas")?
            .into_iter()
            .filter(|(name, _)| !is_primitive_superclass(name))
            .map(|(name, defn)| {
                let parsed = SchemaDefinition::from_json(&name, &defn);
                (name, parsed)
            })
            .collect();

        let item_types = match root.get("item-types").or_else(|| root.get("x-ob-item-types")) {
            Some(v) => named_map(v, "item-types")?,
            None => BTreeMap::new(),
        };
        let item_type_groups = match root
            .get("item-type-groups")
            .or_else(|| root.get("x-ob-item-type-groups"))
        {
            Some(v) => named_map(v, "item-type-groups")?,
            None => BTreeMap::new(),
        };

        Ok(Self {
            schemas,
            item_types,
            item_type_groups,
        })
    }
}

/// The four `TaxonomyElement*` schemas are the primitives Elements inherit,
/// not schemas in their own right.
fn is_primitive_superclass(name: &str) -> bool {
    name.starts_with(SUPERCLASS_PREFIX) && SuperclassCategory::from_reference(name).is_some()
}

fn named_map(value: &Value, what: &str) -> Result<BTreeMap<String, Value>, TaxonomyError> {
    let map = value
        .as_object()
        .ok_or_else(|| load_error(INLINE_SOURCE, format!("'{what}' is not an object")))?;
    Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}

fn load_error(path: &str, reason: impl Into<String>) -> TaxonomyError {
    TaxonomyError::Load {
        path: path.to_string(),
        reason: reason.into(),
    }
}

/// Read-only access to one loaded taxonomy document.
#[derive(Debug, Clone)]
pub struct TaxonomyStore {
    /// File the document was loaded from, if any.
    source: Option<PathBuf>,
    document: TaxonomyDocument,
}

impl TaxonomyStore {
    /// Load a taxonomy document from disk.
    ///
    /// # Errors
    ///
    /// Returns `TaxonomyError::Load` if the file is missing, unreadable, or
    /// not valid JSON/YAML, or if it lacks a schemas map.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TaxonomyError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let content = std::fs::read_to_string(path)
            .map_err(|e| load_error(&display, format!("cannot read file: {e}")))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let value = match ext {
            "yaml" | "yml" => {
                let yaml: serde_yaml::Value = serde_yaml::from_str(&content)
                    .map_err(|e| load_error(&display, format!("invalid YAML: {e}")))?;
                yaml_to_json_value(&yaml).map_err(|e| {
                    load_error(&display, format!("YAML-to-JSON conversion failed: {e}"))
                })?
            }
            _ => serde_json::from_str(&content)
                .map_err(|e| load_error(&display, format!("invalid JSON: {e}")))?,
        };

        let document = TaxonomyDocument::from_value(&value).map_err(|e| match e {
            TaxonomyError::Load { reason, .. } => load_error(&display, reason),
            other => other,
        })?;

        let store = Self {
            source: Some(path.to_path_buf()),
            document,
        };
        tracing::debug!(
            path = %path.display(),
            schemas = store.schema_count(),
            item_types = store.document.item_types.len(),
            item_type_groups = store.document.item_type_groups.len(),
            "loaded taxonomy document"
        );
        Ok(store)
    }

    /// Build a store from an already-parsed JSON value.
    pub fn from_value(value: &Value) -> Result<Self, TaxonomyError> {
        Ok(Self {
            source: None,
            document: TaxonomyDocument::from_value(value)?,
        })
    }

    /// Build a store from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self, TaxonomyError> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| load_error(INLINE_SOURCE, format!("invalid JSON: {e}")))?;
        Self::from_value(&value)
    }

    /// The file this store was loaded from.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// The parsed document.
    pub fn document(&self) -> &TaxonomyDocument {
        &self.document
    }

    /// Look up a schema definition by name.
    ///
    /// # Errors
    ///
    /// Returns `TaxonomyError::UnknownSchema` if the name is not declared.
    pub fn lookup(&self, name: &str) -> Result<&SchemaDefinition, TaxonomyError> {
        self.document
            .schemas
            .get(name)
            .ok_or_else(|| TaxonomyError::UnknownSchema(name.to_string()))
    }

    /// Whether a schema with this name is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.document.schemas.contains_key(name)
    }

    /// All schema names and definitions, sorted by name.
    pub fn schemas(&self) -> impl Iterator<Item = (&str, &SchemaDefinition)> {
        self.document
            .schemas
            .iter()
            .map(|(name, defn)| (name.as_str(), defn))
    }

    /// Number of declared schemas.
    pub fn schema_count(&self) -> usize {
        self.document.schemas.len()
    }

    /// Raw item-type entry by name.
    pub fn item_type_entry(&self, name: &str) -> Option<&Value> {
        self.document.item_types.get(name)
    }

    /// Raw item-type-group entry by name.
    pub fn item_type_group_entry(&self, name: &str) -> Option<&Value> {
        self.document.item_type_groups.get(name)
    }
}

/// Convert a `serde_yaml::Value` into the equivalent `serde_json::Value`.
///
/// Taxonomy documents only use the JSON-compatible subset of YAML; tags are
/// dropped and non-string keys are stringified.
fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::from(u))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => seq
            .iter()
            .map(yaml_to_json_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        serde_yaml::Value::Mapping(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key: {other:?}")),
                };
                out.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(out))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn flat_doc() -> Value {
        json!({
            "schemas": {
                "Height": {
                    "allOf": [
                        {"$ref": "#/schemas/TaxonomyElementNumber"},
                        {"description": "Height", "x-ob-item-type": "Length", "x-ob-item-type-group": ""}
                    ]
                }
            },
            "item-types": {"Length": {"description": "Length", "units": {"m": {"label": "Meter", "description": ""}}}}
        })
    }

    #[test]
    fn loads_flat_layout() {
        let store = TaxonomyStore::from_value(&flat_doc()).unwrap();
        assert_eq!(store.schema_count(), 1);
        assert!(store.contains("Height"));
        assert!(store.item_type_entry("Length").is_some());
        assert!(store.source().is_none());
    }

    #[test]
    fn loads_openapi_layout() {
        let doc = json!({
            "openapi": "3.0.0",
            "components": {"schemas": {"Product": {"type": "object", "properties": {}}}},
            "x-ob-item-types": {},
            "x-ob-item-type-groups": {"G": {"type": "Length", "description": "", "group": []}}
        });
        let store = TaxonomyStore::from_value(&doc).unwrap();
        assert!(store.contains("Product"));
        assert!(store.item_type_group_entry("G").is_some());
    }

    #[test]
    fn primitive_superclasses_are_not_schemas() {
        let mut doc = flat_doc();
        doc["schemas"]["TaxonomyElementNumber"] =
            json!({"type": "object", "properties": {"Value": {"type": "number"}}});
        let store = TaxonomyStore::from_value(&doc).unwrap();
        assert_eq!(store.schema_count(), 1);
        assert!(!store.contains("TaxonomyElementNumber"));
    }

    #[test]
    fn lookup_unknown_schema_fails() {
        let store = TaxonomyStore::from_value(&flat_doc()).unwrap();
        let err = store.lookup("Width").unwrap_err();
        assert!(matches!(err, TaxonomyError::UnknownSchema(ref n) if n == "Width"));
    }

    #[test]
    fn document_without_schemas_is_a_load_error() {
        let err = TaxonomyStore::from_value(&json!({"item-types": {}})).unwrap_err();
        assert!(matches!(err, TaxonomyError::Load { .. }), "got {err}");
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TaxonomyStore::load(dir.path().join("absent.json")).unwrap_err();
        match err {
            TaxonomyError::Load { path, reason } => {
                assert!(path.ends_with("absent.json"));
                assert!(reason.contains("cannot read file"));
            }
            other => panic!("expected Load, got {other}"),
        }
    }

    #[test]
    fn invalid_json_is_a_load_error() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = TaxonomyStore::load(file.path()).unwrap_err();
        assert!(
            matches!(err, TaxonomyError::Load { ref reason, .. } if reason.contains("invalid JSON")),
            "got {err}"
        );
    }

    #[test]
    fn loads_yaml_documents() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(
            file,
            "schemas:\n  Product:\n    type: object\n    properties: {{}}\nitem-types: {{}}\n"
        )
        .unwrap();
        let store = TaxonomyStore::load(file.path()).unwrap();
        assert!(store.contains("Product"));
        assert_eq!(store.source(), Some(file.path()));
    }

    #[test]
    fn yaml_conversion_keeps_scalars() {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str("a: 1\nb: true\nc: [x, y]\n2: two\n").unwrap();
        let json = yaml_to_json_value(&yaml).unwrap();
        assert_eq!(json["a"], 1);
        assert_eq!(json["b"], true);
        assert_eq!(json["c"][1], "y");
        assert_eq!(json["2"], "two");
    }
}
