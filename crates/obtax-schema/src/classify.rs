//! # Schema Classification
//!
//! Every named schema in the taxonomy is one of three shapes:
//!
//! | Shape | JSON form | Kind |
//! |-------|-----------|------|
//! | `{allOf: [{$ref: TaxonomyElement<Category>}, {details}]}` | leaf value | Element |
//! | `{type: array, items: {$ref}}` | list of one item schema | Array |
//! | `{properties: {...}}` or `{allOf: [{$ref: <Object>}, {properties}]}` | composite | Object |
//!
//! A two-part `allOf` whose superclass is not one of the four primitive
//! categories is structural inheritance between Objects and classifies as
//! Object. When its details block still declares an item type, the schema is
//! an Element with an unknown superclass and classifying it fails.
//!
//! Definitions are parsed once, when the store loads. A definition matching
//! none of the shapes is kept as [`SchemaDefinition::Unrecognized`] so that
//! only compilations touching it fail.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use obtax_core::TaxonomyError;

use crate::store::TaxonomyStore;

/// Reference-name prefix of the four primitive superclass schemas.
pub const SUPERCLASS_PREFIX: &str = "TaxonomyElement";

const ITEM_TYPE_KEYS: [&str; 2] = ["x-ob-item-type", "item-type"];
const ITEM_TYPE_GROUP_KEYS: [&str; 2] = ["x-ob-item-type-group", "item-type-group"];

/// The primitive category an Element inherits. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SuperclassCategory {
    Boolean,
    Integer,
    Number,
    String,
}

impl SuperclassCategory {
    /// All four categories.
    pub fn all() -> &'static [SuperclassCategory] {
        &[Self::Boolean, Self::Integer, Self::Number, Self::String]
    }

    /// Bare category name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Integer => "Integer",
            Self::Number => "Number",
            Self::String => "String",
        }
    }

    /// Schema name the taxonomy uses for this superclass.
    pub fn reference_name(&self) -> String {
        format!("{SUPERCLASS_PREFIX}{}", self.as_str())
    }

    /// Resolve a superclass reference name (`TaxonomyElementNumber` or `Number`).
    pub fn from_reference(name: &str) -> Option<Self> {
        let bare = name.strip_prefix(SUPERCLASS_PREFIX).unwrap_or(name);
        Self::all().iter().copied().find(|c| c.as_str() == bare)
    }
}

impl std::fmt::Display for SuperclassCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    Element,
    Object,
    Array,
}

impl SchemaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Element => "element",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

/// An Element definition: superclass reference plus details block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDefinition {
    /// Superclass reference name as written in the document.
    pub superclass: String,
    pub description: String,
    /// Item type name.
    pub item_type: String,
    /// Item-type group name; `None` when absent or empty.
    pub item_type_group: Option<String>,
}

impl ElementDefinition {
    /// The primitive category, if the superclass is one of the four.
    pub fn category(&self) -> Option<SuperclassCategory> {
        SuperclassCategory::from_reference(&self.superclass)
    }
}

/// What a property of an Object points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyTarget {
    /// A named schema (Element, Object, or Array).
    Schema(String),
    /// An inline `{type: array, items: {$ref}}`.
    Array { items: String },
}

/// One declared property of an Object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDefinition {
    pub name: String,
    pub target: PropertyTarget,
}

impl PropertyDefinition {
    fn from_json(name: &str, body: &Value) -> Self {
        let target = if let Some(r) = ref_name(body) {
            PropertyTarget::Schema(r.to_string())
        } else if let Some(items) = array_items(body) {
            PropertyTarget::Array {
                items: items.to_string(),
            }
        } else {
            // Unadorned properties name their schema directly.
            PropertyTarget::Schema(name.to_string())
        };
        Self {
            name: name.to_string(),
            target,
        }
    }
}

/// An Object definition. Properties are sorted by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDefinition {
    /// Object this one structurally extends, if any.
    pub parent: Option<String>,
    pub description: String,
    pub properties: Vec<PropertyDefinition>,
}

/// An Array definition wrapping one item schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayDefinition {
    pub items: String,
}

/// A parsed schema definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaDefinition {
    Element(ElementDefinition),
    Object(ObjectDefinition),
    Array(ArrayDefinition),
    /// Matches none of the three shapes.
    Unrecognized { reason: String },
}

impl SchemaDefinition {
    /// Parse one entry of the document's schemas map.
    pub fn from_json(name: &str, defn: &Value) -> Self {
        let Some(obj) = defn.as_object() else {
            return unrecognized("definition is not an object");
        };

        if let Some(all_of) = obj.get("allOf") {
            return Self::from_all_of(name, all_of);
        }

        if obj.get("type").and_then(Value::as_str) == Some("array") {
            return match array_items(defn) {
                Some(items) => Self::Array(ArrayDefinition {
                    items: items.to_string(),
                }),
                None => unrecognized("array definition without an item $ref"),
            };
        }

        if let Some(props) = obj.get("properties") {
            return object_definition(None, defn, props);
        }
        if obj.get("type").and_then(Value::as_str) == Some("object") {
            return Self::Object(ObjectDefinition {
                parent: None,
                description: description_of(defn),
                properties: Vec::new(),
            });
        }

        unrecognized("matches none of the element, object or array shapes")
    }

    fn from_all_of(name: &str, all_of: &Value) -> Self {
        let parts = match all_of.as_array() {
            Some(parts) if parts.len() == 2 => parts,
            _ => {
                return unrecognized(
                    "allOf must hold exactly a superclass reference and a details block",
                )
            }
        };
        let Some(superclass) = ref_name(&parts[0]) else {
            return unrecognized("allOf[0] is not a $ref");
        };
        let details = &parts[1];
        if !details.is_object() {
            return unrecognized("allOf[1] is not an object");
        }

        let item_type = first_str(details, &ITEM_TYPE_KEYS);
        let primitive = SuperclassCategory::from_reference(superclass).is_some();

        if primitive || item_type.is_some() {
            let Some(item_type) = item_type else {
                return unrecognized(format!("element details of '{name}' lack an item type"));
            };
            let item_type_group = first_str(details, &ITEM_TYPE_GROUP_KEYS)
                .filter(|g| !g.is_empty())
                .map(str::to_string);
            return Self::Element(ElementDefinition {
                superclass: superclass.to_string(),
                description: description_of(details),
                item_type: item_type.to_string(),
                item_type_group,
            });
        }

        match details.get("properties") {
            Some(props) => object_definition(Some(superclass), details, props),
            None => Self::Object(ObjectDefinition {
                parent: Some(superclass.to_string()),
                description: description_of(details),
                properties: Vec::new(),
            }),
        }
    }
}

fn unrecognized(reason: impl Into<String>) -> SchemaDefinition {
    SchemaDefinition::Unrecognized {
        reason: reason.into(),
    }
}

fn object_definition(parent: Option<&str>, defn: &Value, props: &Value) -> SchemaDefinition {
    let Some(props) = props.as_object() else {
        return unrecognized("properties is not an object");
    };
    let mut properties: Vec<PropertyDefinition> = props
        .iter()
        .map(|(pname, body)| PropertyDefinition::from_json(pname, body))
        .collect();
    properties.sort_by(|a, b| a.name.cmp(&b.name));
    SchemaDefinition::Object(ObjectDefinition {
        parent: parent.map(str::to_string),
        description: description_of(defn),
        properties,
    })
}

/// Last path segment of a `$ref` (`#/components/schemas/Height` → `Height`).
pub(crate) fn ref_name(value: &Value) -> Option<&str> {
    let r = value.get("$ref")?.as_str()?;
    r.rsplit('/').next()
}

fn array_items(value: &Value) -> Option<&str> {
    if value.get("type").and_then(Value::as_str) != Some("array") {
        return None;
    }
    value.get("items").and_then(ref_name)
}

fn first_str<'v>(value: &'v Value, keys: &[&str]) -> Option<&'v str> {
    keys.iter().find_map(|k| value.get(*k).and_then(Value::as_str))
}

fn description_of(value: &Value) -> String {
    value
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Classifies schemas of one store.
#[derive(Debug, Clone, Copy)]
pub struct SchemaClassifier<'a> {
    store: &'a TaxonomyStore,
}

impl<'a> SchemaClassifier<'a> {
    pub fn new(store: &'a TaxonomyStore) -> Self {
        Self { store }
    }

    /// Classify a schema by name.
    ///
    /// # Errors
    ///
    /// - `UnknownSchema` if the name is not declared.
    /// - `UnknownSuperclass` for an Element-shaped schema whose superclass is
    ///   not one of the four categories.
    /// - `MalformedSchema` if the definition matches no shape.
    pub fn classify(&self, name: &str) -> Result<SchemaKind, TaxonomyError> {
        match self.store.lookup(name)? {
            SchemaDefinition::Element(e) => {
                category_of(name, e)?;
                Ok(SchemaKind::Element)
            }
            SchemaDefinition::Object(_) => Ok(SchemaKind::Object),
            SchemaDefinition::Array(_) => Ok(SchemaKind::Array),
            SchemaDefinition::Unrecognized { reason } => Err(malformed(name, reason)),
        }
    }

    /// The primitive category of an Element.
    pub fn superclass_of(&self, name: &str) -> Result<SuperclassCategory, TaxonomyError> {
        category_of(name, self.element(name)?)
    }

    /// The Element definition behind `name`.
    pub fn element(&self, name: &str) -> Result<&'a ElementDefinition, TaxonomyError> {
        match self.store.lookup(name)? {
            SchemaDefinition::Element(e) => Ok(e),
            SchemaDefinition::Unrecognized { reason } => Err(malformed(name, reason)),
            _ => Err(TaxonomyError::NotAnElement(name.to_string())),
        }
    }

    /// The Object definition behind `name`.
    pub fn object(&self, name: &str) -> Result<&'a ObjectDefinition, TaxonomyError> {
        match self.store.lookup(name)? {
            SchemaDefinition::Object(o) => Ok(o),
            SchemaDefinition::Unrecognized { reason } => Err(malformed(name, reason)),
            _ => Err(TaxonomyError::NotAnObject(name.to_string())),
        }
    }

    /// Item schema of a property, when the property is an array (inline or
    /// through a named Array schema). Unknown targets are not arrays.
    pub fn array_item_of(&self, property: &'a PropertyDefinition) -> Option<&'a str> {
        match &property.target {
            PropertyTarget::Array { items } => Some(items.as_str()),
            PropertyTarget::Schema(target) => match self.store.lookup(target) {
                Ok(SchemaDefinition::Array(a)) => Some(a.items.as_str()),
                _ => None,
            },
        }
    }
}

fn category_of(name: &str, e: &ElementDefinition) -> Result<SuperclassCategory, TaxonomyError> {
    e.category().ok_or_else(|| TaxonomyError::UnknownSuperclass {
        element: name.to_string(),
        superclass: e.superclass.clone(),
    })
}

fn malformed(name: &str, reason: &str) -> TaxonomyError {
    TaxonomyError::MalformedSchema {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> TaxonomyStore {
        TaxonomyStore::from_value(&json!({
            "schemas": {
                "Height": {"allOf": [
                    {"$ref": "#/components/schemas/TaxonomyElementNumber"},
                    {"description": "Height of an object", "x-ob-item-type": "Length", "x-ob-item-type-group": ""}
                ]},
                "ProdCode": {"allOf": [
                    {"$ref": "#/components/schemas/TaxonomyElementString"},
                    {"x-ob-item-type": "String", "x-ob-item-type-group": "CodeGroup"}
                ]},
                "Product": {"type": "object", "properties": {
                    "ProdCode": {"$ref": "#/components/schemas/ProdCode"},
                    "Packages": {"$ref": "#/components/schemas/Packages"},
                    "Dimension": {}
                }},
                "ProdBattery": {"allOf": [
                    {"$ref": "#/components/schemas/Product"},
                    {"type": "object", "properties": {"Height": {"$ref": "#/components/schemas/Height"}}}
                ]},
                "Packages": {"type": "array", "items": {"$ref": "#/components/schemas/Package"}},
                "Package": {"type": "object", "properties": {}},
                "TemperatureDate": {"allOf": [
                    {"$ref": "#/components/schemas/TaxonomyElementDate"},
                    {"x-ob-item-type": "Date"}
                ]},
                "Broken": {"type": "array"},
                "Scalar": "not a definition"
            }
        }))
        .unwrap()
    }

    #[test]
    fn classifies_the_three_shapes() {
        let s = store();
        let c = SchemaClassifier::new(&s);
        assert_eq!(c.classify("Height").unwrap(), SchemaKind::Element);
        assert_eq!(c.classify("Product").unwrap(), SchemaKind::Object);
        assert_eq!(c.classify("Packages").unwrap(), SchemaKind::Array);
    }

    #[test]
    fn non_primitive_superclass_is_an_object() {
        let s = store();
        let c = SchemaClassifier::new(&s);
        assert_eq!(c.classify("ProdBattery").unwrap(), SchemaKind::Object);
        let o = c.object("ProdBattery").unwrap();
        assert_eq!(o.parent.as_deref(), Some("Product"));
        assert_eq!(o.properties.len(), 1);
    }

    #[test]
    fn element_details_are_parsed() {
        let s = store();
        let c = SchemaClassifier::new(&s);
        let e = c.element("Height").unwrap();
        assert_eq!(e.item_type, "Length");
        assert_eq!(e.item_type_group, None);
        assert_eq!(e.description, "Height of an object");
        assert_eq!(c.superclass_of("Height").unwrap(), SuperclassCategory::Number);
        assert_eq!(
            c.element("ProdCode").unwrap().item_type_group.as_deref(),
            Some("CodeGroup")
        );
    }

    #[test]
    fn superclass_of_rejects_non_elements() {
        let s = store();
        let c = SchemaClassifier::new(&s);
        assert!(matches!(
            c.superclass_of("Product"),
            Err(TaxonomyError::NotAnElement(_))
        ));
        assert!(matches!(
            c.object("Height"),
            Err(TaxonomyError::NotAnObject(_))
        ));
    }

    #[test]
    fn unknown_primitive_superclass_fails() {
        let s = store();
        let c = SchemaClassifier::new(&s);
        match c.classify("TemperatureDate").unwrap_err() {
            TaxonomyError::UnknownSuperclass { element, superclass } => {
                assert_eq!(element, "TemperatureDate");
                assert_eq!(superclass, "TaxonomyElementDate");
            }
            other => panic!("expected UnknownSuperclass, got {other}"),
        }
    }

    #[test]
    fn unrecognized_definitions_are_malformed() {
        let s = store();
        let c = SchemaClassifier::new(&s);
        assert!(matches!(
            c.classify("Broken"),
            Err(TaxonomyError::MalformedSchema { .. })
        ));
        assert!(matches!(
            c.classify("Scalar"),
            Err(TaxonomyError::MalformedSchema { .. })
        ));
        assert!(matches!(
            c.classify("Nope"),
            Err(TaxonomyError::UnknownSchema(_))
        ));
    }

    #[test]
    fn properties_are_sorted_and_resolved() {
        let s = store();
        let c = SchemaClassifier::new(&s);
        let o = c.object("Product").unwrap();
        let names: Vec<&str> = o.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Dimension", "Packages", "ProdCode"]);
        assert_eq!(o.properties[0].target, PropertyTarget::Schema("Dimension".into()));
        assert_eq!(c.array_item_of(&o.properties[1]), Some("Package"));
        assert_eq!(c.array_item_of(&o.properties[2]), None);
    }

    #[test]
    fn inline_array_properties() {
        let p = PropertyDefinition::from_json(
            "Contacts",
            &json!({"type": "array", "items": {"$ref": "#/components/schemas/Contact"}}),
        );
        assert_eq!(
            p.target,
            PropertyTarget::Array {
                items: "Contact".into()
            }
        );
    }

    #[test]
    fn superclass_reference_names() {
        for c in SuperclassCategory::all() {
            assert_eq!(SuperclassCategory::from_reference(&c.reference_name()), Some(*c));
            assert_eq!(SuperclassCategory::from_reference(c.as_str()), Some(*c));
        }
        assert_eq!(SuperclassCategory::from_reference("TaxonomyElementDate"), None);
    }
}
