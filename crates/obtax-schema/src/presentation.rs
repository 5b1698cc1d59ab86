//! # Presentation Rendering
//!
//! Renders stored records through their compiled schema. Each Element
//! becomes a small group keyed by facet name:
//!
//! ```json
//! {"Height": {"Decimals": null, "EndTime": null, "Precision": null,
//!             "StartTime": null, "Unit": "m", "Value": "1.5"}}
//! ```
//!
//! Stored values come from a [`RecordSource`], addressed by column name
//! (`{Element}_{Facet}`). A [`PendingEdits`] implementation can substitute
//! any column of the top-level record with a not-yet-approved value; the
//! compiled schema itself is never touched. Nested and array records are
//! rendered from their stored values only.

use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};

use obtax_core::TaxonomyError;

use crate::element::CompiledElement;
use crate::field::FacetValue;
use crate::object::CompiledObject;
use crate::registry::CompiledRegistry;

/// Read access to one stored record.
pub trait RecordSource {
    /// Stored value of a column; `None` when the record has no such column.
    fn facet_value(&self, column: &str) -> Option<FacetValue>;

    /// Record owned through a single-valued Object property.
    fn nested(&self, _property: &str) -> Option<&dyn RecordSource> {
        None
    }

    /// Records owned through an Array property.
    fn array(&self, _property: &str) -> Vec<&dyn RecordSource> {
        Vec::new()
    }
}

/// Pending (unapproved) values keyed by column name.
pub trait PendingEdits {
    fn pending(&self, column: &str) -> Option<Value>;
}

impl PendingEdits for HashMap<String, Value> {
    fn pending(&self, column: &str) -> Option<Value> {
        self.get(column).cloned()
    }
}

impl PendingEdits for BTreeMap<String, Value> {
    fn pending(&self, column: &str) -> Option<Value> {
        self.get(column).cloned()
    }
}

/// An in-memory record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryRecord {
    values: BTreeMap<String, FacetValue>,
    nested: BTreeMap<String, MemoryRecord>,
    arrays: BTreeMap<String, Vec<MemoryRecord>>,
}

impl MemoryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, column: impl Into<String>, value: FacetValue) -> Self {
        self.values.insert(column.into(), value);
        self
    }

    pub fn with_nested(mut self, property: impl Into<String>, record: MemoryRecord) -> Self {
        self.nested.insert(property.into(), record);
        self
    }

    pub fn with_array(mut self, property: impl Into<String>, records: Vec<MemoryRecord>) -> Self {
        self.arrays.insert(property.into(), records);
        self
    }
}

impl RecordSource for MemoryRecord {
    fn facet_value(&self, column: &str) -> Option<FacetValue> {
        self.values.get(column).cloned()
    }

    fn nested(&self, property: &str) -> Option<&dyn RecordSource> {
        self.nested.get(property).map(|r| r as &dyn RecordSource)
    }

    fn array(&self, property: &str) -> Vec<&dyn RecordSource> {
        self.arrays
            .get(property)
            .map(|rs| rs.iter().map(|r| r as &dyn RecordSource).collect())
            .unwrap_or_default()
    }
}

/// Render one Element as `{Facet: value}`. Missing columns render as `null`.
pub fn render_element(
    compiled: &CompiledElement,
    source: &dyn RecordSource,
    edits: Option<&dyn PendingEdits>,
) -> Value {
    let mut group = Map::new();
    for field in &compiled.facets {
        let column = field.column_name();
        let value = edits
            .and_then(|e| e.pending(&column))
            .or_else(|| source.facet_value(&column).map(|v| v.to_json()))
            .unwrap_or(Value::Null);
        group.insert(field.facet.as_str().to_string(), value);
    }
    Value::Object(group)
}

/// Render a record of `object` keyed by property name.
///
/// Element properties render as facet groups, nested Objects as objects (or
/// `null` when the record has none), Array properties as lists.
///
/// # Errors
///
/// `UnknownSchema` or `NotAnObject` when an Array's item schema is not a
/// compiled Object of `registry`.
pub fn render_object(
    object: &CompiledObject,
    record: &dyn RecordSource,
    registry: &CompiledRegistry,
    edits: Option<&dyn PendingEdits>,
) -> Result<Value, TaxonomyError> {
    let mut out = Map::new();
    for e in &object.elements {
        out.insert(e.property.clone(), render_element(&e.element, record, edits));
    }
    for o in &object.objects {
        let rendered = match record.nested(&o.property) {
            Some(nested) => render_object(&o.object, nested, registry, None)?,
            None => Value::Null,
        };
        out.insert(o.property.clone(), rendered);
    }
    for a in &object.arrays {
        let items = registry.object(&a.items)?;
        let rendered = record
            .array(&a.property)
            .into_iter()
            .map(|r| render_object(items, r, registry, None))
            .collect::<Result<Vec<_>, _>>()?;
        out.insert(a.property.clone(), Value::Array(rendered));
    }
    Ok(Value::Object(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TaxonomyStore;
    use rust_decimal::Decimal;
    use serde_json::json;

    fn registry() -> CompiledRegistry {
        let store = TaxonomyStore::from_value(&json!({
            "schemas": {
                "Height": {"allOf": [
                    {"$ref": "#/components/schemas/TaxonomyElementNumber"},
                    {"x-ob-item-type": "Length"}
                ]},
                "ProdCode": {"allOf": [
                    {"$ref": "#/components/schemas/TaxonomyElementString"},
                    {"x-ob-item-type": "String"}
                ]},
                "Dimension": {"type": "object", "properties": {"Height": {}}},
                "Package": {"type": "object", "properties": {"ProdCode": {}}},
                "Product": {"type": "object", "properties": {
                    "ProdCode": {},
                    "Dimension": {},
                    "Packages": {"type": "array", "items": {"$ref": "#/components/schemas/Package"}}
                }}
            },
            "item-types": {
                "String": {"description": ""},
                "Length": {"description": "", "units": {"m": {"label": "Meter"}}}
            }
        }))
        .unwrap();
        CompiledRegistry::build(&store).unwrap()
    }

    fn text(s: &str) -> FacetValue {
        FacetValue::String(s.to_string())
    }

    #[test]
    fn element_groups_every_facet() {
        let r = registry();
        let height = r.element("Height").unwrap();
        let record = MemoryRecord::new()
            .with_value("Height_Value", FacetValue::Decimal(Decimal::new(15, 1)))
            .with_value("Height_Unit", text("m"));
        let rendered = render_element(height, &record, None);
        assert_eq!(
            rendered,
            json!({
                "Decimals": null, "EndTime": null, "Precision": null,
                "StartTime": null, "Unit": "m", "Value": "1.5"
            })
        );
    }

    #[test]
    fn pending_edits_replace_top_level_values_only() {
        let r = registry();
        let product = r.object("Product").unwrap();
        let record = MemoryRecord::new()
            .with_value("ProdCode_Value", text("A-1"))
            .with_nested(
                "Dimension",
                MemoryRecord::new().with_value("Height_Value", FacetValue::Integer(2)),
            )
            .with_array(
                "Packages",
                vec![MemoryRecord::new().with_value("ProdCode_Value", text("PKG-1"))],
            );

        let mut edits = HashMap::new();
        edits.insert("ProdCode_Value".to_string(), json!("A-2"));
        edits.insert("Height_Value".to_string(), json!("9"));

        let rendered = render_object(product, &record, &r, Some(&edits)).unwrap();
        assert_eq!(rendered["ProdCode"]["Value"], json!("A-2"));
        assert_eq!(rendered["Dimension"]["Height"]["Value"], json!(2));
        assert_eq!(rendered["Packages"][0]["ProdCode"]["Value"], json!("PKG-1"));

        let plain = render_object(product, &record, &r, None).unwrap();
        assert_eq!(plain["ProdCode"]["Value"], json!("A-1"));
        assert_eq!(product.element("ProdCode").unwrap().facets.len(), 3);
    }

    #[test]
    fn absent_nested_records_render_as_null() {
        let r = registry();
        let product = r.object("Product").unwrap();
        let rendered = render_object(product, &MemoryRecord::new(), &r, None).unwrap();
        assert_eq!(rendered["Dimension"], Value::Null);
        assert_eq!(rendered["Packages"], json!([]));
        assert_eq!(rendered["ProdCode"]["Value"], Value::Null);
    }
}
