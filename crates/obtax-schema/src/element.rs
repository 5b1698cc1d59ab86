//! # Element Compilation
//!
//! Compiles one Element into its ordered facet list.
//!
//! | Category | Facets | Unit added iff |
//! |----------|--------|----------------|
//! | Boolean | EndTime, StartTime, Value | never |
//! | Integer | EndTime, StartTime, Value | grouped item type is Unit-bearing and non-empty |
//! | Number | Decimals, EndTime, Precision, StartTime, Value | grouped item type is Unit-bearing and non-empty |
//! | String | EndTime, StartTime, Value | never |
//!
//! The `Value` facet's type depends on the category and, for a handful of
//! item types, on the item type name:
//!
//! - Integer `Duration`: non-negative.
//! - Number `Duration`, `Length`, `Mass`: non-negative fixed-point decimal.
//! - Number `Percent`: fixed-point decimal in `[0, 100]`.
//! - String `Date`: calendar date.
//! - String `UUID`: identifier generated on create, unique and immutable.
//! - String with a non-empty grouped enumeration: constrained to its ids.
//! - Anything else falls back to the category's generic rule.
//!
//! Caller-supplied [`ValueOverrides`] are applied last and win on conflict.
//! They only affect the compiled copy they were passed to.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use obtax_core::TaxonomyError;

use crate::classify::{SchemaClassifier, SuperclassCategory};
use crate::field::{Choice, Facet, FieldDefault, FieldDescriptor, ValueKind, STR_LEN};
use crate::item_type::{ItemType, ItemTypeResolver};
use crate::store::TaxonomyStore;

/// Per-usage adjustments to an Element's `Value` facet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValueOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
}

impl ValueOverrides {
    pub fn max_length(max_length: usize) -> Self {
        Self {
            max_length: Some(max_length),
            ..Self::default()
        }
    }

    pub fn editable(editable: bool) -> Self {
        Self {
            editable: Some(editable),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    fn apply(&self, field: &mut FieldDescriptor) {
        if let Some(max_length) = self.max_length {
            field.constraints.max_length = Some(max_length);
        }
        if let Some(editable) = self.editable {
            field.constraints.editable = editable;
        }
        if let Some(unique) = self.unique {
            field.constraints.unique = unique;
        }
    }
}

/// A compiled Element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompiledElement {
    pub name: String,
    pub description: String,
    pub superclass: SuperclassCategory,
    /// The item type after grouping.
    pub item_type: ItemType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_type_group: Option<String>,
    /// Facets in [`Facet`] order.
    pub facets: Vec<FieldDescriptor>,
}

impl CompiledElement {
    pub fn facet(&self, facet: Facet) -> Option<&FieldDescriptor> {
        self.facets.iter().find(|f| f.facet == facet)
    }

    /// The `Value` facet, present on every Element.
    pub fn value(&self) -> Option<&FieldDescriptor> {
        self.facet(Facet::Value)
    }

    pub fn facet_names(&self) -> Vec<Facet> {
        self.facets.iter().map(|f| f.facet).collect()
    }
}

/// Compiles Elements of one store. Stateless; see
/// [`ObjectCompiler`](crate::object::ObjectCompiler) for the memoising front end.
#[derive(Debug, Clone, Copy)]
pub struct ElementCompiler<'a> {
    classifier: SchemaClassifier<'a>,
    resolver: ItemTypeResolver<'a>,
}

impl<'a> ElementCompiler<'a> {
    pub fn new(store: &'a TaxonomyStore) -> Self {
        Self {
            classifier: SchemaClassifier::new(store),
            resolver: ItemTypeResolver::new(store),
        }
    }

    /// Compile one Element.
    ///
    /// # Errors
    ///
    /// `UnknownSchema`, `NotAnElement`, `UnknownSuperclass`, `MalformedSchema`,
    /// `UnknownItemType`, or `UnknownItemTypeGroup`.
    pub fn compile(
        &self,
        name: &str,
        overrides: &ValueOverrides,
    ) -> Result<CompiledElement, TaxonomyError> {
        let defn = self.classifier.element(name)?;
        let superclass = self.classifier.superclass_of(name)?;
        let item_type = self.resolver.resolve_item_type(&defn.item_type)?;
        let group = self.resolver.resolve_group(defn.item_type_group.as_deref())?;
        let grouped = item_type.grouped(group.as_ref());

        let mut facets = vec![
            FieldDescriptor::new(name, Facet::EndTime, ValueKind::DateTime),
            FieldDescriptor::new(name, Facet::StartTime, ValueKind::DateTime),
        ];
        if superclass == SuperclassCategory::Number {
            facets.push(non_negative_integer(name, Facet::Decimals));
            facets.push(non_negative_integer(name, Facet::Precision));
        }
        if matches!(superclass, SuperclassCategory::Integer | SuperclassCategory::Number)
            && grouped.has_units()
        {
            facets.push(choice_field(name, Facet::Unit, &grouped));
        }

        let mut value = value_field(name, superclass, &grouped);
        overrides.apply(&mut value);
        facets.push(value);
        facets.sort_by_key(|f| f.facet);

        Ok(CompiledElement {
            name: name.to_string(),
            description: defn.description.clone(),
            superclass,
            item_type: grouped,
            item_type_group: defn.item_type_group.clone(),
            facets,
        })
    }
}

fn non_negative_integer(element: &str, facet: Facet) -> FieldDescriptor {
    let mut field = FieldDescriptor::new(element, facet, ValueKind::Integer);
    field.constraints.min = Some(Decimal::ZERO);
    field
}

/// String facet restricted to the (non-empty) value ids of `item_type`.
fn choice_field(element: &str, facet: Facet, item_type: &ItemType) -> FieldDescriptor {
    let mut field = FieldDescriptor::new(element, facet, ValueKind::String);
    let values = item_type.values();
    field.constraints.max_length = values.iter().map(|v| v.id.chars().count()).max();
    field.constraints.choices = values
        .iter()
        .map(|v| Choice {
            id: v.id.clone(),
            label: v.label.clone(),
        })
        .collect();
    field
}

fn value_field(element: &str, superclass: SuperclassCategory, item_type: &ItemType) -> FieldDescriptor {
    match superclass {
        SuperclassCategory::Boolean => FieldDescriptor::new(element, Facet::Value, ValueKind::Boolean),
        SuperclassCategory::Integer => {
            let mut field = FieldDescriptor::new(element, Facet::Value, ValueKind::Integer);
            if item_type.name() == "Duration" {
                field.constraints.min = Some(Decimal::ZERO);
            }
            field
        }
        SuperclassCategory::Number => {
            let mut field = FieldDescriptor::new(element, Facet::Value, ValueKind::fixed_decimal());
            match item_type.name() {
                "Duration" | "Length" | "Mass" => {
                    field.constraints.min = Some(Decimal::ZERO);
                }
                "Percent" => {
                    field.constraints.min = Some(Decimal::ZERO);
                    field.constraints.max = Some(Decimal::ONE_HUNDRED);
                }
                _ => {}
            }
            field
        }
        SuperclassCategory::String => match item_type.name() {
            "Date" => FieldDescriptor::new(element, Facet::Value, ValueKind::Date),
            "UUID" => {
                let mut field = FieldDescriptor::new(element, Facet::Value, ValueKind::Uuid);
                field.nullable = false;
                field.blank = false;
                field.constraints.unique = true;
                field.constraints.immutable = true;
                field.constraints.editable = false;
                field.constraints.default = Some(FieldDefault::GenerateRecordId);
                field
            }
            _ if item_type.has_enums() => choice_field(element, Facet::Value, item_type),
            _ => {
                let mut field = FieldDescriptor::new(element, Facet::Value, ValueKind::String);
                field.constraints.max_length = Some(STR_LEN);
                field
            }
        },
    }
}
