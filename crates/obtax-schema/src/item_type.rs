//! # Item Types and Item-Type Groups
//!
//! An item type is the value domain of an Element's `Value` facet. The
//! document's entry decides its variant: an `enums` map makes it
//! Enumerated, otherwise a `units` map makes it Unit-bearing, otherwise it
//! is Plain.
//!
//! An item-type group narrows an Enumerated or Unit-bearing item type to a
//! subset of its ids for one Element. Group ids the item type does not
//! declare contribute nothing, so the grouped value set is always a subset
//! of the ungrouped one and keeps the item type's source order.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use obtax_core::TaxonomyError;

use crate::store::TaxonomyStore;

/// One enumerated or unit value of an item type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemTypeValue {
    pub id: String,
    pub label: String,
    pub description: String,
}

/// A resolved item type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum ItemType {
    Plain {
        name: String,
        description: String,
    },
    Enumerated {
        name: String,
        description: String,
        values: Vec<ItemTypeValue>,
    },
    Unit {
        name: String,
        description: String,
        values: Vec<ItemTypeValue>,
    },
}

impl ItemType {
    pub fn name(&self) -> &str {
        match self {
            Self::Plain { name, .. } | Self::Enumerated { name, .. } | Self::Unit { name, .. } => {
                name
            }
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Plain { description, .. }
            | Self::Enumerated { description, .. }
            | Self::Unit { description, .. } => description,
        }
    }

    /// Declared values in source order; empty for Plain item types.
    pub fn values(&self) -> &[ItemTypeValue] {
        match self {
            Self::Plain { .. } => &[],
            Self::Enumerated { values, .. } | Self::Unit { values, .. } => values,
        }
    }

    /// Enumerated with at least one value.
    pub fn has_enums(&self) -> bool {
        matches!(self, Self::Enumerated { values, .. } if !values.is_empty())
    }

    /// Unit-bearing with at least one value.
    pub fn has_units(&self) -> bool {
        matches!(self, Self::Unit { values, .. } if !values.is_empty())
    }

    /// The same item type restricted to `group`; unchanged when `group` is `None`.
    pub fn grouped(&self, group: Option<&ItemTypeGroup>) -> ItemType {
        let values = grouped_values(self, group);
        match self {
            Self::Plain { .. } => self.clone(),
            Self::Enumerated {
                name, description, ..
            } => Self::Enumerated {
                name: name.clone(),
                description: description.clone(),
                values,
            },
            Self::Unit {
                name, description, ..
            } => Self::Unit {
                name: name.clone(),
                description: description.clone(),
                values,
            },
        }
    }
}

/// A named subset of an item type's ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemTypeGroup {
    pub name: String,
    /// Name of the item type the group applies to.
    pub item_type: String,
    pub description: String,
    /// Ids in scope, as listed by the group.
    pub ids: Vec<String>,
}

/// Values of `item_type` that are in scope for `group`, in item-type order.
pub fn grouped_values(item_type: &ItemType, group: Option<&ItemTypeGroup>) -> Vec<ItemTypeValue> {
    let values = item_type.values();
    let Some(group) = group else {
        return values.to_vec();
    };
    let ids: HashSet<&str> = group.ids.iter().map(String::as_str).collect();
    let selected: Vec<ItemTypeValue> = values
        .iter()
        .filter(|v| ids.contains(v.id.as_str()))
        .cloned()
        .collect();
    if selected.len() < ids.len() {
        tracing::debug!(
            group = %group.name,
            item_type = %item_type.name(),
            requested = ids.len(),
            matched = selected.len(),
            "item type group lists ids its item type does not declare"
        );
    }
    selected
}

/// Resolves item types and groups of one store.
#[derive(Debug, Clone, Copy)]
pub struct ItemTypeResolver<'a> {
    store: &'a TaxonomyStore,
}

impl<'a> ItemTypeResolver<'a> {
    pub fn new(store: &'a TaxonomyStore) -> Self {
        Self { store }
    }

    /// Resolve an item type by name.
    ///
    /// # Errors
    ///
    /// `UnknownItemType` if undeclared; `MalformedSchema` if its `enums` or
    /// `units` entry is not a map of id to value.
    pub fn resolve_item_type(&self, name: &str) -> Result<ItemType, TaxonomyError> {
        let entry = self
            .store
            .item_type_entry(name)
            .ok_or_else(|| TaxonomyError::UnknownItemType(name.to_string()))?;
        let description = description_of(entry);

        if let Some(enums) = entry.get("enums") {
            Ok(ItemType::Enumerated {
                name: name.to_string(),
                description,
                values: parse_values(name, "enums", enums)?,
            })
        } else if let Some(units) = entry.get("units") {
            Ok(ItemType::Unit {
                name: name.to_string(),
                description,
                values: parse_values(name, "units", units)?,
            })
        } else {
            Ok(ItemType::Plain {
                name: name.to_string(),
                description,
            })
        }
    }

    /// Resolve an item-type group. `None` or an empty name means ungrouped.
    ///
    /// # Errors
    ///
    /// `UnknownItemTypeGroup` if a non-empty name is undeclared;
    /// `MalformedSchema` if its `group` entry is not a list of ids.
    pub fn resolve_group(&self, name: Option<&str>) -> Result<Option<ItemTypeGroup>, TaxonomyError> {
        let Some(name) = name.filter(|n| !n.is_empty()) else {
            return Ok(None);
        };
        let entry = self
            .store
            .item_type_group_entry(name)
            .ok_or_else(|| TaxonomyError::UnknownItemTypeGroup(name.to_string()))?;

        let ids = match entry.get("group") {
            None => Vec::new(),
            Some(Value::Array(ids)) => ids
                .iter()
                .map(|id| {
                    id.as_str().map(str::to_string).ok_or_else(|| TaxonomyError::MalformedSchema {
                        name: name.to_string(),
                        reason: format!("group id {id} is not a string"),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => {
                return Err(TaxonomyError::MalformedSchema {
                    name: name.to_string(),
                    reason: "'group' is not a list".to_string(),
                })
            }
        };

        Ok(Some(ItemTypeGroup {
            name: name.to_string(),
            item_type: entry
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            description: description_of(entry),
            ids,
        }))
    }
}

fn parse_values(item_type: &str, key: &str, map: &Value) -> Result<Vec<ItemTypeValue>, TaxonomyError> {
    let map = map.as_object().ok_or_else(|| TaxonomyError::MalformedSchema {
        name: item_type.to_string(),
        reason: format!("'{key}' is not a map of id to value"),
    })?;
    Ok(map
        .iter()
        .map(|(id, v)| ItemTypeValue {
            id: id.clone(),
            label: v
                .get("label")
                .and_then(Value::as_str)
                .unwrap_or(id)
                .to_string(),
            description: description_of(v),
        })
        .collect())
}

fn description_of(value: &Value) -> String {
    value
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
