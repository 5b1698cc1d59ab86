//! Reverse array-ownership ("has-many") relations.
//!
//! The taxonomy only encodes owner → item through Array properties. This
//! module derives item → owners, either for an explicit candidate set
//! ([`usages_of`]) or for the whole document at once ([`UsageIndex`]).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use obtax_core::TaxonomyError;

use crate::classify::{ObjectDefinition, SchemaClassifier, SchemaDefinition};
use crate::store::TaxonomyStore;

/// `owner` embeds `target` through the Array property `property`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UsageRelation {
    pub owner: String,
    pub target: String,
    pub property: String,
}

/// Candidates that embed `target` in at least one Array property.
///
/// Candidates that are not Objects own nothing and are skipped.
///
/// # Errors
///
/// `UnknownSchema` for an undeclared candidate, `MalformedSchema` for a
/// candidate whose definition matches no shape.
pub fn usages_of<I, S>(
    store: &TaxonomyStore,
    target: &str,
    candidates: I,
) -> Result<BTreeSet<String>, TaxonomyError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let classifier = SchemaClassifier::new(store);
    let mut owners = BTreeSet::new();
    for candidate in candidates {
        let candidate = candidate.as_ref();
        let defn = match classifier.object(candidate) {
            Ok(defn) => defn,
            Err(TaxonomyError::NotAnObject(_)) => continue,
            Err(e) => return Err(e),
        };
        if array_properties(&classifier, defn).any(|(_, items)| items == target) {
            owners.insert(candidate.to_string());
        }
    }
    Ok(owners)
}

fn array_properties<'a>(
    classifier: &'a SchemaClassifier<'a>,
    defn: &'a ObjectDefinition,
) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
    defn.properties
        .iter()
        .filter_map(move |p| classifier.array_item_of(p).map(|items| (p.name.as_str(), items)))
}

/// Every usage relation of a document, indexed by target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageIndex {
    by_target: BTreeMap<String, BTreeSet<UsageRelation>>,
}

impl UsageIndex {
    /// Scan every Object of the store once.
    pub fn build(store: &TaxonomyStore) -> Self {
        let classifier = SchemaClassifier::new(store);
        let mut by_target: BTreeMap<String, BTreeSet<UsageRelation>> = BTreeMap::new();
        for (owner, defn) in store.schemas() {
            let SchemaDefinition::Object(defn) = defn else {
                continue;
            };
            for (property, items) in array_properties(&classifier, defn) {
                by_target
                    .entry(items.to_string())
                    .or_default()
                    .insert(UsageRelation {
                        owner: owner.to_string(),
                        target: items.to_string(),
                        property: property.to_string(),
                    });
            }
        }
        tracing::debug!(targets = by_target.len(), "built usage index");
        Self { by_target }
    }

    /// Objects that embed `target` in an Array property.
    pub fn owners_of(&self, target: &str) -> BTreeSet<&str> {
        self.by_target
            .get(target)
            .into_iter()
            .flatten()
            .map(|r| r.owner.as_str())
            .collect()
    }

    /// Relations whose target is `target`, ordered by owner then property.
    pub fn relations_of(&self, target: &str) -> impl Iterator<Item = &UsageRelation> {
        self.by_target.get(target).into_iter().flatten()
    }

    /// All relations, ordered by target, owner, property.
    pub fn relations(&self) -> impl Iterator<Item = &UsageRelation> {
        self.by_target.values().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }
}
