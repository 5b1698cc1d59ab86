//! # List — schema names by kind.
//!
//! ```bash
//! obtax list
//! obtax list --kind object
//! ```

use anyhow::Result;
use clap::{Args, ValueEnum};

use obtax_schema::{SchemaClassifier, SchemaKind, TaxonomyStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindFilter {
    Element,
    Object,
    Array,
}

impl KindFilter {
    fn matches(self, kind: SchemaKind) -> bool {
        matches!(
            (self, kind),
            (Self::Element, SchemaKind::Element)
                | (Self::Object, SchemaKind::Object)
                | (Self::Array, SchemaKind::Array)
        )
    }
}

/// List subcommand arguments.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only list schemas of this kind.
    #[arg(long, value_enum)]
    pub kind: Option<KindFilter>,
}

/// Execute the list subcommand.
pub fn run_list(args: &ListArgs, store: &TaxonomyStore) -> Result<u8> {
    let rows = list(args, store);
    for (name, kind) in &rows {
        println!("{:<8} {name}", kind.as_str());
    }
    tracing::info!(count = rows.len(), "listed schemas");
    Ok(0)
}

/// `(name, kind)` rows in name order. Schemas that fail to classify are
/// reported at `warn` and left out.
pub fn list(args: &ListArgs, store: &TaxonomyStore) -> Vec<(String, SchemaKind)> {
    let classifier = SchemaClassifier::new(store);
    store
        .schemas()
        .filter_map(|(name, _)| match classifier.classify(name) {
            Ok(kind) => Some((name.to_string(), kind)),
            Err(e) => {
                tracing::warn!(schema = %name, error = %e, "skipping unclassifiable schema");
                None
            }
        })
        .filter(|(_, kind)| args.kind.map_or(true, |k| k.matches(*kind)))
        .collect()
}
