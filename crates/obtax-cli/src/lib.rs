//! # obtax-cli — CLI Tool for the Taxonomy Compiler
//!
//! Provides the `obtax` command-line interface. The taxonomy document is
//! located once ([`config::TaxonomyConfig`]), loaded once, and handed to the
//! subcommand.
//!
//! ## Subcommands
//!
//! - `obtax compile <NAME>`: compiled Element or Object as JSON.
//! - `obtax usages <NAME>`: Objects embedding NAME in an Array property.
//! - `obtax list`: schema names, optionally filtered by kind.
//! - `obtax columns <OBJECT>`: persistence columns of an Object.
//!
//! ## Crate Policy
//!
//! - Argument parsing lives here; resolution logic lives in `obtax-schema`.
//! - Handlers build their output as values and print it in one place, so
//!   tests exercise the same code path as the binary.

pub mod columns;
pub mod compile;
pub mod config;
pub mod list;
pub mod usages;

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    use obtax_schema::TaxonomyStore;

    pub fn fixture() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("obtax-schema")
            .join("tests")
            .join("fixtures")
            .join("ob-taxonomy.json")
    }

    pub fn store() -> TaxonomyStore {
        TaxonomyStore::load(fixture()).unwrap()
    }
}
