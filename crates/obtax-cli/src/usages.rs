//! # Usages — which Objects embed a schema in an Array property.
//!
//! ```bash
//! obtax usages Package
//! obtax usages Package --candidate Product --candidate Location
//! ```

use std::collections::BTreeSet;

use anyhow::Result;
use clap::Args;

use obtax_schema::{usages_of, TaxonomyStore, UsageIndex};

/// Usages subcommand arguments.
#[derive(Args, Debug)]
pub struct UsagesArgs {
    /// Target schema name.
    pub target: String,

    /// Restrict the scan to these Objects. Scans every Object when omitted.
    #[arg(long = "candidate", value_name = "OBJECT")]
    pub candidates: Vec<String>,
}

/// Execute the usages subcommand.
pub fn run_usages(args: &UsagesArgs, store: &TaxonomyStore) -> Result<u8> {
    for owner in owners(args, store)? {
        println!("{owner}");
    }
    Ok(0)
}

/// Owners of `args.target`, sorted.
pub fn owners(args: &UsagesArgs, store: &TaxonomyStore) -> Result<BTreeSet<String>> {
    store.lookup(&args.target)?;
    if args.candidates.is_empty() {
        let index = UsageIndex::build(store);
        return Ok(index
            .owners_of(&args.target)
            .into_iter()
            .map(str::to_string)
            .collect());
    }
    Ok(usages_of(store, &args.target, &args.candidates)?)
}
