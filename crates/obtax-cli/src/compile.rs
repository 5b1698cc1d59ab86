//! # Compile — print the compiled form of one schema.
//!
//! ```bash
//! obtax compile Height
//! obtax compile Product --max-length ProdCode=16 --read-only ProductID
//! ```
//!
//! Overrides are keyed by property name. When NAME is itself an Element,
//! an override keyed by NAME applies to it.

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::{json, Value};

use obtax_schema::{
    ObjectCompiler, ObjectOverrides, SchemaClassifier, SchemaKind, TaxonomyStore, ValueOverrides,
};

/// Compile subcommand arguments.
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Schema name (Element, Object or Array).
    pub name: String,

    /// Narrow a property's maximum length, as `PROPERTY=N`. Repeatable.
    #[arg(long = "max-length", value_name = "PROPERTY=N")]
    pub max_length: Vec<String>,

    /// Mark a property's Value as not editable. Repeatable.
    #[arg(long = "read-only", value_name = "PROPERTY")]
    pub read_only: Vec<String>,

    /// Emit compact JSON instead of pretty-printed.
    #[arg(long)]
    pub compact: bool,
}

impl CompileArgs {
    /// Collect the override flags into per-property overrides.
    pub fn overrides(&self) -> Result<ObjectOverrides> {
        let mut overrides = ObjectOverrides::new();
        for spec in &self.max_length {
            let (property, n) = spec
                .split_once('=')
                .with_context(|| format!("--max-length expects PROPERTY=N, got '{spec}'"))?;
            let n: usize = n
                .parse()
                .with_context(|| format!("--max-length value for '{property}' is not a length"))?;
            if property.is_empty() {
                bail!("--max-length expects PROPERTY=N, got '{spec}'");
            }
            overrides.entry(property.to_string()).or_default().max_length = Some(n);
        }
        for property in &self.read_only {
            overrides.entry(property.clone()).or_default().editable = Some(false);
        }
        Ok(overrides)
    }
}

/// Execute the compile subcommand.
pub fn run_compile(args: &CompileArgs, store: &TaxonomyStore) -> Result<u8> {
    let compiled = compile_json(args, store)?;
    let out = if args.compact {
        serde_json::to_string(&compiled)?
    } else {
        serde_json::to_string_pretty(&compiled)?
    };
    println!("{out}");
    Ok(0)
}

/// The compiled schema as JSON, tagged with its kind.
pub fn compile_json(args: &CompileArgs, store: &TaxonomyStore) -> Result<Value> {
    let overrides = args.overrides()?;
    let name = args.name.as_str();
    let kind = SchemaClassifier::new(store).classify(name)?;
    tracing::debug!(schema = %name, kind = kind.as_str(), "compiling");

    let compiler = ObjectCompiler::new(store);
    let body = match kind {
        SchemaKind::Element => {
            let value = overrides.get(name).cloned().unwrap_or_else(ValueOverrides::default);
            serde_json::to_value(compiler.compile_element(name, &value)?)?
        }
        SchemaKind::Object => serde_json::to_value(compiler.compile(name, &overrides)?)?,
        SchemaKind::Array => {
            let items = match store.lookup(name)? {
                obtax_schema::SchemaDefinition::Array(a) => a.items.clone(),
                _ => bail!("'{name}' classified as an array but has no item schema"),
            };
            json!({ "name": name, "items": items })
        }
    };
    Ok(json!({ "kind": kind, "schema": body }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::store;

    fn args(name: &str) -> CompileArgs {
        CompileArgs {
            name: name.to_string(),
            max_length: Vec::new(),
            read_only: Vec::new(),
            compact: false,
        }
    }

    #[test]
    fn compiles_an_element() {
        let out = compile_json(&args("Height"), &store()).unwrap();
        assert_eq!(out["kind"], "element");
        let facets = out["schema"]["facets"].as_array().unwrap();
        assert_eq!(facets.len(), 6);
        assert_eq!(facets[4]["facet"], "Unit");
    }

    #[test]
    fn compiles_an_object_with_overrides() {
        let mut a = args("Product");
        a.max_length.push("ProdCode=16".into());
        a.read_only.push("Description".into());
        let out = compile_json(&a, &store()).unwrap();
        assert_eq!(out["kind"], "object");

        let elements = out["schema"]["elements"].as_array().unwrap();
        let value_of = |property: &str| {
            let e = elements.iter().find(|e| e["property"] == property).unwrap();
            e["element"]["facets"]
                .as_array()
                .unwrap()
                .iter()
                .find(|f| f["facet"] == "Value")
                .unwrap()
                .clone()
        };
        assert_eq!(value_of("ProdCode")["constraints"]["max_length"], 16);
        assert_eq!(value_of("Description")["constraints"]["editable"], false);
    }

    #[test]
    fn compiles_an_array() {
        let out = compile_json(&args("Packages"), &store()).unwrap();
        assert_eq!(out["kind"], "array");
        assert_eq!(out["schema"]["items"], "Package");
    }

    #[test]
    fn rejects_bad_overrides() {
        let mut a = args("Product");
        a.max_length.push("ProdCode".into());
        assert!(compile_json(&a, &store()).is_err());

        let mut a = args("Product");
        a.max_length.push("ProdCode=wide".into());
        assert!(compile_json(&a, &store()).is_err());
    }

    #[test]
    fn unknown_schemas_fail() {
        let err = compile_json(&args("Nope"), &store()).unwrap_err();
        assert!(err.to_string().contains("Nope"));
    }
}
