//! # Columns — persistence columns of one Object.
//!
//! ```bash
//! obtax columns Product
//! obtax columns Product --json
//! ```

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use obtax_schema::{ObjectCompiler, ObjectOverrides, TaxonomyStore};

/// Columns subcommand arguments.
#[derive(Args, Debug)]
pub struct ColumnsArgs {
    /// Object schema name.
    pub object: String,

    /// Emit a JSON array instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// One storage column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnRow {
    pub name: String,
    pub verbose_name: String,
    pub kind: &'static str,
    pub nullable: bool,
}

/// Execute the columns subcommand.
pub fn run_columns(args: &ColumnsArgs, store: &TaxonomyStore) -> Result<u8> {
    let rows = columns(args, store)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for row in &rows {
            let null = if row.nullable { "null" } else { "not null" };
            println!("{:<40} {:<9} {null}", row.name, row.kind);
        }
    }
    Ok(0)
}

/// Columns of the Object's own Elements, in property then facet order.
pub fn columns(args: &ColumnsArgs, store: &TaxonomyStore) -> Result<Vec<ColumnRow>> {
    let object = ObjectCompiler::new(store).compile(&args.object, &ObjectOverrides::new())?;
    Ok(object
        .columns()
        .into_iter()
        .map(|f| ColumnRow {
            name: f.column_name(),
            verbose_name: f.verbose_name(),
            kind: f.kind.as_str(),
            nullable: f.nullable,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::store;

    fn args(object: &str) -> ColumnsArgs {
        ColumnsArgs {
            object: object.to_string(),
            json: false,
        }
    }

    #[test]
    fn dimension_columns() {
        let rows = columns(&args("Dimension"), &store()).unwrap();
        // Height, Length, Mass carry a Unit; Width's group keeps "m".
        assert_eq!(rows.len(), 4 * 6);
        assert_eq!(rows[0].name, "Height_Decimals");
        assert_eq!(rows[0].verbose_name, "Height Decimals");
        assert_eq!(rows.last().unwrap().name, "Width_Value");
    }

    #[test]
    fn uuid_value_column_is_not_nullable() {
        let rows = columns(&args("Product"), &store()).unwrap();
        let id = rows.iter().find(|r| r.name == "ProductID_Value").unwrap();
        assert_eq!(id.kind, "uuid");
        assert!(!id.nullable);
    }

    #[test]
    fn elements_have_no_columns_of_their_own() {
        assert!(columns(&args("Height"), &store()).is_err());
    }
}
