//! # Product Kind — Subtype Discriminator
//!
//! A Product record is either a generic product or exactly one of the
//! product subtypes the taxonomy declares (`ProdBattery`, `ProdInverter`, ...).
//! The kind is fixed when the record is created and carried as a single tag,
//! so consumers dispatch with one `match` instead of probing every subtype
//! relation for presence.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Schema name of the Product base object.
pub const PRODUCT_SCHEMA: &str = "Product";

/// The subtype a Product record was created as.
///
/// | Kind | Subtype schema |
/// |------|----------------|
/// | Generic | `Product` |
/// | Battery | `ProdBattery` |
/// | Cell | `ProdCell` |
/// | Combiner | `ProdCombiner` |
/// | EnergyStorageSystem | `ProdEnergyStorageSystem` |
/// | Glazing | `ProdGlazing` |
/// | Inverter | `ProdInverter` |
/// | Meter | `ProdMeter` |
/// | Module | `ProdModule` |
/// | Optimizer | `ProdOptimizer` |
/// | Wire | `ProdWire` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    Generic,
    Battery,
    Cell,
    Combiner,
    EnergyStorageSystem,
    Glazing,
    Inverter,
    Meter,
    Module,
    Optimizer,
    Wire,
}

impl ProductKind {
    /// Every kind, generic first.
    pub fn all() -> &'static [ProductKind] {
        &[
            Self::Generic,
            Self::Battery,
            Self::Cell,
            Self::Combiner,
            Self::EnergyStorageSystem,
            Self::Glazing,
            Self::Inverter,
            Self::Meter,
            Self::Module,
            Self::Optimizer,
            Self::Wire,
        ]
    }

    /// Name of the taxonomy schema describing this kind.
    pub fn schema_name(&self) -> &'static str {
        match self {
            Self::Generic => PRODUCT_SCHEMA,
            Self::Battery => "ProdBattery",
            Self::Cell => "ProdCell",
            Self::Combiner => "ProdCombiner",
            Self::EnergyStorageSystem => "ProdEnergyStorageSystem",
            Self::Glazing => "ProdGlazing",
            Self::Inverter => "ProdInverter",
            Self::Meter => "ProdMeter",
            Self::Module => "ProdModule",
            Self::Optimizer => "ProdOptimizer",
            Self::Wire => "ProdWire",
        }
    }

    /// Resolve a kind from its schema name.
    pub fn from_schema_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.schema_name() == name)
    }

    /// Whether this kind is a subtype extending the Product base object.
    pub fn is_subtype(&self) -> bool {
        !matches!(self, Self::Generic)
    }
}

impl std::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.schema_name())
    }
}

impl FromStr for ProductKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_schema_name(s).ok_or_else(|| format!("unknown product kind: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn schema_names_are_unique() {
        let names: HashSet<&str> = ProductKind::all().iter().map(|k| k.schema_name()).collect();
        assert_eq!(names.len(), ProductKind::all().len());
    }

    #[test]
    fn schema_name_round_trips() {
        for kind in ProductKind::all() {
            assert_eq!(ProductKind::from_schema_name(kind.schema_name()), Some(*kind));
            assert_eq!(kind.to_string().parse::<ProductKind>().unwrap(), *kind);
        }
    }

    #[test]
    fn only_generic_is_not_a_subtype() {
        let subtypes = ProductKind::all().iter().filter(|k| k.is_subtype()).count();
        assert_eq!(subtypes, ProductKind::all().len() - 1);
        assert!("ProdUnknown".parse::<ProductKind>().is_err());
    }
}
