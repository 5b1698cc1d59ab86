//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types used throughout the taxonomy compiler. All errors
//! use `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Structural taxonomy errors (unknown names, unrecognised definitions,
//!   unknown superclasses, cyclic composition) are fatal for the schema being
//!   compiled and are never defaulted away.
//! - Semantic gaps (group ids missing from their item type, item types with no
//!   dedicated rule) are not errors and never surface here.
//! - Constraint violations carry the column they were raised for, so callers
//!   can report them against a storage field without extra bookkeeping.

use thiserror::Error;

/// Structural error raised while loading or compiling a taxonomy document.
#[derive(Error, Debug)]
pub enum TaxonomyError {
    /// The taxonomy document could not be read or parsed.
    #[error("taxonomy load error for '{path}': {reason}")]
    Load {
        /// Path of the document that failed to load.
        path: String,
        /// Reason the document could not be loaded.
        reason: String,
    },

    /// A schema name was looked up but is not declared in the document.
    #[error("unknown schema '{0}'")]
    UnknownSchema(String),

    /// An item type name is not declared in the document.
    #[error("unknown item type '{0}'")]
    UnknownItemType(String),

    /// An item-type group name is not declared in the document.
    #[error("unknown item type group '{0}'")]
    UnknownItemTypeGroup(String),

    /// An Element-only operation was called on an Object or Array.
    #[error("schema '{0}' is not an element")]
    NotAnElement(String),

    /// An Object-only operation was called on an Element or Array.
    #[error("schema '{0}' is not an object")]
    NotAnObject(String),

    /// An Element was compiled against a superclass outside the four categories.
    #[error("element '{element}' has unknown superclass '{superclass}'")]
    UnknownSuperclass {
        /// Element being compiled.
        element: String,
        /// The superclass reference found in its definition.
        superclass: String,
    },

    /// A definition matches none of the Element, Object or Array shapes.
    #[error("malformed schema '{name}': {reason}")]
    MalformedSchema {
        /// Schema (or property) name.
        name: String,
        /// What was wrong with the definition.
        reason: String,
    },

    /// Object composition revisited a schema already on the compile stack.
    #[error("cyclic schema composition: {}", cycle.join(" \u{2192} "))]
    CyclicSchema {
        /// The schema names forming the cycle, first name repeated at the end.
        cycle: Vec<String>,
    },
}

/// A concrete facet value rejected by a compiled field descriptor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstraintViolation {
    /// The value's kind does not match the descriptor's value kind.
    #[error("{column}: expected {expected} value, got {actual}")]
    KindMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    /// A null value was supplied for a non-nullable field.
    #[error("{column}: value may not be null")]
    NotNullable { column: String },

    /// Numeric value below the declared minimum.
    #[error("{column}: {value} is below the minimum of {min}")]
    BelowMinimum {
        column: String,
        value: String,
        min: String,
    },

    /// Numeric value above the declared maximum.
    #[error("{column}: {value} is above the maximum of {max}")]
    AboveMaximum {
        column: String,
        value: String,
        max: String,
    },

    /// Decimal value with more digits than the fixed-point column holds.
    #[error("{column}: {value} exceeds {max_digits} digits with {decimal_places} decimal places")]
    TooManyDigits {
        column: String,
        value: String,
        max_digits: u32,
        decimal_places: u32,
    },

    /// String longer than the declared maximum length.
    #[error("{column}: length {length} exceeds maximum of {max_length}")]
    TooLong {
        column: String,
        length: usize,
        max_length: usize,
    },

    /// String not among the declared choices.
    #[error("{column}: '{value}' is not a valid choice")]
    InvalidChoice { column: String, value: String },

    /// An immutable field was assigned a different value after creation.
    #[error("{column}: field is immutable once assigned")]
    Immutable { column: String },
}

impl ConstraintViolation {
    /// The column the violation was raised for.
    pub fn column(&self) -> &str {
        match self {
            Self::KindMismatch { column, .. }
            | Self::NotNullable { column }
            | Self::BelowMinimum { column, .. }
            | Self::AboveMaximum { column, .. }
            | Self::TooManyDigits { column, .. }
            | Self::TooLong { column, .. }
            | Self::InvalidChoice { column, .. }
            | Self::Immutable { column } => column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cyclic_schema_display_joins_with_arrows() {
        let err = TaxonomyError::CyclicSchema {
            cycle: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(
            err.to_string(),
            "cyclic schema composition: A \u{2192} B \u{2192} A"
        );
    }

    #[test]
    fn violation_reports_column() {
        let v = ConstraintViolation::TooLong {
            column: "ProdCode_Value".into(),
            length: 20,
            max_length: 16,
        };
        assert_eq!(v.column(), "ProdCode_Value");
        assert!(v.to_string().contains("exceeds maximum of 16"));
    }
}
