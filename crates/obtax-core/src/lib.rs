//! # obtax-core — Foundational Types for the Taxonomy Compiler
//!
//! The leaf crate of the workspace. It defines the error hierarchy shared by
//! every other crate together with the small domain primitives compiled
//! field values are expressed in.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `obtax-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod kind;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use error::{ConstraintViolation, TaxonomyError};
pub use identity::{is_canonical_uuid, RecordId, RECORD_ID_LEN};
pub use kind::{ProductKind, PRODUCT_SCHEMA};
pub use temporal::{parse_date, Timestamp};
