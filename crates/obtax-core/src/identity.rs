//! # Record Identifiers
//!
//! Newtype wrapper for the generated-on-create identifiers carried by
//! `UUID`-typed Value facets (e.g. `ProductID`). An identifier is minted once
//! when a record is created and never reassigned.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of the canonical `8-4-4-4-12` hyphenated form.
pub const RECORD_ID_LEN: usize = 36;

/// Unique identifier assigned to a record when it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Generate a new random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier, accepting only the canonical hyphenated
    /// `8-4-4-4-12` hexadecimal grouping.
    pub fn parse(s: &str) -> Option<Self> {
        if !is_canonical_uuid(s) {
            return None;
        }
        Uuid::parse_str(s).ok().map(Self)
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Whether `s` is a hexadecimal identifier in canonical `8-4-4-4-12` grouping.
pub fn is_canonical_uuid(s: &str) -> bool {
    let groups: Vec<&str> = s.split('-').collect();
    groups.len() == 5
        && groups
            .iter()
            .zip([8usize, 4, 4, 4, 12])
            .all(|(g, len)| g.len() == len && g.bytes().all(|b| b.is_ascii_hexdigit()))
}
