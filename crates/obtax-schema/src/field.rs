//! # Field Descriptors
//!
//! A compiled Element is an ordered list of [`FieldDescriptor`]s, one per
//! facet. A descriptor carries everything both downstream consumers need:
//! the persistence layer defines one storage column per descriptor
//! (`{Element}_{Facet}`), and the presentation layer renders the facets of an
//! Element as one group.
//!
//! Descriptors also check concrete values ([`FieldDescriptor::check`]), so
//! the bound, length and choice rules are enforced from the same compiled
//! data the storage schema was derived from.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use obtax_core::{is_canonical_uuid, parse_date, ConstraintViolation, RecordId, Timestamp};

/// Fractional digits of every fixed-point decimal facet.
pub const DECIMAL_PLACES: u32 = 8;
/// Total digits of every fixed-point decimal facet.
pub const DECIMAL_MAX_DIGITS: u32 = DECIMAL_PLACES * 3;
/// Default maximum length of free-text string values.
pub const STR_LEN: usize = 500;

/// One primitive sub-field of an Element. Ordered alphabetically, which is
/// also the order facets appear in a compiled Element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Facet {
    Decimals,
    EndTime,
    Precision,
    StartTime,
    Unit,
    Value,
}

impl Facet {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Decimals => "Decimals",
            Self::EndTime => "EndTime",
            Self::Precision => "Precision",
            Self::StartTime => "StartTime",
            Self::Unit => "Unit",
            Self::Value => "Value",
        }
    }
}

impl std::fmt::Display for Facet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Concrete value type of a facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValueKind {
    /// Tri-state when nullable: true, false, unset.
    Boolean,
    Integer,
    Decimal {
        max_digits: u32,
        decimal_places: u32,
    },
    Date,
    DateTime,
    String,
    /// Unique identifier generated when the record is created.
    Uuid,
}

impl ValueKind {
    /// The fixed-point decimal used by Number facets.
    pub const fn fixed_decimal() -> Self {
        Self::Decimal {
            max_digits: DECIMAL_MAX_DIGITS,
            decimal_places: DECIMAL_PLACES,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Decimal { .. } => "decimal",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::String => "string",
            Self::Uuid => "uuid",
        }
    }
}

/// One allowed value of a choice-constrained facet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub label: String,
}

/// Default applied when a record is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldDefault {
    /// A fresh random [`RecordId`].
    GenerateRecordId,
}

/// Constraint set of one facet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Allowed ids with labels; empty means unconstrained.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    pub unique: bool,
    /// Value may not change once assigned.
    pub immutable: bool,
    pub editable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldDefault>,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            max_length: None,
            choices: Vec::new(),
            unique: false,
            immutable: false,
            editable: true,
            default: None,
        }
    }
}

/// A concrete value of one facet, as stored by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FacetValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Decimal(Decimal),
    Date(chrono::NaiveDate),
    DateTime(Timestamp),
    String(String),
    Uuid(RecordId),
}

impl FacetValue {
    fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Decimal(_) => "decimal",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::String(_) => "string",
            Self::Uuid(_) => "uuid",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// JSON form used by the presentation layer.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// One compiled facet of one Element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Element the facet belongs to.
    pub element: String,
    pub facet: Facet,
    pub kind: ValueKind,
    pub nullable: bool,
    /// Empty strings allowed.
    pub blank: bool,
    pub constraints: Constraints,
}

impl FieldDescriptor {
    pub(crate) fn new(element: &str, facet: Facet, kind: ValueKind) -> Self {
        let string_like = matches!(kind, ValueKind::String);
        Self {
            element: element.to_string(),
            facet,
            kind,
            nullable: !string_like,
            blank: string_like,
            constraints: Constraints::default(),
        }
    }

    /// Storage column name, `{Element}_{Facet}`.
    pub fn column_name(&self) -> String {
        format!("{}_{}", self.element, self.facet)
    }

    /// Human-readable name, `{Element} {Facet}`.
    pub fn verbose_name(&self) -> String {
        format!("{} {}", self.element, self.facet)
    }

    /// Initial value for a new record, if the facet generates one.
    pub fn generate_default(&self) -> Option<FacetValue> {
        match self.constraints.default? {
            FieldDefault::GenerateRecordId => Some(FacetValue::Uuid(RecordId::new())),
        }
    }

    /// Check a value against this descriptor.
    pub fn check(&self, value: &FacetValue) -> Result<(), ConstraintViolation> {
        let column = || self.column_name();

        match (self.kind, value) {
            (_, FacetValue::Null) => {
                if self.nullable {
                    Ok(())
                } else {
                    Err(ConstraintViolation::NotNullable { column: column() })
                }
            }
            (ValueKind::Boolean, FacetValue::Boolean(_))
            | (ValueKind::Date, FacetValue::Date(_))
            | (ValueKind::DateTime, FacetValue::DateTime(_))
            | (ValueKind::Uuid, FacetValue::Uuid(_)) => Ok(()),
            (ValueKind::Uuid, FacetValue::String(s)) if is_canonical_uuid(s) => Ok(()),
            (ValueKind::Integer, FacetValue::Integer(i)) => self.check_bounds(Decimal::from(*i)),
            (
                ValueKind::Decimal {
                    max_digits,
                    decimal_places,
                },
                FacetValue::Decimal(_) | FacetValue::Integer(_),
            ) => {
                let d = match value {
                    FacetValue::Integer(i) => Decimal::from(*i),
                    FacetValue::Decimal(d) => *d,
                    _ => return Err(self.mismatch(value)),
                };
                self.check_digits(d, max_digits, decimal_places)?;
                self.check_bounds(d)
            }
            (ValueKind::String, FacetValue::String(s)) => self.check_string(s),
            _ => Err(self.mismatch(value)),
        }
    }

    /// Interpret a JSON value, as submitted by an API client or a pending
    /// edit, as a value of this facet's kind. Decimals accept numbers and
    /// numeric strings; dates, timestamps and identifiers accept their
    /// canonical string forms.
    pub fn parse_json(&self, value: &serde_json::Value) -> Result<FacetValue, ConstraintViolation> {
        use serde_json::Value as Json;

        let parsed = match (self.kind, value) {
            (_, Json::Null) => Some(FacetValue::Null),
            (ValueKind::Boolean, Json::Bool(b)) => Some(FacetValue::Boolean(*b)),
            (ValueKind::Integer, Json::Number(n)) => n.as_i64().map(FacetValue::Integer),
            (ValueKind::Decimal { .. }, Json::Number(n)) => {
                parse_decimal(&n.to_string()).map(FacetValue::Decimal)
            }
            (ValueKind::Decimal { .. }, Json::String(s)) => parse_decimal(s).map(FacetValue::Decimal),
            (ValueKind::Date, Json::String(s)) => parse_date(s).map(FacetValue::Date),
            (ValueKind::DateTime, Json::String(s)) => Timestamp::parse(s).map(FacetValue::DateTime),
            (ValueKind::Uuid, Json::String(s)) => RecordId::parse(s).map(FacetValue::Uuid),
            (ValueKind::String, Json::String(s)) => Some(FacetValue::String(s.clone())),
            _ => None,
        };
        parsed.ok_or_else(|| ConstraintViolation::KindMismatch {
            column: self.column_name(),
            expected: self.kind.as_str().to_string(),
            actual: json_kind(value).to_string(),
        })
    }

    /// [`parse_json`](Self::parse_json) followed by [`check`](Self::check).
    pub fn check_json(&self, value: &serde_json::Value) -> Result<FacetValue, ConstraintViolation> {
        let parsed = self.parse_json(value)?;
        self.check(&parsed)?;
        Ok(parsed)
    }

    /// Check an update from `old` to `new`, enforcing immutability.
    pub fn check_update(&self, old: &FacetValue, new: &FacetValue) -> Result<(), ConstraintViolation> {
        if self.constraints.immutable && !old.is_null() && old != new {
            return Err(ConstraintViolation::Immutable {
                column: self.column_name(),
            });
        }
        self.check(new)
    }

    fn mismatch(&self, value: &FacetValue) -> ConstraintViolation {
        ConstraintViolation::KindMismatch {
            column: self.column_name(),
            expected: self.kind.as_str().to_string(),
            actual: value.kind_name().to_string(),
        }
    }

    fn check_bounds(&self, d: Decimal) -> Result<(), ConstraintViolation> {
        if let Some(min) = self.constraints.min {
            if d < min {
                return Err(ConstraintViolation::BelowMinimum {
                    column: self.column_name(),
                    value: d.to_string(),
                    min: min.to_string(),
                });
            }
        }
        if let Some(max) = self.constraints.max {
            if d > max {
                return Err(ConstraintViolation::AboveMaximum {
                    column: self.column_name(),
                    value: d.to_string(),
                    max: max.to_string(),
                });
            }
        }
        Ok(())
    }

    fn check_digits(
        &self,
        d: Decimal,
        max_digits: u32,
        decimal_places: u32,
    ) -> Result<(), ConstraintViolation> {
        let normalized = d.normalize();
        let int_part = normalized.trunc().abs();
        let int_digits = if int_part.is_zero() {
            0
        } else {
            int_part.to_string().len() as u32
        };
        if normalized.scale() > decimal_places || int_digits > max_digits - decimal_places {
            return Err(ConstraintViolation::TooManyDigits {
                column: self.column_name(),
                value: d.to_string(),
                max_digits,
                decimal_places,
            });
        }
        Ok(())
    }

    fn check_string(&self, s: &str) -> Result<(), ConstraintViolation> {
        if s.is_empty() && self.blank {
            return Ok(());
        }
        let length = s.chars().count();
        if let Some(max_length) = self.constraints.max_length {
            if length > max_length {
                return Err(ConstraintViolation::TooLong {
                    column: self.column_name(),
                    length,
                    max_length,
                });
            }
        }
        if !self.constraints.choices.is_empty()
            && !self.constraints.choices.iter().any(|c| c.id == s)
        {
            return Err(ConstraintViolation::InvalidChoice {
                column: self.column_name(),
                value: s.to_string(),
            });
        }
        Ok(())
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    s.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
