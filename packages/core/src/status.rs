//! Numeric status codes shared by every fallible operation.
//!
//! Codes are grouped by category so automated callers can branch on the
//! hundreds digit without matching individual variants:
//!
//! | Range | Category |
//! |-------|----------|
//! | `0` | success |
//! | `1xx` | document parse failure |
//! | `2xx` | structural-schema failure |
//! | `3xx` | immutability violation |
//! | `4xx` | text-shape or semantic failure |
//! | `5xx` | missing or mismatched reference |
//! | `6xx` | cardinality or value-constraint violation |
//! | `7xx` | duplicate identifier |
//! | `8xx` | specialization cycle |

use std::fmt;

/// A status code attached to every error in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum StatusCode {
    Ok = 0,
    ParseFailure = 100,
    UnknownItemKind = 101,
    SchemaLoad = 102,
    SchemaViolation = 200,
    MalformedItem = 201,
    ImmutableField = 300,
    InvalidText = 400,
    SemanticViolation = 401,
    MissingReference = 500,
    KindMismatch = 501,
    NotEligible = 502,
    CardinalityViolation = 600,
    ValueConstraint = 601,
    DuplicateIdentifier = 700,
    SpecializationCycle = 800,
}

impl StatusCode {
    /// The numeric value of this code.
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn is_ok(self) -> bool {
        self == StatusCode::Ok
    }

    /// Machine-readable category name for the code's range.
    pub fn category(self) -> &'static str {
        match self.code() / 100 {
            0 => "ok",
            1 => "parse_failure",
            2 => "schema_violation",
            3 => "immutability_violation",
            4 => "semantic_violation",
            5 => "reference_violation",
            6 => "cardinality_violation",
            7 => "duplicate_identifier",
            _ => "specialization_cycle",
        }
    }
}

/// Formats as `"<code> <category>"`, e.g. `"600 cardinality_violation"`.
impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.category())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_hundreds_digit() {
        assert_eq!(StatusCode::Ok.category(), "ok");
        assert_eq!(StatusCode::UnknownItemKind.category(), "parse_failure");
        assert_eq!(StatusCode::MalformedItem.category(), "schema_violation");
        assert_eq!(StatusCode::ValueConstraint.category(), "cardinality_violation");
        assert_eq!(StatusCode::SpecializationCycle.code(), 800);
    }

    #[test]
    fn display_includes_code_and_category() {
        assert_eq!(StatusCode::ImmutableField.to_string(), "300 immutability_violation");
    }
}
