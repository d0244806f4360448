//! Argument validation against a tool's declared parameters
//!
//! Validation collects every violation in one pass before reporting, so a
//! caller sees the complete set of problems at once instead of discovering
//! them one request at a time. Unknown extra keys are tolerated and passed
//! through to the tool untouched.

use std::fmt;

use super::{Arguments, ParamKind, ParamSpec};

/// A value whose runtime type does not satisfy the declared kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMismatch {
    pub field: String,
    pub expected: &'static str,
    pub found: &'static str,
}

/// Every violation found in one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationFailure {
    pub missing: Vec<String>,
    pub mismatches: Vec<TypeMismatch>,
}

impl ValidationFailure {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.mismatches.is_empty()
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!(
                "missing required field(s): {}",
                self.missing.join(", ")
            ));
        }
        for mismatch in &self.mismatches {
            parts.push(format!(
                "type mismatch for '{}': expected {}, got {}",
                mismatch.field, mismatch.expected, mismatch.found
            ));
        }
        write!(f, "invalid arguments: {}", parts.join("; "))
    }
}

impl std::error::Error for ValidationFailure {}

/// Check `args` against the declared parameters.
///
/// Required fields must be present; any present field must match its
/// declared kind. A `null` value counts as a type mismatch, not an absence.
pub fn validate_arguments(params: &[ParamSpec], args: &Arguments) -> Result<(), ValidationFailure> {
    let mut failure = ValidationFailure::default();

    for param in params {
        match args.get(&param.name) {
            None => {
                if param.required {
                    failure.missing.push(param.name.clone());
                }
            }
            Some(value) => {
                if !param.kind.matches(value) {
                    failure.mismatches.push(TypeMismatch {
                        field: param.name.clone(),
                        expected: param.kind.as_str(),
                        found: ParamKind::value_type_name(value),
                    });
                }
            }
        }
    }

    if failure.is_empty() {
        Ok(())
    } else {
        Err(failure)
    }
}

/// Merge declared defaults into a copy of the arguments. Fields the caller
/// supplied are never overwritten.
pub fn merge_defaults(params: &[ParamSpec], args: &Arguments) -> Arguments {
    let mut merged = args.clone();
    for param in params {
        if let Some(default) = &param.default
            && !merged.contains_key(&param.name)
        {
            merged.insert(param.name.clone(), default.clone());
        }
    }
    merged
}
