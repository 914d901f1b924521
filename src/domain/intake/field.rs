//! The fixed, ordered set of intake fields.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// One intake slot.
///
/// Declaration order is the collection order. There is no runtime
/// reconfiguration, branching, or skipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// Participant's full name.
    Name,
    /// Where the participant lives.
    Address,
    /// Short statement of the problem.
    Problem,
    /// Longer description of symptoms or circumstances.
    Description,
    /// Participant's own analysis: onset, triggers, what helps.
    Analysis,
}

impl Field {
    /// All fields in collection order.
    pub const SEQUENCE: [Field; 5] = [
        Field::Name,
        Field::Address,
        Field::Problem,
        Field::Description,
        Field::Analysis,
    ];

    /// Number of fields collected per session.
    pub const COUNT: usize = Self::SEQUENCE.len();

    /// Zero-based position in the collection sequence.
    pub fn position(&self) -> usize {
        match self {
            Field::Name => 0,
            Field::Address => 1,
            Field::Problem => 2,
            Field::Description => 3,
            Field::Analysis => 4,
        }
    }

    /// The field collected after this one, if any.
    pub fn next(&self) -> Option<Field> {
        Self::SEQUENCE.get(self.position() + 1).copied()
    }

    /// Wire name used in JSON payloads and stored records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Address => "address",
            Field::Problem => "problem",
            Field::Description => "description",
            Field::Analysis => "analysis",
        }
    }

    /// Human-readable description handed to the extraction service.
    pub fn description(&self) -> &'static str {
        match self {
            Field::Name => "the participant's full name",
            Field::Address => "the participant's home address or city of residence",
            Field::Problem => "the main health problem or complaint, in a few words",
            Field::Description => "a description of the symptoms and how they present",
            Field::Analysis => {
                "the participant's own account of when it started, what makes it worse, and what helps"
            }
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::SEQUENCE
            .iter()
            .copied()
            .find(|field| field.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::invalid_format("field", format!("unknown field '{}'", s)))
    }
}
