//! Ordered field values and cursor derivation.
//!
//! Values live in a fixed-length array indexed by [`Field::position`], so the
//! cursor is computed over the declared order rather than a map's iteration
//! order.

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::field::Field;

/// The value set of one intake session.
///
/// # Invariants
///
/// - A field is filled iff its trimmed value is non-empty.
/// - Fields are filled strictly in sequence order: a later field is never
///   filled while an earlier one is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntakeFields {
    values: [String; Field::COUNT],
}

impl IntakeFields {
    /// Creates an all-empty field set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw value for a field (possibly empty).
    pub fn get(&self, field: Field) -> &str {
        &self.values[field.position()]
    }

    /// Returns true iff the field's trimmed value is non-empty.
    pub fn is_filled(&self, field: Field) -> bool {
        !self.get(field).trim().is_empty()
    }

    /// First unfilled field in sequence order, or `None` when all are filled.
    pub fn cursor(&self) -> Option<Field> {
        Field::SEQUENCE
            .iter()
            .copied()
            .find(|field| !self.is_filled(*field))
    }

    /// Returns true iff every field is filled.
    pub fn is_complete(&self) -> bool {
        self.cursor().is_none()
    }

    /// Number of filled fields.
    pub fn filled_count(&self) -> usize {
        Field::SEQUENCE.iter().filter(|f| self.is_filled(**f)).count()
    }

    /// Writes the value for the cursor field.
    ///
    /// Only the cursor may be written; this keeps the in-order invariant
    /// local to this type. Returns the field that was written, or `None` if
    /// the set is already complete.
    pub(crate) fn fill_cursor(&mut self, value: impl Into<String>) -> Option<Field> {
        let field = self.cursor()?;
        self.values[field.position()] = value.into();
        Some(field)
    }

    /// Snapshot of the filled fields, in sequence order.
    pub fn known(&self) -> KnownFields {
        KnownFields(
            Field::SEQUENCE
                .iter()
                .copied()
                .filter(|f| self.is_filled(*f))
                .map(|f| (f, self.get(f).to_string()))
                .collect(),
        )
    }

    /// Iterates all fields with their values, in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        Field::SEQUENCE.iter().map(move |f| (*f, self.get(*f)))
    }
}

impl Serialize for IntakeFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Field::COUNT))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field.as_str(), value)?;
        }
        map.end()
    }
}

/// Already-filled fields handed to the extraction service for context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownFields(Vec<(Field, String)>);

impl KnownFields {
    /// Creates an empty snapshot.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Value for a field, if it was filled when the snapshot was taken.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.as_str())
    }

    /// Number of known fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when nothing is known yet.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates known fields in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        self.0.iter().map(|(f, v)| (*f, v.as_str()))
    }

    /// First name of the participant: the token before the first whitespace
    /// of the name field, or empty when the name is unknown.
    pub fn first_name(&self) -> &str {
        self.get(Field::Name)
            .and_then(|name| name.split_whitespace().next())
            .unwrap_or("")
    }
}

impl FromIterator<(Field, String)> for KnownFields {
    fn from_iter<I: IntoIterator<Item = (Field, String)>>(iter: I) -> Self {
        let mut entries: Vec<(Field, String)> = iter
            .into_iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .collect();
        entries.sort_by_key(|(f, _)| f.position());
        entries.dedup_by_key(|(f, _)| *f);
        Self(entries)
    }
}
