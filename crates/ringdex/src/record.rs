//! Record encoding: the structured values held in ring slots.
//!
//! Internally a record is keyed by compact slot-keys (dense small integers
//! assigned in schema order) so the serialized form stays small; the
//! human-name view is produced on demand by
//! [`Schema::readable`](crate::Schema::readable). Slots are stored as JSON
//! objects, so an empty record (`{}`) is always distinguishable from an
//! absent slot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single field value.
///
/// Inputs are usually textual, but numeric and boolean values round-trip
/// unchanged. The empty string is the "unset" sentinel: merging skips it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// UTF-8 text.
    Str(String),
    /// Signed integer.
    Int(i64),
    /// Floating point.
    Float(f64),
    /// Boolean.
    Bool(bool),
}

impl FieldValue {
    /// Returns `true` for the empty-string sentinel, which merge treats
    /// as "no value supplied".
    #[inline]
    pub fn is_unset(&self) -> bool {
        matches!(self, FieldValue::Str(s) if s.is_empty())
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Int(n)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Float(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

/// Incoming fields for a `set` call, keyed by human name.
pub type Fields = BTreeMap<String, FieldValue>;

/// The readable projection of a record, keyed by human name.
pub type Readable = BTreeMap<String, FieldValue>;

/// A record in its internal compact form: slot-key → value.
///
/// Serializes as a JSON object with stringified integer keys
/// (`{"1":"a","3":7}`), the sparse-array-as-object encoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub(crate) BTreeMap<u16, FieldValue>);

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no field has been written yet.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of populated fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Value under a slot-key, if populated.
    pub(crate) fn get(&self, slot_key: u16) -> Option<&FieldValue> {
        self.0.get(&slot_key)
    }

    pub(crate) fn insert(&mut self, slot_key: u16, value: FieldValue) {
        self.0.insert(slot_key, value);
    }

    pub(crate) fn contains(&self, slot_key: u16) -> bool {
        self.0.contains_key(&slot_key)
    }
}

/// One occupied ring slot: the owning identifier plus its record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotEntry {
    /// Identifier that owns this slot.
    pub key: String,
    /// The compact record.
    pub data: Record,
}

impl SlotEntry {
    /// Creates a slot entry for `key` with the given record.
    pub fn new(key: impl Into<String>, data: Record) -> Self {
        Self {
            key: key.into(),
            data,
        }
    }

    /// Serializes to the store's opaque-string value format.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes from a stored value. Callers treat failures as an
    /// empty slot (logged at the call site).
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_encodes_distinct_from_absent() {
        let entry = SlotEntry::new("id-1", Record::new());
        let raw = entry.encode().unwrap();
        assert_eq!(raw, r#"{"key":"id-1","data":{}}"#);

        let back = SlotEntry::decode(&raw).unwrap();
        assert!(back.data.is_empty());
        assert_eq!(back.key, "id-1");
    }

    #[test]
    fn slot_keys_round_trip_as_object_keys() {
        let mut rec = Record::new();
        rec.insert(1, FieldValue::from("alpha"));
        rec.insert(3, FieldValue::Int(7));
        let entry = SlotEntry::new("x", rec.clone());

        let raw = entry.encode().unwrap();
        // Sparse keys serialize as a JSON object, not an array.
        assert!(raw.contains(r#""1":"alpha""#));
        assert!(raw.contains(r#""3":7"#));

        let back = SlotEntry::decode(&raw).unwrap();
        assert_eq!(back.data, rec);
    }

    #[test]
    fn unset_sentinel_is_empty_string_only() {
        assert!(FieldValue::from("").is_unset());
        assert!(!FieldValue::from("0").is_unset());
        assert!(!FieldValue::Int(0).is_unset());
        assert!(!FieldValue::Bool(false).is_unset());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(SlotEntry::decode("not json").is_err());
        assert!(SlotEntry::decode(r#"{"data":{}}"#).is_err());
    }
}
