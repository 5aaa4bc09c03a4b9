//! Schema compilation and the merge engine.
//!
//! A schema is compiled once, at construction, from an ordered parameter
//! list. Each field gets a compact slot-key (its 1-based position in the
//! list) and a class: plain, `immutable`, `mutable`, or the single
//! optional `lock_key` field. The merge engine applies incoming fields to
//! a stored record under the lock/immutable/mutable policy; nothing
//! mutates a schema after compilation.

use crate::error::SchemaError;
use crate::record::{Fields, Readable, Record};
use std::collections::{HashMap, HashSet};

/// One entry of the ordered parameter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Human-facing field name.
    pub input: String,
    /// Once set, the field can never be overwritten.
    pub immutable: bool,
    /// The field stays writable even after the record is locked.
    pub mutable: bool,
    /// Designates the lock field. At most one per schema.
    pub lock_key: bool,
}

impl FieldSpec {
    /// A plain field with no flags.
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            immutable: false,
            mutable: false,
            lock_key: false,
        }
    }

    /// Marks the field immutable after its first value.
    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    /// Marks the field writable even when the record is locked.
    pub fn mutable(mut self) -> Self {
        self.mutable = true;
        self
    }

    /// Marks the field as the lock key.
    pub fn lock_key(mut self) -> Self {
        self.lock_key = true;
        self
    }
}

/// Compiled schema: slot-key assignment plus field classification.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Human name → slot-key.
    storage_map: HashMap<String, u16>,
    /// Slot-key → human name, in slot order (for the readable projection).
    names: Vec<(u16, String)>,
    /// Names that can never be overwritten once set.
    immutable: HashSet<String>,
    /// Names writable while the record is locked.
    mutable: HashSet<String>,
    /// Slot-key of the lock field, if the schema has one.
    lock_slot: Option<u16>,
}

impl Schema {
    /// Compiles an ordered parameter list.
    ///
    /// Slot-keys are the 1-based list positions. Rejects an empty list,
    /// duplicate names, and more than one `lock_key` field.
    pub fn compile(params: &[FieldSpec]) -> Result<Self, SchemaError> {
        if params.is_empty() {
            return Err(SchemaError::EmptyParams);
        }

        let mut storage_map = HashMap::with_capacity(params.len());
        let mut names = Vec::with_capacity(params.len());
        let mut immutable = HashSet::new();
        let mut mutable = HashSet::new();
        let mut lock_slot = None;
        let mut lock_name: Option<&str> = None;

        for (i, spec) in params.iter().enumerate() {
            let slot_key = (i + 1) as u16;
            if storage_map.insert(spec.input.clone(), slot_key).is_some() {
                return Err(SchemaError::DuplicateField(spec.input.clone()));
            }
            names.push((slot_key, spec.input.clone()));

            if spec.immutable {
                immutable.insert(spec.input.clone());
            }
            if spec.mutable {
                mutable.insert(spec.input.clone());
            }
            if spec.lock_key {
                if let Some(first) = lock_name {
                    return Err(SchemaError::MultipleLockFields {
                        first: first.to_owned(),
                        second: spec.input.clone(),
                    });
                }
                lock_slot = Some(slot_key);
                lock_name = Some(&spec.input);
            }
        }

        Ok(Self {
            storage_map,
            names,
            immutable,
            mutable,
            lock_slot,
        })
    }

    /// Number of fields in the schema.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` for a schema with no fields (never constructed;
    /// `compile` rejects the empty list).
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Slot-key for a human name, if the name is part of the schema.
    pub fn slot_key(&self, name: &str) -> Option<u16> {
        self.storage_map.get(name).copied()
    }

    /// Merges `incoming` into `current` under the field-class policy.
    ///
    /// The lock state is snapshotted once, before the loop: a call that
    /// introduces the lock field does not lock the remaining fields of
    /// that same call.
    ///
    /// A field is written iff its slot is still empty, or it is not
    /// immutable and either the record is unlocked or the field is
    /// explicitly mutable. Unknown names and empty-string values are
    /// skipped.
    pub fn merge_into(&self, current: &mut Record, incoming: &Fields) {
        let locked = self
            .lock_slot
            .is_some_and(|slot| current.contains(slot));

        for (name, value) in incoming {
            let Some(slot_key) = self.slot_key(name) else {
                continue;
            };
            if value.is_unset() {
                continue;
            }

            let first_write = !current.contains(slot_key);
            let overwritable =
                !self.immutable.contains(name) && (!locked || self.mutable.contains(name));
            if first_write || overwritable {
                current.insert(slot_key, value.clone());
            }
        }
    }

    /// Builds a record from scratch (merge against the canonical empty
    /// record).
    pub fn build_record(&self, incoming: &Fields) -> Record {
        let mut record = Record::new();
        self.merge_into(&mut record, incoming);
        record
    }

    /// Projects a compact record back to human names, omitting absent
    /// fields.
    pub fn readable(&self, record: &Record) -> Readable {
        let mut out = Readable::new();
        for (slot_key, name) in &self.names {
            if let Some(value) = record.get(*slot_key) {
                out.insert(name.clone(), value.clone());
            }
        }
        out
    }
}
