//! Module attribute storage
//!
//! Attributes are write-mostly during the open phase and read back by hooks,
//! introspection and artifact emission. Two storage modes exist per key:
//! scalar (last write wins, including explicit nil writes) and accumulate
//! (writes prepend, reads see newest first). Keys registered with `persist`
//! are snapshotted into the emitted artifact at finalization.

use crate::error::ModuleError;
use crate::value::Value;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct AttrEntry {
    accumulate: bool,
    persist: bool,
    /// Recorded values, newest first. Scalar entries hold at most one.
    values: Vec<Value>,
    /// Whether any write was ever recorded (registration alone leaves false)
    written: bool,
}

impl AttrEntry {
    fn scalar() -> Self {
        Self {
            accumulate: false,
            persist: false,
            values: Vec::new(),
            written: false,
        }
    }
}

/// Per-unit attribute storage.
///
/// The store freezes when the owning unit closes; every mutation after that
/// fails with `ReadOnlyViolation` citing the freeze cause.
#[derive(Debug, Clone)]
pub struct AttributeStore {
    unit: String,
    entries: HashMap<String, AttrEntry>,
    /// First-touch key order, kept stable for `keys` and the persisted
    /// snapshot
    order: Vec<String>,
    frozen: Option<&'static str>,
}

impl AttributeStore {
    pub fn new(unit: &str) -> Self {
        Self {
            unit: unit.to_string(),
            entries: HashMap::new(),
            order: Vec::new(),
            frozen: None,
        }
    }

    fn ensure_writable(&self, operation: String) -> Result<(), ModuleError> {
        match self.frozen {
            None => Ok(()),
            Some(cause) => Err(ModuleError::ReadOnlyViolation {
                unit: self.unit.clone(),
                operation,
                cause,
            }),
        }
    }

    fn touch_order(&mut self, key: &str) {
        if !self.order.iter().any(|k| k == key) {
            self.order.push(key.to_string());
        }
    }

    /// Register a key with explicit semantics before any write.
    ///
    /// Registering an accumulating key seeds an empty accumulator, which is
    /// observably different from an unregistered key. Re-registering a key
    /// that has no recorded writes updates its semantics in place; once
    /// values exist the registration is rejected and nothing is reshaped.
    pub fn register(&mut self, key: &str, accumulate: bool, persist: bool) -> Result<(), ModuleError> {
        self.ensure_writable(format!("register attribute @{}", key))?;

        if let Some(entry) = self.entries.get_mut(key) {
            if entry.written {
                return Err(ModuleError::AlreadyRegistered {
                    unit: self.unit.clone(),
                    key: key.to_string(),
                });
            }
            entry.accumulate = accumulate;
            entry.persist = persist;
            return Ok(());
        }

        tracing::debug!(
            target: "sable::attrs",
            unit = %self.unit,
            key,
            accumulate,
            persist,
            "attribute registered"
        );
        self.entries.insert(
            key.to_string(),
            AttrEntry {
                accumulate,
                persist,
                values: Vec::new(),
                written: false,
            },
        );
        self.touch_order(key);
        Ok(())
    }

    /// Record a write. Unregistered keys are created as scalars.
    pub fn put(&mut self, key: &str, value: Value) -> Result<(), ModuleError> {
        self.ensure_writable(format!("put attribute @{}", key))?;

        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(AttrEntry::scalar);
        if entry.accumulate {
            // Newest first
            entry.values.insert(0, value);
        } else {
            entry.values.clear();
            entry.values.push(value);
        }
        entry.written = true;
        self.touch_order(key);
        Ok(())
    }

    /// Read the current value.
    ///
    /// Accumulating keys always read as a list (newest first), empty once
    /// registered even with zero writes. Scalar keys read the last write,
    /// nil included; the default only applies to keys never written.
    pub fn get(&self, key: &str, default: Value) -> Value {
        match self.entries.get(key) {
            Some(entry) if entry.accumulate => Value::List(entry.values.clone()),
            Some(entry) if entry.written => entry.values[0].clone(),
            _ => default,
        }
    }

    /// Read the most recent single write regardless of mode
    pub fn get_last(&self, key: &str, default: Value) -> Value {
        match self.entries.get(key) {
            Some(entry) if entry.written => entry.values[0].clone(),
            _ => default,
        }
    }

    /// Remove a key entirely. Returns whether it was present.
    pub fn delete(&mut self, key: &str) -> Result<bool, ModuleError> {
        self.ensure_writable(format!("delete attribute @{}", key))?;
        let existed = self.entries.remove(key).is_some();
        if existed {
            self.order.retain(|k| k != key);
        }
        Ok(existed)
    }

    /// Whether the key is present: it has recorded writes, or it is a
    /// registered accumulator (registration alone makes those present).
    pub fn has(&self, key: &str) -> bool {
        match self.entries.get(key) {
            Some(entry) => entry.written || entry.accumulate,
            None => false,
        }
    }

    /// Present keys in first-touch order (stable within a run)
    pub fn keys(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|k| self.has(k))
            .cloned()
            .collect()
    }

    /// Snapshot of persisted keys for artifact emission, values oldest
    /// first. Persisted keys with zero recorded writes produce no entry.
    pub fn persisted_snapshot(&self) -> Vec<(String, Vec<Value>)> {
        let mut out = Vec::new();
        for key in &self.order {
            let entry = match self.entries.get(key) {
                Some(e) => e,
                None => continue,
            };
            if !entry.persist || !entry.written {
                continue;
            }
            let mut values = entry.values.clone();
            values.reverse();
            out.push((key.clone(), values));
        }
        out
    }

    /// Freeze the store; later mutations cite `cause`
    pub fn freeze(&mut self, cause: &'static str) {
        self.frozen = Some(cause);
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }
}
