//! Module definition table
//!
//! Definitions are keyed by `(name, arity)`. Introspection during compilation
//! reports declaration order; artifact emission reads a sorted view so that
//! declaration order never leaks into emitted bytes.

use crate::error::ModuleError;
use crate::value::Value;
use std::collections::HashMap;

/// Definition key: name plus arity (0..=255)
pub type DefKey = (String, u8);

/// The four definition kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DefKind {
    PublicFunction,
    PrivateFunction,
    PublicMacro,
    PrivateMacro,
}

impl DefKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefKind::PublicFunction => "def",
            DefKind::PrivateFunction => "defp",
            DefKind::PublicMacro => "defmacro",
            DefKind::PrivateMacro => "defmacrop",
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, DefKind::PublicFunction | DefKind::PublicMacro)
    }

    pub fn is_macro(&self) -> bool {
        matches!(self, DefKind::PublicMacro | DefKind::PrivateMacro)
    }

    pub fn to_u8(self) -> u8 {
        match self {
            DefKind::PublicFunction => 0,
            DefKind::PrivateFunction => 1,
            DefKind::PublicMacro => 2,
            DefKind::PrivateMacro => 3,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(DefKind::PublicFunction),
            1 => Some(DefKind::PrivateFunction),
            2 => Some(DefKind::PublicMacro),
            3 => Some(DefKind::PrivateMacro),
            _ => None,
        }
    }
}

impl std::fmt::Display for DefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One clause of a definition. Patterns, guard and body are opaque terms at
/// this layer.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Clause {
    pub params: Vec<Value>,
    pub guard: Option<Value>,
    pub body: Value,
    /// Resolved absolute source line
    pub line: u32,
    pub column: u32,
}

/// Introspection view of a single definition
#[derive(Debug, Clone)]
pub struct Definition {
    pub name: String,
    pub arity: u8,
    pub kind: DefKind,
    /// Empty when the lookup skipped clause bodies
    pub clauses: Vec<Clause>,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone)]
struct DefEntry {
    kind: DefKind,
    clauses: Vec<Clause>,
    line: u32,
    column: u32,
    /// Set by `make_overridable`; cleared when a replacement define arrives
    awaiting_replacement: bool,
    /// Whether any clause was recorded while before-compile hooks ran
    defined_in_hook: bool,
}

/// Per-unit definition storage
#[derive(Debug, Clone)]
pub struct DefinitionTable {
    unit: String,
    entries: HashMap<DefKey, DefEntry>,
    decl_order: Vec<DefKey>,
    frozen: Option<&'static str>,
    max_clauses: usize,
}

impl DefinitionTable {
    pub fn new(unit: &str, max_clauses: usize) -> Self {
        Self {
            unit: unit.to_string(),
            entries: HashMap::new(),
            decl_order: Vec::new(),
            frozen: None,
            max_clauses,
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

    /// Record one clause. Repeated defines for the same key append clauses;
    /// a define against a key awaiting replacement supplies the replacement
    /// and keeps exactly the new clauses.
    pub fn define(
        &mut self,
        kind: DefKind,
        name: &str,
        arity: u8,
        clause: Clause,
        in_hook: bool,
    ) -> Result<(), ModuleError> {
        self.ensure_writable(format!("define {}/{}", name, arity))?;

        let key = (name.to_string(), arity);
        match self.entries.get_mut(&key) {
            Some(entry) => {
                if entry.awaiting_replacement {
                    entry.clauses.clear();
                    entry.kind = kind;
                    entry.line = clause.line;
                    entry.column = clause.column;
                    entry.awaiting_replacement = false;
                } else if entry.clauses.len() >= self.max_clauses {
                    return Err(ModuleError::TooManyClauses {
                        name: name.to_string(),
                        arity,
                        max: self.max_clauses,
                    });
                }
                entry.defined_in_hook |= in_hook;
                entry.clauses.push(clause);
            }
            None => {
                tracing::debug!(
                    target: "sable::defs",
                    unit = %self.unit,
                    name,
                    arity,
                    kind = %kind,
                    "definition recorded"
                );
                self.entries.insert(
                    key.clone(),
                    DefEntry {
                        kind,
                        line: clause.line,
                        column: clause.column,
                        clauses: vec![clause],
                        awaiting_replacement: false,
                        defined_in_hook: in_hook,
                    },
                );
                self.decl_order.push(key);
            }
        }
        Ok(())
    }

    pub fn defines(&self, name: &str, arity: u8) -> bool {
        self.entries.contains_key(&(name.to_string(), arity))
    }

    /// Existence check restricted to one definition kind
    pub fn defines_kind(&self, name: &str, arity: u8, kind: DefKind) -> bool {
        self.entries
            .get(&(name.to_string(), arity))
            .map(|e| e.kind == kind)
            .unwrap_or(false)
    }

    /// Keys in declaration order, optionally filtered by kind
    pub fn definitions_in(&self, filter: Option<DefKind>) -> Vec<DefKey> {
        self.decl_order
            .iter()
            .filter(|key| match (self.entries.get(*key), filter) {
                (Some(entry), Some(kind)) => entry.kind == kind,
                (Some(_), None) => true,
                (None, _) => false,
            })
            .cloned()
            .collect()
    }

    /// Look up one definition. `skip_clauses` returns the header only, for
    /// callers that just need kind and location.
    pub fn get_definition(&self, name: &str, arity: u8, skip_clauses: bool) -> Option<Definition> {
        let entry = self.entries.get(&(name.to_string(), arity))?;
        Some(Definition {
            name: name.to_string(),
            arity,
            kind: entry.kind,
            clauses: if skip_clauses {
                Vec::new()
            } else {
                entry.clauses.clone()
            },
            line: entry.line,
            column: entry.column,
        })
    }

    /// Remove a definition. Returns false when the key is absent or the
    /// table is past its writable phases (no error in either case).
    pub fn delete_definition(&mut self, name: &str, arity: u8) -> bool {
        if self.frozen.is_some() {
            return false;
        }
        let key = (name.to_string(), arity);
        if self.entries.remove(&key).is_some() {
            self.decl_order.retain(|k| *k != key);
            true
        } else {
            false
        }
    }

    /// Mark keys as overridable. All keys are validated before any is
    /// marked: arity must fit the definition keyspace and every key must
    /// name an existing definition.
    pub fn make_overridable(&mut self, keys: &[(String, u32)]) -> Result<(), ModuleError> {
        self.ensure_writable("make definitions overridable".to_string())?;

        for (name, arity) in keys {
            if *arity > u8::MAX as u32 {
                return Err(ModuleError::InvalidArity {
                    name: name.clone(),
                    arity: *arity,
                    max: u8::MAX as usize,
                });
            }
            if !self.defines(name, *arity as u8) {
                return Err(ModuleError::UndefinedDefinition {
                    name: name.clone(),
                    arity: *arity,
                });
            }
        }
        for (name, arity) in keys {
            let entry = self
                .entries
                .get_mut(&(name.clone(), *arity as u8))
                .expect("validated above");
            // Hook-injected definitions are their own replacement; marking
            // them overridable must not schedule them for dropping.
            if !entry.defined_in_hook {
                entry.awaiting_replacement = true;
            }
        }
        Ok(())
    }

    /// Drop entries still awaiting a replacement. Called once when the unit
    /// closes; returns the dropped keys for logging.
    pub fn drop_unreplaced(&mut self) -> Vec<DefKey> {
        let dropped: Vec<DefKey> = self
            .decl_order
            .iter()
            .filter(|key| {
                self.entries
                    .get(*key)
                    .map(|e| e.awaiting_replacement)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        for key in &dropped {
            self.entries.remove(key);
        }
        self.decl_order.retain(|k| !dropped.contains(k));
        dropped
    }

    /// Emission view: every definition sorted by `(name, arity)`,
    /// independent of declaration order.
    pub fn sorted_definitions(&self) -> Vec<Definition> {
        let mut keys: Vec<&DefKey> = self.entries.keys().collect();
        keys.sort();
        keys.into_iter()
            .map(|(name, arity)| {
                self.get_definition(name, *arity, false)
                    .expect("key taken from the entry map")
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze the table; later mutations cite `cause`
    pub fn freeze(&mut self, cause: &'static str) {
        self.frozen = Some(cause);
    }
}
