//! Sable Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all Sable crates.

use serde::{Deserialize, Serialize};

/// Configuration for artifact emission behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Whether the embedded debug chunk is readable through the public API.
    /// The chunk itself is always embedded; this only controls visibility.
    pub debug_public: bool,
    /// Whether to compress section payloads (reserved, currently unused)
    pub compress: bool,
}

/// Configuration for compilation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitConfig {
    /// Maximum definition arity; the binary format stores arity as u8, so
    /// effective values cap at 255
    pub max_arity: usize,
    /// Maximum number of clauses a single definition may accumulate; clause
    /// counts are stored as u16, so effective values cap at 65535
    pub max_clauses: usize,
}

/// Subsystem enum for per-area log configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Subsystem {
    Attrs,
    Defs,
    Lifecycle,
    Emit,
    Load,
}

impl Subsystem {
    /// Get the string name of the subsystem
    pub fn as_str(&self) -> &'static str {
        match self {
            Subsystem::Attrs => "attrs",
            Subsystem::Defs => "defs",
            Subsystem::Lifecycle => "lifecycle",
            Subsystem::Emit => "emit",
            Subsystem::Load => "load",
        }
    }

    /// Get the log target name for this subsystem
    pub fn target(&self) -> String {
        format!("sable::{}", self.as_str())
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            debug_public: true,
            compress: false,
        }
    }
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_arity: 255,
            max_clauses: 4096,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_compiler_config() {
        let cfg = CompilerConfig::default();
        assert!(cfg.debug_public);
        assert!(!cfg.compress);
    }

    #[test]
    fn test_default_limit_config() {
        let cfg = LimitConfig::default();
        assert_eq!(cfg.max_arity, 255);
        assert_eq!(cfg.max_clauses, 4096);
    }

    #[test]
    fn test_subsystem_as_str() {
        assert_eq!(Subsystem::Attrs.as_str(), "attrs");
        assert_eq!(Subsystem::Lifecycle.target(), "sable::lifecycle");
    }

    #[test]
    fn test_compiler_config_roundtrip() {
        let cfg = CompilerConfig {
            debug_public: false,
            compress: false,
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: CompilerConfig = serde_json::from_str(&json).unwrap();
        assert!(!back.debug_public);
    }
}
