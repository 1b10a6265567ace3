//! Compile-time hook registry
//!
//! Hooks are a fixed, enumerated set dispatched by tagged kind. Callbacks
//! are `Arc`'d closures stored per kind in registration order, which is also
//! their invocation order. The registry is cloned before iteration on every
//! dispatch path so a running hook may register further hooks without
//! aliasing the live unit.

use crate::binary::Artifact;
use crate::defs::{Clause, DefKind};
use crate::error::ModuleError;
use crate::unit::ModuleUnit;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// The fixed set of hook kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    BeforeCompile,
    AfterCompile,
    AfterVerify,
    OnDefinition,
    OnLoad,
}

impl HookKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookKind::BeforeCompile => "before_compile",
            HookKind::AfterCompile => "after_compile",
            HookKind::AfterVerify => "after_verify",
            HookKind::OnDefinition => "on_definition",
            HookKind::OnLoad => "on_load",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification payload delivered to on-definition hooks right after a
/// clause is recorded
#[derive(Debug, Clone)]
pub struct DefinitionEvent {
    pub kind: DefKind,
    pub name: String,
    pub arity: u8,
    pub clause: Clause,
}

/// Runs while the unit is still open and mutable
pub type BeforeCompileHook = Arc<dyn Fn(&mut ModuleUnit) -> Result<(), ModuleError> + Send + Sync>;
/// Runs after emission against the read-only unit and the emitted artifact
pub type AfterCompileHook =
    Arc<dyn Fn(&mut ModuleUnit, &Artifact) -> Result<(), ModuleError> + Send + Sync>;
/// Fires synchronously after each recorded definition clause
pub type OnDefinitionHook =
    Arc<dyn Fn(&mut ModuleUnit, &DefinitionEvent) -> Result<(), ModuleError> + Send + Sync>;
/// Fires after post-compile verification; receives the unit name only
pub type AfterVerifyHook = Arc<dyn Fn(&str) -> Result<(), ModuleError> + Send + Sync>;
/// Runs exactly once at load time; any return other than the `ok` atom
/// aborts the load
pub type OnLoadHook = Arc<dyn Fn(&str) -> Value + Send + Sync>;

/// Per-unit hook storage
#[derive(Default, Clone)]
pub struct HookRegistry {
    before_compile: Vec<BeforeCompileHook>,
    after_compile: Vec<AfterCompileHook>,
    on_definition: Vec<OnDefinitionHook>,
    after_verify: Vec<AfterVerifyHook>,
    on_load: Option<OnLoadHook>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_before_compile(&mut self, hook: BeforeCompileHook) {
        self.before_compile.push(hook);
    }

    pub fn add_after_compile(&mut self, hook: AfterCompileHook) {
        self.after_compile.push(hook);
    }

    pub fn add_on_definition(&mut self, hook: OnDefinitionHook) {
        self.on_definition.push(hook);
    }

    pub fn add_after_verify(&mut self, hook: AfterVerifyHook) {
        self.after_verify.push(hook);
    }

    /// At most one on-load callback per unit; last registration wins
    pub fn set_on_load(&mut self, hook: OnLoadHook) {
        self.on_load = Some(hook);
    }

    /// Snapshot of the before-compile hooks in registration order
    pub fn before_compile(&self) -> Vec<BeforeCompileHook> {
        self.before_compile.clone()
    }

    /// Snapshot of the after-compile hooks in registration order
    pub fn after_compile(&self) -> Vec<AfterCompileHook> {
        self.after_compile.clone()
    }

    /// Snapshot of the on-definition hooks in registration order
    pub fn on_definition(&self) -> Vec<OnDefinitionHook> {
        self.on_definition.clone()
    }

    /// Snapshot of the after-verify hooks in registration order
    pub fn after_verify(&self) -> Vec<AfterVerifyHook> {
        self.after_verify.clone()
    }

    pub fn on_load(&self) -> Option<OnLoadHook> {
        self.on_load.clone()
    }

    pub fn count(&self, kind: HookKind) -> usize {
        match kind {
            HookKind::BeforeCompile => self.before_compile.len(),
            HookKind::AfterCompile => self.after_compile.len(),
            HookKind::OnDefinition => self.on_definition.len(),
            HookKind::AfterVerify => self.after_verify.len(),
            HookKind::OnLoad => usize::from(self.on_load.is_some()),
        }
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("before_compile", &self.before_compile.len())
            .field("after_compile", &self.after_compile.len())
            .field("on_definition", &self.on_definition.len())
            .field("after_verify", &self.after_verify.len())
            .field("on_load", &self.on_load.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_registration_order_preserved() {
        let mut reg = HookRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            reg.add_after_verify(Arc::new(move |_unit| {
                seen.lock().unwrap().push(tag);
                Ok(())
            }));
        }
        for hook in reg.after_verify() {
            hook("Sample").unwrap();
        }
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_same_hook_registered_twice_runs_twice() {
        let mut reg = HookRegistry::new();
        let calls = Arc::new(Mutex::new(0usize));
        let calls_inner = Arc::clone(&calls);
        let hook: AfterVerifyHook = Arc::new(move |_unit| {
            *calls_inner.lock().unwrap() += 1;
            Ok(())
        });
        reg.add_after_verify(Arc::clone(&hook));
        reg.add_after_verify(hook);
        for h in reg.after_verify() {
            h("Sample").unwrap();
        }
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[test]
    fn test_on_load_last_registration_wins() {
        let mut reg = HookRegistry::new();
        reg.set_on_load(Arc::new(|_| Value::atom("error")));
        reg.set_on_load(Arc::new(|_| Value::atom("ok")));
        assert_eq!(reg.count(HookKind::OnLoad), 1);
        let hook = reg.on_load().unwrap();
        assert!(hook("Sample").is_ok_atom());
    }

    #[test]
    fn test_counts() {
        let mut reg = HookRegistry::new();
        assert_eq!(reg.count(HookKind::BeforeCompile), 0);
        reg.add_before_compile(Arc::new(|_| Ok(())));
        assert_eq!(reg.count(HookKind::BeforeCompile), 1);
        assert_eq!(reg.count(HookKind::AfterCompile), 0);
    }
}
