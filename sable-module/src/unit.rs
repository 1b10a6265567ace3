//! Module compile-unit lifecycle
//!
//! A `ModuleUnit` owns all per-unit compile-time state and moves through a
//! monotonic phase sequence: Open -> BeforeCompileRunning -> Closed ->
//! Emitted (-> Verified on the surviving `FinalizedUnit`). `finalize`
//! consumes the unit, so re-entering finalization from a hook is impossible
//! by construction; hooks only ever see `&mut ModuleUnit`. Compiling a
//! different unit from inside a hook works because units share nothing but
//! the process-wide tracker.

use crate::attrs::AttributeStore;
use crate::binary::{
    Artifact, ArtifactEmitter, DebugChunk, DebugDefinition, DefRecord, EmitRequest, LoweredSymbol,
};
use crate::defs::{Clause, DefKey, DefKind, Definition, DefinitionTable};
use crate::error::ModuleError;
use crate::hooks::{AfterVerifyHook, DefinitionEvent, HookKind, HookRegistry, OnLoadHook};
use crate::tracker;
use crate::value::Value;
use sable_config::{CompilerConfig, LimitConfig};

/// Reserved namespace root; module names under it are stdlib-only
pub const RESERVED_ROOT: &str = "sable";

/// Lifecycle phase, strictly monotonic per unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Open,
    BeforeCompileRunning,
    Closed,
    Emitted,
    Verified,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Open => "open",
            Phase::BeforeCompileRunning => "before_compile_running",
            Phase::Closed => "closed",
            Phase::Emitted => "emitted",
            Phase::Verified => "verified",
        }
    }
}

/// One module compile unit
#[derive(Debug)]
pub struct ModuleUnit {
    name: String,
    source_file: String,
    source_line: u32,
    attrs: AttributeStore,
    defs: DefinitionTable,
    hooks: HookRegistry,
    phase: Phase,
    limits: LimitConfig,
}

impl ModuleUnit {
    /// Open a new unit and register it with the process-wide tracker.
    ///
    /// Names under the reserved root are rejected; the stdlib build goes
    /// through `open_reserved`.
    pub fn open(
        name: &str,
        source_file: &str,
        source_line: u32,
        limits: LimitConfig,
    ) -> Result<Self, ModuleError> {
        if name == RESERVED_ROOT || name.starts_with(&format!("{}.", RESERVED_ROOT)) {
            return Err(ModuleError::ReservedNameConflict {
                unit: name.to_string(),
                root: RESERVED_ROOT,
            });
        }
        Self::open_reserved(name, source_file, source_line, limits)
    }

    /// Open without the reserved-namespace check (stdlib build path)
    pub fn open_reserved(
        name: &str,
        source_file: &str,
        source_line: u32,
        limits: LimitConfig,
    ) -> Result<Self, ModuleError> {
        tracker::track(name)?;
        tracing::debug!(
            target: "sable::lifecycle",
            unit = name,
            file = source_file,
            line = source_line,
            "unit opened"
        );
        Ok(Self {
            name: name.to_string(),
            source_file: source_file.to_string(),
            source_line,
            attrs: AttributeStore::new(name),
            // Clause counts are stored as u16 in the artifact
            defs: DefinitionTable::new(name, limits.max_clauses.min(u16::MAX as usize)),
            hooks: HookRegistry::new(),
            phase: Phase::Open,
            limits,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }

    // ---- attribute surface ----

    pub fn register_attribute(
        &mut self,
        key: &str,
        accumulate: bool,
        persist: bool,
    ) -> Result<(), ModuleError> {
        self.attrs.register(key, accumulate, persist)
    }

    pub fn put_attribute(&mut self, key: &str, value: Value) -> Result<(), ModuleError> {
        self.attrs.put(key, value)
    }

    pub fn get_attribute(&self, key: &str, default: Value) -> Value {
        self.attrs.get(key, default)
    }

    pub fn get_last_attribute(&self, key: &str, default: Value) -> Value {
        self.attrs.get_last(key, default)
    }

    pub fn delete_attribute(&mut self, key: &str) -> Result<bool, ModuleError> {
        self.attrs.delete(key)
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attrs.has(key)
    }

    pub fn attribute_keys(&self) -> Vec<String> {
        self.attrs.keys()
    }

    // ---- definition surface ----

    /// Record one definition clause and notify on-definition hooks.
    ///
    /// `line` is relative to the unit's source anchor; hooks and stored
    /// clauses see the resolved absolute line.
    pub fn define(
        &mut self,
        kind: DefKind,
        name: &str,
        params: Vec<Value>,
        guard: Option<Value>,
        body: Value,
        line: u32,
        column: u32,
    ) -> Result<(), ModuleError> {
        let arity = params.len();
        // The definition keyspace stores arity as u8; a configured limit
        // above that must not let oversized arities truncate into it
        let max_arity = self.limits.max_arity.min(u8::MAX as usize);
        if arity > max_arity {
            return Err(ModuleError::InvalidArity {
                name: name.to_string(),
                arity: arity as u32,
                max: max_arity,
            });
        }

        let clause = Clause {
            params,
            guard,
            body,
            line: self.source_line + line,
            column,
        };
        let in_hook = self.phase == Phase::BeforeCompileRunning;
        self.defs
            .define(kind, name, arity as u8, clause.clone(), in_hook)?;

        let event = DefinitionEvent {
            kind,
            name: name.to_string(),
            arity: arity as u8,
            clause,
        };
        for hook in self.hooks.on_definition() {
            if let Err(e) = hook(&mut *self, &event) {
                let unit = self.name.clone();
                return Err(ModuleError::hook_failed(HookKind::OnDefinition, &unit, e));
            }
        }
        Ok(())
    }

    pub fn defines(&self, name: &str, arity: u8) -> bool {
        self.defs.defines(name, arity)
    }

    pub fn defines_kind(&self, name: &str, arity: u8, kind: DefKind) -> bool {
        self.defs.defines_kind(name, arity, kind)
    }

    /// Declaration-order introspection, optionally filtered by kind
    pub fn definitions_in(&self, filter: Option<DefKind>) -> Vec<DefKey> {
        self.defs.definitions_in(filter)
    }

    pub fn get_definition(&self, name: &str, arity: u8, skip_clauses: bool) -> Option<Definition> {
        self.defs.get_definition(name, arity, skip_clauses)
    }

    pub fn delete_definition(&mut self, name: &str, arity: u8) -> bool {
        self.defs.delete_definition(name, arity)
    }

    pub fn make_overridable(&mut self, keys: &[(String, u32)]) -> Result<(), ModuleError> {
        self.defs.make_overridable(keys)
    }

    // ---- finalization ----

    fn advance(&mut self, next: Phase) {
        debug_assert!(next > self.phase, "phase order is monotonic");
        self.phase = next;
        tracker::update(&self.name, next);
        tracing::debug!(
            target: "sable::lifecycle",
            unit = %self.name,
            phase = next.as_str(),
            "phase transition"
        );
    }

    fn build_emit_request(&self, config: &CompilerConfig) -> EmitRequest {
        let sorted = self.defs.sorted_definitions();
        let definitions: Vec<DefRecord> = sorted
            .iter()
            .map(|d| DefRecord {
                name: d.name.clone(),
                arity: d.arity,
                kind: d.kind,
                clause_count: d.clauses.len() as u16,
                line: d.line,
                column: d.column,
            })
            .collect();
        let lowered: Vec<LoweredSymbol> = sorted
            .iter()
            .map(|d| LoweredSymbol {
                name: d.name.clone(),
                arity: d.arity,
                kind: d.kind,
                clause_count: d.clauses.len() as u16,
            })
            .collect();
        let debug = DebugChunk {
            unit: self.name.clone(),
            definitions: sorted
                .into_iter()
                .map(|d| DebugDefinition {
                    name: d.name,
                    arity: d.arity,
                    kind: d.kind,
                    clauses: d.clauses,
                })
                .collect(),
        };
        EmitRequest {
            unit: self.name.clone(),
            definitions,
            persisted: self.attrs.persisted_snapshot(),
            debug,
            lowered,
            debug_public: config.debug_public,
        }
    }

    /// Drive the unit through emission.
    ///
    /// Before-compile hooks run first against the still-mutable unit, in
    /// registration order; a failing hook aborts before the unit ever
    /// closes. After a successful emit, after-compile hooks observe the
    /// read-only unit plus the artifact bytes. The unit leaves the tracker
    /// on every exit path.
    pub fn finalize(
        mut self,
        emitter: &dyn ArtifactEmitter,
        config: &CompilerConfig,
    ) -> Result<FinalizedUnit, ModuleError> {
        let name = self.name.clone();

        self.advance(Phase::BeforeCompileRunning);
        for hook in self.hooks.before_compile() {
            if let Err(e) = hook(&mut self) {
                // Untracking is left to Drop here: releasing the name twice
                // could remove a tracker entry a concurrent open legitimately
                // claimed in between
                return Err(ModuleError::hook_failed(HookKind::BeforeCompile, &name, e));
            }
        }

        let dropped = self.defs.drop_unreplaced();
        for (def_name, arity) in &dropped {
            tracing::debug!(
                target: "sable::lifecycle",
                unit = %name,
                name = %def_name,
                arity,
                "overridable definition dropped without replacement"
            );
        }

        self.attrs.freeze("@after_compile");
        self.defs.freeze("@after_compile");
        self.advance(Phase::Closed);

        let request = self.build_emit_request(config);
        // Drop untracks on emit failure (phase is still pre-Emitted)
        let artifact = emitter.emit(&request)?;
        self.advance(Phase::Emitted);

        for hook in self.hooks.after_compile() {
            if let Err(e) = hook(&mut self, &artifact) {
                tracker::untrack(&name);
                return Err(ModuleError::hook_failed(HookKind::AfterCompile, &name, e));
            }
        }

        tracker::untrack(&name);
        tracing::info!(
            target: "sable::lifecycle",
            unit = %name,
            bytes = artifact.len(),
            "unit compiled and discarded"
        );
        Ok(FinalizedUnit {
            name,
            artifact,
            after_verify: self.hooks.after_verify(),
            on_load: self.hooks.on_load(),
            verified: false,
        })
    }
}

impl Drop for ModuleUnit {
    fn drop(&mut self) {
        // Abandoned units (errors before emission, caller drops) must not
        // wedge the tracker. The emitted path untracks explicitly before
        // this runs and is skipped by the phase guard.
        if self.phase < Phase::Emitted {
            tracker::untrack(&self.name);
        }
    }
}

/// What survives a finalized unit: the artifact plus the callbacks that
/// fire after the compile-time state is gone
pub struct FinalizedUnit {
    name: String,
    artifact: Artifact,
    after_verify: Vec<AfterVerifyHook>,
    pub(crate) on_load: Option<OnLoadHook>,
    verified: bool,
}

impl FinalizedUnit {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    pub fn into_artifact(self) -> Artifact {
        self.artifact
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    /// Post-verification trigger. May run arbitrarily late; callbacks only
    /// receive the unit name because the compile-time state is gone.
    pub fn run_verified(&mut self) -> Result<(), ModuleError> {
        for hook in &self.after_verify {
            hook(&self.name)
                .map_err(|e| ModuleError::hook_failed(HookKind::AfterVerify, &self.name, e))?;
        }
        self.verified = true;
        tracing::debug!(target: "sable::lifecycle", unit = %self.name, "unit verified");
        Ok(())
    }
}

impl std::fmt::Debug for FinalizedUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinalizedUnit")
            .field("name", &self.name)
            .field("artifact_bytes", &self.artifact.len())
            .field("after_verify", &self.after_verify.len())
            .field("on_load", &self.on_load.is_some())
            .field("verified", &self.verified)
            .finish()
    }
}
