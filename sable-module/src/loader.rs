//! Loader boundary
//!
//! `load_unit` consumes a `FinalizedUnit`, runs its on-load callback exactly
//! once and only then exposes the exported definitions. A rejected callback
//! means no `LoadedUnit` is ever produced, so the definitions stay
//! unreachable.

use crate::binary::ArtifactReader;
use crate::defs::DefKind;
use crate::error::ModuleError;
use crate::unit::FinalizedUnit;

/// A loaded unit: exported surface decoded from the artifact
#[derive(Debug)]
pub struct LoadedUnit {
    name: String,
    exports: Vec<(String, u8)>,
    reader: ArtifactReader,
}

impl LoadedUnit {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Exported `(name, arity)` pairs in stored (sorted) order
    pub fn exports(&self) -> &[(String, u8)] {
        &self.exports
    }

    pub fn is_export(&self, name: &str, arity: u8) -> bool {
        self.exports.iter().any(|(n, a)| n == name && *a == arity)
    }

    /// Underlying artifact view for further introspection
    pub fn reader(&self) -> &ArtifactReader {
        &self.reader
    }
}

/// Load a finalized unit, firing the on-load trigger first
pub fn load_unit(finalized: FinalizedUnit) -> Result<LoadedUnit, ModuleError> {
    let name = finalized.name().to_string();

    if let Some(on_load) = &finalized.on_load {
        let returned = on_load(&name);
        if !returned.is_ok_atom() {
            tracing::warn!(
                target: "sable::load",
                unit = %name,
                returned = %returned,
                "on_load callback rejected the unit"
            );
            return Err(ModuleError::LoadCallbackFailed {
                unit: name,
                returned,
            });
        }
    }

    let reader = ArtifactReader::from_bytes(finalized.into_artifact().into_bytes())?;
    let (_, records) = reader.definitions()?;
    let exports: Vec<(String, u8)> = records
        .iter()
        .filter(|r| r.kind.is_public())
        .map(|r| (r.name.clone(), r.arity))
        .collect();

    tracing::debug!(
        target: "sable::load",
        unit = %name,
        exports = exports.len(),
        "unit loaded"
    );
    Ok(LoadedUnit {
        name,
        exports,
        reader,
    })
}
