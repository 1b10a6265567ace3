//! Unified API error type

use sable_module::ModuleError;
use thiserror::Error;

/// Top-level error for embedders
#[derive(Debug, Error)]
pub enum SableError {
    #[error("{0}")]
    Module(#[from] ModuleError),
}

impl SableError {
    /// Which subsystem produced the error
    pub fn phase(&self) -> &'static str {
        match self {
            SableError::Module(inner) => match inner {
                ModuleError::Emit(_) => "emit",
                ModuleError::Read(_) => "artifact",
                ModuleError::LoadCallbackFailed { .. } => "load",
                ModuleError::HookFailed { .. } => "hooks",
                _ => "module",
            },
        }
    }
}

/// Structured report for log sinks and tooling
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub phase: &'static str,
    pub message: String,
}

impl ErrorReport {
    pub fn from_error(error: &SableError) -> Self {
        Self {
            phase: error.phase(),
            message: error.to_string(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::json!({
            "phase": self.phase,
            "message": self.message,
        })
        .to_string()
    }
}

impl std::fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.phase, self.message)
    }
}
