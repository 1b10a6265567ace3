//! API-level configuration and global singleton for embedders

use once_cell::sync::OnceCell;
use sable_config::{CompilerConfig, LimitConfig};

/// Everything the driver needs for one compilation
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub compiler: CompilerConfig,
    pub limits: LimitConfig,
}

// Global config singleton for embedder convenience
static GLOBAL_CONFIG: OnceCell<CompileOptions> = OnceCell::new();

/// Initialize global configuration (must be called once before any operation)
///
/// # Panics
/// If config is already initialized
pub fn init(options: CompileOptions) {
    GLOBAL_CONFIG
        .set(options)
        .expect("Config already initialized");
}

/// Get global config reference, falling back to defaults if `init` was
/// never called
pub fn config() -> &'static CompileOptions {
    GLOBAL_CONFIG.get_or_init(CompileOptions::default)
}

/// Check if config is initialized
pub fn is_initialized() -> bool {
    GLOBAL_CONFIG.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = CompileOptions::default();
        assert!(options.compiler.debug_public);
        assert_eq!(options.limits.max_arity, 255);
    }

    #[test]
    fn test_config_falls_back_to_defaults() {
        // Global state: other tests may have initialized already, either
        // way a usable config comes back
        let options = config();
        assert!(options.limits.max_arity > 0);
    }
}
