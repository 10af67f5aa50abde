//! JIT compilation settings.

use inkwell::OptimizationLevel;

/// Environment variable that turns on IR dumps before JIT compilation.
pub const DEBUG_LLVM_ENV: &str = "FN_DEBUG_LLVM";

/// Settings for [`compile_function`](crate::compile::compile_function).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JitConfig {
    /// Optimization level of the JIT execution engine.
    pub opt_level: OptimizationLevel,
    /// Run the LLVM verifier before creating the engine.
    pub verify: bool,
    /// Print the module IR to stderr before creating the engine.
    pub dump_ir: bool,
}

impl Default for JitConfig {
    fn default() -> Self {
        Self {
            opt_level: OptimizationLevel::None,
            verify: true,
            dump_ir: false,
        }
    }
}

impl JitConfig {
    /// Defaults, with IR dumping enabled when `FN_DEBUG_LLVM` is set.
    pub fn from_env() -> Self {
        Self {
            dump_ir: std::env::var_os(DEBUG_LLVM_ENV).is_some(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_opt_level(mut self, opt_level: OptimizationLevel) -> Self {
        self.opt_level = opt_level;
        self
    }
}
