// All core functionality is in bulario-core
// This CLI acts as a thin wrapper around the core library

// CLI-specific modules
pub mod logging;

// Re-export core types for convenience
pub use bulario_core::*;

pub use logging::init_logging;
