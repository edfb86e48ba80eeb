// ============================================================================
// spark-broadcast - Core Module
// Fundamental types and constants for the subscription list
// ============================================================================

pub mod constants;
pub mod types;

// Re-export commonly used items
pub use constants::*;
pub use types::{AnyNode, NodeInner};
