// ============================================================================
// spark-broadcast - Primitives Module
// The broadcaster, its connection handles, and the scoped wrapper
// ============================================================================

pub mod base;
pub mod broadcast;
pub mod connection;
pub mod scoped;

// Re-export for convenience
pub use base::BroadcastBase;
pub use broadcast::{broadcast, Broadcast};
pub use connection::Connection;
pub use scoped::ScopedConnection;
