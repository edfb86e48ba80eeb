// ============================================================================
// spark-broadcast - A Signal/Slot Broadcast Library for Rust
// ============================================================================
//
// Synchronous, single-threaded fan-out with reentrancy-safe subscriptions:
// a Broadcast owns an intrusive list of subscription nodes, Connections are
// counted handles onto those nodes, and dead nodes are reclaimed lazily by
// a threshold-gated sweep that never runs under an in-progress emission.
// ============================================================================

pub mod core;
pub mod primitives;

// Re-export core items at crate root for ergonomic access
pub use core::constants;
pub use core::types::{AnyNode, NodeInner};

// Re-export primitives at crate root
pub use primitives::base::BroadcastBase;
pub use primitives::broadcast::{broadcast, Broadcast};
pub use primitives::connection::Connection;
pub use primitives::scoped::ScopedConnection;

// =============================================================================
// TESTS
// =============================================================================
