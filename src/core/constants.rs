// ============================================================================
// spark-broadcast - Constants
// Flag constants for node states and the sweep threshold
// ============================================================================

// =============================================================================
// NODE STATE FLAGS
// =============================================================================

/// Node is connected (its callable runs on emission)
pub const CONNECTED: u32 = 1 << 0;

/// Node is disconnected (dead; skipped on emission, reclaimed by sweep)
pub const DISCONNECTED: u32 = 1 << 1;

// =============================================================================
// STATE MASK (for clearing state bits)
// =============================================================================

/// Mask to clear the state bits (CONNECTED, DISCONNECTED)
pub const STATE_MASK: u32 = !(CONNECTED | DISCONNECTED);

// =============================================================================
// SWEEP TUNING
// =============================================================================

/// Minimum number of disconnected nodes before a sweep is worth running.
///
/// `maybe_sweep` only does the O(n) pass when
/// `disconnected_count > min(SWEEP_MIN_DEAD, connected_count)`, so a handful
/// of dead nodes stays linked (but never invoked) until the dead fraction
/// is large enough to amortize the walk.
pub const SWEEP_MIN_DEAD: usize = 8;

// =============================================================================
// TESTS
// =============================================================================
