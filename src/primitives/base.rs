// ============================================================================
// spark-broadcast - Broadcast Base
//
// The untyped broadcaster: owns the intrusive singly-linked node list,
// tracks connected/disconnected counts, and coordinates reentrancy-safe
// list compaction (the sweep).
// ============================================================================
//
// Concurrency discipline: the `running` flag is the only guard. While it is
// set, a sweep must not run (a sweep unlinks nodes, which would corrupt a
// forward traversal in progress). Every sweep entry point goes through
// `guarded_sweep`, which toggles the flag around the threshold check so that
// reentrant disconnects and handle releases caused by dropping node
// callables mid-sweep never recurse into a second sweep.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::core::constants::SWEEP_MIN_DEAD;
use crate::core::types::AnyNode;

// =============================================================================
// BROADCAST BASE
// =============================================================================

/// The untyped broadcaster core.
///
/// Owns the node list exclusively: connections never touch the links, only
/// a node's state flag and handle count, and reach the count/sweep
/// bookkeeping here through `note_disconnect` / `note_handle_released`.
pub struct BroadcastBase {
    /// First node in the list (most recently subscribed)
    head: RefCell<Option<Rc<dyn AnyNode>>>,

    /// True while an emission walk (or a guarded sweep) is in progress
    running: Cell<bool>,

    /// Number of list nodes in the connected state
    connected: Cell<usize>,

    /// Number of list nodes in the disconnected state
    disconnected: Cell<usize>,
}

impl BroadcastBase {
    /// Create an empty base.
    pub fn new() -> Self {
        Self {
            head: RefCell::new(None),
            running: Cell::new(false),
            connected: Cell::new(0),
            disconnected: Cell::new(0),
        }
    }

    /// Number of nodes currently in the connected state.
    pub fn connected_count(&self) -> usize {
        self.connected.get()
    }

    /// Number of disconnected nodes still linked (awaiting sweep).
    pub fn disconnected_count(&self) -> usize {
        self.disconnected.get()
    }

    /// Total number of linked nodes. O(n) list walk.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut cursor = self.head();
        while let Some(node) = cursor {
            count += 1;
            cursor = node.next();
        }
        count
    }

    /// Whether an emission walk is in progress.
    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Mark every connected node disconnected, moving the counts.
    ///
    /// Does not sweep; callers sweep afterwards if they want the memory
    /// back promptly (the destructor does).
    pub fn disconnect_all(&self) {
        let mut cursor = self.head();
        while let Some(node) = cursor {
            if node.mark_disconnected() {
                self.connected.set(self.connected.get() - 1);
                self.disconnected.set(self.disconnected.get() + 1);
            }
            cursor = node.next();
        }
    }

    /// Link a freshly created node at the head of the list. O(1).
    pub(crate) fn link(&self, node: Rc<dyn AnyNode>) {
        node.set_next(self.head.borrow_mut().take());
        *self.head.borrow_mut() = Some(node);
        self.connected.set(self.connected.get() + 1);
    }

    /// Cloned head link, for starting a traversal.
    pub(crate) fn head(&self) -> Option<Rc<dyn AnyNode>> {
        self.head.borrow().clone()
    }

    /// A node just transitioned to disconnected: move the counts, then give
    /// the list a chance to compact.
    pub(crate) fn note_disconnect(&self) {
        self.connected.set(self.connected.get() - 1);
        self.disconnected.set(self.disconnected.get() + 1);
        self.guarded_sweep();
    }

    /// A connection dropped the last handle on a disconnected node: give
    /// the list a chance to reclaim it.
    pub(crate) fn note_handle_released(&self) {
        self.guarded_sweep();
    }

    /// Begin an emission walk. Returns false if one is already in progress
    /// (recursive emission is rejected, not an error).
    pub(crate) fn try_begin_invoke(&self) -> bool {
        if self.running.get() {
            return false;
        }
        self.running.set(true);
        true
    }

    /// End an emission walk, restoring the flag. Safe on the unwind path.
    pub(crate) fn end_invoke(&self) {
        self.running.set(false);
    }

    /// Threshold-gated sweep with the running-flag toggle.
    ///
    /// No-op while an emission walk is in progress; the walk performs its
    /// own guarded sweep after it finishes.
    pub(crate) fn guarded_sweep(&self) {
        if self.running.get() {
            return;
        }
        self.running.set(true);
        self.maybe_sweep();
        self.running.set(false);
    }

    /// Sweep only when the dead fraction is large enough to amortize the
    /// O(n) pass, with a floor of `SWEEP_MIN_DEAD` dead nodes.
    fn maybe_sweep(&self) {
        if self.disconnected.get() > SWEEP_MIN_DEAD.min(self.connected.get()) {
            self.sweep();
        }
    }

    /// Single pass over the list, unlinking every disconnected node. A
    /// node nothing else references is freed on the spot when the list's
    /// `Rc` drops; one a connection still holds lives on detached until
    /// its last handle goes away.
    fn sweep(&self) {
        let mut prev: Option<Rc<dyn AnyNode>> = None;
        let mut cursor = self.head();
        while let Some(node) = cursor {
            let next = node.next();
            if node.is_disconnected() {
                node.set_next(None);
                node.clear_owner();
                match prev.as_ref() {
                    Some(p) => p.set_next(next.clone()),
                    None => *self.head.borrow_mut() = next.clone(),
                }
                self.disconnected.set(self.disconnected.get() - 1);
            } else {
                prev = Some(node.clone());
            }
            cursor = next;
        }
    }
}

impl Default for BroadcastBase {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastBase {
    /// Sum of handle counts across the linked nodes, for the teardown
    /// contract check.
    fn outstanding_handles(&self) -> usize {
        let mut total = 0;
        let mut cursor = self.head();
        while let Some(node) = cursor {
            total += node.handle_count();
            cursor = node.next();
        }
        total
    }
}

impl Drop for BroadcastBase {
    fn drop(&mut self) {
        // Contract: every connection must be dropped or disconnected before
        // the broadcaster goes away.
        debug_assert_eq!(
            self.outstanding_handles(),
            0,
            "BroadcastBase dropped while connections still reference its nodes"
        );

        self.disconnect_all();

        self.running.set(true);
        self.sweep();
        self.running.set(false);

        debug_assert_eq!(
            self.connected.get(),
            0,
            "BroadcastBase dropped with connected nodes remaining"
        );
        debug_assert_eq!(
            self.disconnected.get(),
            0,
            "BroadcastBase dropped with dead nodes still counted"
        );
        debug_assert!(
            self.head.borrow().is_none(),
            "BroadcastBase dropped with nodes still linked"
        );
    }
}

// =============================================================================
// TESTS
// =============================================================================
