// ============================================================================
// spark-broadcast - Type Definitions
// Type-erased node trait and the concrete subscription record
// ============================================================================

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::primitives::base::BroadcastBase;

use super::constants::*;

// =============================================================================
// TYPE-ERASED NODE TRAIT
// =============================================================================
//
// The broadcast base (list linking, counts, sweep) never needs to know the
// callable's parameter type T. Only invocation needs T, and that happens in
// the typed layer, which downcasts through as_any().
//
// So the base works entirely in terms of:
// - RefCell<Option<Rc<dyn AnyNode>>> for the intrusive list
// - Weak<BroadcastBase> back-references from node to owner
// =============================================================================

/// Type-erased subscription node interface for list and lifetime operations.
///
/// Implemented by `NodeInner<T>`. Enables the untyped `BroadcastBase` to own
/// and sweep nodes of any callable signature.
pub trait AnyNode: Any {
    /// Get the flags bitmask
    fn flags(&self) -> u32;

    /// Set the flags bitmask
    fn set_flags(&self, flags: u32);

    /// Number of live `Connection` handles referencing this node
    fn handle_count(&self) -> usize;

    /// Register one more `Connection` handle
    fn add_handle(&self);

    /// Release one `Connection` handle, returning the remaining count
    fn remove_handle(&self) -> usize;

    /// Get the next node in the owning list (cloned link)
    fn next(&self) -> Option<Rc<dyn AnyNode>>;

    /// Set the next link. The link is exclusively owned by the list; only
    /// the owning broadcaster mutates it.
    fn set_next(&self, next: Option<Rc<dyn AnyNode>>);

    /// Upgrade the weak back-reference to the owning broadcaster.
    ///
    /// Returns None once the broadcaster has been destroyed or the node has
    /// been unlinked by a sweep.
    fn owner(&self) -> Option<Rc<BroadcastBase>>;

    /// Clear the owner back-reference (the node is no longer list-tracked)
    fn clear_owner(&self);

    /// Upcast to Any for downcasting in the typed invocation layer
    fn as_any(&self) -> &dyn Any;

    /// Check if this node is connected
    fn is_connected(&self) -> bool {
        self.flags() & CONNECTED != 0
    }

    /// Check if this node is disconnected
    fn is_disconnected(&self) -> bool {
        self.flags() & DISCONNECTED != 0
    }

    /// Mark this node disconnected.
    ///
    /// Idempotent: returns true only on the connected -> disconnected
    /// transition, so callers can move the owner's counts exactly once.
    /// There is no path back to connected; re-subscribing creates a new node.
    fn mark_disconnected(&self) -> bool {
        if !self.is_connected() {
            return false;
        }
        let flags = (self.flags() & STATE_MASK) | DISCONNECTED;
        self.set_flags(flags);
        true
    }
}

// =============================================================================
// NODE INNER (the record behind one subscription)
// =============================================================================

/// The internal record for one subscription.
///
/// This is separate from `Connection` so we can implement `AnyNode` on it
/// and store `Rc<NodeInner<T>>` as `Rc<dyn AnyNode>` in the untyped list.
///
/// Ownership model: the owning broadcaster's list link is the implicit,
/// uncounted reference; `handles` counts exactly the live `Connection`
/// values. The node is deallocated by `Rc` once the list has unlinked it
/// and the last handle has dropped.
pub struct NodeInner<T> {
    /// Flags bitmask (CONNECTED / DISCONNECTED)
    flags: Cell<u32>,

    /// Count of live Connection handles
    handles: Cell<usize>,

    /// Next node in the owning broadcaster's list
    next: RefCell<Option<Rc<dyn AnyNode>>>,

    /// Weak back-reference to the owning broadcaster
    owner: RefCell<Weak<BroadcastBase>>,

    /// The subscriber's handler
    callable: RefCell<Box<dyn FnMut(&T)>>,
}

impl<T> NodeInner<T> {
    /// Create a new connected node for the given handler and owner.
    pub fn new(handler: impl FnMut(&T) + 'static, owner: Weak<BroadcastBase>) -> Self {
        Self {
            flags: Cell::new(CONNECTED),
            handles: Cell::new(0),
            next: RefCell::new(None),
            owner: RefCell::new(owner),
            callable: RefCell::new(Box::new(handler)),
        }
    }

    /// Invoke the stored handler.
    ///
    /// The callable is borrowed mutably for the duration of the call.
    /// Recursive emission on the same broadcaster is rejected before it can
    /// reach this node a second time, so the borrow cannot collide.
    pub fn invoke(&self, value: &T) {
        (self.callable.borrow_mut())(value);
    }
}

impl<T: 'static> AnyNode for NodeInner<T> {
    fn flags(&self) -> u32 {
        self.flags.get()
    }

    fn set_flags(&self, flags: u32) {
        self.flags.set(flags);
    }

    fn handle_count(&self) -> usize {
        self.handles.get()
    }

    fn add_handle(&self) {
        self.handles.set(self.handles.get() + 1);
    }

    fn remove_handle(&self) -> usize {
        let remaining = self.handles.get().saturating_sub(1);
        self.handles.set(remaining);
        remaining
    }

    fn next(&self) -> Option<Rc<dyn AnyNode>> {
        self.next.borrow().clone()
    }

    fn set_next(&self, next: Option<Rc<dyn AnyNode>>) {
        *self.next.borrow_mut() = next;
    }

    fn owner(&self) -> Option<Rc<BroadcastBase>> {
        self.owner.borrow().upgrade()
    }

    fn clear_owner(&self) {
        *self.owner.borrow_mut() = Weak::new();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// TESTS
// =============================================================================
