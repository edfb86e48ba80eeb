// ============================================================================
// spark-broadcast - Broadcast Primitive
// The typed invocation layer over the untyped broadcast base
// ============================================================================

use std::marker::PhantomData;
use std::rc::Rc;

use crate::core::types::{AnyNode, NodeInner};
use crate::primitives::base::BroadcastBase;
use crate::primitives::connection::Connection;

// =============================================================================
// BROADCAST<T> - The public broadcaster handle
// =============================================================================

/// A signal/slot broadcaster for handlers of one value type `T`.
///
/// Subscribing returns a [`Connection`]; emitting invokes every connected
/// handler synchronously, most recently subscribed first. Handlers may
/// disconnect or subscribe on the same broadcaster while it is emitting.
///
/// Single-threaded by design: reentrancy from inside a handler is the only
/// supported form of concurrency. A handler that emits on the broadcaster
/// it is running under is silently ignored.
///
/// # Example
///
/// ```
/// use spark_broadcast::broadcast;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let b = broadcast::<i32>();
/// let sum = Rc::new(Cell::new(0));
///
/// let s = sum.clone();
/// let _conn = b.subscribe(move |v| s.set(s.get() + v));
///
/// b.emit(&40);
/// b.emit(&2);
/// assert_eq!(sum.get(), 42);
/// ```
pub struct Broadcast<T> {
    base: Rc<BroadcastBase>,
    _marker: PhantomData<fn(&T)>,
}

impl<T: 'static> Broadcast<T> {
    /// Create a broadcaster with no subscribers.
    pub fn new() -> Self {
        Self {
            base: Rc::new(BroadcastBase::new()),
            _marker: PhantomData,
        }
    }

    /// Subscribe a handler, linking it at the head of the list. O(1).
    ///
    /// The handler runs on every subsequent emission until the returned
    /// [`Connection`] (or any clone of it) disconnects.
    pub fn subscribe(&self, handler: impl FnMut(&T) + 'static) -> Connection {
        let node: Rc<dyn AnyNode> =
            Rc::new(NodeInner::new(handler, Rc::downgrade(&self.base)));
        self.base.link(node.clone());
        Connection::from_node(node)
    }

    /// Emit a value to every connected handler, in reverse-subscription
    /// order.
    ///
    /// A node's state is checked at the moment it is visited, so a handler
    /// disconnecting a later subscription mid-pass suppresses it, while
    /// handlers subscribed mid-pass (prepended at the head the cursor has
    /// already passed) first run on the next emission.
    ///
    /// No-op if an emission is already in progress on this broadcaster.
    /// A panicking handler propagates after the running flag is restored,
    /// leaving the broadcaster usable.
    pub fn emit(&self, value: &T) {
        if !self.base.try_begin_invoke() {
            return;
        }

        {
            let _guard = RunningReset { base: &*self.base };
            let mut cursor = self.base.head();
            while let Some(node) = cursor {
                if node.is_connected() {
                    if let Some(typed) = node.as_any().downcast_ref::<NodeInner<T>>() {
                        typed.invoke(value);
                    }
                }
                cursor = node.next();
            }
        }

        self.base.guarded_sweep();
    }

    /// Disconnect every current subscription.
    ///
    /// The dead nodes are swept out right away, unless an emission is in
    /// progress (the post-emission sweep picks them up instead).
    pub fn disconnect_all(&self) {
        self.base.disconnect_all();
        self.base.guarded_sweep();
    }

    /// Number of connected subscriptions.
    pub fn connected_count(&self) -> usize {
        self.base.connected_count()
    }

    /// Number of disconnected subscriptions not yet swept out.
    pub fn disconnected_count(&self) -> usize {
        self.base.disconnected_count()
    }

    /// Total linked nodes, dead ones included. O(n).
    pub fn node_count(&self) -> usize {
        self.base.node_count()
    }
}

impl<T: 'static> Default for Broadcast<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Broadcast<T> {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Broadcast<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcast")
            .field("connected", &self.base.connected_count())
            .field("disconnected", &self.base.disconnected_count())
            .finish()
    }
}

/// Resets the running flag when the emission walk ends, unwinding included,
/// so a panicking handler leaves the broadcaster usable.
struct RunningReset<'a> {
    base: &'a BroadcastBase,
}

impl Drop for RunningReset<'_> {
    fn drop(&mut self) {
        self.base.end_invoke();
    }
}

// =============================================================================
// BROADCAST CREATION FUNCTION
// =============================================================================

/// Create a new broadcaster.
///
/// # Example
///
/// ```
/// use spark_broadcast::broadcast;
///
/// let clicks = broadcast::<(u16, u16)>();
/// let mut conn = clicks.subscribe(|&(x, y)| println!("click at {x},{y}"));
///
/// clicks.emit(&(3, 7));
/// conn.disconnect();
/// ```
pub fn broadcast<T: 'static>() -> Broadcast<T> {
    Broadcast::new()
}

// =============================================================================
// TESTS
// =============================================================================
