// ============================================================================
// spark-broadcast - Connection
//
// The user-facing subscription handle. Copyable; each value holds exactly
// one counted reference to its node.
// ============================================================================

use std::rc::Rc;

use crate::core::types::AnyNode;

// =============================================================================
// CONNECTION
// =============================================================================

/// A handle to one subscription on a [`Broadcast`](crate::Broadcast).
///
/// Cloning a connection shares the underlying subscription: disconnecting
/// through any clone disconnects all of them. Dropping a connection only
/// releases this handle's reference; the subscription itself stays live
/// until disconnected (use [`ScopedConnection`](crate::ScopedConnection)
/// for drop-means-unsubscribe semantics).
///
/// # Example
///
/// ```
/// use spark_broadcast::broadcast;
///
/// let b = broadcast::<i32>();
/// let mut conn = b.subscribe(|v| println!("got {v}"));
///
/// assert!(conn.is_connected());
/// conn.disconnect();
/// assert!(!conn.is_connected());
/// ```
pub struct Connection {
    node: Option<Rc<dyn AnyNode>>,
}

impl Connection {
    /// Create a null handle (not connected to anything).
    pub fn new() -> Self {
        Self { node: None }
    }

    /// Wrap a node, registering one handle on it.
    pub(crate) fn from_node(node: Rc<dyn AnyNode>) -> Self {
        node.add_handle();
        Self { node: Some(node) }
    }

    /// Whether this handle refers to a node that is still connected.
    ///
    /// False for a null handle, and for every clone of a handle that has
    /// been disconnected.
    pub fn is_connected(&self) -> bool {
        self.node.as_ref().is_some_and(|node| node.is_connected())
    }

    /// Disconnect the subscription.
    ///
    /// Idempotent, and safe to call at any time: redundantly, from inside
    /// a handler during emission, or after the broadcaster is gone. On the
    /// actual transition the owner's counts move and the list gets a
    /// chance to compact; either way this handle ends up null.
    pub fn disconnect(&mut self) {
        if let Some(node) = self.node.as_ref() {
            if node.mark_disconnected() {
                if let Some(owner) = node.owner() {
                    owner.note_disconnect();
                }
            }
        }
        self.release();
    }

    /// Release this handle's reference without disconnecting.
    ///
    /// Equivalent to dropping the handle; afterwards it is null.
    pub fn reset(&mut self) {
        self.release();
    }

    /// Drop the node reference, routing the last-handle release through the
    /// owner so a disconnected node can be reclaimed promptly. A node that
    /// is already unlinked (or whose broadcaster died) is freed by the `Rc`
    /// drop alone.
    fn release(&mut self) {
        if let Some(node) = self.node.take() {
            let remaining = node.remove_handle();
            if remaining == 0 && node.is_disconnected() {
                if let Some(owner) = node.owner() {
                    owner.note_handle_released();
                }
            }
        }
    }
}

impl Clone for Connection {
    fn clone(&self) -> Self {
        if let Some(node) = self.node.as_ref() {
            node.add_handle();
        }
        Self {
            node: self.node.clone(),
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.release();
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("connected", &self.is_connected())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::base::BroadcastBase;
    use crate::core::types::NodeInner;
    use std::cell::Cell;
    use std::rc::Rc;

    fn subscribe_noop(base: &Rc<BroadcastBase>) -> (Connection, Rc<dyn AnyNode>) {
        let node: Rc<dyn AnyNode> = Rc::new(NodeInner::new(|_: &()| {}, Rc::downgrade(base)));
        base.link(node.clone());
        (Connection::from_node(node.clone()), node)
    }

    #[test]
    fn null_handle_is_not_connected() {
        let conn = Connection::new();
        assert!(!conn.is_connected());

        let default = Connection::default();
        assert!(!default.is_connected());
    }

    #[test]
    fn disconnect_on_null_handle_is_safe() {
        let mut conn = Connection::new();
        conn.disconnect();
        conn.disconnect();
        assert!(!conn.is_connected());
    }

    #[test]
    fn clone_adds_a_handle() {
        let base = Rc::new(BroadcastBase::new());
        let (conn, node) = subscribe_noop(&base);
        assert_eq!(node.handle_count(), 1);

        let copy = conn.clone();
        assert_eq!(node.handle_count(), 2);

        drop(copy);
        assert_eq!(node.handle_count(), 1);

        drop(conn);
        assert_eq!(node.handle_count(), 0);
        base.disconnect_all();
        base.guarded_sweep();
    }

    #[test]
    fn disconnect_is_idempotent_across_copies() {
        let base = Rc::new(BroadcastBase::new());
        let (mut conn, _node) = subscribe_noop(&base);
        let mut copy = conn.clone();

        conn.disconnect();
        assert!(!conn.is_connected());
        assert!(!copy.is_connected());
        assert_eq!(base.connected_count(), 0);
        // A single dead node crosses the threshold and sweeps right away
        assert_eq!(base.disconnected_count(), 0);
        assert_eq!(base.node_count(), 0);

        // Second disconnect through the copy changes nothing
        copy.disconnect();
        assert!(!copy.is_connected());
        assert_eq!(base.connected_count(), 0);
        assert_eq!(base.disconnected_count(), 0);
        assert_eq!(base.node_count(), 0);
    }

    #[test]
    fn disconnect_clears_this_handle() {
        let base = Rc::new(BroadcastBase::new());
        let (mut conn, node) = subscribe_noop(&base);
        let copy = conn.clone();
        assert_eq!(node.handle_count(), 2);

        conn.disconnect();
        // This handle released its reference, the copy kept its own
        assert_eq!(node.handle_count(), 1);
        drop(copy);
    }

    #[test]
    fn last_handle_release_reclaims_disconnected_node() {
        struct DropCounter(Rc<Cell<u32>>);
        impl Drop for DropCounter {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        let drops = Rc::new(Cell::new(0));
        let base = Rc::new(BroadcastBase::new());

        let counter = DropCounter(drops.clone());
        let node: Rc<dyn AnyNode> = Rc::new(NodeInner::new(
            move |_: &()| {
                let _ = &counter;
            },
            Rc::downgrade(&base),
        ));
        base.link(node.clone());
        let mut conn = Connection::from_node(node);

        conn.disconnect();
        assert_eq!(base.node_count(), 0, "single dead node sweeps immediately");
        assert_eq!(drops.get(), 1, "handler freed once nothing references the node");
    }

    #[test]
    fn reset_releases_without_disconnecting() {
        let base = Rc::new(BroadcastBase::new());
        let (mut conn, node) = subscribe_noop(&base);

        conn.reset();
        assert!(!conn.is_connected());

        // The subscription itself is still live
        assert!(node.is_connected());
        assert_eq!(base.connected_count(), 1);
        base.disconnect_all();
        base.guarded_sweep();
    }

    #[test]
    fn assigning_over_a_connection_releases_the_old_reference() {
        let base = Rc::new(BroadcastBase::new());
        let (conn_a, node_a) = subscribe_noop(&base);
        let (conn_b, node_b) = subscribe_noop(&base);
        let mut keep_a = conn_a.clone();

        let mut slot = conn_a;
        assert_eq!(node_a.handle_count(), 2);
        assert!(slot.is_connected());

        slot = conn_b;
        assert_eq!(node_a.handle_count(), 1);
        assert_eq!(node_b.handle_count(), 1);
        assert!(slot.is_connected());

        slot.disconnect();
        keep_a.disconnect();
    }

    #[test]
    fn handle_on_a_reclaimed_node_stays_safe() {
        let base = Rc::new(BroadcastBase::new());
        let node: Rc<dyn AnyNode> = Rc::new(NodeInner::new(|_: &()| {}, Rc::downgrade(&base)));
        base.link(node.clone());

        // The broadcaster dies first; its drop disconnects and sweeps the
        // node out of the list. Our Rc keeps the record itself alive.
        drop(base);

        let mut conn = Connection::from_node(node);
        assert!(!conn.is_connected());
        conn.disconnect();
        assert!(!conn.is_connected());
    }
}
