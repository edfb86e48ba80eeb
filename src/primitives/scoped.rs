// ============================================================================
// spark-broadcast - Scoped Connection
//
// RAII wrapper: the subscription dies with the wrapper.
// ============================================================================

use crate::primitives::connection::Connection;

// =============================================================================
// SCOPED CONNECTION
// =============================================================================

/// A connection that disconnects when dropped.
///
/// A plain [`Connection`] going out of scope only releases its handle; the
/// subscription keeps firing until something disconnects it. Wrap it in a
/// `ScopedConnection` to tie the subscription's lifetime to an enclosing
/// object instead.
///
/// # Example
///
/// ```
/// use spark_broadcast::{broadcast, ScopedConnection};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let b = broadcast::<()>();
/// let calls = Rc::new(Cell::new(0));
///
/// {
///     let c = calls.clone();
///     let _scoped = ScopedConnection::new(b.subscribe(move |_| c.set(c.get() + 1)));
///     b.emit(&());
/// }
///
/// // The scope ended, the subscription went with it
/// b.emit(&());
/// assert_eq!(calls.get(), 1);
/// ```
pub struct ScopedConnection {
    connection: Connection,
}

impl ScopedConnection {
    /// Take ownership of a connection.
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// Whether the held subscription is still connected.
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Disconnect now instead of waiting for the drop.
    pub fn disconnect(&mut self) {
        self.connection.disconnect();
    }
}

impl From<Connection> for ScopedConnection {
    fn from(connection: Connection) -> Self {
        Self::new(connection)
    }
}

impl Drop for ScopedConnection {
    fn drop(&mut self) {
        self.connection.disconnect();
    }
}

impl std::fmt::Debug for ScopedConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedConnection")
            .field("connected", &self.is_connected())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
