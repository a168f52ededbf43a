//! Query flags and result pages.

use crate::types::{Namespace, ServerAddress};

/// Cursor behaviour flags carried by a query.
///
/// The adapter never interprets these; they are handed to the engine as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorFlags {
    /// The query may be served by a non-primary member.
    pub slave_ok: bool,
    /// Keep the cursor open after the last document of a capped collection.
    pub tailable: bool,
    /// Block briefly for new data on a tailable cursor.
    pub await_data: bool,
    /// Never time out the cursor on the server.
    pub no_cursor_timeout: bool,
    /// Return partial results if some shards are down.
    pub partial: bool,
    /// Optimise oplog range queries.
    pub oplog_replay: bool,
}

impl CursorFlags {
    /// No flags set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `slave_ok`.
    #[must_use]
    pub const fn slave_ok(mut self, value: bool) -> Self {
        self.slave_ok = value;
        self
    }

    /// Sets `tailable`.
    #[must_use]
    pub const fn tailable(mut self, value: bool) -> Self {
        self.tailable = value;
        self
    }

    /// Sets `await_data`.
    #[must_use]
    pub const fn await_data(mut self, value: bool) -> Self {
        self.await_data = value;
        self
    }

    /// Sets `no_cursor_timeout`.
    #[must_use]
    pub const fn no_cursor_timeout(mut self, value: bool) -> Self {
        self.no_cursor_timeout = value;
        self
    }

    /// Sets `partial`.
    #[must_use]
    pub const fn partial(mut self, value: bool) -> Self {
        self.partial = value;
        self
    }

    /// Sets `oplog_replay`.
    #[must_use]
    pub const fn oplog_replay(mut self, value: bool) -> Self {
        self.oplog_replay = value;
        self
    }
}

/// One page of query results plus the cursor to continue from.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<T> {
    /// Namespace the results came from.
    pub namespace: Namespace,
    /// Decoded documents of this page.
    pub results: Vec<T>,
    /// Cursor id for get-more, `0` when the result set is exhausted.
    pub cursor_id: u64,
    /// Address of the server that produced the page.
    pub address: ServerAddress,
}

impl<T> QueryResult<T> {
    /// Creates a result page.
    pub fn new(
        namespace: Namespace,
        results: Vec<T>,
        cursor_id: u64,
        address: ServerAddress,
    ) -> Self {
        Self {
            namespace,
            results,
            cursor_id,
            address,
        }
    }

    /// Returns true if more results can be fetched with get-more.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.cursor_id != 0
    }
}
