//! Open cursors.

use docbridge_core::{CoreError, CoreResult, Document, Namespace};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

#[derive(Debug)]
struct OpenCursor {
    namespace: Namespace,
    remaining: VecDeque<Document>,
}

/// Documents left over after a first batch, keyed by cursor id.
///
/// Cursor ids start at 1 and are never reused. Id `0` means "no cursor".
#[derive(Debug)]
pub(crate) struct CursorRegistry {
    next_id: u64,
    open: HashMap<u64, OpenCursor>,
}

impl Default for CursorRegistry {
    fn default() -> Self {
        Self {
            next_id: 1,
            open: HashMap::new(),
        }
    }
}

impl CursorRegistry {
    /// Registers leftover documents. Returns `0` without registering when
    /// nothing is left.
    pub(crate) fn open(&mut self, namespace: &Namespace, remaining: Vec<Document>) -> u64 {
        if remaining.is_empty() {
            return 0;
        }
        let id = self.next_id;
        self.next_id += 1;
        debug!(cursor_id = id, %namespace, remaining = remaining.len(), "cursor opened");
        self.open.insert(
            id,
            OpenCursor {
                namespace: namespace.clone(),
                remaining: remaining.into(),
            },
        );
        id
    }

    /// Takes up to `count` documents (`None` for all). Returns the batch and
    /// the id to continue from, `0` once the cursor is exhausted.
    pub(crate) fn next_batch(
        &mut self,
        namespace: &Namespace,
        cursor_id: u64,
        count: Option<usize>,
    ) -> CoreResult<(Vec<Document>, u64)> {
        let cursor = self
            .open
            .get_mut(&cursor_id)
            .filter(|c| c.namespace == *namespace)
            .ok_or(CoreError::CursorNotFound { cursor_id })?;
        let take = count.unwrap_or(cursor.remaining.len()).min(cursor.remaining.len());
        let batch: Vec<Document> = cursor.remaining.drain(..take).collect();
        if cursor.remaining.is_empty() {
            self.open.remove(&cursor_id);
            debug!(cursor_id, "cursor exhausted");
            return Ok((batch, 0));
        }
        Ok((batch, cursor_id))
    }

    /// Forgets `ids`, optionally only those opened on `namespace`. Unknown
    /// ids are ignored.
    pub(crate) fn kill(&mut self, namespace: Option<&Namespace>, ids: &[u64]) {
        for id in ids {
            let owned = self
                .open
                .get(id)
                .is_some_and(|c| namespace.map_or(true, |ns| c.namespace == *ns));
            if owned {
                self.open.remove(id);
                debug!(cursor_id = id, "cursor killed");
            }
        }
    }

    /// Forgets every cursor whose namespace satisfies `doomed`. Returns how
    /// many were removed.
    pub(crate) fn kill_where(&mut self, doomed: impl Fn(&Namespace) -> bool) -> usize {
        let before = self.open.len();
        self.open.retain(|_, cursor| !doomed(&cursor.namespace));
        let killed = before - self.open.len();
        if killed > 0 {
            debug!(killed, "cursors killed");
        }
        killed
    }

    pub(crate) fn is_open(&self, id: u64) -> bool {
        self.open.contains_key(&id)
    }
}
