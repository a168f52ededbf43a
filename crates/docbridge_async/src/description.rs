//! Connection metadata.

use docbridge_core::{
    ConnectionId, Engine, ServerAddress, ServerId, ServerVersion, ServerVersionSource,
};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_LOCAL_VALUE: AtomicU64 = AtomicU64::new(1);

/// Identity of a simulated connection.
///
/// The identity is fixed at construction. The server version is not: it is
/// read from the version source on every call, so a version change made on
/// the engine after the connection was created shows up in later reads.
#[derive(Clone)]
pub struct ConnectionDescription {
    connection_id: ConnectionId,
    version_source: Arc<dyn ServerVersionSource>,
}

impl ConnectionDescription {
    /// Creates a description with a fresh local connection value.
    pub fn new(server_id: ServerId, version_source: Arc<dyn ServerVersionSource>) -> Self {
        let local_value = NEXT_LOCAL_VALUE.fetch_add(1, Ordering::Relaxed);
        Self {
            connection_id: ConnectionId {
                server_id,
                local_value,
            },
            version_source,
        }
    }

    /// The connection identity.
    #[must_use]
    pub fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }

    /// The server this connection talks to.
    #[must_use]
    pub fn server_id(&self) -> &ServerId {
        &self.connection_id.server_id
    }

    /// The server address.
    #[must_use]
    pub fn server_address(&self) -> &ServerAddress {
        &self.connection_id.server_id.address
    }

    /// The server version, looked up live.
    #[must_use]
    pub fn server_version(&self) -> ServerVersion {
        self.version_source.current_server_version()
    }
}

impl fmt::Debug for ConnectionDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescription")
            .field("connection_id", &self.connection_id)
            .finish_non_exhaustive()
    }
}

/// Reads the version from the engine on every lookup.
pub(crate) struct EngineVersionSource<E>(pub(crate) Arc<E>);

impl<E: Engine> ServerVersionSource for EngineVersionSource<E> {
    fn current_server_version(&self) -> ServerVersion {
        self.0.server_version()
    }
}
