//! The simulated server handle.

use crate::connection::{AsyncBridge, AsyncConnection};
use crate::executor::OperationDispatcher;
use docbridge_core::{BridgeConfig, ClusterId, Engine, ServerAddress, ServerId, ServerVersion};
use std::sync::Arc;
use tracing::debug;

/// A server backed by an in-process engine.
///
/// Hands out connections and executors that all share the same engine and
/// report the same [`ServerId`].
pub struct SimulatedServer<E: Engine> {
    engine: Arc<E>,
    config: BridgeConfig,
    cluster_id: ClusterId,
}

impl<E: Engine + 'static> SimulatedServer<E> {
    /// Wraps `engine` with the default configuration.
    pub fn new(engine: E) -> Self {
        Self::from_arc(Arc::new(engine), BridgeConfig::default())
    }

    /// Wraps an already shared engine.
    pub fn from_arc(engine: Arc<E>, config: BridgeConfig) -> Self {
        Self {
            engine,
            config,
            cluster_id: ClusterId::new(),
        }
    }

    /// The shared engine.
    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// The configured address.
    pub fn server_address(&self) -> &ServerAddress {
        &self.config.server_address
    }

    /// The version the engine reports right now.
    pub fn server_version(&self) -> ServerVersion {
        self.engine.server_version()
    }

    /// The cluster this server belongs to.
    pub fn cluster_id(&self) -> &ClusterId {
        &self.cluster_id
    }

    /// The server identity shared by every connection.
    pub fn server_id(&self) -> ServerId {
        ServerId::new(self.cluster_id, self.config.server_address.clone())
    }

    /// Opens a new connection.
    pub fn connect(&self) -> AsyncBridge<E> {
        let bridge =
            AsyncBridge::with_server_id(Arc::clone(&self.engine), self.server_id(), &self.config);
        debug!(connection_id = %bridge.description().connection_id(), "connection opened");
        bridge
    }

    /// Creates an operation executor.
    pub fn executor(&self) -> OperationDispatcher<E> {
        OperationDispatcher::new(Arc::clone(&self.engine))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docbridge_testkit::RecordingEngine;

    #[test]
    fn connections_share_server_identity() {
        let server = SimulatedServer::new(RecordingEngine::new());
        let a = server.connect();
        let b = server.connect();

        assert_eq!(a.description().server_id(), b.description().server_id());
        assert_eq!(a.description().server_id().cluster_id, *server.cluster_id());
        assert_ne!(a.description().connection_id(), b.description().connection_id());
        assert!(Arc::ptr_eq(a.engine(), server.engine()));
    }

    #[test]
    fn configured_address_reaches_descriptions() {
        let config = BridgeConfig::new().server_address(ServerAddress::new("db.local", 27018));
        let server = SimulatedServer::from_arc(Arc::new(RecordingEngine::new()), config);
        let bridge = server.connect();
        assert_eq!(bridge.description().server_address(), &ServerAddress::new("db.local", 27018));
    }

    #[test]
    fn server_version_is_live() {
        let server = SimulatedServer::new(RecordingEngine::new());
        server.engine().set_server_version(ServerVersion::triple(4, 4, 1));
        assert_eq!(server.server_version(), ServerVersion::triple(4, 4, 1));
    }
}
