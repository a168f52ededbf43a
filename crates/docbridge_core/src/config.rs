//! Bridge configuration.

use crate::types::ServerAddress;
use crate::write::WriteConcern;

/// Configuration for connections handed out by a simulated server.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Address reported in connection descriptions and query results.
    pub server_address: ServerAddress,

    /// Write concern used by the single-request insert, update and delete
    /// overloads.
    pub default_write_concern: WriteConcern,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            server_address: ServerAddress::default(),
            default_write_concern: WriteConcern::UNACKNOWLEDGED,
        }
    }
}

impl BridgeConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reported server address.
    #[must_use]
    pub fn server_address(mut self, address: ServerAddress) -> Self {
        self.server_address = address;
        self
    }

    /// Sets the write concern of the single-request write overloads.
    #[must_use]
    pub fn default_write_concern(mut self, write_concern: WriteConcern) -> Self {
        self.default_write_concern = write_concern;
        self
    }
}
