//! Engine configuration.

use docbridge_core::{ServerAddress, ServerVersion};

/// Configuration for a [`MemoryEngine`](crate::MemoryEngine).
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Version reported by `buildInfo` and connection descriptions.
    pub server_version: ServerVersion,

    /// First-batch size used when a query asks for `0` documents.
    pub default_batch_size: u32,

    /// Highest wire protocol version reported by `isMaster`.
    pub max_wire_version: i32,

    /// Address stamped on query results.
    pub server_address: ServerAddress,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            server_version: ServerVersion::triple(3, 6, 0),
            default_batch_size: 101,
            max_wire_version: 6,
            server_address: ServerAddress::default(),
        }
    }
}

impl MemoryConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reported server version.
    #[must_use]
    pub fn server_version(mut self, version: ServerVersion) -> Self {
        self.server_version = version;
        self
    }

    /// Sets the default first-batch size.
    #[must_use]
    pub const fn default_batch_size(mut self, size: u32) -> Self {
        self.default_batch_size = size;
        self
    }

    /// Sets the reported maximum wire version.
    #[must_use]
    pub const fn max_wire_version(mut self, version: i32) -> Self {
        self.max_wire_version = version;
        self
    }

    /// Sets the address stamped on query results.
    #[must_use]
    pub fn server_address(mut self, address: ServerAddress) -> Self {
        self.server_address = address;
        self
    }
}
