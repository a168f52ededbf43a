//! Identity and addressing types.

use crate::error::{CoreError, CoreResult};
use std::fmt;
use uuid::Uuid;

/// A `database.collection` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace {
    database: String,
    collection: String,
}

impl Namespace {
    /// Creates a namespace from its parts.
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }

    /// Parses `db.coll`. The collection part may itself contain dots.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidNamespace`] if either part is empty.
    pub fn parse(full_name: &str) -> CoreResult<Self> {
        match full_name.split_once('.') {
            Some((db, coll)) if !db.is_empty() && !coll.is_empty() => Ok(Self::new(db, coll)),
            _ => Err(CoreError::InvalidNamespace(full_name.to_string())),
        }
    }

    /// The database name.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// The collection name.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The `db.coll` form.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.database, self.collection)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Host and port of the simulated server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerAddress {
    /// Host name.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl ServerAddress {
    /// Default port of a document server.
    pub const DEFAULT_PORT: u16 = 27017;

    /// Creates an address.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Default for ServerAddress {
    fn default() -> Self {
        Self::new("127.0.0.1", Self::DEFAULT_PORT)
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A server version such as `3.6.0`.
///
/// Versions order component-wise, with missing components treated as zero.
#[derive(Debug, Clone, Eq)]
pub struct ServerVersion(Vec<u32>);

impl ServerVersion {
    /// Creates a version from its components.
    #[must_use]
    pub fn new(components: Vec<u32>) -> Self {
        Self(components)
    }

    /// Creates a `major.minor.patch` version.
    #[must_use]
    pub fn triple(major: u32, minor: u32, patch: u32) -> Self {
        Self(vec![major, minor, patch])
    }

    /// The version components.
    #[must_use]
    pub fn components(&self) -> &[u32] {
        &self.0
    }

    fn component(&self, index: usize) -> u32 {
        self.0.get(index).copied().unwrap_or(0)
    }
}

impl Default for ServerVersion {
    fn default() -> Self {
        Self::triple(3, 6, 0)
    }
}

impl PartialEq for ServerVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl PartialOrd for ServerVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServerVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        let len = self.0.len().max(other.0.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|ord| ord.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u32::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

/// Identifier of a simulated cluster, random per server handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClusterId(Uuid);

impl ClusterId {
    /// Creates a fresh random cluster id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ClusterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cluster:{}", self.0)
    }
}

/// A server within a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerId {
    /// The owning cluster.
    pub cluster_id: ClusterId,
    /// The server address.
    pub address: ServerAddress,
}

impl ServerId {
    /// Creates a server id.
    #[must_use]
    pub fn new(cluster_id: ClusterId, address: ServerAddress) -> Self {
        Self {
            cluster_id,
            address,
        }
    }
}

/// Identity of one logical connection to a server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId {
    /// The server the connection belongs to.
    pub server_id: ServerId,
    /// Local sequence value, unique per process.
    pub local_value: u64,
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "connection:{}@{}", self.local_value, self.server_id.address)
    }
}

/// Preference for which member of a deployment serves a read.
///
/// A single in-process engine has one member; the value is forwarded
/// untouched so that engines can observe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReadPreference {
    /// Read from the primary only.
    #[default]
    Primary,
    /// Prefer the primary, fall back to secondaries.
    PrimaryPreferred,
    /// Read from secondaries only.
    Secondary,
    /// Prefer secondaries, fall back to the primary.
    SecondaryPreferred,
    /// Read from the member with the lowest latency.
    Nearest,
}

impl ReadPreference {
    /// Returns true if the preference accepts non-primary members, which is
    /// the modern spelling of the legacy "slave ok" flag.
    #[must_use]
    pub const fn is_slave_ok(&self) -> bool {
        !matches!(self, ReadPreference::Primary)
    }
}
