//! Zkvote peer discovery types.

use crate::*;
use std::sync::Arc;
use std::time::Duration;

/// The well-known discovery key under which subject providers advertise.
pub const SUBJECTS_KEY: &str = "subjects";

/// A peer found through discovery.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PeerInfo {
    /// The peer id.
    pub id: PeerId,

    /// Addresses at which the peer can be reached.
    pub addrs: Vec<PeerAddr>,
}

/// Provider advertisement and lookup.
///
/// Implementations do not bound the duration of these calls themselves,
/// callers are expected to wrap them in a timeout.
pub trait Discovery: 'static + Send + Sync + std::fmt::Debug {
    /// Advertise the local peer as a provider under `key` for `ttl`.
    /// Returns the validity period actually granted.
    fn advertise(
        &self,
        key: &str,
        ttl: Duration,
    ) -> BoxFut<'_, ZkvResult<Duration>>;

    /// Look up the peers currently advertised under `key`.
    fn find_peers(&self, key: &str) -> BoxFut<'_, ZkvResult<Vec<PeerInfo>>>;
}

/// Trait-object [Discovery].
pub type DynDiscovery = Arc<dyn Discovery>;

/// A factory for creating Discovery instances.
pub trait DiscoveryFactory: 'static + Send + Sync + std::fmt::Debug {
    /// Help the builder construct a default config from the chosen
    /// module factories.
    fn default_config(&self, config: &mut Config) -> ZkvResult<()>;

    /// Construct a discovery instance advertising as `local`.
    fn create(
        &self,
        builder: Arc<Builder>,
        local: PeerInfo,
    ) -> BoxFut<'static, ZkvResult<DynDiscovery>>;
}

/// Trait-object [DiscoveryFactory].
pub type DynDiscoveryFactory = Arc<dyn DiscoveryFactory>;
