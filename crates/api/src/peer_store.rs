//! Peer-store related types.

use crate::*;
use std::sync::Arc;
use std::time::Duration;

/// Remembers the network addresses of known peers.
pub trait AddrBook: 'static + Send + Sync + std::fmt::Debug {
    /// Record addresses for a peer, to be kept for at least `ttl`.
    /// Re-adding an address extends its retention if `ttl` reaches
    /// further than the existing one.
    fn add_addrs(&self, peer: PeerId, addrs: Vec<PeerAddr>, ttl: Duration);

    /// The unexpired addresses known for a peer.
    fn addrs(&self, peer: &PeerId) -> Vec<PeerAddr>;

    /// All peers with at least one unexpired address.
    fn peers(&self) -> Vec<PeerId>;
}

/// Trait-object [AddrBook].
pub type DynAddrBook = Arc<dyn AddrBook>;

/// A factory for constructing [AddrBook] instances.
pub trait AddrBookFactory: 'static + Send + Sync + std::fmt::Debug {
    /// Help the builder construct a default config from the chosen
    /// module factories.
    fn default_config(&self, config: &mut Config) -> ZkvResult<()>;

    /// Construct an address book instance.
    fn create(
        &self,
        builder: Arc<Builder>,
    ) -> BoxFut<'static, ZkvResult<DynAddrBook>>;
}

/// Trait-object [AddrBookFactory].
pub type DynAddrBookFactory = Arc<dyn AddrBookFactory>;
