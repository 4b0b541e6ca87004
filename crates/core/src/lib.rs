#![deny(missing_docs)]
//! Zkvote identity-set convergence core.
//!
//! Peers converge on the identity commitments registered under a voting
//! subject. A [Node] bundles the pieces: the [factories::CoreSubscriber]
//! keeps subjects up to date through gossip, the
//! [factories::CoreIdentityProtocol] bulk-pulls identity sets from single
//! peers and the [factories::CoreCollector] finds providers and drives
//! the pulls.

use zkvote_api::*;

/// Construct a builder using only the in-memory modules.
///
/// - `transport` - [factories::MemTransportFactory].
/// - `pubsub` - [factories::MemPubSubFactory].
/// - `discovery` - [factories::MemDiscoveryFactory].
/// - `addr_book` - [factories::MemAddrBookFactory].
/// - `identity_index` - [factories::MemIdentityIndexFactory].
/// - `core` - [NodeDefaultConfig].
///
/// Nodes built from it can only reach other nodes in the same process,
/// on the same `networkId`.
pub fn default_test_builder() -> Builder {
    Builder {
        config: Config::default(),
        transport: factories::MemTransportFactory::create(),
        pubsub: factories::MemPubSubFactory::create(),
        discovery: factories::MemDiscoveryFactory::create(),
        addr_book: factories::MemAddrBookFactory::create(),
        identity_index: factories::MemIdentityIndexFactory::create(),
        core: NodeDefaultConfig::create(),
    }
}

pub mod factories;

mod node;
pub use node::*;
