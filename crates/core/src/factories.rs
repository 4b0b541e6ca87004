//! Factories for generating instances of zkvote modules.

mod mem_transport;
pub use mem_transport::*;

pub mod mem_pubsub;
pub use mem_pubsub::MemPubSubFactory;

pub mod mem_discovery;
pub use mem_discovery::MemDiscoveryFactory;

pub mod mem_addr_book;
pub use mem_addr_book::MemAddrBookFactory;

mod mem_identity_index;
pub use mem_identity_index::*;

pub mod core_identity_protocol;
pub use core_identity_protocol::CoreIdentityProtocol;

mod core_subscriber;
pub use core_subscriber::*;

pub mod core_collector;
pub use core_collector::{CollectorDeps, CoreCollector};
