#![deny(missing_docs)]
//! Zkvote API contains the module traits and the basic types required
//! to define the api of those traits.
//!
//! Peers converge on the set of identity commitments registered under a
//! voting subject. They find each other through [discovery], bulk-pull
//! identity sets through the [protocol] request/response exchange, and
//! then keep up to date through [pubsub] gossip.
//!
//! If you want to run a node, please see the zkvote_core crate.

/// Boxed future type.
pub type BoxFut<'a, T> =
    std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

pub(crate) mod serde_bytes_hex {
    pub fn serialize<S>(
        b: &bytes::Bytes,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex::encode(b))
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<bytes::Bytes, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s: std::borrow::Cow<'de, str> =
            serde::Deserialize::deserialize(deserializer)?;
        let b = hex::decode(s.as_ref()).map_err(serde::de::Error::custom)?;
        if b.len() != crate::id::DIGEST_LEN {
            return Err(serde::de::Error::invalid_length(
                b.len(),
                &"a 32 byte digest",
            ));
        }
        Ok(bytes::Bytes::from(b))
    }
}

mod error;
pub use error::*;

pub mod id;
pub use id::{
    Digest, HashHex, IdentityHash, PeerAddr, PeerId, SubjectHash,
};

mod timestamp;
pub use timestamp::*;

pub mod config;
pub use config::*;

pub mod builder;
pub use builder::*;

pub mod subject;
pub use subject::*;

pub mod identity;
pub use identity::*;

pub mod identity_index;
pub use identity_index::*;

pub mod transport;
pub use transport::*;

pub mod pubsub;
pub use pubsub::*;

pub mod discovery;
pub use discovery::*;

pub mod peer_store;
pub use peer_store::*;

pub mod protocol;
pub use protocol::*;

pub mod pull;
pub use pull::*;

pub mod collect;
pub use collect::*;

pub mod query;
pub use query::*;
