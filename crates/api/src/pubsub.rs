//! Zkvote gossip publish/subscribe types.

use crate::*;
use std::sync::Arc;

/// A message received on a gossip topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubSubMessage {
    /// The peer that published the message.
    pub from: PeerId,

    /// The topic the message was published on.
    pub topic: String,

    /// Opaque payload.
    pub data: bytes::Bytes,

    /// When the message was received locally.
    pub received_at: Timestamp,
}

/// One live subscription to a gossip topic.
pub trait Subscription: 'static + Send + Sync + std::fmt::Debug {
    /// The topic this subscription is for.
    fn topic(&self) -> &str;

    /// Wait for the next message on the topic.
    ///
    /// Returns an error once the subscription has been cancelled or the
    /// underlying pubsub has shut down. Callers looping on this should
    /// stop at the first error.
    fn next(&self) -> BoxFut<'_, ZkvResult<PubSubMessage>>;

    /// Cancel the subscription. Pending and future calls to
    /// [Subscription::next] return an error.
    fn cancel(&self);
}

/// Trait-object [Subscription].
pub type DynSubscription = Arc<dyn Subscription>;

/// Broadcast publish/subscribe.
pub trait PubSub: 'static + Send + Sync + std::fmt::Debug {
    /// Subscribe to a topic. Each call creates an independent
    /// subscription receiving its own copy of every message.
    fn subscribe(&self, topic: &str) -> ZkvResult<DynSubscription>;

    /// Publish a message to every peer subscribed to the topic.
    fn publish(
        &self,
        topic: &str,
        data: bytes::Bytes,
    ) -> BoxFut<'_, ZkvResult<()>>;

    /// Topics with at least one live local subscription.
    fn topics(&self) -> Vec<String>;
}

/// Trait-object [PubSub].
pub type DynPubSub = Arc<dyn PubSub>;

/// A factory for creating PubSub instances.
pub trait PubSubFactory: 'static + Send + Sync + std::fmt::Debug {
    /// Help the builder construct a default config from the chosen
    /// module factories.
    fn default_config(&self, config: &mut Config) -> ZkvResult<()>;

    /// Construct a pubsub instance for the given local peer.
    fn create(
        &self,
        builder: Arc<Builder>,
        peer_id: PeerId,
    ) -> BoxFut<'static, ZkvResult<DynPubSub>>;
}

/// Trait-object [PubSubFactory].
pub type DynPubSubFactory = Arc<dyn PubSubFactory>;
