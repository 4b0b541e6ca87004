use crate::factories::core_collector::CoreCollectorModConfig;
use crate::factories::core_identity_protocol::CoreIdentityProtocolModConfig;
use crate::factories::*;
use std::sync::Arc;
use zkvote_api::*;

/// Adds the configs of the modules a [Node] creates itself.
#[derive(Debug)]
pub struct NodeDefaultConfig {}

impl NodeDefaultConfig {
    /// Construct a new NodeDefaultConfig.
    pub fn create() -> DynDefaultConfig {
        let out: DynDefaultConfig = Arc::new(Self {});
        out
    }
}

impl DefaultConfig for NodeDefaultConfig {
    fn default_config(&self, config: &mut Config) -> ZkvResult<()> {
        Node::default_config(config)
    }
}

/// All the modules of one zkvote peer, wired together.
///
/// Dropping the node stops every background task it started.
#[derive(Debug)]
pub struct Node {
    builder: Arc<Builder>,
    transport: DynTransport,
    pubsub: DynPubSub,
    discovery: DynDiscovery,
    addr_book: DynAddrBook,
    index: DynIdentityIndex,
    protocol: Arc<CoreIdentityProtocol>,
    subscriber: Arc<CoreSubscriber>,
    collector: Arc<CoreCollector>,
}

impl Node {
    /// Add the default configs of the modules the node creates itself.
    /// [Builder::with_default_config] does this through
    /// [NodeDefaultConfig].
    pub fn default_config(config: &mut Config) -> ZkvResult<()> {
        CoreIdentityProtocol::default_config(config)?;
        CoreCollector::default_config(config)?;
        Ok(())
    }

    /// Create every module from `builder` and wire them together.
    pub async fn new(builder: Arc<Builder>) -> ZkvResult<Self> {
        let transport = builder.transport.create(builder.clone()).await?;
        let peer_id = transport.peer_id();

        let pubsub = builder
            .pubsub
            .create(builder.clone(), peer_id.clone())
            .await?;

        let local = PeerInfo {
            id: peer_id.clone(),
            addrs: transport.listen_addrs(),
        };
        let discovery =
            builder.discovery.create(builder.clone(), local).await?;

        let addr_book = builder.addr_book.create(builder.clone()).await?;
        let index = builder.identity_index.create(builder.clone()).await?;

        let protocol_config: CoreIdentityProtocolModConfig =
            builder.config.get_module_config()?;
        let protocol = CoreIdentityProtocol::create(
            protocol_config.core_identity_protocol,
            transport.clone(),
            index.clone(),
        );

        let subscriber =
            CoreSubscriber::create(pubsub.clone(), index.clone());

        let collector_config: CoreCollectorModConfig =
            builder.config.get_module_config()?;
        let collector = CoreCollector::create(
            collector_config.core_collector,
            CollectorDeps {
                local: peer_id.clone(),
                discovery: discovery.clone(),
                addr_book: addr_book.clone(),
                requester: protocol.clone(),
                subjects: subscriber.clone(),
                index: index.clone(),
            },
        );

        tracing::info!(%peer_id, "node started");

        Ok(Self {
            builder,
            transport,
            pubsub,
            discovery,
            addr_book,
            index,
            protocol,
            subscriber,
            collector,
        })
    }

    /// The builder the node was created from.
    pub fn builder(&self) -> &Arc<Builder> {
        &self.builder
    }

    /// The local peer id.
    pub fn peer_id(&self) -> PeerId {
        self.transport.peer_id()
    }

    /// The transport module.
    pub fn transport(&self) -> &DynTransport {
        &self.transport
    }

    /// The pubsub module.
    pub fn pubsub(&self) -> &DynPubSub {
        &self.pubsub
    }

    /// The discovery module.
    pub fn discovery(&self) -> &DynDiscovery {
        &self.discovery
    }

    /// The address book module.
    pub fn addr_book(&self) -> &DynAddrBook {
        &self.addr_book
    }

    /// The identity index.
    pub fn index(&self) -> &DynIdentityIndex {
        &self.index
    }

    /// The identity protocol.
    pub fn protocol(&self) -> &Arc<CoreIdentityProtocol> {
        &self.protocol
    }

    /// The gossip subscriber.
    pub fn subscriber(&self) -> &Arc<CoreSubscriber> {
        &self.subscriber
    }

    /// The collector.
    pub fn collector(&self) -> &Arc<CoreCollector> {
        &self.collector
    }
}

#[cfg(test)]
mod test;
