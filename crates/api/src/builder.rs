//! Builder-related types.

use crate::*;
use std::sync::Arc;

/// Contributes the default config of modules that are not created
/// through one of the builder's factories.
pub trait DefaultConfig: 'static + Send + Sync + std::fmt::Debug {
    /// Add the default module configs.
    fn default_config(&self, config: &mut Config) -> ZkvResult<()>;
}

/// Trait-object [DefaultConfig].
pub type DynDefaultConfig = Arc<dyn DefaultConfig>;

/// The general zkvote builder.
/// This contains both configuration and factory instances,
/// allowing construction of runtime module instances.
#[derive(Debug)]
pub struct Builder {
    /// The module configuration to be used when building modules.
    /// This can be loaded from disk or modified before freezing the builder.
    pub config: Config,

    /// The [TransportFactory] to be used for creating
    /// [Transport] instances.
    pub transport: DynTransportFactory,

    /// The [PubSubFactory] to be used for creating [PubSub] instances.
    pub pubsub: DynPubSubFactory,

    /// The [DiscoveryFactory] to be used for creating
    /// [Discovery] instances.
    pub discovery: DynDiscoveryFactory,

    /// The [AddrBookFactory] to be used for creating
    /// [AddrBook] instances.
    pub addr_book: DynAddrBookFactory,

    /// The [IdentityIndexFactory] to be used for creating
    /// [IdentityIndex] instances.
    pub identity_index: DynIdentityIndexFactory,

    /// Default config of the core modules, which a node constructs
    /// directly rather than through a factory.
    pub core: DynDefaultConfig,
}

impl Builder {
    /// Construct a default config given the configured module factories.
    /// Note, this should be called before freezing the Builder instance
    /// in an Arc<>.
    pub fn with_default_config(mut self) -> ZkvResult<Self> {
        {
            let Self {
                config,
                transport,
                pubsub,
                discovery,
                addr_book,
                identity_index,
                core,
            } = &mut self;

            transport.default_config(config)?;
            pubsub.default_config(config)?;
            discovery.default_config(config)?;
            addr_book.default_config(config)?;
            identity_index.default_config(config)?;
            core.default_config(config)?;
        }

        Ok(self)
    }

    /// Freeze the builder so it can be shared with the module factories.
    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }
}
