//! A no-op discovery implementation.
//!
//! Useful for tests that wire peers to each other by hand and do not
//! want discovery to find anyone.

use std::sync::Arc;
use std::time::Duration;
use zkvote_api::*;

/// A factory for constructing [NoopDiscovery] instances.
#[derive(Debug)]
pub struct NoopDiscoveryFactory;

impl DiscoveryFactory for NoopDiscoveryFactory {
    fn default_config(&self, _config: &mut Config) -> ZkvResult<()> {
        Ok(())
    }

    fn create(
        &self,
        _builder: Arc<Builder>,
        _local: PeerInfo,
    ) -> BoxFut<'static, ZkvResult<DynDiscovery>> {
        Box::pin(async move {
            let discovery: DynDiscovery = Arc::new(NoopDiscovery);
            Ok(discovery)
        })
    }
}

/// A discovery implementation that accepts advertisements and never
/// finds any peer.
#[derive(Debug)]
pub struct NoopDiscovery;

impl Discovery for NoopDiscovery {
    fn advertise(
        &self,
        _key: &str,
        ttl: Duration,
    ) -> BoxFut<'_, ZkvResult<Duration>> {
        Box::pin(async move { Ok(ttl) })
    }

    fn find_peers(&self, _key: &str) -> BoxFut<'_, ZkvResult<Vec<PeerInfo>>> {
        Box::pin(async move { Ok(Vec::new()) })
    }
}
