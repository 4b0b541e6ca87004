//! A memory-based address book.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use zkvote_api::*;

/// MemAddrBook configuration types.
mod config {
    /// Configuration parameters for [MemAddrBookFactory](super::MemAddrBookFactory).
    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    pub struct MemAddrBookConfig {
        /// The interval in seconds at which expired addresses will be pruned.
        ///
        /// Default: 10s.
        pub prune_interval_s: u32,
    }

    impl Default for MemAddrBookConfig {
        fn default() -> Self {
            Self {
                prune_interval_s: 10,
            }
        }
    }

    impl MemAddrBookConfig {
        /// Get the prune interval as a [std::time::Duration].
        pub fn prune_interval(&self) -> std::time::Duration {
            std::time::Duration::from_secs(self.prune_interval_s as u64)
        }
    }

    /// Module-level configuration for MemAddrBook.
    #[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    pub struct MemAddrBookModConfig {
        /// MemAddrBook configuration.
        pub mem_addr_book: MemAddrBookConfig,
    }
}

pub use config::*;

/// A memory-based address book factory.
///
/// Addresses are kept per peer with their own expiry. Lookups never
/// return expired addresses, the map itself is pruned on an interval.
#[derive(Debug)]
pub struct MemAddrBookFactory {}

impl MemAddrBookFactory {
    /// Construct a new MemAddrBookFactory
    pub fn create() -> DynAddrBookFactory {
        let out: DynAddrBookFactory = Arc::new(Self {});
        out
    }
}

impl AddrBookFactory for MemAddrBookFactory {
    fn default_config(&self, config: &mut Config) -> ZkvResult<()> {
        config.set_module_config(&MemAddrBookModConfig::default())
    }

    fn create(
        &self,
        builder: Arc<Builder>,
    ) -> BoxFut<'static, ZkvResult<DynAddrBook>> {
        Box::pin(async move {
            let config: MemAddrBookModConfig =
                builder.config.get_module_config()?;
            let out: DynAddrBook =
                Arc::new(MemAddrBook::new(config.mem_addr_book));
            Ok(out)
        })
    }
}

struct MemAddrBook(Mutex<Inner>);

impl std::fmt::Debug for MemAddrBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemAddrBook").finish()
    }
}

impl MemAddrBook {
    pub fn new(config: MemAddrBookConfig) -> Self {
        Self(Mutex::new(Inner::new(config, Instant::now())))
    }
}

impl AddrBook for MemAddrBook {
    fn add_addrs(&self, peer: PeerId, addrs: Vec<PeerAddr>, ttl: Duration) {
        self.0.lock().unwrap().add_addrs(peer, addrs, ttl, Instant::now());
    }

    fn addrs(&self, peer: &PeerId) -> Vec<PeerAddr> {
        self.0.lock().unwrap().addrs(peer, Instant::now())
    }

    fn peers(&self) -> Vec<PeerId> {
        self.0.lock().unwrap().peers(Instant::now())
    }
}

type AddrMap = HashMap<PeerAddr, Instant>;

struct Inner {
    config: MemAddrBookConfig,
    store: HashMap<PeerId, AddrMap>,
    no_prune_until: Instant,
}

impl Inner {
    fn new(config: MemAddrBookConfig, now: Instant) -> Self {
        let no_prune_until = now + config.prune_interval();
        Self {
            config,
            store: HashMap::new(),
            no_prune_until,
        }
    }

    fn check_prune(&mut self, now: Instant) {
        if self.no_prune_until > now {
            return;
        }

        self.store.retain(|_, addrs| {
            addrs.retain(|_, expires_at| *expires_at > now);
            !addrs.is_empty()
        });

        self.no_prune_until = now + self.config.prune_interval();
    }

    fn add_addrs(
        &mut self,
        peer: PeerId,
        addrs: Vec<PeerAddr>,
        ttl: Duration,
        now: Instant,
    ) {
        self.check_prune(now);

        let expires_at = now + ttl;
        let entry = self.store.entry(peer).or_default();
        for addr in addrs {
            let e = entry.entry(addr).or_insert(expires_at);
            if *e < expires_at {
                *e = expires_at;
            }
        }
    }

    fn addrs(&mut self, peer: &PeerId, now: Instant) -> Vec<PeerAddr> {
        self.check_prune(now);

        let mut out: Vec<PeerAddr> = match self.store.get(peer) {
            None => return Vec::new(),
            Some(addrs) => addrs
                .iter()
                .filter(|(_, expires_at)| **expires_at > now)
                .map(|(addr, _)| addr.clone())
                .collect(),
        };
        out.sort();
        out
    }

    fn peers(&mut self, now: Instant) -> Vec<PeerId> {
        self.check_prune(now);

        self.store
            .iter()
            .filter(|(_, addrs)| addrs.values().any(|e| *e > now))
            .map(|(peer, _)| peer.clone())
            .collect()
    }
}
