//! The in-memory provider discovery.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use zkvote_api::*;

/// MemDiscovery configuration types.
mod config {
    /// Configuration parameters for [MemDiscoveryFactory](super::MemDiscoveryFactory).
    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    pub struct MemDiscoveryConfig {
        /// Separates the provider records of tests running in parallel.
        /// Defaults to the current thread id when the config is
        /// constructed.
        pub network_id: String,

        /// Upper bound in seconds on the validity granted to an
        /// advertisement, whatever ttl was asked for.
        ///
        /// Default: 3600s.
        pub max_ttl_s: u32,
    }

    impl Default for MemDiscoveryConfig {
        fn default() -> Self {
            Self {
                network_id: format!("{:?}", std::thread::current().id()),
                max_ttl_s: 60 * 60,
            }
        }
    }

    /// Module-level configuration for MemDiscovery.
    #[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    pub struct MemDiscoveryModConfig {
        /// MemDiscovery configuration.
        pub mem_discovery: MemDiscoveryConfig,
    }
}

pub use config::*;

/// The in-memory discovery factory.
/// This is NOT a production module. It is for testing only.
#[derive(Debug)]
pub struct MemDiscoveryFactory {}

impl MemDiscoveryFactory {
    /// Construct a new MemDiscoveryFactory.
    pub fn create() -> DynDiscoveryFactory {
        let out: DynDiscoveryFactory = Arc::new(MemDiscoveryFactory {});
        out
    }
}

impl DiscoveryFactory for MemDiscoveryFactory {
    fn default_config(&self, config: &mut Config) -> ZkvResult<()> {
        config.set_module_config(&MemDiscoveryModConfig::default())
    }

    fn create(
        &self,
        builder: Arc<Builder>,
        local: PeerInfo,
    ) -> BoxFut<'static, ZkvResult<DynDiscovery>> {
        Box::pin(async move {
            let config: MemDiscoveryModConfig =
                builder.config.get_module_config()?;
            let out: DynDiscovery = Arc::new(MemDiscovery {
                network_id: config.mem_discovery.network_id.clone().into(),
                max_ttl: Duration::from_secs(
                    config.mem_discovery.max_ttl_s as u64,
                ),
                local,
            });
            Ok(out)
        })
    }
}

#[derive(Debug)]
struct MemDiscovery {
    network_id: NetworkId,
    max_ttl: Duration,
    local: PeerInfo,
}

impl Discovery for MemDiscovery {
    fn advertise(
        &self,
        key: &str,
        ttl: Duration,
    ) -> BoxFut<'_, ZkvResult<Duration>> {
        let key = key.to_string();
        Box::pin(async move {
            let granted = std::cmp::min(ttl, self.max_ttl);
            let record = Record {
                info: self.local.clone(),
                expires_at: Timestamp::now() + granted,
            };
            stat_process(&self.network_id, &key, Some(record));
            tracing::trace!(peer = %self.local.id, %key, ?granted, "advertised");
            Ok(granted)
        })
    }

    fn find_peers(&self, key: &str) -> BoxFut<'_, ZkvResult<Vec<PeerInfo>>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut out: Vec<PeerInfo> =
                stat_process(&self.network_id, &key, None)
                    .into_iter()
                    .map(|r| r.info)
                    .collect();
            out.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(out)
        })
    }
}

type NetworkId = Arc<str>;

#[derive(Debug, Clone)]
struct Record {
    info: PeerInfo,
    expires_at: Timestamp,
}

type KeyMap = HashMap<String, Vec<Record>>;
type NetworkMap = HashMap<NetworkId, KeyMap>;
static STAT: OnceLock<Mutex<NetworkMap>> = OnceLock::new();

/// Drop expired records under `key`, replace the record of the
/// advertising peer if one is given, and return what is left.
fn stat_process(
    network_id: &NetworkId,
    key: &str,
    record: Option<Record>,
) -> Vec<Record> {
    let mut lock = STAT.get_or_init(Default::default).lock().unwrap();
    let keys = lock.entry(network_id.clone()).or_default();
    let store = keys.entry(key.to_string()).or_default();
    let now = Timestamp::now();
    store.retain(|r| {
        if let Some(record) = record.as_ref() {
            if r.info.id == record.info.id {
                return false;
            }
        }
        r.expires_at > now
    });
    if let Some(record) = record {
        store.push(record);
    }
    store.clone()
}

#[cfg(test)]
mod test;
