//! The collector finds subject providers and pulls their identity sets.
//!
//! It only depends on the narrow capabilities it uses: a [Discovery] to
//! advertise and look up providers, an [AddrBook] to remember their
//! addresses, a [PullRequester] to fetch identity sets, a [SubjectView]
//! to know which subjects are of interest and the [IdentityIndex] the
//! pulled identities are merged into.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use zkvote_api::*;

/// CoreCollector configuration types.
mod config {
    /// Configuration parameters for [CoreCollector](super::CoreCollector).
    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    pub struct CoreCollectorConfig {
        /// The discovery key providers advertise under.
        ///
        /// Default: "subjects".
        pub discovery_key: String,

        /// Requested validity of an advertisement in seconds.
        ///
        /// Default: 600s.
        pub advertise_ttl_s: u32,

        /// Bound in seconds on a single advertise or lookup call.
        ///
        /// Default: 30s.
        pub discovery_timeout_s: u32,

        /// How long in seconds the addresses of found providers are kept.
        ///
        /// Default: 24h.
        pub addr_ttl_s: u32,
    }

    impl Default for CoreCollectorConfig {
        fn default() -> Self {
            Self {
                discovery_key: zkvote_api::SUBJECTS_KEY.to_string(),
                advertise_ttl_s: 60 * 10,
                discovery_timeout_s: 30,
                addr_ttl_s: 60 * 60 * 24,
            }
        }
    }

    impl CoreCollectorConfig {
        pub(super) fn advertise_ttl(&self) -> std::time::Duration {
            std::time::Duration::from_secs(self.advertise_ttl_s as u64)
        }

        pub(super) fn discovery_timeout(&self) -> std::time::Duration {
            std::time::Duration::from_secs(self.discovery_timeout_s as u64)
        }

        pub(super) fn addr_ttl(&self) -> std::time::Duration {
            std::time::Duration::from_secs(self.addr_ttl_s as u64)
        }
    }

    /// Module-level configuration for CoreCollector.
    #[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    pub struct CoreCollectorModConfig {
        /// CoreCollector configuration.
        pub core_collector: CoreCollectorConfig,
    }
}

pub use config::*;

/// Capabilities the collector is built from.
#[derive(Debug, Clone)]
pub struct CollectorDeps {
    /// The local peer, never pulled from.
    pub local: PeerId,

    /// Provider advertisement and lookup.
    pub discovery: DynDiscovery,

    /// Where found provider addresses are recorded.
    pub addr_book: DynAddrBook,

    /// Issues identity pulls.
    pub requester: DynPullRequester,

    /// The subjects of interest.
    pub subjects: DynSubjectView,

    /// Where pulled identities are merged.
    pub index: DynIdentityIndex,
}

/// Advertises the local peer, finds other providers and collects their
/// identity sets.
#[derive(Debug)]
pub struct CoreCollector {
    config: CoreCollectorConfig,
    deps: CollectorDeps,
    providers: Mutex<HashMap<PeerId, String>>,
}

impl CoreCollector {
    /// Add the default module config.
    pub fn default_config(config: &mut Config) -> ZkvResult<()> {
        config.set_module_config(&CoreCollectorModConfig::default())
    }

    /// Construct a new collector.
    pub fn create(
        config: CoreCollectorConfig,
        deps: CollectorDeps,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            deps,
            providers: Mutex::new(HashMap::new()),
        })
    }

    /// Advertise the local peer as a subject provider.
    ///
    /// Fails with [ZkvError::NotReady] if no subject is subscribed, in
    /// which case nothing is advertised. Returns the granted validity.
    pub async fn announce(&self) -> ZkvResult<Duration> {
        if !self.deps.subjects.has_subscriptions() {
            return Err(ZkvError::not_ready(
                "no active subject subscription to announce",
            ));
        }

        let key = &self.config.discovery_key;
        let granted = bounded(
            self.config.discovery_timeout(),
            "advertise",
            self.deps.discovery.advertise(key, self.config.advertise_ttl()),
        )
        .await?;

        tracing::info!(%key, ?granted, "announced as subject provider");

        Ok(granted)
    }

    /// Look up subject providers, remember their addresses and replace
    /// the provider table with them.
    pub async fn find_proposers(&self) -> ZkvResult<Vec<PeerInfo>> {
        let key = &self.config.discovery_key;
        let found = bounded(
            self.config.discovery_timeout(),
            "find peers",
            self.deps.discovery.find_peers(key),
        )
        .await?;

        let addr_ttl = self.config.addr_ttl();
        let mut providers = HashMap::with_capacity(found.len());
        for info in found.iter() {
            tracing::debug!(peer = %info.id, addrs = ?info.addrs, "found provider");
            self.deps
                .addr_book
                .add_addrs(info.id.clone(), info.addrs.clone(), addr_ttl);
            providers.insert(info.id.clone(), String::new());
        }

        tracing::debug!(%key, count = providers.len(), "provider lookup done");

        *self.providers.lock().unwrap() = providers;

        Ok(found)
    }

    /// Find providers, pull every subject of interest from every provider
    /// other than the local peer, and merge what arrives into the index.
    ///
    /// Waits until every sent pull has answered or timed out. Failed pulls
    /// are listed in the report, a failed lookup fails the whole call.
    pub async fn collect(&self) -> ZkvResult<CollectReport> {
        self.find_proposers().await?;

        let subjects = self.deps.subjects.active_subjects();
        let mut targets: Vec<PeerId> = self
            .providers
            .lock()
            .unwrap()
            .keys()
            .filter(|p| **p != self.deps.local)
            .cloned()
            .collect();
        targets.sort();

        let mut failures = Vec::new();

        let pulls: Vec<(PeerId, SubjectHash)> = targets
            .iter()
            .flat_map(|peer| {
                subjects.iter().map(move |(s, _)| (peer.clone(), s.clone()))
            })
            .collect();

        let (response_tx, mut response_rx) =
            tokio::sync::mpsc::channel(std::cmp::max(1, pulls.len()));

        let sent = futures::future::join_all(pulls.iter().map(
            |(peer, subject)| {
                self.deps.requester.submit_request(
                    peer.clone(),
                    subject.clone(),
                    response_tx.clone(),
                )
            },
        ))
        .await;
        drop(response_tx);

        let mut expected = 0;
        for ((peer, subject), ok) in pulls.into_iter().zip(sent) {
            if ok {
                expected += 1;
            } else {
                failures.push(PeerFailure {
                    peer,
                    subject: subject.hex(),
                    reason: "failed to send identity request".into(),
                });
            }
        }

        while expected > 0 {
            let Some(res) = response_rx.recv().await else {
                tracing::warn!(expected, "pull responses stopped arriving");
                break;
            };
            expected -= 1;

            match res.outcome {
                PullOutcome::Identities(ids) => {
                    let mut added = 0;
                    for id in ids {
                        match IdentityHash::from_hex(&id) {
                            Ok(id) => {
                                if self.deps.index.insert(&res.subject, &id) {
                                    added += 1;
                                }
                            }
                            Err(err) => {
                                tracing::warn!(?err, peer = %res.peer, "skipping bad identity")
                            }
                        }
                    }
                    tracing::debug!(peer = %res.peer, subject = %res.subject, added, "merged pulled identities");
                }
                PullOutcome::TimedOut => failures.push(PeerFailure {
                    peer: res.peer,
                    subject: res.subject.hex(),
                    reason: "identity request timed out".into(),
                }),
            }
        }

        failures.sort_by(|a, b| {
            (&a.peer, &a.subject).cmp(&(&b.peer, &b.subject))
        });

        let subjects: BTreeMap<HashHex, SubjectReport> = subjects
            .into_iter()
            .map(|(hash, subject)| {
                let identities: BTreeSet<HashHex> =
                    self.deps.index.get(&hash).into_iter().collect();
                (hash.hex(), SubjectReport { subject, identities })
            })
            .collect();

        tracing::info!(
            subjects = subjects.len(),
            peers = targets.len(),
            failures = failures.len(),
            "collect done"
        );

        Ok(CollectReport { subjects, failures })
    }

    /// The labels of the subscribed subjects.
    pub fn list(&self) -> Vec<String> {
        self.deps
            .subjects
            .active_subjects()
            .into_iter()
            .map(|(_, subject)| subject.title)
            .collect()
    }

    /// Snapshot of the provider table from the last lookup.
    pub fn providers(&self) -> BTreeMap<PeerId, String> {
        self.providers
            .lock()
            .unwrap()
            .iter()
            .map(|(p, l)| (p.clone(), l.clone()))
            .collect()
    }
}

/// Run a discovery call, turning an elapsed bound into [ZkvError::Timeout].
async fn bounded<T>(
    limit: Duration,
    what: &str,
    fut: BoxFut<'_, ZkvResult<T>>,
) -> ZkvResult<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(r) => r,
        Err(_) => Err(ZkvError::timeout(format!(
            "{what} did not complete within {limit:?}"
        ))),
    }
}
