//! The in-memory gossip pubsub.
//!
//! Every pubsub with the same `networkId` shares one broker. A publish
//! delivers a copy to every subscription on the topic except those of
//! the publishing peer itself.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use zkvote_api::*;

/// MemPubSub configuration types.
mod config {
    /// Configuration parameters for [MemPubSubFactory](super::MemPubSubFactory).
    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    pub struct MemPubSubConfig {
        /// Rust tests run in parallel in one process, so there cannot be
        /// one global broker. This defaults to the current thread id when
        /// the config is constructed. Nodes created from other tasks or
        /// threads that should share a network must set it explicitly.
        pub network_id: String,
    }

    impl Default for MemPubSubConfig {
        fn default() -> Self {
            Self {
                network_id: format!("{:?}", std::thread::current().id()),
            }
        }
    }

    /// Module-level configuration for MemPubSub.
    #[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    pub struct MemPubSubModConfig {
        /// MemPubSub configuration.
        pub mem_pub_sub: MemPubSubConfig,
    }
}

pub use config::*;

/// The in-memory pubsub factory.
/// This is NOT a production module. It is for testing only.
#[derive(Debug)]
pub struct MemPubSubFactory {}

impl MemPubSubFactory {
    /// Construct a new MemPubSubFactory.
    pub fn create() -> DynPubSubFactory {
        let out: DynPubSubFactory = Arc::new(MemPubSubFactory {});
        out
    }
}

impl PubSubFactory for MemPubSubFactory {
    fn default_config(&self, config: &mut Config) -> ZkvResult<()> {
        config.set_module_config(&MemPubSubModConfig::default())
    }

    fn create(
        &self,
        builder: Arc<Builder>,
        peer_id: PeerId,
    ) -> BoxFut<'static, ZkvResult<DynPubSub>> {
        Box::pin(async move {
            let config: MemPubSubModConfig =
                builder.config.get_module_config()?;
            let out: DynPubSub = Arc::new(MemPubSub {
                network_id: config.mem_pub_sub.network_id.into(),
                peer_id,
            });
            Ok(out)
        })
    }
}

#[derive(Debug)]
struct MemPubSub {
    network_id: NetworkId,
    peer_id: PeerId,
}

impl PubSub for MemPubSub {
    fn subscribe(&self, topic: &str) -> ZkvResult<DynSubscription> {
        use std::sync::atomic::*;
        static SUB_ID: AtomicU64 = AtomicU64::new(1);
        let sub_id = SUB_ID.fetch_add(1, Ordering::Relaxed);

        let (send, recv) = tokio::sync::mpsc::unbounded_channel();

        with_topics(&self.network_id, |topics| {
            topics.entry(topic.to_string()).or_default().push(Entry {
                sub_id,
                peer: self.peer_id.clone(),
                send,
            });
        });

        tracing::trace!(peer = %self.peer_id, %topic, sub_id, "subscribed");

        let out: DynSubscription = Arc::new(MemSubscription {
            network_id: self.network_id.clone(),
            topic: topic.to_string(),
            sub_id,
            recv: tokio::sync::Mutex::new(recv),
        });
        Ok(out)
    }

    fn publish(
        &self,
        topic: &str,
        data: bytes::Bytes,
    ) -> BoxFut<'_, ZkvResult<()>> {
        let topic = topic.to_string();
        Box::pin(async move {
            let received_at = Timestamp::now();
            let msg = PubSubMessage {
                from: self.peer_id.clone(),
                topic: topic.clone(),
                data,
                received_at,
            };

            let delivered = with_topics(&self.network_id, |topics| {
                let mut delivered = 0;
                if let Some(entries) = topics.get(&topic) {
                    for entry in entries.iter() {
                        if entry.peer == self.peer_id {
                            continue;
                        }
                        if entry.send.send(msg.clone()).is_ok() {
                            delivered += 1;
                        }
                    }
                }
                delivered
            });

            tracing::trace!(peer = %self.peer_id, %topic, delivered, "published");

            Ok(())
        })
    }

    fn topics(&self) -> Vec<String> {
        let mut out: Vec<String> = with_topics(&self.network_id, |topics| {
            topics
                .iter()
                .filter(|(_, entries)| {
                    entries.iter().any(|e| e.peer == self.peer_id)
                })
                .map(|(topic, _)| topic.clone())
                .collect()
        });
        out.sort();
        out
    }
}

#[derive(Debug)]
struct MemSubscription {
    network_id: NetworkId,
    topic: String,
    sub_id: u64,
    recv: tokio::sync::Mutex<MsgRecv>,
}

impl Drop for MemSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl Subscription for MemSubscription {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn next(&self) -> BoxFut<'_, ZkvResult<PubSubMessage>> {
        Box::pin(async move {
            self.recv.lock().await.recv().await.ok_or_else(|| {
                ZkvError::other(format!(
                    "subscription to {} cancelled",
                    self.topic
                ))
            })
        })
    }

    fn cancel(&self) {
        // dropping the broker side sender ends any pending next()
        with_topics(&self.network_id, |topics| {
            if let Some(entries) = topics.get_mut(&self.topic) {
                entries.retain(|e| e.sub_id != self.sub_id);
                if entries.is_empty() {
                    topics.remove(&self.topic);
                }
            }
        });
    }
}

type NetworkId = Arc<str>;
type MsgSend = tokio::sync::mpsc::UnboundedSender<PubSubMessage>;
type MsgRecv = tokio::sync::mpsc::UnboundedReceiver<PubSubMessage>;

#[derive(Debug)]
struct Entry {
    sub_id: u64,
    peer: PeerId,
    send: MsgSend,
}

type TopicMap = HashMap<String, Vec<Entry>>;
type NetworkMap = HashMap<NetworkId, TopicMap>;
static STAT: OnceLock<Mutex<NetworkMap>> = OnceLock::new();

fn with_topics<R, F: FnOnce(&mut TopicMap) -> R>(
    network_id: &NetworkId,
    f: F,
) -> R {
    let mut lock = STAT.get_or_init(Default::default).lock().unwrap();
    let topics = lock.entry(network_id.clone()).or_default();
    f(topics)
}
