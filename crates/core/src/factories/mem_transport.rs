//! The in-memory stub transport.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, Weak};
use zkvote_api::*;

/// The in-memory stub transport factory.
/// This is NOT a production module. It is for testing only.
/// It will only reach peers created within the same process.
#[derive(Debug)]
pub struct MemTransportFactory {}

impl MemTransportFactory {
    /// Construct a new MemTransportFactory.
    pub fn create() -> DynTransportFactory {
        let out: DynTransportFactory = Arc::new(MemTransportFactory {});
        out
    }
}

impl TransportFactory for MemTransportFactory {
    fn default_config(&self, _config: &mut Config) -> ZkvResult<()> {
        Ok(())
    }

    fn create(
        &self,
        _builder: Arc<Builder>,
    ) -> BoxFut<'static, ZkvResult<DynTransport>> {
        Box::pin(async move {
            let out: DynTransport = Arc::new(MemTransport::new());
            Ok(out)
        })
    }
}

struct Inner {
    peer_id: PeerId,
    addr: PeerAddr,
    handlers: Mutex<HashMap<String, DynStreamHandler>>,
    task_list: Mutex<tokio::task::JoinSet<()>>,
}

impl Inner {
    /// Dispatch an inbound stream to the handler for its protocol.
    fn accept(&self, stream: MemInboundStream) -> ZkvResult<()> {
        let handler = match self.handlers.lock().unwrap().get(&stream.protocol)
        {
            Some(handler) => handler.clone(),
            None => {
                return Err(ZkvError::transport(format!(
                    "peer {} has no handler for protocol {}",
                    self.peer_id, stream.protocol
                )))
            }
        };

        let mut task_list = self.task_list.lock().unwrap();

        // reap finished stream tasks so the set does not grow unbounded
        while task_list.try_join_next().is_some() {}

        task_list.spawn(async move {
            handler.handle_stream(Box::new(stream)).await;
        });

        Ok(())
    }
}

struct MemTransport(Arc<Inner>);

impl std::fmt::Debug for MemTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemTransport")
            .field("peer_id", &self.0.peer_id)
            .finish()
    }
}

impl Drop for MemTransport {
    fn drop(&mut self) {
        get_stat().remove(&self.0.peer_id);
        self.0.task_list.lock().unwrap().abort_all();
    }
}

impl MemTransport {
    fn new() -> Self {
        use std::sync::atomic::*;
        static ID: AtomicU64 = AtomicU64::new(1);
        let id = ID.fetch_add(1, Ordering::Relaxed);

        let inner = Arc::new(Inner {
            peer_id: PeerId::from(format!("mem-peer-{id}")),
            addr: PeerAddr::from(format!("mem://stub.tx/{id}")),
            handlers: Mutex::new(HashMap::new()),
            task_list: Mutex::new(tokio::task::JoinSet::new()),
        });

        get_stat().register(&inner);

        tracing::debug!(peer_id = %inner.peer_id, "mem transport listening");

        Self(inner)
    }
}

impl Transport for MemTransport {
    fn peer_id(&self) -> PeerId {
        self.0.peer_id.clone()
    }

    fn listen_addrs(&self) -> Vec<PeerAddr> {
        vec![self.0.addr.clone()]
    }

    fn set_stream_handler(&self, protocol: &str, handler: DynStreamHandler) {
        self.0
            .handlers
            .lock()
            .unwrap()
            .insert(protocol.to_string(), handler);
    }

    fn send(
        &self,
        peer: PeerId,
        protocol: &str,
        data: bytes::Bytes,
    ) -> BoxFut<'_, ZkvResult<()>> {
        let protocol = protocol.to_string();
        Box::pin(async move {
            let target = get_stat().get(&peer).ok_or_else(|| {
                ZkvError::transport(format!("peer {peer} is not reachable"))
            })?;

            target.accept(MemInboundStream {
                remote_peer: self.0.peer_id.clone(),
                protocol,
                data: Some(data),
            })
        })
    }
}

/// A stream carrying one message body, readable once.
#[derive(Debug)]
struct MemInboundStream {
    remote_peer: PeerId,
    protocol: String,
    data: Option<bytes::Bytes>,
}

impl InboundStream for MemInboundStream {
    fn remote_peer(&self) -> PeerId {
        self.remote_peer.clone()
    }

    fn protocol(&self) -> &str {
        &self.protocol
    }

    fn read_to_end(&mut self) -> BoxFut<'_, ZkvResult<bytes::Bytes>> {
        let data = self.data.take();
        Box::pin(async move {
            data.ok_or_else(|| ZkvError::transport("stream already consumed"))
        })
    }

    fn close(self: Box<Self>) {}

    fn reset(self: Box<Self>) {
        tracing::trace!(remote_peer = %self.remote_peer, protocol = %self.protocol, "mem stream reset");
    }
}

/// Every live [MemTransport] in the process, by peer id.
/// Entries are removed when the transport is dropped.
struct Stat {
    peers: Mutex<HashMap<PeerId, Weak<Inner>>>,
}

impl Stat {
    fn new() -> Self {
        Self {
            peers: Mutex::new(HashMap::new()),
        }
    }

    fn register(&self, inner: &Arc<Inner>) {
        self.peers
            .lock()
            .unwrap()
            .insert(inner.peer_id.clone(), Arc::downgrade(inner));
    }

    fn remove(&self, peer_id: &PeerId) {
        self.peers.lock().unwrap().remove(peer_id);
    }

    fn get(&self, peer_id: &PeerId) -> Option<Arc<Inner>> {
        self.peers.lock().unwrap().get(peer_id).and_then(Weak::upgrade)
    }
}

static STAT: OnceLock<Stat> = OnceLock::new();
fn get_stat() -> &'static Stat {
    STAT.get_or_init(Stat::new)
}
