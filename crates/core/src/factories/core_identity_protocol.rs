//! The identity protocol bulk-fetches a remote peer's identity set for one
//! subject over direct streams.
//!
//! It is a two-message exchange. The requester sends an
//! [IdentityRequest] on a fresh stream tagged [IDENTITY_REQUEST_PROTOCOL],
//! the responder reads it to the end, looks up its local [IdentityIndex]
//! and answers with an [IdentityResponse] on a new stream tagged
//! [IDENTITY_RESPONSE_PROTOCOL]. The direction of a message is told apart
//! by the protocol it arrives on.
//!
//! ### Pending requests
//!
//! - Every submitted request gets a fresh uuid as correlation id.
//! - A pending entry holding the target peer, the subject, a deadline and
//!   the caller's response channel is recorded under that id *before*
//!   the request is sent, and removed again if the send fails.
//! - A response consumes the pending entry with its correlation id. A
//!   response for an unknown id (never sent, already answered or already
//!   timed out) is logged and dropped, so replays are never re-delivered.
//! - A response that arrives from, or claims to come from, a peer other
//!   than the one the request went to does not consume the entry.
//!
//! ### Timeouts
//!
//! A sweep task runs every `sweepIntervalMs`. Pending entries whose
//! deadline (`requestTimeoutMs` after submission) has passed are removed
//! and [PullOutcome::TimedOut] is delivered on their channel, so every
//! caller is unblocked exactly once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use zkvote_api::*;

mod message_handler;
use message_handler::*;

mod timeout;

/// CoreIdentityProtocol configuration types.
mod config {
    /// Configuration parameters for [CoreIdentityProtocol](super::CoreIdentityProtocol).
    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    pub struct CoreIdentityProtocolConfig {
        /// How long to wait for the response to a pull request.
        ///
        /// Default: 30s.
        pub request_timeout_ms: u32,

        /// How often pending requests are checked against their deadline.
        ///
        /// Default: 1s.
        pub sweep_interval_ms: u32,
    }

    impl Default for CoreIdentityProtocolConfig {
        fn default() -> Self {
            Self {
                request_timeout_ms: 30_000,
                sweep_interval_ms: 1_000,
            }
        }
    }

    impl CoreIdentityProtocolConfig {
        /// The request timeout as a [std::time::Duration].
        pub fn request_timeout(&self) -> std::time::Duration {
            std::time::Duration::from_millis(self.request_timeout_ms as u64)
        }

        /// The sweep interval as a [std::time::Duration].
        pub fn sweep_interval(&self) -> std::time::Duration {
            std::time::Duration::from_millis(self.sweep_interval_ms as u64)
        }
    }

    /// Module-level configuration for CoreIdentityProtocol.
    #[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    pub struct CoreIdentityProtocolModConfig {
        /// CoreIdentityProtocol configuration.
        pub core_identity_protocol: CoreIdentityProtocolConfig,
    }
}

pub use config::*;

/// An outstanding pull request.
#[derive(Debug)]
struct Pending {
    peer: PeerId,
    subject: SubjectHash,
    deadline: tokio::time::Instant,
    response_tx: PullResponseSender,
}

impl Pending {
    fn into_response(
        self,
        request_id: String,
        outcome: PullOutcome,
    ) -> (PullResponseSender, PullResponse) {
        (
            self.response_tx,
            PullResponse {
                request_id,
                peer: self.peer,
                subject: self.subject,
                outcome,
            },
        )
    }
}

type PendingMap = HashMap<String, Pending>;

#[derive(Debug)]
struct Inner {
    config: CoreIdentityProtocolConfig,
    transport: DynTransport,
    index: DynIdentityIndex,
    pending: Mutex<PendingMap>,
}

/// Both roles of the identity protocol for one local peer.
#[derive(Debug)]
pub struct CoreIdentityProtocol {
    inner: Arc<Inner>,
    sweep_task: tokio::task::AbortHandle,
}

impl Drop for CoreIdentityProtocol {
    fn drop(&mut self) {
        tracing::info!("CoreIdentityProtocol dropped, aborting sweep task");
        self.sweep_task.abort();
    }
}

impl CoreIdentityProtocol {
    /// Add the default module config.
    pub fn default_config(config: &mut Config) -> ZkvResult<()> {
        config.set_module_config(&CoreIdentityProtocolModConfig::default())
    }

    /// Register the request and response stream handlers on `transport`
    /// and start the sweep task. Must be called within a tokio runtime.
    pub fn create(
        config: CoreIdentityProtocolConfig,
        transport: DynTransport,
        index: DynIdentityIndex,
    ) -> Arc<Self> {
        let inner = Arc::new(Inner {
            config,
            transport: transport.clone(),
            index,
            pending: Mutex::new(HashMap::new()),
        });

        // handlers only hold weak refs, the transport must not keep
        // the protocol alive
        transport.set_stream_handler(
            IDENTITY_REQUEST_PROTOCOL,
            Arc::new(RequestHandler(Arc::downgrade(&inner))),
        );
        transport.set_stream_handler(
            IDENTITY_RESPONSE_PROTOCOL,
            Arc::new(ResponseHandler(Arc::downgrade(&inner))),
        );

        let sweep_task = timeout::spawn_sweep_task(
            Arc::downgrade(&inner),
            inner.config.sweep_interval(),
        );

        Arc::new(Self { inner, sweep_task })
    }

    /// The number of requests still waiting for a response.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().unwrap().len()
    }
}

impl PullRequester for CoreIdentityProtocol {
    fn submit_request(
        &self,
        peer: PeerId,
        subject: SubjectHash,
        response_tx: PullResponseSender,
    ) -> BoxFut<'_, bool> {
        Box::pin(async move {
            let request_id = uuid::Uuid::new_v4().to_string();
            let request = IdentityRequest::create(
                &self.inner.transport.peer_id(),
                request_id.clone(),
                &subject,
            );

            self.inner.pending.lock().unwrap().insert(
                request_id.clone(),
                Pending {
                    peer: peer.clone(),
                    subject: subject.clone(),
                    deadline: tokio::time::Instant::now()
                        + self.inner.config.request_timeout(),
                    response_tx,
                },
            );

            if let Err(err) = self
                .inner
                .transport
                .send(
                    peer.clone(),
                    IDENTITY_REQUEST_PROTOCOL,
                    request.encode_to_bytes(),
                )
                .await
            {
                self.inner.pending.lock().unwrap().remove(&request_id);
                tracing::warn!(?err, %peer, %request_id, "failed to send identity request");
                return false;
            }

            tracing::debug!(%peer, %subject, %request_id, "identity request sent");

            true
        })
    }
}
