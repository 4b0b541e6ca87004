//! Zkvote identity pull types.
//!
//! A pull bulk-fetches a remote peer's identity set for one subject. It is
//! used when joining, so that a node does not have to wait for gossip to
//! replay history it missed.

use crate::*;
use std::sync::Arc;

/// How a pull request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    /// The remote peer answered with its full identity set.
    Identities(Vec<HashHex>),

    /// No answer arrived before the request deadline.
    TimedOut,
}

/// Delivered on the caller's channel once a pull request completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullResponse {
    /// The correlation id of the request.
    pub request_id: String,

    /// The peer the request was sent to.
    pub peer: PeerId,

    /// The requested subject.
    pub subject: SubjectHash,

    /// The result.
    pub outcome: PullOutcome,
}

/// Where a [PullResponse] is delivered.
pub type PullResponseSender = tokio::sync::mpsc::Sender<PullResponse>;

/// The requesting side of the identity pull exchange.
pub trait PullRequester: 'static + Send + Sync + std::fmt::Debug {
    /// Send a request for the identity set of `subject` to `peer`.
    ///
    /// The return value only reports whether the request could be sent.
    /// The outcome is delivered later on `response_tx`, exactly once:
    /// either the remote identity set or a timeout.
    fn submit_request(
        &self,
        peer: PeerId,
        subject: SubjectHash,
        response_tx: PullResponseSender,
    ) -> BoxFut<'_, bool>;
}

/// Trait-object [PullRequester].
pub type DynPullRequester = Arc<dyn PullRequester>;
