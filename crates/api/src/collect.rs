//! Zkvote collection types.

use crate::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Read access to the subjects a node has active gossip subscriptions for.
pub trait SubjectView: 'static + Send + Sync + std::fmt::Debug {
    /// The subscribed subjects, sorted by hash. The subject title is
    /// its label.
    fn active_subjects(&self) -> Vec<(SubjectHash, Subject)>;

    /// Whether at least one subject is subscribed.
    fn has_subscriptions(&self) -> bool {
        !self.active_subjects().is_empty()
    }
}

/// Trait-object [SubjectView].
pub type DynSubjectView = Arc<dyn SubjectView>;

/// The identities known for one subject after a collection round.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectReport {
    /// The subject, its title being the label.
    pub subject: Subject,

    /// Merged identity set.
    pub identities: BTreeSet<HashHex>,
}

/// A pull that did not produce an identity set.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerFailure {
    /// The peer the pull targeted.
    pub peer: PeerId,

    /// The subject that was requested.
    pub subject: HashHex,

    /// Why the pull failed.
    pub reason: String,
}

/// The result of one collection round.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectReport {
    /// Merged identity sets, by subject hash.
    pub subjects: BTreeMap<HashHex, SubjectReport>,

    /// Pulls that failed.
    pub failures: Vec<PeerFailure>,
}
