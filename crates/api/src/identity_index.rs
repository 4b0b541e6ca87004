//! Zkvote identity index types.

use crate::*;
use std::collections::HashSet;
use std::sync::Arc;

/// The set of identity hashes registered under one subject.
pub type IdentitySet = HashSet<HashHex>;

/// Maps each subject to the identities registered under it.
///
/// The index only ever grows: there is no way to remove an identity once
/// inserted. Because insertion is an idempotent set union, applying the
/// same inserts in any order, any number of times, gives the same index.
pub trait IdentityIndex: 'static + Send + Sync + std::fmt::Debug {
    /// Add an identity to a subject's set. Returns `true` if it was not
    /// already present.
    fn insert(&self, subject: &SubjectHash, identity: &IdentityHash) -> bool;

    /// Check whether an identity is registered under a subject.
    fn contains(&self, subject: &SubjectHash, identity: &IdentityHash)
        -> bool;

    /// Snapshot of the identities registered under a subject.
    fn get(&self, subject: &SubjectHash) -> IdentitySet;

    /// All identities registered under a subject, decoded back to digests.
    fn all(&self, subject: &SubjectHash) -> Vec<IdentityHash>;

    /// Every subject that has at least one identity.
    fn subjects(&self) -> Vec<SubjectHash>;
}

/// Trait-object [IdentityIndex].
pub type DynIdentityIndex = Arc<dyn IdentityIndex>;

/// A factory for creating IdentityIndex instances.
pub trait IdentityIndexFactory: 'static + Send + Sync + std::fmt::Debug {
    /// Help the builder construct a default config from the chosen
    /// module factories.
    fn default_config(&self, config: &mut Config) -> ZkvResult<()>;

    /// Construct an identity index instance.
    fn create(
        &self,
        builder: Arc<Builder>,
    ) -> BoxFut<'static, ZkvResult<DynIdentityIndex>>;
}

/// Trait-object [IdentityIndexFactory].
pub type DynIdentityIndexFactory = Arc<dyn IdentityIndexFactory>;
