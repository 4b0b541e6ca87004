//! The in-memory identity index.
//!
//! All state lives in memory and is rebuilt from pulls and gossip after a
//! restart. One lock guards the whole index: inserts are short and
//! readers copy out what they need under the lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use zkvote_api::*;

/// The in-memory identity index factory.
#[derive(Debug)]
pub struct MemIdentityIndexFactory {}

impl MemIdentityIndexFactory {
    /// Construct a new MemIdentityIndexFactory.
    pub fn create() -> DynIdentityIndexFactory {
        let out: DynIdentityIndexFactory = Arc::new(Self {});
        out
    }
}

impl IdentityIndexFactory for MemIdentityIndexFactory {
    fn default_config(&self, _config: &mut Config) -> ZkvResult<()> {
        Ok(())
    }

    fn create(
        &self,
        _builder: Arc<Builder>,
    ) -> BoxFut<'static, ZkvResult<DynIdentityIndex>> {
        Box::pin(async move {
            let out: DynIdentityIndex = Arc::new(MemIdentityIndex::default());
            Ok(out)
        })
    }
}

/// Subject hash hex to the identities registered under it.
#[derive(Debug, Default)]
pub struct MemIdentityIndex(Mutex<HashMap<HashHex, IdentitySet>>);

impl IdentityIndex for MemIdentityIndex {
    fn insert(&self, subject: &SubjectHash, identity: &IdentityHash) -> bool {
        self.0
            .lock()
            .unwrap()
            .entry(subject.hex())
            .or_default()
            .insert(identity.hex())
    }

    fn contains(
        &self,
        subject: &SubjectHash,
        identity: &IdentityHash,
    ) -> bool {
        self.0
            .lock()
            .unwrap()
            .get(&subject.hex())
            .map(|set| set.contains(&identity.hex()))
            .unwrap_or(false)
    }

    fn get(&self, subject: &SubjectHash) -> IdentitySet {
        self.0
            .lock()
            .unwrap()
            .get(&subject.hex())
            .cloned()
            .unwrap_or_default()
    }

    fn all(&self, subject: &SubjectHash) -> Vec<IdentityHash> {
        self.get(subject)
            .into_iter()
            .filter_map(|h| match IdentityHash::from_hex(&h) {
                Ok(h) => Some(h),
                Err(err) => {
                    // only reachable if a non-digest key was inserted
                    tracing::warn!(%h, ?err, "dropping undecodable identity");
                    None
                }
            })
            .collect()
    }

    fn subjects(&self) -> Vec<SubjectHash> {
        self.0
            .lock()
            .unwrap()
            .keys()
            .filter_map(|h| SubjectHash::from_hex(h).ok())
            .collect()
    }
}

#[cfg(test)]
mod test;
