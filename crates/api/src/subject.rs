//! Voting subject types.

use crate::*;
use std::collections::BTreeMap;

/// A voting topic proposed by some peer.
///
/// Two subjects are the same subject iff their [SubjectHash]es match,
/// the hash being taken over the title only.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    /// Human readable label, also the hashed content.
    pub title: String,

    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

impl Subject {
    /// Construct a new subject.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    /// The content address of this subject.
    pub fn hash(&self) -> SubjectHash {
        SubjectHash(id::hash(self.title.as_bytes()))
    }

    /// The string fields exposed through the subject query boundary.
    pub fn to_json_map(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        out.insert("title".to_string(), self.title.clone());
        out.insert("description".to_string(), self.description.clone());
        out
    }
}

/// Name of the gossip topic carrying identity announcements for a subject.
pub fn identity_topic(subject: &HashHex) -> String {
    format!("identity/{subject}")
}

/// Name of the gossip topic carrying votes for a subject.
pub fn vote_topic(subject: &HashHex) -> String {
    format!("vote/{subject}")
}
