//! Identity commitment types.

use crate::*;

/// An opaque commitment value representing a registered voter.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Identity {
    commitment: String,
}

impl Identity {
    /// Construct a new identity from its commitment.
    pub fn new(commitment: impl Into<String>) -> Self {
        Self {
            commitment: commitment.into(),
        }
    }

    /// The commitment this identity was created from.
    pub fn commitment(&self) -> &str {
        &self.commitment
    }

    /// The content address of this identity.
    pub fn hash(&self) -> IdentityHash {
        IdentityHash(id::hash(self.commitment.as_bytes()))
    }
}
