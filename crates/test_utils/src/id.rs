//! Test utilities associated with ids.

use zkvote_api::{Identity, IdentityHash, Subject, SubjectHash};

use crate::random_bytes;

/// Create a random identity commitment string.
pub fn random_commitment() -> String {
    hex::encode(random_bytes(32))
}

/// Create a random identity.
pub fn random_identity() -> Identity {
    Identity::new(random_commitment())
}

/// Create the hash of a random identity.
pub fn random_identity_hash() -> IdentityHash {
    random_identity().hash()
}

/// Create a subject with a random title.
pub fn random_subject() -> Subject {
    Subject::new(
        format!("subject-{}", hex::encode(random_bytes(8))),
        "a randomly generated test subject",
    )
}

/// Create the hash of a random subject.
pub fn random_subject_hash() -> SubjectHash {
    random_subject().hash()
}
