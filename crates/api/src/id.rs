//! Types dealing with data identity or hashing.

use crate::*;
use std::sync::Arc;

macro_rules! imp_deref {
    ($i:ty, $t:ty) => {
        impl std::ops::Deref for $i {
            type Target = $t;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
    };
}

macro_rules! imp_from {
    ($a:ty, $b:ty, $i:ident => $e:expr) => {
        impl From<$b> for $a {
            fn from($i: $b) -> Self {
                $e
            }
        }
    };
}

macro_rules! imp_hex_display {
    ($i:ty) => {
        impl std::fmt::Display for $i {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&hex::encode(&self.0 .0))
            }
        }

        impl std::fmt::Debug for $i {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&hex::encode(&self.0 .0))
            }
        }
    };
}

/// Byte length of every [Digest].
pub const DIGEST_LEN: usize = 32;

/// Hash arbitrary bytes into a [Digest] (SHA-256).
pub fn hash(data: &[u8]) -> Digest {
    use sha2::Digest as _;
    let out = sha2::Sha256::digest(data);
    Digest(bytes::Bytes::copy_from_slice(&out))
}

/// Fixed length content address.
///
/// Only constructed through [hash] or the checked decoders, so the inner
/// bytes are always [DIGEST_LEN] long.
#[derive(
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct Digest(#[serde(with = "crate::serde_bytes_hex")] bytes::Bytes);

imp_deref!(Digest, bytes::Bytes);

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl std::fmt::Debug for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl TryFrom<bytes::Bytes> for Digest {
    type Error = ZkvError;

    fn try_from(b: bytes::Bytes) -> ZkvResult<Self> {
        if b.len() != DIGEST_LEN {
            return Err(ZkvError::decode(format!(
                "digest must be {DIGEST_LEN} bytes, got {}",
                b.len()
            )));
        }
        Ok(Self(b))
    }
}

impl Digest {
    /// Decode a digest from its hex form.
    pub fn from_hex(s: &str) -> ZkvResult<Self> {
        let b = hex::decode(s).map_err(|err| {
            ZkvError::decode_src(format!("invalid digest hex {s:?}"), err)
        })?;
        Self::try_from(bytes::Bytes::from(b))
    }

    /// The canonical hex form of this digest.
    pub fn hex(&self) -> HashHex {
        HashHex(hex::encode(&self.0).into_boxed_str().into())
    }
}

/// Canonical lowercase hex string of a [Digest], used as a map key.
#[derive(
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct HashHex(pub Arc<str>);

imp_deref!(HashHex, str);

impl std::fmt::Display for HashHex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Debug for HashHex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl HashHex {
    /// Parse and normalize a hex string, checking it names a full digest.
    pub fn parse(s: &str) -> ZkvResult<Self> {
        Ok(Digest::from_hex(s)?.hex())
    }

    /// Decode back into the raw digest.
    pub fn to_digest(&self) -> ZkvResult<Digest> {
        Digest::from_hex(&self.0)
    }
}

/// Identifies a voting subject. Derived from the subject title.
#[derive(
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct SubjectHash(pub Digest);

imp_deref!(SubjectHash, Digest);
imp_from!(SubjectHash, Digest, d => SubjectHash(d));
imp_hex_display!(SubjectHash);

impl SubjectHash {
    /// Decode a subject hash from its hex form.
    pub fn from_hex(s: &str) -> ZkvResult<Self> {
        Digest::from_hex(s).map(Self)
    }
}

impl TryFrom<bytes::Bytes> for SubjectHash {
    type Error = ZkvError;

    fn try_from(b: bytes::Bytes) -> ZkvResult<Self> {
        Digest::try_from(b).map(Self)
    }
}

/// Identifies a registered identity commitment.
#[derive(
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct IdentityHash(pub Digest);

imp_deref!(IdentityHash, Digest);
imp_from!(IdentityHash, Digest, d => IdentityHash(d));
imp_hex_display!(IdentityHash);

impl IdentityHash {
    /// Decode an identity hash from its hex form.
    pub fn from_hex(s: &str) -> ZkvResult<Self> {
        Digest::from_hex(s).map(Self)
    }
}

impl TryFrom<bytes::Bytes> for IdentityHash {
    type Error = ZkvError;

    fn try_from(b: bytes::Bytes) -> ZkvResult<Self> {
        Digest::try_from(b).map(Self)
    }
}

/// Identifies a peer on the network.
#[derive(
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct PeerId(pub Arc<str>);

imp_deref!(PeerId, str);
imp_from!(PeerId, &str, s => PeerId(s.into()));
imp_from!(PeerId, String, s => PeerId(s.into_boxed_str().into()));

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Debug for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A network address at which a peer can be reached.
#[derive(
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct PeerAddr(pub Arc<str>);

imp_deref!(PeerAddr, str);
imp_from!(PeerAddr, &str, s => PeerAddr(s.into()));
imp_from!(PeerAddr, String, s => PeerAddr(s.into_boxed_str().into()));

impl std::fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Debug for PeerAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
