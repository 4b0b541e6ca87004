//! Zkvote identity protocol wire types.
//!
//! A request and its response each travel on a fresh stream, one message
//! per stream. The two directions use distinct protocol names.

use crate::*;
use prost::Message;

include!("../proto/gen/zkvote.identity.rs");

/// Stream protocol name for identity requests.
// pattern: /protocol-name/request-or-response-message/version
pub const IDENTITY_REQUEST_PROTOCOL: &str = "/identity/req/0.0.1";

/// Stream protocol name for identity responses.
pub const IDENTITY_RESPONSE_PROTOCOL: &str = "/identity/res/0.0.1";

impl Metadata {
    /// Construct message metadata.
    pub fn new(
        id: impl Into<String>,
        sender: &PeerId,
        is_response: bool,
    ) -> Self {
        Self {
            id: id.into(),
            sender: sender.to_string(),
            is_response,
        }
    }
}

fn decode_meta(
    metadata: Option<&Metadata>,
    is_response: bool,
) -> ZkvResult<&Metadata> {
    let meta = metadata
        .ok_or_else(|| ZkvError::decode("message has no metadata"))?;
    if meta.id.is_empty() {
        return Err(ZkvError::decode("message has an empty correlation id"));
    }
    if meta.is_response != is_response {
        return Err(ZkvError::decode(format!(
            "expected is_response={is_response}, got {}",
            meta.is_response
        )));
    }
    Ok(meta)
}

impl IdentityRequest {
    /// Construct a request for the identity set of `subject`.
    pub fn create(sender: &PeerId, id: String, subject: &SubjectHash) -> Self {
        Self {
            metadata: Some(Metadata::new(id, sender, false)),
            message: format!("Identity request from {sender}"),
            subject_hash: subject.0.to_vec().into(),
        }
    }

    /// Decode and validate a request body.
    pub fn decode_checked(data: bytes::Bytes) -> ZkvResult<Self> {
        let out = Self::decode(data).map_err(|err| {
            ZkvError::decode_src("could not decode identity request", err)
        })?;
        decode_meta(out.metadata.as_ref(), false)?;
        out.subject()?;
        Ok(out)
    }

    /// Encode this request as a stream body.
    pub fn encode_to_bytes(&self) -> bytes::Bytes {
        self.encode_to_vec().into()
    }

    /// The correlation id.
    pub fn request_id(&self) -> &str {
        self.metadata.as_ref().map(|m| m.id.as_str()).unwrap_or("")
    }

    /// The requested subject.
    pub fn subject(&self) -> ZkvResult<SubjectHash> {
        SubjectHash::try_from(self.subject_hash.clone())
    }
}

impl IdentityResponse {
    /// Construct the response to the request with correlation id `id`.
    pub fn create(
        sender: &PeerId,
        id: String,
        subject: &SubjectHash,
        identities: impl IntoIterator<Item = HashHex>,
    ) -> Self {
        Self {
            metadata: Some(Metadata::new(id, sender, true)),
            message: format!("Identity response from {sender}"),
            subject_hash: subject.0.to_vec().into(),
            identity_set: identities
                .into_iter()
                .map(|h| h.to_string())
                .collect(),
        }
    }

    /// Decode and validate a response body.
    pub fn decode_checked(data: bytes::Bytes) -> ZkvResult<Self> {
        let out = Self::decode(data).map_err(|err| {
            ZkvError::decode_src("could not decode identity response", err)
        })?;
        decode_meta(out.metadata.as_ref(), true)?;
        out.subject()?;
        Ok(out)
    }

    /// Encode this response as a stream body.
    pub fn encode_to_bytes(&self) -> bytes::Bytes {
        self.encode_to_vec().into()
    }

    /// The echoed correlation id.
    pub fn request_id(&self) -> &str {
        self.metadata.as_ref().map(|m| m.id.as_str()).unwrap_or("")
    }

    /// The peer id the response claims to come from.
    pub fn sender(&self) -> PeerId {
        PeerId::from(
            self.metadata
                .as_ref()
                .map(|m| m.sender.as_str())
                .unwrap_or(""),
        )
    }

    /// The subject the identity set belongs to.
    pub fn subject(&self) -> ZkvResult<SubjectHash> {
        SubjectHash::try_from(self.subject_hash.clone())
    }

    /// The identity set, with every entry checked to be a digest.
    pub fn identities(&self) -> ZkvResult<Vec<HashHex>> {
        self.identity_set.iter().map(|s| HashHex::parse(s)).collect()
    }
}
