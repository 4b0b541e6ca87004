//! JSON contract of the subject query endpoint.
//!
//! The HTTP layer serving these is not part of zkvote, these types are the
//! boundary it consumes.

use crate::*;
use std::collections::BTreeMap;

/// Successful answer to a subject query.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct QuerySubjectsResponse {
    /// Subject hash hex to the subject's string fields, plus
    /// `identityCount` and the comma separated `identities`.
    pub results: BTreeMap<String, BTreeMap<String, String>>,
}

impl From<&CollectReport> for QuerySubjectsResponse {
    fn from(report: &CollectReport) -> Self {
        let results = report
            .subjects
            .iter()
            .map(|(hash, s)| {
                let mut fields = s.subject.to_json_map();
                fields.insert(
                    "identityCount".to_string(),
                    s.identities.len().to_string(),
                );
                fields.insert(
                    "identities".to_string(),
                    s.identities
                        .iter()
                        .map(|h| h.to_string())
                        .collect::<Vec<_>>()
                        .join(","),
                );
                (hash.to_string(), fields)
            })
            .collect();
        Self { results }
    }
}

/// Generic error envelope. There are no structured error codes yet,
/// `code` is always 1.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct GenericError {
    /// Error code.
    pub code: i32,

    /// Human readable error.
    pub message: String,
}

impl From<&ZkvError> for GenericError {
    fn from(err: &ZkvError) -> Self {
        Self {
            code: 1,
            message: err.to_string(),
        }
    }
}
