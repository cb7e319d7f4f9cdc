use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user who granted this requester access to one of their protected
/// datasets. Derived from dataset order books per call, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Address of the protected dataset. Uniqueness key: when the same
    /// dataset is granted twice, the grant with the latest timestamp wins.
    pub address: Address,
    pub owner: Address,
    pub access_grant_timestamp: DateTime<Utc>,
}

/// Subgraph entry confirming a dataset address is a registered protected
/// resource with the expected schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedDataRecord {
    pub id: Address,
}
