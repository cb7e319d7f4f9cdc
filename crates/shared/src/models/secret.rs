use serde::{Deserialize, Serialize};

/// Wire shape of the requester secret shared between the sender SDK and the
/// confidential task. The sender fills the content-locator fields; the task
/// reads whichever fields its delivery mode uses. All fields are optional
/// on the wire so either side can evolve without breaking the other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequesterSecretPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_content_multi_addr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_content_encryption_key: Option<String>,
}

impl RequesterSecretPayload {
    /// Payload pushed by the sender: where the encrypted content lives and
    /// the key that opens it.
    pub fn content_locator(
        multiaddr: impl Into<String>,
        encryption_key: impl Into<String>,
    ) -> Self {
        Self {
            telegram_content_multi_addr: Some(multiaddr.into()),
            telegram_content_encryption_key: Some(encryption_key.into()),
            ..Self::default()
        }
    }
}
