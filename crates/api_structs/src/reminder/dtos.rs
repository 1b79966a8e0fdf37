use serde::{Deserialize, Serialize};
use varsel_domain::ID;

/// Per-recipient result of one trigger firing.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RecipientOutcomeDTO {
    pub recipient_id: ID,
    pub phone: String,
    /// "skipped", "sent" or "failed"
    pub outcome: String,
    pub message_sid: Option<String>,
    pub error: Option<String>,
}
