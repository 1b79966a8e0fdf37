use crate::dtos::RecipientOutcomeDTO;
use serde::{Deserialize, Serialize};

pub mod trigger_reminders {
    use super::*;

    #[derive(Deserialize)]
    pub struct PathParams {
        pub kind: String,
    }

    /// Distinguishes "nothing to send" from "send attempted, see the
    /// per-recipient outcomes". An aborted firing is reported as an error
    /// response instead.
    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub kind: String,
        pub status: String,
        pub appointments: usize,
        pub outcomes: Vec<RecipientOutcomeDTO>,
    }
}
