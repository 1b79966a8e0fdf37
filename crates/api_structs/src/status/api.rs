use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod get_service_health {
    use super::*;

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct KindStatsDTO {
        pub kind: String,
        pub last_run: Option<DateTime<Utc>>,
    }

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub message: String,
        pub sms_ready: bool,
        pub database_ready: bool,
        pub sent: u64,
        pub errors: u64,
        pub triggers: Vec<KindStatsDTO>,
    }
}
