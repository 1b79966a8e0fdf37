use super::{ISmsGateway, SmsError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use varsel_domain::DeliveryStatus;

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
// Pause between successive recipients of one batch, keeping the transport
// within its rate limits. Independent of the retry backoff.
const RECIPIENT_DELAY: Duration = Duration::from_millis(500);

/// Terminal result of one delivery attempt chain.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    Sent { sid: String },
    Failed { error: String },
}

impl DeliveryOutcome {
    pub fn status(&self) -> DeliveryStatus {
        match self {
            Self::Sent { .. } => DeliveryStatus::Sent,
            Self::Failed { .. } => DeliveryStatus::Failed,
        }
    }

    pub fn message_sid(&self) -> Option<String> {
        match self {
            Self::Sent { sid } => Some(sid.clone()),
            Self::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<String> {
        match self {
            Self::Sent { .. } => None,
            Self::Failed { error } => Some(error.clone()),
        }
    }
}

/// Sends one composed message to one phone number through the gateway,
/// retrying transient failures with exponential backoff and giving up
/// immediately on permanent ones.
pub struct DeliveryService {
    gateway: Arc<dyn ISmsGateway>,
}

impl DeliveryService {
    pub fn new(gateway: Arc<dyn ISmsGateway>) -> Self {
        Self { gateway }
    }

    pub fn is_ready(&self) -> bool {
        self.gateway.is_ready()
    }

    pub async fn deliver(&self, phone: &str, body: &str) -> DeliveryOutcome {
        let to = normalize_phone(phone);
        let mut backoff = INITIAL_BACKOFF;

        for attempt in 1..=MAX_ATTEMPTS {
            match self.gateway.send(&to, body).await {
                Ok(receipt) => {
                    debug!(%to, sid = %receipt.sid, "SMS accepted by the transport");
                    return DeliveryOutcome::Sent { sid: receipt.sid };
                }
                Err(e) if e.is_permanent() => {
                    warn!(%to, error = %e, "SMS failed permanently");
                    return DeliveryOutcome::Failed {
                        error: e.to_string(),
                    };
                }
                Err(e) if attempt == MAX_ATTEMPTS => {
                    warn!(%to, error = %e, attempt, "SMS failed, retries exhausted");
                    return DeliveryOutcome::Failed {
                        error: e.to_string(),
                    };
                }
                Err(e) => {
                    warn!(%to, error = %e, attempt, "SMS failed, will retry");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
        unreachable!("the attempt loop always returns")
    }

    /// Awaited by callers between successive recipients of a batch.
    pub async fn throttle(&self) {
        tokio::time::sleep(RECIPIENT_DELAY).await;
    }
}

/// Normalizes a phone number to E.164. Numbers without a country prefix are
/// assumed to be Norwegian (8-digit national numbers).
pub fn normalize_phone(raw: &str) -> String {
    let has_plus = raw.trim_start().starts_with('+');
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if has_plus {
        format!("+{}", digits)
    } else if let Some(rest) = digits.strip_prefix("00") {
        format!("+{}", rest)
    } else if digits.len() == 10 && digits.starts_with("47") {
        format!("+{}", digits)
    } else {
        format!("+47{}", digits)
    }
}
