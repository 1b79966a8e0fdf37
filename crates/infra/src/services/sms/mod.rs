mod delivery;
mod fake;
mod twilio;

pub use delivery::{DeliveryOutcome, DeliveryService};
pub use fake::FakeSmsGateway;
pub use twilio::{TwilioCredentials, TwilioSmsGateway};

use thiserror::Error;

/// Receipt returned by the transport when it accepts a message.
#[derive(Debug, Clone, PartialEq)]
pub struct SmsReceipt {
    /// Transport-side message id.
    pub sid: String,
    pub status: String,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SmsError {
    #[error("SMS transport is not configured")]
    NotConfigured,
    #[error("SMS send was rejected with code {code}: {message}")]
    Rejected { code: i64, message: String },
    #[error("SMS transport unreachable: {0}")]
    Transport(String),
}

// Twilio error codes meaning the destination number itself is invalid,
// blocked or unable to receive SMS. Everything else is worth retrying.
const PERMANENT_ERROR_CODES: [i64; 4] = [21211, 21408, 21610, 21614];

impl SmsError {
    /// Permanent failures are terminal for the current send: retrying
    /// cannot make the destination valid.
    pub fn is_permanent(&self) -> bool {
        match self {
            Self::NotConfigured => true,
            Self::Rejected { code, .. } => PERMANENT_ERROR_CODES.contains(code),
            Self::Transport(_) => false,
        }
    }
}

#[async_trait::async_trait]
pub trait ISmsGateway: Send + Sync {
    async fn send(&self, to: &str, body: &str) -> Result<SmsReceipt, SmsError>;

    /// Whether the transport has everything it needs to attempt a send.
    fn is_ready(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_destination_codes_are_permanent() {
        for code in PERMANENT_ERROR_CODES {
            let err = SmsError::Rejected {
                code,
                message: "rejected".into(),
            };
            assert!(err.is_permanent());
        }
    }

    #[test]
    fn other_rejections_and_transport_errors_are_transient() {
        let throttled = SmsError::Rejected {
            // 429-style queue overflow
            code: 20429,
            message: "Too many requests".into(),
        };
        assert!(!throttled.is_permanent());
        assert!(!SmsError::Transport("connection reset".into()).is_permanent());
    }

    #[test]
    fn missing_configuration_is_permanent() {
        assert!(SmsError::NotConfigured.is_permanent());
    }
}
