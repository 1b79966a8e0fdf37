use super::{ISmsGateway, SmsError, SmsReceipt};
use serde::Deserialize;
use std::time::Duration;

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

impl TwilioCredentials {
    /// Reads the credential triple from the environment. All three must be
    /// present for the transport to be configured.
    pub fn from_env() -> Option<Self> {
        let account_sid = std::env::var("TWILIO_ACCOUNT_SID").ok()?;
        let auth_token = std::env::var("TWILIO_AUTH_TOKEN").ok()?;
        let from_number = std::env::var("TWILIO_FROM_NUMBER").ok()?;
        Some(Self {
            account_sid,
            auth_token,
            from_number,
        })
    }
}

/// SMS gateway talking to the Twilio Messages REST API.
///
/// Constructible without credentials: every send then fails with
/// `SmsError::NotConfigured` without touching the network.
pub struct TwilioSmsGateway {
    credentials: Option<TwilioCredentials>,
    client: reqwest::Client,
}

impl TwilioSmsGateway {
    pub fn new(credentials: Option<TwilioCredentials>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("To build the reqwest client");
        Self {
            credentials,
            client,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageCreatedResponse {
    sid: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    code: i64,
    message: String,
}

#[async_trait::async_trait]
impl ISmsGateway for TwilioSmsGateway {
    async fn send(&self, to: &str, body: &str) -> Result<SmsReceipt, SmsError> {
        let credentials = self.credentials.as_ref().ok_or(SmsError::NotConfigured)?;

        let url = format!(
            "{}/Accounts/{}/Messages.json",
            TWILIO_API_BASE, credentials.account_sid
        );
        let params = [
            ("To", to),
            ("From", credentials.from_number.as_str()),
            ("Body", body),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(&credentials.account_sid, Some(&credentials.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| SmsError::Transport(e.to_string()))?;

        if response.status().is_success() {
            let message: MessageCreatedResponse = response
                .json()
                .await
                .map_err(|e| SmsError::Transport(e.to_string()))?;
            Ok(SmsReceipt {
                sid: message.sid,
                status: message.status,
            })
        } else {
            let status = response.status();
            match response.json::<ApiErrorResponse>().await {
                Ok(api_error) => Err(SmsError::Rejected {
                    code: api_error.code,
                    message: api_error.message,
                }),
                Err(_) => Err(SmsError::Transport(format!(
                    "Unexpected response status: {}",
                    status
                ))),
            }
        }
    }

    fn is_ready(&self) -> bool {
        self.credentials.is_some()
    }
}
