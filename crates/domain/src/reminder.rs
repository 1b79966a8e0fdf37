use crate::shared::entity::ID;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// The three reminder categories.
///
/// Each kind is an independent dedup namespace: the same appointment can
/// produce up to three `ReminderRecord`s per recipient, one per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    DayBefore,
    DayOf,
    OneHour,
}

impl ReminderKind {
    pub const ALL: [ReminderKind; 3] = [Self::DayBefore, Self::DayOf, Self::OneHour];

    /// Stable string form used in the ledger, API paths and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DayBefore => "day_before",
            Self::DayOf => "day_of",
            Self::OneHour => "one_hour",
        }
    }
}

impl Display for ReminderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum InvalidReminderKindError {
    #[error("Reminder kind: {0} is not one of day_before, day_of or one_hour")]
    Unknown(String),
}

impl FromStr for ReminderKind {
    type Err = InvalidReminderKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day_before" => Ok(Self::DayBefore),
            "day_of" => Ok(Self::DayOf),
            "one_hour" => Ok(Self::OneHour),
            _ => Err(InvalidReminderKindError::Unknown(s.to_string())),
        }
    }
}

/// Terminal outcome of one delivery attempt chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

impl Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid delivery status: {}", s)),
        }
    }
}

/// One row in the dispatch ledger, written once per attempted send.
///
/// The composite identity `(appointment_id, kind, recipient_id)` is unique in
/// storage; a second write for the same triple is a no-op. That constraint is
/// what makes redelivery idempotent under overlapping trigger firings.
/// Records are never updated or deleted by this service.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderRecord {
    pub appointment_id: ID,
    pub kind: ReminderKind,
    pub recipient_id: ID,
    /// The phone number the send was addressed to.
    pub phone: String,
    pub status: DeliveryStatus,
    /// Transport message id, when the transport accepted the send.
    pub message_sid: Option<String>,
    pub error: Option<String>,
    /// The instant the reminder was logically for, i.e. the appointment time.
    pub remind_at: DateTime<Utc>,
    /// The instant the attempt actually ran.
    pub sent_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_string_form() {
        for kind in ReminderKind::ALL {
            assert_eq!(kind.as_str().parse::<ReminderKind>().unwrap(), kind);
        }
        assert!("tomorrow".parse::<ReminderKind>().is_err());
    }
}
