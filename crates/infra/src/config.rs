use crate::services::TwilioCredentials;
use chrono::NaiveTime;
use chrono_tz::Tz;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the application to run on
    pub port: usize,
    /// The civil timezone all reminder windows and trigger times are
    /// expressed in. Appointments themselves are stored as absolute instants.
    pub timezone: Tz,
    /// Local wall-clock time at which the day-before trigger fires.
    pub day_before_trigger_time: NaiveTime,
    /// Local wall-clock time at which the day-of trigger fires.
    pub day_of_trigger_time: NaiveTime,
    /// How often the one-hour trigger polls for upcoming appointments.
    pub one_hour_poll_interval: Duration,
    /// Tolerance band around the one-hour mark, absorbing polling jitter.
    pub one_hour_tolerance_mins: i64,
    /// Deep link appended to every reminder message.
    pub appointments_url: String,
    /// SMS transport credentials. When absent the service still boots and
    /// reports the transport as not ready.
    pub twilio: Option<TwilioCredentials>,
}

impl Config {
    pub fn new() -> Self {
        let default_port = "5000";
        let port = std::env::var("PORT").unwrap_or(default_port.into());
        let port = match port.parse::<usize>() {
            Ok(port) => port,
            Err(_) => {
                warn!(
                    "The given PORT: {} is not valid, falling back to the default port: {}.",
                    port, default_port
                );
                default_port.parse::<usize>().unwrap()
            }
        };

        let default_timezone = "Europe/Oslo";
        let timezone = std::env::var("TIMEZONE").unwrap_or(default_timezone.into());
        let timezone = match timezone.parse::<Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                warn!(
                    "The given TIMEZONE: {} is not valid, falling back to the default: {}.",
                    timezone, default_timezone
                );
                default_timezone.parse().unwrap()
            }
        };

        let day_before_trigger_time =
            parse_trigger_time("DAY_BEFORE_TRIGGER_TIME", NaiveTime::from_hms_opt(16, 0, 0).unwrap());
        let day_of_trigger_time =
            parse_trigger_time("DAY_OF_TRIGGER_TIME", NaiveTime::from_hms_opt(7, 0, 0).unwrap());

        let one_hour_poll_interval = Duration::from_secs(parse_number(
            "ONE_HOUR_POLL_INTERVAL_SECS",
            5 * 60,
        ));
        let one_hour_tolerance_mins = parse_number("ONE_HOUR_TOLERANCE_MINS", 5) as i64;

        let appointments_url = std::env::var("APPOINTMENTS_URL")
            .unwrap_or_else(|_| "https://app.varsel.no/appointments".into());

        let twilio = TwilioCredentials::from_env();
        if twilio.is_none() {
            info!("Twilio credentials are not set. SMS delivery will be disabled.");
        }

        Self {
            port,
            timezone,
            day_before_trigger_time,
            day_of_trigger_time,
            one_hour_poll_interval,
            one_hour_tolerance_mins,
            appointments_url,
            twilio,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_trigger_time(var: &str, default: NaiveTime) -> NaiveTime {
    let raw = match std::env::var(var) {
        Ok(raw) => raw,
        Err(_) => return default,
    };
    match NaiveTime::parse_from_str(&raw, "%H:%M") {
        Ok(time) => time,
        Err(_) => {
            warn!(
                "The given {}: {} is not a valid HH:MM time, falling back to the default: {}.",
                var, raw, default
            );
            default
        }
    }
}

fn parse_number(var: &str, default: u64) -> u64 {
    let raw = match std::env::var(var) {
        Ok(raw) => raw,
        Err(_) => return default,
    };
    match raw.parse::<u64>() {
        Ok(value) => value,
        Err(_) => {
            warn!(
                "The given {}: {} is not a valid number, falling back to the default: {}.",
                var, raw, default
            );
            default
        }
    }
}
