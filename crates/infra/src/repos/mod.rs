mod appointment;
mod recipient;
mod reminder_log;

pub use appointment::{IAppointmentRepo, InMemoryAppointmentRepo, PostgresAppointmentRepo};
pub use recipient::{IRecipientRepo, InMemoryRecipientRepo, PostgresRecipientRepo};
pub use reminder_log::{IReminderLogRepo, InMemoryReminderLogRepo, PostgresReminderLogRepo};

use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct Repos {
    pub appointments: Arc<dyn IAppointmentRepo>,
    pub recipients: Arc<dyn IRecipientRepo>,
    pub reminder_log: Arc<dyn IReminderLogRepo>,
}

impl Repos {
    pub async fn create_postgres(connection_string: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect(connection_string)
            .await?;

        Ok(Self {
            appointments: Arc::new(PostgresAppointmentRepo::new(pool.clone())),
            recipients: Arc::new(PostgresRecipientRepo::new(pool.clone())),
            reminder_log: Arc::new(PostgresReminderLogRepo::new(pool)),
        })
    }

    pub fn create_inmemory() -> Self {
        Self {
            appointments: Arc::new(InMemoryAppointmentRepo::new()),
            recipients: Arc::new(InMemoryRecipientRepo::new()),
            reminder_log: Arc::new(InMemoryReminderLogRepo::new()),
        }
    }
}
