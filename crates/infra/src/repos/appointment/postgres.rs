use super::IAppointmentRepo;
use chrono::{DateTime, Utc};
use sqlx::{types::Uuid, FromRow, PgPool};
use varsel_domain::{Appointment, TimeSpan};

pub struct PostgresAppointmentRepo {
    pool: PgPool,
}

impl PostgresAppointmentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AppointmentRaw {
    appointment_uid: Uuid,
    customer_name: String,
    customer_phone: String,
    scheduled_at: DateTime<Utc>,
    status: String,
    notes: String,
    interests: Vec<String>,
}

impl Into<Appointment> for AppointmentRaw {
    fn into(self) -> Appointment {
        Appointment {
            id: self.appointment_uid.into(),
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            scheduled_at: self.scheduled_at,
            // Rows written by other tools may carry states this service does
            // not know; treat them as the default state.
            status: self.status.parse().unwrap_or_default(),
            notes: self.notes,
            interests: self.interests,
        }
    }
}

#[async_trait::async_trait]
impl IAppointmentRepo for PostgresAppointmentRepo {
    async fn find_in_timespan(&self, span: &TimeSpan) -> anyhow::Result<Vec<Appointment>> {
        let appointments: Vec<AppointmentRaw> = sqlx::query_as(
            r#"
            SELECT * FROM appointments AS a
            WHERE a.scheduled_at >= $1 AND a.scheduled_at <= $2
            ORDER BY a.scheduled_at ASC
            "#,
        )
        .bind(span.start())
        .bind(span.end())
        .fetch_all(&self.pool)
        .await?;

        Ok(appointments.into_iter().map(|a| a.into()).collect())
    }
}
