use super::IReminderLogRepo;
use sqlx::{FromRow, PgPool};
use varsel_domain::{ReminderKind, ReminderRecord, ID};

pub struct PostgresReminderLogRepo {
    pool: PgPool,
}

impl PostgresReminderLogRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ExistsRaw {
    found: bool,
}

#[async_trait::async_trait]
impl IReminderLogRepo for PostgresReminderLogRepo {
    async fn was_sent(
        &self,
        appointment_id: &ID,
        kind: ReminderKind,
        recipient_id: &ID,
    ) -> anyhow::Result<bool> {
        let row: ExistsRaw = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM reminder_log AS l
                WHERE l.appointment_uid = $1 AND l.kind = $2 AND l.recipient_uid = $3
            ) AS found
            "#,
        )
        .bind(appointment_id.inner_ref())
        .bind(kind.as_str())
        .bind(recipient_id.inner_ref())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.found)
    }

    async fn record_attempt(&self, record: &ReminderRecord) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reminder_log
            (appointment_uid, kind, recipient_uid, phone, status, message_sid, error, remind_at, sent_at)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (appointment_uid, kind, recipient_uid) DO NOTHING
            "#,
        )
        .bind(record.appointment_id.inner_ref())
        .bind(record.kind.as_str())
        .bind(record.recipient_id.inner_ref())
        .bind(&record.phone)
        .bind(record.status.as_str())
        .bind(&record.message_sid)
        .bind(&record.error)
        .bind(record.remind_at)
        .bind(record.sent_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
