use super::IRecipientRepo;
use sqlx::{types::Uuid, FromRow, PgPool};
use varsel_domain::Recipient;

pub struct PostgresRecipientRepo {
    pool: PgPool,
}

impl PostgresRecipientRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RecipientRaw {
    recipient_uid: Uuid,
    phone: String,
    opt_in: bool,
}

impl Into<Recipient> for RecipientRaw {
    fn into(self) -> Recipient {
        Recipient {
            id: self.recipient_uid.into(),
            phone: self.phone,
            opt_in: self.opt_in,
        }
    }
}

#[async_trait::async_trait]
impl IRecipientRepo for PostgresRecipientRepo {
    async fn find_opted_in(&self) -> anyhow::Result<Vec<Recipient>> {
        let recipients: Vec<RecipientRaw> = sqlx::query_as(
            r#"
            SELECT * FROM recipients AS r
            WHERE r.opt_in = TRUE AND length(trim(r.phone)) > 0
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(recipients.into_iter().map(|r| r.into()).collect())
    }
}
