mod inmemory;
mod postgres;

pub use inmemory::InMemoryReminderLogRepo;
pub use postgres::PostgresReminderLogRepo;
use varsel_domain::{ReminderKind, ReminderRecord, ID};

/// The dispatch ledger. The unique composite key
/// `(appointment, kind, recipient)` in the backing store is the authority on
/// "already handled" — no in-process locking is layered on top of it.
#[async_trait::async_trait]
pub trait IReminderLogRepo: Send + Sync {
    /// Whether a record already exists for the triple.
    async fn was_sent(
        &self,
        appointment_id: &ID,
        kind: ReminderKind,
        recipient_id: &ID,
    ) -> anyhow::Result<bool>;

    /// Insert a record. A uniqueness conflict on the composite key is a
    /// benign no-op, which is what makes overlapping firings of the same
    /// trigger safe.
    async fn record_attempt(&self, record: &ReminderRecord) -> anyhow::Result<()>;

    /// Connectivity probe for the health surface.
    async fn is_healthy(&self) -> bool;
}
